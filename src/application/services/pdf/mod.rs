use std::collections::{BTreeMap, HashSet};

use lopdf::{Dictionary, Document, Object, ObjectId};

use crate::application::ports::pdf_port::{PdfError, PdfFile};

// Page assembly over lopdf documents. Every function builds a fresh page tree
// under the first source's catalog, so intermediate Pages nodes disappear and
// inheritable attributes are copied down onto each page.

const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];
const MAX_TREE_DEPTH: usize = 64;

#[derive(Debug, Clone, Copy)]
struct PageRef {
    source: usize,
    number: u32,
}

/// All pages of every file, in order.
pub fn concat(files: Vec<PdfFile>) -> Result<PdfFile, PdfError> {
    let selection: Vec<PageRef> = files
        .iter()
        .enumerate()
        .flat_map(|(source, file)| {
            let count = file.page_count() as u32;
            (1..=count).map(move |number| PageRef { source, number })
        })
        .collect();
    assemble(files, &selection)
}

/// A new file holding `pages` (1-based) of `file`, in the given order.
pub fn extract_pages(file: &PdfFile, pages: &[u32]) -> Result<PdfFile, PdfError> {
    check_pages(file, pages)?;
    let selection: Vec<PageRef> = pages
        .iter()
        .map(|&number| PageRef { source: 0, number })
        .collect();
    assemble(vec![file.clone()], &selection)
}

/// A new file without `pages` (1-based). Removing every page is rejected.
pub fn remove_pages(file: &PdfFile, pages: &[u32]) -> Result<PdfFile, PdfError> {
    check_pages(file, pages)?;
    let drop: HashSet<u32> = pages.iter().copied().collect();
    let selection: Vec<PageRef> = (1..=file.page_count() as u32)
        .filter(|n| !drop.contains(n))
        .map(|number| PageRef { source: 0, number })
        .collect();
    assemble(vec![file.clone()], &selection)
}

/// Rotates every page by `degrees` relative to its current orientation.
pub fn rotate_pages(file: &mut PdfFile, degrees: i32) -> Result<(), PdfError> {
    if degrees % 90 != 0 {
        return Err(PdfError::Malformed(format!(
            "rotation must be a multiple of 90, got {degrees}"
        )));
    }
    let doc = file.document_mut();
    let page_ids: Vec<ObjectId> = doc.get_pages().into_values().collect();
    for page_id in page_ids {
        let current = {
            let page = doc.get_dictionary(page_id)?;
            page_attribute(&doc.objects, page, b"Rotate")
                .and_then(|o| o.as_i64().ok())
                .unwrap_or(0)
        };
        let rotated = (current + i64::from(degrees)).rem_euclid(360);
        doc.get_object_mut(page_id)?
            .as_dict_mut()?
            .set("Rotate", rotated);
    }
    Ok(())
}

/// Effective `/Rotate` of every page, in page order.
pub fn page_rotations(file: &PdfFile) -> Vec<i64> {
    let doc = file.document();
    doc.get_pages()
        .into_values()
        .map(|id| {
            doc.get_dictionary(id)
                .ok()
                .and_then(|page| page_attribute(&doc.objects, page, b"Rotate"))
                .and_then(|o| o.as_i64().ok())
                .unwrap_or(0)
        })
        .collect()
}

fn check_pages(file: &PdfFile, pages: &[u32]) -> Result<(), PdfError> {
    if pages.is_empty() {
        return Err(PdfError::EmptySelection);
    }
    let count = file.page_count();
    if let Some(&page) = pages.iter().find(|&&p| p == 0 || p as usize > count) {
        return Err(PdfError::PageOutOfRange { page, count });
    }
    Ok(())
}

// Looks the key up on the page itself, then along its Parent chain.
fn page_attribute(
    objects: &BTreeMap<ObjectId, Object>,
    page: &Dictionary,
    key: &[u8],
) -> Option<Object> {
    if let Ok(value) = page.get(key) {
        return Some(value.clone());
    }
    let mut parent = page.get(b"Parent").and_then(|o| o.as_reference()).ok();
    let mut depth = 0;
    while let Some(id) = parent {
        depth += 1;
        if depth > MAX_TREE_DEPTH {
            break;
        }
        let node = objects.get(&id)?.as_dict().ok()?;
        if let Ok(value) = node.get(key) {
            return Some(value.clone());
        }
        parent = node.get(b"Parent").and_then(|o| o.as_reference()).ok();
    }
    None
}

fn assemble(files: Vec<PdfFile>, selection: &[PageRef]) -> Result<PdfFile, PdfError> {
    if selection.is_empty() {
        return Err(PdfError::EmptySelection);
    }

    let mut version = String::from("1.4");
    let mut max_id = 1;
    let mut roots: Option<(ObjectId, ObjectId)> = None;
    let mut source_pages: Vec<BTreeMap<u32, ObjectId>> = Vec::with_capacity(files.len());
    let mut objects: BTreeMap<ObjectId, Object> = BTreeMap::new();

    for (index, file) in files.into_iter().enumerate() {
        let mut doc = file.into_document();
        if doc.version > version {
            version = doc.version.clone();
        }
        doc.renumber_objects_with(max_id);
        max_id = doc.max_id + 1;

        if index == 0 {
            let catalog_id = doc.trailer.get(b"Root")?.as_reference()?;
            let pages_id = doc.get_dictionary(catalog_id)?.get(b"Pages")?.as_reference()?;
            roots = Some((catalog_id, pages_id));
        }
        source_pages.push(doc.get_pages());
        objects.extend(doc.objects);
    }

    let (catalog_id, pages_id) =
        roots.ok_or_else(|| PdfError::Malformed("no source documents".into()))?;

    let mut output = Document::with_version(version);

    for (id, object) in &objects {
        match object.type_name().unwrap_or("") {
            "Catalog" | "Pages" | "Page" | "Outlines" | "Outline" => {}
            _ => {
                output.objects.insert(*id, object.clone());
            }
        }
    }

    let mut kids = Vec::with_capacity(selection.len());
    for page_ref in selection {
        let pages = source_pages
            .get(page_ref.source)
            .ok_or_else(|| PdfError::Malformed(format!("unknown source {}", page_ref.source)))?;
        let page_id = *pages.get(&page_ref.number).ok_or(PdfError::PageOutOfRange {
            page: page_ref.number,
            count: pages.len(),
        })?;
        let original = objects
            .get(&page_id)
            .and_then(|o| o.as_dict().ok())
            .ok_or_else(|| PdfError::Malformed(format!("page object {page_id:?} missing")))?;

        let mut page = original.clone();
        for key in INHERITABLE {
            if !page.has(key) {
                if let Some(value) = page_attribute(&objects, original, key) {
                    page.set(key.to_vec(), value);
                }
            }
        }
        page.set("Parent", Object::Reference(pages_id));

        // A page selected twice needs its own object
        let target_id = if output.objects.contains_key(&page_id) {
            let fresh = (max_id, 0);
            max_id += 1;
            fresh
        } else {
            page_id
        };
        output.objects.insert(target_id, Object::Dictionary(page));
        kids.push(Object::Reference(target_id));
    }

    let mut pages_root = objects
        .get(&pages_id)
        .and_then(|o| o.as_dict().ok())
        .cloned()
        .ok_or_else(|| PdfError::Malformed("pages root not found".into()))?;
    pages_root.remove(b"Parent");
    for key in INHERITABLE {
        pages_root.remove(key);
    }
    pages_root.set("Count", kids.len() as i64);
    pages_root.set("Kids", kids);
    output
        .objects
        .insert(pages_id, Object::Dictionary(pages_root));

    let mut catalog = objects
        .get(&catalog_id)
        .and_then(|o| o.as_dict().ok())
        .cloned()
        .ok_or_else(|| PdfError::Malformed("catalog not found".into()))?;
    catalog.set("Pages", Object::Reference(pages_id));
    catalog.remove(b"Outlines");
    output
        .objects
        .insert(catalog_id, Object::Dictionary(catalog));

    output.trailer.set("Root", Object::Reference(catalog_id));
    output.max_id = output.objects.keys().map(|(n, _)| *n).max().unwrap_or(0);
    output.renumber_objects();
    output.prune_objects();

    Ok(PdfFile::new(output))
}
