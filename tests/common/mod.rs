#![allow(dead_code)]

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use lopdf::{Document as LoDocument, Object, Stream, dictionary};
use tempfile::TempDir;
use tokio::sync::broadcast;

use docbulk::application::ports::document_repository::DocumentRepository;
use docbulk::application::ports::pdf_port::{PdfEngine, PdfError, PdfFile};
use docbulk::application::services::pdf;
use docbulk::bootstrap::config::StorageDirs;
use docbulk::domain::documents::document::{Document, NewDocument};
use docbulk::domain::tasks::TaskRequest;
use docbulk::infrastructure::memory::InMemoryStore;
use docbulk::infrastructure::pdf::LopdfEngine;
use docbulk::infrastructure::storage::FsStoragePort;
use docbulk::infrastructure::tasks::BroadcastTaskQueue;

/// Temporary storage layout, removed when dropped.
pub struct TestDirs {
    _root: TempDir,
    pub dirs: StorageDirs,
}

impl TestDirs {
    pub async fn new() -> Self {
        let root = TempDir::new().unwrap();
        let dirs = StorageDirs::under(root.path());
        dirs.ensure().await.unwrap();
        Self { _root: root, dirs }
    }
}

/// A PDF with `pages` pages, each showing "<label> <n>".
pub fn pdf_with_pages(label: &str, pages: usize) -> LoDocument {
    let mut doc = LoDocument::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });
    let mut kids = Vec::with_capacity(pages);
    for n in 1..=pages {
        let content = format!("BT /F1 24 Tf 100 600 Td ({label} {n}) Tj ET");
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(Object::Reference(page_id));
    }
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages as i64,
            "Resources" => resources_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(595),
                Object::Integer(842),
            ],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc
}

pub fn write_pdf(path: &Path, label: &str, pages: usize) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    let mut doc = pdf_with_pages(label, pages);
    doc.save(path).unwrap();
}

pub fn page_count(path: &Path) -> usize {
    LoDocument::load(path).unwrap().get_pages().len()
}

pub fn page_rotations(path: &Path) -> Vec<i64> {
    pdf::page_rotations(&PdfFile::new(LoDocument::load(path).unwrap()))
}

/// Wraps [`LopdfEngine`] and fails on demand.
#[derive(Default)]
pub struct FlakyPdfEngine {
    inner: LopdfEngine,
    fail_open: Mutex<Vec<PathBuf>>,
    fail_save: AtomicBool,
}

impl FlakyPdfEngine {
    pub fn fail_open_of(&self, path: PathBuf) {
        self.fail_open.lock().unwrap().push(path);
    }

    pub fn fail_every_save(&self) {
        self.fail_save.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl PdfEngine for FlakyPdfEngine {
    async fn open(&self, path: &Path) -> Result<PdfFile, PdfError> {
        if self.fail_open.lock().unwrap().iter().any(|p| p == path) {
            return Err(PdfError::Open {
                path: path.to_path_buf(),
                reason: "injected failure".into(),
            });
        }
        self.inner.open(path).await
    }

    async fn save(&self, pdf: PdfFile, path: &Path) -> Result<(), PdfError> {
        if self.fail_save.load(Ordering::SeqCst) {
            return Err(PdfError::Save {
                path: path.to_path_buf(),
                reason: "injected failure".into(),
            });
        }
        self.inner.save(pdf, path).await
    }
}

/// Everything one bulk edit needs, backed by memory and a temp dir.
pub struct Harness {
    pub dirs: TestDirs,
    pub store: InMemoryStore,
    pub storage: FsStoragePort,
    pub pdf: FlakyPdfEngine,
    pub tasks: BroadcastTaskQueue,
    pub submitted: broadcast::Receiver<TaskRequest>,
}

impl Harness {
    pub async fn new() -> Self {
        let dirs = TestDirs::new().await;
        let storage = FsStoragePort::new(&dirs.dirs);
        let (tx, submitted) = broadcast::channel(64);
        Self {
            dirs,
            store: InMemoryStore::new(),
            storage,
            pdf: FlakyPdfEngine::default(),
            tasks: BroadcastTaskQueue::new(tx),
            submitted,
        }
    }

    /// Stores a PDF document whose original has `pages` pages. With
    /// `archived` an archive copy is written as well.
    pub async fn add_pdf(&self, title: &str, pages: usize, archived: bool) -> Document {
        let slug = title.to_lowercase().replace(' ', "_");
        let mut new = NewDocument::new(format!("checksum-{slug}"), title);
        new.filename = Some(format!("{slug}.pdf"));
        new.page_count = Some(pages as i32);
        write_pdf(&self.dirs.dirs.originals_dir.join(format!("{slug}.pdf")), title, pages);
        if archived {
            new.archive_filename = Some(format!("{slug}.pdf"));
            new.archive_checksum = Some(format!("archive-{slug}"));
            write_pdf(&self.dirs.dirs.archive_dir.join(format!("{slug}.pdf")), title, pages);
        }
        self.store.create(&new).await.unwrap()
    }

    pub fn drain_tasks(&mut self) -> Vec<TaskRequest> {
        let mut out = Vec::new();
        while let Ok(task) = self.submitted.try_recv() {
            out.push(task);
        }
        out
    }
}

/// Collects formatted log output while the returned guard is alive.
#[derive(Clone, Default)]
pub struct LogCapture {
    buf: Arc<Mutex<Vec<u8>>>,
}

struct CaptureWriter(Arc<Mutex<Vec<u8>>>);

impl io::Write for CaptureWriter {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl LogCapture {
    pub fn install() -> (Self, tracing::subscriber::DefaultGuard) {
        let capture = Self::default();
        let buf = capture.buf.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || CaptureWriter(buf.clone()))
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish();
        let guard = tracing::subscriber::set_default(subscriber);
        (capture, guard)
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buf.lock().unwrap()).to_string()
    }

    pub fn error_lines(&self) -> Vec<String> {
        self.contents()
            .lines()
            .filter(|l| l.contains("ERROR"))
            .map(str::to_string)
            .collect()
    }
}
