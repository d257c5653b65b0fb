pub mod bulk_edit;
