pub mod handlers;
pub mod ingest;

pub use ingest::{ResumeIngestor, ResumeUpload};
