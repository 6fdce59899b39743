// Analysis pipeline: load entities → remote match → best-effort parse →
// persist result → persist per-criterion details.

pub mod details;
pub mod handlers;
pub mod orchestrator;

pub use orchestrator::{AnalysisError, Analyzer};
