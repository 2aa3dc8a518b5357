//! Durable persistence: JSONL records and the resume arithmetic over them.

mod jsonl;
mod resume;

pub use jsonl::*;
pub use resume::*;
