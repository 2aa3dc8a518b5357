//! hanbench - teacher/student evaluation harness for Chinese-language
//! comprehension tasks.
//!
//! ## Architecture
//!
//! A teacher model and a fixed roster of student models are driven through
//! three task types:
//! - **Task 1**: single-choice questions across subject fields
//! - **Task 2**: reading comprehension over shared materials
//! - **Task 3**: the teacher distills knowledge per sample, then every
//!   student answers with that knowledge in its prompt
//!
//! ## Data flow
//!
//! ```text
//! Dataset (JSONL) → Prompt Builder → Chat Backend → Extractor
//!        ↓                                              ↓
//! Results file (JSONL, append-only = the checkpoint) ← Record
//!        ↓
//! Accuracy Aggregator → score.json
//! ```
//!
//! Everything runs strictly sequentially; resumption is derived from the
//! record count of each results file.

pub mod client;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod prompts;
pub mod store;

// Re-exports for convenience
pub use client::{BackendRegistry, ChatBackend, LlmClient};
pub use metrics::{accuracy, extract_last_boxed_answer, extract_last_knowledge_object};
pub use models::{Config, HanbenchError, Result, ScoreSummary};
pub use pipeline::{run_task1, run_task2, run_task3, RunOptions};
