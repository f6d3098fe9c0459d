//! Pipeline stages for the groupsync controller.
//!
//! Each stage is a small, independently testable unit:
//!
//! - [`fetcher`]: single deadline-bound HTTP GET behind the [`Fetcher`] trait
//! - [`parser`]: format-keyed [`ParserRegistry`] turning raw bytes into a
//!   subject list
//! - [`transform`]: ordered transformer chain dispatched through a
//!   kind → stage-function table
//! - [`validate`]: fail-fast match-all regex gate
//!
//! Stages never retry and never log-and-swallow: every failure is returned
//! to the orchestrator, which owns retry policy and status reporting.

pub mod fetcher;
pub mod parser;
pub mod transform;
pub mod validate;

// Re-export main types
pub use fetcher::{Fetcher, HttpFetcher};
pub use parser::{JsonParser, ParserRegistry, PlaintextParser, SubjectParser};
pub use transform::{apply, preflight};
pub use validate::validate;
