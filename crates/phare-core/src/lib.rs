//! Core semantic analysis for Phare, a PHP static analyzer
//!
//! The crate takes parsed PHP trees (the parser is a separate concern) and
//! answers the questions analysis rules ask: what does this name refer to,
//! where is it declared, is this class a subtype of that one, does this
//! method override anything. Per-file work is pure and parallelizable; the
//! [`index::ProjectIndex`] aggregates cross-file knowledge and answers
//! hierarchy queries in three-valued logic.

pub mod analysis;
pub mod config;
pub mod index;
pub mod names;
pub mod semantic;
pub mod tree;
pub mod trilean;

pub use analysis::{AnalysisEngine, FileAnalysis};
pub use index::ProjectIndex;
pub use names::{QualifiedName, QualifiedNameError};
pub use semantic::SemanticModel;
pub use trilean::Trilean;
