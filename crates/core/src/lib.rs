//! statecase-core: validation, diffing, and draft test case generation for
//! application state diagrams.
//!
//! The pipeline is:
//!
//! 1. [`parse_document()`] -- raw upload text to a checked envelope
//! 2. [`validate()`] -- structural findings (dangling targets, dead ends,
//!    unreachable states)
//! 3. [`diff()`] -- classify every state against the previous version
//! 4. [`generate_test_cases()`] / [`generate_existing_functionality()`] --
//!    drafts for the caller to identify, score, and store
//!
//! All of it is pure; persistence lives in `statecase-storage`.

pub mod diff;
pub mod error;
pub mod generate;
pub mod model;
pub mod parse;
pub mod validate;

// ── Convenience re-exports: key types ────────────────────────────────

pub use diff::{FieldChange, StateChanges, StateDiff, StateModification};
pub use error::ParseError;
pub use generate::{
    CodeChange, DraftFunctionality, DraftTestCase, FunctionalitySource, FunctionalityStatus,
    ModificationPolicy, ScoringInputs, TransitionAware, UniformModified,
};
pub use model::{DiagramMetadata, Implementation, State, StateDiagram};
pub use parse::DiagramDocument;
pub use validate::{
    ConventionalEntryPoint, EntryPoint, EntryPointStrategy, ValidationLevel, ValidationResult,
    ValidationWarning,
};

// ── Convenience re-exports: pipeline entry points ────────────────────

pub use diff::diff;
pub use generate::{
    generate_existing_functionality, generate_test_cases, generate_test_cases_with,
};
pub use parse::{document_from_value, parse_diagram, parse_document};
pub use validate::{validate, validate_with};
