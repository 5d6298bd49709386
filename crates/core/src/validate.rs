//! Structural validation of a single diagram: shape of each state, dangling
//! transition targets, dead ends, and states with no way in.
//!
//! Validation never fails. Every finding is collected into a
//! [`ValidationResult`]; deciding whether to abort an import on errors is the
//! caller's job.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;

use crate::model::{Implementation, State};
use crate::parse::DiagramDocument;

/// Severity of a validation finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationLevel {
    Error,
    Warning,
    Info,
}

impl fmt::Display for ValidationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationLevel::Error => write!(f, "error"),
            ValidationLevel::Warning => write!(f, "warning"),
            ValidationLevel::Info => write!(f, "info"),
        }
    }
}

/// A single validation finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationWarning {
    pub level: ValidationLevel,
    pub message: String,
    /// Dotted path to the offending field, e.g. `states.cart.transitions`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_id: Option<String>,
}

impl ValidationWarning {
    fn new(level: ValidationLevel, message: impl Into<String>) -> Self {
        ValidationWarning {
            level,
            message: message.into(),
            field: None,
            state_id: None,
        }
    }

    fn at(mut self, state_id: &str, field: impl Into<String>) -> Self {
        self.state_id = Some(state_id.to_string());
        self.field = Some(field.into());
        self
    }
}

/// Outcome of validating one diagram.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    /// True iff no finding has level `error`.
    pub is_valid: bool,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    fn from_warnings(warnings: Vec<ValidationWarning>) -> Self {
        let is_valid = !warnings.iter().any(|w| w.level == ValidationLevel::Error);
        ValidationResult { is_valid, warnings }
    }

    pub fn count(&self, level: ValidationLevel) -> usize {
        self.warnings.iter().filter(|w| w.level == level).count()
    }

    pub fn error_count(&self) -> usize {
        self.count(ValidationLevel::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.count(ValidationLevel::Warning)
    }

    pub fn errors(&self) -> impl Iterator<Item = &ValidationWarning> {
        self.warnings
            .iter()
            .filter(|w| w.level == ValidationLevel::Error)
    }

    /// Format as human-readable text, one finding per line.
    pub fn to_text(&self) -> String {
        let mut lines = vec![format!(
            "{}: {} error(s), {} warning(s)",
            if self.is_valid { "valid" } else { "invalid" },
            self.error_count(),
            self.warning_count()
        )];
        for w in &self.warnings {
            lines.push(format!("  [{}] {}", w.level, w.message));
        }
        lines.join("\n")
    }
}

// ── Entry point strategy ─────────────────────────────────────────────────────

/// The state a diagram is entered through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryPoint<'a> {
    pub state_id: &'a str,
    /// True when no rule matched and the strategy fell back to a guess.
    pub inferred: bool,
}

/// Picks the entry state of a diagram. That state is exempt from the
/// "no incoming transition" check.
pub trait EntryPointStrategy {
    /// Pick the entry among `state_ids` (given in declaration order), or
    /// `None` for an empty diagram.
    fn entry_point<'a>(&self, state_ids: &[&'a str]) -> Option<EntryPoint<'a>>;
}

/// Matches a list of conventional entry names case-insensitively, in
/// priority order, and falls back to the first declared state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConventionalEntryPoint {
    names: Vec<String>,
}

impl ConventionalEntryPoint {
    pub const DEFAULT_NAMES: [&'static str; 3] = ["initial", "start", "home"];

    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ConventionalEntryPoint {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

impl Default for ConventionalEntryPoint {
    fn default() -> Self {
        ConventionalEntryPoint::new(Self::DEFAULT_NAMES)
    }
}

impl EntryPointStrategy for ConventionalEntryPoint {
    fn entry_point<'a>(&self, state_ids: &[&'a str]) -> Option<EntryPoint<'a>> {
        let named = self.names.iter().find_map(|name| {
            state_ids
                .iter()
                .copied()
                .find(|id| id.eq_ignore_ascii_case(name))
        });
        match named {
            Some(state_id) => Some(EntryPoint {
                state_id,
                inferred: false,
            }),
            None => state_ids.first().map(|&state_id| EntryPoint {
                state_id,
                inferred: true,
            }),
        }
    }
}

// ── Validation ───────────────────────────────────────────────────────────────

/// Validate a diagram with the conventional entry point heuristic.
pub fn validate(document: &DiagramDocument) -> ValidationResult {
    validate_with(document, &ConventionalEntryPoint::default())
}

/// Validate a diagram, picking the entry state with `strategy`.
pub fn validate_with(
    document: &DiagramDocument,
    strategy: &dyn EntryPointStrategy,
) -> ValidationResult {
    let mut warnings = Vec::new();

    if document.states.is_empty() {
        warnings.push(ValidationWarning {
            field: Some("states".to_string()),
            ..ValidationWarning::new(ValidationLevel::Warning, "Diagram has no states")
        });
        return ValidationResult::from_warnings(warnings);
    }

    let mut incoming: HashSet<&str> = HashSet::new();

    for (id, raw) in &document.states {
        let state = match raw.as_object() {
            Some(obj) => obj,
            None => {
                warnings.push(
                    ValidationWarning::new(
                        ValidationLevel::Error,
                        format!("State '{}' must be an object", id),
                    )
                    .at(id, format!("states.{}", id)),
                );
                continue;
            }
        };

        let first_finding = warnings.len();

        match state.get("actions") {
            Some(Value::Array(actions)) => {
                for (i, action) in actions.iter().enumerate() {
                    if !action.is_string() {
                        warnings.push(
                            ValidationWarning::new(
                                ValidationLevel::Error,
                                format!("State '{}' action #{} must be a string", id, i),
                            )
                            .at(id, format!("states.{}.actions", id)),
                        );
                    }
                }
            }
            _ => {
                warnings.push(
                    ValidationWarning::new(
                        ValidationLevel::Error,
                        format!("State '{}' is missing an 'actions' array", id),
                    )
                    .at(id, format!("states.{}.actions", id)),
                );
            }
        }

        for field in ["description", "lastModified", "changeNotes"] {
            if matches!(state.get(field), Some(v) if !v.is_null() && !v.is_string()) {
                warnings.push(
                    ValidationWarning::new(
                        ValidationLevel::Error,
                        format!("State '{}' field '{}' must be a string", id, field),
                    )
                    .at(id, format!("states.{}.{}", id, field)),
                );
            }
        }

        if let Some(implementation) = state.get("implementation").filter(|v| !v.is_null()) {
            if serde_json::from_value::<Implementation>(implementation.clone()).is_err() {
                warnings.push(
                    ValidationWarning::new(
                        ValidationLevel::Error,
                        format!("State '{}' has unknown implementation {}", id, implementation),
                    )
                    .at(id, format!("states.{}.implementation", id)),
                );
            }
        }

        let transitions = match state.get("transitions") {
            Some(Value::Object(map)) => map,
            _ => {
                warnings.push(
                    ValidationWarning::new(
                        ValidationLevel::Error,
                        format!("State '{}' is missing a 'transitions' object", id),
                    )
                    .at(id, format!("states.{}.transitions", id)),
                );
                continue;
            }
        };

        for (action, target) in transitions {
            let field = format!("states.{}.transitions.{}", id, action);
            match target.as_str() {
                Some(target) if document.states.contains_key(target) => {
                    incoming.insert(target);
                }
                Some(target) => {
                    warnings.push(
                        ValidationWarning::new(
                            ValidationLevel::Error,
                            format!(
                                "State '{}' action '{}' targets missing state '{}'",
                                id, action, target
                            ),
                        )
                        .at(id, field),
                    );
                }
                None => {
                    warnings.push(
                        ValidationWarning::new(
                            ValidationLevel::Error,
                            format!(
                                "State '{}' action '{}' target must be a state id string",
                                id, action
                            ),
                        )
                        .at(id, field),
                    );
                }
            }
        }

        if transitions.is_empty() {
            warnings.push(
                ValidationWarning::new(
                    ValidationLevel::Warning,
                    format!("State '{}' is a dead end (no outgoing transitions)", id),
                )
                .at(id, format!("states.{}.transitions", id)),
            );
        }

        // A state that passes every check above must also convert.
        let has_error = warnings[first_finding..]
            .iter()
            .any(|w| w.level == ValidationLevel::Error);
        if !has_error {
            if let Err(e) = serde_json::from_value::<State>(raw.clone()) {
                warnings.push(
                    ValidationWarning::new(
                        ValidationLevel::Error,
                        format!("State '{}' is malformed: {}", id, e),
                    )
                    .at(id, format!("states.{}", id)),
                );
            }
        }
    }

    let state_ids: Vec<&str> = document.states.keys().map(String::as_str).collect();
    let entry = strategy.entry_point(&state_ids);

    if let Some(EntryPoint {
        state_id,
        inferred: true,
    }) = entry
    {
        warnings.push(
            ValidationWarning::new(
                ValidationLevel::Info,
                format!(
                    "No conventionally named entry state; treating '{}' as the entry point",
                    state_id
                ),
            )
            .at(state_id, format!("states.{}", state_id)),
        );
    }

    let entry_id = entry.map(|e| e.state_id);
    for id in &state_ids {
        if Some(*id) == entry_id || incoming.contains(id) {
            continue;
        }
        warnings.push(
            ValidationWarning::new(
                ValidationLevel::Warning,
                format!(
                    "State '{}' is potentially unreachable (no incoming transitions)",
                    id
                ),
            )
            .at(id, format!("states.{}", id)),
        );
    }

    ValidationResult::from_warnings(warnings)
}
