//! Typed state diagram model.
//!
//! Field names follow the camelCase JSON wire format produced by diagram
//! exporters (`applicationName`, `lastModified`, ...). Maps are insertion
//! ordered so diff and validation output follow the order states were
//! declared in.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a state is implemented in the application under test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Implementation {
    StandardComponents,
    NewPattern,
    CustomImplementation,
    Hybrid,
}

impl fmt::Display for Implementation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Implementation::StandardComponents => write!(f, "standard-components"),
            Implementation::NewPattern => write!(f, "new-pattern"),
            Implementation::CustomImplementation => write!(f, "custom-implementation"),
            Implementation::Hybrid => write!(f, "hybrid"),
        }
    }
}

/// A single node of a state diagram.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct State {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub actions: Vec<String>,
    /// Outgoing transitions: action name -> target state id.
    pub transitions: IndexMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub implementation: Option<Implementation>,
    /// ISO 8601 / RFC 3339 timestamp string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_notes: Option<String>,
}

impl State {
    /// Shorthand for a state with the given outgoing transitions, where each
    /// transition action is also listed in `actions`.
    pub fn with_transitions<I, A, T>(transitions: I) -> Self
    where
        I: IntoIterator<Item = (A, T)>,
        A: Into<String>,
        T: Into<String>,
    {
        let transitions: IndexMap<String, String> = transitions
            .into_iter()
            .map(|(a, t)| (a.into(), t.into()))
            .collect();
        State {
            actions: transitions.keys().cloned().collect(),
            transitions,
            ..State::default()
        }
    }

    pub fn is_dead_end(&self) -> bool {
        self.transitions.is_empty()
    }
}

/// Diagram-level metadata. Keys other than `generated` are carried through
/// untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DiagramMetadata {
    /// ISO 8601 / RFC 3339 timestamp of when the diagram was produced.
    #[serde(default)]
    pub generated: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A named graph of states and action-labeled transitions modeling one
/// application's behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateDiagram {
    #[serde(default)]
    pub version: String,
    pub application_name: String,
    pub states: IndexMap<String, State>,
    #[serde(default)]
    pub metadata: DiagramMetadata,
}

impl StateDiagram {
    pub fn new(application_name: impl Into<String>) -> Self {
        StateDiagram {
            version: String::new(),
            application_name: application_name.into(),
            states: IndexMap::new(),
            metadata: DiagramMetadata::default(),
        }
    }

    /// Builder-style helper used heavily by tests and fixtures.
    pub fn with_state(mut self, id: impl Into<String>, state: State) -> Self {
        self.states.insert(id.into(), state);
        self
    }

    pub fn state_ids(&self) -> impl Iterator<Item = &str> {
        self.states.keys().map(String::as_str)
    }
}
