//! Upload boundary: raw text to a typed diagram envelope.
//!
//! The envelope (`applicationName`, `states`, `metadata`) is checked here.
//! Individual states stay as raw JSON in a [`DiagramDocument`] so the
//! validator can report per-state shape problems instead of failing the
//! whole upload on the first one.

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::ParseError;
use crate::model::{DiagramMetadata, State, StateDiagram};

/// A diagram whose envelope has been checked but whose states are still raw.
#[derive(Debug, Clone, PartialEq)]
pub struct DiagramDocument {
    pub version: String,
    pub application_name: String,
    pub metadata: DiagramMetadata,
    pub states: IndexMap<String, Value>,
}

/// Parse raw upload text into a [`DiagramDocument`].
pub fn parse_document(text: &str) -> Result<DiagramDocument, ParseError> {
    let value: Value = serde_json::from_str(text)?;
    document_from_value(&value)
}

/// Parse raw upload text straight into a typed [`StateDiagram`], skipping
/// validation.
pub fn parse_diagram(text: &str) -> Result<StateDiagram, ParseError> {
    parse_document(text)?.to_diagram()
}

/// Check the envelope of an already-decoded JSON value.
pub fn document_from_value(value: &Value) -> Result<DiagramDocument, ParseError> {
    let obj = value
        .as_object()
        .ok_or_else(|| ParseError::invalid_field("<root>", "expected a JSON object"))?;

    let application_name = match obj.get("applicationName") {
        None | Some(Value::Null) => {
            return Err(ParseError::MissingField {
                field: "applicationName".to_string(),
            })
        }
        Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
        Some(Value::String(_)) => {
            return Err(ParseError::invalid_field(
                "applicationName",
                "must not be empty",
            ))
        }
        Some(_) => {
            return Err(ParseError::invalid_field(
                "applicationName",
                "expected a string",
            ))
        }
    };

    let version = match obj.get("version") {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        // Exporters sometimes emit numeric versions.
        Some(Value::Number(n)) => n.to_string(),
        Some(_) => return Err(ParseError::invalid_field("version", "expected a string")),
    };

    let states = match obj.get("states") {
        None | Some(Value::Null) => {
            return Err(ParseError::MissingField {
                field: "states".to_string(),
            })
        }
        Some(Value::Object(map)) => map
            .iter()
            .map(|(id, state)| (id.clone(), state.clone()))
            .collect(),
        Some(_) => return Err(ParseError::invalid_field("states", "expected an object")),
    };

    let metadata = match obj.get("metadata") {
        None | Some(Value::Null) => DiagramMetadata::default(),
        Some(m @ Value::Object(_)) => serde_json::from_value(m.clone())
            .map_err(|e| ParseError::invalid_field("metadata", e.to_string()))?,
        Some(_) => return Err(ParseError::invalid_field("metadata", "expected an object")),
    };

    Ok(DiagramDocument {
        version,
        application_name,
        metadata,
        states,
    })
}

impl DiagramDocument {
    /// Convert every raw state into a typed [`State`].
    ///
    /// Fails on the first state that does not have the expected shape, so
    /// callers should validate first and only convert documents with no
    /// error-level findings.
    pub fn to_diagram(&self) -> Result<StateDiagram, ParseError> {
        let mut states = IndexMap::with_capacity(self.states.len());
        for (id, raw) in &self.states {
            let state: State =
                serde_json::from_value(raw.clone()).map_err(|e| ParseError::InvalidState {
                    state_id: id.clone(),
                    message: e.to_string(),
                })?;
            states.insert(id.clone(), state);
        }

        Ok(StateDiagram {
            version: self.version.clone(),
            application_name: self.application_name.clone(),
            states,
            metadata: self.metadata.clone(),
        })
    }
}

impl From<&StateDiagram> for DiagramDocument {
    fn from(diagram: &StateDiagram) -> Self {
        let states = diagram
            .states
            .iter()
            .map(|(id, state)| {
                let raw = serde_json::to_value(state).unwrap_or(Value::Null);
                (id.clone(), raw)
            })
            .collect();

        DiagramDocument {
            version: diagram.version.clone(),
            application_name: diagram.application_name.clone(),
            metadata: diagram.metadata.clone(),
            states,
        }
    }
}
