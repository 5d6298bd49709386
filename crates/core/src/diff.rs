//! Diff two versions of a state diagram.
//!
//! States are matched by id, never by structure. Every state of either
//! version lands in exactly one of four buckets: added, removed, modified,
//! or unchanged. Modified states carry field-level detail.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use crate::model::{Implementation, State, StateDiagram};

/// Old and new value of a single-valued field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChange<T> {
    pub old: T,
    pub new: T,
}

/// Field-level differences of one state present in both versions.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateChanges {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<FieldChange<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub implementation: Option<FieldChange<Implementation>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions_added: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions_removed: Vec<String>,
    /// New or retargeted transitions, with their current target.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub transitions_added: IndexMap<String, String>,
    /// Dropped or retargeted transitions, with their previous target.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub transitions_removed: IndexMap<String, String>,
}

impl StateChanges {
    pub fn is_empty(&self) -> bool {
        self.last_modified.is_none()
            && self.implementation.is_none()
            && self.actions_added.is_empty()
            && self.actions_removed.is_empty()
            && self.transitions_added.is_empty()
            && self.transitions_removed.is_empty()
    }

    pub fn touches_transitions(&self) -> bool {
        !self.transitions_added.is_empty() || !self.transitions_removed.is_empty()
    }

    /// One human-readable line per individual change.
    pub fn describe(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if let Some(c) = &self.implementation {
            lines.push(format!("implementation: {} -> {}", c.old, c.new));
        }
        if let Some(c) = &self.last_modified {
            lines.push(format!("lastModified: {} -> {}", c.old, c.new));
        }
        for a in &self.actions_added {
            lines.push(format!("action added: {}", a));
        }
        for a in &self.actions_removed {
            lines.push(format!("action removed: {}", a));
        }
        for (action, target) in &self.transitions_removed {
            lines.push(format!("transition removed: {} -> {}", action, target));
        }
        for (action, target) in &self.transitions_added {
            lines.push(format!("transition added: {} -> {}", action, target));
        }
        lines
    }
}

/// A state present in both versions whose tracked fields differ.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateModification {
    pub state_id: String,
    pub changes: StateChanges,
}

/// Classification of every state of two diagram versions.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StateDiff {
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub modified: Vec<StateModification>,
    pub unchanged: Vec<String>,
}

impl StateDiff {
    /// True if the two versions have no state-level differences.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.modified.is_empty()
    }

    pub fn modified_ids(&self) -> impl Iterator<Item = &str> {
        self.modified.iter().map(|m| m.state_id.as_str())
    }

    /// Format the diff as human-readable text.
    pub fn to_text(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!(
            "{} added, {} removed, {} modified, {} unchanged",
            self.added.len(),
            self.removed.len(),
            self.modified.len(),
            self.unchanged.len()
        ));
        for id in &self.added {
            lines.push(format!("+ {}", id));
        }
        for id in &self.removed {
            lines.push(format!("- {}", id));
        }
        for m in &self.modified {
            lines.push(format!("~ {}", m.state_id));
            for change in m.changes.describe() {
                lines.push(format!("    {}", change));
            }
        }

        lines.join("\n")
    }
}

/// Diff `current` against `previous`.
///
/// With no previous version every current state is `added`. Otherwise
/// added/modified/unchanged follow the order of `current.states` and
/// removed follows the order of `previous.states`.
pub fn diff(previous: Option<&StateDiagram>, current: &StateDiagram) -> StateDiff {
    let previous = match previous {
        Some(p) => p,
        None => {
            return StateDiff {
                added: current.states.keys().cloned().collect(),
                ..StateDiff::default()
            }
        }
    };

    let mut result = StateDiff::default();

    for (id, cur) in &current.states {
        match previous.states.get(id) {
            None => result.added.push(id.clone()),
            Some(prev) => {
                let changes = diff_states(prev, cur);
                if changes.is_empty() {
                    result.unchanged.push(id.clone());
                } else {
                    result.modified.push(StateModification {
                        state_id: id.clone(),
                        changes,
                    });
                }
            }
        }
    }

    for id in previous.states.keys() {
        if !current.states.contains_key(id) {
            result.removed.push(id.clone());
        }
    }

    result
}

/// Compute the tracked field differences between two versions of one state.
///
/// `lastModified` and `implementation` only count when both sides define
/// them. Actions compare as sets.
pub fn diff_states(previous: &State, current: &State) -> StateChanges {
    let last_modified = match (&previous.last_modified, &current.last_modified) {
        (Some(old), Some(new)) if old != new => Some(FieldChange {
            old: old.clone(),
            new: new.clone(),
        }),
        _ => None,
    };

    let implementation = match (previous.implementation, current.implementation) {
        (Some(old), Some(new)) if old != new => Some(FieldChange { old, new }),
        _ => None,
    };

    let prev_actions: IndexSet<&String> = previous.actions.iter().collect();
    let cur_actions: IndexSet<&String> = current.actions.iter().collect();
    let actions_added = cur_actions
        .difference(&prev_actions)
        .map(|a| (*a).clone())
        .collect();
    let actions_removed = prev_actions
        .difference(&cur_actions)
        .map(|a| (*a).clone())
        .collect();

    let transitions_added = current
        .transitions
        .iter()
        .filter(|(action, target)| previous.transitions.get(*action) != Some(*target))
        .map(|(a, t)| (a.clone(), t.clone()))
        .collect();
    let transitions_removed = previous
        .transitions
        .iter()
        .filter(|(action, target)| current.transitions.get(*action) != Some(*target))
        .map(|(a, t)| (a.clone(), t.clone()))
        .collect();

    StateChanges {
        last_modified,
        implementation,
        actions_added,
        actions_removed,
        transitions_added,
        transitions_removed,
    }
}
