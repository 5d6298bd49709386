//! Draft test cases and existing-functionality records derived from a diff.
//!
//! Everything here is a pure function of its inputs. Drafts carry no
//! identifier and nothing is persisted; the caller assigns identity, runs
//! its scoring engine, and stores the results.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::diff::{StateDiff, StateModification};
use crate::model::{Implementation, State, StateDiagram};

/// What kind of code change a draft test case covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CodeChange {
    New,
    Modified,
    ModifiedUi,
    ModifiedLogic,
}

impl fmt::Display for CodeChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodeChange::New => write!(f, "NEW"),
            CodeChange::Modified => write!(f, "MODIFIED"),
            CodeChange::ModifiedUi => write!(f, "MODIFIED_UI"),
            CodeChange::ModifiedLogic => write!(f, "MODIFIED_LOGIC"),
        }
    }
}

/// Inputs a scoring engine needs. Risk factors are on a 1-5 scale; the
/// history factors start at their floor of 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringInputs {
    pub business_impact: u8,
    pub user_impact: u8,
    pub complexity: u8,
    pub change_frequency: u8,
    pub defect_history: u8,
    pub test_history: u8,
    pub organisational_pressure: u8,
}

impl ScoringInputs {
    pub const NEUTRAL_RISK: u8 = 3;
    pub const NEUTRAL_HISTORY: u8 = 1;
}

impl Default for ScoringInputs {
    fn default() -> Self {
        ScoringInputs {
            business_impact: Self::NEUTRAL_RISK,
            user_impact: Self::NEUTRAL_RISK,
            complexity: Self::NEUTRAL_RISK,
            change_frequency: Self::NEUTRAL_RISK,
            defect_history: Self::NEUTRAL_HISTORY,
            test_history: Self::NEUTRAL_HISTORY,
            organisational_pressure: Self::NEUTRAL_HISTORY,
        }
    }
}

/// A test case awaiting identity and scores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftTestCase {
    pub test_name: String,
    pub code_change: CodeChange,
    pub state_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub change_summary: Vec<String>,
    pub scoring_inputs: ScoringInputs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FunctionalityStatus {
    Stable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FunctionalitySource {
    StateDiagram,
}

/// An "existing functionality" record awaiting identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftFunctionality {
    pub name: String,
    pub state_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub implementation: Option<Implementation>,
    pub actions: Vec<String>,
    pub status: FunctionalityStatus,
    pub source: FunctionalitySource,
}

// ── Modification policy ──────────────────────────────────────────────────────

/// Decides which [`CodeChange`] a modified state maps to.
pub trait ModificationPolicy {
    fn classify(&self, modification: &StateModification) -> CodeChange;
}

/// Every modified state is plain `MODIFIED`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformModified;

impl ModificationPolicy for UniformModified {
    fn classify(&self, _modification: &StateModification) -> CodeChange {
        CodeChange::Modified
    }
}

/// Transition changes alter navigation, so they count as logic changes.
/// Anything else (actions, implementation, timestamps) is treated as UI.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransitionAware;

impl ModificationPolicy for TransitionAware {
    fn classify(&self, modification: &StateModification) -> CodeChange {
        if modification.changes.touches_transitions() {
            CodeChange::ModifiedLogic
        } else {
            CodeChange::ModifiedUi
        }
    }
}

// ── Generation ───────────────────────────────────────────────────────────────

/// One draft per added state, then one per modified state, using
/// [`UniformModified`].
pub fn generate_test_cases(diff: &StateDiff, current: &StateDiagram) -> Vec<DraftTestCase> {
    generate_test_cases_with(diff, current, &UniformModified)
}

/// Like [`generate_test_cases`] with a caller-chosen modification policy.
///
/// Removed and unchanged states never produce drafts.
pub fn generate_test_cases_with(
    diff: &StateDiff,
    current: &StateDiagram,
    policy: &dyn ModificationPolicy,
) -> Vec<DraftTestCase> {
    let added = diff.added.iter().map(|id| {
        let state = current.states.get(id);
        DraftTestCase {
            test_name: test_name("Verify new state", id, state),
            code_change: CodeChange::New,
            state_id: id.clone(),
            description: state.and_then(|s| s.description.clone()),
            change_summary: Vec::new(),
            scoring_inputs: ScoringInputs::default(),
        }
    });

    let modified = diff.modified.iter().map(|m| {
        let state = current.states.get(&m.state_id);
        DraftTestCase {
            test_name: test_name("Verify changes to state", &m.state_id, state),
            code_change: policy.classify(m),
            state_id: m.state_id.clone(),
            description: state.and_then(|s| s.description.clone()),
            change_summary: m.changes.describe(),
            scoring_inputs: ScoringInputs::default(),
        }
    });

    added.chain(modified).collect()
}

/// One record per state of `diagram`, in declaration order, regardless of
/// what changed.
pub fn generate_existing_functionality(diagram: &StateDiagram) -> Vec<DraftFunctionality> {
    diagram
        .states
        .iter()
        .map(|(id, state)| DraftFunctionality {
            name: display_name(id, Some(state)),
            state_id: id.clone(),
            description: state.description.clone(),
            implementation: state.implementation,
            actions: state.actions.clone(),
            status: FunctionalityStatus::Stable,
            source: FunctionalitySource::StateDiagram,
        })
        .collect()
}

fn display_name(id: &str, state: Option<&State>) -> String {
    match state.and_then(|s| s.description.as_deref()) {
        Some(desc) if !desc.trim().is_empty() => format!("{} ({})", id, desc.trim()),
        _ => id.to_string(),
    }
}

fn test_name(prefix: &str, id: &str, state: Option<&State>) -> String {
    format!("{}: {}", prefix, display_name(id, state))
}
