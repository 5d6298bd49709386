//! Conformance test suite for `Store` implementations.
//!
//! A backend-agnostic suite any `Store` can run to verify it behaves the
//! way the version store relies on. The suite covers:
//!
//! - **Key-value semantics**: absent keys, overwrite, idempotent delete
//! - **Prefix listing**: exact prefix matching and ordering
//! - **Version history**: retention, ordering, isolation between
//!   applications, and corrupted-record skipping on top of the backend
//!
//! # Usage
//!
//! Backend crates call [`run_conformance_suite`] with a factory that
//! creates a fresh, empty store for each test:
//!
//! ```ignore
//! use statecase_storage::conformance::run_conformance_suite;
//!
//! #[test]
//! fn redis_conformance() {
//!     let report = run_conformance_suite(|| create_test_redis_store());
//!     assert!(report.failed == 0, "{report}");
//! }
//! ```

mod kv;
mod versions;

use std::fmt;

use statecase_core::{State, StateDiagram};

use crate::Store;

/// Outcome of one named check.
#[derive(Debug, Clone)]
pub struct CheckOutcome {
    pub suite: &'static str,
    pub check: &'static str,
    pub failure: Option<String>,
}

impl CheckOutcome {
    fn new(suite: &'static str, check: &'static str, result: Result<(), String>) -> Self {
        CheckOutcome {
            suite,
            check,
            failure: result.err(),
        }
    }

    pub fn passed(&self) -> bool {
        self.failure.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct ConformanceReport {
    pub outcomes: Vec<CheckOutcome>,
    pub passed: usize,
    pub failed: usize,
    pub total: usize,
}

impl fmt::Display for ConformanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} of {} store checks passed", self.passed, self.total)?;
        for o in &self.outcomes {
            if let Some(failure) = &o.failure {
                writeln!(f, "  {}::{}: {}", o.suite, o.check, failure)?;
            }
        }
        Ok(())
    }
}

/// Run every check, each against a new store from `factory`.
pub fn run_conformance_suite<S, F>(factory: F) -> ConformanceReport
where
    S: Store,
    F: Fn() -> S,
{
    let mut outcomes = kv::run_kv_tests(&factory);
    outcomes.extend(versions::run_version_tests(&factory));

    let passed = outcomes.iter().filter(|o| o.passed()).count();
    let total = outcomes.len();

    ConformanceReport {
        outcomes,
        passed,
        failed: total - passed,
        total,
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn make_diagram(app: &str, version: &str) -> StateDiagram {
    let mut d = StateDiagram::new(app)
        .with_state("home", State::with_transitions([("open", "detail")]))
        .with_state("detail", State::with_transitions([("back", "home")]));
    d.version = version.to_string();
    d
}

fn check(cond: bool, msg: impl Into<String>) -> Result<(), String> {
    if cond {
        Ok(())
    } else {
        Err(msg.into())
    }
}
