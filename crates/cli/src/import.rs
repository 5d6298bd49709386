//! `statecase import`: validate, diff against the stored latest version,
//! and on confirmation draft test cases and save the new version.
//!
//! Nothing is written unless the diagram has no validation errors and the
//! import is confirmed with `--yes`.

use std::path::Path;
use std::process;

use serde::Serialize;
use statecase_core::{DraftFunctionality, DraftTestCase, StateDiagram, StateDiff, ValidationResult};
use statecase_storage::SaveOutcome;
use tracing::info;

use crate::config::Config;
use crate::{
    load_document, open_versions, print_json, print_validation, report_error, OutputFormat,
};

pub(crate) struct ImportOptions<'a> {
    pub file: &'a Path,
    pub confirm: bool,
    pub out: Option<&'a Path>,
    pub config: &'a Config,
    pub output: OutputFormat,
    pub quiet: bool,
}

/// A draft with a caller-assigned identifier.
#[derive(Debug, Serialize)]
struct Identified<T> {
    id: String,
    #[serde(flatten)]
    draft: T,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Drafts {
    application_name: String,
    test_cases: Vec<Identified<DraftTestCase>>,
    existing_functionality: Vec<Identified<DraftFunctionality>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImportReport<'a> {
    application_name: &'a str,
    validation: &'a ValidationResult,
    diff: &'a StateDiff,
    #[serde(skip_serializing_if = "Option::is_none")]
    saved: Option<&'a SaveOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    drafts: Option<&'a Drafts>,
}

pub(crate) fn cmd_import(opts: ImportOptions<'_>) {
    let ImportOptions {
        file,
        confirm,
        out,
        config,
        output,
        quiet,
    } = opts;

    let document = load_document(file, output, quiet);
    let validation = statecase_core::validate_with(&document, &config.entry_strategy());
    if !validation.is_valid {
        if !quiet {
            print_validation(&validation, output);
        }
        report_error(
            &format!(
                "import aborted: '{}' has {} validation error(s)",
                file.display(),
                validation.error_count()
            ),
            output,
            quiet,
        );
        process::exit(1);
    }

    let current = match document.to_diagram() {
        Ok(d) => d,
        Err(e) => {
            report_error(&format!("error parsing '{}': {}", file.display(), e), output, quiet);
            process::exit(1);
        }
    };

    let versions = open_versions(config, output, quiet);
    let previous = match versions.get_latest(&current.application_name) {
        Ok(p) => p,
        Err(e) => {
            report_error(&format!("storage error: {}", e), output, quiet);
            process::exit(1);
        }
    };
    let diff = statecase_core::diff(previous.as_ref(), &current);

    if !confirm {
        if !quiet {
            match output {
                OutputFormat::Json => print_json(&ImportReport {
                    application_name: &current.application_name,
                    validation: &validation,
                    diff: &diff,
                    saved: None,
                    drafts: None,
                }),
                OutputFormat::Text => {
                    print_preview(&current, &validation, &diff, previous.is_some());
                    println!();
                    println!("Re-run with --yes to generate drafts and save this version.");
                }
            }
        }
        return;
    }

    let policy = config.policy.policy();
    let drafts = build_drafts(&current, &diff, policy.as_ref());

    // Drafts are written before the save; a retry after the save drafts nothing.
    if let Some(path) = out {
        let text = match serde_json::to_string_pretty(&drafts) {
            Ok(t) => t,
            Err(e) => {
                report_error(&format!("serialization error: {}", e), output, quiet);
                process::exit(1);
            }
        };
        if let Err(e) = std::fs::write(path, text) {
            report_error(
                &format!("error writing '{}': {}", path.display(), e),
                output,
                quiet,
            );
            process::exit(1);
        }
    }

    let saved = match versions.save(&current) {
        Ok(outcome) => outcome,
        Err(e) => {
            report_error(&format!("failed to save version: {}", e), output, quiet);
            process::exit(1);
        }
    };
    info!(
        application = %current.application_name,
        key = %saved.key,
        evicted = saved.evicted.len(),
        test_cases = drafts.test_cases.len(),
        "imported diagram version"
    );

    if quiet {
        return;
    }
    match output {
        OutputFormat::Json => print_json(&ImportReport {
            application_name: &current.application_name,
            validation: &validation,
            diff: &diff,
            saved: Some(&saved),
            drafts: out.is_none().then_some(&drafts),
        }),
        OutputFormat::Text => {
            print_preview(&current, &validation, &diff, previous.is_some());
            println!();
            println!(
                "Drafted {} test case(s) and {} functionality record(s).",
                drafts.test_cases.len(),
                drafts.existing_functionality.len()
            );
            for tc in &drafts.test_cases {
                println!("  {}  [{}] {}", tc.id, tc.draft.code_change, tc.draft.test_name);
            }
            if let Some(path) = out {
                println!("Drafts written to {}", path.display());
            }
            println!("Saved {}", saved.key);
            for key in &saved.evicted {
                println!("Evicted {}", key);
            }
            for failure in &saved.trim_failures {
                println!("Could not evict {}: {}", failure.key, failure.message);
            }
        }
    }
}

fn build_drafts(
    current: &StateDiagram,
    diff: &StateDiff,
    policy: &dyn statecase_core::ModificationPolicy,
) -> Drafts {
    let test_cases = statecase_core::generate_test_cases_with(diff, current, policy)
        .into_iter()
        .enumerate()
        .map(|(i, draft)| Identified {
            id: format!("TC-{:04}", i + 1),
            draft,
        })
        .collect();
    let existing_functionality = statecase_core::generate_existing_functionality(current)
        .into_iter()
        .enumerate()
        .map(|(i, draft)| Identified {
            id: format!("EF-{:04}", i + 1),
            draft,
        })
        .collect();

    Drafts {
        application_name: current.application_name.clone(),
        test_cases,
        existing_functionality,
    }
}

fn print_preview(
    current: &StateDiagram,
    validation: &ValidationResult,
    diff: &StateDiff,
    has_previous: bool,
) {
    println!("{}", validation.to_text());
    if has_previous {
        println!("Changes against latest stored '{}':", current.application_name);
    } else {
        println!(
            "No previous version of '{}'; every state is new.",
            current.application_name
        );
    }
    println!("{}", diff.to_text());
}
