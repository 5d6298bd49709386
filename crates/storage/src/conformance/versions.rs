use super::{check, make_diagram, CheckOutcome};
use crate::{Store, VersionStore};

pub(super) fn run_version_tests<S, F>(factory: &F) -> Vec<CheckOutcome>
where
    S: Store,
    F: Fn() -> S,
{
    let tests: [(&'static str, fn(VersionStore<S>) -> Result<(), String>); 6] = [
        ("empty_history", empty_history),
        ("latest_is_last_saved", latest_is_last_saved),
        ("retention_keeps_newest_three", retention_keeps_newest_three),
        ("applications_isolated", applications_isolated),
        ("corrupted_record_skipped", corrupted_record_skipped),
        ("record_round_trips_diagram", record_round_trips_diagram),
    ];

    tests
        .iter()
        .map(|&(name, test)| {
            CheckOutcome::new("versions", name, test(VersionStore::new(factory())))
        })
        .collect()
}

fn versions_of<S: Store>(store: &VersionStore<S>, app: &str) -> Result<Vec<String>, String> {
    Ok(store
        .load_history(app)
        .map_err(|e| e.to_string())?
        .into_iter()
        .map(|d| d.version)
        .collect())
}

fn empty_history<S: Store>(store: VersionStore<S>) -> Result<(), String> {
    let history = versions_of(&store, "shop")?;
    check(history.is_empty(), format!("expected empty history, got {:?}", history))?;
    let latest = store.get_latest("shop").map_err(|e| e.to_string())?;
    check(latest.is_none(), "expected no latest version")
}

fn latest_is_last_saved<S: Store>(store: VersionStore<S>) -> Result<(), String> {
    for v in ["1", "2"] {
        store
            .save(&make_diagram("shop", v))
            .map_err(|e| e.to_string())?;
    }
    let latest = store.get_latest("shop").map_err(|e| e.to_string())?;
    check(
        latest.as_ref().map(|d| d.version.as_str()) == Some("2"),
        format!("expected version 2, got {:?}", latest.map(|d| d.version)),
    )
}

fn retention_keeps_newest_three<S: Store>(store: VersionStore<S>) -> Result<(), String> {
    let mut evicted = 0;
    for v in ["1", "2", "3", "4"] {
        let outcome = store
            .save(&make_diagram("shop", v))
            .map_err(|e| e.to_string())?;
        evicted += outcome.evicted.len();
    }
    check(evicted == 1, format!("expected 1 eviction, got {}", evicted))?;
    let history = versions_of(&store, "shop")?;
    check(
        history == ["4", "3", "2"],
        format!("expected [4, 3, 2], got {:?}", history),
    )
}

fn applications_isolated<S: Store>(store: VersionStore<S>) -> Result<(), String> {
    store
        .save(&make_diagram("admin", "a"))
        .map_err(|e| e.to_string())?;
    for v in ["1", "2", "3", "4", "5"] {
        store
            .save(&make_diagram("shop", v))
            .map_err(|e| e.to_string())?;
    }
    let admin = versions_of(&store, "admin")?;
    check(admin == ["a"], format!("admin history disturbed: {:?}", admin))
}

fn corrupted_record_skipped<S: Store>(store: VersionStore<S>) -> Result<(), String> {
    store
        .save(&make_diagram("shop", "1"))
        .map_err(|e| e.to_string())?;
    let bad = store
        .save(&make_diagram("shop", "2"))
        .map_err(|e| e.to_string())?;
    store
        .store()
        .set(&bad.key, "not json at all")
        .map_err(|e| e.to_string())?;
    let history = versions_of(&store, "shop")?;
    check(history == ["1"], format!("expected [1], got {:?}", history))
}

fn record_round_trips_diagram<S: Store>(store: VersionStore<S>) -> Result<(), String> {
    let diagram = make_diagram("shop", "7");
    store.save(&diagram).map_err(|e| e.to_string())?;
    let latest = store.get_latest("shop").map_err(|e| e.to_string())?;
    check(
        latest.as_ref() == Some(&diagram),
        "stored diagram differs from saved diagram",
    )
}
