use super::{check, CheckOutcome};
use crate::Store;

pub(super) fn run_kv_tests<S, F>(factory: &F) -> Vec<CheckOutcome>
where
    S: Store,
    F: Fn() -> S,
{
    let tests: [(&'static str, fn(&S) -> Result<(), String>); 9] = [
        ("get_missing_is_none", get_missing_is_none),
        ("set_then_get", set_then_get),
        ("set_overwrites", set_overwrites),
        ("delete_removes", delete_removes),
        ("delete_missing_is_ok", delete_missing_is_ok),
        ("prefix_filters_exactly", prefix_filters_exactly),
        ("prefix_results_sorted", prefix_results_sorted),
        ("keys_with_awkward_characters", keys_with_awkward_characters),
        ("lock_can_be_retaken", lock_can_be_retaken),
    ];

    tests
        .iter()
        .map(|&(name, test)| CheckOutcome::new("kv", name, test(&factory())))
        .collect()
}

fn get_missing_is_none<S: Store>(store: &S) -> Result<(), String> {
    let got = store.get("absent").map_err(|e| e.to_string())?;
    check(got.is_none(), format!("expected None, got {:?}", got))
}

fn set_then_get<S: Store>(store: &S) -> Result<(), String> {
    store.set("k", "v1").map_err(|e| e.to_string())?;
    let got = store.get("k").map_err(|e| e.to_string())?;
    check(got.as_deref() == Some("v1"), format!("expected v1, got {:?}", got))
}

fn set_overwrites<S: Store>(store: &S) -> Result<(), String> {
    store.set("k", "v1").map_err(|e| e.to_string())?;
    store.set("k", "v2").map_err(|e| e.to_string())?;
    let got = store.get("k").map_err(|e| e.to_string())?;
    check(got.as_deref() == Some("v2"), format!("expected v2, got {:?}", got))
}

fn delete_removes<S: Store>(store: &S) -> Result<(), String> {
    store.set("k", "v").map_err(|e| e.to_string())?;
    store.delete("k").map_err(|e| e.to_string())?;
    let got = store.get("k").map_err(|e| e.to_string())?;
    check(got.is_none(), format!("expected None after delete, got {:?}", got))?;
    let keys = store.keys_with_prefix("").map_err(|e| e.to_string())?;
    check(keys.is_empty(), format!("expected no keys, got {:?}", keys))
}

fn delete_missing_is_ok<S: Store>(store: &S) -> Result<(), String> {
    store
        .delete("never-written")
        .map_err(|e| format!("delete of absent key failed: {}", e))
}

fn prefix_filters_exactly<S: Store>(store: &S) -> Result<(), String> {
    for key in ["a-1", "a-2", "ab-1", "b-1"] {
        store.set(key, "x").map_err(|e| e.to_string())?;
    }
    let keys = store.keys_with_prefix("a-").map_err(|e| e.to_string())?;
    check(
        keys == vec!["a-1".to_string(), "a-2".to_string()],
        format!("expected [a-1, a-2], got {:?}", keys),
    )
}

fn prefix_results_sorted<S: Store>(store: &S) -> Result<(), String> {
    for key in ["p-3", "p-1", "p-2"] {
        store.set(key, "x").map_err(|e| e.to_string())?;
    }
    let keys = store.keys_with_prefix("p-").map_err(|e| e.to_string())?;
    check(
        keys == vec!["p-1".to_string(), "p-2".to_string(), "p-3".to_string()],
        format!("expected sorted keys, got {:?}", keys),
    )
}

fn keys_with_awkward_characters<S: Store>(store: &S) -> Result<(), String> {
    let key = "ns-states-My App/v2.0-00000000000000000001";
    store.set(key, "{}").map_err(|e| e.to_string())?;
    let got = store.get(key).map_err(|e| e.to_string())?;
    check(got.as_deref() == Some("{}"), format!("value lost: {:?}", got))?;
    let keys = store
        .keys_with_prefix("ns-states-My App/")
        .map_err(|e| e.to_string())?;
    check(keys == vec![key.to_string()], format!("listing lost key: {:?}", keys))
}

fn lock_can_be_retaken<S: Store>(store: &S) -> Result<(), String> {
    let first = store.lock_exclusive("app").map_err(|e| e.to_string())?;
    drop(first);
    let _second = store.lock_exclusive("app").map_err(|e| e.to_string())?;
    store.set("after-lock", "1").map_err(|e| e.to_string())?;
    check(
        store.keys_with_prefix("").map_err(|e| e.to_string())? == vec!["after-lock"],
        "lock bookkeeping must not show up as keys",
    )
}
