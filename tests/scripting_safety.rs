use debug_modules::modules::{Dispatcher, FailureReason, ModuleLoader, ModuleRegistry};
use debug_modules::scripting::RhaiEngine;
use serde_json::json;
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

fn dispatcher_for(source: &str, max_operations: u64) -> (TempDir, Dispatcher) {
    let root = TempDir::new().unwrap();
    let dir = root.path().join("loop_debug");
    fs::create_dir(&dir).unwrap();
    fs::write(dir.join("module.yaml"), "name: loop\n").unwrap();
    fs::write(dir.join("interface.html"), "<div/>").unwrap();
    fs::write(dir.join("handlers.rhai"), source).unwrap();

    let loader = ModuleLoader::with_engine(RhaiEngine::with_limit(max_operations));
    let registry = Arc::new(ModuleRegistry::new(root.path(), loader));
    registry.refresh().unwrap();
    (root, Dispatcher::new(registry))
}

#[test]
fn test_runaway_handler_is_stopped() {
    let (_root, dispatcher) = dispatcher_for("fn handle_spin(p) { loop { } }", 10_000);
    let envelope = dispatcher.dispatch("loop", "spin", &json!({}));

    assert!(!envelope.success);
    assert_eq!(envelope.reason(), Some(FailureReason::HandlerError));
    assert!(envelope.error.unwrap().contains("Safety limit exceeded"));
}

#[test]
fn test_budget_is_per_call() {
    let source = r#"
fn handle_count(p) {
    let total = 0;
    for i in 0..100 { total += i; }
    #{ success: true, data: total }
}
"#;
    let (_root, dispatcher) = dispatcher_for(source, 5_000);
    for _ in 0..20 {
        let envelope = dispatcher.dispatch("loop", "count", &json!({}));
        assert_eq!(envelope.data, Some(json!(4950)));
    }
}

#[test]
fn test_runaway_top_level_is_a_load_error() {
    let root = TempDir::new().unwrap();
    let dir = root.path().join("init_debug");
    fs::create_dir(&dir).unwrap();
    fs::write(dir.join("module.yaml"), "name: init\n").unwrap();
    fs::write(dir.join("interface.html"), "<div/>").unwrap();
    fs::write(dir.join("handlers.rhai"), "loop { }\nfn handle_x(p) { #{ success: true } }").unwrap();

    let loader = ModuleLoader::with_engine(RhaiEngine::with_limit(1_000));
    let report = loader.scan(root.path()).unwrap();
    assert!(report.modules.is_empty());
    assert!(report.skipped[0].reason.contains("Safety limit"));
}

#[test]
fn test_top_level_cost_is_not_charged_to_calls() {
    let source = r#"
let warmup = 0;
for i in 0..500 { warmup += i; }

fn handle_work(p) {
    let total = 0;
    for i in 0..500 { total += i; }
    #{ success: true, data: total }
}
"#;
    let (_root, dispatcher) = dispatcher_for(source, 2_000);
    for _ in 0..5 {
        let envelope = dispatcher.dispatch("loop", "work", &json!({}));
        assert!(envelope.success, "{:?}", envelope.error);
        assert_eq!(envelope.data, Some(json!(124_750)));
    }
}
