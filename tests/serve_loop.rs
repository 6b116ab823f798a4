//! Tests for the JSON-lines request loop.

use debug_modules::modules::{Dispatcher, ModuleLoader, ModuleRegistry};
use debug_modules::serve::serve;
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::io::BufReader;

fn write_ping_module(root: &Path, dir: &str, name: &str) {
    let path = root.join(dir);
    fs::create_dir_all(&path).unwrap();
    fs::write(path.join("module.yaml"), format!("name: {}\nactions: [ping]\n", name)).unwrap();
    fs::write(path.join("interface.html"), "<button>ping</button>").unwrap();
    fs::write(
        path.join("handlers.rhai"),
        r#"fn handle_ping(payload) { #{ success: true, data: "pong" } }"#,
    )
    .unwrap();
}

async fn run(dispatcher: Dispatcher, input: &str) -> Vec<Value> {
    let mut output = Vec::new();
    serve(dispatcher, BufReader::new(input.as_bytes()), &mut output)
        .await
        .unwrap();
    String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[tokio::test]
async fn test_one_response_per_request() {
    let root = TempDir::new().unwrap();
    write_ping_module(root.path(), "a_debug", "a");
    let registry = Arc::new(ModuleRegistry::new(root.path(), ModuleLoader::new()));
    registry.refresh().unwrap();

    let input = concat!(
        "{\"module\": \"a\", \"action\": \"ping\", \"payload\": {}}\n",
        "\n",
        "{\"module\": \"b\", \"action\": \"ping\"}\n",
        "not json\n",
    );
    let responses = run(Dispatcher::new(registry), input).await;

    assert_eq!(responses.len(), 3);
    assert_eq!(responses[0], json!({"success": true, "data": "pong"}));
    assert_eq!(responses[1]["error"], json!("unknown_module"));
    assert_eq!(responses[2]["error"], json!("invalid_request"));
}

#[tokio::test]
async fn test_refresh_command_loads_new_modules() {
    let root = TempDir::new().unwrap();
    write_ping_module(root.path(), "a_debug", "a");
    let registry = Arc::new(ModuleRegistry::new(root.path(), ModuleLoader::new()));
    registry.refresh().unwrap();

    write_ping_module(root.path(), "c_debug", "c");
    let input = concat!(
        "{\"module\": \"c\", \"action\": \"ping\"}\n",
        "{\"command\": \"refresh\"}\n",
        "{\"module\": \"c\", \"action\": \"ping\"}\n",
        "{\"command\": \"list\"}\n",
    );
    let responses = run(Dispatcher::new(registry), input).await;

    assert_eq!(responses[0]["error"], json!("unknown_module"));
    assert_eq!(responses[1]["success"], json!(true));
    assert_eq!(responses[1]["data"]["loaded"], json!(2));
    assert_eq!(responses[1]["data"]["skipped"], json!([]));
    assert_eq!(responses[2]["data"], json!("pong"));

    let ids: Vec<&str> = responses[3]["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["a", "c"]);
}

#[tokio::test]
async fn test_failed_refresh_is_reported() {
    let parent = TempDir::new().unwrap();
    let root = parent.path().join("modules");
    fs::create_dir(&root).unwrap();
    write_ping_module(&root, "a_debug", "a");
    let registry = Arc::new(ModuleRegistry::new(&root, ModuleLoader::new()));
    registry.refresh().unwrap();
    fs::remove_dir_all(&root).unwrap();

    let input = concat!(
        "{\"command\": \"refresh\"}\n",
        "{\"module\": \"a\", \"action\": \"ping\"}\n",
    );
    let responses = run(Dispatcher::new(registry), input).await;

    assert_eq!(responses[0]["error"], json!("refresh_failed"));
    assert_eq!(responses[1]["data"], json!("pong"));
}
