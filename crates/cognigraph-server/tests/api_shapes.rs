//! Wire-shape tests — validates that response bodies match what the
//! graph-explorer frontend parses, including the `wait <N>s` detail
//! convention on rate-limited failures.

/// /upload and /graph return the full graph: `{nodes, links}` where
/// nodes carry `id` and links carry `source`/`target`.
#[test]
fn test_graph_response_shape() {
    let response = serde_json::json!({
        "nodes": [
            {"id": "alice", "label": "Alice", "type": "person", "group": 1},
            {"id": "acme corp", "label": "Acme Corp", "type": "organization", "group": 2},
        ],
        "links": [
            {"source": "alice", "target": "acme corp", "label": "works at"},
        ],
    });

    assert!(response["nodes"].is_array());
    assert!(response["links"].is_array());

    let node = &response["nodes"][0];
    assert!(node["id"].is_string());
    assert!(node["label"].is_string());
    assert!(node["group"].is_number());

    let link = &response["links"][0];
    assert!(link["source"].is_string());
    assert!(link["target"].is_string());
    assert!(link["label"].is_string());
}

/// /reset returns the empty graph shape, not null fields.
#[test]
fn test_reset_response_shape() {
    let response = serde_json::json!({ "nodes": [], "links": [] });
    assert_eq!(response["nodes"].as_array().unwrap().len(), 0);
    assert_eq!(response["links"].as_array().unwrap().len(), 0);
}

/// /chat returns `{response, highlighted_nodes, sources}`.
#[test]
fn test_chat_response_shape() {
    let response = serde_json::json!({
        "response": "Alice works at Acme Corp.",
        "highlighted_nodes": ["alice", "acme corp"],
        "sources": ["Alice works at Acme Corp."],
    });

    assert!(response["response"].is_string());
    assert!(response["highlighted_nodes"].is_array());
    assert!(response["highlighted_nodes"][0].is_string());
    assert!(response["sources"].is_array());
}

/// Failures are `{detail}`; rate limits add the numeric field and the
/// `wait <N>s` substring the frontend countdown parses.
#[test]
fn test_error_detail_shape() {
    let rate_limited = serde_json::json!({
        "detail": "Rate limit reached, retry after 45s. Please wait 45s (wait 45s) before trying again.",
        "retry_after_seconds": 45,
    });

    assert!(rate_limited["detail"].is_string());
    assert!(rate_limited["retry_after_seconds"].is_number());
    let detail = rate_limited["detail"].as_str().unwrap();
    assert!(detail.contains("wait 45s"));

    let plain = serde_json::json!({
        "detail": "No document has been uploaded for this session",
    });
    assert!(plain["detail"].is_string());
    assert!(plain.get("retry_after_seconds").is_none());
}

/// /health reports liveness.
#[test]
fn test_health_response_shape() {
    let response = serde_json::json!({
        "status": "online",
        "message": "CogniGraph backend is running",
    });
    assert_eq!(response["status"], "online");
    assert!(response["message"].is_string());
}
