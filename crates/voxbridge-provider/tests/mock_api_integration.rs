use serde_json::{json, Value};
use voxbridge_provider::{ConversationSource, ElevenLabsClient, VapiClient};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn elevenlabs_follows_cursor_pagination() {
    let server = MockServer::start().await;

    // Page 2, matched on the cursor taken from page 1. Mounted first so the
    // cursorless first request can only hit the page-1 mock below.
    Mock::given(method("GET"))
        .and(path("/v1/convai/conversations"))
        .and(query_param("cursor", "cur_2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "conversations": [{"conversation_id": "conv_3"}],
            "has_more": false
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/convai/conversations"))
        .and(query_param("page_size", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "conversations": [
                {"conversation_id": "conv_1"},
                {"conversation_id": "conv_2"}
            ],
            "has_more": true,
            "next_cursor": "cur_2"
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    let client = ElevenLabsClient::new("test-key", server.uri());
    let items = client.list_conversations().await.unwrap();

    let ids: Vec<&str> = items
        .iter()
        .filter_map(|c| c.get("conversation_id").and_then(Value::as_str))
        .collect();
    assert_eq!(ids, vec!["conv_1", "conv_2", "conv_3"]);
}

#[tokio::test]
async fn elevenlabs_sends_api_key_header() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/convai/conversations"))
        .and(header("xi-api-key", "secret-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "conversations": [],
            "has_more": false
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = ElevenLabsClient::new("secret-key", server.uri());
    let items = client.list_conversations().await.unwrap();
    assert!(items.is_empty());
}

#[tokio::test]
async fn elevenlabs_server_error_is_an_error_not_an_empty_list() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/convai/conversations"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&server)
        .await;

    let client = ElevenLabsClient::new("test-key", server.uri());
    let err = client.list_conversations().await.unwrap_err();
    assert!(err.to_string().contains("[retryable]"), "{err}");
}

#[tokio::test]
async fn elevenlabs_fetches_one_conversation_by_id() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/convai/conversations/conv_42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "conversation_id": "conv_42",
            "status": "done"
        })))
        .mount(&server)
        .await;

    let client = ElevenLabsClient::new("test-key", server.uri());
    let body = client.get_conversation("conv_42").await.unwrap();
    assert_eq!(
        body.get("conversation_id").and_then(Value::as_str),
        Some("conv_42")
    );
}

#[tokio::test]
async fn elevenlabs_lists_agent_catalog() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/convai/agents"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "agents": [{"agent_id": "agent_1", "name": "Receptionist"}],
            "has_more": false
        })))
        .mount(&server)
        .await;

    let client = ElevenLabsClient::new("test-key", server.uri());
    let agents = client.list_assistants().await.unwrap();
    assert_eq!(agents.len(), 1);
}

fn vapi_page(start: usize, count: usize) -> Vec<Value> {
    (start..start + count)
        .map(|i| {
            json!({
                "id": format!("call_{i}"),
                "createdAt": format!("2024-01-01T00:{:02}:{:02}Z", i / 60, i % 60)
            })
        })
        .collect()
}

#[tokio::test]
async fn vapi_walks_created_at_cursor_until_short_page() {
    let server = MockServer::start().await;
    let page1 = vapi_page(0, 100);
    let last_created_at = page1
        .last()
        .and_then(|c| c.get("createdAt"))
        .and_then(Value::as_str)
        .unwrap()
        .to_string();

    Mock::given(method("GET"))
        .and(path("/call"))
        .and(query_param("createdAtLt", last_created_at.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(vapi_page(100, 3))))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/call"))
        .and(header("authorization", "Bearer vapi-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(page1)))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    let client = VapiClient::new("vapi-key", server.uri());
    let items = client.list_conversations().await.unwrap();
    assert_eq!(items.len(), 103);
    assert_eq!(
        items.last().and_then(|c| c.get("id")).and_then(Value::as_str),
        Some("call_102")
    );
}

#[tokio::test]
async fn vapi_error_status_propagates() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/call"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
        .mount(&server)
        .await;

    let client = VapiClient::new("wrong", server.uri());
    let err = client.list_conversations().await.unwrap_err();
    assert!(err.to_string().contains("401"), "{err}");
}
