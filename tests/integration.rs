//! Integration tests for the reqwest transport using wiremock.

use assistant_stream::model::AssistantContext;
use assistant_stream::{
    AssistantClient, ChatEvent, ChatRequest, ClientError, ClientOptions, EventKind, FileUpload, PageAccess, Reply,
};
use futures::StreamExt;
use serde_json::json;
use wiremock::matchers::{body_json, body_string_contains, header, header_regex, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn sse(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.as_bytes().to_vec(), "text/event-stream")
}

fn client_for(server: &MockServer) -> AssistantClient {
    AssistantClient::new(ClientOptions::new(format!("{}/api", server.uri()))).unwrap()
}

#[tokio::test]
async fn chat_stream_sends_full_request_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({
            "message": "What changed?",
            "include_citations": true,
            "top_k": 5,
            "conversation_id": "c-7",
            "attachment_ids": ["att-1"],
            "context": {"page": "reports", "hint": "quarterly"}
        })))
        .respond_with(sse("data: {\"type\":\"meta\",\"data\":{\"conversation_id\":\"c-7\"}}\n\n"))
        .expect(1)
        .mount(&server)
        .await;

    let request = ChatRequest::new("What changed?")
        .in_conversation("c-7")
        .with_attachments(["att-1"])
        .with_context(AssistantContext {
            page: Some("reports".into()),
            hint: Some("quarterly".into()),
            ..Default::default()
        });

    let events: Vec<ChatEvent> = client_for(&server)
        .chat_stream(&request)
        .await
        .unwrap()
        .map(|e| e.unwrap())
        .collect()
        .await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].conversation_id(), Some("c-7"));
}

#[tokio::test]
async fn chat_stream_decodes_events_in_order() {
    let server = MockServer::start().await;

    let body = concat!(
        "data: {\"type\":\"meta\",\"data\":{}}\n\n",
        ": keep-alive\n\n",
        "data: {\"type\":\"token\",\"data\":\"Hi\"}\n\n",
        "data: {\"type\":\"token\",\"data\":\" there\"}\n\n",
        "data: {\"type\":\"sources\",\"data\":[{\"source\":\"faq.md\",\"text\":\"...\",\"score\":0.42}]}\n\n",
    );
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(sse(body))
        .mount(&server)
        .await;

    let stream = client_for(&server)
        .chat_stream(&ChatRequest::new("hello"))
        .await
        .unwrap();
    let events: Vec<ChatEvent> = stream.map(|e| e.unwrap()).collect().await;

    let kinds: Vec<&EventKind> = events.iter().map(|e| &e.kind).collect();
    assert_eq!(
        kinds,
        vec![&EventKind::Meta, &EventKind::Token, &EventKind::Token, &EventKind::Sources]
    );
    assert_eq!(events[1].data, json!("Hi"));
}

#[tokio::test]
async fn chat_stream_collects_reply() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(sse(concat!(
            "data: {\"type\":\"meta\",\"data\":{\"conversation_id\":\"new-1\"}}\n\n",
            "data: {\"type\":\"token\",\"data\":\"Forty\"}\n\n",
            "data: {\"type\":\"token\",\"data\":\"-two\"}\n\n",
        )))
        .mount(&server)
        .await;

    let stream = client_for(&server)
        .chat_stream(&ChatRequest::new("answer?"))
        .await
        .unwrap();
    let reply = Reply::collect(stream).await.unwrap();
    assert_eq!(reply.content, "Forty-two");
    assert_eq!(reply.conversation_id.as_deref(), Some("new-1"));
}

#[tokio::test]
async fn chat_stream_empty_body_completes() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(sse(""))
        .mount(&server)
        .await;

    let stream = client_for(&server)
        .chat_stream(&ChatRequest::new("hello"))
        .await
        .unwrap();
    assert_eq!(stream.count().await, 0);
}

#[tokio::test]
async fn chat_stream_non_success_fails_with_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
        .expect(1)
        .mount(&server)
        .await;

    let err = client_for(&server)
        .chat_stream(&ChatRequest::new("hello"))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Status { status: 429, .. }));
    assert!(err.to_string().contains("rate limited"));
}

#[tokio::test]
async fn chat_stream_malformed_payload_ends_stream() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(sse(concat!(
            "data: {\"type\":\"token\",\"data\":\"ok\"}\n\n",
            "data: not-json\n\n",
            "data: {\"type\":\"token\",\"data\":\"never\"}\n\n",
        )))
        .mount(&server)
        .await;

    let mut stream = client_for(&server)
        .chat_stream(&ChatRequest::new("hello"))
        .await
        .unwrap();
    assert_eq!(stream.next().await.unwrap().unwrap().token(), Some("ok"));
    let err = stream.next().await.unwrap().unwrap_err();
    assert!(matches!(err, ClientError::Protocol { .. }));
    assert!(err.to_string().contains("not-json"));
    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn chat_stream_connection_refused() {
    let server = MockServer::start().await;
    let client = client_for(&server);
    drop(server);

    let err = client
        .chat_stream(&ChatRequest::new("hello"))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Http(_)));
}

#[tokio::test]
async fn session_cookie_and_extra_headers_are_sent() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/user"))
        .and(header("cookie", "sid=abc"))
        .and(header("x-tenant", "acme"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"user_id": "u1", "username": "ada"})))
        .expect(1)
        .mount(&server)
        .await;

    let options = ClientOptions::new(format!("{}/api", server.uri()))
        .with_session_cookie("sid=abc")
        .with_header("x-tenant", "acme");
    let user = AssistantClient::new(options).unwrap().get_user().await.unwrap().unwrap();
    assert_eq!(user.username.as_deref(), Some("ada"));
}

#[tokio::test]
async fn rotated_session_cookie_replaces_configured_one() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/admin/ingest"))
        .and(header("cookie", "sid=old"))
        .respond_with(ResponseTemplate::new(202).insert_header("set-cookie", "sid=new; Path=/"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/admin/reload"))
        .and(header("cookie", "sid=new"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/admin/reload"))
        .respond_with(ResponseTemplate::new(401).set_body_string("stale cookie"))
        .mount(&server)
        .await;

    let options = ClientOptions::new(format!("{}/api", server.uri())).with_session_cookie("sid=old");
    let client = AssistantClient::new(options).unwrap();
    client.reindex().await.unwrap();
    client.reload().await.unwrap();
}

#[tokio::test]
async fn get_user_returns_none_when_signed_out() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/user"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    assert_eq!(client_for(&server).get_user().await.unwrap(), None);
}

#[tokio::test]
async fn conversations_roundtrip() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/conversations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                {"conversation_id": "c1", "message_count": 2, "last_message_at": 1700000000},
                {"conversation_id": "c2", "message_count": 6, "last_message_at": 1700000100, "last_snippet": "thanks"}
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/conversations/c1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/conversations/c2/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "messages": [
                {"role": "user", "content": "hi"},
                {"role": "assistant", "content": "hello", "sources": []}
            ]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let conversations = client.list_conversations().await.unwrap();
    assert_eq!(conversations.len(), 2);
    assert_eq!(conversations[1].last_snippet.as_deref(), Some("thanks"));

    client.delete_conversation("c1").await.unwrap();

    let messages = client.conversation_messages("c2").await.unwrap();
    assert_eq!(messages[1].content, "hello");
}

#[tokio::test]
async fn attachments_and_upload() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/attachments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{"id": "a1", "filename": "plan.pdf", "size_bytes": 2048, "created_at": 1700000000.0}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/attachments/a1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .and(header_regex("content-type", "^multipart/form-data"))
        .and(body_string_contains("filename=\"notes.txt\""))
        .and(body_string_contains("meeting notes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"attachment_id": "a2"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let attachments = client.list_attachments().await.unwrap();
    assert_eq!(attachments[0].filename, "plan.pdf");
    assert_eq!(attachments[0].size_bytes, 2048);

    client.delete_attachment("a1").await.unwrap();

    let uploaded = client
        .upload_file(FileUpload::new("notes.txt", "meeting notes").with_content_type("text/plain"))
        .await
        .unwrap();
    assert_eq!(uploaded.attachment_id.as_deref(), Some("a2"));

    let raw = client.attachment_raw_url("a1").unwrap();
    assert_eq!(raw.as_str(), format!("{}/api/attachments/a1/raw", server.uri()));
}

#[tokio::test]
async fn admin_actions() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/admin/ingest"))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/admin/reload"))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.reindex().await.unwrap();
    let err = client.reload().await.unwrap_err();
    assert_eq!(err.to_string(), "HTTP 403: forbidden");
}

#[tokio::test]
async fn load_page_redirects_until_terms_accepted() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"user_id": "u1", "terms_required": true})))
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert_eq!(
        client.load_page("/chat").await,
        PageAccess::Redirect {
            status: 303,
            location: "/accept-terms"
        }
    );
    assert!(matches!(
        client.load_page("/terms").await,
        PageAccess::Render { needs_terms: true, .. }
    ));
}
