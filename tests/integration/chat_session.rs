use crate::common::{spawn_server, test_app, ScriptedBackend};
use aramiyot::client::chat::{
    CHAT_HISTORY_KEY, FALLBACK_ERROR_TEXT, GREETING_ID, IMAGE_ONLY_INQUIRY,
};
use aramiyot::client::{ApiClient, ChatSession, LocalStorage};
use aramiyot::models::{Attachment, ChatMessage, Sender};
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn storage(dir: &TempDir) -> Arc<LocalStorage> {
    Arc::new(LocalStorage::open(dir.path().join("local_storage.json")).unwrap())
}

#[tokio::test]
async fn test_send_streams_reply_into_transcript() {
    let base_url = spawn_server(test_app(Arc::new(ScriptedBackend::chat(&["I recommend ", "rest."]))).await).await;
    let dir = TempDir::new().unwrap();
    let mut session = ChatSession::open(ApiClient::new(base_url), storage(&dir));

    let mut snapshots: Vec<Vec<ChatMessage>> = Vec::new();
    let reply = session
        .send("I have a headache", None, |messages| snapshots.push(messages.to_vec()))
        .await
        .unwrap();

    assert_eq!(reply, "I recommend rest.");

    let messages = session.messages();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[0].id, GREETING_ID);
    assert_eq!(messages[1].sender, Sender::User);
    assert_eq!(messages[1].text, "I have a headache");
    assert_eq!(messages[2].sender, Sender::Ai);
    assert_eq!(messages[2].text, "I recommend rest.");

    // The placeholder is visible before any text arrives
    assert!(snapshots.iter().any(|s| s.len() == 3 && s[2].text.is_empty()));
}

#[tokio::test]
async fn test_image_only_message_streams_reply() {
    let backend = Arc::new(ScriptedBackend::chat(&["That looks ", "like a mild rash."]));
    let base_url = spawn_server(test_app(backend.clone()).await).await;
    let dir = TempDir::new().unwrap();
    let mut session = ChatSession::open(ApiClient::new(base_url), storage(&dir));

    let attachment = Attachment::from_image_bytes("rash.png", "image/png", b"png-bytes").unwrap();
    let reply = session.send("", Some(attachment), |_| {}).await.unwrap();

    assert_eq!(reply, "That looks like a mild rash.");
    let messages = session.messages();
    assert_eq!(messages[1].text, "");
    assert!(messages[1].attachment.is_some());
    assert_eq!(messages[2].text, "That looks like a mild rash.");

    let prompt = &backend.prompts()[0];
    assert!(prompt.ends_with(&format!("User Inquiry: {}", IMAGE_ONLY_INQUIRY)));
    assert!(prompt.contains("attached an image"));
}

#[tokio::test]
async fn test_transcript_round_trips_through_storage() {
    let base_url = spawn_server(test_app(Arc::new(ScriptedBackend::chat(&["Stay hydrated."]))).await).await;
    let dir = TempDir::new().unwrap();
    let store = storage(&dir);

    let mut session = ChatSession::open(ApiClient::new(base_url.clone()), store.clone());
    let attachment = Attachment::from_image_bytes("photo.png", "image/png", b"png-bytes").unwrap();
    session
        .send("Is this normal?", Some(attachment), |_| {})
        .await
        .unwrap();
    let before = session.messages().to_vec();

    let reopened = ChatSession::open(ApiClient::new(base_url), store.clone());
    assert_eq!(reopened.messages(), before.as_slice());
    assert!(reopened.messages()[1].attachment.is_some());

    // Persisted to disk, not only held in memory
    let from_disk = LocalStorage::open(store.path()).unwrap();
    assert!(from_disk.get_item(CHAT_HISTORY_KEY).is_some());
}

#[tokio::test]
async fn test_server_error_is_rendered_into_placeholder() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/ai-chat-stream"))
        .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
            "error": "Failed to process chat stream",
            "details": "The assistant is unavailable right now."
        })))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut session = ChatSession::open(ApiClient::new(server.uri()), storage(&dir));
    let reply = session.send("hello", None, |_| {}).await.unwrap();

    assert_eq!(
        reply,
        "API Error: 500 Internal Server Error. The assistant is unavailable right now."
    );
    let last = session.messages().last().unwrap();
    assert_eq!(last.text, reply);
    assert!(last.attachment.is_none());
}

#[tokio::test]
async fn test_unreachable_server_uses_fallback_text() {
    // Bind then drop to get a port with nothing listening
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let dir = TempDir::new().unwrap();
    let mut session = ChatSession::open(ApiClient::new(format!("http://{}", addr)), storage(&dir));
    let reply = session.send("hello", None, |_| {}).await.unwrap();

    assert_eq!(reply, FALLBACK_ERROR_TEXT);
    assert_eq!(session.messages().len(), 3);
}

#[tokio::test]
async fn test_multibyte_reply_is_decoded() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/ai-chat-stream"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/plain; charset=utf-8")
                .set_body_bytes("מנוחה טובה 🌿".as_bytes().to_vec()),
        )
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut session = ChatSession::open(ApiClient::new(server.uri()), storage(&dir));
    let reply = session.send("rest?", None, |_| {}).await.unwrap();

    assert_eq!(reply, "מנוחה טובה 🌿");
}
