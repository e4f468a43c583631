use axum::{ http::StatusCode, routing::post, Json, Router };
use serde_json::{ json, Value };
use site_chat_relay::config::RelayConfig;
use site_chat_relay::llm::chat::OpenAIChatClient;
use site_chat_relay::models::chat::{ ChatMessage, Role };
use site_chat_relay::server::api::{ router, AppState, CHAT_PATH };
use site_chat_relay::widget::{ BubbleId, BubbleKind, ChatView, ChatWidget, HttpRelayClient, SubmitOutcome };
use std::sync::atomic::{ AtomicU64, Ordering };
use std::sync::{ Arc, Mutex };

#[derive(Default)]
struct ListView {
    next_id: AtomicU64,
    bubbles: Mutex<Vec<(BubbleId, BubbleKind, String)>>,
    removed: Mutex<Vec<BubbleId>>,
}

impl ListView {
    fn visible(&self) -> Vec<(BubbleKind, String)> {
        self.bubbles
            .lock()
            .unwrap()
            .iter()
            .map(|(_, kind, text)| (*kind, text.clone()))
            .collect()
    }
}

impl ChatView for ListView {
    fn set_open(&self, _open: bool) {}
    fn focus_input(&self) {}
    fn clear_input(&self) {}
    fn set_busy(&self, _busy: bool) {}

    fn append_bubble(&self, kind: BubbleKind, text: &str) -> BubbleId {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.bubbles.lock().unwrap().push((id, kind, text.to_string()));
        id
    }

    fn remove_bubble(&self, id: BubbleId) {
        self.removed.lock().unwrap().push(id);
        self.bubbles.lock().unwrap().retain(|(bid, _, _)| *bid != id);
    }
}

async fn spawn(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Fake provider that echoes the number of prompt messages it received.
async fn spawn_upstream(seen: Arc<Mutex<Vec<Value>>>) -> String {
    let app = Router::new().route(
        "/v1/chat/completions",
        post(move |Json(body): Json<Value>| {
            let seen = seen.clone();
            async move {
                seen.lock().unwrap().push(body.clone());
                if body["messages"].as_array().map(|m| m.len()).unwrap_or(0) > 2 {
                    return (
                        StatusCode::OK,
                        Json(json!({ "choices": [{ "message": { "content": " Welcome back. " } }] })),
                    );
                }
                (StatusCode::OK, Json(json!({ "choices": [{ "message": { "content": "Hi there!" } }] })))
            }
        })
    );
    format!("{}/v1/chat/completions", spawn(app).await)
}

async fn spawn_relay(api_url: String) -> String {
    let state = AppState {
        config: Arc::new(RelayConfig {
            api_key: Some("sk-test".into()),
            api_url,
            ..RelayConfig::default()
        }),
        transport: Arc::new(OpenAIChatClient::new().unwrap()),
    };
    format!("{}{}", spawn(router(state)).await, CHAT_PATH)
}

#[tokio::test]
async fn widget_talks_to_relay_and_upstream() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let upstream = spawn_upstream(seen.clone()).await;
    let relay = spawn_relay(upstream).await;

    let widget = ChatWidget::new(ListView::default(), HttpRelayClient::new(relay));
    widget.open().await;

    assert_eq!(widget.submit("Hello").await, SubmitOutcome::Replied);
    assert_eq!(widget.view().visible(), vec![
        (BubbleKind::User, "Hello".to_string()),
        (BubbleKind::Assistant, "Hi there!".to_string())
    ]);
    assert_eq!(widget.view().removed.lock().unwrap().len(), 1);
    assert_eq!(widget.conversation().await, vec![
        ChatMessage::user("Hello"),
        ChatMessage::assistant("Hi there!")
    ]);

    assert_eq!(widget.submit("I'm back").await, SubmitOutcome::Replied);
    assert_eq!(widget.conversation().await.last(), Some(&ChatMessage::assistant("Welcome back.")));

    let bodies = seen.lock().unwrap().clone();
    assert_eq!(bodies.len(), 2);
    assert_eq!(bodies[0]["messages"][0]["role"], Role::System.as_str());
    assert_eq!(bodies[1]["messages"].as_array().unwrap().len(), 4);
    assert_eq!(bodies[1]["messages"][3], json!({ "role": "user", "content": "I'm back" }));
    assert_eq!(bodies[1]["temperature"], 0.5);
    assert_eq!(bodies[1]["max_tokens"], 260);
}

#[tokio::test]
async fn relay_errors_reach_the_widget() {
    let app = Router::new().route(
        "/v1/chat/completions",
        post(|| async { (StatusCode::TOO_MANY_REQUESTS, Json(json!({ "error": { "message": "Rate limited" } }))) })
    );
    let upstream = format!("{}/v1/chat/completions", spawn(app).await);
    let relay = spawn_relay(upstream).await;

    let widget = ChatWidget::new(ListView::default(), HttpRelayClient::new(relay));
    assert_eq!(widget.submit("Hello").await, SubmitOutcome::Failed);
    assert_eq!(widget.view().visible(), vec![
        (BubbleKind::User, "Hello".to_string()),
        (BubbleKind::Error, "Rate limited".to_string())
    ]);
}
