//! Client-side controller for the chat panel.
//!
//! [`ChatWidget`] owns the volatile conversation and the open/busy state. Rendering goes through
//! [`ChatView`] and the network call through [`RelayClient`], so the same controller drives a
//! browser surface, the terminal front end or a test double.

pub mod http;
pub mod terminal;

use async_trait::async_trait;
use log::{ debug, warn };
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::error::ClientError;
use crate::models::chat::{ ChatMessage, RelayRequest, MAX_HISTORY };

pub use self::http::HttpRelayClient;
pub use self::terminal::TerminalView;

pub const THINKING_TEXT: &str = "Thinking...";
pub const FALLBACK_ERROR: &str = "Unable to connect to assistant.";

pub type BubbleId = u64;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BubbleKind {
    User,
    Assistant,
    /// Transient placeholder shown while a request is in flight.
    Thinking,
    Error,
}

impl BubbleKind {
    pub fn css_class(&self) -> &'static str {
        match self {
            BubbleKind::User => "user",
            BubbleKind::Assistant => "assistant",
            BubbleKind::Thinking => "typing",
            BubbleKind::Error => "error",
        }
    }
}

/// The rendered surface the controller writes to. It never defines the elements itself.
pub trait ChatView: Send + Sync {
    fn set_open(&self, open: bool);
    fn focus_input(&self);
    fn clear_input(&self);
    /// Disables or re-enables the input and the send control.
    fn set_busy(&self, busy: bool);
    fn append_bubble(&self, kind: BubbleKind, text: &str) -> BubbleId;
    fn remove_bubble(&self, id: BubbleId);
}

#[async_trait]
pub trait RelayClient: Send + Sync {
    /// Returns the assistant reply, or the error text to show the user.
    async fn send(&self, request: &RelayRequest) -> Result<String, ClientError>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WidgetStatus {
    Idle,
    Busy,
    ErrorShown,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Blank input, or another request still in flight.
    Ignored,
    Replied,
    Failed,
}

#[derive(Debug, Default)]
struct WidgetState {
    open: bool,
    busy: bool,
    error_shown: bool,
    conversation: Vec<ChatMessage>,
}

pub struct ChatWidget<V, C> {
    view: V,
    client: C,
    state: Mutex<WidgetState>,
}

impl<V: ChatView, C: RelayClient> ChatWidget<V, C> {
    pub fn new(view: V, client: C) -> Self {
        Self { view, client, state: Mutex::new(WidgetState::default()) }
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub async fn is_open(&self) -> bool {
        self.state.lock().await.open
    }

    pub async fn status(&self) -> WidgetStatus {
        let state = self.state.lock().await;
        if state.busy {
            WidgetStatus::Busy
        } else if state.error_shown {
            WidgetStatus::ErrorShown
        } else {
            WidgetStatus::Idle
        }
    }

    pub async fn conversation(&self) -> Vec<ChatMessage> {
        self.state.lock().await.conversation.clone()
    }

    pub async fn open(&self) {
        self.set_open(true).await;
    }

    pub async fn close(&self) {
        self.set_open(false).await;
    }

    pub async fn toggle(&self) {
        let open = self.is_open().await;
        self.set_open(!open).await;
    }

    /// Escape closes an open panel; every other key is ignored.
    pub async fn handle_key(&self, key: &str) {
        if key == "Escape" && self.is_open().await {
            self.close().await;
        }
    }

    async fn set_open(&self, open: bool) {
        self.state.lock().await.open = open;
        self.view.set_open(open);
        if open {
            self.view.focus_input();
        }
    }

    pub async fn submit(&self, text: &str) -> SubmitOutcome {
        let message = text.trim();
        if message.is_empty() {
            return SubmitOutcome::Ignored;
        }

        // Busy is claimed under the lock; the lock is not held across the relay call.
        let (request, placeholder) = {
            let mut state = self.state.lock().await;
            if state.busy {
                debug!("Chat submit dropped: a request is already in flight");
                return SubmitOutcome::Ignored;
            }
            state.busy = true;
            state.error_shown = false;

            let skip = state.conversation.len().saturating_sub(MAX_HISTORY);
            let history = state.conversation[skip..].to_vec();
            state.conversation.push(ChatMessage::user(message));

            self.view.append_bubble(BubbleKind::User, message);
            self.view.clear_input();
            let placeholder = self.view.append_bubble(BubbleKind::Thinking, THINKING_TEXT);
            self.view.set_busy(true);

            (RelayRequest { message: message.to_string(), history }, placeholder)
        };

        let result = self.client.send(&request).await;

        let mut state = self.state.lock().await;
        self.view.remove_bubble(placeholder);
        let outcome = match result {
            Ok(reply) => {
                self.view.append_bubble(BubbleKind::Assistant, &reply);
                state.conversation.push(ChatMessage::assistant(reply));
                SubmitOutcome::Replied
            }
            Err(e) => {
                warn!("Chat request failed: {}", e);
                let text = e.to_string();
                let text = if text.trim().is_empty() { FALLBACK_ERROR.to_string() } else { text };
                self.view.append_bubble(BubbleKind::Error, &text);
                state.error_shown = true;
                SubmitOutcome::Failed
            }
        };
        state.busy = false;
        self.view.set_busy(false);
        self.view.focus_input();
        outcome
    }
}

impl<V, C> ChatWidget<V, C> where V: ChatView + 'static, C: RelayClient + 'static {
    /// Runs [`ChatWidget::submit`] as its own task, as a UI event handler would.
    pub fn spawn_submit(self: &Arc<Self>, text: impl Into<String>) -> JoinHandle<SubmitOutcome> {
        let widget = Arc::clone(self);
        let text = text.into();
        tokio::spawn(async move { widget.submit(&text).await })
    }
}
