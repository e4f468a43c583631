use std::error::Error;
use std::io::{ self, Write };
use std::sync::atomic::{ AtomicU64, Ordering };
use std::sync::{ Arc, Mutex };
use log::info;
use tokio::io::{ AsyncBufReadExt, BufReader };

use super::{ BubbleId, BubbleKind, ChatView, ChatWidget, HttpRelayClient };
use crate::cli::ChatArgs;

/// Renders bubbles as lines on stdout. The placeholder stays on its own unterminated line so
/// it can be erased in place.
#[derive(Default)]
pub struct TerminalView {
    next_id: AtomicU64,
    placeholder: Mutex<Option<BubbleId>>,
}

impl TerminalView {
    pub fn new() -> Self {
        Self::default()
    }

    fn label(kind: BubbleKind) -> &'static str {
        match kind {
            BubbleKind::User => "you",
            BubbleKind::Assistant => "assistant",
            BubbleKind::Thinking => "...",
            BubbleKind::Error => "error",
        }
    }

    pub fn render_line(kind: BubbleKind, text: &str) -> String {
        format!("[{}] {}", Self::label(kind), text)
    }
}

impl ChatView for TerminalView {
    fn set_open(&self, open: bool) {
        println!("{}", if open { "-- chat opened (/close, /open, /quit) --" } else { "-- chat closed --" });
    }

    fn focus_input(&self) {}

    fn clear_input(&self) {}

    fn set_busy(&self, _busy: bool) {}

    fn append_bubble(&self, kind: BubbleKind, text: &str) -> BubbleId {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let line = Self::render_line(kind, text);
        let mut stdout = io::stdout();
        if kind == BubbleKind::Thinking {
            if let Ok(mut slot) = self.placeholder.lock() {
                *slot = Some(id);
            }
            let _ = write!(stdout, "{}", line);
        } else {
            let _ = writeln!(stdout, "{}", line);
        }
        let _ = stdout.flush();
        id
    }

    fn remove_bubble(&self, id: BubbleId) {
        let mut slot = match self.placeholder.lock() {
            Ok(slot) => slot,
            Err(_) => {
                return;
            }
        };
        if *slot == Some(id) {
            *slot = None;
            let mut stdout = io::stdout();
            let _ = write!(stdout, "\r\x1b[2K");
            let _ = stdout.flush();
        }
    }
}

/// Reads lines from stdin and submits each one through the widget.
pub async fn run_terminal_chat(args: ChatArgs) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("Chatting with relay at {}", args.endpoint);
    let widget = Arc::new(ChatWidget::new(TerminalView::new(), HttpRelayClient::new(args.endpoint)));
    widget.open().await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut pending = None;
    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "/quit" => {
                break;
            }
            "/close" => widget.handle_key("Escape").await,
            "/open" => widget.open().await,
            _ => {
                if !widget.is_open().await {
                    println!("-- chat is closed, type /open --");
                    continue;
                }
                pending = Some(widget.spawn_submit(line));
            }
        }
    }

    if let Some(handle) = pending {
        handle.await?;
    }
    widget.close().await;
    Ok(())
}
