use hackterm_core::{BackendReply, Conversation, Endpoint, HttpTransport, Transport, TransportError};
use ratatui::layout::Rect;
use tokio::sync::mpsc;

use crate::tui::AppEvent;

pub struct App {
    pub should_quit: bool,
    pub conversation: Conversation,

    // Input state
    pub input: String,
    /// Cursor position in chars, not bytes.
    pub cursor: usize,
    pub default_endpoint: Endpoint,

    // Chat window state
    pub scroll: u16,
    /// Keep the newest message in view. Cleared when the user scrolls up.
    pub follow_bottom: bool,
    pub chat_area: Option<Rect>,

    // Header state. `None` until the first probe answers.
    pub connected: Option<bool>,

    // Loading animation frame (0-2) for the processing indicator
    pub animation_frame: u8,

    transport: HttpTransport,
    events: mpsc::UnboundedSender<AppEvent>,
}

impl App {
    pub fn new(
        transport: HttpTransport,
        default_endpoint: Endpoint,
        events: mpsc::UnboundedSender<AppEvent>,
    ) -> Self {
        Self {
            should_quit: false,
            conversation: Conversation::new(),

            input: String::new(),
            cursor: 0,
            default_endpoint,

            scroll: 0,
            follow_bottom: true,
            chat_area: None,

            connected: None,

            animation_frame: 0,

            transport,
            events,
        }
    }

    pub fn base_url(&self) -> &str {
        self.transport.base_url()
    }

    /// Submit the input buffer to `endpoint`.
    ///
    /// The request runs on a background task and reports back through an
    /// [`AppEvent::Settled`] event. Nothing happens for blank input.
    pub fn submit(&mut self, endpoint: Endpoint) {
        let Some(request) = self.conversation.begin(&mut self.input, endpoint) else {
            return;
        };
        self.cursor = 0;
        self.follow_bottom = true;

        tracing::debug!(endpoint = request.endpoint.as_str(), "dispatching request");

        let transport = self.transport.clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            let outcome = transport.send(request.endpoint, &request.message).await;
            let _ = events.send(AppEvent::Settled { endpoint: request.endpoint, outcome });
        });
    }

    pub fn on_settled(&mut self, endpoint: Endpoint, outcome: Result<BackendReply, TransportError>) {
        let failed = outcome.is_err();
        self.conversation.settle(endpoint, outcome);
        self.follow_bottom = true;

        if failed {
            self.connected = Some(false);
        }
        self.probe_health();
    }

    /// Check the backend's health route in the background.
    pub fn probe_health(&self) {
        let transport = self.transport.clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            let healthy = match transport.health().await {
                Ok(healthy) => healthy,
                Err(e) => {
                    tracing::debug!(error = %e, "health probe failed");
                    false
                }
            };
            let _ = events.send(AppEvent::Health(healthy));
        });
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.conversation.is_pending() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.scroll = self.scroll.saturating_sub(lines);
        self.follow_bottom = false;
    }

    /// Scrolling past the end is clamped at render time, which also
    /// re-enables following.
    pub fn scroll_down(&mut self, lines: u16) {
        self.scroll = self.scroll.saturating_add(lines);
    }

    /// Half the visible chat height, for page scrolling.
    pub fn page_height(&self) -> u16 {
        self.chat_area
            .map(|area| area.height.saturating_sub(2) / 2)
            .unwrap_or(10)
            .max(1)
    }
}
