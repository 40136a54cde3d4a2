use chat_viewport::config::ViewportConfig;
use chat_viewport::model::{ContentKind, ConversationId, Message, MessageId, MessageKey, ServerId};
use chat_viewport::store::{MemoryStore, MessageStore};
use chat_viewport::viewport::{
    Effect, PageRequest, ScheduledTask, ScrollCommand, Ticket, Viewport, ViewportEvent,
};
use std::rc::Rc;
use std::time::Duration;

pub const VIEWPORT_HEIGHT: u32 = 640;
/// Pixel estimate for a text row with the default config.
pub const TEXT_HEIGHT: u64 = 64;

pub fn general() -> ConversationId {
    ConversationId::new("general")
}

pub fn key(id: &str) -> MessageKey {
    MessageKey::Server(ServerId::new(id))
}

pub fn text_message(conversation: &ConversationId, n: usize) -> Message {
    Message::new(
        MessageId::server(ServerId::new(format!("m{n}"))),
        conversation.clone(),
        n as u64,
        ContentKind::Text,
        format!("message {n}"),
    )
}

/// Drives a [`Viewport`] against a [`MemoryStore`] the way a host would,
/// but with timers held until a test fires them.
pub struct Harness {
    pub viewport: Viewport,
    pub store: Rc<MemoryStore>,
    pub timers: Vec<(Ticket, ScheduledTask, Duration)>,
    pub scrolls: Vec<ScrollCommand>,
    pub highlights: Vec<(MessageKey, bool)>,
    /// Collaborator effects taken but not executed yet (see [`Self::hold`]).
    pub held: Vec<Effect>,
}

impl Harness {
    /// `general` with text messages m1..=m`count`, viewport 640 units tall.
    pub fn new(count: usize) -> Self {
        let store = MemoryStore::new();
        let conversation = general();
        store.insert_conversation(
            conversation.clone(),
            (1..=count).map(|n| text_message(&conversation, n)).collect(),
        );
        store.insert_conversation(ConversationId::new("random"), Vec::new());
        Self::with_store(Rc::new(store), ViewportConfig::default())
    }

    pub fn with_store(store: Rc<MemoryStore>, config: ViewportConfig) -> Self {
        let mut viewport = Viewport::new(config, store.capabilities());
        viewport.set_viewport_height(VIEWPORT_HEIGHT);
        Self {
            viewport,
            store,
            timers: Vec::new(),
            scrolls: Vec::new(),
            highlights: Vec::new(),
            held: Vec::new(),
        }
    }

    /// Open `general` and apply its first page.
    pub async fn open(&mut self) {
        self.viewport.open_conversation(general());
        self.settle().await;
    }

    /// Execute effects until the engine stops asking for data.
    pub async fn settle(&mut self) {
        loop {
            let effects = self.viewport.take_effects();
            if effects.is_empty() {
                break;
            }
            for effect in effects {
                self.execute(effect).await;
            }
        }
    }

    /// Take pending effects without running collaborator calls yet.
    pub fn hold(&mut self) {
        let effects = self.viewport.take_effects();
        for effect in effects {
            match effect {
                Effect::FetchPage { .. } | Effect::FetchContext { .. } => self.held.push(effect),
                other => self.record(other),
            }
        }
    }

    /// Run the held collaborator calls in order, then settle.
    pub async fn release(&mut self) {
        for effect in std::mem::take(&mut self.held) {
            self.execute(effect).await;
        }
        self.settle().await;
    }

    /// Fire every queued timer of `task`, in order.
    pub async fn fire(&mut self, task: ScheduledTask) {
        let (due, rest): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.timers).into_iter().partition(|(_, t, _)| *t == task);
        self.timers = rest;
        for (ticket, task, _) in due {
            self.viewport.handle_event(ViewportEvent::TimerFired { ticket, task });
        }
        self.settle().await;
    }

    /// The surface finished laying out; corrective timers may follow.
    pub async fn commit_layout(&mut self) {
        self.viewport.layout_committed();
        self.settle().await;
    }

    pub fn offset_of(&mut self, id: &str) -> Option<i64> {
        self.viewport.viewport_offset_of(&key(id))
    }

    async fn execute(&mut self, effect: Effect) {
        match effect {
            Effect::FetchPage { ticket, request } => {
                let conversation = ticket.conversation.clone();
                let result = match &request {
                    PageRequest::Latest { limit } => {
                        self.store.fetch_older(&conversation, None, *limit).await
                    }
                    PageRequest::Older { before, limit } => {
                        self.store.fetch_older(&conversation, Some(before), *limit).await
                    }
                    PageRequest::Newer { after, limit } => {
                        self.store.fetch_newer(&conversation, after, *limit).await
                    }
                };
                self.viewport.handle_event(ViewportEvent::PageLoaded { ticket, request, result });
            }
            Effect::FetchContext { ticket, target, before, after } => {
                let result = self
                    .store
                    .fetch_context_window(&ticket.conversation, &target, before, after)
                    .await;
                self.viewport.handle_event(ViewportEvent::ContextLoaded { ticket, target, result });
            }
            other => self.record(other),
        }
    }

    fn record(&mut self, effect: Effect) {
        match effect {
            Effect::Schedule { ticket, task, delay } => self.timers.push((ticket, task, delay)),
            Effect::Scroll(command) => self.scrolls.push(command),
            Effect::Highlight { key, active } => self.highlights.push((key, active)),
            Effect::ConversationChanged { .. }
            | Effect::FetchPage { .. }
            | Effect::FetchContext { .. } => {}
        }
    }
}
