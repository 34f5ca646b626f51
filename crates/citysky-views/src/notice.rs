//! Transient notifications (toasts) emitted by views.
//!
//! Views never print. A presentation layer that wants toasts takes the
//! receiver from [`Notifier::channel`].

use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

pub const LOADING_MESSAGE: &str = "Fetching weather data...";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Loading(String),
    Success(String),
    Error(String),
}

impl Notice {
    pub fn message(&self) -> &str {
        match self {
            Self::Loading(m) | Self::Success(m) | Self::Error(m) => m,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Notifier {
    tx: Option<UnboundedSender<Notice>>,
}

impl Notifier {
    /// A notifier whose notices go to the returned receiver.
    pub fn channel() -> (Self, UnboundedReceiver<Notice>) {
        let (tx, rx) = unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    /// A notifier that drops everything.
    pub fn silent() -> Self {
        Self::default()
    }

    pub fn loading(&self) {
        self.send(Notice::Loading(LOADING_MESSAGE.to_string()));
    }

    pub fn success(&self, message: impl Into<String>) {
        self.send(Notice::Success(message.into()));
    }

    pub fn error(&self, message: impl Into<String>) {
        self.send(Notice::Error(message.into()));
    }

    fn send(&self, notice: Notice) {
        if let Some(tx) = &self.tx {
            // Receiver gone means nobody is listening
            let _ = tx.send(notice);
        }
    }
}
