//! Channel handle shared by the sync and log-stream layers

use tokio::sync::{mpsc, oneshot};

/// Close code for an intentional, normal closure
pub const NORMAL_CLOSURE: u16 = 1000;

/// Something that happened on an open channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    /// A text message
    Text(String),

    /// The peer closed the channel. `code` is `None` when the stream ended
    /// without a close frame.
    Closed { code: Option<u16>, reason: String },

    /// Transport failure; no further events follow
    Error(String),
}

impl ChannelEvent {
    pub fn is_normal_close(&self) -> bool {
        matches!(self, ChannelEvent::Closed { code: Some(NORMAL_CLOSURE), .. })
    }
}

/// Local end of an open push channel.
///
/// Dropping the channel closes it.
#[derive(Debug)]
pub struct Channel {
    events: mpsc::UnboundedReceiver<ChannelEvent>,
    close_tx: Option<oneshot::Sender<()>>,
}

/// Transport-side end of a [`Channel`]
#[derive(Debug)]
pub struct RemoteEnd {
    events: mpsc::UnboundedSender<ChannelEvent>,
    close_rx: oneshot::Receiver<()>,
    close_seen: bool,
}

impl Channel {
    /// Create a connected channel and the end a transport feeds
    pub fn pair() -> (Channel, RemoteEnd) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (close_tx, close_rx) = oneshot::channel();
        (
            Channel {
                events: events_rx,
                close_tx: Some(close_tx),
            },
            RemoteEnd {
                events: events_tx,
                close_rx,
                close_seen: false,
            },
        )
    }

    /// Next event in delivery order, `None` once the transport is gone
    pub async fn next_event(&mut self) -> Option<ChannelEvent> {
        self.events.recv().await
    }

    /// Ask the transport to close. Events already in flight may still arrive.
    pub fn close(&mut self) {
        if let Some(tx) = self.close_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl RemoteEnd {
    /// Deliver an event. Returns `false` if the local end is gone.
    pub fn send(&self, event: ChannelEvent) -> bool {
        self.events.send(event).is_ok()
    }

    pub fn send_text(&self, text: impl Into<String>) -> bool {
        self.send(ChannelEvent::Text(text.into()))
    }

    /// Local end has been dropped
    pub fn is_closed(&self) -> bool {
        self.events.is_closed()
    }

    /// Local end explicitly asked for a close
    pub fn close_requested(&mut self) -> bool {
        if !self.close_seen && self.close_rx.try_recv().is_ok() {
            self.close_seen = true;
        }
        self.close_seen
    }

    /// Resolves when the local end asks for a close or is dropped
    pub async fn closed(&mut self) {
        if self.close_seen {
            return;
        }
        tokio::select! {
            res = &mut self.close_rx => {
                self.close_seen = res.is_ok();
            }
            _ = self.events.closed() => {}
        }
    }
}
