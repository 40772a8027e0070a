//! Event sink port
//!
//! Requests stream discrete [`OrchestrationEvent`]s to the presentation
//! layer. Emission is synchronous and never fails the request.

use counsel_domain::OrchestrationEvent;
use tokio::sync::mpsc;

pub trait EventSink: Send + Sync {
    fn emit(&self, event: OrchestrationEvent);
}

/// Discards every event.
pub struct NoEvents;

impl EventSink for NoEvents {
    fn emit(&self, _event: OrchestrationEvent) {}
}

/// Forwards events over an unbounded tokio channel.
pub struct ChannelEventSink {
    sender: mpsc::UnboundedSender<OrchestrationEvent>,
}

impl ChannelEventSink {
    pub fn new(sender: mpsc::UnboundedSender<OrchestrationEvent>) -> Self {
        Self { sender }
    }

    /// Create a sink together with the receiving end.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<OrchestrationEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self::new(sender), receiver)
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: OrchestrationEvent) {
        // receiver gone means nobody is listening any more
        let _ = self.sender.send(event);
    }
}
