//! Outbound side of the channel as seen by the session.

use super::{ChannelError, ClientMessage, RequestKind};

/// Fire-and-forget outbound message queue.
///
/// `send` never waits for the service; it only fails when the channel is gone.
pub trait MessageSink {
    fn send(&mut self, message: ClientMessage) -> Result<(), ChannelError>;
}

impl<T: MessageSink + ?Sized> MessageSink for Box<T> {
    fn send(&mut self, message: ClientMessage) -> Result<(), ChannelError> {
        (**self).send(message)
    }
}

/// Sink that keeps every message it is given.
///
/// Useful for driving a session without a service, and for asserting on what
/// a session would have sent.
#[derive(Debug, Default)]
pub struct RecordingSink {
    sent: Vec<ClientMessage>,
    closed: bool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink whose channel is already closed; every send fails.
    pub fn closed() -> Self {
        Self {
            sent: Vec::new(),
            closed: true,
        }
    }

    pub fn sent(&self) -> &[ClientMessage] {
        &self.sent
    }

    /// Messages of one kind, in send order.
    pub fn sent_of(&self, kind: RequestKind) -> Vec<&ClientMessage> {
        self.sent.iter().filter(|m| m.kind() == kind).collect()
    }

    pub fn count(&self, kind: RequestKind) -> usize {
        self.sent.iter().filter(|m| m.kind() == kind).count()
    }

    pub fn take(&mut self) -> Vec<ClientMessage> {
        std::mem::take(&mut self.sent)
    }
}

impl MessageSink for RecordingSink {
    fn send(&mut self, message: ClientMessage) -> Result<(), ChannelError> {
        if self.closed {
            return Err(ChannelError::Closed);
        }
        self.sent.push(message);
        Ok(())
    }
}
