//! Message channel port
//!
//! The coordinator consumes agent requests as a stream of [`Envelope`]s.
//! Each envelope pairs an [`InboundMessage`] with a one-shot
//! [`ReplyHandle`]; the coordinator answers every envelope exactly once.
//!
//! The stream is conceptually infinite: the coordinator stops reading when
//! its own termination condition holds, not because the channel ends.
//! Loss detection only happens when *some* message arrives, so channel
//! implementations are expected to inject periodic heartbeat messages
//! under a private (`_`-prefixed) agent id.

use async_trait::async_trait;
use benchfleet_domain::{Directive, InboundMessage};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

#[derive(Error, Debug)]
pub enum ChannelError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Channel closed")]
    Closed,
}

/// One-shot reply path back to the agent that sent a message.
#[derive(Debug)]
pub struct ReplyHandle {
    tx: oneshot::Sender<Directive>,
}

impl ReplyHandle {
    /// Create a handle and the receiver the transport waits on.
    pub fn new() -> (Self, oneshot::Receiver<Directive>) {
        let (tx, rx) = oneshot::channel();
        (Self { tx }, rx)
    }

    /// Send the reply. Returns `false` if the requester went away.
    pub fn send(self, directive: Directive) -> bool {
        self.tx.send(directive).is_ok()
    }
}

/// An inbound message together with its reply path
#[derive(Debug)]
pub struct Envelope {
    pub message: InboundMessage,
    pub reply: ReplyHandle,
}

impl Envelope {
    pub fn new(message: InboundMessage) -> (Self, oneshot::Receiver<Directive>) {
        let (reply, rx) = ReplyHandle::new();
        (Self { message, reply }, rx)
    }
}

/// Port for receiving agent requests
#[async_trait]
pub trait MessageChannel: Send {
    /// Wait for the next request. `Ok(None)` means the channel ended.
    async fn recv(&mut self) -> Result<Option<Envelope>, ChannelError>;

    /// Release the channel. Called once when the coordinator is done.
    async fn close(&mut self) {}
}

#[async_trait]
impl MessageChannel for mpsc::UnboundedReceiver<Envelope> {
    async fn recv(&mut self) -> Result<Option<Envelope>, ChannelError> {
        Ok(mpsc::UnboundedReceiver::recv(self).await)
    }

    async fn close(&mut self) {
        mpsc::UnboundedReceiver::close(self);
    }
}
