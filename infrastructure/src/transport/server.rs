//! TCP message channel, the coordinator side of the agent wire.
//!
//! [`TcpMessageChannel`] accepts agent connections and funnels every
//! request from every connection into a single ordered stream of
//! [`Envelope`]s, which the quorum consumes through the
//! [`MessageChannel`] port.
//!
//! ```text
//! agent A ──TCP──► connection task ─┐
//! agent B ──TCP──► connection task ─┼──► mpsc ──► Quorum::run
//! heartbeat producer ───────────────┘
//! ```
//!
//! Each connection task owns its socket exclusively: it reads one frame,
//! forwards it with a oneshot reply handle, waits for the directive and
//! writes it back before reading the next frame. A dropped reply handle is
//! answered with `{"operation": "none"}` so agents never hang.
//!
//! The heartbeat producer injects a `poll` from [`HEARTBEAT_AGENT_ID`] at a
//! fixed interval. The quorum only checks deadlines when a message arrives,
//! so without it a silent fleet would never be declared lost.

use super::error::{Result, TransportError};
use super::framing::{read_json, write_json};
use async_trait::async_trait;
use benchfleet_application::ports::message_channel::{ChannelError, Envelope, MessageChannel};
use benchfleet_domain::{Directive, InboundMessage};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{BufReader, BufWriter};
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

/// Private agent id used by the heartbeat producer
pub const HEARTBEAT_AGENT_ID: &str = "_heartbeat";

/// Coordinator-side channel serving agents over TCP
pub struct TcpMessageChannel {
    local_addr: SocketAddr,
    rx: mpsc::UnboundedReceiver<Envelope>,
    cancellation: CancellationToken,
    _accept_handle: JoinHandle<()>,
    _heartbeat_handle: Option<JoinHandle<()>>,
}

impl TcpMessageChannel {
    /// Bind `addr` and start accepting agents.
    ///
    /// With `heartbeat` set, a heartbeat poll is injected at that interval.
    pub async fn bind(addr: impl ToSocketAddrs, heartbeat: Option<Duration>) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        info!("Listening for agents on {}", local_addr);

        let (tx, rx) = mpsc::unbounded_channel();
        let cancellation = CancellationToken::new();

        let accept_handle = tokio::spawn(Self::accept_loop(
            listener,
            tx.clone(),
            cancellation.clone(),
        ));

        let heartbeat_handle = heartbeat
            .filter(|interval| !interval.is_zero())
            .map(|interval| {
                tokio::spawn(Self::heartbeat_loop(interval, tx, cancellation.clone()))
            });

        Ok(Self {
            local_addr,
            rx,
            cancellation,
            _accept_handle: accept_handle,
            _heartbeat_handle: heartbeat_handle,
        })
    }

    /// Address actually bound (useful with port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    async fn accept_loop(
        listener: TcpListener,
        tx: mpsc::UnboundedSender<Envelope>,
        cancellation: CancellationToken,
    ) {
        loop {
            let accepted = tokio::select! {
                biased;
                _ = cancellation.cancelled() => break,
                accepted = listener.accept() => accepted,
            };

            match accepted {
                Ok((stream, peer)) => {
                    debug!("Agent connected from {}", peer);
                    tokio::spawn(Self::serve_connection(
                        stream,
                        peer,
                        tx.clone(),
                        cancellation.clone(),
                    ));
                }
                Err(e) => warn!("Failed to accept agent connection: {}", e),
            }
        }
        debug!("Accept loop stopped");
    }

    /// One request, one reply, until the agent disconnects.
    async fn serve_connection(
        stream: TcpStream,
        peer: SocketAddr,
        tx: mpsc::UnboundedSender<Envelope>,
        cancellation: CancellationToken,
    ) {
        let (read_half, write_half) = stream.into_split();
        let mut reader = BufReader::new(read_half);
        let mut writer = BufWriter::new(write_half);
        let mut line = String::new();

        loop {
            let request = tokio::select! {
                biased;
                _ = cancellation.cancelled() => break,
                request = read_json::<_, InboundMessage>(&mut reader, &mut line) => request,
            };

            let directive = match request {
                Ok(message) => {
                    trace!("{:?} from {} ({})", message.operation, message.agent_id, peer);
                    let (envelope, reply_rx) = Envelope::new(message);
                    if tx.send(envelope).is_err() {
                        debug!("Coordinator gone, dropping connection from {}", peer);
                        break;
                    }
                    tokio::select! {
                        biased;
                        _ = cancellation.cancelled() => break,
                        reply = reply_rx => reply.unwrap_or_default(),
                    }
                }
                Err(TransportError::Serialization(e)) => {
                    warn!("Malformed request from {}: {}", peer, e);
                    Directive::None
                }
                Err(e) => {
                    debug!("Agent connection {} closed: {}", peer, e);
                    break;
                }
            };

            if let Err(e) = write_json(&mut writer, &directive).await {
                debug!("Failed to reply to {}: {}", peer, e);
                break;
            }
        }
    }

    async fn heartbeat_loop(
        interval: Duration,
        tx: mpsc::UnboundedSender<Envelope>,
        cancellation: CancellationToken,
    ) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            tokio::select! {
                biased;
                _ = cancellation.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let (envelope, _reply_rx) = Envelope::new(InboundMessage::poll(HEARTBEAT_AGENT_ID));
            if tx.send(envelope).is_err() {
                break;
            }
        }
        debug!("Heartbeat producer stopped");
    }
}

#[async_trait]
impl MessageChannel for TcpMessageChannel {
    async fn recv(&mut self) -> std::result::Result<Option<Envelope>, ChannelError> {
        Ok(self.rx.recv().await)
    }

    async fn close(&mut self) {
        self.cancellation.cancel();
        self.rx.close();
        info!("Stopped listening on {}", self.local_addr);
    }
}

impl Drop for TcpMessageChannel {
    fn drop(&mut self) {
        self.cancellation.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::client::AgentClient;
    use benchfleet_domain::{MessageOperation, Payload};

    async fn channel(heartbeat: Option<Duration>) -> TcpMessageChannel {
        TcpMessageChannel::bind("127.0.0.1:0", heartbeat)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_poll_round_trip() {
        let mut channel = channel(None).await;
        let addr = channel.local_addr();

        let agent = tokio::spawn(async move {
            let mut client = AgentClient::connect(addr, "alpha").await.unwrap();
            client.poll().await.unwrap()
        });

        let envelope = channel.recv().await.unwrap().unwrap();
        assert_eq!(envelope.message.agent_id, "alpha");
        assert_eq!(envelope.message.operation, MessageOperation::Poll);
        envelope.reply.send(Directive::Configure {
            polling_interval: 10.0,
            expected_duration: 0.0,
        });

        assert_eq!(
            agent.await.unwrap(),
            Directive::Configure {
                polling_interval: 10.0,
                expected_duration: 0.0,
            }
        );
    }

    #[tokio::test]
    async fn test_reply_payload_forwarded() {
        let mut channel = channel(None).await;
        let addr = channel.local_addr();

        let agent = tokio::spawn(async move {
            let mut client = AgentClient::connect(addr, "alpha").await.unwrap();
            let mut payload = Payload::new();
            payload.insert("stdout".into(), "42".into());
            client.reply(payload).await.unwrap()
        });

        let envelope = channel.recv().await.unwrap().unwrap();
        assert!(envelope.message.is_reply());
        assert_eq!(envelope.message.get_str("stdout"), Some("42"));
        envelope.reply.send(Directive::None);

        assert_eq!(agent.await.unwrap(), Directive::None);
    }

    #[tokio::test]
    async fn test_dropped_reply_handle_answers_none() {
        let mut channel = channel(None).await;
        let addr = channel.local_addr();

        let agent = tokio::spawn(async move {
            let mut client = AgentClient::connect(addr, "alpha").await.unwrap();
            client.poll().await.unwrap()
        });

        drop(channel.recv().await.unwrap().unwrap());
        assert_eq!(agent.await.unwrap(), Directive::None);
    }

    #[tokio::test]
    async fn test_messages_from_several_agents() {
        let mut channel = channel(None).await;
        let addr = channel.local_addr();

        for id in ["alpha", "beta"] {
            tokio::spawn(async move {
                let mut client = AgentClient::connect(addr, id).await.unwrap();
                client.poll().await.unwrap();
            });
        }

        let mut seen = Vec::new();
        for _ in 0..2 {
            let envelope = channel.recv().await.unwrap().unwrap();
            seen.push(envelope.message.agent_id.clone());
            envelope.reply.send(Directive::None);
        }
        seen.sort();
        assert_eq!(seen, vec!["alpha", "beta"]);
    }

    #[tokio::test]
    async fn test_heartbeat_injected() {
        let mut channel = channel(Some(Duration::from_millis(20))).await;

        let envelope = channel.recv().await.unwrap().unwrap();
        assert_eq!(envelope.message.agent_id, HEARTBEAT_AGENT_ID);
        assert!(envelope.message.is_poll());
        assert!(!envelope.reply.send(Directive::None));
    }

    #[tokio::test]
    async fn test_close_stops_accepting() {
        let mut channel = channel(None).await;
        let addr = channel.local_addr();
        channel.close().await;

        assert!(channel.recv().await.unwrap().is_none());

        // Give the accept loop a moment to observe cancellation
        tokio::time::sleep(Duration::from_millis(50)).await;
        let result = AgentClient::connect(addr, "late").await;
        match result {
            Err(_) => {}
            Ok(mut client) => assert!(client.poll().await.is_err()),
        }
    }
}
