//! Agent side of the wire.
//!
//! [`AgentClient`] keeps one TCP connection to the coordinator and speaks
//! the request/reply protocol: every `poll` or `reply` it sends is answered
//! by exactly one [`Directive`].
//!
//! [`AgentClient::run`] is the worker loop deployed on each benchmark host.

use super::error::Result;
use super::framing::{read_json, write_json};
use benchfleet_application::ports::clock::{Clock, SystemClock};
use benchfleet_application::ports::command_runner::CommandRunner;
use benchfleet_domain::{Command, Directive, InboundMessage, Payload};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{BufReader, BufWriter};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Polling interval used until the coordinator sends `configure`
const DEFAULT_POLLING_INTERVAL: Duration = Duration::from_secs(10);

/// Time allowed on top of a command's expected duration
const COMMAND_TIMEOUT_GRACE: Duration = Duration::from_secs(60);

/// Connection from one agent to the coordinator
pub struct AgentClient {
    agent_id: String,
    reader: BufReader<OwnedReadHalf>,
    writer: BufWriter<OwnedWriteHalf>,
    line: String,
    polling_interval: Duration,
    clock: Arc<dyn Clock>,
}

impl AgentClient {
    pub async fn connect(addr: impl ToSocketAddrs, agent_id: impl Into<String>) -> Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        let (read_half, write_half) = stream.into_split();
        let agent_id = agent_id.into();
        debug!("Agent {} connected", agent_id);

        Ok(Self {
            agent_id,
            reader: BufReader::new(read_half),
            writer: BufWriter::new(write_half),
            line: String::new(),
            polling_interval: DEFAULT_POLLING_INTERVAL,
            clock: Arc::new(SystemClock),
        })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_polling_interval(mut self, interval: Duration) -> Self {
        self.polling_interval = interval;
        self
    }

    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    /// Current polling interval (updated by `configure`).
    pub fn polling_interval(&self) -> Duration {
        self.polling_interval
    }

    /// Ask the coordinator what to do.
    pub async fn poll(&mut self) -> Result<Directive> {
        let message = InboundMessage::poll(self.agent_id.as_str());
        self.request(&message).await
    }

    /// Report the outcome of the last task.
    pub async fn reply(&mut self, payload: Payload) -> Result<Directive> {
        let message = InboundMessage::reply(self.agent_id.as_str(), payload);
        self.request(&message).await
    }

    async fn request(&mut self, message: &InboundMessage) -> Result<Directive> {
        write_json(&mut self.writer, message).await?;
        read_json(&mut self.reader, &mut self.line).await
    }

    /// Worker loop: poll, obey, report, repeat until cancelled.
    ///
    /// Commands run on a blocking thread through `runner`.
    pub async fn run<R>(&mut self, runner: Arc<R>, cancellation: CancellationToken) -> Result<()>
    where
        R: CommandRunner + 'static,
    {
        info!("Agent {} started", self.agent_id);

        while !cancellation.is_cancelled() {
            let mut next = Some(self.poll().await?);
            while let Some(directive) = next.take() {
                next = self.apply(directive, &runner, &cancellation).await?;
            }
        }

        info!("Agent {} stopped", self.agent_id);
        Ok(())
    }

    /// Carry out one directive. Returns the coordinator's answer when the
    /// directive required a reply.
    async fn apply<R>(
        &mut self,
        directive: Directive,
        runner: &Arc<R>,
        cancellation: &CancellationToken,
    ) -> Result<Option<Directive>>
    where
        R: CommandRunner + 'static,
    {
        match directive {
            Directive::Configure {
                polling_interval, ..
            } => {
                if polling_interval > 0.0 {
                    self.polling_interval = Duration::from_secs_f64(polling_interval);
                }
                debug!(
                    "Agent {} configured: polling every {:?}",
                    self.agent_id, self.polling_interval
                );
                self.reply(Payload::new()).await.map(Some)
            }
            Directive::Execute {
                command,
                start_at,
                expected_duration,
            } => {
                let wait = start_at - self.clock.now();
                if wait > 0.0 && !pause(Duration::from_secs_f64(wait), cancellation).await {
                    return Ok(None);
                }
                let timeout =
                    Duration::from_secs_f64(expected_duration.max(0.0)) + COMMAND_TIMEOUT_GRACE;
                let payload = self.execute(command, timeout, runner).await;
                self.reply(payload).await.map(Some)
            }
            Directive::Sleep { seconds } => {
                pause(Duration::from_secs_f64(seconds.max(0.0)), cancellation).await;
                Ok(None)
            }
            Directive::None => {
                pause(self.polling_interval, cancellation).await;
                Ok(None)
            }
        }
    }

    async fn execute<R>(&self, command: Command, timeout: Duration, runner: &Arc<R>) -> Payload
    where
        R: CommandRunner + 'static,
    {
        info!("Agent {} running {}", self.agent_id, command);
        let runner = Arc::clone(runner);
        match tokio::task::spawn_blocking(move || runner.run(&command, timeout)).await {
            Ok(output) => output.into_payload(),
            Err(e) => {
                warn!("Command task failed on agent {}: {}", self.agent_id, e);
                let mut payload = Payload::new();
                payload.insert("stderr".into(), format!("Command task failed: {}", e).into());
                payload.insert("exit_code".into(), (-1).into());
                payload
            }
        }
    }
}

/// Sleep for `duration` unless cancelled first. Returns `false` if cancelled.
async fn pause(duration: Duration, cancellation: &CancellationToken) -> bool {
    tokio::select! {
        biased;
        _ = cancellation.cancelled() => false,
        _ = tokio::time::sleep(duration) => true,
    }
}
