//! The stream loop: `Disconnected -> Connected -> Subscribed -> Streaming -> Terminated`.

use std::fmt;
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::config::StreamConfig;
use crate::models::ClientMessage;
use crate::services::PointsLedger;

use super::pipeline::{FrameOutcome, FramePipeline};
use super::shutdown::ShutdownSignal;
use super::transport::{subscribe, Connector, Transport, TransportError, WsConnector};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Disconnected,
    Connected,
    Subscribed,
    Streaming,
    Terminated,
}

impl fmt::Display for StreamState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StreamState::Disconnected => "disconnected",
            StreamState::Connected => "connected",
            StreamState::Subscribed => "subscribed",
            StreamState::Streaming => "streaming",
            StreamState::Terminated => "terminated",
        };
        f.write_str(name)
    }
}

/// Why the loop stopped. Everything except `Cancelled` is connection-fatal.
#[derive(Debug)]
pub enum StreamExit {
    Cancelled,
    ConnectFailed(TransportError),
    SubscribeFailed(TransportError),
    ConnectionLost(TransportError),
}

impl StreamExit {
    pub fn is_connection_fatal(&self) -> bool {
        !matches!(self, StreamExit::Cancelled)
    }
}

impl fmt::Display for StreamExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamExit::Cancelled => f.write_str("cancelled"),
            StreamExit::ConnectFailed(e) => write!(f, "connect failed: {}", e),
            StreamExit::SubscribeFailed(e) => write!(f, "subscribe failed: {}", e),
            StreamExit::ConnectionLost(e) => write!(f, "connection lost: {}", e),
        }
    }
}

/// Frame counters for one connection.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StreamStats {
    pub frames: u64,
    pub awarded: u64,
    pub dropped: u64,
}

impl StreamStats {
    fn record(&mut self, outcome: &FrameOutcome) {
        self.frames += 1;
        if matches!(outcome, FrameOutcome::Awarded { .. }) {
            self.awarded += 1;
        }
        if outcome.is_recoverable_error() {
            self.dropped += 1;
        }
    }
}

pub struct StreamRunner {
    config: StreamConfig,
    pipeline: FramePipeline,
    connector: Arc<dyn Connector>,
}

impl StreamRunner {
    pub fn new(config: StreamConfig, ledger: Arc<dyn PointsLedger>) -> Self {
        Self::with_connector(config, ledger, Arc::new(WsConnector))
    }

    pub fn with_connector(
        config: StreamConfig,
        ledger: Arc<dyn PointsLedger>,
        connector: Arc<dyn Connector>,
    ) -> Self {
        let pipeline = FramePipeline::new(config.rewards, ledger);
        Self {
            config,
            pipeline,
            connector,
        }
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// Connect, subscribe and stream until the connection drops or `shutdown` is raised.
    /// No retry happens here.
    pub async fn run(&self, shutdown: &mut ShutdownSignal) -> (StreamExit, StreamStats) {
        info!(state = %StreamState::Disconnected, url = %self.config.websocket_url, "connecting to chat stream");
        let connected = tokio::select! {
            biased;
            _ = shutdown.raised() => return (StreamExit::Cancelled, StreamStats::default()),
            res = self.connector.connect(&self.config.websocket_url, &self.config.origin) => res,
        };
        let mut transport = match connected {
            Ok(transport) => transport,
            Err(e) => {
                error!(error = %e, "chat stream connect failed");
                return (StreamExit::ConnectFailed(e), StreamStats::default());
            }
        };
        let (exit, stats) = self.drive(transport.as_mut(), shutdown).await;
        info!(
            state = %StreamState::Terminated,
            reason = %exit,
            frames = stats.frames,
            awarded = stats.awarded,
            dropped = stats.dropped,
            "chat stream stopped"
        );
        (exit, stats)
    }

    /// Everything after the handshake, on an already connected transport.
    pub async fn drive<T>(&self, transport: &mut T, shutdown: &mut ShutdownSignal) -> (StreamExit, StreamStats)
    where
        T: Transport + ?Sized,
    {
        let mut stats = StreamStats::default();
        info!(state = %StreamState::Connected, channels = ?self.config.channel_ids, "subscribing");

        let subscribed = tokio::select! {
            biased;
            _ = shutdown.raised() => None,
            res = subscribe(transport, &self.config.channel_ids) => Some(res),
        };
        match subscribed {
            None => {
                transport.close().await;
                return (StreamExit::Cancelled, stats);
            }
            Some(Err(e)) => {
                error!(error = %e, "chat stream subscribe failed");
                transport.close().await;
                return (StreamExit::SubscribeFailed(e), stats);
            }
            Some(Ok(())) => {
                info!(state = %StreamState::Subscribed, "all chatrooms subscribed");
            }
        }

        info!(state = %StreamState::Streaming, "reading chat frames");
        loop {
            let frame = tokio::select! {
                biased;
                _ = shutdown.raised() => None,
                res = transport.read_frame() => Some(res),
            };
            let frame = match frame {
                None => {
                    transport.close().await;
                    return (StreamExit::Cancelled, stats);
                }
                Some(Err(e)) => {
                    warn!(error = %e, "chat stream read failed");
                    return (StreamExit::ConnectionLost(e), stats);
                }
                Some(Ok(frame)) => frame,
            };

            let outcome = self.pipeline.process(&frame).await;
            stats.record(&outcome);
            if let FrameOutcome::PingReceived = outcome {
                if let Err(e) = send_pong(transport).await {
                    warn!(error = %e, "failed to answer upstream ping");
                    return (StreamExit::ConnectionLost(e), stats);
                }
            }
        }
    }
}

async fn send_pong<T>(transport: &mut T) -> Result<(), TransportError>
where
    T: Transport + ?Sized,
{
    let pong = serde_json::to_string(&ClientMessage::pong())?;
    transport.send_text(pong).await
}
