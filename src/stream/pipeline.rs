//! Per-frame processing: decode, filter, classify, dispatch.
//!
//! Every step absorbs its own failure into a [`FrameOutcome`]; nothing here can
//! stop the stream loop.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::models::{CHAT_MESSAGE_EVENT, PING_EVENT};
use crate::services::{classify, dispatch, DispatchOutcome, PointsLedger, RewardConfig};

use super::decoder::{decode, decode_payload, DecodeError};

/// Result of processing one frame.
#[derive(Debug)]
pub enum FrameOutcome {
    /// Chat message credited.
    Awarded {
        slug: String,
        amount: i32,
        new_total: i32,
    },
    /// Chat message whose tier earns nothing.
    Unrewarded { slug: String },
    /// Any event other than a chat message or ping.
    Ignored { event: String },
    /// Upstream keepalive; the caller owes a `pusher:pong`.
    PingReceived,
    /// Envelope or payload could not be decoded.
    Malformed(DecodeError),
    /// Ledger refused the credit.
    DispatchFailed {
        slug: String,
        amount: i32,
        error: String,
    },
}

impl FrameOutcome {
    /// True for message-local failures (logged, then skipped).
    pub fn is_recoverable_error(&self) -> bool {
        matches!(
            self,
            FrameOutcome::Malformed(_) | FrameOutcome::DispatchFailed { .. }
        )
    }
}

#[derive(Clone)]
pub struct FramePipeline {
    rewards: RewardConfig,
    ledger: Arc<dyn PointsLedger>,
}

impl FramePipeline {
    pub fn new(rewards: RewardConfig, ledger: Arc<dyn PointsLedger>) -> Self {
        Self { rewards, ledger }
    }

    pub async fn process(&self, frame: &str) -> FrameOutcome {
        let envelope = match decode(frame) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(error = %e, "dropping undecodable frame");
                return FrameOutcome::Malformed(e);
            }
        };

        if envelope.event == PING_EVENT {
            return FrameOutcome::PingReceived;
        }
        if envelope.event != CHAT_MESSAGE_EVENT {
            debug!(event = %envelope.event, "ignoring event");
            return FrameOutcome::Ignored {
                event: envelope.event,
            };
        }

        let Some(data) = envelope.data.as_deref() else {
            warn!(channel = ?envelope.channel, "chat message without data");
            return FrameOutcome::Malformed(DecodeError::MissingPayload);
        };
        let message = match decode_payload(data) {
            Ok(message) => message,
            Err(e) => {
                warn!(channel = ?envelope.channel, error = %e, "dropping undecodable chat message");
                return FrameOutcome::Malformed(e);
            }
        };

        let amount = classify(&message, &self.rewards);
        let slug = message.sender.slug;
        match dispatch(self.ledger.as_ref(), &slug, amount).await {
            DispatchOutcome::Skipped => FrameOutcome::Unrewarded { slug },
            DispatchOutcome::Credited { new_total } => FrameOutcome::Awarded {
                slug,
                amount,
                new_total,
            },
            DispatchOutcome::Failed { error } => FrameOutcome::DispatchFailed {
                slug,
                amount,
                error,
            },
        }
    }
}
