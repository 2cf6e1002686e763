//! Optional bounded reconnect around [`StreamRunner::run`].

use tracing::{info, warn};

use super::runner::{StreamExit, StreamRunner};
use super::shutdown::ShutdownSignal;

/// Run the stream, reconnecting after connection-fatal exits while the policy allows.
///
/// The attempt counter restarts only after a session that read at least one
/// frame before it dropped, so the limit applies per outage. An upstream that
/// accepts and subscribes but closes before sending anything still uses up
/// attempts. With `max_attempts == 0` this is a single run.
pub async fn run_supervised(runner: StreamRunner, mut shutdown: ShutdownSignal) -> StreamExit {
    let policy = runner.config().reconnect;
    let mut attempt: u32 = 0;

    loop {
        let (exit, stats) = runner.run(&mut shutdown).await;
        if !exit.is_connection_fatal() {
            return exit;
        }
        if matches!(exit, StreamExit::ConnectionLost(_)) && stats.frames > 0 {
            attempt = 0;
        }
        if attempt >= policy.max_attempts {
            if policy.max_attempts > 0 {
                warn!(attempts = attempt, reason = %exit, "giving up on chat stream");
            }
            return exit;
        }

        attempt += 1;
        let backoff = policy.backoff_for(attempt);
        warn!(
            attempt,
            max_attempts = policy.max_attempts,
            backoff_ms = backoff.as_millis() as u64,
            reason = %exit,
            "chat stream terminated, reconnecting"
        );
        tokio::select! {
            biased;
            _ = shutdown.raised() => {
                info!("reconnect abandoned on shutdown");
                return StreamExit::Cancelled;
            }
            _ = tokio::time::sleep(backoff) => {}
        }
    }
}
