//! Reconnect policy — waits for the bridge session with bounded backoff.
//!
//! Delays double from `initial` up to `max`. After `max_attempts` probes
//! without a connected session the caller gets an error and the process
//! exits, leaving restarts to the service manager.

use std::time::Duration;

use async_trait::async_trait;

use subbot_common::config::AppConfig;
use subbot_common::error::AppError;

/// Reports whether the chat session is currently usable.
#[async_trait]
pub trait SessionProbe: Send + Sync {
    async fn is_connected(&self) -> Result<bool, AppError>;
}

/// Exponential backoff with a cap and an attempt limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub initial: Duration,
    pub max: Duration,
    pub max_attempts: u32,
}

impl Backoff {
    pub fn new(initial: Duration, max: Duration, max_attempts: u32) -> Self {
        Self {
            initial,
            max,
            max_attempts,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            Duration::from_millis(config.reconnect_initial_ms),
            Duration::from_millis(config.reconnect_max_ms),
            config.reconnect_max_attempts,
        )
    }

    /// Delay after the failed probe numbered `attempt` (0-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        self.initial
            .saturating_mul(2u32.saturating_pow(attempt))
            .min(self.max)
    }
}

/// Probe until the session is connected.
///
/// Returns the number of probes it took. Probe errors count as a failed
/// attempt. At least one probe is always made.
pub async fn await_session<P>(probe: &P, backoff: &Backoff) -> Result<u32, AppError>
where
    P: SessionProbe + ?Sized,
{
    let attempts = backoff.max_attempts.max(1);

    for attempt in 0..attempts {
        match probe.is_connected().await {
            Ok(true) => {
                if attempt > 0 {
                    tracing::info!(attempts = attempt + 1, "Session re-established");
                }
                return Ok(attempt + 1);
            }
            Ok(false) => {
                tracing::debug!(attempt = attempt + 1, "Session not connected yet");
            }
            Err(e) => {
                tracing::warn!(attempt = attempt + 1, error = %e, "Session probe failed");
            }
        }

        if attempt + 1 < attempts {
            let delay = backoff.delay(attempt);
            tracing::info!(
                attempt = attempt + 1,
                delay_ms = delay.as_millis() as u64,
                "Waiting before next session probe"
            );
            tokio::time::sleep(delay).await;
        }
    }

    Err(AppError::Internal(format!(
        "gave up reconnecting after {} attempts",
        attempts
    )))
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    /// Answers from a script, then reports connected.
    struct ScriptedProbe {
        answers: Mutex<Vec<Result<bool, AppError>>>,
        calls: Mutex<u32>,
    }

    impl ScriptedProbe {
        fn new(mut answers: Vec<Result<bool, AppError>>) -> Self {
            answers.reverse();
            Self {
                answers: Mutex::new(answers),
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> u32 {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl SessionProbe for ScriptedProbe {
        async fn is_connected(&self) -> Result<bool, AppError> {
            *self.calls.lock().unwrap() += 1;
            self.answers.lock().unwrap().pop().unwrap_or(Ok(true))
        }
    }

    fn fast(max_attempts: u32) -> Backoff {
        Backoff::new(Duration::from_millis(1), Duration::from_millis(4), max_attempts)
    }

    #[test]
    fn test_delay_doubles_then_caps() {
        let backoff = Backoff::new(Duration::from_secs(1), Duration::from_secs(10), 5);
        assert_eq!(backoff.delay(0), Duration::from_secs(1));
        assert_eq!(backoff.delay(1), Duration::from_secs(2));
        assert_eq!(backoff.delay(3), Duration::from_secs(8));
        assert_eq!(backoff.delay(4), Duration::from_secs(10));
        assert_eq!(backoff.delay(60), Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_connected_immediately() {
        let probe = ScriptedProbe::new(vec![]);
        assert_eq!(await_session(&probe, &fast(3)).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_recovers_after_errors() {
        let probe = ScriptedProbe::new(vec![
            Err(AppError::Unavailable("bridge down".into())),
            Ok(false),
        ]);
        assert_eq!(await_session(&probe, &fast(5)).await.unwrap(), 3);
        assert_eq!(probe.calls(), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let probe = ScriptedProbe::new(vec![Ok(false), Ok(false), Ok(false), Ok(false)]);
        let err = await_session(&probe, &fast(3)).await.unwrap_err();
        assert!(matches!(err, AppError::Internal(ref msg) if msg.contains("gave up reconnecting")));
        assert_eq!(probe.calls(), 3);
    }

    #[tokio::test]
    async fn test_zero_attempts_still_probes_once() {
        let probe = ScriptedProbe::new(vec![]);
        assert_eq!(await_session(&probe, &fast(0)).await.unwrap(), 1);
    }
}
