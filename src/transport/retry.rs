//! Retry policy for upstream calls (§4.8): full-jitter exponential backoff,
//! `Retry-After` honoring, and the unary-vs-streaming at-most-once split.

use std::time::Duration;

use rand::Rng;
use reqwest::Response;
use tracing::{debug, warn};

use crate::config::TransportConfig;
use crate::error::{IsRetryable, TransportError};

/// The Nth wait (1-indexed) is `Uniform(0, min(MAX, BASE * 2^(N-1)))`,
/// unless the response said otherwise via `Retry-After`.
fn backoff_for_attempt(attempt: u32, base_ms: u64, max_ms: u64) -> Duration {
    let pow = 2u64.saturating_pow(attempt.saturating_sub(1));
    let upper = base_ms.saturating_mul(pow).min(max_ms);
    let wait_ms = if upper == 0 {
        0
    } else {
        rand::rng().random_range(0..=upper)
    };
    Duration::from_millis(wait_ms)
}

/// Parses `Retry-After` as either delay-seconds or an HTTP-date, clamped to
/// `max_ms`.
fn retry_after(response: &Response, max_ms: u64) -> Option<Duration> {
    let raw = response
        .headers()
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?;

    let wait = if let Ok(secs) = raw.parse::<u64>() {
        Duration::from_secs(secs)
    } else {
        let at = chrono::DateTime::parse_from_rfc2822(raw).ok()?;
        let delta = at.with_timezone(&chrono::Utc) - chrono::Utc::now();
        delta.to_std().ok()?
    };

    Some(wait.min(Duration::from_millis(max_ms)))
}

/// Executes `attempt_fn` under the unary retry policy, retrying on
/// transport-level failures and the retryable status set until attempts are
/// exhausted or a non-retryable outcome is reached.
pub async fn retry_unary<F, Fut>(
    config: &TransportConfig,
    mut attempt_fn: F,
) -> Result<Response, TransportError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<Response, reqwest::Error>>,
{
    let mut attempt: u32 = 0;
    loop {
        attempt += 1;
        let started = std::time::Instant::now();
        let outcome = attempt_fn().await;

        let result = match outcome {
            Ok(resp) if resp.status().is_success() => {
                debug!(attempt, elapsed = ?started.elapsed(), "upstream attempt succeeded");
                return Ok(resp);
            }
            Ok(resp) => {
                let status = resp.status();
                let wait_hint = retry_after(&resp, config.retry_max_delay_ms);
                Err((
                    TransportError::UpstreamStatus {
                        status,
                        body: resp.text().await.unwrap_or_default(),
                    },
                    wait_hint,
                ))
            }
            Err(err) => Err((TransportError::Reqwest(err), None)),
        };

        let (err, wait_hint) = match result {
            Ok(resp) => return Ok(resp),
            Err(e) => e,
        };

        let retryable = err.is_retryable() && attempt < config.retry_max_times as u32;
        warn!(attempt, elapsed = ?started.elapsed(), error = %err, retryable, "upstream attempt failed");

        if !retryable {
            return Err(err);
        }

        let wait = wait_hint
            .unwrap_or_else(|| backoff_for_attempt(attempt, config.retry_base_delay_ms, config.retry_max_delay_ms));
        debug!(attempt, ?wait, "backing off before retry");
        tokio::time::sleep(wait).await;
    }
}
