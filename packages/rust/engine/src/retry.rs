//! Bounded retry with a fixed inter-attempt delay.

use std::time::Duration;

use tracing::warn;

use entidades_shared::error::{EntidadesError, Result};

/// Run `operation` up to `max_attempts` times, sleeping `delay` between
/// failed attempts.
///
/// The first success returns immediately; after the final failure the last
/// error is surfaced unchanged. The operation must be self-contained per
/// attempt — it is re-run from scratch, never resumed from partial state.
/// A degraded-but-successful result is a success; only errors count as
/// failures.
pub async fn attempt<T, R, Op>(
    resource: &mut R,
    mut operation: Op,
    max_attempts: u32,
    delay: Duration,
) -> Result<T>
where
    Op: AsyncFnMut(&mut R) -> Result<T>,
{
    let mut last_err = None;

    for attempt in 1..=max_attempts {
        match operation(resource).await {
            Ok(value) => return Ok(value),
            Err(err) => {
                warn!(attempt, max_attempts, error = %err, "attempt failed");
                last_err = Some(err);
                if attempt < max_attempts {
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    Err(last_err
        .unwrap_or_else(|| EntidadesError::validation("retry needs at least one attempt")))
}
