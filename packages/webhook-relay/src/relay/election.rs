//! Choosing the one upstream response returned to the caller.

use crate::Result;
use axum::http::StatusCode;
use tracing::{debug, info, warn};

/// Pick the first outcome, in configuration order, whose status is below
/// 400. Every other response is dropped before returning, which releases
/// its connection, including those ranked after the winner.
pub fn elect<R>(
    outcomes: Vec<(&str, Result<R>)>,
    status: impl Fn(&R) -> StatusCode,
) -> Option<(usize, R)> {
    let mut winner: Option<(usize, R)> = None;

    for (index, (upstream, outcome)) in outcomes.into_iter().enumerate() {
        let response = match outcome {
            Ok(r) => r,
            // Already logged at send time.
            Err(_) => continue,
        };
        let code = status(&response);

        if winner.is_some() {
            debug!(upstream, status = %code, "Releasing non-elected upstream response");
            drop(response);
        } else if code.as_u16() < 400 {
            info!(upstream, status = %code, "Upstream elected");
            winner = Some((index, response));
        } else {
            warn!(upstream, status = %code, "Upstream returned error status");
            drop(response);
        }
    }

    winner
}
