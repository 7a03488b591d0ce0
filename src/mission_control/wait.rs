use super::{mission_profile::WaitCondition, signal::WaitExitSignal};
use crate::flight_control::{FlightError, Spacecraft, Telemetry, Threshold};
use crate::tlm;
use futures::{FutureExt, future::BoxFuture};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Blocks on `condition` until it is met, `timeout` elapses or `c_tok` is cancelled.
///
/// Without a timeout and without cancellation a threshold that is never crossed blocks
/// forever.
pub async fn wait_for(
    craft: &dyn Spacecraft,
    condition: &WaitCondition,
    timeout: Option<Duration>,
    c_tok: &CancellationToken,
) -> WaitExitSignal {
    let fut: BoxFuture<'_, Result<Option<f64>, FlightError>> = match *condition {
        WaitCondition::None => return WaitExitSignal::Crossed(None),
        WaitCondition::Poll { threshold, interval, echo } => {
            poll_until(craft, threshold, interval, echo).boxed()
        }
        WaitCondition::Event(threshold) => {
            async move { craft.await_threshold(threshold).await.map(|()| None) }.boxed()
        }
    };
    let deadline = async {
        match timeout {
            Some(dt) => tokio::time::sleep(dt).await,
            None => std::future::pending().await,
        }
    };
    tokio::select! {
        biased;
        () = c_tok.cancelled() => WaitExitSignal::Cancelled,
        res = fut => match res {
            Ok(reading) => WaitExitSignal::Crossed(reading),
            Err(e) => WaitExitSignal::Failed(e),
        },
        () = deadline => WaitExitSignal::TimedOut,
    }
}

/// Reads `threshold`'s metric until it is crossed, sleeping `interval` between reads.
pub async fn poll_until(
    craft: &dyn Spacecraft,
    threshold: Threshold,
    interval: Duration,
    echo: Option<Telemetry>,
) -> Result<Option<f64>, FlightError> {
    loop {
        let reading = craft.read(threshold.metric()).await?;
        if let Some(metric) = echo {
            let echoed = if metric == threshold.metric() { reading } else { craft.read(metric).await? };
            tlm!("{metric}: {echoed:.1}");
        }
        if threshold.is_crossed(reading) {
            return Ok(Some(reading));
        }
        tokio::time::sleep(interval).await;
    }
}
