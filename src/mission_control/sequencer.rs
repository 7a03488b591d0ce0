use super::{
    mission_profile::{Mission, WaitCondition},
    signal::{MissionError, WaitExitSignal},
    wait::wait_for,
};
use crate::flight_control::Spacecraft;
use crate::{info, log};
use std::{sync::Arc, time::Duration};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Outcome of one completed stage.
#[derive(Debug, Clone, PartialEq)]
pub struct StageRecord {
    pub name: &'static str,
    /// Reading that ended a polled wait, `None` for event waits and stages without wait.
    pub reading: Option<f64>,
    pub elapsed: Duration,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MissionReport {
    stages: Vec<StageRecord>,
}

impl MissionReport {
    pub fn stages(&self) -> &[StageRecord] { &self.stages }
    pub fn total_elapsed(&self) -> Duration { self.stages.iter().map(|s| s.elapsed).sum() }
}

/// Flies a [`Mission`] stage by stage.
///
/// Stages only ever advance. The sequencer does not verify the reached orbit; a mission
/// counts as finished once its last stage completed.
pub struct MissionSequencer {
    craft: Arc<dyn Spacecraft>,
    /// Upper bound for every single stage wait, `None` waits indefinitely.
    stage_timeout: Option<Duration>,
    c_tok: CancellationToken,
}

impl MissionSequencer {
    pub fn new(
        craft: Arc<dyn Spacecraft>,
        stage_timeout: Option<Duration>,
        c_tok: CancellationToken,
    ) -> Self {
        Self { craft, stage_timeout, c_tok }
    }

    pub async fn run(&self, mission: &Mission) -> Result<MissionReport, MissionError> {
        info!("Starting mission '{}' with {} stages", mission.profile(), mission.stages().len());
        let mut report = MissionReport::default();

        for (i, stage) in mission.stages().iter().enumerate() {
            let name = stage.name();
            if self.c_tok.is_cancelled() {
                return Err(MissionError::Cancelled { stage: name });
            }
            info!("Stage {i}: {name}");
            let start = Instant::now();
            for action in stage.actions() {
                log!("{name}: {action}");
                action
                    .apply(&*self.craft)
                    .await
                    .map_err(|source| MissionError::Flight { stage: name, source })?;
            }
            if let WaitCondition::Poll { threshold, .. } | WaitCondition::Event(threshold) = stage.wait() {
                log!("{name}: waiting for {threshold}");
            }
            let reading = match wait_for(&*self.craft, stage.wait(), self.stage_timeout, &self.c_tok).await {
                WaitExitSignal::Crossed(reading) => reading,
                WaitExitSignal::TimedOut => {
                    let timeout = self.stage_timeout.unwrap_or_default();
                    return Err(MissionError::TimedOut { stage: name, timeout });
                }
                WaitExitSignal::Cancelled => return Err(MissionError::Cancelled { stage: name }),
                WaitExitSignal::Failed(source) => return Err(MissionError::Flight { stage: name, source }),
            };
            let elapsed = start.elapsed();
            if let Some(value) = reading {
                log!("{name} done after {:.2}s at {value:.1}", elapsed.as_secs_f64());
            } else {
                log!("{name} done after {:.2}s", elapsed.as_secs_f64());
            }
            report.stages.push(StageRecord { name, reading, elapsed });
        }

        info!("Mission '{}' finished after {:.1}s", mission.profile(), report.total_elapsed().as_secs_f64());
        Ok(report)
    }
}
