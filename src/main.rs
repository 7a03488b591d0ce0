#![allow(dead_code, clippy::similar_names)]
#![warn(clippy::shadow_reuse, clippy::shadow_same, clippy::builtin_type_shadow)]
mod config;
mod flight_control;
mod keychain;
mod logger;
mod mission_control;

use crate::config::LaunchConfig;
use crate::flight_control::Spacecraft;
use crate::keychain::establish_connection;
use crate::mission_control::{Mission, MissionSequencer};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() {
    let config = LaunchConfig::from_env();
    let Some(keychain) = establish_connection(&config).await else {
        fatal!("No connection to the kRPC server, aborting launch!");
    };
    let craft: Arc<dyn Spacecraft> = keychain.vessel();

    let atmosphere_depth = match craft.atmosphere_depth().await {
        Ok(depth) => depth,
        Err(e) => fatal!("Could not read the atmosphere of {}: {e}", config.launch_body),
    };
    info!("Ascending through {atmosphere_depth}m of {} atmosphere", config.launch_body);
    let mission = Mission::plan(config.profile, &config.launch_parameters(atmosphere_depth));

    let c_tok = CancellationToken::new();
    let c_tok_clone = c_tok.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling mission!");
            c_tok_clone.cancel();
        }
    });

    let sequencer = MissionSequencer::new(craft, config.stage_timeout, c_tok);
    match sequencer.run(&mission).await {
        Ok(report) => {
            for stage in report.stages() {
                log!("{:<26} {:>8.2}s", stage.name, stage.elapsed.as_secs_f64());
            }
        }
        Err(e) => error!("Mission aborted in stage '{}': {e}", e.stage()),
    }
    info!("==> End of launch sequencer");
}
