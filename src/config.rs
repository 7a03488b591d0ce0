use crate::mission_control::{LaunchParameters, MissionProfile};
use crate::warn;
use std::{env, str::FromStr, time::Duration};

/// Runtime configuration, read from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct LaunchConfig {
    /// Host running the kRPC server.
    pub address: String,
    pub rpc_port: u16,
    pub stream_port: u16,
    /// Name the connection shows up with in the server's client list.
    pub connection_name: String,
    pub profile: MissionProfile,
    /// Body whose atmosphere the flight plan is derived from.
    pub launch_body: String,
    /// Upper bound for each stage wait. Unset waits indefinitely.
    pub stage_timeout: Option<Duration>,
    pub booster_decouple_stages: [i32; 2],
    pub chute_altitude: f64,
}

impl LaunchConfig {
    const DEF_ADDRESS: &'static str = "127.0.0.1";
    const DEF_RPC_PORT: u16 = 50000;
    const DEF_STREAM_PORT: u16 = 50001;
    const DEF_CONNECTION_NAME: &'static str = "Main Connection";
    const DEF_PROFILE: MissionProfile = MissionProfile::OrbitalAscent;
    const DEF_LAUNCH_BODY: &'static str = "Kerbin";

    pub fn from_env() -> Self { Self::from_lookup(|key| env::var(key).ok()) }

    /// Builds the configuration from `lookup`, falling back to defaults for unset or
    /// unparsable values.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let stage_timeout = lookup("STAGE_WAIT_TIMEOUT_SECS").and_then(|raw| {
            match raw.parse::<f64>() {
                Ok(secs) if secs.is_finite() && secs > 0.0 => Some(Duration::from_secs_f64(secs)),
                _ => {
                    warn!("Ignoring STAGE_WAIT_TIMEOUT_SECS={raw}, stages will wait indefinitely");
                    None
                }
            }
        });
        let booster_decouple_stages = lookup("BOOSTER_DECOUPLE_STAGES")
            .and_then(|raw| {
                let parsed = parse_stage_pair(&raw);
                if parsed.is_none() {
                    warn!("Ignoring BOOSTER_DECOUPLE_STAGES={raw}, expected two stages like '3,2'");
                }
                parsed
            })
            .unwrap_or(LaunchParameters::DEF_BOOSTER_DECOUPLE_STAGES);

        Self {
            address: lookup("KRPC_ADDRESS").unwrap_or_else(|| Self::DEF_ADDRESS.to_string()),
            rpc_port: parse_or(&lookup, "KRPC_RPC_PORT", Self::DEF_RPC_PORT),
            stream_port: parse_or(&lookup, "KRPC_STREAM_PORT", Self::DEF_STREAM_PORT),
            connection_name: lookup("KRPC_CONNECTION_NAME")
                .unwrap_or_else(|| Self::DEF_CONNECTION_NAME.to_string()),
            profile: parse_or(&lookup, "MISSION_PROFILE", Self::DEF_PROFILE),
            launch_body: lookup("LAUNCH_BODY").unwrap_or_else(|| Self::DEF_LAUNCH_BODY.to_string()),
            stage_timeout,
            booster_decouple_stages,
            chute_altitude: parse_or(&lookup, "CHUTE_ALTITUDE", LaunchParameters::DEF_CHUTE_ALTITUDE),
        }
    }

    pub fn launch_parameters(&self, atmosphere_depth: f64) -> LaunchParameters {
        LaunchParameters {
            atmosphere_depth,
            booster_decouple_stages: self.booster_decouple_stages,
            chute_altitude: self.chute_altitude,
        }
    }
}

fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("Ignoring {key}={raw}, falling back to default");
            default
        }),
    }
}

fn parse_stage_pair(raw: &str) -> Option<[i32; 2]> {
    let mut stages = raw.split(',').map(|s| s.trim().parse::<i32>());
    match (stages.next(), stages.next(), stages.next()) {
        (Some(Ok(first)), Some(Ok(second)), None) => Some([first, second]),
        _ => None,
    }
}
