use super::{
    directions::Direction,
    flight_error::FlightError,
    telemetry::{Telemetry, Threshold},
};
use async_trait::async_trait;

/// What a mission needs from the vessel it flies.
///
/// Implemented over a live kRPC connection by [`super::KrpcVessel`]. Every operation is a
/// direct pass-through without retries or timeouts; waiting policy lives in the sequencer.
#[async_trait]
pub trait Spacecraft: Send + Sync {
    async fn set_sas(&self, engaged: bool) -> Result<(), FlightError>;
    async fn set_throttle(&self, throttle: f32) -> Result<(), FlightError>;
    async fn activate_next_stage(&self) -> Result<(), FlightError>;
    async fn engage_autopilot(&self) -> Result<(), FlightError>;
    async fn disengage_autopilot(&self) -> Result<(), FlightError>;
    async fn target_pitch_and_heading(&self, pitch: f32, heading: f32) -> Result<(), FlightError>;
    async fn target_direction(&self, direction: Direction) -> Result<(), FlightError>;

    /// Reads the current value of `metric`.
    async fn read(&self, metric: Telemetry) -> Result<f64, FlightError>;

    /// Blocks until `threshold` is crossed, suspended on server pushed updates of its
    /// metric instead of polling.
    ///
    /// Dropping the returned future releases the server side stream.
    async fn await_threshold(&self, threshold: Threshold) -> Result<(), FlightError>;

    /// Atmosphere height of the body the vessel launches from, in meters.
    async fn atmosphere_depth(&self) -> Result<f64, FlightError>;
}
