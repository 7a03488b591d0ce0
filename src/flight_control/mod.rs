//! The vessel side of a mission: the [`Spacecraft`] contract the sequencer flies against
//! and its implementation on top of the `krpc_client` `SpaceCenter` service.

mod directions;
mod flight_error;
mod krpc_vessel;
mod spacecraft;
mod telemetry;


pub use directions::{Direction, Frame};
pub use flight_error::FlightError;
pub use krpc_vessel::KrpcVessel;
pub use spacecraft::Spacecraft;
pub use telemetry::{Telemetry, Threshold};
