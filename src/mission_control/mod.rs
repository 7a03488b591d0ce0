//! Declarative flight plans and the sequencer flying them.
//!
//! A [`Mission`] is an ordered list of stages, each applying a few actions and then
//! waiting on a telemetry threshold. The [`MissionSequencer`] executes them strictly in
//! order with cancellation and an optional timeout at every wait.

mod mission_profile;
mod sequencer;
mod signal;
mod wait;

#[cfg(test)]
mod tests;

pub use mission_profile::{LaunchParameters, Mission, MissionProfile};
pub use sequencer::MissionSequencer;
