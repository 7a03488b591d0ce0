use super::{
    directions::{Direction, Frame},
    flight_error::FlightError,
    spacecraft::Spacecraft,
    telemetry::{Telemetry, Threshold},
};
use crate::{event, log};
use async_trait::async_trait;
use krpc_client::{
    services::space_center::{
        AutoPilot, CelestialBody, Control, Flight, Orbit, ReferenceFrame, SpaceCenter, Vessel,
    },
    stream::Stream,
};

/// Name of the resource burned by solid rocket boosters.
const SOLID_FUEL: &str = "SolidFuel";

/// A server pushed metric, tagged with its wire type.
enum MetricStream {
    Double(Stream<f64>),
    Float(Stream<f32>),
}

impl MetricStream {
    /// Update rate requested for threshold waits, in Hz.
    const RATE: f32 = 20.0;

    async fn set_rate(&self, hz: f32) -> Result<(), FlightError> {
        match self {
            MetricStream::Double(stream) => stream.set_rate(hz).await?,
            MetricStream::Float(stream) => stream.set_rate(hz).await?,
        }
        Ok(())
    }

    /// Suspends until the server pushes the next value.
    async fn wait(&self) {
        match self {
            MetricStream::Double(stream) => {
                stream.wait().await;
            }
            MetricStream::Float(stream) => {
                stream.wait().await;
            }
        }
    }

    async fn get(&self) -> Result<f64, FlightError> {
        Ok(match self {
            MetricStream::Double(stream) => stream.get().await?,
            MetricStream::Float(stream) => f64::from(stream.get().await?),
        })
    }
}

/// The active vessel behind a live kRPC connection.
///
/// Handles are looked up again on every access, so the vessel keeps working across
/// staging events that replace the active vessel object.
pub struct KrpcVessel {
    space_center: SpaceCenter,
    launch_body: String,
}

impl KrpcVessel {
    pub fn new(space_center: SpaceCenter, launch_body: &str) -> Self {
        Self { space_center, launch_body: launch_body.to_string() }
    }

    pub async fn active_vessel(&self) -> Result<Vessel, FlightError> {
        Ok(self.space_center.get_active_vessel().await?)
    }

    pub async fn auto_pilot(&self) -> Result<AutoPilot, FlightError> {
        Ok(self.active_vessel().await?.get_auto_pilot().await?)
    }

    async fn control(&self) -> Result<Control, FlightError> {
        Ok(self.active_vessel().await?.get_control().await?)
    }

    pub async fn orbit(&self) -> Result<Orbit, FlightError> {
        Ok(self.active_vessel().await?.get_orbit().await?)
    }

    pub async fn velocity(&self, frame: &ReferenceFrame) -> Result<(f64, f64, f64), FlightError> {
        Ok(self.active_vessel().await?.velocity(frame).await?)
    }

    /// Flight telemetry in the reference frame of the body currently orbited.
    pub async fn flight(&self) -> Result<Flight, FlightError> {
        let frame = self.body_frame().await?;
        Ok(self.active_vessel().await?.flight(Some(&frame)).await?)
    }

    async fn body_frame(&self) -> Result<ReferenceFrame, FlightError> {
        let body = self.orbit().await?.get_body().await?;
        Ok(body.get_reference_frame().await?)
    }

    async fn launch_body(&self) -> Result<CelestialBody, FlightError> {
        self.space_center
            .get_bodies()
            .await?
            .remove(&self.launch_body)
            .ok_or_else(|| FlightError::UnknownBody { name: self.launch_body.clone() })
    }

    async fn resolve_frame(&self, frame: Frame) -> Result<ReferenceFrame, FlightError> {
        let vessel = self.active_vessel().await?;
        Ok(match frame {
            Frame::VesselOrbital => vessel.get_orbital_reference_frame().await?,
            Frame::VesselSurface => vessel.get_surface_reference_frame().await?,
        })
    }

    async fn solid_fuel(&self, decouple_stage: i32) -> Result<f32, FlightError> {
        let vessel = self.active_vessel().await?;
        let resources = vessel.resources_in_decouple_stage(decouple_stage, false).await?;
        Ok(resources.amount(SOLID_FUEL.to_string()).await?)
    }

    async fn metric_stream(&self, metric: Telemetry) -> Result<MetricStream, FlightError> {
        Ok(match metric {
            Telemetry::Speed => MetricStream::Double(self.flight().await?.get_speed_stream().await?),
            Telemetry::ApoapsisAltitude => {
                MetricStream::Double(self.orbit().await?.get_apoapsis_altitude_stream().await?)
            }
            Telemetry::PeriapsisAltitude => {
                MetricStream::Double(self.orbit().await?.get_periapsis_altitude_stream().await?)
            }
            Telemetry::MeanAltitude => {
                MetricStream::Double(self.flight().await?.get_mean_altitude_stream().await?)
            }
            Telemetry::SurfaceAltitude => {
                MetricStream::Double(self.flight().await?.get_surface_altitude_stream().await?)
            }
            Telemetry::VerticalSpeed => {
                MetricStream::Double(self.flight().await?.get_vertical_speed_stream().await?)
            }
            Telemetry::SolidFuel { decouple_stage } => {
                let vessel = self.active_vessel().await?;
                let resources = vessel.resources_in_decouple_stage(decouple_stage, false).await?;
                MetricStream::Float(resources.amount_stream(SOLID_FUEL.to_string()).await?)
            }
        })
    }
}

#[async_trait]
impl Spacecraft for KrpcVessel {
    async fn set_sas(&self, engaged: bool) -> Result<(), FlightError> {
        Ok(self.control().await?.set_sas(engaged).await?)
    }

    async fn set_throttle(&self, throttle: f32) -> Result<(), FlightError> {
        Ok(self.control().await?.set_throttle(throttle).await?)
    }

    async fn activate_next_stage(&self) -> Result<(), FlightError> {
        self.control().await?.activate_next_stage().await?;
        Ok(())
    }

    async fn engage_autopilot(&self) -> Result<(), FlightError> {
        Ok(self.auto_pilot().await?.engage().await?)
    }

    async fn disengage_autopilot(&self) -> Result<(), FlightError> {
        Ok(self.auto_pilot().await?.disengage().await?)
    }

    async fn target_pitch_and_heading(&self, pitch: f32, heading: f32) -> Result<(), FlightError> {
        Ok(self.auto_pilot().await?.target_pitch_and_heading(pitch, heading).await?)
    }

    async fn target_direction(&self, direction: Direction) -> Result<(), FlightError> {
        let auto_pilot = self.auto_pilot().await?;
        let frame = self.resolve_frame(direction.frame()).await?;
        auto_pilot.set_reference_frame(&frame).await?;
        Ok(auto_pilot.set_target_direction(direction.vector()).await?)
    }

    async fn read(&self, metric: Telemetry) -> Result<f64, FlightError> {
        Ok(match metric {
            Telemetry::Speed => {
                let (x, y, z) = self.velocity(&self.body_frame().await?).await?;
                (x * x + y * y + z * z).sqrt()
            }
            Telemetry::ApoapsisAltitude => self.orbit().await?.get_apoapsis_altitude().await?,
            Telemetry::PeriapsisAltitude => self.orbit().await?.get_periapsis_altitude().await?,
            Telemetry::MeanAltitude => self.flight().await?.get_mean_altitude().await?,
            Telemetry::SurfaceAltitude => self.flight().await?.get_surface_altitude().await?,
            Telemetry::VerticalSpeed => self.flight().await?.get_vertical_speed().await?,
            Telemetry::SolidFuel { decouple_stage } => f64::from(self.solid_fuel(decouple_stage).await?),
        })
    }

    async fn await_threshold(&self, threshold: Threshold) -> Result<(), FlightError> {
        // The stream is owned by this future and released on the server when dropped.
        let stream = self.metric_stream(threshold.metric()).await?;
        stream.set_rate(MetricStream::RATE).await?;
        event!("Streaming {} until {threshold}", threshold.metric());
        loop {
            stream.wait().await;
            if threshold.is_crossed(stream.get().await?) {
                break;
            }
        }
        log!("Server reports {threshold}");
        Ok(())
    }

    async fn atmosphere_depth(&self) -> Result<f64, FlightError> {
        let body = self.launch_body().await?;
        Ok(f64::from(body.get_atmosphere_depth().await?))
    }
}
