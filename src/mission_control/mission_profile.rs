use crate::flight_control::{Direction, FlightError, Frame, Spacecraft, Telemetry, Threshold};
use std::time::Duration;
use strum_macros::{Display, EnumString};

/// A single command sent to the vessel when a stage begins.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    SetSas(bool),
    SetThrottle(f32),
    ActivateNextStage,
    EngageAutopilot,
    DisengageAutopilot,
    TargetPitchAndHeading { pitch: f32, heading: f32 },
    TargetDirection(Direction),
}

impl Action {
    pub async fn apply(&self, craft: &dyn Spacecraft) -> Result<(), FlightError> {
        match *self {
            Action::SetSas(engaged) => craft.set_sas(engaged).await,
            Action::SetThrottle(throttle) => craft.set_throttle(throttle).await,
            Action::ActivateNextStage => craft.activate_next_stage().await,
            Action::EngageAutopilot => craft.engage_autopilot().await,
            Action::DisengageAutopilot => craft.disengage_autopilot().await,
            Action::TargetPitchAndHeading { pitch, heading } => {
                craft.target_pitch_and_heading(pitch, heading).await
            }
            Action::TargetDirection(direction) => craft.target_direction(direction).await,
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::SetSas(engaged) => write!(f, "SAS {}", if *engaged { "on" } else { "off" }),
            Action::SetThrottle(throttle) => write!(f, "throttle {:.0}%", throttle * 100.0),
            Action::ActivateNextStage => write!(f, "activate next stage"),
            Action::EngageAutopilot => write!(f, "engage autopilot"),
            Action::DisengageAutopilot => write!(f, "disengage autopilot"),
            Action::TargetPitchAndHeading { pitch, heading } => {
                write!(f, "target pitch {pitch} heading {heading}")
            }
            Action::TargetDirection(direction) => {
                write!(f, "target direction {:?} in {} frame", direction.vector(), direction.frame())
            }
        }
    }
}

/// How a stage waits before handing over to the next one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WaitCondition {
    /// Continue immediately.
    None,
    /// Read the metric every `interval` until the threshold is crossed, logging `echo`
    /// on every read.
    Poll { threshold: Threshold, interval: Duration, echo: Option<Telemetry> },
    /// Let the server evaluate the threshold and wait for its event.
    Event(Threshold),
}

/// One step of a mission: actions applied in order, then a wait.
#[derive(Debug, Clone, PartialEq)]
pub struct Stage {
    name: &'static str,
    actions: Vec<Action>,
    wait: WaitCondition,
}

impl Stage {
    pub fn new(name: &'static str, actions: Vec<Action>, wait: WaitCondition) -> Self {
        Self { name, actions, wait }
    }

    pub fn name(&self) -> &'static str { self.name }
    pub fn actions(&self) -> &[Action] { &self.actions }
    pub fn wait(&self) -> &WaitCondition { &self.wait }
}

/// The known flight plans.
#[derive(Debug, Display, EnumString, Clone, Copy, PartialEq, Eq)]
#[strum(serialize_all = "kebab-case")]
pub enum MissionProfile {
    /// Polled vertical climb, gravity turn and circularization.
    OrbitalAscent,
    /// Event driven ascent with two solid boosters, then descent under parachutes.
    SuborbitalHop,
}

/// Values a flight plan is derived from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaunchParameters {
    /// Atmosphere height of the launch body, in meters.
    pub atmosphere_depth: f64,
    /// Decouple stages of the first and the second pair of solid boosters.
    pub booster_decouple_stages: [i32; 2],
    /// Mean altitude at which the parachutes are staged on the way down.
    pub chute_altitude: f64,
}

impl LaunchParameters {
    pub const DEF_BOOSTER_DECOUPLE_STAGES: [i32; 2] = [3, 2];
    pub const DEF_CHUTE_ALTITUDE: f64 = 1_000.0;

    pub fn new(atmosphere_depth: f64) -> Self {
        Self {
            atmosphere_depth,
            booster_decouple_stages: Self::DEF_BOOSTER_DECOUPLE_STAGES,
            chute_altitude: Self::DEF_CHUTE_ALTITUDE,
        }
    }
}

/// An ordered list of stages, flown strictly front to back.
#[derive(Debug, Clone, PartialEq)]
pub struct Mission {
    profile: MissionProfile,
    stages: Vec<Stage>,
}

impl Mission {
    const POLL_INTERVAL: Duration = Duration::from_millis(50);
    const LANDING_POLL_INTERVAL: Duration = Duration::from_secs(1);
    const CLIMB_SPEED: f64 = 100.0;
    const APOAPSIS_MARGIN: f64 = 1_500.0;
    const LAUNCH_HEADING: f32 = 90.0;
    const TURN_PITCH: f32 = 80.0;
    const BOOSTER_BURNOUT_FUEL: f64 = 0.1;
    const TOUCHDOWN_VERTICAL_SPEED: f64 = -0.1;
    /// Fixed burn direction of the circularization, in the autopilot's default frame.
    pub const CIRCULARIZE_DIRECTION: Direction = Direction::new(Frame::VesselSurface, (0.0, 1.0, 0.0));

    pub fn new(profile: MissionProfile, stages: Vec<Stage>) -> Self { Self { profile, stages } }

    pub fn profile(&self) -> MissionProfile { self.profile }
    pub fn stages(&self) -> &[Stage] { &self.stages }

    pub fn plan(profile: MissionProfile, params: &LaunchParameters) -> Self {
        match profile {
            MissionProfile::OrbitalAscent => Self::orbital_ascent(params),
            MissionProfile::SuborbitalHop => Self::suborbital_hop(params),
        }
    }

    fn pre_launch() -> Stage {
        Stage::new(
            "pre-launch",
            vec![
                Action::SetSas(true),
                Action::SetThrottle(1.0),
                Action::ActivateNextStage,
                Action::EngageAutopilot,
                Action::TargetPitchAndHeading { pitch: 90.0, heading: Self::LAUNCH_HEADING },
            ],
            WaitCondition::None,
        )
    }

    fn poll(threshold: Threshold) -> WaitCondition {
        WaitCondition::Poll { threshold, interval: Self::POLL_INTERVAL, echo: None }
    }

    fn orbital_ascent(params: &LaunchParameters) -> Self {
        let atmo = params.atmosphere_depth;
        let stages = vec![
            Self::pre_launch(),
            Stage::new(
                "climb",
                vec![],
                Self::poll(Threshold::at_least(Telemetry::Speed, Self::CLIMB_SPEED)),
            ),
            Stage::new(
                "gravity turn",
                vec![Action::TargetPitchAndHeading {
                    pitch: Self::TURN_PITCH,
                    heading: Self::LAUNCH_HEADING,
                }],
                WaitCondition::Poll {
                    threshold: Threshold::at_least(
                        Telemetry::ApoapsisAltitude,
                        atmo + Self::APOAPSIS_MARGIN,
                    ),
                    interval: Self::POLL_INTERVAL,
                    echo: Some(Telemetry::ApoapsisAltitude),
                },
            ),
            Stage::new(
                "coast",
                vec![Action::SetThrottle(0.0)],
                Self::poll(Threshold::at_least(Telemetry::MeanAltitude, atmo)),
            ),
            Stage::new(
                "circularize",
                vec![
                    Action::SetThrottle(1.0),
                    Action::TargetDirection(Self::CIRCULARIZE_DIRECTION),
                ],
                Self::poll(Threshold::at_least(Telemetry::PeriapsisAltitude, atmo)),
            ),
            Stage::new("terminate", vec![Action::SetThrottle(0.0)], WaitCondition::None),
        ];
        Self::new(MissionProfile::OrbitalAscent, stages)
    }

    fn suborbital_hop(params: &LaunchParameters) -> Self {
        let atmo = params.atmosphere_depth;
        let [first_boosters, second_boosters] = params.booster_decouple_stages;
        let burnout = |decouple_stage| {
            WaitCondition::Event(Threshold::below(
                Telemetry::SolidFuel { decouple_stage },
                Self::BOOSTER_BURNOUT_FUEL,
            ))
        };
        let stages = vec![
            Self::pre_launch(),
            Stage::new(
                "climb",
                vec![],
                WaitCondition::Event(Threshold::at_least(Telemetry::Speed, Self::CLIMB_SPEED)),
            ),
            Stage::new(
                "gravity turn",
                vec![Action::TargetPitchAndHeading {
                    pitch: Self::TURN_PITCH,
                    heading: Self::LAUNCH_HEADING,
                }],
                burnout(first_boosters),
            ),
            Stage::new(
                "first booster separation",
                vec![Action::ActivateNextStage],
                burnout(second_boosters),
            ),
            Stage::new(
                "second booster separation",
                vec![Action::ActivateNextStage],
                WaitCondition::Event(Threshold::at_least(
                    Telemetry::ApoapsisAltitude,
                    atmo + Self::APOAPSIS_MARGIN,
                )),
            ),
            Stage::new(
                "coast",
                vec![Action::SetThrottle(0.0), Action::DisengageAutopilot],
                WaitCondition::Event(Threshold::below(Telemetry::VerticalSpeed, 0.0)),
            ),
            Stage::new(
                "descent",
                vec![],
                WaitCondition::Event(Threshold::below(
                    Telemetry::MeanAltitude,
                    params.chute_altitude,
                )),
            ),
            Stage::new(
                "landing",
                vec![Action::ActivateNextStage],
                WaitCondition::Poll {
                    threshold: Threshold::at_least(
                        Telemetry::VerticalSpeed,
                        Self::TOUCHDOWN_VERTICAL_SPEED,
                    ),
                    interval: Self::LANDING_POLL_INTERVAL,
                    echo: Some(Telemetry::SurfaceAltitude),
                },
            ),
            Stage::new("terminate", vec![Action::SetThrottle(0.0)], WaitCondition::None),
        ];
        Self::new(MissionProfile::SuborbitalHop, stages)
    }
}
