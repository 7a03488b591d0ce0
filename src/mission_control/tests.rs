use super::mission_profile::{Action, LaunchParameters, Mission, MissionProfile, WaitCondition};
use super::sequencer::MissionSequencer;
use super::signal::MissionError;
use super::wait::poll_until;
use crate::flight_control::{Direction, FlightError, Frame, Spacecraft, Telemetry, Threshold};
use async_trait::async_trait;
use rand::Rng;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const ATMOSPHERE_DEPTH: f64 = 70_000.0;

#[derive(Debug, Clone, PartialEq)]
enum Command {
    Sas(bool),
    Throttle(f32),
    NextStage,
    Engage,
    Disengage,
    PitchHeading(f32, f32),
    Direction(Direction),
    Event(Threshold),
}

/// Spacecraft replaying scripted telemetry. Each metric yields its values in order and
/// keeps repeating the last one.
#[derive(Default)]
struct FakeSpacecraft {
    commands: Mutex<Vec<Command>>,
    feeds: Mutex<HashMap<Telemetry, VecDeque<f64>>>,
    reads: Mutex<HashMap<Telemetry, usize>>,
    /// Server side streams held by threshold waits that are still alive.
    open_streams: AtomicUsize,
}

/// Stands in for a server side stream, counted as open until dropped.
struct StreamLease<'a>(&'a AtomicUsize);

impl<'a> StreamLease<'a> {
    fn open(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for StreamLease<'_> {
    fn drop(&mut self) { self.0.fetch_sub(1, Ordering::SeqCst); }
}

impl FakeSpacecraft {
    fn with_feeds(feeds: &[(Telemetry, &[f64])]) -> Arc<Self> {
        let craft = Self::default();
        {
            let mut feeds_lock = craft.feeds.lock().unwrap();
            for (metric, values) in feeds {
                feeds_lock.insert(*metric, values.iter().copied().collect());
            }
        }
        Arc::new(craft)
    }

    fn commands(&self) -> Vec<Command> { self.commands.lock().unwrap().clone() }

    fn reads(&self, metric: Telemetry) -> usize {
        self.reads.lock().unwrap().get(&metric).copied().unwrap_or(0)
    }

    fn open_streams(&self) -> usize { self.open_streams.load(Ordering::SeqCst) }

    fn record(&self, command: Command) -> Result<(), FlightError> {
        self.commands.lock().unwrap().push(command);
        Ok(())
    }
}

#[async_trait]
impl Spacecraft for FakeSpacecraft {
    async fn set_sas(&self, engaged: bool) -> Result<(), FlightError> { self.record(Command::Sas(engaged)) }
    async fn set_throttle(&self, throttle: f32) -> Result<(), FlightError> {
        self.record(Command::Throttle(throttle))
    }
    async fn activate_next_stage(&self) -> Result<(), FlightError> { self.record(Command::NextStage) }
    async fn engage_autopilot(&self) -> Result<(), FlightError> { self.record(Command::Engage) }
    async fn disengage_autopilot(&self) -> Result<(), FlightError> { self.record(Command::Disengage) }
    async fn target_pitch_and_heading(&self, pitch: f32, heading: f32) -> Result<(), FlightError> {
        self.record(Command::PitchHeading(pitch, heading))
    }
    async fn target_direction(&self, direction: Direction) -> Result<(), FlightError> {
        self.record(Command::Direction(direction))
    }

    async fn read(&self, metric: Telemetry) -> Result<f64, FlightError> {
        *self.reads.lock().unwrap().entry(metric).or_default() += 1;
        let mut feeds = self.feeds.lock().unwrap();
        let feed = feeds
            .get_mut(&metric)
            .ok_or(FlightError::UnexpectedValue { what: "no telemetry scripted" })?;
        if feed.len() > 1 {
            Ok(feed.pop_front().unwrap_or_default())
        } else {
            feed.front().copied().ok_or(FlightError::UnexpectedValue { what: "empty feed" })
        }
    }

    async fn await_threshold(&self, threshold: Threshold) -> Result<(), FlightError> {
        self.record(Command::Event(threshold))?;
        let _stream = StreamLease::open(&self.open_streams);
        while !threshold.is_crossed(self.read(threshold.metric()).await?) {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        Ok(())
    }

    async fn atmosphere_depth(&self) -> Result<f64, FlightError> { Ok(ATMOSPHERE_DEPTH) }
}

fn orbital_feeds() -> Arc<FakeSpacecraft> {
    FakeSpacecraft::with_feeds(&[
        (Telemetry::Speed, &[0.0, 42.0, 99.5, 100.0, 180.0]),
        (Telemetry::ApoapsisAltitude, &[8_000.0, 40_000.0, 71_499.0, 71_500.0]),
        (Telemetry::MeanAltitude, &[52_000.0, 69_999.0, 70_000.0]),
        (Telemetry::PeriapsisAltitude, &[-590_000.0, -12_000.0, 70_100.0]),
    ])
}

fn sequencer(craft: &Arc<FakeSpacecraft>, timeout: Option<Duration>) -> MissionSequencer {
    MissionSequencer::new(Arc::clone(craft) as Arc<dyn Spacecraft>, timeout, CancellationToken::new())
}

fn orbital_mission() -> Mission {
    Mission::plan(MissionProfile::OrbitalAscent, &LaunchParameters::new(ATMOSPHERE_DEPTH))
}

#[test]
fn test_profiles_parse_from_kebab_case() {
    assert_eq!("orbital-ascent".parse::<MissionProfile>().unwrap(), MissionProfile::OrbitalAscent);
    assert_eq!("suborbital-hop".parse::<MissionProfile>().unwrap(), MissionProfile::SuborbitalHop);
    assert!("lunar-landing".parse::<MissionProfile>().is_err());
    assert_eq!(MissionProfile::SuborbitalHop.to_string(), "suborbital-hop");
}

#[test]
fn test_orbital_plan_derives_thresholds_from_atmosphere() {
    let mission = orbital_mission();
    let names: Vec<_> = mission.stages().iter().map(|s| s.name()).collect();
    assert_eq!(names, ["pre-launch", "climb", "gravity turn", "coast", "circularize", "terminate"]);

    let WaitCondition::Poll { threshold, interval, echo } = *mission.stages()[2].wait() else {
        panic!("gravity turn must poll");
    };
    assert_eq!(threshold, Threshold::at_least(Telemetry::ApoapsisAltitude, 71_500.0));
    assert_eq!(interval, Duration::from_millis(50));
    assert_eq!(echo, Some(Telemetry::ApoapsisAltitude));
    assert!(
        mission.stages()[4].actions().contains(&Action::TargetDirection(Mission::CIRCULARIZE_DIRECTION))
    );
}

#[tokio::test(start_paused = true)]
async fn test_orbital_ascent_issues_commands_once_in_order() {
    let craft = orbital_feeds();
    let report = sequencer(&craft, None).run(&orbital_mission()).await.unwrap();

    assert_eq!(
        craft.commands(),
        vec![
            Command::Sas(true),
            Command::Throttle(1.0),
            Command::NextStage,
            Command::Engage,
            Command::PitchHeading(90.0, 90.0),
            Command::PitchHeading(80.0, 90.0),
            Command::Throttle(0.0),
            Command::Throttle(1.0),
            Command::Direction(Direction::new(Frame::VesselSurface, (0.0, 1.0, 0.0))),
            Command::Throttle(0.0),
        ]
    );
    let readings: Vec<_> = report.stages().iter().map(|s| (s.name, s.reading)).collect();
    assert_eq!(
        readings,
        vec![
            ("pre-launch", None),
            ("climb", Some(100.0)),
            ("gravity turn", Some(71_500.0)),
            ("coast", Some(70_000.0)),
            ("circularize", Some(70_100.0)),
            ("terminate", None),
        ]
    );
    // The speed feed still holds 180.0, the climb stopped at exactly 100.0.
    assert_eq!(craft.reads(Telemetry::Speed), 4);
}

#[tokio::test(start_paused = true)]
async fn test_poll_stops_exactly_at_threshold() {
    let craft = FakeSpacecraft::with_feeds(&[(Telemetry::Speed, &[99.999, 100.0, 250.0])]);
    let threshold = Threshold::at_least(Telemetry::Speed, 100.0);
    let reading = poll_until(&*craft, threshold, Duration::from_millis(50), None).await.unwrap();
    assert_eq!(reading, Some(100.0));
    assert_eq!(craft.reads(Telemetry::Speed), 2);

    let descent = FakeSpacecraft::with_feeds(&[(Telemetry::VerticalSpeed, &[-0.100_001, -0.1])]);
    let touchdown = Threshold::at_least(Telemetry::VerticalSpeed, -0.1);
    let reading = poll_until(&*descent, touchdown, Duration::from_secs(1), Some(Telemetry::VerticalSpeed))
        .await
        .unwrap();
    assert_eq!(reading, Some(-0.1));
    assert_eq!(descent.reads(Telemetry::VerticalSpeed), 2);
}

#[tokio::test(start_paused = true)]
async fn test_randomized_climb_reads_until_crossing() {
    let mut rng = rand::rng();
    for _ in 0..20 {
        let below = rng.random_range(0..30);
        let mut feed: Vec<f64> = (0..below).map(|_| rng.random_range(0.0..100.0)).collect();
        let crossing = rng.random_range(100.0..400.0);
        feed.push(crossing);
        let craft = FakeSpacecraft::with_feeds(&[(Telemetry::Speed, &feed)]);
        let threshold = Threshold::at_least(Telemetry::Speed, 100.0);
        let reading = poll_until(&*craft, threshold, Duration::from_millis(50), None).await.unwrap();
        assert_eq!(reading, Some(crossing));
        assert_eq!(craft.reads(Telemetry::Speed), below + 1);
    }
}

#[tokio::test(start_paused = true)]
async fn test_uncrossed_threshold_blocks_forever_without_timeout() {
    let craft = FakeSpacecraft::with_feeds(&[(Telemetry::Speed, &[12.0])]);
    let mission = orbital_mission();
    let seq = sequencer(&craft, None);
    let res = tokio::time::timeout(Duration::from_secs(3600), seq.run(&mission)).await;
    assert!(res.is_err(), "sequencer must still be waiting");
    assert_eq!(craft.commands().last(), Some(&Command::PitchHeading(90.0, 90.0)));
    assert!(craft.reads(Telemetry::Speed) > 1_000);
}

#[tokio::test(start_paused = true)]
async fn test_stage_timeout_names_the_stage() {
    let craft = FakeSpacecraft::with_feeds(&[(Telemetry::Speed, &[12.0])]);
    let res = sequencer(&craft, Some(Duration::from_secs(5))).run(&orbital_mission()).await;
    match res {
        Err(MissionError::TimedOut { stage, timeout }) => {
            assert_eq!(stage, "climb");
            assert_eq!(timeout, Duration::from_secs(5));
        }
        other => panic!("expected a timeout, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_cancellation_ends_the_wait() {
    let craft = FakeSpacecraft::with_feeds(&[(Telemetry::Speed, &[12.0])]);
    let c_tok = CancellationToken::new();
    let seq = MissionSequencer::new(Arc::clone(&craft) as Arc<dyn Spacecraft>, None, c_tok.clone());
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(2)).await;
        c_tok.cancel();
    });
    let err = seq.run(&orbital_mission()).await.unwrap_err();
    assert!(matches!(err, MissionError::Cancelled { stage: "climb" }));
    assert_eq!(err.to_string(), "stage 'climb' cancelled");
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_before_launch_issues_no_commands() {
    let craft = orbital_feeds();
    let c_tok = CancellationToken::new();
    c_tok.cancel();
    let seq = MissionSequencer::new(Arc::clone(&craft) as Arc<dyn Spacecraft>, None, c_tok);
    let err = seq.run(&orbital_mission()).await.unwrap_err();
    assert_eq!(err.stage(), "pre-launch");
    assert!(craft.commands().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_telemetry_failure_aborts_without_further_commands() {
    let craft = FakeSpacecraft::with_feeds(&[(Telemetry::Speed, &[150.0])]);
    let err = sequencer(&craft, None).run(&orbital_mission()).await.unwrap_err();
    match err {
        MissionError::Flight { stage, source: FlightError::UnexpectedValue { .. } } => {
            assert_eq!(stage, "gravity turn");
        }
        other => panic!("expected an RPC failure, got {other:?}"),
    }
    assert_eq!(craft.commands().last(), Some(&Command::PitchHeading(80.0, 90.0)));
    assert!(!craft.commands().contains(&Command::Throttle(0.0)));
}

#[tokio::test(start_paused = true)]
async fn test_suborbital_hop_separates_boosters_and_lands() {
    let params = LaunchParameters {
        atmosphere_depth: ATMOSPHERE_DEPTH,
        booster_decouple_stages: [5, 4],
        chute_altitude: 1_200.0,
    };
    let mission = Mission::plan(MissionProfile::SuborbitalHop, &params);
    let craft = FakeSpacecraft::with_feeds(&[
        (Telemetry::Speed, &[30.0, 100.0]),
        (Telemetry::SolidFuel { decouple_stage: 5 }, &[220.0, 12.0, 0.05]),
        (Telemetry::SolidFuel { decouple_stage: 4 }, &[0.0]),
        (Telemetry::ApoapsisAltitude, &[75_000.0]),
        (Telemetry::VerticalSpeed, &[120.0, -5.0, -3.0, -0.05]),
        (Telemetry::MeanAltitude, &[40_000.0, 1_100.0]),
        (Telemetry::SurfaceAltitude, &[900.0, 2.0]),
    ]);

    let report = sequencer(&craft, None).run(&mission).await.unwrap();

    let events: Vec<_> = craft
        .commands()
        .into_iter()
        .filter_map(|c| if let Command::Event(t) = c { Some(t) } else { None })
        .collect();
    assert_eq!(
        events,
        vec![
            Threshold::at_least(Telemetry::Speed, 100.0),
            Threshold::below(Telemetry::SolidFuel { decouple_stage: 5 }, 0.1),
            Threshold::below(Telemetry::SolidFuel { decouple_stage: 4 }, 0.1),
            Threshold::at_least(Telemetry::ApoapsisAltitude, 71_500.0),
            Threshold::below(Telemetry::VerticalSpeed, 0.0),
            Threshold::below(Telemetry::MeanAltitude, 1_200.0),
        ]
    );
    let stage_count = craft.commands().iter().filter(|c| **c == Command::NextStage).count();
    assert_eq!(stage_count, 4, "launch, two booster pairs and the parachutes");
    assert!(craft.commands().contains(&Command::Disengage));
    assert_eq!(craft.commands().last(), Some(&Command::Throttle(0.0)));

    let landing = report.stages().iter().find(|s| s.name == "landing").unwrap();
    assert_eq!(landing.reading, Some(-0.05));
    assert_eq!(craft.reads(Telemetry::SurfaceAltitude), 2);
    assert!(landing.elapsed >= Duration::from_secs(1));
}

#[test]
fn test_circularize_keeps_the_autopilot_surface_frame() {
    let mission = orbital_mission();
    let circularize = mission.stages().iter().find(|s| s.name() == "circularize").unwrap();
    let directions: Vec<_> = circularize
        .actions()
        .iter()
        .filter_map(|a| if let Action::TargetDirection(d) = a { Some(*d) } else { None })
        .collect();
    assert_eq!(directions.len(), 1);
    assert_eq!(directions[0].frame(), Frame::VesselSurface);
    assert_eq!(directions[0].vector(), (0.0, 1.0, 0.0));
}

#[tokio::test(start_paused = true)]
async fn test_sub_second_timeout_is_reported_with_fraction() {
    let craft = FakeSpacecraft::with_feeds(&[(Telemetry::Speed, &[12.0])]);
    let err = sequencer(&craft, Some(Duration::from_millis(500)))
        .run(&orbital_mission())
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "stage 'climb' timed out after 0.5s");
}

fn stalled_hop() -> (Arc<FakeSpacecraft>, Mission) {
    let craft = FakeSpacecraft::with_feeds(&[(Telemetry::Speed, &[12.0])]);
    let mission = Mission::plan(MissionProfile::SuborbitalHop, &LaunchParameters::new(ATMOSPHERE_DEPTH));
    (craft, mission)
}

#[tokio::test(start_paused = true)]
async fn test_timed_out_event_wait_releases_its_stream() {
    let (craft, mission) = stalled_hop();
    let err = sequencer(&craft, Some(Duration::from_secs(3))).run(&mission).await.unwrap_err();
    assert!(matches!(err, MissionError::TimedOut { stage: "climb", .. }));
    assert_eq!(craft.commands().last(), Some(&Command::Event(Threshold::at_least(Telemetry::Speed, 100.0))));
    assert_eq!(craft.open_streams(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_event_wait_releases_its_stream() {
    let (craft, mission) = stalled_hop();
    let c_tok = CancellationToken::new();
    let seq = MissionSequencer::new(Arc::clone(&craft) as Arc<dyn Spacecraft>, None, c_tok.clone());

    let craft_clone = Arc::clone(&craft);
    let watcher = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        let open_while_waiting = craft_clone.open_streams();
        c_tok.cancel();
        open_while_waiting
    });
    let err = seq.run(&mission).await.unwrap_err();

    assert!(matches!(err, MissionError::Cancelled { stage: "climb" }));
    assert_eq!(watcher.await.unwrap(), 1);
    assert_eq!(craft.open_streams(), 0);
}
