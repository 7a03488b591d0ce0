use strum_macros::Display;

/// Scalar telemetry a mission can wait on.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Telemetry {
    /// Magnitude of the velocity relative to the orbited body, in m/s.
    #[strum(to_string = "speed")]
    Speed,
    #[strum(to_string = "apoapsis altitude")]
    ApoapsisAltitude,
    #[strum(to_string = "periapsis altitude")]
    PeriapsisAltitude,
    /// Altitude above sea level.
    #[strum(to_string = "mean altitude")]
    MeanAltitude,
    /// Altitude above the terrain or sea, whichever is higher.
    #[strum(to_string = "surface altitude")]
    SurfaceAltitude,
    #[strum(to_string = "vertical speed")]
    VerticalSpeed,
    /// Solid fuel left in the parts decoupled in `decouple_stage`.
    #[strum(to_string = "solid fuel of decouple stage {decouple_stage}")]
    SolidFuel { decouple_stage: i32 },
}

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    /// Crossed once the reading reaches the threshold.
    #[strum(to_string = ">=")]
    AtLeast,
    /// Crossed once the reading drops under the threshold.
    #[strum(to_string = "<")]
    Below,
}

/// A telemetry condition that ends a wait once crossed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Threshold {
    metric: Telemetry,
    comparison: Comparison,
    value: f64,
}

impl Threshold {
    pub fn at_least(metric: Telemetry, value: f64) -> Self {
        Self { metric, comparison: Comparison::AtLeast, value }
    }

    pub fn below(metric: Telemetry, value: f64) -> Self {
        Self { metric, comparison: Comparison::Below, value }
    }

    pub fn metric(&self) -> Telemetry { self.metric }
    pub fn value(&self) -> f64 { self.value }

    /// Whether `reading` ends the wait. Comparisons are strict on the waiting side:
    /// an `AtLeast` wait continues only while `reading < value`.
    pub fn is_crossed(&self, reading: f64) -> bool {
        match self.comparison {
            Comparison::AtLeast => reading >= self.value,
            Comparison::Below => reading < self.value,
        }
    }
}

impl std::fmt::Display for Threshold {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {:.1}", self.metric, self.comparison, self.value)
    }
}
