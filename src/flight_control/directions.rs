use strum_macros::Display;

/// A vector of three doubles, in the axes of its frame.
pub type Vec3 = (f64, f64, f64);

/// Reference frames a [`Direction`] can be expressed in.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Frame {
    /// Moves with the vessel: y prograde, z orbit normal, x anti-radial.
    VesselOrbital,
    /// Moves with the vessel: x up, y north, z east. The autopilot's default frame.
    VesselSurface,
}

/// A unit vector together with the frame that gives it meaning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Direction {
    frame: Frame,
    vector: Vec3,
}

impl Direction {
    pub const fn new(frame: Frame, vector: Vec3) -> Self { Self { frame, vector } }
    pub fn frame(&self) -> Frame { self.frame }
    pub fn vector(&self) -> Vec3 { self.vector }

    /// The same axis pointing the other way.
    pub const fn opposite(self) -> Self {
        let (x, y, z) = self.vector;
        Self { frame: self.frame, vector: (-x, -y, -z) }
    }
}

/// The six orbital maneuver directions, all in [`Frame::VesselOrbital`].
pub struct OrbitalDirections;

impl OrbitalDirections {
    pub const fn prograde() -> Direction { Direction::new(Frame::VesselOrbital, (0.0, 1.0, 0.0)) }
    pub const fn retrograde() -> Direction { Self::prograde().opposite() }
    pub const fn normal() -> Direction { Direction::new(Frame::VesselOrbital, (0.0, 0.0, 1.0)) }
    pub const fn antinormal() -> Direction { Self::normal().opposite() }
    pub const fn radial_in() -> Direction { Direction::new(Frame::VesselOrbital, (1.0, 0.0, 0.0)) }
    pub const fn radial_out() -> Direction { Self::radial_in().opposite() }
}
