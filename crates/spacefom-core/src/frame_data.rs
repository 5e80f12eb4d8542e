//! Reference frame payload seeded by a publishing federate.

/// Tolerance used when checking the attitude quaternion for unit length.
pub const QUATERNION_NORM_TOLERANCE: f64 = 1.0e-9;

/// Space-time coordinate state of a reference frame relative to its parent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpaceTimeCoordinate {
    /// Position (m).
    pub pos: [f64; 3],
    /// Velocity (m/s).
    pub vel: [f64; 3],
    /// Attitude quaternion scalar part.
    pub quat_scalar: f64,
    /// Attitude quaternion vector part.
    pub quat_vector: [f64; 3],
    /// Angular velocity (rad/s).
    pub ang_vel: [f64; 3],
    /// Time tag (s).
    pub time: f64,
}

impl SpaceTimeCoordinate {
    /// Coincident with the parent frame: zero translation, identity attitude.
    pub const IDENTITY: Self = Self {
        pos: [0.0; 3],
        vel: [0.0; 3],
        quat_scalar: 1.0,
        quat_vector: [0.0; 3],
        ang_vel: [0.0; 3],
        time: 0.0,
    };

    /// Identity state offset by `pos`.
    pub fn at_position(pos: [f64; 3]) -> Self {
        Self { pos, ..Self::IDENTITY }
    }

    /// Euclidean norm of the attitude quaternion.
    pub fn attitude_norm(&self) -> f64 {
        let [x, y, z] = self.quat_vector;
        (self.quat_scalar * self.quat_scalar + x * x + y * y + z * z).sqrt()
    }

    /// Whether every component is finite and the attitude is a unit
    /// quaternion.
    pub fn is_valid(&self) -> bool {
        let finite = self
            .pos
            .iter()
            .chain(&self.vel)
            .chain(&self.quat_vector)
            .chain(&self.ang_vel)
            .chain([&self.quat_scalar, &self.time])
            .all(|v| v.is_finite());

        finite && (self.attitude_norm() - 1.0).abs() <= QUATERNION_NORM_TOLERANCE
    }
}

impl Default for SpaceTimeCoordinate {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Initial data for a published reference frame.
#[derive(Debug, Clone, PartialEq)]
pub struct RefFrameData {
    /// Frame name; must match the frame object it seeds.
    pub name: String,
    /// Parent frame name; `None` for the root of the frame tree.
    pub parent_name: Option<String>,
    /// Coordinate state relative to the parent.
    pub state: SpaceTimeCoordinate,
}

impl RefFrameData {
    /// Data for a root frame.
    pub fn root(name: impl Into<String>, state: SpaceTimeCoordinate) -> Self {
        Self { name: name.into(), parent_name: None, state }
    }

    /// Data for a frame attached to `parent_name`.
    pub fn child(
        name: impl Into<String>,
        parent_name: impl Into<String>,
        state: SpaceTimeCoordinate,
    ) -> Self {
        Self { name: name.into(), parent_name: Some(parent_name.into()), state }
    }
}
