//! The scripted path followed by the viewpoint.

use glam::Vec3;

/// Describes the path followed by the viewpoint.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FlightConfig {
    /// The points the viewpoint flies through, in order.
    pub waypoints: Vec<[f32; 3]>,
    /// The speed of the viewpoint, in world units per second.
    pub speed: f32,
    /// Whether the viewpoint flies back to the first waypoint after the last one.
    pub looped: bool,
}

impl Default for FlightConfig {
    fn default() -> Self {
        Self {
            waypoints: vec![
                [25.0, 5.0, 4.0],
                [700.0, 5.0, 4.0],
                [700.0, 5.0, 700.0],
                [-500.0, 5.0, 700.0],
                [-500.0, 5.0, -400.0],
            ],
            speed: 120.0,
            looped: true,
        }
    }
}

impl FlightConfig {
    /// Checks that a [`FlightPath`] can be created from this configuration.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.waypoints.is_empty() {
            return Err("`flight.waypoints` must not be empty");
        }
        if self.waypoints.iter().flatten().any(|c| !c.is_finite()) {
            return Err("`flight.waypoints` must be finite positions");
        }
        if !self.speed.is_finite() || self.speed < 0.0 {
            return Err("`flight.speed` must be a non-negative number");
        }
        Ok(())
    }
}

/// A viewpoint moving at constant speed along a polyline.
pub struct FlightPath {
    /// The points of the polyline. Never empty.
    waypoints: Vec<Vec3>,
    /// The length of each segment; `lengths[i]` goes from `waypoints[i]` to the next one.
    lengths: Vec<f32>,
    /// The speed of the viewpoint.
    speed: f32,
    /// Whether the path wraps around once the end is reached.
    looped: bool,
    /// The distance covered since the first waypoint, modulo the loop length when looped.
    traveled: f32,
}

impl FlightPath {
    /// Creates a new [`FlightPath`] from a validated configuration.
    pub fn new(config: &FlightConfig) -> Self {
        let mut waypoints: Vec<Vec3> = config.waypoints.iter().copied().map(Vec3::from).collect();
        if waypoints.is_empty() {
            waypoints.push(Vec3::ZERO);
        }
        if config.looped && waypoints.len() > 1 {
            waypoints.push(waypoints[0]);
        }

        let lengths = waypoints.windows(2).map(|w| w[0].distance(w[1])).collect();

        Self {
            waypoints,
            lengths,
            speed: config.speed,
            looped: config.looped,
            traveled: 0.0,
        }
    }

    /// The total length of the path.
    #[inline]
    pub fn length(&self) -> f32 {
        self.lengths.iter().sum()
    }

    /// Moves the viewpoint forward by `dt` seconds and returns its new position.
    pub fn advance(&mut self, dt: f32) -> Vec3 {
        self.traveled += self.speed * dt;

        let length = self.length();
        if length > 0.0 {
            if self.looped {
                self.traveled %= length;
            } else {
                self.traveled = self.traveled.min(length);
            }
        }

        self.position()
    }

    /// The current position of the viewpoint.
    pub fn position(&self) -> Vec3 {
        let mut remaining = self.traveled;
        for (i, &len) in self.lengths.iter().enumerate() {
            if remaining <= len {
                let t = if len > 0.0 { remaining / len } else { 0.0 };
                return self.waypoints[i].lerp(self.waypoints[i + 1], t);
            }
            remaining -= len;
        }
        self.waypoints[self.waypoints.len() - 1]
    }
}
