//! Movement collaborator for behavior states
//!
//! States only ask for destinations; the agent owns the actual motion.
//! Pathfinding is not attempted here: agents travel in a straight line
//! using an arrive steering behavior.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::ecs::{Transform, Velocity};

/// Movement requests a behavior state may issue.
pub trait Locomotion {
    /// Start moving towards `point`.
    fn request_destination(&mut self, point: Vec3);

    /// Whether the last requested destination has been reached.
    fn has_reached_destination(&self) -> bool;

    /// Drop the current destination and stop.
    fn reset_path(&mut self);

    /// The destination currently being travelled to.
    fn destination(&self) -> Option<Vec3>;

    /// Change the top speed used from now on.
    fn set_speed(&mut self, speed: f32);
}

// ============================================================================
// Steering
// ============================================================================

/// Output from a steering behavior
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SteeringOutput {
    /// Linear acceleration
    pub linear: Vec3,
}

impl SteeringOutput {
    /// Zero steering
    pub const ZERO: Self = Self { linear: Vec3::ZERO };
}

/// Trait for steering behaviors
pub trait SteeringBehavior {
    /// Calculate steering based on agent state
    fn calculate(&self, position: Vec3, velocity: Vec3) -> SteeringOutput;
}

/// Flee behavior - move away from a threat
#[derive(Debug, Clone)]
pub struct Flee {
    /// Position to flee from
    pub threat: Vec3,
    /// Maximum acceleration
    pub max_acceleration: f32,
}

impl Flee {
    /// Create a new flee behavior
    #[must_use]
    pub fn new(threat: Vec3, max_acceleration: f32) -> Self {
        Self {
            threat,
            max_acceleration,
        }
    }

    /// Ground point `distance` away from `position`, directly away from the threat.
    ///
    /// Falls back to `fallback` when standing on top of the threat.
    #[must_use]
    pub fn escape_point(&self, position: Vec3, distance: f32, fallback: Vec3) -> Vec3 {
        let mut away = self.calculate(position, Vec3::ZERO).linear;
        away.y = 0.0;
        let direction = away.try_normalize().unwrap_or(fallback);
        position + direction * distance
    }
}

impl SteeringBehavior for Flee {
    fn calculate(&self, position: Vec3, _velocity: Vec3) -> SteeringOutput {
        let direction = (position - self.threat).normalize_or_zero();
        SteeringOutput {
            linear: direction * self.max_acceleration,
        }
    }
}

/// Arrive behavior - move towards target and slow down
#[derive(Debug, Clone)]
pub struct Arrive {
    /// Target position
    pub target: Vec3,
    /// Maximum acceleration
    pub max_acceleration: f32,
    /// Maximum speed
    pub max_speed: f32,
    /// Slowing distance
    pub slow_radius: f32,
    /// Stopping distance
    pub target_radius: f32,
}

impl Arrive {
    /// Create a new arrive behavior
    #[must_use]
    pub fn new(target: Vec3, max_acceleration: f32, max_speed: f32) -> Self {
        Self {
            target,
            max_acceleration,
            max_speed,
            slow_radius: 2.0,
            target_radius: 0.1,
        }
    }
}

impl SteeringBehavior for Arrive {
    fn calculate(&self, position: Vec3, velocity: Vec3) -> SteeringOutput {
        let to_target = self.target - position;
        let distance = to_target.length();

        if distance < self.target_radius {
            return SteeringOutput {
                linear: -velocity.clamp_length_max(self.max_acceleration),
            };
        }

        let target_speed = if distance > self.slow_radius {
            self.max_speed
        } else {
            self.max_speed * distance / self.slow_radius
        };

        let target_velocity = to_target.normalize_or_zero() * target_speed;
        SteeringOutput {
            linear: (target_velocity - velocity).clamp_length_max(self.max_acceleration),
        }
    }
}

// ============================================================================
// Steering Agent
// ============================================================================

/// Straight-line locomotion component.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SteeringAgent {
    /// Top speed in units per second
    pub max_speed: f32,
    /// Acceleration limit in units per second squared
    pub max_acceleration: f32,
    /// Distance at which a destination counts as reached
    pub stopping_distance: f32,
    #[serde(skip)]
    destination: Option<Vec3>,
    #[serde(skip)]
    remaining: f32,
}

impl SteeringAgent {
    /// Create an agent with the given top speed
    #[must_use]
    pub fn new(max_speed: f32) -> Self {
        Self {
            max_speed,
            max_acceleration: max_speed * 8.0,
            stopping_distance: 0.25,
            destination: None,
            remaining: 0.0,
        }
    }

    /// Advance the agent's transform towards its destination.
    pub fn step(&mut self, transform: &mut Transform, velocity: &mut Velocity, dt: f32) {
        let Some(target) = self.destination else {
            velocity.linear = Vec3::ZERO;
            return;
        };

        self.remaining = transform.position.distance(target);
        if self.remaining <= self.stopping_distance {
            velocity.linear = Vec3::ZERO;
            return;
        }

        let arrive = Arrive::new(target, self.max_acceleration, self.max_speed);
        let steering = arrive.calculate(transform.position, velocity.linear);
        velocity.linear = (velocity.linear + steering.linear * dt).clamp_length_max(self.max_speed);

        // Never step past the destination
        let step = velocity.linear * dt;
        if step.length() >= self.remaining {
            transform.position = target;
            velocity.linear = Vec3::ZERO;
        } else {
            transform.position += step;
        }
        self.remaining = transform.position.distance(target);

        let mut heading = target - transform.position;
        heading.y = 0.0;
        if let Some(heading) = heading.try_normalize() {
            transform.rotation = Quat::from_rotation_arc(Vec3::NEG_Z, heading);
        }
    }
}

impl Default for SteeringAgent {
    fn default() -> Self {
        Self::new(3.5)
    }
}

impl Locomotion for SteeringAgent {
    fn request_destination(&mut self, point: Vec3) {
        if self.destination != Some(point) {
            self.remaining = f32::INFINITY;
        }
        self.destination = Some(point);
    }

    fn has_reached_destination(&self) -> bool {
        self.destination.is_some() && self.remaining <= self.stopping_distance
    }

    fn reset_path(&mut self) {
        self.destination = None;
        self.remaining = 0.0;
    }

    fn destination(&self) -> Option<Vec3> {
        self.destination
    }

    fn set_speed(&mut self, speed: f32) {
        self.max_speed = speed.max(0.0);
        self.max_acceleration = self.max_speed * 8.0;
    }
}
