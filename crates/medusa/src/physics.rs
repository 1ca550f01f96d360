//! Physical state attached to graph entities: point masses and springs.

use crate::geom::Vector;

/// A point mass bound to one node. Acceleration accumulates as force laws run and is
/// cleared by the integrator at the end of each tick.
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub position: Vector,
    pub velocity: Vector,
    pub acceleration: Vector,
    pub mass: f64,
}

impl Point {
    pub fn new(position: Vector, mass: f64) -> Self {
        Self {
            position,
            velocity: Vector::zero(),
            acceleration: Vector::zero(),
            mass,
        }
    }

    pub fn apply_force(&mut self, force: Vector) {
        self.acceleration += force / self.mass;
    }

    pub fn kinetic_energy(&self) -> f64 {
        let speed = self.velocity.length();
        0.5 * self.mass * speed * speed
    }
}

/// A Hooke's-law constraint between two point masses, referenced by node id.
///
/// A pair of reciprocal edges between the same two nodes coalesces to one physical
/// spring; the second edge observes a mirror spring with zero length and zero
/// stiffness that contributes no force.
#[derive(Debug, Clone, PartialEq)]
pub struct Spring {
    pub point1: String,
    pub point2: String,
    /// Rest length.
    pub length: f64,
    /// Spring constant (Hooke's law).
    pub stiffness: f64,
}

impl Spring {
    pub fn new(
        point1: impl Into<String>,
        point2: impl Into<String>,
        length: f64,
        stiffness: f64,
    ) -> Self {
        Self {
            point1: point1.into(),
            point2: point2.into(),
            length,
            stiffness,
        }
    }
}
