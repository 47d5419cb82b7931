use crate::motion::MotionDelta;
use nalgebra::{Rotation3, Vector3};

/// 6-DoF target pose: position in metres plus orientation as a rotation
/// vector (axis-angle, direction = axis, magnitude = angle in radians).
#[derive(Debug, Clone, Copy)]
pub struct Pose {
    pub position: Vector3<f64>,
    pub rotation: Vector3<f64>,
}

impl Pose {
    pub fn new(position: Vector3<f64>, rotation: Vector3<f64>) -> Self {
        Self { position, rotation }
    }

    pub fn identity() -> Self {
        Self {
            position: Vector3::zeros(),
            rotation: Vector3::zeros(),
        }
    }

    /// The orientation must always be reconstructible as a valid rotation.
    pub fn is_finite(&self) -> bool {
        self.position.iter().all(|v| v.is_finite()) && self.rotation.iter().all(|v| v.is_finite())
    }
}

/// Maintains the commanded target pose across cycles.
///
/// Position integrates by vector addition. Orientation must not: adding
/// rotation-vector components is invalid for finite rotations and drifts off
/// the rotation manifold. Each increment is built as a proper rotation from
/// the Euler-angle deltas and left-composed onto the current rotation
/// (delta applied in the base frame), so the stored orientation is always a
/// valid rotation regardless of how many cycles have accumulated.
pub struct PoseIntegrator {
    pose: Pose,
}

impl PoseIntegrator {
    /// Seed from the actuator driver's current target pose.
    pub fn new(initial: Pose) -> Self {
        Self { pose: initial }
    }

    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    pub fn apply(&mut self, delta: &MotionDelta) {
        self.pose.position += delta.dpos;

        // Skip the rotation round-trip on pure translation cycles so an idle
        // orientation stays bit-for-bit unchanged.
        if delta.drot != Vector3::zeros() {
            let r_delta = Rotation3::from_euler_angles(delta.drot.x, delta.drot.y, delta.drot.z);
            let r_current = Rotation3::new(self.pose.rotation);
            self.pose.rotation = (r_delta * r_current).scaled_axis();
        }
    }
}
