use nalgebra::Vector3;

/// Raw input-device state for one cycle.
///
/// Axis values are unit-normalized to [-1, 1] by the device layer:
/// `[tx, ty, tz, rx, ry, rz]`.
#[derive(Debug, Clone, Copy)]
pub struct MotionSample {
    pub axes: [f64; 6],
    /// Rotation-enable button. While held, the device drives rotation only.
    pub rotate: bool,
    /// Z-unlock button. While released, translation is locked to the xy plane.
    pub unlock_z: bool,
}

/// Per-cycle pose increment produced by the mapper.
#[derive(Debug, Clone, Copy)]
pub struct MotionDelta {
    pub dpos: Vector3<f64>,
    pub drot: Vector3<f64>,
}

/// Scales raw device samples into physically bounded per-cycle deltas and
/// applies mode gating.
///
/// Gating is a strict priority chain: rotation-enable zeroes translation
/// outright, and the z lock only matters within translation mode.
#[derive(Debug, Clone, Copy)]
pub struct MotionMapper {
    pos_step: f64,
    rot_step: f64,
}

impl MotionMapper {
    /// `max_pos_speed` in m/s, `max_rot_speed` in rad/s, `frequency` in Hz.
    pub fn new(max_pos_speed: f64, max_rot_speed: f64, frequency: f64) -> Self {
        Self {
            pos_step: max_pos_speed / frequency,
            rot_step: max_rot_speed / frequency,
        }
    }

    pub fn map(&self, sample: &MotionSample) -> MotionDelta {
        let a = &sample.axes;
        let mut dpos = Vector3::new(a[0], a[1], a[2]) * self.pos_step;
        let mut drot = Vector3::new(a[3], a[4], a[5]) * self.rot_step;

        if !sample.rotate {
            // translation mode
            drot.fill(0.0);
        } else {
            dpos.fill(0.0);
        }
        if !sample.unlock_z {
            // planar translation
            dpos.z = 0.0;
        }

        MotionDelta { dpos, drot }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_deflection(rotate: bool, unlock_z: bool) -> MotionSample {
        MotionSample {
            axes: [1.0, -0.5, 0.25, 0.5, -1.0, 0.75],
            rotate,
            unlock_z,
        }
    }

    #[test]
    fn translation_mode_zeroes_rotation_and_scales_position() {
        let mapper = MotionMapper::new(0.25, 0.6, 10.0);
        let delta = mapper.map(&full_deflection(false, true));
        assert_eq!(delta.drot, Vector3::zeros());
        assert_eq!(delta.dpos, Vector3::new(0.025, -0.0125, 0.00625));
    }

    #[test]
    fn rotation_enable_silences_translation_entirely() {
        let mapper = MotionMapper::new(0.25, 0.6, 10.0);
        let delta = mapper.map(&full_deflection(true, true));
        assert_eq!(delta.dpos, Vector3::zeros());
        assert_eq!(delta.drot, Vector3::new(0.03, -0.06, 0.045));
    }

    #[test]
    fn z_lock_zeroes_only_the_z_component() {
        let mapper = MotionMapper::new(0.25, 0.6, 10.0);
        let delta = mapper.map(&full_deflection(false, false));
        assert_eq!(delta.dpos.x, 0.025);
        assert_eq!(delta.dpos.y, -0.0125);
        assert_eq!(delta.dpos.z, 0.0);
    }

    #[test]
    fn z_lock_with_rotation_enabled_is_a_no_op() {
        let mapper = MotionMapper::new(0.25, 0.6, 10.0);
        let delta = mapper.map(&full_deflection(true, false));
        assert_eq!(delta.dpos, Vector3::zeros());
    }
}
