use crate::transform::StampedPose;
use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, TAU};
use uom::si::angular_velocity::radian_per_second;
use uom::si::f64::AngularVelocity;
use uom::si::f64::Velocity;
use uom::si::velocity::meter_per_second;

/// Linear and angular velocity of a rigid body.
///
/// Linear velocity is `[vx, vy, vz]` in meters per second, expressed in the
/// frame the differenced poses were expressed in. Angular velocity is
/// `[wx, wy, wz]` in radians per second as a scaled rotation axis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Encode, Decode, Serialize, Deserialize)]
pub struct Twist {
    pub linear: [f64; 3],
    pub angular: [f64; 3],
}

impl Twist {
    pub fn zero() -> Self {
        Self::default()
    }

    /// Finite-difference velocity between two stamped poses.
    ///
    /// Returns `None` when the elapsed time is zero or negative, so a stalled
    /// or reordered sample can never produce NaN or infinite velocities.
    pub fn between(prev: &StampedPose, curr: &StampedPose) -> Option<Self> {
        if curr.stamp <= prev.stamp {
            return None;
        }
        let dt = (curr.stamp - prev.stamp).as_nanos() as f64 * 1e-9;

        let linear = (curr.pose.translation - prev.pose.translation) / dt;

        let relative = (prev.pose.rotation.inverse() * curr.pose.rotation).normalize();
        let (axis, angle) = relative.to_axis_angle();
        // to_axis_angle can report the long way around, fold back to [-pi, pi]
        let angle = if angle > PI { angle - TAU } else { angle };
        let angular = axis * (angle / dt);

        Some(Self {
            linear: linear.to_array(),
            angular: angular.to_array(),
        })
    }

    /// Exponential smoothing: `alpha * raw + (1 - alpha) * self`,
    /// component-wise, with `self` as the previous estimate.
    pub fn smoothed(&self, raw: &Self, alpha: f64) -> Self {
        let blend = |prev: f64, new: f64| alpha * new + (1.0 - alpha) * prev;
        Self {
            linear: [
                blend(self.linear[0], raw.linear[0]),
                blend(self.linear[1], raw.linear[1]),
                blend(self.linear[2], raw.linear[2]),
            ],
            angular: [
                blend(self.angular[0], raw.angular[0]),
                blend(self.angular[1], raw.angular[1]),
                blend(self.angular[2], raw.angular[2]),
            ],
        }
    }

    /// Linear velocity components with units.
    pub fn linear_velocity(&self) -> [Velocity; 3] {
        [
            Velocity::new::<meter_per_second>(self.linear[0]),
            Velocity::new::<meter_per_second>(self.linear[1]),
            Velocity::new::<meter_per_second>(self.linear[2]),
        ]
    }

    /// Angular velocity components with units.
    pub fn angular_velocity(&self) -> [AngularVelocity; 3] {
        [
            AngularVelocity::new::<radian_per_second>(self.angular[0]),
            AngularVelocity::new::<radian_per_second>(self.angular[1]),
            AngularVelocity::new::<radian_per_second>(self.angular[2]),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::RigidTransform;
    use approx::assert_relative_eq;
    use cu29::clock::CuDuration;
    use glam::DVec3;
    use std::f64::consts::FRAC_PI_2;

    fn pose_at(nanos: u64, x: f64, y: f64, z: f64) -> StampedPose {
        StampedPose::new(
            CuDuration(nanos),
            RigidTransform::from_parts(glam::DQuat::IDENTITY, DVec3::new(x, y, z)),
        )
    }

    #[test]
    fn linear_velocity_from_translation_delta() {
        let prev = pose_at(0, 0.0, 0.0, 0.0);
        let curr = pose_at(1_000_000_000, 1.0, 2.0, 0.0);

        let twist = Twist::between(&prev, &curr).unwrap();
        assert_relative_eq!(twist.linear[0], 1.0);
        assert_relative_eq!(twist.linear[1], 2.0);
        assert_relative_eq!(twist.linear[2], 0.0);
        assert_relative_eq!(twist.angular[2], 0.0);
    }

    #[test]
    fn angular_velocity_from_yaw_delta() {
        let prev = StampedPose::new(CuDuration(0), RigidTransform::IDENTITY);
        let curr = StampedPose::new(
            CuDuration(1_000_000_000),
            RigidTransform::from_xyz_rpy(&[0.0, 0.0, 0.0, 0.0, 0.0, FRAC_PI_2]),
        );

        let twist = Twist::between(&prev, &curr).unwrap();
        assert_relative_eq!(twist.angular[2], FRAC_PI_2, epsilon = 1e-9);
        assert_relative_eq!(twist.angular[0], 0.0, epsilon = 1e-9);
        assert_relative_eq!(twist.angular[1], 0.0, epsilon = 1e-9);
    }

    #[test]
    fn zero_elapsed_time_yields_none() {
        let prev = pose_at(1_000, 0.0, 0.0, 0.0);
        let curr = pose_at(1_000, 5.0, 0.0, 0.0);
        assert!(Twist::between(&prev, &curr).is_none());

        let earlier = pose_at(500, 5.0, 0.0, 0.0);
        assert!(Twist::between(&prev, &earlier).is_none());
    }

    #[test]
    fn smoothing_blends_with_previous_estimate() {
        let previous = Twist {
            linear: [1.0, 0.0, 0.0],
            angular: [0.0, 0.0, 2.0],
        };
        let raw = Twist {
            linear: [3.0, 0.0, 0.0],
            angular: [0.0, 0.0, 0.0],
        };

        let blended = previous.smoothed(&raw, 0.25);
        assert_relative_eq!(blended.linear[0], 0.25 * 3.0 + 0.75 * 1.0);
        assert_relative_eq!(blended.angular[2], 0.75 * 2.0);

        // alpha = 1 keeps the raw estimate, alpha = 0 keeps the previous one.
        assert_eq!(previous.smoothed(&raw, 1.0), raw);
        assert_eq!(previous.smoothed(&raw, 0.0), previous);
    }

    #[test]
    fn velocity_with_units() {
        let twist = Twist {
            linear: [1.0, 2.0, 3.0],
            angular: [0.1, 0.2, 0.3],
        };

        let linear = twist.linear_velocity();
        let angular = twist.angular_velocity();

        assert_eq!(linear[0].get::<meter_per_second>(), 1.0);
        assert_eq!(linear[2].get::<meter_per_second>(), 3.0);
        assert_eq!(angular[1].get::<radian_per_second>(), 0.2);
    }
}
