use bincode::de::Decoder;
use bincode::enc::Encoder;
use bincode::error::{DecodeError, EncodeError};
use bincode::{Decode, Encode};
use cu29::clock::CuTime;
use glam::{DQuat, DVec3, EulerRot};
use serde::{Deserialize, Serialize};
use std::ops::Mul;

/// A 3D rigid transform (rotation + translation) between two frames.
///
/// By convention a transform `a2b` maps coordinates expressed in frame `b`
/// into frame `a`: `p_a = a2b.transform_point(p_b)`. Composition follows the
/// matrix convention, `a2c = a2b * b2c`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RigidTransform {
    pub rotation: DQuat,
    pub translation: DVec3,
}

impl RigidTransform {
    pub const IDENTITY: Self = Self {
        rotation: DQuat::IDENTITY,
        translation: DVec3::ZERO,
    };

    pub fn from_parts(rotation: DQuat, translation: DVec3) -> Self {
        Self {
            rotation,
            translation,
        }
    }

    /// Build a transform from a `[x, y, z, roll, pitch, yaw]` pose vector
    /// (meters and radians), the format used for initial-pose configuration.
    pub fn from_xyz_rpy(pose: &[f64; 6]) -> Self {
        let [x, y, z, roll, pitch, yaw] = *pose;
        Self {
            rotation: DQuat::from_euler(EulerRot::ZYX, yaw, pitch, roll),
            translation: DVec3::new(x, y, z),
        }
    }

    /// Inverse transform: if `self` maps frame `b` into frame `a`, the result
    /// maps frame `a` into frame `b`.
    pub fn inverse(&self) -> Self {
        let inv_rotation = self.rotation.inverse();
        Self {
            rotation: inv_rotation,
            translation: -(inv_rotation * self.translation),
        }
    }

    pub fn transform_point(&self, point: DVec3) -> DVec3 {
        self.rotation * point + self.translation
    }

    pub fn is_finite(&self) -> bool {
        self.rotation.is_finite() && self.translation.is_finite()
    }
}

impl Default for RigidTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul for RigidTransform {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        Self {
            rotation: self.rotation * rhs.rotation,
            translation: self.rotation * rhs.translation + self.translation,
        }
    }
}

impl Mul for &RigidTransform {
    type Output = RigidTransform;

    fn mul(self, rhs: Self) -> Self::Output {
        *self * *rhs
    }
}

impl Mul<RigidTransform> for &RigidTransform {
    type Output = RigidTransform;

    fn mul(self, rhs: RigidTransform) -> Self::Output {
        *self * rhs
    }
}

impl Mul<&RigidTransform> for RigidTransform {
    type Output = RigidTransform;

    fn mul(self, rhs: &RigidTransform) -> Self::Output {
        self * *rhs
    }
}

// Manual bincode implementations: glam types do not carry bincode derives, so
// the transform travels as a quaternion xyzw array plus a translation array.
impl Encode for RigidTransform {
    fn encode<E: Encoder>(&self, encoder: &mut E) -> Result<(), EncodeError> {
        self.rotation.to_array().encode(encoder)?;
        self.translation.to_array().encode(encoder)?;
        Ok(())
    }
}

impl<Context> Decode<Context> for RigidTransform {
    fn decode<D: Decoder<Context = Context>>(decoder: &mut D) -> Result<Self, DecodeError> {
        let rotation: [f64; 4] = Decode::decode(decoder)?;
        let translation: [f64; 3] = Decode::decode(decoder)?;
        Ok(Self {
            rotation: DQuat::from_array(rotation),
            translation: DVec3::from_array(translation),
        })
    }
}

bincode::impl_borrow_decode!(RigidTransform);

/// A pose sample with its time of validity, the single-slot history kept
/// between cycles for velocity estimation.
#[derive(Debug, Clone, Copy, Default, Encode, Decode, Serialize, Deserialize)]
pub struct StampedPose {
    pub stamp: CuTime,
    pub pose: RigidTransform,
}

impl StampedPose {
    pub fn new(stamp: CuTime, pose: RigidTransform) -> Self {
        Self { stamp, pose }
    }
}
