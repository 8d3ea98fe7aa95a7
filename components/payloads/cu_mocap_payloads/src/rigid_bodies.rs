use crate::CuArrayVec;
use bincode::de::Decoder;
use bincode::enc::Encoder;
use bincode::error::{DecodeError, EncodeError};
use bincode::{Decode, Encode};
use cu_mocap_transform::{FrameIdString, RigidTransform};
use glam::{DQuat, DVec3};
use serde::{Deserialize, Serialize};

/// Maximum number of rigid bodies in a single tracking sample.
pub const MAX_RIGID_BODIES: usize = 8;

/// Maximum number of raw marker points reported per rigid body.
pub const MAX_MARKERS: usize = 16;

/// One raw tracked marker, in the mocap root frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Encode, Decode, Serialize, Deserialize)]
pub struct MarkerPoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// The pose of one tracked rigid body, expressed in the mocap root frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RigidBodyPose {
    /// Rigid body name as configured in the tracking system.
    pub name: FrameIdString,
    pub position: DVec3,
    pub orientation: DQuat,
    /// Raw marker positions backing this body, when the tracker reports them.
    pub markers: CuArrayVec<MarkerPoint, MAX_MARKERS>,
}

impl Default for RigidBodyPose {
    fn default() -> Self {
        Self {
            name: FrameIdString::default(),
            position: DVec3::ZERO,
            orientation: DQuat::IDENTITY,
            markers: CuArrayVec::default(),
        }
    }
}

impl RigidBodyPose {
    pub fn new(name: &str, position: DVec3, orientation: DQuat) -> Option<Self> {
        Some(Self {
            name: FrameIdString::from(name).ok()?,
            position,
            orientation,
            markers: CuArrayVec::default(),
        })
    }

    /// The body pose as a root-to-body rigid transform.
    pub fn pose(&self) -> RigidTransform {
        RigidTransform::from_parts(self.orientation, self.position)
    }
}

impl Encode for RigidBodyPose {
    fn encode<E: Encoder>(&self, encoder: &mut E) -> Result<(), EncodeError> {
        self.name.as_str().encode(encoder)?;
        self.position.to_array().encode(encoder)?;
        self.orientation.to_array().encode(encoder)?;
        self.markers.encode(encoder)?;
        Ok(())
    }
}

impl<Context> Decode<Context> for RigidBodyPose {
    fn decode<D: Decoder<Context = Context>>(decoder: &mut D) -> Result<Self, DecodeError> {
        let name_str = String::decode(decoder)?;
        let name = FrameIdString::from(&name_str)
            .map_err(|_| DecodeError::OtherString("Rigid body name too long".to_string()))?;
        let position: [f64; 3] = Decode::decode(decoder)?;
        let orientation: [f64; 4] = Decode::decode(decoder)?;
        let markers = CuArrayVec::decode(decoder)?;
        Ok(Self {
            name,
            position: DVec3::from_array(position),
            orientation: DQuat::from_array(orientation),
            markers,
        })
    }
}

/// One input event from the tracking system: every rigid body it saw in one
/// capture frame. The sample timestamp travels in the `CuMsg` time of
/// validity.
#[derive(Debug, Clone, Default, Encode, Decode, Serialize, Deserialize)]
pub struct RigidBodies {
    /// Monotonic capture frame counter from the tracking system.
    pub frame_number: u64,
    pub bodies: CuArrayVec<RigidBodyPose, MAX_RIGID_BODIES>,
}

impl RigidBodies {
    /// The body matching `name`, if the tracker saw it this frame.
    pub fn body(&self, name: &str) -> Option<&RigidBodyPose> {
        self.bodies.iter().find(|b| b.name.as_str() == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_name() {
        let mut sample = RigidBodies {
            frame_number: 42,
            ..Default::default()
        };
        sample
            .bodies
            .try_push(RigidBodyPose::new("crazyflie", DVec3::new(1.0, 2.0, 3.0), DQuat::IDENTITY).unwrap())
            .unwrap();
        sample
            .bodies
            .try_push(RigidBodyPose::new("wand", DVec3::ZERO, DQuat::IDENTITY).unwrap())
            .unwrap();

        assert!(sample.body("crazyflie").is_some());
        assert!(sample.body("wand").is_some());
        assert!(sample.body("ghost").is_none());
        assert_eq!(sample.body("crazyflie").unwrap().position.x, 1.0);
    }

    #[test]
    fn encode_decode_round_trip() {
        let mut body =
            RigidBodyPose::new("rb1", DVec3::new(0.5, -0.5, 1.0), DQuat::from_xyzw(0.0, 0.0, 1.0, 0.0))
                .unwrap();
        body.markers
            .try_push(MarkerPoint {
                x: 0.1,
                y: 0.2,
                z: 0.3,
            })
            .unwrap();

        let mut sample = RigidBodies::default();
        sample.frame_number = 7;
        sample.bodies.try_push(body).unwrap();

        let encoded = bincode::encode_to_vec(&sample, bincode::config::standard()).unwrap();
        let (decoded, _): (RigidBodies, _) =
            bincode::decode_from_slice(&encoded, bincode::config::standard()).unwrap();

        assert_eq!(decoded.frame_number, 7);
        let body = decoded.body("rb1").unwrap();
        assert_eq!(body.position, DVec3::new(0.5, -0.5, 1.0));
        assert_eq!(body.orientation, DQuat::from_xyzw(0.0, 0.0, 1.0, 0.0));
        assert_eq!(body.markers.len(), 1);
        assert_eq!(body.markers.as_slice()[0].y, 0.2);
    }
}
