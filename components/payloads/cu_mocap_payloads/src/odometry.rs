use bincode::de::Decoder;
use bincode::enc::Encoder;
use bincode::error::{DecodeError, EncodeError};
use bincode::{Decode, Encode};
use cu_mocap_transform::{FrameIdString, RigidTransform, Twist};
use serde::{Deserialize, Serialize};

/// A 6-element covariance diagonal: x, y, z then roll, pitch, yaw (pose) or
/// linear then angular (twist). The length invariant is carried by the type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Encode, Decode, Serialize, Deserialize)]
pub struct Covariance6(pub [f64; 6]);

impl Covariance6 {
    /// Build from a runtime-sized slice, `None` unless it has exactly 6
    /// elements.
    pub fn from_slice(values: &[f64]) -> Option<Self> {
        let values: [f64; 6] = values.try_into().ok()?;
        Some(Self(values))
    }
}

/// The odometry record emitted once per accepted tracking sample: the robot
/// base pose in the output frame plus its smoothed velocity estimate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Odometry {
    /// Frame the pose is expressed in.
    pub frame_id: FrameIdString,
    /// Frame the pose and twist describe, the robot base.
    pub child_frame_id: FrameIdString,
    pub pose: RigidTransform,
    pub twist: Twist,
    pub pose_covariance: Covariance6,
    pub twist_covariance: Covariance6,
}

impl Encode for Odometry {
    fn encode<E: Encoder>(&self, encoder: &mut E) -> Result<(), EncodeError> {
        self.frame_id.as_str().encode(encoder)?;
        self.child_frame_id.as_str().encode(encoder)?;
        self.pose.encode(encoder)?;
        self.twist.encode(encoder)?;
        self.pose_covariance.encode(encoder)?;
        self.twist_covariance.encode(encoder)?;
        Ok(())
    }
}

impl<Context> Decode<Context> for Odometry {
    fn decode<D: Decoder<Context = Context>>(decoder: &mut D) -> Result<Self, DecodeError> {
        let frame_id_str = String::decode(decoder)?;
        let child_frame_id_str = String::decode(decoder)?;
        let frame_id = FrameIdString::from(&frame_id_str)
            .map_err(|_| DecodeError::OtherString("Odometry frame id too long".to_string()))?;
        let child_frame_id = FrameIdString::from(&child_frame_id_str)
            .map_err(|_| DecodeError::OtherString("Odometry child frame id too long".to_string()))?;
        Ok(Self {
            frame_id,
            child_frame_id,
            pose: RigidTransform::decode(decoder)?,
            twist: Twist::decode(decoder)?,
            pose_covariance: Covariance6::decode(decoder)?,
            twist_covariance: Covariance6::decode(decoder)?,
        })
    }
}

bincode::impl_borrow_decode!(Odometry);
