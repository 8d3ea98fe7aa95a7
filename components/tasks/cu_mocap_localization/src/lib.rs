#![doc = include_str!("../README.md")]

pub mod config;

use bincode::de::Decoder;
use bincode::enc::Encoder;
use bincode::error::{DecodeError, EncodeError};
use bincode::{Decode, Encode};
use config::LocalizationConfig;
use cu29::prelude::*;
use cu_mocap_payloads::{Odometry, RigidBodies};
use cu_mocap_transform::{
    RigidTransform, StampedPose, TransformBroadcast, TransformKind, TransformMsg, Twist,
};
use serde::Serialize;

/// Everything one accepted tracking sample produces: the odometry record plus
/// the frame transforms to broadcast.
#[derive(Debug, Clone, Default, Encode, Decode, Serialize)]
pub struct LocalizationUpdate {
    pub odometry: Odometry,
    pub transforms: TransformBroadcast,
}

/// Whether the fixed marker-to-base offset has been established. The
/// transition is one way: once calibrated, the offset is never recomputed.
#[derive(Debug, Clone, Copy, Default, Encode, Decode)]
enum Calibration {
    #[default]
    Uncalibrated,
    Calibrated {
        mocap2robot: RigidTransform,
    },
}

/// Copper task turning motion-capture rigid body poses into odometry and
/// frame transforms.
///
/// On the first sample for the configured body it fixes `mocap2robot`, the
/// offset between the tracked marker frame and the robot base, assuming the
/// base sits at the map origin at that instant. Every sample after that is
/// relayed as a map-frame pose with a smoothed finite-difference velocity.
pub struct MocapLocalization {
    config: LocalizationConfig,
    /// Map pose of the tracking root, from the configured initial pose.
    root2map: RigidTransform,
    /// Cached inverse of `root2map`.
    map2root: RigidTransform,
    calibration: Calibration,
    /// Previous accepted robot pose, the single-slot history for velocity
    /// estimation.
    prev_pose: Option<StampedPose>,
    /// Latest smoothed velocity estimate. `None` until two samples with a
    /// positive time delta have been seen.
    twist: Option<Twist>,
    static_sent: bool,
}

impl MocapLocalization {
    fn sample_time(&self, tov: &Tov, clock: &RobotClock) -> CuTime {
        match tov {
            Tov::Time(t) => *t,
            Tov::Range(r) => r.end,
            Tov::None => clock.now(),
        }
    }

    /// Update the velocity estimate from the previous and current robot
    /// poses. A zero or negative time delta leaves the estimate untouched.
    fn update_twist(&mut self, current: &StampedPose) {
        let Some(prev) = &self.prev_pose else {
            return;
        };
        let Some(raw) = Twist::between(prev, current) else {
            return;
        };
        self.twist = Some(match &self.twist {
            Some(previous) => previous.smoothed(&raw, self.config.alpha),
            // The first finite difference seeds the filter.
            None => raw,
        });
    }

    fn broadcast(
        &mut self,
        map2robot: &RigidTransform,
        root2mocap: &RigidTransform,
    ) -> CuResult<TransformBroadcast> {
        let cfg = &self.config;
        let mut transforms = TransformBroadcast::new();

        if !self.static_sent {
            let map2odom = TransformMsg::new(
                RigidTransform::IDENTITY,
                cfg.map_frame.as_str(),
                cfg.odom_frame.as_str(),
                TransformKind::Static,
            )
            .map_err(to_cu_error)?;
            transforms.add_transform(map2odom);
            self.static_sent = true;
        }

        // map -> odom is identity, so the odom-frame pose is the map one.
        let odom2robot = TransformMsg::new(
            *map2robot,
            cfg.odom_frame.as_str(),
            cfg.robot_frame.as_str(),
            TransformKind::Dynamic,
        )
        .map_err(to_cu_error)?;
        transforms.add_transform(odom2robot);

        let root2mocap = TransformMsg::new(
            *root2mocap,
            cfg.root_frame.as_str(),
            cfg.mocap_frame.as_str(),
            TransformKind::Dynamic,
        )
        .map_err(to_cu_error)?;
        transforms.add_transform(root2mocap);

        Ok(transforms)
    }
}

fn to_cu_error(e: cu_mocap_transform::TransformError) -> CuError {
    CuError::from("Could not build a transform broadcast.").add_cause(&e.to_string())
}

impl Freezable for MocapLocalization {
    fn freeze<E: Encoder>(&self, encoder: &mut E) -> Result<(), EncodeError> {
        Encode::encode(&self.calibration, encoder)?;
        Encode::encode(&self.prev_pose, encoder)?;
        Encode::encode(&self.twist, encoder)?;
        Encode::encode(&self.static_sent, encoder)?;
        Ok(())
    }

    fn thaw<D: Decoder>(&mut self, decoder: &mut D) -> Result<(), DecodeError> {
        self.calibration = Decode::decode(decoder)?;
        self.prev_pose = Decode::decode(decoder)?;
        self.twist = Decode::decode(decoder)?;
        self.static_sent = Decode::decode(decoder)?;
        Ok(())
    }
}

impl CuTask for MocapLocalization {
    type Input<'m> = input_msg!(RigidBodies);
    type Output<'m> = output_msg!(LocalizationUpdate);

    fn new(config: Option<&ComponentConfig>) -> CuResult<Self>
    where
        Self: Sized,
    {
        let config = LocalizationConfig::from_component_config(config)?;
        debug!(
            "MocapLocalization tracking rigid body '{}'",
            config.rigid_body_name.as_str()
        );
        let root2map = RigidTransform::from_xyz_rpy(&config.initial_pose);
        let map2root = root2map.inverse();
        Ok(Self {
            config,
            root2map,
            map2root,
            calibration: Calibration::Uncalibrated,
            prev_pose: None,
            twist: None,
            static_sent: false,
        })
    }

    fn process(
        &mut self,
        clock: &RobotClock,
        input: &Self::Input<'_>,
        output: &mut Self::Output<'_>,
    ) -> CuResult<()> {
        let Some(sample) = input.payload() else {
            output.clear_payload();
            return Ok(());
        };

        // Samples for other rigid bodies are ignored, state untouched.
        let Some(body) = sample.body(&self.config.rigid_body_name) else {
            output.clear_payload();
            return Ok(());
        };

        let root2mocap = body.pose();
        if !root2mocap.is_finite() {
            debug!(
                "Dropping non-finite pose for rigid body '{}'",
                self.config.rigid_body_name.as_str()
            );
            output.clear_payload();
            return Ok(());
        }

        let stamp = self.sample_time(&input.tov, clock);

        let mocap2robot = match self.calibration {
            Calibration::Calibrated { mocap2robot } => mocap2robot,
            Calibration::Uncalibrated => {
                // The robot base is taken to be at the map origin when the
                // first sample arrives; the offset absorbing that assumption
                // is fixed for the task's lifetime.
                let mocap2robot = root2mocap.inverse() * self.root2map;
                self.calibration = Calibration::Calibrated { mocap2robot };
                info!(
                    "Calibrated mocap offset from first sample of '{}'",
                    self.config.rigid_body_name.as_str()
                );
                mocap2robot
            }
        };

        let root2robot = root2mocap * mocap2robot;
        let map2robot = self.map2root * root2robot;

        let current = StampedPose::new(stamp, map2robot);
        self.update_twist(&current);
        self.prev_pose = Some(current);

        let transforms = self.broadcast(&map2robot, &root2mocap)?;
        let odometry = Odometry {
            frame_id: self.config.odom_frame,
            child_frame_id: self.config.robot_frame,
            pose: map2robot,
            twist: self.twist.unwrap_or_default(),
            pose_covariance: self.config.pose_covariance,
            twist_covariance: self.config.twist_covariance,
        };

        output.set_payload(LocalizationUpdate {
            odometry,
            transforms,
        });
        output.tov = Tov::Time(stamp);
        Ok(())
    }
}
