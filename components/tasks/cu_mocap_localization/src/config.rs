use cu29::prelude::*;
use cu_mocap_payloads::Covariance6;
use cu_mocap_transform::FrameIdString;

/// Validated configuration of the localization task.
///
/// Pose vectors and covariance diagonals arrive as comma-separated strings
/// (the node config only carries scalars and strings) and are checked for
/// exactly 6 elements at startup.
#[derive(Debug, Clone)]
pub struct LocalizationConfig {
    /// Name of the rigid body to track; samples for any other body are
    /// ignored.
    pub rigid_body_name: String,
    /// Fixed reference frame of the tracking system.
    pub root_frame: FrameIdString,
    /// Robot base frame the odometry describes.
    pub robot_frame: FrameIdString,
    /// Global output frame.
    pub map_frame: FrameIdString,
    /// Odometry frame, pinned to the map frame at startup.
    pub odom_frame: FrameIdString,
    /// Frame attached to the tracked marker on the robot.
    pub mocap_frame: FrameIdString,
    /// Exponential smoothing factor for the velocity estimate, in [0, 1].
    /// 1.0 keeps the raw finite difference.
    pub alpha: f64,
    /// Initial map pose of the tracking root, `[x, y, z, roll, pitch, yaw]`.
    pub initial_pose: [f64; 6],
    pub pose_covariance: Covariance6,
    pub twist_covariance: Covariance6,
}

impl LocalizationConfig {
    pub fn from_component_config(config: Option<&ComponentConfig>) -> CuResult<Self> {
        let config = config.ok_or(
            "MocapLocalization needs a config with at least 'rigid_body_name' set to the tracked body.",
        )?;

        let rigid_body_name: String = config
            .get::<String>("rigid_body_name")
            .ok_or("'rigid_body_name' not found in config.")?;

        let alpha = config.get::<f64>("alpha").unwrap_or(1.0);
        if !(0.0..=1.0).contains(&alpha) {
            return Err(CuError::from(format!(
                "'alpha' must be within [0, 1], got {alpha}"
            )));
        }

        let initial_pose = match config.get::<String>("initial_pose") {
            Some(raw) => parse_vec6(&raw).map_err(|e| e.add_cause("while parsing 'initial_pose'"))?,
            None => [0.0; 6],
        };
        let pose_covariance = covariance(config, "pose_covariance")?;
        let twist_covariance = covariance(config, "twist_covariance")?;

        Ok(Self {
            rigid_body_name,
            root_frame: frame(config, "root_frame", "mocap")?,
            robot_frame: frame(config, "robot_frame", "base_link")?,
            map_frame: frame(config, "map_frame", "map")?,
            odom_frame: frame(config, "odom_frame", "odom")?,
            mocap_frame: frame(config, "mocap_frame", "mocap_link")?,
            alpha,
            initial_pose,
            pose_covariance,
            twist_covariance,
        })
    }
}

fn frame(config: &ComponentConfig, key: &str, default: &str) -> CuResult<FrameIdString> {
    let name = config.get::<String>(key).unwrap_or_else(|| default.to_string());
    FrameIdString::from(&name)
        .map_err(|_| CuError::from(format!("'{key}' is too long for a frame name: '{name}'")))
}

fn covariance(config: &ComponentConfig, key: &str) -> CuResult<Covariance6> {
    match config.get::<String>(key) {
        Some(raw) => {
            let values = parse_vec6(&raw).map_err(|e| e.add_cause(key))?;
            Ok(Covariance6(values))
        }
        None => Ok(Covariance6::default()),
    }
}

/// Parse a comma-separated list of exactly 6 floats.
fn parse_vec6(raw: &str) -> CuResult<[f64; 6]> {
    let mut values = [0.0f64; 6];
    let mut count = 0usize;
    for field in raw.split(',') {
        let value: f64 = field
            .trim()
            .parse()
            .map_err(|_| CuError::from(format!("'{field}' is not a number in '{raw}'")))?;
        if count >= 6 {
            return Err(CuError::from(format!(
                "expected 6 elements, got more in '{raw}'"
            )));
        }
        values[count] = value;
        count += 1;
    }
    if count != 6 {
        return Err(CuError::from(format!(
            "expected 6 elements, got {count} in '{raw}'"
        )));
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_config() -> ComponentConfig {
        let mut config = ComponentConfig::default();
        config.set("rigid_body_name", "crazyflie".to_string());
        config
    }

    #[test]
    fn defaults_apply_without_optional_keys() {
        let config = LocalizationConfig::from_component_config(Some(&minimal_config())).unwrap();
        assert_eq!(config.rigid_body_name, "crazyflie");
        assert_eq!(config.root_frame.as_str(), "mocap");
        assert_eq!(config.robot_frame.as_str(), "base_link");
        assert_eq!(config.map_frame.as_str(), "map");
        assert_eq!(config.odom_frame.as_str(), "odom");
        assert_eq!(config.mocap_frame.as_str(), "mocap_link");
        assert_eq!(config.alpha, 1.0);
        assert_eq!(config.initial_pose, [0.0; 6]);
        assert_eq!(config.pose_covariance.0, [0.0; 6]);
    }

    #[test]
    fn missing_config_is_an_error() {
        assert!(LocalizationConfig::from_component_config(None).is_err());
    }

    #[test]
    fn missing_rigid_body_name_is_an_error() {
        let config = ComponentConfig::default();
        assert!(LocalizationConfig::from_component_config(Some(&config)).is_err());
    }

    #[test]
    fn alpha_must_be_within_unit_interval() {
        for bad in [-0.1, 1.5, f64::NAN] {
            let mut config = minimal_config();
            config.set("alpha", bad);
            assert!(
                LocalizationConfig::from_component_config(Some(&config)).is_err(),
                "alpha {bad} should be rejected"
            );
        }

        for good in [0.0, 0.5, 1.0] {
            let mut config = minimal_config();
            config.set("alpha", good);
            let parsed = LocalizationConfig::from_component_config(Some(&config)).unwrap();
            assert_eq!(parsed.alpha, good);
        }
    }

    #[test]
    fn pose_and_covariance_vectors_are_parsed() {
        let mut config = minimal_config();
        config.set("initial_pose", "1.0, 2.0, 0.0, 0.0, 0.0, 1.57".to_string());
        config.set("pose_covariance", "0.01,0.01,0.01,0.02,0.02,0.02".to_string());

        let parsed = LocalizationConfig::from_component_config(Some(&config)).unwrap();
        assert_eq!(parsed.initial_pose[1], 2.0);
        assert_eq!(parsed.initial_pose[5], 1.57);
        assert_eq!(parsed.pose_covariance.0[3], 0.02);
        assert_eq!(parsed.twist_covariance.0, [0.0; 6]);
    }

    #[test]
    fn wrong_length_vectors_are_rejected() {
        for bad in ["1,2,3", "1,2,3,4,5,6,7", "", "1,2,three,4,5,6"] {
            let mut config = minimal_config();
            config.set("twist_covariance", bad.to_string());
            assert!(
                LocalizationConfig::from_component_config(Some(&config)).is_err(),
                "'{bad}' should be rejected"
            );
        }
    }
}
