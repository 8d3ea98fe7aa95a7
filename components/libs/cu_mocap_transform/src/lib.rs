//! Rigid transform algebra and frame-transform broadcast payloads for
//! motion-capture based localization.
//!
//! The [`RigidTransform`] type is the unit of currency here: a rotation plus a
//! translation between two named frames, composed with `*` and inverted with
//! [`RigidTransform::inverse`]. [`TransformBroadcast`] is the message payload
//! carrying the per-cycle (dynamic) and startup (static) frame transforms.

pub mod broadcast;
pub mod error;
pub mod transform;
pub mod twist;

use arrayvec::ArrayString;

/// Frame identifiers are bounded strings to keep payloads fixed-size.
pub type FrameIdString = ArrayString<64>;

pub use broadcast::{TransformBroadcast, TransformKind, TransformMsg, MAX_TRANSFORMS_PER_BROADCAST};
pub use error::{TransformError, TransformResult};
pub use transform::{RigidTransform, StampedPose};
pub use twist::Twist;
