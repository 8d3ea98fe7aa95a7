use crate::error::{TransformError, TransformResult};
use crate::transform::RigidTransform;
use crate::FrameIdString;
use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// Maximum number of transforms in a single broadcast message.
/// A localization cycle emits the two dynamic transforms plus, on the first
/// cycle only, the startup static one.
pub const MAX_TRANSFORMS_PER_BROADCAST: usize = 4;

/// Whether a transform is fixed for the node lifetime (broadcast once, at
/// startup) or refreshed on every cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub enum TransformKind {
    Static,
    #[default]
    Dynamic,
}

/// A single frame transform inside a broadcast. The timestamp travels in the
/// enclosing `CuMsg` metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransformMsg {
    pub transform: RigidTransform,
    pub parent_frame: FrameIdString,
    pub child_frame: FrameIdString,
    pub kind: TransformKind,
}

impl TransformMsg {
    pub fn new(
        transform: RigidTransform,
        parent_frame: &str,
        child_frame: &str,
        kind: TransformKind,
    ) -> TransformResult<Self> {
        if !transform.is_finite() {
            return Err(TransformError::NonFiniteTransform {
                from: parent_frame.to_string(),
                to: child_frame.to_string(),
            });
        }
        let parent_frame = FrameIdString::from(parent_frame)
            .map_err(|_| TransformError::FrameNameTooLong(parent_frame.to_string()))?;
        let child_frame = FrameIdString::from(child_frame)
            .map_err(|_| TransformError::FrameNameTooLong(child_frame.to_string()))?;
        Ok(Self {
            transform,
            parent_frame,
            child_frame,
            kind,
        })
    }
}

// FrameIdString has no bincode support, so the frames travel as strings.
impl Encode for TransformMsg {
    fn encode<E: bincode::enc::Encoder>(
        &self,
        encoder: &mut E,
    ) -> Result<(), bincode::error::EncodeError> {
        self.transform.encode(encoder)?;
        self.parent_frame.as_str().encode(encoder)?;
        self.child_frame.as_str().encode(encoder)?;
        self.kind.encode(encoder)?;
        Ok(())
    }
}

impl<Context> Decode<Context> for TransformMsg {
    fn decode<D: bincode::de::Decoder<Context = Context>>(
        decoder: &mut D,
    ) -> Result<Self, bincode::error::DecodeError> {
        let transform = RigidTransform::decode(decoder)?;
        let parent_frame_str = String::decode(decoder)?;
        let child_frame_str = String::decode(decoder)?;
        let kind = TransformKind::decode(decoder)?;
        let parent_frame = FrameIdString::from(&parent_frame_str).map_err(|_| {
            bincode::error::DecodeError::OtherString("Parent frame name too long".to_string())
        })?;
        let child_frame = FrameIdString::from(&child_frame_str).map_err(|_| {
            bincode::error::DecodeError::OtherString("Child frame name too long".to_string())
        })?;
        Ok(Self {
            transform,
            parent_frame,
            child_frame,
            kind,
        })
    }
}

/// The frame-transform broadcast payload emitted once per localization cycle.
#[derive(Debug, Clone, Serialize)]
pub struct TransformBroadcast {
    /// Fixed-size array of transform messages.
    pub transforms: [Option<TransformMsg>; MAX_TRANSFORMS_PER_BROADCAST],
    /// Number of valid transforms in the array.
    pub count: usize,
}

impl Default for TransformBroadcast {
    fn default() -> Self {
        Self {
            transforms: [const { None }; MAX_TRANSFORMS_PER_BROADCAST],
            count: 0,
        }
    }
}

impl TransformBroadcast {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a transform to the broadcast.
    /// Returns false if the broadcast is full.
    pub fn add_transform(&mut self, transform: TransformMsg) -> bool {
        if self.count >= MAX_TRANSFORMS_PER_BROADCAST {
            return false;
        }
        self.transforms[self.count] = Some(transform);
        self.count += 1;
        true
    }

    pub fn clear(&mut self) {
        for slot in self.transforms.iter_mut().take(self.count) {
            *slot = None;
        }
        self.count = 0;
    }

    pub fn iter(&self) -> impl Iterator<Item = &TransformMsg> {
        self.transforms[..self.count].iter().filter_map(|t| t.as_ref())
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

impl Encode for TransformBroadcast {
    fn encode<E: bincode::enc::Encoder>(
        &self,
        encoder: &mut E,
    ) -> Result<(), bincode::error::EncodeError> {
        self.count.encode(encoder)?;
        for transform in self.iter() {
            transform.encode(encoder)?;
        }
        Ok(())
    }
}

impl<Context> Decode<Context> for TransformBroadcast {
    fn decode<D: bincode::de::Decoder<Context = Context>>(
        decoder: &mut D,
    ) -> Result<Self, bincode::error::DecodeError> {
        let count = usize::decode(decoder)?;
        if count > MAX_TRANSFORMS_PER_BROADCAST {
            return Err(bincode::error::DecodeError::OtherString(format!(
                "Too many transforms in broadcast: {count} > {MAX_TRANSFORMS_PER_BROADCAST}"
            )));
        }

        let mut transforms = [const { None }; MAX_TRANSFORMS_PER_BROADCAST];
        for transform in transforms.iter_mut().take(count) {
            *transform = Some(TransformMsg::decode(decoder)?);
        }

        Ok(Self { transforms, count })
    }
}

bincode::impl_borrow_decode!(TransformBroadcast);
