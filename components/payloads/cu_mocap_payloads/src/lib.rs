//! Payload types for motion-capture based localization: the rigid-body
//! sample stream coming from the tracking system and the odometry record
//! published for downstream navigation consumers.

mod odometry;
mod rigid_bodies;

pub use odometry::{Covariance6, Odometry};
pub use rigid_bodies::{MarkerPoint, RigidBodies, RigidBodyPose, MAX_MARKERS, MAX_RIGID_BODIES};

use arrayvec::ArrayVec;
use bincode::de::{Decode, Decoder};
use bincode::enc::{Encode, Encoder};
use bincode::error::{DecodeError, EncodeError};
use serde::{Deserialize, Serialize};

/// A fixed-capacity vector that encodes as a length-prefixed sequence.
/// Decoding rejects payloads that exceed the capacity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CuArrayVec<T, const N: usize>(pub ArrayVec<T, N>);

impl<T, const N: usize> Default for CuArrayVec<T, N> {
    fn default() -> Self {
        Self(ArrayVec::new())
    }
}

impl<T, const N: usize> CuArrayVec<T, N> {
    pub fn as_slice(&self) -> &[T] {
        self.0.as_slice()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn try_push(&mut self, value: T) -> Result<(), arrayvec::CapacityError<T>> {
        self.0.try_push(value)
    }
}

impl<T, const N: usize> Encode for CuArrayVec<T, N>
where
    T: Encode + 'static,
{
    fn encode<E: Encoder>(&self, encoder: &mut E) -> Result<(), EncodeError> {
        let CuArrayVec(inner) = self;
        inner.as_slice().encode(encoder)
    }
}

impl<T, Context, const N: usize> Decode<Context> for CuArrayVec<T, N>
where
    T: Decode<Context> + 'static,
{
    fn decode<D: Decoder<Context = Context>>(decoder: &mut D) -> Result<Self, DecodeError> {
        let inner = Vec::<T>::decode(decoder)?;
        let actual_len = inner.len();
        if actual_len > N {
            return Err(DecodeError::ArrayLengthMismatch {
                required: N,
                found: actual_len,
            });
        }

        let mut array_vec = ArrayVec::new();
        for item in inner {
            array_vec.push(item);
        }
        Ok(CuArrayVec(array_vec))
    }
}

impl<'de, T, Context, const N: usize> bincode::BorrowDecode<'de, Context> for CuArrayVec<T, N>
where
    T: Decode<Context> + 'static,
{
    fn borrow_decode<D: bincode::de::BorrowDecoder<'de, Context = Context>>(
        decoder: &mut D,
    ) -> Result<Self, DecodeError> {
        Decode::decode(decoder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_rejects_oversized_sequences() {
        let oversized: Vec<u32> = (0..5).collect();
        let encoded = bincode::encode_to_vec(&oversized, bincode::config::standard()).unwrap();

        let result: Result<(CuArrayVec<u32, 4>, _), _> =
            bincode::decode_from_slice(&encoded, bincode::config::standard());
        assert!(result.is_err());

        let result: Result<(CuArrayVec<u32, 8>, _), _> =
            bincode::decode_from_slice(&encoded, bincode::config::standard());
        let (decoded, _) = result.unwrap();
        assert_eq!(decoded.as_slice(), &[0, 1, 2, 3, 4]);
    }

    #[test]
    fn try_push_respects_capacity() {
        let mut v: CuArrayVec<u8, 2> = CuArrayVec::default();
        assert!(v.try_push(1).is_ok());
        assert!(v.try_push(2).is_ok());
        assert!(v.try_push(3).is_err());
        assert_eq!(v.len(), 2);
    }
}
