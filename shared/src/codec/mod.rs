//! Length-framed payload codec
//!
//! Frames a sparse sequence of opaque items into one self-describing,
//! printable string and back. The wire layout is a big-endian `u32` slot
//! count followed by one presence marker per slot (`0` absent, `1`
//! present, immediately followed by the item's envelope), and the whole
//! buffer is rendered as base64.
//!
//! The codec never inspects item internals and never compresses; it only
//! frames the slot *count*. Each item envelope must delimit itself, which
//! is the host's side of the [`ItemFormat`] contract. Compression is a
//! separate layer applied to this codec's output (see [`crate::compress`]).

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use thiserror::Error;

const MARKER_ABSENT: u8 = 0;
const MARKER_PRESENT: u8 = 1;

/// Errors raised while decoding a framed payload.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The payload is not valid base64.
    #[error("payload is not valid base64: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    /// The item-count prefix is missing or truncated.
    #[error("payload too short to carry an item count")]
    TruncatedCount,

    /// The declared count does not match the records actually present.
    #[error("payload declares {declared} slots but only {present} are present")]
    CountMismatch { declared: usize, present: usize },

    /// A presence marker carried an unknown value.
    #[error("slot {index} has invalid presence marker {value}")]
    InvalidMarker { index: usize, value: u8 },

    /// An item envelope ended before its own framing said it would.
    #[error("item envelope at slot {index} is truncated")]
    TruncatedItem { index: usize },

    /// The host collaborator failed to serialize or deserialize an item.
    #[error("item format error: {message}")]
    Item { message: String },
}

/// Host serialization collaborator for one opaque in-world item.
///
/// `serialize` appends exactly one envelope to `out`; `deserialize`
/// consumes exactly one envelope from the front of `input`. Envelopes are
/// self-delimiting: the codec frames only the item count and relies on
/// each envelope to mark its own end. Round-tripping must yield an
/// equivalent item.
pub trait ItemFormat {
    type Item;

    /// Append one item's envelope to the buffer.
    fn serialize(&self, item: &Self::Item, out: &mut Vec<u8>) -> Result<(), CodecError>;

    /// Consume one envelope from the front of the slice and rebuild the
    /// item. Implementations must advance `input` past exactly the bytes
    /// they own, and report short input as [`CodecError::TruncatedItem`]
    /// for the slot index they are given.
    fn deserialize(&self, input: &mut &[u8], index: usize) -> Result<Self::Item, CodecError>;
}

/// Encode a sparse item sequence into one printable string.
///
/// Deterministic: the same sequence always yields identical output.
pub fn encode_items<F: ItemFormat>(
    format: &F,
    items: &[Option<F::Item>],
) -> Result<String, CodecError> {
    let mut buf = Vec::new();
    buf.extend_from_slice(&(items.len() as u32).to_be_bytes());

    for item in items {
        match item {
            Some(item) => {
                buf.push(MARKER_PRESENT);
                format.serialize(item, &mut buf)?;
            }
            None => buf.push(MARKER_ABSENT),
        }
    }

    Ok(BASE64.encode(buf))
}

/// Decode a framed payload back into its sparse item sequence.
///
/// Reproduces length, order, per-position presence and payload bytes
/// exactly.
pub fn decode_items<F: ItemFormat>(
    format: &F,
    payload: &str,
) -> Result<Vec<Option<F::Item>>, CodecError> {
    let buf = BASE64.decode(payload)?;
    let mut input = buf.as_slice();

    let count = read_count(&mut input)?;
    // The count is untrusted; a marker needs at least one byte, so never
    // preallocate more slots than the remaining input could hold.
    let mut items = Vec::with_capacity(count.min(input.len()));

    for index in 0..count {
        let Some((&marker, rest)) = input.split_first() else {
            return Err(CodecError::CountMismatch {
                declared: count,
                present: index,
            });
        };
        input = rest;

        match marker {
            MARKER_ABSENT => items.push(None),
            MARKER_PRESENT => items.push(Some(format.deserialize(&mut input, index)?)),
            value => return Err(CodecError::InvalidMarker { index, value }),
        }
    }

    Ok(items)
}

fn read_count(input: &mut &[u8]) -> Result<usize, CodecError> {
    if input.len() < 4 {
        return Err(CodecError::TruncatedCount);
    }
    let (prefix, rest) = input.split_at(4);
    *input = rest;

    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(prefix);
    Ok(u32::from_be_bytes(bytes) as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Byte-string items in a self-delimiting `u16` length envelope.
    struct BytesFormat;

    impl ItemFormat for BytesFormat {
        type Item = Vec<u8>;

        fn serialize(&self, item: &Vec<u8>, out: &mut Vec<u8>) -> Result<(), CodecError> {
            out.extend_from_slice(&(item.len() as u16).to_be_bytes());
            out.extend_from_slice(item);
            Ok(())
        }

        fn deserialize(&self, input: &mut &[u8], index: usize) -> Result<Vec<u8>, CodecError> {
            if input.len() < 2 {
                return Err(CodecError::TruncatedItem { index });
            }
            let (prefix, rest) = input.split_at(2);
            let len = u16::from_be_bytes([prefix[0], prefix[1]]) as usize;
            if rest.len() < len {
                return Err(CodecError::TruncatedItem { index });
            }
            let (body, rest) = rest.split_at(len);
            *input = rest;
            Ok(body.to_vec())
        }
    }

    fn round_trip(items: Vec<Option<Vec<u8>>>) {
        let encoded = encode_items(&BytesFormat, &items).unwrap();
        let decoded = decode_items(&BytesFormat, &encoded).unwrap();
        assert_eq!(decoded, items);
    }

    #[test]
    fn test_round_trip_empty() {
        round_trip(vec![]);
    }

    #[test]
    fn test_round_trip_all_absent() {
        round_trip(vec![None; 27]);
    }

    #[test]
    fn test_round_trip_sparse() {
        let mut items: Vec<Option<Vec<u8>>> = vec![None; 27];
        items[0] = Some(b"diamond".to_vec());
        items[13] = Some(vec![]);
        items[26] = Some(vec![0xff, 0x00, 0x7f]);
        round_trip(items);
    }

    #[test]
    fn test_round_trip_dense() {
        let items: Vec<Option<Vec<u8>>> = (0..27u8)
            .map(|i| Some(vec![i, i.wrapping_mul(7), 0]))
            .collect();
        round_trip(items);
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let items = vec![Some(b"emerald".to_vec()), None, Some(b"gold".to_vec())];
        let first = encode_items(&BytesFormat, &items).unwrap();
        let second = encode_items(&BytesFormat, &items).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_rejects_invalid_base64() {
        let result = decode_items(&BytesFormat, "not!!valid!!base64");
        assert!(matches!(result, Err(CodecError::InvalidBase64(_))));
    }

    #[test]
    fn test_rejects_truncated_count() {
        let payload = BASE64.encode([0u8, 0]);
        let result = decode_items(&BytesFormat, &payload);
        assert!(matches!(result, Err(CodecError::TruncatedCount)));
    }

    #[test]
    fn test_rejects_count_mismatch() {
        // Declares three slots but carries only one.
        let mut buf = Vec::new();
        buf.extend_from_slice(&3u32.to_be_bytes());
        buf.push(0);
        let payload = BASE64.encode(buf);

        let result = decode_items(&BytesFormat, &payload);
        assert!(matches!(
            result,
            Err(CodecError::CountMismatch {
                declared: 3,
                present: 1
            })
        ));
    }

    #[test]
    fn test_rejects_huge_declared_count() {
        // A count prefix of u32::MAX with no records behind it must fail
        // like any other mismatch, not try to reserve billions of slots.
        let payload = BASE64.encode(u32::MAX.to_be_bytes());

        let result = decode_items(&BytesFormat, &payload);
        assert!(matches!(
            result,
            Err(CodecError::CountMismatch {
                declared,
                present: 0
            }) if declared == u32::MAX as usize
        ));
    }

    #[test]
    fn test_rejects_truncated_envelope() {
        // One present item whose envelope claims more bytes than follow.
        let mut buf = Vec::new();
        buf.extend_from_slice(&1u32.to_be_bytes());
        buf.push(1);
        buf.extend_from_slice(&10u16.to_be_bytes());
        buf.extend_from_slice(b"abc");
        let payload = BASE64.encode(buf);

        let result = decode_items(&BytesFormat, &payload);
        assert!(matches!(
            result,
            Err(CodecError::TruncatedItem { index: 0 })
        ));
    }

    #[test]
    fn test_rejects_invalid_marker() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&1u32.to_be_bytes());
        buf.push(9);
        let payload = BASE64.encode(buf);

        let result = decode_items(&BytesFormat, &payload);
        assert!(matches!(
            result,
            Err(CodecError::InvalidMarker { index: 0, value: 9 })
        ));
    }
}
