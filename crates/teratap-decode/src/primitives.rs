use bytes::Bytes;
use tracing::warn;

use teratap_schema::TypeTag;

use crate::skill::SkillId32;
use crate::value::Value;

/// Cap on length-prefixed blob fields.
pub const MAX_BLOB_LEN: usize = 256;

/// Decode one value at `offset`, returning it and the bytes consumed.
///
/// Never fails hard: when the payload is too short for the requested type
/// the result is `(Value::Null, 0)`, and zero consumed bytes is the caller's
/// signal to stop walking. An offset at or past the payload end is rejected
/// up front for every type.
pub fn decode_value(tag: &TypeTag, payload: &[u8], offset: usize) -> (Value, usize) {
    if offset >= payload.len() {
        return (Value::Null, 0);
    }

    match tag {
        TypeTag::Int8 => (Value::Int(i64::from(payload[offset] as i8)), 1),
        TypeTag::Uint8 => (Value::Uint(u64::from(payload[offset])), 1),
        TypeTag::Bool => (Value::Bool(payload[offset] != 0), 1),
        TypeTag::Int16 => match payload.get(offset..offset + 2) {
            Some(raw) => (
                Value::Int(i64::from(i16::from_le_bytes(raw.try_into().unwrap()))),
                2,
            ),
            None => (Value::Null, 0),
        },
        TypeTag::Uint16 => match payload.get(offset..offset + 2) {
            Some(raw) => (
                Value::Uint(u64::from(u16::from_le_bytes(raw.try_into().unwrap()))),
                2,
            ),
            None => (Value::Null, 0),
        },
        TypeTag::Int32 => match payload.get(offset..offset + 4) {
            Some(raw) => (
                Value::Int(i64::from(i32::from_le_bytes(raw.try_into().unwrap()))),
                4,
            ),
            None => (Value::Null, 0),
        },
        TypeTag::Uint32 => match payload.get(offset..offset + 4) {
            Some(raw) => (
                Value::Uint(u64::from(u32::from_le_bytes(raw.try_into().unwrap()))),
                4,
            ),
            None => (Value::Null, 0),
        },
        TypeTag::Int64 => match payload.get(offset..offset + 8) {
            Some(raw) => (
                Value::Int(i64::from_le_bytes(raw.try_into().unwrap())),
                8,
            ),
            None => (Value::Null, 0),
        },
        TypeTag::Uint64 => match payload.get(offset..offset + 8) {
            Some(raw) => (
                Value::Uint(u64::from_le_bytes(raw.try_into().unwrap())),
                8,
            ),
            None => (Value::Null, 0),
        },
        TypeTag::Float => match payload.get(offset..offset + 4) {
            Some(raw) => (
                Value::Float(f32::from_le_bytes(raw.try_into().unwrap())),
                4,
            ),
            None => (Value::Null, 0),
        },
        TypeTag::Double => match payload.get(offset..offset + 8) {
            Some(raw) => (
                Value::Double(f64::from_le_bytes(raw.try_into().unwrap())),
                8,
            ),
            None => (Value::Null, 0),
        },
        TypeTag::Angle => match payload.get(offset..offset + 2) {
            Some(raw) => {
                let heading = i16::from_le_bytes(raw.try_into().unwrap());
                (
                    Value::Double(f64::from(heading) / 32768.0 * std::f64::consts::PI),
                    2,
                )
            }
            None => (Value::Null, 0),
        },
        TypeTag::Vec3 => match payload.get(offset..offset + 12) {
            Some(raw) => (
                Value::Vec3 {
                    x: f32::from_le_bytes(raw[0..4].try_into().unwrap()),
                    y: f32::from_le_bytes(raw[4..8].try_into().unwrap()),
                    z: f32::from_le_bytes(raw[8..12].try_into().unwrap()),
                },
                12,
            ),
            None => (Value::Null, 0),
        },
        TypeTag::Offset3d => match payload.get(offset..offset + 6) {
            Some(raw) => (
                Value::Offset3d {
                    x: i16::from_le_bytes(raw[0..2].try_into().unwrap()),
                    y: i16::from_le_bytes(raw[2..4].try_into().unwrap()),
                    z: i16::from_le_bytes(raw[4..6].try_into().unwrap()),
                },
                6,
            ),
            None => (Value::Null, 0),
        },
        TypeTag::SkillId32 => match payload.get(offset..offset + 4) {
            Some(raw) => (
                Value::SkillId(SkillId32::from_wire(u32::from_le_bytes(
                    raw.try_into().unwrap(),
                ))),
                4,
            ),
            None => (Value::Null, 0),
        },
        TypeTag::Ref => match payload.get(offset..offset + 4) {
            Some(raw) => (
                Value::Ref {
                    count: u16::from_le_bytes(raw[0..2].try_into().unwrap()),
                    offset: u16::from_le_bytes(raw[2..4].try_into().unwrap()),
                },
                4,
            ),
            None => (Value::Null, 0),
        },
        TypeTag::OffsetRef => match payload.get(offset..offset + 2) {
            Some(raw) => {
                // Wire pointers count from the inner frame start; the payload
                // begins 4 bytes in, so re-base them here.
                let wire = u16::from_le_bytes(raw.try_into().unwrap());
                (Value::Offset(i32::from(wire) - 4), 2)
            }
            None => (Value::Null, 0),
        },
        TypeTag::Byte => decode_blob(payload, offset),
        TypeTag::String => decode_string(payload, offset),
        TypeTag::Null => (Value::Null, 0),
        TypeTag::Array => {
            warn!(offset, "array tag cannot be decoded as a plain value");
            (Value::Null, 0)
        }
        TypeTag::Unknown(tag) => {
            warn!(tag = %tag, offset, "unknown type tag");
            (Value::Null, 0)
        }
    }
}

/// Length-prefixed blob: `u16` length, then that many bytes.
///
/// Suspicious lengths keep the stream alive instead of killing the message:
/// a length over the cap or data running past the payload end yields an
/// empty blob that consumes only the length prefix.
fn decode_blob(payload: &[u8], offset: usize) -> (Value, usize) {
    let Some(raw) = payload.get(offset..offset + 2) else {
        return (Value::Null, 0);
    };
    let len = u16::from_le_bytes(raw.try_into().unwrap()) as usize;

    if len > MAX_BLOB_LEN {
        warn!(len, offset, cap = MAX_BLOB_LEN, "blob length over cap, dropping contents");
        return (Value::Bytes(Bytes::new()), 2);
    }

    match payload.get(offset + 2..offset + 2 + len) {
        Some(data) => (Value::Bytes(Bytes::copy_from_slice(data)), 2 + len),
        None => {
            warn!(len, offset, "blob data runs past payload end");
            (Value::Bytes(Bytes::new()), 2)
        }
    }
}

/// Null-terminated UTF-16LE text.
///
/// Reads code units until a null terminator (consumed) or until fewer than
/// two bytes remain (an unterminated string is returned as-is). Unpaired
/// surrogates become U+FFFD.
fn decode_string(payload: &[u8], offset: usize) -> (Value, usize) {
    let mut units = Vec::new();
    let mut pos = offset;
    let mut consumed = 0;

    while pos + 1 < payload.len() {
        let unit = u16::from_le_bytes([payload[pos], payload[pos + 1]]);
        pos += 2;
        consumed += 2;
        if unit == 0 {
            break;
        }
        units.push(unit);
    }

    (Value::String(String::from_utf16_lossy(&units)), consumed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utf16le(text: &str, terminated: bool) -> Vec<u8> {
        let mut out = Vec::new();
        for unit in text.encode_utf16() {
            out.extend_from_slice(&unit.to_le_bytes());
        }
        if terminated {
            out.extend_from_slice(&[0, 0]);
        }
        out
    }

    #[test]
    fn single_byte_types() {
        let payload = [0xFF];
        assert_eq!(
            decode_value(&TypeTag::Int8, &payload, 0),
            (Value::Int(-1), 1)
        );
        assert_eq!(
            decode_value(&TypeTag::Uint8, &payload, 0),
            (Value::Uint(255), 1)
        );
        assert_eq!(
            decode_value(&TypeTag::Bool, &payload, 0),
            (Value::Bool(true), 1)
        );
        assert_eq!(
            decode_value(&TypeTag::Bool, &[0x00], 0),
            (Value::Bool(false), 1)
        );
        assert_eq!(
            decode_value(&TypeTag::Bool, &[0x07], 0),
            (Value::Bool(true), 1)
        );
    }

    #[test]
    fn fixed_width_integers() {
        let payload = [0xFE, 0xFF, 0x01, 0x00, 0x00, 0x00, 0x00, 0x80];

        assert_eq!(
            decode_value(&TypeTag::Int16, &payload, 0),
            (Value::Int(-2), 2)
        );
        assert_eq!(
            decode_value(&TypeTag::Uint16, &payload, 0),
            (Value::Uint(0xFFFE), 2)
        );
        assert_eq!(
            decode_value(&TypeTag::Int32, &payload, 0),
            (Value::Int(0x0001_FFFE), 4)
        );
        assert_eq!(
            decode_value(&TypeTag::Uint32, &payload, 0),
            (Value::Uint(0x0001_FFFE), 4)
        );
        assert_eq!(
            decode_value(&TypeTag::Int64, &payload, 0),
            (Value::Int(i64::MIN + 0x0001_FFFE), 8)
        );
        assert_eq!(
            decode_value(&TypeTag::Uint64, &payload, 0),
            (Value::Uint(0x8000_0000_0001_FFFE), 8)
        );
    }

    #[test]
    fn floats() {
        let mut payload = Vec::new();
        payload.extend_from_slice(&1.5f32.to_le_bytes());
        payload.extend_from_slice(&(-2.25f64).to_le_bytes());

        assert_eq!(
            decode_value(&TypeTag::Float, &payload, 0),
            (Value::Float(1.5), 4)
        );
        assert_eq!(
            decode_value(&TypeTag::Double, &payload, 4),
            (Value::Double(-2.25), 8)
        );
    }

    #[test]
    fn angle_scales_to_radians() {
        let quarter = 16384i16.to_le_bytes();
        let (value, consumed) = decode_value(&TypeTag::Angle, &quarter, 0);
        assert_eq!(consumed, 2);
        match value {
            Value::Double(v) => assert!((v - std::f64::consts::FRAC_PI_2).abs() < 1e-12),
            other => panic!("unexpected value: {other:?}"),
        }

        let half_turn = (-32768i16).to_le_bytes();
        let (value, _) = decode_value(&TypeTag::Angle, &half_turn, 0);
        match value {
            Value::Double(v) => assert!((v + std::f64::consts::PI).abs() < 1e-12),
            other => panic!("unexpected value: {other:?}"),
        }
    }

    #[test]
    fn vectors() {
        let mut payload = Vec::new();
        payload.extend_from_slice(&10.0f32.to_le_bytes());
        payload.extend_from_slice(&(-20.5f32).to_le_bytes());
        payload.extend_from_slice(&0.25f32.to_le_bytes());

        assert_eq!(
            decode_value(&TypeTag::Vec3, &payload, 0),
            (
                Value::Vec3 {
                    x: 10.0,
                    y: -20.5,
                    z: 0.25
                },
                12
            )
        );

        let payload = [0x01, 0x00, 0xFF, 0xFF, 0x10, 0x00];
        assert_eq!(
            decode_value(&TypeTag::Offset3d, &payload, 0),
            (Value::Offset3d { x: 1, y: -1, z: 16 }, 6)
        );
    }

    #[test]
    fn skill_id() {
        let raw = (0x4000_0000u32 | (1 << 26) | (9 << 16) | 77).to_le_bytes();
        let (value, consumed) = decode_value(&TypeTag::SkillId32, &raw, 0);

        assert_eq!(consumed, 4);
        match value {
            Value::SkillId(skill) => {
                assert_eq!(skill.id, 77);
                assert_eq!(skill.hunting_zone, 9);
                assert!(skill.is_npc);
            }
            other => panic!("unexpected value: {other:?}"),
        }
    }

    #[test]
    fn link_header() {
        let payload = [0x02, 0x00, 0x0A, 0x00];
        assert_eq!(
            decode_value(&TypeTag::Ref, &payload, 0),
            (Value::Ref { count: 2, offset: 10 }, 4)
        );
    }

    #[test]
    fn pointer_rebased_by_inner_header() {
        assert_eq!(
            decode_value(&TypeTag::OffsetRef, &[0x0A, 0x00], 0),
            (Value::Offset(6), 2)
        );
        // A wire pointer inside the inner header re-bases below zero.
        assert_eq!(
            decode_value(&TypeTag::OffsetRef, &[0x02, 0x00], 0),
            (Value::Offset(-2), 2)
        );
    }

    #[test]
    fn blob_round_trip() {
        let payload = [0x03, 0x00, 0xAA, 0xBB, 0xCC, 0xDD];
        let (value, consumed) = decode_value(&TypeTag::Byte, &payload, 0);

        assert_eq!(consumed, 5);
        assert_eq!(value, Value::Bytes(Bytes::from_static(&[0xAA, 0xBB, 0xCC])));
    }

    #[test]
    fn blob_over_cap_keeps_stream_alive() {
        let mut payload = vec![0xFF, 0x01]; // length 511
        payload.extend_from_slice(&[0u8; 600]);

        assert_eq!(
            decode_value(&TypeTag::Byte, &payload, 0),
            (Value::Bytes(Bytes::new()), 2)
        );
    }

    #[test]
    fn blob_at_cap_is_allowed() {
        let mut payload = vec![0x00, 0x01]; // length 256
        payload.extend_from_slice(&[0x42u8; 256]);

        let (value, consumed) = decode_value(&TypeTag::Byte, &payload, 0);
        assert_eq!(consumed, 258);
        match value {
            Value::Bytes(data) => assert_eq!(data.len(), 256),
            other => panic!("unexpected value: {other:?}"),
        }
    }

    #[test]
    fn truncated_blob_consumes_only_prefix() {
        let payload = [0x05, 0x00, 0xAA];
        assert_eq!(
            decode_value(&TypeTag::Byte, &payload, 0),
            (Value::Bytes(Bytes::new()), 2)
        );
    }

    #[test]
    fn terminated_string() {
        let payload = utf16le("Hi", true);
        assert_eq!(
            decode_value(&TypeTag::String, &payload, 0),
            (Value::String("Hi".to_string()), 6)
        );
    }

    #[test]
    fn empty_string_consumes_terminator() {
        let payload = [0x00, 0x00];
        assert_eq!(
            decode_value(&TypeTag::String, &payload, 0),
            (Value::String(String::new()), 2)
        );
    }

    #[test]
    fn unterminated_string_runs_to_payload_end() {
        let payload = utf16le("Hi", false);
        assert_eq!(
            decode_value(&TypeTag::String, &payload, 0),
            (Value::String("Hi".to_string()), 4)
        );
    }

    #[test]
    fn string_ignores_trailing_odd_byte() {
        let mut payload = utf16le("H", false);
        payload.push(0x69);
        assert_eq!(
            decode_value(&TypeTag::String, &payload, 0),
            (Value::String("H".to_string()), 2)
        );
    }

    #[test]
    fn non_ascii_string() {
        let payload = utf16le("테라", true);
        assert_eq!(
            decode_value(&TypeTag::String, &payload, 0),
            (Value::String("테라".to_string()), 6)
        );
    }

    #[test]
    fn truncation_yields_nothing_consumed() {
        let payload = [0x01, 0x02, 0x03];

        for tag in [
            TypeTag::Int32,
            TypeTag::Uint32,
            TypeTag::Int64,
            TypeTag::Uint64,
            TypeTag::Float,
            TypeTag::Double,
            TypeTag::Vec3,
            TypeTag::Offset3d,
            TypeTag::SkillId32,
            TypeTag::Ref,
        ] {
            assert_eq!(decode_value(&tag, &payload, 0), (Value::Null, 0), "{tag}");
        }

        assert_eq!(decode_value(&TypeTag::Int16, &payload, 2), (Value::Null, 0));
        assert_eq!(
            decode_value(&TypeTag::OffsetRef, &payload, 2),
            (Value::Null, 0)
        );
    }

    #[test]
    fn offset_past_end_yields_nothing() {
        let payload = [0x01, 0x02];

        assert_eq!(decode_value(&TypeTag::Uint8, &payload, 2), (Value::Null, 0));
        assert_eq!(decode_value(&TypeTag::Uint8, &payload, 9), (Value::Null, 0));
        assert_eq!(
            decode_value(&TypeTag::String, &payload, 2),
            (Value::Null, 0)
        );
    }

    #[test]
    fn placeholder_and_unknown_tags() {
        let payload = [0x01, 0x02, 0x03, 0x04];

        assert_eq!(decode_value(&TypeTag::Null, &payload, 0), (Value::Null, 0));
        assert_eq!(decode_value(&TypeTag::Array, &payload, 0), (Value::Null, 0));
        assert_eq!(
            decode_value(&TypeTag::Unknown("widget".to_string()), &payload, 0),
            (Value::Null, 0)
        );
    }
}
