use bytes::Bytes;
use tracing::{debug, warn};

use teratap_frame::{Direction, Frame};
use teratap_schema::{FieldDef, MessageSchema, TypeTag};

use crate::primitives::decode_value;
use crate::value::{Record, Value};

/// Default cap on declared array element counts.
pub const DEFAULT_MAX_ARRAY_LEN: u16 = 100;

/// Limits applied while walking a message.
#[derive(Debug, Clone)]
pub struct DecodeConfig {
    /// Cap on declared array element counts. A count past this is taken as
    /// a sign the schema no longer matches the wire, and the walk stops.
    pub max_array_len: u16,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            max_array_len: DEFAULT_MAX_ARRAY_LEN,
        }
    }
}

/// Decoded fields of one message plus how much of the payload they used.
#[derive(Debug, Clone)]
pub struct DecodedPayload {
    pub fields: Record,
    /// High-water mark of the walk cursor. Equals the payload length after
    /// a clean full parse.
    pub consumed: usize,
}

/// A decoded message as delivered to subscribers.
#[derive(Debug, Clone)]
pub struct DecodedMessage {
    pub direction: Direction,
    pub name: String,
    pub opcode: u16,
    pub fields: Record,
    /// The undecoded payload, kept for consumers that want the raw bytes.
    pub raw: Bytes,
}

impl DecodedMessage {
    /// Decode a frame's payload against a schema and wrap the result.
    pub fn from_frame(
        frame: &Frame,
        name: impl Into<String>,
        schema: &MessageSchema,
        config: &DecodeConfig,
    ) -> Self {
        let name = name.into();
        let decoded = decode_message(&name, schema, &frame.payload, config);
        Self {
            direction: frame.direction,
            name,
            opcode: frame.opcode,
            fields: decoded.fields,
            raw: frame.payload.clone(),
        }
    }
}

/// Walk a payload according to its schema, field by field.
///
/// The walk never fails; it decodes as much as the payload supports and
/// reports anomalies through tracing. Three things can cut it short: the
/// payload ending before the schema does, a field that consumes no bytes,
/// and an array whose link header is missing or whose count is past the cap.
pub fn decode_message(
    name: &str,
    schema: &MessageSchema,
    payload: &[u8],
    config: &DecodeConfig,
) -> DecodedPayload {
    let mut fields = Record::new();
    let mut cursor = 0usize;

    for field in &schema.fields {
        if cursor >= payload.len() {
            warn!(
                message = name,
                field = %field.name,
                cursor,
                payload_len = payload.len(),
                "payload ended before field"
            );
            break;
        }

        if field.tag == TypeTag::Array {
            if !decode_array(field, payload, &mut fields, &mut cursor, name, config) {
                break;
            }
            continue;
        }

        if field.tag == TypeTag::String {
            let pointer = match fields.get(&format!("offset_{}", field.name)) {
                Some(Value::Offset(backref)) => Some(*backref),
                _ => None,
            };
            if let Some(backref) = pointer {
                decode_pointed_string(field, payload, &mut fields, &mut cursor, name, backref);
                continue;
            }
        }

        let (value, consumed) = decode_value(&field.tag, payload, cursor);
        if consumed == 0 {
            warn!(
                message = name,
                field = %field.name,
                cursor,
                "field consumed no bytes, stopping"
            );
            break;
        }
        fields.insert(&field.name, value);
        cursor += consumed;
    }

    if cursor != payload.len() {
        debug!(
            message = name,
            used = cursor,
            payload_len = payload.len(),
            "partial parse"
        );
    }

    DecodedPayload { fields, consumed: cursor }
}

/// Walk one scattered array.
///
/// Elements live anywhere in the payload, chained by a 4-byte link header
/// (`here` and `next` offsets) in front of each one; the array's own link
/// header gives the count and the first element's position. The walk is
/// bounded by the declared count, so adversarial `next` pointers can force
/// re-reads but never a loop.
///
/// Returns `false` when the whole message walk must stop: the link header
/// was never decoded, or the count is past the configured cap.
fn decode_array(
    field: &FieldDef,
    payload: &[u8],
    fields: &mut Record,
    cursor: &mut usize,
    name: &str,
    config: &DecodeConfig,
) -> bool {
    let (count, first) = match fields.get(&format!("{}_ref", field.name)) {
        Some(Value::Ref { count, offset }) => (*count, *offset),
        _ => {
            warn!(message = name, array = %field.name, "array has no link header, stopping");
            return false;
        }
    };

    if count > config.max_array_len {
        warn!(
            message = name,
            array = %field.name,
            count,
            cap = config.max_array_len,
            "array count over cap, stopping"
        );
        fields.insert(&field.name, Value::List(Vec::new()));
        return false;
    }

    let mut items = Vec::new();
    let mut local = first as usize;

    for k in 0..count {
        if local + 4 > payload.len() {
            warn!(
                message = name,
                array = %field.name,
                offset = local,
                "element link header past payload end"
            );
            break;
        }

        let here = u16::from_le_bytes([payload[local], payload[local + 1]]);
        let next = u16::from_le_bytes([payload[local + 2], payload[local + 3]]);
        local += 4;

        if k == 0 && here != first && first != 0 {
            debug!(
                message = name,
                array = %field.name,
                here,
                first,
                "first element does not point back at its link header"
            );
        }

        let mut item = Record::new();
        let mut valid = true;
        for element in &field.elements {
            if local >= payload.len() {
                warn!(
                    message = name,
                    array = %field.name,
                    element = %element.name,
                    offset = local,
                    "element field past payload end"
                );
                valid = false;
                break;
            }

            let (value, consumed) = decode_value(&element.tag, payload, local);
            if consumed == 0 {
                warn!(
                    message = name,
                    array = %field.name,
                    element = %element.name,
                    offset = local,
                    "element field consumed no bytes"
                );
                valid = false;
                break;
            }
            item.insert(&element.name, value);
            local += consumed;
        }

        if valid {
            items.push(item);
        } else {
            break;
        }

        if next == 0 {
            if k + 1 < count {
                debug!(
                    message = name,
                    array = %field.name,
                    got = k + 1,
                    expected = count,
                    "array chain ended early"
                );
            }
            break;
        }
        local = next as usize;
    }

    fields.insert(&field.name, Value::List(items));
    *cursor = local;
    true
}

/// Decode a string whose data lives at a previously decoded pointer.
///
/// A pointer outside the payload yields an empty string and leaves the
/// cursor alone; a valid one decodes at the pointed position and advances
/// the cursor's high-water mark, never moving it backwards.
fn decode_pointed_string(
    field: &FieldDef,
    payload: &[u8],
    fields: &mut Record,
    cursor: &mut usize,
    name: &str,
    backref: i32,
) {
    if backref < 0 || backref as usize >= payload.len() {
        warn!(
            message = name,
            field = %field.name,
            backref,
            payload_len = payload.len(),
            "string pointer out of range"
        );
        fields.insert(&field.name, Value::String(String::new()));
        return;
    }

    let start = backref as usize;
    let (value, consumed) = decode_value(&TypeTag::String, payload, start);
    fields.insert(&field.name, value);
    *cursor = (*cursor).max(start + consumed);
}
