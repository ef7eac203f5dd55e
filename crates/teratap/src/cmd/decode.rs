use bytes::BytesMut;

use teratap_decode::{DecodeConfig, DecodedMessage};
use teratap_frame::take_frame;
use teratap_schema::ProtocolData;

use crate::cmd::{resolve_revision, DecodeArgs};
use crate::exit::{frame_error, schema_error, CliError, CliResult, DATA_INVALID, SUCCESS, USAGE};
use crate::output::{print_message, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let bytes = parse_hex(&args.frame)?;

    let data =
        ProtocolData::load(&args.data).map_err(|err| schema_error("protocol bundle", err))?;
    let revision = resolve_revision(&data, args.revision.as_deref())?;
    let opcodes = data
        .opcode_table(&revision)
        .map_err(|err| schema_error("protocol bundle", err))?;
    let catalog = data.catalog();

    let mut buf = BytesMut::from(bytes.as_slice());
    let frame = take_frame(&mut buf)
        .map_err(|err| frame_error("frame", err))?
        .ok_or_else(|| CliError::new(DATA_INVALID, "incomplete frame: need more bytes"))?;
    if !buf.is_empty() {
        return Err(CliError::new(
            DATA_INVALID,
            format!("{} trailing bytes after the frame", buf.len()),
        ));
    }

    let name = opcodes.name_of(frame.opcode).ok_or_else(|| {
        CliError::new(
            DATA_INVALID,
            format!(
                "opcode {:#06x} has no name in revision {revision}",
                frame.opcode
            ),
        )
    })?;
    let schema = catalog
        .get(name)
        .ok_or_else(|| CliError::new(DATA_INVALID, format!("no definition for {name}")))?;

    let message = DecodedMessage::from_frame(&frame, name, schema, &DecodeConfig::default());
    print_message(&message, format);
    Ok(SUCCESS)
}

fn parse_hex(text: &str) -> CliResult<Vec<u8>> {
    let cleaned: String = text.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    if cleaned.len() % 2 != 0 {
        return Err(CliError::new(USAGE, "hex input has an odd number of digits"));
    }
    (0..cleaned.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&cleaned[i..i + 2], 16)
                .map_err(|_| CliError::new(USAGE, format!("invalid hex at offset {i}")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_hex() {
        assert_eq!(parse_hex("0900020400aa").unwrap(), [9, 0, 2, 4, 0, 0xAA]);
    }

    #[test]
    fn tolerates_whitespace() {
        assert_eq!(parse_hex("09 00 02\n04").unwrap(), [9, 0, 2, 4]);
    }

    #[test]
    fn odd_digit_count_is_a_usage_error() {
        let err = parse_hex("090").unwrap_err();
        assert_eq!(err.code, USAGE);
    }

    #[test]
    fn non_hex_digits_are_a_usage_error() {
        let err = parse_hex("09zz").unwrap_err();
        assert_eq!(err.code, USAGE);
        assert!(err.message.contains("offset 2"));
    }
}
