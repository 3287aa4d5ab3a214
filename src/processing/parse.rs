//! FIT container parsing.
//!
//! A FIT file is a header whose first byte declares its own size, followed by
//! a 4-byte data length and (optionally) a two-byte header CRC; then a data
//! section alternating definition and data messages; then a two-byte CRC over
//! everything before it. Data messages are keyed by the local message number
//! of the most recent definition with the same local ID.

use crate::processing::raw::{
    DeveloperFieldDefinition, FieldDefinition, MessageDefinition, RawMessage,
};
use crate::processing::types::FitProcessError;
use std::collections::HashMap;

/// Header bytes of a FIT file, kept so a rewritten file can reuse them.
#[derive(Debug, Clone, PartialEq)]
pub struct FitHeader {
    pub header_without_crc: Vec<u8>,
    pub has_header_crc: bool,
}

impl Default for FitHeader {
    /// 14-byte header for protocol 2.0, profile 21.32.
    fn default() -> Self {
        let mut header_without_crc = vec![14, 0x20];
        header_without_crc.extend_from_slice(&2132u16.to_le_bytes());
        header_without_crc.extend_from_slice(&0u32.to_le_bytes());
        header_without_crc.extend_from_slice(b".FIT");
        Self {
            header_without_crc,
            has_header_crc: true,
        }
    }
}

/// A FIT file split into its header and the data messages in file order.
#[derive(Debug, Clone)]
pub struct ParsedFit {
    pub header: FitHeader,
    pub messages: Vec<RawMessage>,
}

/// Parse a raw FIT file while validating CRCs.
///
/// The header length must be at least 12 bytes, the declared data length must
/// fit in the payload, and the file must include the final CRC. The bytes are
/// additionally decoded with `fitparser`, which verifies both CRCs and the
/// message stream, so corruption is reported before anything is rewritten.
pub fn parse_fit(bytes: &[u8]) -> Result<ParsedFit, FitProcessError> {
    let header_size = *bytes
        .first()
        .ok_or_else(|| FitProcessError::InvalidHeader("missing header byte".into()))?
        as usize;

    if header_size < 12 {
        return Err(FitProcessError::InvalidHeader(
            "header too small to be a FIT file".into(),
        ));
    }

    if bytes.len() < header_size + 2 {
        return Err(FitProcessError::InvalidHeader(
            "file shorter than minimum header + CRC".into(),
        ));
    }

    let has_header_crc = header_size > 12;
    let header_without_crc_end = if has_header_crc {
        header_size - 2
    } else {
        header_size
    };
    let header_without_crc = bytes[..header_without_crc_end].to_vec();

    let data_size = u32::from_le_bytes(
        header_without_crc[4..8]
            .try_into()
            .map_err(|_| FitProcessError::InvalidHeader("unable to read data size".into()))?,
    ) as usize;

    let data_start = header_size;
    let data_end = data_start + data_size;
    if data_end + 2 > bytes.len() {
        return Err(FitProcessError::InvalidHeader(
            "file shorter than declared data size".into(),
        ));
    }

    fitparser::from_bytes(bytes).map_err(|err| FitProcessError::ParseError(err.to_string()))?;

    let messages = walk_data_section(&bytes[data_start..data_end])?;
    tracing::debug!(
        header_size,
        data_size,
        messages = messages.len(),
        "parsed FIT container"
    );

    Ok(ParsedFit {
        header: FitHeader {
            header_without_crc,
            has_header_crc,
        },
        messages,
    })
}

/// Split a data section into self-describing data messages.
pub fn walk_data_section(data_section: &[u8]) -> Result<Vec<RawMessage>, FitProcessError> {
    let mut offset = 0usize;
    let mut definitions: HashMap<u8, MessageDefinition> = HashMap::new();
    let mut messages = Vec::new();

    while offset < data_section.len() {
        let header = data_section[offset];
        offset += 1;

        if header & 0x80 != 0 {
            return Err(FitProcessError::Unsupported("compressed timestamp headers".into()));
        }

        let is_definition = header & 0x40 != 0;
        let has_developer_data = header & 0x20 != 0;
        let local_message_num = header & 0x0F;

        if is_definition {
            if offset + 5 > data_section.len() {
                return Err(FitProcessError::InvalidHeader(
                    "definition message truncated".into(),
                ));
            }

            let architecture = data_section[offset + 1];
            let global_mesg_num_bytes = [data_section[offset + 2], data_section[offset + 3]];
            let global_mesg_num = if architecture == 0 {
                u16::from_le_bytes(global_mesg_num_bytes)
            } else {
                u16::from_be_bytes(global_mesg_num_bytes)
            };
            let num_fields = data_section[offset + 4] as usize;
            offset += 5;

            let mut fields = Vec::with_capacity(num_fields);
            for _ in 0..num_fields {
                if offset + 3 > data_section.len() {
                    return Err(FitProcessError::InvalidHeader(
                        "field definition truncated".into(),
                    ));
                }
                fields.push(FieldDefinition {
                    number: data_section[offset],
                    size: data_section[offset + 1],
                    base_type: data_section[offset + 2],
                });
                offset += 3;
            }

            let mut developer_fields = Vec::new();
            if has_developer_data {
                let dev_count = *data_section.get(offset).ok_or_else(|| {
                    FitProcessError::InvalidHeader("missing developer count".into())
                })? as usize;
                offset += 1;

                developer_fields = Vec::with_capacity(dev_count);
                for _ in 0..dev_count {
                    if offset + 3 > data_section.len() {
                        return Err(FitProcessError::InvalidHeader(
                            "developer field truncated".into(),
                        ));
                    }
                    developer_fields.push(DeveloperFieldDefinition {
                        number: data_section[offset],
                        size: data_section[offset + 1],
                        developer_index: data_section[offset + 2],
                    });
                    offset += 3;
                }
            }

            definitions.insert(
                local_message_num,
                MessageDefinition {
                    global_mesg_num,
                    architecture,
                    fields,
                    developer_fields,
                },
            );
        } else {
            let definition = definitions.get(&local_message_num).ok_or_else(|| {
                FitProcessError::InvalidHeader("data message missing preceding definition".into())
            })?;

            let size: usize = definition
                .fields
                .iter()
                .map(|field| field.size as usize)
                .chain(
                    definition
                        .developer_fields
                        .iter()
                        .map(|field| field.size as usize),
                )
                .sum();
            if offset + size > data_section.len() {
                return Err(FitProcessError::InvalidHeader(
                    "data message truncated".into(),
                ));
            }

            let payload = data_section[offset..offset + size].to_vec();
            messages.push(RawMessage::new(definition.clone(), payload)?);
            offset += size;
        }
    }

    Ok(messages)
}
