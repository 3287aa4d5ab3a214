use crate::processing::parse::FitHeader;
use crate::processing::raw::{MessageDefinition, RawMessage};
use crate::processing::types::FitProcessError;

const LOCAL_MESSAGE_SLOTS: usize = 16;

/// Encode messages into a complete FIT file.
///
/// Every distinct message layout gets a local message number; a definition
/// message is written whenever a message's layout is not currently bound.
/// When all 16 local numbers are taken, the least recently defined one is
/// rebound.
pub fn encode_fit(header: &FitHeader, messages: &[RawMessage]) -> Result<Vec<u8>, FitProcessError> {
    let data_section = encode_data_section(messages);
    frame_data_section(header, &data_section)
}

pub fn encode_data_section(messages: &[RawMessage]) -> Vec<u8> {
    let mut slots: Vec<MessageDefinition> = Vec::with_capacity(LOCAL_MESSAGE_SLOTS);
    let mut next_eviction = 0usize;
    let mut data = Vec::new();

    for message in messages {
        let definition = message.definition();
        let local = match slots.iter().position(|bound| bound == definition) {
            Some(local) => local,
            None => {
                let local = if slots.len() < LOCAL_MESSAGE_SLOTS {
                    slots.push(definition.clone());
                    slots.len() - 1
                } else {
                    let local = next_eviction;
                    slots[local] = definition.clone();
                    next_eviction = (next_eviction + 1) % LOCAL_MESSAGE_SLOTS;
                    local
                };
                write_definition(&mut data, local as u8, definition);
                local
            }
        };

        data.push(local as u8);
        data.extend_from_slice(message.payload());
    }

    data
}

fn write_definition(out: &mut Vec<u8>, local: u8, definition: &MessageDefinition) {
    let has_developer_data = !definition.developer_fields.is_empty();
    let mut header = 0x40 | (local & 0x0F);
    if has_developer_data {
        header |= 0x20;
    }

    out.push(header);
    out.push(0);
    out.push(definition.architecture);
    if definition.architecture == 0 {
        out.extend_from_slice(&definition.global_mesg_num.to_le_bytes());
    } else {
        out.extend_from_slice(&definition.global_mesg_num.to_be_bytes());
    }
    out.push(definition.fields.len() as u8);
    for field in &definition.fields {
        out.push(field.number);
        out.push(field.size);
        out.push(field.base_type);
    }

    if has_developer_data {
        out.push(definition.developer_fields.len() as u8);
        for dev in &definition.developer_fields {
            out.push(dev.number);
            out.push(dev.size);
            out.push(dev.developer_index);
        }
    }
}

/// Combine a header with a new data section.
///
/// The header's declared data length is updated and CRCs are recalculated for
/// both the header (when present) and the data payload.
pub fn frame_data_section(
    header: &FitHeader,
    data_section: &[u8],
) -> Result<Vec<u8>, FitProcessError> {
    let declared_size = usize::from(header.header_without_crc.first().copied().unwrap_or(0));
    let written_size = header.header_without_crc.len() + if header.has_header_crc { 2 } else { 0 };
    if header.header_without_crc.len() < 12 || declared_size != written_size {
        return Err(FitProcessError::InvalidHeader(
            "header size does not match its contents".into(),
        ));
    }

    let mut header_without_crc = header.header_without_crc.clone();
    let data_len: u32 = data_section
        .len()
        .try_into()
        .map_err(|_| FitProcessError::InvalidHeader("data section too large".into()))?;
    header_without_crc[4..8].copy_from_slice(&data_len.to_le_bytes());

    let mut rebuilt = header_without_crc;
    if header.has_header_crc {
        let header_crc = calculate_crc(&rebuilt);
        rebuilt.extend_from_slice(&header_crc.to_le_bytes());
    }

    rebuilt.extend_from_slice(data_section);
    let data_crc = calculate_crc(&rebuilt);
    rebuilt.extend_from_slice(&data_crc.to_le_bytes());

    Ok(rebuilt)
}

/// Compute the standard FIT CRC-16 using the Garmin nibble lookup table.
pub fn calculate_crc(data: &[u8]) -> u16 {
    const CRC_TABLE: [u16; 16] = [
        0x0000, 0xCC01, 0xD801, 0x1400, 0xF001, 0x3C00, 0x2800, 0xE401, 0xA001, 0x6C00, 0x7800,
        0xB401, 0x5000, 0x9C01, 0x8801, 0x4400,
    ];

    data.iter().fold(0u16, |crc, byte| {
        let mut tmp = CRC_TABLE[(crc & 0xF) as usize];
        let mut crc = (crc >> 4) & 0x0FFF;
        crc ^= tmp ^ CRC_TABLE[(byte & 0xF) as usize];
        tmp = CRC_TABLE[(crc & 0xF) as usize];
        crc = (crc >> 4) & 0x0FFF;
        crc ^ tmp ^ CRC_TABLE[((byte >> 4) & 0xF) as usize]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::parse::{parse_fit, walk_data_section};
    use crate::processing::profile::{mesg, record};
    use crate::processing::raw::{BaseType, MessageBuilder};

    fn record_message(ts: u32, hr: u64) -> RawMessage {
        MessageBuilder::new(mesg::RECORD)
            .unsigned(record::TIMESTAMP, BaseType::UInt32, u64::from(ts))
            .unsigned(record::HEART_RATE, BaseType::UInt8, hr)
            .build()
    }

    #[test]
    fn identical_layouts_share_one_definition() {
        let messages = vec![record_message(1, 120), record_message(2, 121)];
        let data = encode_data_section(&messages);

        let definitions = data.iter().filter(|byte| **byte == 0x40).count();
        assert_eq!(definitions, 1);
        assert_eq!(walk_data_section(&data).expect("decodable"), messages);
    }

    #[test]
    fn local_numbers_are_recycled_after_sixteen_layouts() {
        let messages: Vec<RawMessage> = (0..20u8)
            .map(|number| {
                MessageBuilder::new(mesg::EVENT)
                    .unsigned(number, BaseType::UInt8, 1)
                    .build()
            })
            .chain(std::iter::once(record_message(5, 100)))
            .collect();

        let data = encode_data_section(&messages);
        assert_eq!(walk_data_section(&data).expect("decodable"), messages);
    }

    #[test]
    fn crc_of_crc_suffixed_block_is_zero() {
        let mut block = b"FIT payload".to_vec();
        let crc = calculate_crc(&block);
        block.extend_from_slice(&crc.to_le_bytes());
        assert_eq!(calculate_crc(&block), 0);
    }

    #[test]
    fn encoded_file_parses_back() {
        let file_id = MessageBuilder::new(mesg::FILE_ID)
            .unsigned(0, BaseType::Enum, 4)
            .build();
        let messages = vec![file_id, record_message(1_000_000_000, 130)];

        let bytes = encode_fit(&FitHeader::default(), &messages).expect("encodable");
        let parsed = parse_fit(&bytes).expect("valid FIT file");

        assert_eq!(parsed.messages, messages);
        assert_eq!(parsed.header.header_without_crc.len(), 12);
        assert!(parsed.header.has_header_crc);
    }
}
