use crate::processing::types::FitProcessError;

pub const LITTLE_ENDIAN: u8 = 0;
pub const BIG_ENDIAN: u8 = 1;

/// FIT base types, keyed by the base type number (the low five bits of the
/// base type byte).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BaseType {
    Enum,
    SInt8,
    UInt8,
    SInt16,
    UInt16,
    SInt32,
    UInt32,
    String,
    Float32,
    Float64,
    UInt8z,
    UInt16z,
    UInt32z,
    Byte,
    SInt64,
    UInt64,
    UInt64z,
}

impl BaseType {
    pub fn from_byte(byte: u8) -> Option<Self> {
        let base_type = match byte & 0x1F {
            0 => BaseType::Enum,
            1 => BaseType::SInt8,
            2 => BaseType::UInt8,
            3 => BaseType::SInt16,
            4 => BaseType::UInt16,
            5 => BaseType::SInt32,
            6 => BaseType::UInt32,
            7 => BaseType::String,
            8 => BaseType::Float32,
            9 => BaseType::Float64,
            10 => BaseType::UInt8z,
            11 => BaseType::UInt16z,
            12 => BaseType::UInt32z,
            13 => BaseType::Byte,
            14 => BaseType::SInt64,
            15 => BaseType::UInt64,
            16 => BaseType::UInt64z,
            _ => return None,
        };
        Some(base_type)
    }

    /// Base type byte as written in definition messages.
    pub fn as_byte(self) -> u8 {
        match self {
            BaseType::Enum => 0x00,
            BaseType::SInt8 => 0x01,
            BaseType::UInt8 => 0x02,
            BaseType::SInt16 => 0x83,
            BaseType::UInt16 => 0x84,
            BaseType::SInt32 => 0x85,
            BaseType::UInt32 => 0x86,
            BaseType::String => 0x07,
            BaseType::Float32 => 0x88,
            BaseType::Float64 => 0x89,
            BaseType::UInt8z => 0x0A,
            BaseType::UInt16z => 0x8B,
            BaseType::UInt32z => 0x8C,
            BaseType::Byte => 0x0D,
            BaseType::SInt64 => 0x8E,
            BaseType::UInt64 => 0x8F,
            BaseType::UInt64z => 0x90,
        }
    }

    pub fn size(self) -> usize {
        match self {
            BaseType::Enum
            | BaseType::SInt8
            | BaseType::UInt8
            | BaseType::String
            | BaseType::UInt8z
            | BaseType::Byte => 1,
            BaseType::SInt16 | BaseType::UInt16 | BaseType::UInt16z => 2,
            BaseType::SInt32
            | BaseType::UInt32
            | BaseType::Float32
            | BaseType::UInt32z => 4,
            BaseType::Float64 | BaseType::SInt64 | BaseType::UInt64 | BaseType::UInt64z => 8,
        }
    }

    /// Raw value marking "no data" for the unsigned types this crate writes.
    fn invalid_unsigned(self) -> u64 {
        match self {
            BaseType::UInt8z | BaseType::UInt16z | BaseType::UInt32z | BaseType::UInt64z => 0,
            _ => u64::MAX >> (64 - 8 * self.size()),
        }
    }

    /// Largest raw value that is not the invalid marker.
    fn max_valid_unsigned(self) -> u64 {
        match self {
            BaseType::UInt8z | BaseType::UInt16z | BaseType::UInt32z | BaseType::UInt64z => {
                u64::MAX >> (64 - 8 * self.size())
            }
            _ => self.invalid_unsigned() - 1,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldDefinition {
    pub number: u8,
    pub size: u8,
    pub base_type: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeveloperFieldDefinition {
    pub number: u8,
    pub size: u8,
    pub developer_index: u8,
}

/// Layout of a data message as declared by its definition message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageDefinition {
    pub global_mesg_num: u16,
    pub architecture: u8,
    pub fields: Vec<FieldDefinition>,
    pub developer_fields: Vec<DeveloperFieldDefinition>,
}

impl MessageDefinition {
    pub fn new(global_mesg_num: u16) -> Self {
        Self {
            global_mesg_num,
            architecture: LITTLE_ENDIAN,
            fields: Vec::new(),
            developer_fields: Vec::new(),
        }
    }

    fn fields_size(&self) -> usize {
        self.fields.iter().map(|field| field.size as usize).sum()
    }

    fn developer_size(&self) -> usize {
        self.developer_fields
            .iter()
            .map(|field| field.size as usize)
            .sum()
    }
}

/// A data message that owns its definition, so it can be moved, edited and
/// re-encoded independently of the file it came from.
///
/// The payload holds the regular field bytes in definition order followed by
/// the developer field bytes.
#[derive(Clone, Debug, PartialEq)]
pub struct RawMessage {
    definition: MessageDefinition,
    payload: Vec<u8>,
}

impl RawMessage {
    pub fn new(definition: MessageDefinition, payload: Vec<u8>) -> Result<Self, FitProcessError> {
        let expected = definition.fields_size() + definition.developer_size();
        if payload.len() != expected {
            return Err(FitProcessError::InvalidHeader(format!(
                "message {} declares {expected} bytes but carries {}",
                definition.global_mesg_num,
                payload.len()
            )));
        }
        Ok(Self {
            definition,
            payload,
        })
    }

    pub fn global_mesg_num(&self) -> u16 {
        self.definition.global_mesg_num
    }

    pub fn definition(&self) -> &MessageDefinition {
        &self.definition
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn has_field(&self, number: u8) -> bool {
        self.locate(number).is_some()
    }

    fn locate(&self, number: u8) -> Option<(usize, usize, FieldDefinition)> {
        let mut offset = 0usize;
        for (idx, field) in self.definition.fields.iter().enumerate() {
            if field.number == number {
                return Some((idx, offset, *field));
            }
            offset += field.size as usize;
        }
        None
    }

    pub fn field_bytes(&self, number: u8) -> Option<&[u8]> {
        self.locate(number)
            .map(|(_, offset, field)| &self.payload[offset..offset + field.size as usize])
    }

    /// First element of a numeric field, without scale. `None` when the field
    /// is absent, non-numeric or holds the invalid marker.
    pub fn read_number(&self, number: u8) -> Option<f64> {
        let (_, offset, field) = self.locate(number)?;
        let base_type = BaseType::from_byte(field.base_type)?;
        let bytes = &self.payload[offset..offset + field.size as usize];
        decode_number(bytes, base_type, self.definition.architecture)
    }

    pub fn read_scaled(&self, number: u8, scale: f64) -> Option<f64> {
        self.read_number(number).map(|raw| raw / scale)
    }

    pub fn read_u8(&self, number: u8) -> Option<u8> {
        self.read_number(number)
            .filter(|value| (0.0..=f64::from(u8::MAX)).contains(value))
            .map(|value| value as u8)
    }

    pub fn read_u32(&self, number: u8) -> Option<u32> {
        self.read_number(number)
            .filter(|value| (0.0..=f64::from(u32::MAX)).contains(value))
            .map(|value| value as u32)
    }

    /// Write an unsigned value. An existing field with the same base type and
    /// size is overwritten in place; otherwise the field is (re)declared with
    /// the given base type at the end of the regular fields.
    pub fn set_unsigned(&mut self, number: u8, base_type: BaseType, value: u64) {
        let clamped = value.min(base_type.max_valid_unsigned());
        self.write_raw(number, base_type, clamped);
    }

    /// Scale, round and clamp a physical value, then write it.
    pub fn set_scaled(&mut self, number: u8, base_type: BaseType, value: f64, scale: f64) {
        let scaled = (value * scale).round();
        let raw = if scaled.is_finite() && scaled > 0.0 {
            scaled.min(base_type.max_valid_unsigned() as f64) as u64
        } else {
            0
        };
        self.set_unsigned(number, base_type, raw);
    }

    /// Write the "no data" marker of `base_type`.
    pub fn set_invalid(&mut self, number: u8, base_type: BaseType) {
        self.write_raw(number, base_type, base_type.invalid_unsigned());
    }

    pub fn set_optional(&mut self, number: u8, base_type: BaseType, value: Option<u64>) {
        match value {
            Some(value) => self.set_unsigned(number, base_type, value),
            None => self.set_invalid(number, base_type),
        }
    }

    fn write_raw(&mut self, number: u8, base_type: BaseType, raw: u64) {
        let size = base_type.size();
        let architecture = self.definition.architecture;

        if let Some((idx, offset, field)) = self.locate(number) {
            if field.base_type == base_type.as_byte() && field.size as usize == size {
                self.payload[offset..offset + size]
                    .copy_from_slice(&unsigned_to_bytes(raw, size, architecture));
                return;
            }
            self.definition.fields.remove(idx);
            self.payload.drain(offset..offset + field.size as usize);
        }

        let insert_at = self.definition.fields_size();
        self.definition.fields.push(FieldDefinition {
            number,
            size: size as u8,
            base_type: base_type.as_byte(),
        });
        let bytes = unsigned_to_bytes(raw, size, architecture);
        self.payload.splice(insert_at..insert_at, bytes);
    }
}

/// Chained construction of fresh messages.
#[derive(Debug, Clone)]
pub struct MessageBuilder {
    message: RawMessage,
}

impl MessageBuilder {
    pub fn new(global_mesg_num: u16) -> Self {
        Self {
            message: RawMessage {
                definition: MessageDefinition::new(global_mesg_num),
                payload: Vec::new(),
            },
        }
    }

    pub fn unsigned(mut self, number: u8, base_type: BaseType, value: u64) -> Self {
        self.message.set_unsigned(number, base_type, value);
        self
    }

    pub fn scaled(mut self, number: u8, base_type: BaseType, value: f64, scale: f64) -> Self {
        self.message.set_scaled(number, base_type, value, scale);
        self
    }

    pub fn optional(mut self, number: u8, base_type: BaseType, value: Option<u64>) -> Self {
        self.message.set_optional(number, base_type, value);
        self
    }

    pub fn build(self) -> RawMessage {
        self.message
    }
}

fn unsigned_from_bytes(bytes: &[u8], architecture: u8) -> u64 {
    let fold = |acc: u64, byte: &u8| (acc << 8) | u64::from(*byte);
    if architecture == BIG_ENDIAN {
        bytes.iter().fold(0, fold)
    } else {
        bytes.iter().rev().fold(0, fold)
    }
}

fn unsigned_to_bytes(value: u64, size: usize, architecture: u8) -> Vec<u8> {
    let mut bytes = value.to_le_bytes()[..size].to_vec();
    if architecture == BIG_ENDIAN {
        bytes.reverse();
    }
    bytes
}

fn decode_number(bytes: &[u8], base_type: BaseType, architecture: u8) -> Option<f64> {
    let size = base_type.size();
    if base_type == BaseType::String || bytes.len() < size {
        return None;
    }
    let raw = unsigned_from_bytes(&bytes[..size], architecture);
    let bits = 8 * size as u32;

    match base_type {
        BaseType::Enum | BaseType::UInt8 | BaseType::Byte | BaseType::UInt16 | BaseType::UInt32
        | BaseType::UInt64 => (raw != base_type.invalid_unsigned()).then_some(raw as f64),
        BaseType::UInt8z | BaseType::UInt16z | BaseType::UInt32z | BaseType::UInt64z => {
            (raw != 0).then_some(raw as f64)
        }
        BaseType::SInt8 | BaseType::SInt16 | BaseType::SInt32 | BaseType::SInt64 => {
            let invalid = (1u64 << (bits - 1)) - 1;
            if raw == invalid {
                return None;
            }
            let shift = 64 - bits;
            Some((((raw << shift) as i64) >> shift) as f64)
        }
        BaseType::Float32 => {
            (raw != u64::from(u32::MAX)).then(|| f64::from(f32::from_bits(raw as u32)))
        }
        BaseType::Float64 => (raw != u64::MAX).then(|| f64::from_bits(raw)),
        BaseType::String => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_little_and_big_endian_fields() {
        let mut definition = MessageDefinition::new(20);
        definition.fields.push(FieldDefinition {
            number: 5,
            size: 4,
            base_type: BaseType::UInt32.as_byte(),
        });
        let little = RawMessage::new(definition.clone(), 1234u32.to_le_bytes().to_vec())
            .expect("payload matches definition");
        assert_eq!(little.read_number(5), Some(1234.0));

        definition.architecture = BIG_ENDIAN;
        let big = RawMessage::new(definition, 1234u32.to_be_bytes().to_vec())
            .expect("payload matches definition");
        assert_eq!(big.read_number(5), Some(1234.0));
    }

    #[test]
    fn invalid_markers_read_as_absent() {
        let message = MessageBuilder::new(20)
            .optional(3, BaseType::UInt8, None)
            .optional(5, BaseType::UInt32, None)
            .build();
        assert!(message.has_field(3));
        assert_eq!(message.read_number(3), None);
        assert_eq!(message.read_number(5), None);
    }

    #[test]
    fn signed_values_are_sign_extended() {
        let mut definition = MessageDefinition::new(20);
        definition.fields.push(FieldDefinition {
            number: 2,
            size: 2,
            base_type: BaseType::SInt16.as_byte(),
        });
        let message = RawMessage::new(definition, (-42i16).to_le_bytes().to_vec())
            .expect("payload matches definition");
        assert_eq!(message.read_number(2), Some(-42.0));
    }

    #[test]
    fn overwriting_a_matching_field_keeps_layout() {
        let mut message = MessageBuilder::new(20)
            .scaled(5, BaseType::UInt32, 10.0, 100.0)
            .unsigned(3, BaseType::UInt8, 140)
            .build();
        let layout = message.definition().clone();

        message.set_scaled(5, BaseType::UInt32, 25.5, 100.0);

        assert_eq!(message.definition(), &layout);
        assert_eq!(message.read_scaled(5, 100.0), Some(25.5));
        assert_eq!(message.read_u8(3), Some(140));
    }

    #[test]
    fn mismatched_field_is_redeclared_before_developer_bytes() {
        let mut definition = MessageDefinition::new(20);
        definition.fields.push(FieldDefinition {
            number: 6,
            size: 1,
            base_type: BaseType::UInt8.as_byte(),
        });
        definition.developer_fields.push(DeveloperFieldDefinition {
            number: 0,
            size: 2,
            developer_index: 0,
        });
        let mut message =
            RawMessage::new(definition, vec![7, 0xAA, 0xBB]).expect("payload matches definition");

        message.set_scaled(6, BaseType::UInt16, 3.5, 1000.0);

        assert_eq!(message.definition().fields.len(), 1);
        assert_eq!(message.definition().fields[0].size, 2);
        assert_eq!(message.read_scaled(6, 1000.0), Some(3.5));
        assert_eq!(&message.payload()[2..], &[0xAA, 0xBB]);
    }

    #[test]
    fn scaled_values_clamp_below_invalid_marker() {
        let message = MessageBuilder::new(20)
            .scaled(6, BaseType::UInt16, 1_000.0, 1000.0)
            .scaled(7, BaseType::UInt16, -3.0, 1000.0)
            .build();
        assert_eq!(message.read_number(6), Some(f64::from(u16::MAX - 1)));
        assert_eq!(message.read_number(7), Some(0.0));
    }

    #[test]
    fn payload_length_must_match_definition() {
        let mut definition = MessageDefinition::new(0);
        definition.fields.push(FieldDefinition {
            number: 0,
            size: 1,
            base_type: BaseType::Enum.as_byte(),
        });
        assert!(RawMessage::new(definition, vec![1, 2]).is_err());
    }
}
