//! Exemplar and Cohort records: a typed property bag with a binary and a
//! text wire form. Cohorts differ from exemplars only by signature.
//!
//! The text form is read-only; emission always produces the binary form,
//! with properties serialized in ascending ID order.

use crate::error::{Error, Result};
use crate::io::SliceReader;
use crate::package::index::TGI;
use crate::package::resource::Resource;
use std::collections::BTreeMap;

const SIG_EXEMPLAR_BINARY: &[u8; 8] = b"EQZB1###";
const SIG_COHORT_BINARY: &[u8; 8] = b"CQZB1###";
const SIG_EXEMPLAR_TEXT: &[u8; 8] = b"EQZT1###";
const SIG_COHORT_TEXT: &[u8; 8] = b"CQZT1###";

const KEY_TYPE_SINGLE: u16 = 0x0000;
const KEY_TYPE_ARRAY: u16 = 0x0080;

/// The closed set of property value types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExemplarPropertyDataType {
    Bool,
    Uint8,
    Uint16,
    Uint32,
    Sint32,
    Sint64,
    Float32,
    String,
}

impl ExemplarPropertyDataType {
    pub fn code(self) -> u16 {
        match self {
            Self::Bool => 0x0B00,
            Self::Uint8 => 0x0100,
            Self::Uint16 => 0x0200,
            Self::Uint32 => 0x0300,
            Self::Sint32 => 0x0700,
            Self::Sint64 => 0x0800,
            Self::Float32 => 0x0900,
            Self::String => 0x0C00,
        }
    }

    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            0x0B00 => Some(Self::Bool),
            0x0100 => Some(Self::Uint8),
            0x0200 => Some(Self::Uint16),
            0x0300 => Some(Self::Uint32),
            0x0700 => Some(Self::Sint32),
            0x0800 => Some(Self::Sint64),
            0x0900 => Some(Self::Float32),
            0x0C00 => Some(Self::String),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Bool => "Bool",
            Self::Uint8 => "Uint8",
            Self::Uint16 => "Uint16",
            Self::Uint32 => "Uint32",
            Self::Sint32 => "Sint32",
            Self::Sint64 => "Sint64",
            Self::Float32 => "Float32",
            Self::String => "String",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Bool" => Some(Self::Bool),
            "Uint8" => Some(Self::Uint8),
            "Uint16" => Some(Self::Uint16),
            "Uint32" => Some(Self::Uint32),
            "Sint32" => Some(Self::Sint32),
            "Sint64" => Some(Self::Sint64),
            "Float32" => Some(Self::Float32),
            "String" => Some(Self::String),
            _ => None,
        }
    }

    fn value_size(self) -> usize {
        match self {
            Self::Bool | Self::Uint8 | Self::String => 1,
            Self::Uint16 => 2,
            Self::Uint32 | Self::Sint32 | Self::Float32 => 4,
            Self::Sint64 => 8,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExemplarPropertyValue {
    Bool(Vec<bool>),
    Uint8(Vec<u8>),
    Uint16(Vec<u16>),
    Uint32(Vec<u32>),
    Sint32(Vec<i32>),
    Sint64(Vec<i64>),
    Float32(Vec<f32>),
    String(String),
}

impl ExemplarPropertyValue {
    pub fn data_type(&self) -> ExemplarPropertyDataType {
        match self {
            Self::Bool(_) => ExemplarPropertyDataType::Bool,
            Self::Uint8(_) => ExemplarPropertyDataType::Uint8,
            Self::Uint16(_) => ExemplarPropertyDataType::Uint16,
            Self::Uint32(_) => ExemplarPropertyDataType::Uint32,
            Self::Sint32(_) => ExemplarPropertyDataType::Sint32,
            Self::Sint64(_) => ExemplarPropertyDataType::Sint64,
            Self::Float32(_) => ExemplarPropertyDataType::Float32,
            Self::String(_) => ExemplarPropertyDataType::String,
        }
    }

    /// Number of stored values; for strings, the byte length.
    pub fn arity(&self) -> usize {
        match self {
            Self::Bool(v) => v.len(),
            Self::Uint8(v) => v.len(),
            Self::Uint16(v) => v.len(),
            Self::Uint32(v) => v.len(),
            Self::Sint32(v) => v.len(),
            Self::Sint64(v) => v.len(),
            Self::Float32(v) => v.len(),
            Self::String(s) => s.len(),
        }
    }
}

/// One property: a 32-bit ID and a typed value list.
///
/// `rep_count` is 0 for a single scalar and N for an array of N values;
/// strings always carry their byte length. An array of one re-encodes as
/// an array, which keeps re-emission byte-identical.
#[derive(Debug, Clone, PartialEq)]
pub struct ExemplarProperty {
    pub id: u32,
    value: ExemplarPropertyValue,
    rep_count: u32,
}

impl ExemplarProperty {
    pub fn new(id: u32, value: ExemplarPropertyValue) -> Result<Self> {
        let rep_count = match &value {
            ExemplarPropertyValue::String(s) => {
                if !s.is_ascii() {
                    return Err(Error::InvalidArgument(
                        "string properties must be ASCII".into(),
                    ));
                }
                s.len() as u32
            }
            other => {
                if other.arity() == 0 {
                    return Err(Error::InvalidArgument("value list is empty".into()));
                }
                if other.arity() > 1 {
                    other.arity() as u32
                } else {
                    0
                }
            }
        };
        Ok(Self {
            id,
            value,
            rep_count,
        })
    }

    fn with_rep_count(id: u32, value: ExemplarPropertyValue, rep_count: u32) -> Self {
        Self {
            id,
            value,
            rep_count,
        }
    }

    pub fn value(&self) -> &ExemplarPropertyValue {
        &self.value
    }

    pub fn rep_count(&self) -> u32 {
        self.rep_count
    }

    pub fn data_type(&self) -> ExemplarPropertyDataType {
        self.value.data_type()
    }

    fn is_array(&self) -> bool {
        self.rep_count > 0 || self.data_type() == ExemplarPropertyDataType::String
    }

    fn decode(r: &mut SliceReader<'_>) -> Result<Self> {
        let id = r.read_u32()?;
        let code = r.read_u16()?;
        let data_type = ExemplarPropertyDataType::from_code(code).ok_or_else(|| {
            Error::MalformedRecord(format!(
                "unknown property type tag 0x{:04X} in property 0x{:08X}",
                code, id
            ))
        })?;
        let key_type = r.read_u16()?;
        let _unused = r.read_u8()?;

        let (rep_count, count) = match key_type {
            KEY_TYPE_SINGLE => (0u32, 1usize),
            KEY_TYPE_ARRAY => {
                let n = r.read_i32()?;
                if n < 0 {
                    return Err(Error::MalformedRecord(format!(
                        "negative rep count in property 0x{:08X}",
                        id
                    )));
                }
                (n as u32, n as usize)
            }
            other => {
                return Err(Error::MalformedRecord(format!(
                    "bad key type 0x{:04X} in property 0x{:08X}",
                    other, id
                )))
            }
        };

        if count * data_type.value_size() > r.remaining() {
            return Err(Error::TruncatedInput(format!(
                "property 0x{:08X} claims {} values but the record ends",
                id, count
            )));
        }

        let value = match data_type {
            ExemplarPropertyDataType::Bool => {
                let mut v = Vec::with_capacity(count);
                for _ in 0..count {
                    v.push(r.read_u8()? != 0);
                }
                ExemplarPropertyValue::Bool(v)
            }
            ExemplarPropertyDataType::Uint8 => {
                ExemplarPropertyValue::Uint8(r.take(count)?.to_vec())
            }
            ExemplarPropertyDataType::Uint16 => {
                let mut v = Vec::with_capacity(count);
                for _ in 0..count {
                    v.push(r.read_u16()?);
                }
                ExemplarPropertyValue::Uint16(v)
            }
            ExemplarPropertyDataType::Uint32 => {
                let mut v = Vec::with_capacity(count);
                for _ in 0..count {
                    v.push(r.read_u32()?);
                }
                ExemplarPropertyValue::Uint32(v)
            }
            ExemplarPropertyDataType::Sint32 => {
                let mut v = Vec::with_capacity(count);
                for _ in 0..count {
                    v.push(r.read_i32()?);
                }
                ExemplarPropertyValue::Sint32(v)
            }
            ExemplarPropertyDataType::Sint64 => {
                let mut v = Vec::with_capacity(count);
                for _ in 0..count {
                    v.push(r.read_i64()?);
                }
                ExemplarPropertyValue::Sint64(v)
            }
            ExemplarPropertyDataType::Float32 => {
                let mut v = Vec::with_capacity(count);
                for _ in 0..count {
                    v.push(r.read_f32()?);
                }
                ExemplarPropertyValue::Float32(v)
            }
            ExemplarPropertyDataType::String => {
                let bytes = r.take(count)?;
                ExemplarPropertyValue::String(String::from_utf8_lossy(bytes).into_owned())
            }
        };

        Ok(Self::with_rep_count(id, value, rep_count))
    }

    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.id.to_le_bytes());
        out.extend_from_slice(&self.data_type().code().to_le_bytes());
        let key_type = if self.is_array() {
            KEY_TYPE_ARRAY
        } else {
            KEY_TYPE_SINGLE
        };
        out.extend_from_slice(&key_type.to_le_bytes());
        out.push(0);
        if self.is_array() {
            out.extend_from_slice(&(self.value.arity() as i32).to_le_bytes());
        }
        match &self.value {
            ExemplarPropertyValue::Bool(v) => {
                for &b in v {
                    out.push(b as u8);
                }
            }
            ExemplarPropertyValue::Uint8(v) => out.extend_from_slice(v),
            ExemplarPropertyValue::Uint16(v) => {
                for x in v {
                    out.extend_from_slice(&x.to_le_bytes());
                }
            }
            ExemplarPropertyValue::Uint32(v) => {
                for x in v {
                    out.extend_from_slice(&x.to_le_bytes());
                }
            }
            ExemplarPropertyValue::Sint32(v) => {
                for x in v {
                    out.extend_from_slice(&x.to_le_bytes());
                }
            }
            ExemplarPropertyValue::Sint64(v) => {
                for x in v {
                    out.extend_from_slice(&x.to_le_bytes());
                }
            }
            ExemplarPropertyValue::Float32(v) => {
                for x in v {
                    out.extend_from_slice(&x.to_le_bytes());
                }
            }
            ExemplarPropertyValue::String(s) => out.extend_from_slice(s.as_bytes()),
        }
    }
}

/// An exemplar or cohort: a parent reference and a property bag ordered by
/// property ID.
#[derive(Debug)]
pub struct ExemplarResource {
    pub is_cohort: bool,
    pub parent_cohort: TGI,
    properties: BTreeMap<u32, ExemplarProperty>,
}

impl ExemplarResource {
    pub fn new(is_cohort: bool, parent_cohort: TGI) -> Self {
        Self {
            is_cohort,
            parent_cohort,
            properties: BTreeMap::new(),
        }
    }

    /// Properties in ascending ID order.
    pub fn properties(&self) -> impl Iterator<Item = &ExemplarProperty> {
        self.properties.values()
    }

    pub fn property(&self, id: u32) -> Option<&ExemplarProperty> {
        self.properties.get(&id)
    }

    /// Insert or replace; returns the previous property with this ID.
    pub fn set_property(&mut self, property: ExemplarProperty) -> Option<ExemplarProperty> {
        self.properties.insert(property.id, property)
    }

    pub fn remove_property(&mut self, id: u32) -> Option<ExemplarProperty> {
        self.properties.remove(&id)
    }

    pub fn property_count(&self) -> usize {
        self.properties.len()
    }

    fn from_binary(data: &[u8], is_cohort: bool) -> Result<Self> {
        let mut r = SliceReader::new(data);
        let parent_cohort = TGI::new(r.read_u32()?, r.read_u32()?, r.read_u32()?);
        let count = r.read_i32()?;
        if count < 0 {
            return Err(Error::MalformedRecord("negative property count".into()));
        }
        let mut properties = BTreeMap::new();
        for _ in 0..count {
            let property = ExemplarProperty::decode(&mut r)?;
            properties.insert(property.id, property);
        }
        Ok(Self {
            is_cohort,
            parent_cohort,
            properties,
        })
    }

    fn from_text(data: &[u8], is_cohort: bool) -> Result<Self> {
        match data.get(8) {
            Some(&b'\r') | Some(&b'\n') => {}
            _ => {
                return Err(Error::MalformedRecord(
                    "missing newline after text exemplar signature".into(),
                ))
            }
        }
        let body = String::from_utf8_lossy(&data[8..]);
        let mut lines = body.lines().map(str::trim).filter(|l| !l.is_empty());

        let parent_line = lines
            .next()
            .ok_or_else(|| Error::MalformedRecord("missing ParentCohort line".into()))?;
        let parent_cohort = parse_parent_cohort(parent_line)?;

        let count_line = lines
            .next()
            .ok_or_else(|| Error::MalformedRecord("missing PropCount line".into()))?;
        let count = count_line
            .strip_prefix("PropCount=")
            .ok_or_else(|| Error::MalformedRecord("missing PropCount line".into()))
            .and_then(parse_hex_u32)?;

        let mut properties = BTreeMap::new();
        for _ in 0..count {
            let line = lines.next().ok_or_else(|| {
                Error::MalformedRecord(format!(
                    "PropCount says {} properties but the record has fewer lines",
                    count
                ))
            })?;
            let property = parse_property_line(line)?;
            properties.insert(property.id, property);
        }

        Ok(Self {
            is_cohort,
            parent_cohort,
            properties,
        })
    }
}

impl Resource for ExemplarResource {
    fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < 8 {
            return Err(Error::TruncatedInput(
                "exemplar record shorter than its signature".into(),
            ));
        }
        let signature: &[u8; 8] = data[0..8].try_into().map_err(|_| {
            Error::TruncatedInput("exemplar record shorter than its signature".into())
        })?;
        match signature {
            s if s == SIG_EXEMPLAR_BINARY => Self::from_binary(&data[8..], false),
            s if s == SIG_COHORT_BINARY => Self::from_binary(&data[8..], true),
            s if s == SIG_EXEMPLAR_TEXT => Self::from_text(data, false),
            s if s == SIG_COHORT_TEXT => Self::from_text(data, true),
            _ => Err(Error::MalformedRecord(format!(
                "unknown exemplar signature {:?}",
                String::from_utf8_lossy(signature)
            ))),
        }
    }

    /// Emission is binary-only, properties ascending by ID.
    fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        out.extend_from_slice(if self.is_cohort {
            SIG_COHORT_BINARY
        } else {
            SIG_EXEMPLAR_BINARY
        });
        out.extend_from_slice(&self.parent_cohort.type_id.to_le_bytes());
        out.extend_from_slice(&self.parent_cohort.group_id.to_le_bytes());
        out.extend_from_slice(&self.parent_cohort.instance_id.to_le_bytes());
        out.extend_from_slice(&(self.properties.len() as i32).to_le_bytes());
        for property in self.properties.values() {
            property.encode(&mut out);
        }
        Ok(out)
    }
}

fn parse_hex_u32(s: &str) -> Result<u32> {
    let s = s.trim();
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    u32::from_str_radix(digits, 16)
        .map_err(|_| Error::MalformedRecord(format!("bad hex number {:?}", s)))
}

fn parse_hex_u64(s: &str) -> Result<u64> {
    let s = s.trim();
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    u64::from_str_radix(digits, 16)
        .map_err(|_| Error::MalformedRecord(format!("bad hex number {:?}", s)))
}

/// `ParentCohort=Key:{<group>,<instance>,<type>}` — the text form orders
/// the triple group, instance, type.
fn parse_parent_cohort(line: &str) -> Result<TGI> {
    let inner = line
        .strip_prefix("ParentCohort=Key:{")
        .and_then(|s| s.strip_suffix('}'))
        .ok_or_else(|| Error::MalformedRecord(format!("bad ParentCohort line {:?}", line)))?;
    let mut fields = inner.split(',');
    let group = fields
        .next()
        .ok_or_else(|| Error::MalformedRecord("ParentCohort key too short".into()))
        .and_then(parse_hex_u32)?;
    let instance = fields
        .next()
        .ok_or_else(|| Error::MalformedRecord("ParentCohort key too short".into()))
        .and_then(parse_hex_u32)?;
    let type_id = fields
        .next()
        .ok_or_else(|| Error::MalformedRecord("ParentCohort key too short".into()))
        .and_then(parse_hex_u32)?;
    if fields.next().is_some() {
        return Err(Error::MalformedRecord("ParentCohort key too long".into()));
    }
    Ok(TGI::new(type_id, group, instance))
}

/// `0x<id>:{"<name>"}=<type>:<rep>:{<values>}`; the name is display-only
/// and discarded.
fn parse_property_line(line: &str) -> Result<ExemplarProperty> {
    let malformed = || Error::MalformedRecord(format!("bad property line {:?}", line));

    let (id_part, rest) = line.split_once(":{").ok_or_else(malformed)?;
    let id = parse_hex_u32(id_part)?;
    let rest = rest.strip_prefix('"').ok_or_else(malformed)?;
    let (_name, rest) = rest.split_once("\"}=").ok_or_else(malformed)?;

    let mut parts = rest.splitn(3, ':');
    let type_name = parts.next().ok_or_else(malformed)?;
    let rep_str = parts.next().ok_or_else(malformed)?;
    let values_part = parts.next().ok_or_else(malformed)?;

    let data_type = ExemplarPropertyDataType::from_name(type_name)
        .ok_or_else(|| Error::MalformedRecord(format!("unknown property type {:?}", type_name)))?;
    let rep = parse_hex_u32(rep_str)?;
    let inner = values_part
        .strip_prefix('{')
        .and_then(|s| s.strip_suffix('}'))
        .ok_or_else(malformed)?;

    if data_type == ExemplarPropertyDataType::String {
        let text = inner
            .trim()
            .strip_prefix('"')
            .and_then(|s| s.strip_suffix('"'))
            .ok_or_else(malformed)?;
        let rep_count = text.len() as u32;
        return Ok(ExemplarProperty::with_rep_count(
            id,
            ExemplarPropertyValue::String(text.to_string()),
            rep_count,
        ));
    }

    // A rep count of 0 still carries one value.
    let expected = if rep == 0 { 1 } else { rep as usize };
    let tokens: Vec<&str> = if inner.trim().is_empty() {
        Vec::new()
    } else {
        inner.split(',').map(str::trim).collect()
    };
    if tokens.len() != expected {
        return Err(Error::MalformedRecord(format!(
            "property 0x{:08X} declares {} values but lists {}",
            id,
            expected,
            tokens.len()
        )));
    }

    let value = match data_type {
        ExemplarPropertyDataType::Bool => ExemplarPropertyValue::Bool(
            tokens
                .iter()
                .map(|t| parse_hex_u32(t).map(|v| v != 0))
                .collect::<Result<_>>()?,
        ),
        ExemplarPropertyDataType::Uint8 => ExemplarPropertyValue::Uint8(
            tokens
                .iter()
                .map(|t| {
                    parse_hex_u32(t).and_then(|v| {
                        u8::try_from(v).map_err(|_| {
                            Error::MalformedRecord(format!("Uint8 value out of range: {:?}", t))
                        })
                    })
                })
                .collect::<Result<_>>()?,
        ),
        ExemplarPropertyDataType::Uint16 => ExemplarPropertyValue::Uint16(
            tokens
                .iter()
                .map(|t| {
                    parse_hex_u32(t).and_then(|v| {
                        u16::try_from(v).map_err(|_| {
                            Error::MalformedRecord(format!("Uint16 value out of range: {:?}", t))
                        })
                    })
                })
                .collect::<Result<_>>()?,
        ),
        ExemplarPropertyDataType::Uint32 => ExemplarPropertyValue::Uint32(
            tokens
                .iter()
                .map(|t| parse_hex_u32(t))
                .collect::<Result<_>>()?,
        ),
        ExemplarPropertyDataType::Sint32 => ExemplarPropertyValue::Sint32(
            tokens
                .iter()
                .map(|t| parse_hex_u32(t).map(|v| v as i32))
                .collect::<Result<_>>()?,
        ),
        ExemplarPropertyDataType::Sint64 => ExemplarPropertyValue::Sint64(
            tokens
                .iter()
                .map(|t| parse_hex_u64(t).map(|v| v as i64))
                .collect::<Result<_>>()?,
        ),
        ExemplarPropertyDataType::Float32 => ExemplarPropertyValue::Float32(
            tokens
                .iter()
                .map(|t| {
                    t.parse::<f32>().map_err(|_| {
                        Error::MalformedRecord(format!("bad float value {:?}", t))
                    })
                })
                .collect::<Result<_>>()?,
        ),
        ExemplarPropertyDataType::String => unreachable!(),
    };

    Ok(ExemplarProperty::with_rep_count(id, value, rep))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ExemplarResource {
        let mut exemplar = ExemplarResource::new(false, TGI::new(0xA, 0xB, 0xC));
        exemplar.set_property(
            ExemplarProperty::new(
                0x10,
                ExemplarPropertyValue::Uint32(vec![0xDEADBEEF, 0x1]),
            )
            .unwrap(),
        );
        exemplar.set_property(
            ExemplarProperty::new(0x20, ExemplarPropertyValue::String("abc".into())).unwrap(),
        );
        exemplar.set_property(
            ExemplarProperty::new(0x30, ExemplarPropertyValue::Bool(vec![true])).unwrap(),
        );
        exemplar
    }

    #[test]
    fn binary_encoding_matches_the_wire_layout() {
        let bytes = sample().to_bytes().unwrap();
        let mut expected = Vec::new();
        expected.extend_from_slice(b"EQZB1###");
        expected.extend_from_slice(&[0x0A, 0, 0, 0, 0x0B, 0, 0, 0, 0x0C, 0, 0, 0]);
        expected.extend_from_slice(&[3, 0, 0, 0]);
        // 0x10: Uint32 array of two
        expected.extend_from_slice(&[0x10, 0, 0, 0, 0x00, 0x03, 0x80, 0x00, 0x00]);
        expected.extend_from_slice(&[2, 0, 0, 0, 0xEF, 0xBE, 0xAD, 0xDE, 1, 0, 0, 0]);
        // 0x20: String "abc"
        expected.extend_from_slice(&[0x20, 0, 0, 0, 0x00, 0x0C, 0x80, 0x00, 0x00]);
        expected.extend_from_slice(&[3, 0, 0, 0, b'a', b'b', b'c']);
        // 0x30: single Bool
        expected.extend_from_slice(&[0x30, 0, 0, 0, 0x00, 0x0B, 0x00, 0x00, 0x00, 1]);
        assert_eq!(bytes, expected);
    }

    #[test]
    fn binary_round_trip_preserves_fields_and_order() {
        let bytes = sample().to_bytes().unwrap();
        let decoded = ExemplarResource::from_bytes(&bytes).unwrap();
        assert!(!decoded.is_cohort);
        assert_eq!(decoded.parent_cohort, TGI::new(0xA, 0xB, 0xC));
        let ids: Vec<u32> = decoded.properties().map(|p| p.id).collect();
        assert_eq!(ids, vec![0x10, 0x20, 0x30]);
        assert_eq!(
            decoded.property(0x10).unwrap().value(),
            &ExemplarPropertyValue::Uint32(vec![0xDEADBEEF, 0x1])
        );
        assert_eq!(
            decoded.property(0x20).unwrap().value(),
            &ExemplarPropertyValue::String("abc".into())
        );
        assert_eq!(
            decoded.property(0x30).unwrap().value(),
            &ExemplarPropertyValue::Bool(vec![true])
        );
        assert_eq!(decoded.property(0x30).unwrap().rep_count(), 0);
        // Re-encoding an already-sorted record is byte-identical.
        assert_eq!(decoded.to_bytes().unwrap(), bytes);
    }

    #[test]
    fn cohort_signature_round_trips() {
        let cohort = ExemplarResource::new(true, TGI::EMPTY);
        let bytes = cohort.to_bytes().unwrap();
        assert_eq!(&bytes[0..8], b"CQZB1###");
        assert!(ExemplarResource::from_bytes(&bytes).unwrap().is_cohort);
    }

    #[test]
    fn rep_one_array_re_encodes_as_array() {
        let mut bytes = ExemplarResource::new(false, TGI::EMPTY).to_bytes().unwrap();
        bytes[20..24].copy_from_slice(&1i32.to_le_bytes());
        // Uint32 array with rep count 1.
        bytes.extend_from_slice(&[0x44, 0, 0, 0, 0x00, 0x03, 0x80, 0x00, 0x00]);
        bytes.extend_from_slice(&[1, 0, 0, 0, 0x2A, 0, 0, 0]);

        let decoded = ExemplarResource::from_bytes(&bytes).unwrap();
        assert_eq!(decoded.property(0x44).unwrap().rep_count(), 1);
        assert_eq!(decoded.to_bytes().unwrap(), bytes);
    }

    #[test]
    fn text_form_parses_to_the_equivalent_record() {
        let text = b"EQZT1###\r\n\
ParentCohort=Key:{0x0000000B,0x0000000C,0x0000000A}\r\n\
PropCount=0x00000003\r\n\
0x00000010:{\"Values\"}=Uint32:2:{0xDEADBEEF,0x00000001}\r\n\
0x00000020:{\"Label\"}=String:3:{\"abc\"}\r\n\
0x00000030:{\"Flag\"}=Bool:0:{0x1}\r\n";
        let decoded = ExemplarResource::from_bytes(text).unwrap();
        assert_eq!(decoded.parent_cohort, TGI::new(0xA, 0xB, 0xC));
        assert_eq!(decoded.to_bytes().unwrap(), sample().to_bytes().unwrap());
    }

    #[test]
    fn text_without_newline_after_signature_is_malformed() {
        assert!(matches!(
            ExemplarResource::from_bytes(b"EQZT1###ParentCohort=Key:{0x0,0x0,0x0}"),
            Err(Error::MalformedRecord(_))
        ));
    }

    #[test]
    fn unknown_signature_is_malformed() {
        assert!(matches!(
            ExemplarResource::from_bytes(b"XQZB1###extra"),
            Err(Error::MalformedRecord(_))
        ));
    }

    #[test]
    fn bad_key_type_is_malformed() {
        let mut bytes = ExemplarResource::new(false, TGI::EMPTY).to_bytes().unwrap();
        bytes[20..24].copy_from_slice(&1i32.to_le_bytes());
        bytes.extend_from_slice(&[0x44, 0, 0, 0, 0x00, 0x03, 0x77, 0x00, 0x00, 0x2A, 0, 0, 0]);
        assert!(matches!(
            ExemplarResource::from_bytes(&bytes),
            Err(Error::MalformedRecord(_))
        ));
    }

    #[test]
    fn empty_value_list_is_rejected() {
        assert!(matches!(
            ExemplarProperty::new(0x1, ExemplarPropertyValue::Uint32(Vec::new())),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn float_values_survive_a_round_trip() {
        let mut exemplar = ExemplarResource::new(false, TGI::EMPTY);
        exemplar.set_property(
            ExemplarProperty::new(
                0x99,
                ExemplarPropertyValue::Float32(vec![1.5, -0.25, 1024.0]),
            )
            .unwrap(),
        );
        let bytes = exemplar.to_bytes().unwrap();
        let decoded = ExemplarResource::from_bytes(&bytes).unwrap();
        assert_eq!(
            decoded.property(0x99).unwrap().value(),
            &ExemplarPropertyValue::Float32(vec![1.5, -0.25, 1024.0])
        );
    }
}
