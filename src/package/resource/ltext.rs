//! LTEXT records: a 4-byte header (character count in the low 24 bits, an
//! encoding tag in the high byte) followed by the encoded text. Reads
//! accept the active-codepage, UTF-8, and UTF-16LE tags; emission is
//! always UTF-16LE.

use crate::error::{Error, Result};
use crate::io::SliceReader;
use crate::package::resource::Resource;
use log::warn;

const ENCODING_CODEPAGE: u8 = 0;
const ENCODING_UTF8: u8 = 8;
const ENCODING_UTF16: u8 = 16;

pub const MAX_CHARS: usize = 65_535;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LtextResource {
    pub value: String,
}

impl LtextResource {
    pub fn new<S: Into<String>>(value: S) -> Self {
        Self {
            value: value.into(),
        }
    }
}

impl Resource for LtextResource {
    fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut r = SliceReader::new(data);
        let header = r.read_u32()?;
        let char_count = (header & 0x00FF_FFFF) as usize;
        let encoding = (header >> 24) as u8;
        let text = r.take(r.remaining())?;

        let value = match encoding {
            // The active codepage is treated as ASCII on read.
            ENCODING_CODEPAGE => text.iter().map(|&b| b as char).collect(),
            ENCODING_UTF8 => String::from_utf8(text.to_vec())
                .map_err(|_| Error::MalformedRecord("LTEXT payload is not valid UTF-8".into()))?,
            ENCODING_UTF16 => {
                if text.len() % 2 != 0 {
                    return Err(Error::TruncatedInput(
                        "UTF-16 LTEXT payload has an odd byte count".into(),
                    ));
                }
                let units: Vec<u16> = text
                    .chunks_exact(2)
                    .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                    .collect();
                if units.len() != char_count {
                    warn!(
                        "LTEXT header says {} characters, payload has {}",
                        char_count,
                        units.len()
                    );
                }
                String::from_utf16(&units)
                    .map_err(|_| Error::MalformedRecord("LTEXT payload is not valid UTF-16".into()))?
            }
            other => {
                return Err(Error::MalformedRecord(format!(
                    "unknown LTEXT encoding {}",
                    other
                )))
            }
        };

        Ok(Self { value })
    }

    fn to_bytes(&self) -> Result<Vec<u8>> {
        let units: Vec<u16> = self.value.encode_utf16().collect();
        if units.len() > MAX_CHARS {
            return Err(Error::InvalidArgument(format!(
                "LTEXT is limited to {} characters, got {}",
                MAX_CHARS,
                units.len()
            )));
        }
        let header = units.len() as u32 | ((ENCODING_UTF16 as u32) << 24);
        let mut out = Vec::with_capacity(4 + units.len() * 2);
        out.extend_from_slice(&header.to_le_bytes());
        for unit in units {
            out.extend_from_slice(&unit.to_le_bytes());
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emits_utf16_with_the_char_count_header() {
        let bytes = LtextResource::new("Hi").to_bytes().unwrap();
        assert_eq!(bytes, [0x02, 0x00, 0x00, 0x10, 0x48, 0x00, 0x69, 0x00]);
    }

    #[test]
    fn utf16_round_trip() {
        let original = LtextResource::new("Établissement commercial §");
        let decoded = LtextResource::from_bytes(&original.to_bytes().unwrap()).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn reads_codepage_and_utf8_payloads() {
        let mut ascii = vec![0x02, 0x00, 0x00, 0x00];
        ascii.extend_from_slice(b"Hi");
        assert_eq!(LtextResource::from_bytes(&ascii).unwrap().value, "Hi");

        let mut utf8 = vec![0x02, 0x00, 0x00, 0x08];
        utf8.extend_from_slice("Hé".as_bytes());
        assert_eq!(LtextResource::from_bytes(&utf8).unwrap().value, "Hé");
    }

    #[test]
    fn unknown_encoding_is_malformed() {
        assert!(matches!(
            LtextResource::from_bytes(&[0x00, 0x00, 0x00, 0x04]),
            Err(Error::MalformedRecord(_))
        ));
    }

    #[test]
    fn header_shorter_than_four_bytes_is_truncated() {
        assert!(matches!(
            LtextResource::from_bytes(&[0x01, 0x00]),
            Err(Error::TruncatedInput(_))
        ));
    }

    #[test]
    fn overlong_strings_are_rejected() {
        let long = "x".repeat(MAX_CHARS + 1);
        assert!(matches!(
            LtextResource::new(long).to_bytes(),
            Err(Error::InvalidArgument(_))
        ));
    }
}
