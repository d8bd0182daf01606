use crate::error::Result;
use crate::package::index::TGI;
use binrw::{binrw, BinReaderExt};
use std::io::Cursor;

/// One 16-byte record of the compression directory: the TGI of a
/// compressed entry and its size once inflated.
#[binrw]
#[derive(Debug, Clone, Copy)]
#[br(little)]
#[bw(little)]
pub struct DirectoryEntry {
    pub tgi: TGI,
    pub decompressed_size: u32,
}

impl DirectoryEntry {
    pub const SIZE: u32 = 16;
}

/// Parse the payload of a compression directory record. Trailing bytes
/// that do not fill a whole record are ignored by the caller's count.
pub(crate) fn parse_directory(data: &[u8], count: usize) -> Result<Vec<DirectoryEntry>> {
    let mut cursor = Cursor::new(data);
    let mut entries = Vec::with_capacity(count);
    for _ in 0..count {
        entries.push(cursor.read_le::<DirectoryEntry>()?);
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_records_in_order() {
        let mut data = Vec::new();
        for i in 0..3u32 {
            data.extend_from_slice(&(0x100 + i).to_le_bytes());
            data.extend_from_slice(&(0x200 + i).to_le_bytes());
            data.extend_from_slice(&(0x300 + i).to_le_bytes());
            data.extend_from_slice(&(0x1000 * (i + 1)).to_le_bytes());
        }
        let entries = parse_directory(&data, 3).unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].tgi, TGI::new(0x100, 0x200, 0x300));
        assert_eq!(entries[2].decompressed_size, 0x3000);
    }
}
