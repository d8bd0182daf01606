use crate::package::entry::Entry;
use binrw::binrw;
use std::fmt;

/// The (type, group, instance) triple identifying a record in a package.
#[binrw]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[br(little)]
#[bw(little)]
pub struct TGI {
    pub type_id: u32,
    pub group_id: u32,
    pub instance_id: u32,
}

impl TGI {
    pub const EMPTY: TGI = TGI::new(0, 0, 0);

    /// Reserved identifier of the compression directory record.
    pub const COMPRESSION_DIRECTORY: TGI = TGI::new(0xE86B1EEF, 0xE86B1EEF, 0x286B1F03);

    pub const fn new(type_id: u32, group_id: u32, instance_id: u32) -> Self {
        Self {
            type_id,
            group_id,
            instance_id,
        }
    }
}

impl fmt::Display for TGI {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "0x{:08X}-0x{:08X}-0x{:08X}",
            self.type_id, self.group_id, self.instance_id
        )
    }
}

/// Lifecycle of an index entry between loads and saves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    /// Loaded from the backing file and untouched.
    Normal,
    /// Added since the last save; location and size are meaningless.
    New,
    /// Payload replaced since the last save.
    Modified,
    /// Marked for removal; dropped by the next save.
    Deleted,
}

/// In-memory record descriptor. The payload slot is filled lazily on first
/// access or when the entry is created in memory.
#[derive(Debug)]
pub struct IndexEntry {
    pub tgi: TGI,
    pub location: u32,
    pub file_size: u32,
    pub state: EntryState,
    pub entry: Option<Entry>,
}

/// The exact 20-byte on-disk index record.
#[binrw]
#[derive(Debug, Clone, Copy)]
#[br(little)]
#[bw(little)]
pub struct RawIndexEntry {
    pub tgi: TGI,
    pub location: u32,
    pub size: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use binrw::{BinReaderExt, BinWriterExt};
    use std::io::Cursor;

    #[test]
    fn raw_entry_is_20_bytes_little_endian() {
        let raw = RawIndexEntry {
            tgi: TGI::new(0x6534284A, 0x12345678, 0x9ABCDEF0),
            location: 96,
            size: 1024,
        };
        let mut cursor = Cursor::new(Vec::new());
        cursor.write_le(&raw).unwrap();
        let bytes = cursor.into_inner();
        assert_eq!(bytes.len(), 20);
        assert_eq!(&bytes[0..4], &0x6534284Au32.to_le_bytes());
        assert_eq!(&bytes[12..16], &96u32.to_le_bytes());

        let reread: RawIndexEntry = Cursor::new(bytes).read_le().unwrap();
        assert_eq!(reread.tgi, raw.tgi);
        assert_eq!(reread.size, 1024);
    }

    #[test]
    fn tgi_equality_is_structural() {
        let a = TGI::new(1, 2, 3);
        assert_eq!(a, TGI::new(1, 2, 3));
        assert_ne!(a, TGI::new(1, 2, 4));
        assert_eq!(TGI::EMPTY, TGI::new(0, 0, 0));
        assert_eq!(
            format!("{}", TGI::new(0xA, 0, 0x2026960B)),
            "0x0000000A-0x00000000-0x2026960B"
        );
    }
}
