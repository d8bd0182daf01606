use crate::error::{Error, Result};
use binrw::binrw;
use std::time::{SystemTime, UNIX_EPOCH};

/// The 96-byte DBPF v1.0 file header: the `DBPF` signature, fourteen
/// little-endian u32 fields, and 36 reserved bytes.
#[binrw]
#[derive(Debug, Clone)]
#[br(little)]
#[bw(little)]
pub struct PackageHeader {
    pub magic: [u8; 4], // "DBPF"
    pub major_version: u32,
    pub minor_version: u32,
    pub user_major_version: u32,
    pub user_minor_version: u32,
    pub flags: u32,
    pub date_created: u32,
    pub date_modified: u32,
    pub index_major_version: u32, // 7 for this format generation
    pub entry_count: u32,
    pub index_location: u32,
    pub index_size: u32,
    pub hole_count: u32,
    pub hole_location: u32,
    pub hole_size: u32,
    pub reserved: [u8; 36],
}

impl PackageHeader {
    pub const SIZE: u64 = 96;
    pub const MAGIC: [u8; 4] = *b"DBPF";

    /// Header for a freshly created package. `date_created` is stamped
    /// once, here.
    pub fn new() -> Self {
        Self {
            magic: Self::MAGIC,
            major_version: 1,
            minor_version: 0,
            user_major_version: 0,
            user_minor_version: 0,
            flags: 0,
            date_created: unix_timestamp(),
            date_modified: 0,
            index_major_version: 7,
            entry_count: 0,
            index_location: 0,
            index_size: 0,
            hole_count: 0,
            hole_location: 0,
            hole_size: 0,
            reserved: [0; 36],
        }
    }

    pub fn read<R: std::io::Read + std::io::Seek>(reader: &mut R) -> Result<Self> {
        use binrw::BinReaderExt;
        Ok(reader.read_le()?)
    }

    pub fn write<W: std::io::Write + std::io::Seek>(&self, writer: &mut W) -> Result<()> {
        use binrw::BinWriterExt;
        Ok(writer.write_le(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.magic != Self::MAGIC {
            return Err(Error::InvalidHeader("missing DBPF signature".into()));
        }
        if self.major_version != 1 || self.minor_version != 0 {
            return Err(Error::InvalidHeader(format!(
                "unsupported DBPF version {}.{}",
                self.major_version, self.minor_version
            )));
        }
        if self.index_major_version != 7 {
            return Err(Error::InvalidHeader(format!(
                "unsupported index version {}",
                self.index_major_version
            )));
        }
        if self.index_size != self.entry_count * 20 {
            return Err(Error::InvalidHeader(format!(
                "index size {} does not match {} entries",
                self.index_size, self.entry_count
            )));
        }
        Ok(())
    }
}

impl Default for PackageHeader {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn unix_timestamp() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as u32)
        .unwrap_or(0)
}
