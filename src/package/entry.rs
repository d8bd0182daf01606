use crate::error::{Error, Result};
use crate::qfs;

/// A record payload.
///
/// Holds the raw compressed bytes, the uncompressed bytes, or both once a
/// compressed payload has been inflated (the inflated copy is kept as a
/// cache for the package's lifetime). An entry with neither buffer is an
/// internal invariant violation surfaced as a logic error at access time.
#[derive(Debug)]
pub struct Entry {
    compressed: Option<Vec<u8>>,
    uncompressed: Option<Vec<u8>>,
    compress_on_save: bool,
}

/// Outcome of serializing an entry payload during a save.
pub(crate) struct SavedPayload {
    pub data: Vec<u8>,
    pub compressed: bool,
    pub decompressed_size: u32,
}

impl Entry {
    /// Payload created in memory from uncompressed bytes; `compress` asks
    /// the next save to try the QFS encoder.
    pub(crate) fn new(data: Vec<u8>, compress: bool) -> Self {
        Self {
            compressed: None,
            uncompressed: Some(data),
            compress_on_save: compress,
        }
    }

    /// Payload read from the backing file, tagged by the compression
    /// directory.
    pub(crate) fn from_file(data: Vec<u8>, is_compressed: bool) -> Self {
        if is_compressed {
            Self {
                compressed: Some(data),
                uncompressed: None,
                compress_on_save: false,
            }
        } else {
            Self {
                compressed: None,
                uncompressed: Some(data),
                compress_on_save: false,
            }
        }
    }

    pub(crate) fn from_saved(saved: SavedPayload) -> Self {
        Self::from_file(saved.data, saved.compressed)
    }

    pub fn is_compressed(&self) -> bool {
        self.compressed.is_some()
    }

    /// The record's plain bytes, inflating on first access. Returns a copy;
    /// the cached buffer is never handed out by reference.
    pub fn uncompressed_bytes(&mut self) -> Result<Vec<u8>> {
        if self.uncompressed.is_none() {
            let compressed = self
                .compressed
                .as_deref()
                .ok_or_else(|| Error::Logic("entry holds no payload bytes".into()))?;
            self.uncompressed = Some(qfs::decompress(compressed)?);
        }
        match &self.uncompressed {
            Some(data) => Ok(data.clone()),
            None => Err(Error::Logic("entry holds no payload bytes".into())),
        }
    }

    /// Bytes to store for this payload at save time. Compression is
    /// attempted only when requested, and failure to shrink falls back to
    /// the raw bytes.
    pub(crate) fn save_bytes(&self) -> Result<SavedPayload> {
        if let Some(compressed) = &self.compressed {
            return Ok(SavedPayload {
                decompressed_size: qfs::decompressed_size(compressed)?,
                data: compressed.clone(),
                compressed: true,
            });
        }
        let uncompressed = self
            .uncompressed
            .as_deref()
            .ok_or_else(|| Error::Logic("entry holds no payload bytes".into()))?;
        if self.compress_on_save {
            if let Some(blob) = qfs::compress(uncompressed, true) {
                return Ok(SavedPayload {
                    data: blob,
                    compressed: true,
                    decompressed_size: uncompressed.len() as u32,
                });
            }
        }
        Ok(SavedPayload {
            data: uncompressed.to_vec(),
            compressed: false,
            decompressed_size: uncompressed.len() as u32,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lazy_decompression_returns_copies() {
        let plain = b"lorem ipsum lorem ipsum lorem ipsum lorem ipsum".to_vec();
        let blob = qfs::compress(&plain, true).unwrap();
        let mut entry = Entry::from_file(blob, true);
        assert!(entry.is_compressed());

        let mut first = entry.uncompressed_bytes().unwrap();
        assert_eq!(first, plain);
        first[0] = b'X';
        // Mutating the returned buffer must not poison the cache.
        assert_eq!(entry.uncompressed_bytes().unwrap(), plain);
    }

    #[test]
    fn save_falls_back_to_raw_when_incompressible() {
        let entry = Entry::new(vec![1, 2, 3, 4, 5], true);
        let saved = entry.save_bytes().unwrap();
        assert!(!saved.compressed);
        assert_eq!(saved.data, vec![1, 2, 3, 4, 5]);
        assert_eq!(saved.decompressed_size, 5);
    }

    #[test]
    fn save_compresses_when_it_shrinks() {
        let plain = vec![7u8; 256];
        let entry = Entry::new(plain.clone(), true);
        let saved = entry.save_bytes().unwrap();
        assert!(saved.compressed);
        assert_eq!(saved.decompressed_size, 256);
        assert_eq!(qfs::decompress(&saved.data).unwrap(), plain);
    }
}
