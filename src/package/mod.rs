pub mod directory;
pub mod entry;
pub mod header;
pub mod index;
pub mod resource;

use crate::error::{Error, Result};
use binrw::{BinReaderExt, BinWriterExt};
use directory::{parse_directory, DirectoryEntry};
use entry::Entry;
use header::{unix_timestamp, PackageHeader};
use index::{EntryState, IndexEntry, RawIndexEntry, TGI};
use log::{debug, warn};
use std::fs::{self, File};
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// A DBPF archive: header, index, compression directory, and a backing
/// file for lazy payload reads.
///
/// Mutations (`add`, `replace`, `remove`) only touch in-memory state; the
/// next `save`/`save_as` rewrites the whole file, relocating every record
/// and regenerating the compression directory.
pub struct Package {
    pub header: PackageHeader,
    entries: Vec<IndexEntry>,
    directory: Vec<DirectoryEntry>,
    file: Option<File>,
    path: Option<PathBuf>,
    dirty: bool,
}

impl Package {
    /// An empty in-memory package with no backing file.
    pub fn create() -> Self {
        Self {
            header: PackageHeader::new(),
            entries: Vec::new(),
            directory: Vec::new(),
            file: None,
            path: None,
            dirty: false,
        }
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut file = File::open(path)?;
        let header = PackageHeader::read(&mut file)?;
        header.validate()?;

        // Sanity check before pre-allocating the index.
        let file_len = file.metadata()?.len();
        if header.entry_count as u64 * 20 > file_len {
            return Err(Error::InvalidHeader(
                "entry count too large for file size".into(),
            ));
        }

        file.seek(SeekFrom::Start(header.index_location as u64))?;
        let mut entries = Vec::with_capacity(header.entry_count as usize);
        for _ in 0..header.entry_count {
            let raw: RawIndexEntry = file.read_le()?;
            entries.push(IndexEntry {
                tgi: raw.tgi,
                location: raw.location,
                file_size: raw.size,
                state: EntryState::Normal,
                entry: None,
            });
        }

        let mut directory = Vec::new();
        if let Some(dir) = entries
            .iter()
            .find(|e| e.tgi == TGI::COMPRESSION_DIRECTORY)
        {
            if dir.file_size % DirectoryEntry::SIZE != 0 {
                warn!(
                    "compression directory size {} is not a multiple of {}",
                    dir.file_size,
                    DirectoryEntry::SIZE
                );
            }
            let count = (dir.file_size / DirectoryEntry::SIZE) as usize;
            let mut data = vec![0u8; dir.file_size as usize];
            file.seek(SeekFrom::Start(dir.location as u64))?;
            file.read_exact(&mut data)?;
            directory = parse_directory(&data, count)?;
        }
        for record in &directory {
            if !entries.iter().any(|e| e.tgi == record.tgi) {
                warn!(
                    "compression directory lists {} but the index does not",
                    record.tgi
                );
            }
        }

        // The save path streams normal payloads forward from the source
        // file, so keep the index in file order.
        entries.sort_by_key(|e| e.location);
        debug!(
            "opened {} with {} entries ({} compressed)",
            path.display(),
            entries.len(),
            directory.len()
        );

        Ok(Self {
            header,
            entries,
            directory,
            file: Some(file),
            path: Some(path.to_path_buf()),
            dirty: false,
        })
    }

    pub fn index(&self) -> &[IndexEntry] {
        &self.entries
    }

    pub fn compression_directory(&self) -> &[DirectoryEntry] {
        &self.directory
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Append a new entry with an in-memory payload. Duplicate TGIs are
    /// permitted but discouraged.
    pub fn add(
        &mut self,
        type_id: u32,
        group_id: u32,
        instance_id: u32,
        data: Vec<u8>,
        compress: bool,
    ) -> Result<()> {
        if data.is_empty() {
            return Err(Error::InvalidArgument("payload must not be empty".into()));
        }
        let tgi = TGI::new(type_id, group_id, instance_id);
        if self
            .entries
            .iter()
            .any(|e| e.tgi == tgi && e.state != EntryState::Deleted)
        {
            warn!("adding duplicate entry {}", tgi);
        }
        self.entries.push(IndexEntry {
            tgi,
            location: 0,
            file_size: 0,
            state: EntryState::New,
            entry: Some(Entry::new(data, compress)),
        });
        self.dirty = true;
        Ok(())
    }

    /// Swap the payload of an existing entry, marking it modified.
    pub fn replace(
        &mut self,
        type_id: u32,
        group_id: u32,
        instance_id: u32,
        data: Vec<u8>,
        compress: bool,
    ) -> Result<()> {
        if data.is_empty() {
            return Err(Error::InvalidArgument("payload must not be empty".into()));
        }
        let tgi = TGI::new(type_id, group_id, instance_id);
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.tgi == tgi && e.state != EntryState::Deleted)
            .ok_or(Error::NotFound(tgi))?;
        if entry.state == EntryState::Normal {
            entry.state = EntryState::Modified;
        }
        entry.entry = Some(Entry::new(data, compress));
        self.dirty = true;
        Ok(())
    }

    /// Fetch the first live entry matching the TGI, reading its payload
    /// from the backing file on first access.
    pub fn get(&mut self, type_id: u32, group_id: u32, instance_id: u32) -> Result<&mut Entry> {
        let tgi = TGI::new(type_id, group_id, instance_id);
        let idx = self
            .entries
            .iter()
            .position(|e| e.tgi == tgi && e.state != EntryState::Deleted)
            .ok_or(Error::NotFound(tgi))?;

        if self.entries[idx].entry.is_none() {
            let location = self.entries[idx].location;
            let size = self.entries[idx].file_size;
            let is_compressed = self.directory.iter().any(|d| d.tgi == tgi);
            let file = self
                .file
                .as_mut()
                .ok_or_else(|| Error::Logic("entry has no payload and no backing file".into()))?;
            file.seek(SeekFrom::Start(location as u64))?;
            let mut data = vec![0u8; size as usize];
            file.read_exact(&mut data)?;
            self.entries[idx].entry = Some(Entry::from_file(data, is_compressed));
        }

        self.entries[idx]
            .entry
            .as_mut()
            .ok_or_else(|| Error::Logic("payload slot empty after load".into()))
    }

    /// Mark every entry matching the TGI as deleted. Removal of an absent
    /// TGI is a no-op.
    pub fn remove(&mut self, type_id: u32, group_id: u32, instance_id: u32) {
        let tgi = TGI::new(type_id, group_id, instance_id);
        let mut any = false;
        for entry in self
            .entries
            .iter_mut()
            .filter(|e| e.tgi == tgi && e.state != EntryState::Deleted)
        {
            entry.state = EntryState::Deleted;
            any = true;
        }
        if any {
            self.dirty = true;
        } else {
            debug!("remove: no entry matches {}", tgi);
        }
    }

    /// Save over the file this package was opened from.
    pub fn save(&mut self) -> Result<()> {
        let path = self
            .path
            .clone()
            .ok_or_else(|| Error::Logic("package has no backing path; use save_as".into()))?;
        self.save_to(&path)
    }

    pub fn save_as<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.save_to(path.as_ref())
    }

    fn save_to(&mut self, path: &Path) -> Result<()> {
        let over_self = self.file.is_some() && self.path.as_deref() == Some(path);
        if over_self {
            // Write next to the original, then swap the files, so a failed
            // save never clobbers it.
            let tmp_path = {
                let mut os = path.as_os_str().to_owned();
                os.push(".tmp");
                PathBuf::from(os)
            };
            let written: Result<(Vec<IndexEntry>, Vec<DirectoryEntry>)> = (|| {
                let mut out = File::create(&tmp_path)?;
                let written = self.write_contents(&mut out)?;
                out.sync_all()?;
                Ok(written)
            })();
            let (new_entries, new_directory) = match written {
                Ok(v) => v,
                Err(err) => {
                    let _ = fs::remove_file(&tmp_path);
                    return Err(err);
                }
            };
            self.file = None;
            fs::rename(&tmp_path, path)?;
            self.file = Some(File::open(path)?);
            self.commit(new_entries, new_directory);
        } else {
            let mut out = File::create(path)?;
            let (new_entries, new_directory) = self.write_contents(&mut out)?;
            out.sync_all()?;
            drop(out);
            self.file = Some(File::open(path)?);
            self.path = Some(path.to_path_buf());
            self.commit(new_entries, new_directory);
        }
        debug!("saved {} entries to {}", self.entries.len(), path.display());
        Ok(())
    }

    /// The rewrite pipeline: placeholder header, payloads in index order,
    /// regenerated compression directory, index, then the final header.
    fn write_contents(&mut self, out: &mut File) -> Result<(Vec<IndexEntry>, Vec<DirectoryEntry>)> {
        self.header.write(out)?;

        let mut new_entries: Vec<IndexEntry> = Vec::new();
        let mut new_directory: Vec<DirectoryEntry> = Vec::new();

        for i in 0..self.entries.len() {
            let tgi = self.entries[i].tgi;
            let state = self.entries[i].state;
            // The old directory record is regenerated, never preserved.
            if state == EntryState::Deleted || tgi.type_id == TGI::COMPRESSION_DIRECTORY.type_id {
                continue;
            }
            let location = out.stream_position()? as u32;
            match state {
                EntryState::New | EntryState::Modified => {
                    let payload = self.entries[i]
                        .entry
                        .as_ref()
                        .ok_or_else(|| Error::Logic(format!("entry {} has no payload", tgi)))?;
                    let saved = payload.save_bytes()?;
                    std::io::Write::write_all(out, &saved.data)?;
                    if saved.compressed {
                        new_directory.push(DirectoryEntry {
                            tgi,
                            decompressed_size: saved.decompressed_size,
                        });
                    }
                    new_entries.push(IndexEntry {
                        tgi,
                        location,
                        file_size: saved.data.len() as u32,
                        state: EntryState::Normal,
                        entry: Some(Entry::from_saved(saved)),
                    });
                }
                EntryState::Normal => {
                    let size = self.entries[i].file_size;
                    let src = self
                        .file
                        .as_mut()
                        .ok_or_else(|| Error::Logic("package has no backing file".into()))?;
                    src.seek(SeekFrom::Start(self.entries[i].location as u64))?;
                    let mut data = vec![0u8; size as usize];
                    src.read_exact(&mut data)?;
                    std::io::Write::write_all(out, &data)?;
                    if let Some(record) = self.directory.iter().find(|d| d.tgi == tgi) {
                        new_directory.push(*record);
                    }
                    new_entries.push(IndexEntry {
                        tgi,
                        location,
                        file_size: size,
                        state: EntryState::Normal,
                        entry: self.entries[i].entry.take(),
                    });
                }
                EntryState::Deleted => unreachable!(),
            }
        }

        if !new_directory.is_empty() {
            let location = out.stream_position()? as u32;
            for record in &new_directory {
                out.write_le(record)?;
            }
            new_entries.push(IndexEntry {
                tgi: TGI::COMPRESSION_DIRECTORY,
                location,
                file_size: new_directory.len() as u32 * DirectoryEntry::SIZE,
                state: EntryState::Normal,
                entry: None,
            });
        }

        let index_location = out.stream_position()? as u32;
        for entry in &new_entries {
            out.write_le(&RawIndexEntry {
                tgi: entry.tgi,
                location: entry.location,
                size: entry.file_size,
            })?;
        }

        self.header.entry_count = new_entries.len() as u32;
        self.header.index_location = index_location;
        self.header.index_size = self.header.entry_count * 20;
        self.header.date_modified = unix_timestamp();
        out.seek(SeekFrom::Start(0))?;
        self.header.write(out)?;

        Ok((new_entries, new_directory))
    }

    fn commit(&mut self, entries: Vec<IndexEntry>, directory: Vec<DirectoryEntry>) {
        self.entries = entries;
        self.directory = directory;
        self.dirty = false;
    }
}
