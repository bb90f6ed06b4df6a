//! Top-level `TDirectory` key list.

use super::error::{Result, RootError};
use super::key::Key;
use super::rbuffer::RBuffer;

#[derive(Debug, Clone)]
pub struct Directory {
    keys: Vec<Key>,
}

impl Directory {
    /// Parse the `TDirectory` streamer at `offset` and load its key list.
    pub fn read(file: &[u8], offset: usize) -> Result<Self> {
        if offset >= file.len() {
            return Err(RootError::Deserialization(
                "directory header lies past end of file".into(),
            ));
        }
        let mut r = RBuffer::at(file, offset);
        let version = r.read_u16()?;
        let _ctime = r.read_u32()?;
        let _mtime = r.read_u32()?;
        let _nbytes_keys = r.read_u32()?;
        let _nbytes_name = r.read_u32()?;
        let seek_keys = if version > 1000 {
            let _seek_dir = r.read_u64()?;
            let _seek_parent = r.read_u64()?;
            r.read_u64()?
        } else {
            let _seek_dir = r.read_u32()?;
            let _seek_parent = r.read_u32()?;
            r.read_u32()? as u64
        };
        if seek_keys == 0 {
            return Ok(Directory { keys: Vec::new() });
        }
        Self::read_key_list(file, seek_keys as usize)
    }

    /// The key list is itself stored behind a key, followed by a u32 count.
    fn read_key_list(file: &[u8], seek_keys: usize) -> Result<Self> {
        let mut r = RBuffer::at(file, seek_keys);
        let _header = Key::read(&mut r)?;
        let n = r.read_u32()? as usize;
        let keys = (0..n).map(|_| Key::read(&mut r)).collect::<Result<Vec<_>>>()?;
        Ok(Directory { keys })
    }

    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    /// Highest cycle of the object called `name`.
    pub fn find(&self, name: &str) -> Option<&Key> {
        self.keys
            .iter()
            .filter(|k| k.name == name)
            .max_by_key(|k| k.cycle)
    }
}
