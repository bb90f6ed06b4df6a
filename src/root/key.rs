//! `TKey` records: the headers that locate every object in a ROOT file.

use super::decompress::decompress;
use super::error::{Result, RootError};
use super::rbuffer::RBuffer;

#[derive(Debug, Clone)]
pub struct Key {
    /// Key header plus (compressed) object, in bytes.
    pub n_bytes: u32,
    pub version: u16,
    /// Uncompressed object length.
    pub obj_len: u32,
    pub key_len: u16,
    pub cycle: u16,
    pub seek_key: u64,
    pub class_name: String,
    pub name: String,
    pub title: String,
}

impl Key {
    /// Read a key header at the cursor.
    pub fn read(r: &mut RBuffer) -> Result<Self> {
        let n_bytes = r.read_u32()?;
        let version = r.read_u16()?;
        let obj_len = r.read_u32()?;
        let _datime = r.read_u32()?;
        let key_len = r.read_u16()?;
        let cycle = r.read_u16()?;
        // version > 1000 marks 64-bit seek pointers
        let (seek_key, _seek_pdir) = if version > 1000 {
            (r.read_u64()?, r.read_u64()?)
        } else {
            (r.read_u32()? as u64, r.read_u32()? as u64)
        };
        let class_name = r.read_string()?;
        let name = r.read_string()?;
        let title = r.read_string()?;

        Ok(Key {
            n_bytes,
            version,
            obj_len,
            key_len,
            cycle,
            seek_key,
            class_name,
            name,
            title,
        })
    }

    /// Object bytes following this key, decompressed when needed.
    pub fn payload(&self, file: &[u8]) -> Result<Vec<u8>> {
        let start = self.seek_key as usize;
        let end = start + self.n_bytes as usize;
        let record = file.get(start..end).ok_or(RootError::BufferUnderflow {
            offset: start,
            need: self.n_bytes as usize,
            have: file.len().saturating_sub(start),
        })?;
        let body = record.get(self.key_len as usize..).ok_or_else(|| {
            RootError::Deserialization(format!(
                "key '{}' is shorter than its own header",
                self.name
            ))
        })?;
        if body.len() == self.obj_len as usize {
            Ok(body.to_vec())
        } else {
            decompress(body, self.obj_len as usize)
        }
    }
}
