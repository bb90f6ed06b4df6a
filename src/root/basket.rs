//! Basket decoding: the compressed blocks holding a branch's values.

use super::error::{Result, RootError};
use super::key::Key;
use super::rbuffer::RBuffer;
use super::tree::LeafType;

/// Value bytes of the basket whose key sits at `seek`.
///
/// For variable-length branches the uncompressed buffer ends with an
/// entry-offset table; only the bytes before `fLast` are values.
pub fn read_basket_values(file: &[u8], seek: u64) -> Result<Vec<u8>> {
    let mut r = RBuffer::at(file, seek as usize);
    let key = Key::read(&mut r)?;
    let _version = r.read_u16()?;
    let _buffer_size = r.read_i32()?;
    let _nev_buf_size = r.read_i32()?;
    let _nev_buf = r.read_i32()?;
    let last = r.read_i32()?;

    let mut payload = key.payload(file)?;
    let border = (last as i64 - key.key_len as i64).max(0) as usize;
    if border > payload.len() {
        return Err(RootError::Deserialization(format!(
            "basket at {} ends at {} but holds {} bytes",
            seek,
            border,
            payload.len()
        )));
    }
    payload.truncate(border);
    Ok(payload)
}

/// Running minimum/maximum over decoded values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub min: f64,
    pub max: f64,
    pub count: u64,
}

impl Default for Extent {
    fn default() -> Self {
        Self {
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            count: 0,
        }
    }
}

impl Extent {
    /// Fold every value of `bytes` into the extent.
    pub fn update(&mut self, bytes: &[u8], leaf_type: LeafType) -> Result<()> {
        let size = leaf_type.byte_size();
        if bytes.len() % size != 0 {
            return Err(RootError::Deserialization(format!(
                "{} value bytes are not a multiple of {} ({})",
                bytes.len(),
                size,
                leaf_type
            )));
        }
        for chunk in bytes.chunks_exact(size) {
            let v = leaf_type.decode(chunk);
            if v.is_nan() {
                continue;
            }
            self.min = self.min.min(v);
            self.max = self.max.max(v);
            self.count += 1;
        }
        Ok(())
    }

    /// `(min, max)`, or `(0, 0)` when nothing was seen.
    pub fn bounds(&self) -> (f64, f64) {
        if self.count == 0 {
            (0.0, 0.0)
        } else {
            (self.min, self.max)
        }
    }
}
