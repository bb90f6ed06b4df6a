//! Big-endian cursor over ROOT's streamer encoding.

use super::error::{Result, RootError};

/// Bit set on the leading u32 of a streamed object when a byte count follows.
pub const BYTE_COUNT_MASK: u32 = 0x4000_0000;

/// Cursor over a borrowed byte slice.
pub struct RBuffer<'a> {
    data: &'a [u8],
    pos: usize,
}

macro_rules! read_be {
    ($name:ident, $ty:ty) => {
        #[doc = concat!("Read a big-endian `", stringify!($ty), "`.")]
        pub fn $name(&mut self) -> Result<$ty> {
            const N: usize = std::mem::size_of::<$ty>();
            let bytes = self.read_bytes(N)?;
            let mut raw = [0u8; N];
            raw.copy_from_slice(bytes);
            Ok(<$ty>::from_be_bytes(raw))
        }
    };
}

impl<'a> RBuffer<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Cursor positioned at `pos`.
    pub fn at(data: &'a [u8], pos: usize) -> Self {
        Self { data, pos }
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn set_pos(&mut self, pos: usize) {
        self.pos = pos;
    }

    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.read_bytes(n).map(|_| ())
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        if n > self.remaining() {
            return Err(RootError::BufferUnderflow {
                offset: self.pos,
                need: n,
                have: self.remaining(),
            });
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    read_be!(read_u8, u8);
    read_be!(read_i8, i8);
    read_be!(read_u16, u16);
    read_be!(read_i16, i16);
    read_be!(read_u32, u32);
    read_be!(read_i32, i32);
    read_be!(read_u64, u64);
    read_be!(read_i64, i64);
    read_be!(read_f32, f32);
    read_be!(read_f64, f64);

    /// Read a length-prefixed string: one length byte, or 255 followed by a u32 length.
    pub fn read_string(&mut self) -> Result<String> {
        let len = match self.read_u8()? {
            255 => self.read_u32()? as usize,
            n => n as usize,
        };
        let bytes = self.read_bytes(len)?;
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }

    /// Read a NUL-terminated string (class names in object tags).
    pub fn read_cstring(&mut self) -> Result<String> {
        let rest = &self.data[self.pos.min(self.data.len())..];
        let len = rest.iter().position(|&b| b == 0).ok_or_else(|| {
            RootError::Deserialization(format!("unterminated C string at {}", self.pos))
        })?;
        let s = String::from_utf8_lossy(&rest[..len]).into_owned();
        self.pos += len + 1;
        Ok(s)
    }

    /// Read a streamer version header.
    ///
    /// Returns the class version and, when a byte count was written, the
    /// absolute position where the object ends.
    pub fn read_version(&mut self) -> Result<(u16, Option<usize>)> {
        let start = self.pos;
        let head = self.read_u32()?;
        if head & BYTE_COUNT_MASK != 0 {
            let count = (head & !BYTE_COUNT_MASK) as usize;
            let version = self.read_u16()?;
            Ok((version, Some(start + 4 + count)))
        } else {
            self.pos = start + 2;
            Ok(((head >> 16) as u16, None))
        }
    }

    /// Skip a versioned object that carries a byte count.
    pub fn skip_versioned(&mut self) -> Result<()> {
        let (_, end) = self.read_version()?;
        if let Some(end) = end {
            self.set_pos(end);
        }
        Ok(())
    }

    /// Read a `TObject` header.
    pub fn read_tobject(&mut self) -> Result<()> {
        let _version = self.read_u16()?;
        let _unique_id = self.read_u32()?;
        let bits = self.read_u32()?;
        // kIsReferenced carries a process-id slot
        if bits & 0x0000_0010 != 0 {
            self.skip(2)?;
        }
        Ok(())
    }

    /// Read a `TNamed` and return `(name, title)`.
    pub fn read_tnamed(&mut self) -> Result<(String, String)> {
        self.read_version()?;
        self.read_tobject()?;
        let name = self.read_string()?;
        let title = self.read_string()?;
        Ok((name, title))
    }
}
