//! Decoding of ROOT compression blocks.
//!
//! A compressed object is a sequence of blocks, each with a 9-byte header:
//! a two-letter algorithm tag (`ZL`, `L4`, `ZS`, `XZ`), one method byte, then
//! the compressed and uncompressed sizes as 3-byte little-endian integers.

use std::io::Read;

use super::error::{Result, RootError};

const HEADER_LEN: usize = 9;

/// Decompress `src` into exactly `expected_len` bytes.
pub fn decompress(src: &[u8], expected_len: usize) -> Result<Vec<u8>> {
    // `expected_len` comes from the file; grow past the input size only as
    // blocks actually inflate
    let mut out = Vec::with_capacity(expected_len.min(src.len()));
    let mut offset = 0;

    while out.len() < expected_len {
        if offset + HEADER_LEN > src.len() {
            break;
        }
        let header = &src[offset..offset + HEADER_LEN];
        let tag = [header[0], header[1]];
        let c_size = le24(&header[3..6]);
        let u_size = le24(&header[6..9]);
        offset += HEADER_LEN;

        let payload = src.get(offset..offset + c_size).ok_or_else(|| {
            RootError::Decompression(format!(
                "block of {} bytes overruns input ({} bytes left)",
                c_size,
                src.len() - offset
            ))
        })?;

        let block = match &tag {
            b"ZL" => zlib(payload, u_size)?,
            b"L4" => lz4(payload, u_size)?,
            b"ZS" => zstd(payload, u_size)?,
            b"XZ" => xz(payload, u_size)?,
            other => {
                return Err(RootError::Decompression(format!(
                    "unknown algorithm tag {:?}",
                    String::from_utf8_lossy(other)
                )))
            }
        };
        if block.len() != u_size {
            return Err(RootError::Decompression(format!(
                "block inflated to {} bytes, header says {}",
                block.len(),
                u_size
            )));
        }
        out.extend_from_slice(&block);
        offset += c_size;
    }

    if out.len() != expected_len {
        return Err(RootError::Decompression(format!(
            "inflated {} bytes, expected {}",
            out.len(),
            expected_len
        )));
    }
    Ok(out)
}

fn zlib(data: &[u8], expected: usize) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(expected);
    flate2::read::ZlibDecoder::new(data)
        .read_to_end(&mut out)
        .map_err(|e| RootError::Decompression(format!("zlib: {}", e)))?;
    Ok(out)
}

fn lz4(data: &[u8], expected: usize) -> Result<Vec<u8>> {
    // 8-byte xxhash64 checksum precedes the LZ4 block
    let block = data
        .get(8..)
        .ok_or_else(|| RootError::Decompression("lz4: block shorter than checksum".into()))?;
    lz4_flex::decompress(block, expected)
        .map_err(|e| RootError::Decompression(format!("lz4: {}", e)))
}

fn zstd(data: &[u8], expected: usize) -> Result<Vec<u8>> {
    let mut out = vec![0u8; expected];
    let written = ruzstd::decoding::FrameDecoder::new()
        .decode_all(data, &mut out)
        .map_err(|e| RootError::Decompression(format!("zstd: {}", e)))?;
    out.truncate(written);
    Ok(out)
}

fn xz(data: &[u8], expected: usize) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(expected);
    lzma_rs::xz_decompress(&mut std::io::BufReader::new(data), &mut out)
        .map_err(|e| RootError::Decompression(format!("xz: {}", e)))?;
    Ok(out)
}

fn le24(b: &[u8]) -> usize {
    b[0] as usize | (b[1] as usize) << 8 | (b[2] as usize) << 16
}
