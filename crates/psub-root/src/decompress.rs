//! Decoding of ROOT compressed key payloads.
//!
//! A compressed payload is a sequence of blocks, each with a 9-byte header:
//! ```text
//! bytes 0-1:  algorithm ("ZL" zlib, "L4" LZ4, "ZS" ZSTD, "XZ" LZMA)
//! byte  2:    method
//! bytes 3-5:  compressed size   (little-endian u24)
//! bytes 6-8:  uncompressed size (little-endian u24)
//! ```

use std::io::{Read, Write};

use crate::error::{Result, RootError};

/// Length of a compression block header.
pub const BLOCK_HEADER_LEN: usize = 9;

/// Largest uncompressed object accepted (1 GiB).
pub const MAX_OBJECT_LEN: usize = 1 << 30;

/// Decompress a key payload into exactly `expected_len` bytes.
pub fn decompress(src: &[u8], expected_len: usize) -> Result<Vec<u8>> {
    if expected_len > MAX_OBJECT_LEN {
        return Err(RootError::Decompression(format!(
            "object of {} bytes exceeds the {} byte limit",
            expected_len, MAX_OBJECT_LEN
        )));
    }

    let mut out = Vec::with_capacity(expected_len);
    let mut offset = 0;

    while out.len() < expected_len {
        let header = src.get(offset..offset + BLOCK_HEADER_LEN).ok_or_else(|| {
            RootError::Decompression(format!(
                "truncated block header at offset {} ({} of {} bytes decoded)",
                offset,
                out.len(),
                expected_len
            ))
        })?;
        let tag = [header[0], header[1]];
        let c_size = read_le24(&header[3..6]);
        let u_size = read_le24(&header[6..9]);
        offset += BLOCK_HEADER_LEN;

        let block = src.get(offset..offset + c_size).ok_or_else(|| {
            RootError::Decompression(format!(
                "block claims {} compressed bytes but only {} remain",
                c_size,
                src.len() - offset
            ))
        })?;

        let decoded = match &tag {
            b"ZL" => decompress_zlib(block, u_size)?,
            b"L4" => decompress_lz4(block, u_size)?,
            b"ZS" => decompress_zstd(block, u_size)?,
            b"XZ" => decompress_xz(block, u_size)?,
            _ => {
                return Err(RootError::Decompression(format!(
                    "unsupported compression algorithm {:?}",
                    String::from_utf8_lossy(&tag)
                )));
            }
        };
        if decoded.len() != u_size {
            return Err(RootError::Decompression(format!(
                "block decoded to {} bytes, header says {}",
                decoded.len(),
                u_size
            )));
        }

        out.extend_from_slice(&decoded);
        offset += c_size;
    }

    if out.len() != expected_len {
        return Err(RootError::Decompression(format!(
            "decoded {} bytes, expected {}",
            out.len(),
            expected_len
        )));
    }
    Ok(out)
}

fn decompress_zlib(data: &[u8], expected: usize) -> Result<Vec<u8>> {
    read_bounded(flate2::read::ZlibDecoder::new(data), expected, "zlib")
}

fn decompress_lz4(data: &[u8], expected: usize) -> Result<Vec<u8>> {
    // 8-byte xxhash64 checksum precedes the LZ4 block; not verified.
    let block = data
        .get(8..)
        .ok_or_else(|| RootError::Decompression("lz4: block shorter than checksum".into()))?;
    lz4_flex::decompress(block, expected)
        .map_err(|e| RootError::Decompression(format!("lz4: {}", e)))
}

fn decompress_zstd(data: &[u8], expected: usize) -> Result<Vec<u8>> {
    let decoder = ruzstd::decoding::StreamingDecoder::new(data)
        .map_err(|e| RootError::Decompression(format!("zstd: {}", e)))?;
    read_bounded(decoder, expected, "zstd")
}

fn decompress_xz(data: &[u8], expected: usize) -> Result<Vec<u8>> {
    let mut out = BoundedWriter { buf: Vec::with_capacity(expected), limit: expected };
    lzma_rs::xz_decompress(&mut std::io::BufReader::new(data), &mut out)
        .map_err(|e| RootError::Decompression(format!("xz: {}", e)))?;
    Ok(out.buf)
}

/// Decode at most `expected + 1` bytes, so an over-long block is caught by the
/// caller's length check instead of being inflated in full.
fn read_bounded(reader: impl Read, expected: usize, codec: &str) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(expected);
    reader
        .take(expected as u64 + 1)
        .read_to_end(&mut out)
        .map_err(|e| RootError::Decompression(format!("{}: {}", codec, e)))?;
    Ok(out)
}

/// `Write` sink that refuses to grow past `limit` bytes.
struct BoundedWriter {
    buf: Vec<u8>,
    limit: usize,
}

impl Write for BoundedWriter {
    fn write(&mut self, data: &[u8]) -> std::io::Result<usize> {
        if self.buf.len() + data.len() > self.limit {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("block decodes to more than {} bytes", self.limit),
            ));
        }
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn read_le24(b: &[u8]) -> usize {
    b[0] as usize | (b[1] as usize) << 8 | (b[2] as usize) << 16
}

/// Wrap already-compressed bytes in a block header.
#[cfg(any(test, feature = "fixtures"))]
pub(crate) fn block(tag: &[u8; 2], method: u8, compressed: &[u8], u_len: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(BLOCK_HEADER_LEN + compressed.len());
    out.extend_from_slice(tag);
    out.push(method);
    out.extend_from_slice(&(compressed.len() as u32).to_le_bytes()[..3]);
    out.extend_from_slice(&(u_len as u32).to_le_bytes()[..3]);
    out.extend_from_slice(compressed);
    out
}
