//! Cursor over ROOT's big-endian streamer encoding.

use crate::error::{Result, RootError};

/// Set in the leading u32 of a streamed object when a byte count follows.
pub const BYTE_COUNT_MASK: u32 = 0x4000_0000;

/// `TObject::fBits` flag: a 2-byte process id follows the bits.
const IS_REFERENCED: u32 = 1 << 4;

macro_rules! be_reader {
    ($(#[$doc:meta] $name:ident -> $ty:ty),* $(,)?) => {
        $(
            #[$doc]
            #[inline]
            pub fn $name(&mut self) -> Result<$ty> {
                const N: usize = std::mem::size_of::<$ty>();
                let b = self.read_bytes(N)?;
                let mut arr = [0u8; N];
                arr.copy_from_slice(b);
                Ok(<$ty>::from_be_bytes(arr))
            }
        )*
    };
}

/// Read cursor over a byte slice.
pub struct RBuffer<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> RBuffer<'a> {
    /// Cursor at offset 0.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current offset.
    #[inline]
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Bytes left after the cursor.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    /// Move the cursor to an absolute offset (at most the buffer length).
    pub fn seek(&mut self, pos: usize) -> Result<()> {
        if pos > self.data.len() {
            return Err(RootError::BufferUnderflow {
                offset: self.pos,
                need: pos.saturating_sub(self.pos),
                have: self.remaining(),
            });
        }
        self.pos = pos;
        Ok(())
    }

    /// Advance by `n` bytes.
    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.read_bytes(n).map(|_| ())
    }

    /// Borrow the next `n` bytes and advance past them.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self.pos.checked_add(n).filter(|&e| e <= self.data.len()).ok_or_else(|| {
            RootError::BufferUnderflow { offset: self.pos, need: n, have: self.remaining() }
        })?;
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    be_reader! {
        /// Read a u8.
        read_u8 -> u8,
        /// Read a big-endian u16.
        read_u16 -> u16,
        /// Read a big-endian i16.
        read_i16 -> i16,
        /// Read a big-endian u32.
        read_u32 -> u32,
        /// Read a big-endian i32.
        read_i32 -> i32,
        /// Read a big-endian u64.
        read_u64 -> u64,
        /// Read a big-endian f32.
        read_f32 -> f32,
        /// Read a big-endian f64.
        read_f64 -> f64,
    }

    /// Read a `TString`: one length byte, or 255 followed by a u32 length.
    pub fn read_string(&mut self) -> Result<String> {
        let len = match self.read_u8()? {
            255 => self.read_u32()? as usize,
            n => n as usize,
        };
        let bytes = self.read_bytes(len)?;
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }

    /// Read a streamer version header.
    ///
    /// Returns the class version and, when a byte count is present, the
    /// absolute offset one past the end of the object. Without a byte count
    /// only the 2-byte version is consumed.
    pub fn read_version(&mut self) -> Result<(u16, Option<usize>)> {
        let start = self.pos;
        let raw = self.read_u32()?;
        if raw & BYTE_COUNT_MASK != 0 {
            let byte_count = (raw & !BYTE_COUNT_MASK) as usize;
            let version = self.read_u16()?;
            Ok((version, Some(start + 4 + byte_count)))
        } else {
            self.pos = start + 2;
            Ok(((raw >> 16) as u16, None))
        }
    }

    /// Read a `TObject`: version, `fUniqueID`, `fBits`.
    pub fn read_tobject(&mut self) -> Result<(u32, u32)> {
        let _version = self.read_u16()?;
        let unique_id = self.read_u32()?;
        let bits = self.read_u32()?;
        if bits & IS_REFERENCED != 0 {
            self.skip(2)?;
        }
        Ok((unique_id, bits))
    }

    /// Read a `TNamed` and return `(name, title)`.
    pub fn read_tnamed(&mut self) -> Result<(String, String)> {
        let (_version, end) = self.read_version()?;
        self.read_tobject()?;
        let name = self.read_string()?;
        let title = self.read_string()?;
        if let Some(end) = end {
            self.seek(end)?;
        }
        Ok((name, title))
    }

    /// Skip a streamed object that carries a byte count.
    ///
    /// Objects written without one cannot be skipped and are rejected.
    pub fn skip_object(&mut self, what: &str) -> Result<()> {
        let start = self.pos;
        match self.read_version()? {
            (_, Some(end)) => self.seek(end),
            (version, None) => Err(RootError::Deserialization(format!(
                "{} (version {}) at offset {} has no byte count",
                what, version, start
            ))),
        }
    }

    /// Read `n` big-endian f64 values.
    pub fn read_array_f64(&mut self, n: usize) -> Result<Vec<f64>> {
        self.read_array(n, 8, |r| r.read_f64())
    }

    /// Read `n` big-endian f32 values, widened to f64.
    pub fn read_array_f32(&mut self, n: usize) -> Result<Vec<f64>> {
        self.read_array(n, 4, |r| r.read_f32().map(f64::from))
    }

    /// Read `n` big-endian i32 values, widened to f64.
    pub fn read_array_i32(&mut self, n: usize) -> Result<Vec<f64>> {
        self.read_array(n, 4, |r| r.read_i32().map(f64::from))
    }

    /// Read `n` big-endian i16 values, widened to f64.
    pub fn read_array_i16(&mut self, n: usize) -> Result<Vec<f64>> {
        self.read_array(n, 2, |r| r.read_i16().map(f64::from))
    }

    /// Read a `TArrayD` (u32 length + values).
    pub fn read_tarray_f64(&mut self) -> Result<Vec<f64>> {
        let n = self.read_u32()? as usize;
        self.read_array_f64(n)
    }

    fn read_array(
        &mut self,
        n: usize,
        width: usize,
        mut read_one: impl FnMut(&mut Self) -> Result<f64>,
    ) -> Result<Vec<f64>> {
        // Check up front so a corrupt length cannot trigger a huge allocation.
        let need = n.saturating_mul(width);
        if need > self.remaining() {
            return Err(RootError::BufferUnderflow {
                offset: self.pos,
                need,
                have: self.remaining(),
            });
        }
        let mut out = Vec::with_capacity(n);
        for _ in 0..n {
            out.push(read_one(self)?);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitives_are_big_endian() {
        let mut data = vec![0x01, 0x02, 0x03, 0x04];
        data.extend_from_slice(&std::f64::consts::E.to_be_bytes());
        data.extend_from_slice(&(-7i16).to_be_bytes());
        let mut r = RBuffer::new(&data);
        assert_eq!(r.read_u32().unwrap(), 0x0102_0304);
        assert_eq!(r.read_f64().unwrap(), std::f64::consts::E);
        assert_eq!(r.read_i16().unwrap(), -7);
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn short_and_long_strings() {
        let mut data = vec![2, b'h', b'i', 255];
        data.extend_from_slice(&3u32.to_be_bytes());
        data.extend_from_slice(b"sig");
        data.push(0);
        let mut r = RBuffer::new(&data);
        assert_eq!(r.read_string().unwrap(), "hi");
        assert_eq!(r.read_string().unwrap(), "sig");
        assert_eq!(r.read_string().unwrap(), "");
    }

    #[test]
    fn version_with_byte_count_reports_end_offset() {
        let mut data = vec![0u8; 3];
        data.extend_from_slice(&(BYTE_COUNT_MASK | 6).to_be_bytes());
        data.extend_from_slice(&8u16.to_be_bytes());
        data.extend_from_slice(&[0xAA; 4]);
        let mut r = RBuffer::new(&data);
        r.seek(3).unwrap();
        assert_eq!(r.read_version().unwrap(), (8, Some(13)));
        assert_eq!(r.pos(), 9);
    }

    #[test]
    fn version_without_byte_count_consumes_two_bytes() {
        let data = [0x00, 0x03, 0x12, 0x34];
        let mut r = RBuffer::new(&data);
        assert_eq!(r.read_version().unwrap(), (3, None));
        assert_eq!(r.pos(), 2);
        assert_eq!(r.read_u16().unwrap(), 0x1234);
    }

    #[test]
    fn skip_object_jumps_to_end() {
        let mut data = Vec::new();
        data.extend_from_slice(&(BYTE_COUNT_MASK | 4).to_be_bytes());
        data.extend_from_slice(&[0x00, 0x02, 0xFF, 0xFF]);
        data.push(0x42);
        let mut r = RBuffer::new(&data);
        r.skip_object("TAttLine").unwrap();
        assert_eq!(r.read_u8().unwrap(), 0x42);
    }

    #[test]
    fn underflow_is_an_error() {
        let data = [0u8; 3];
        let mut r = RBuffer::new(&data);
        assert!(matches!(
            r.read_u32(),
            Err(RootError::BufferUnderflow { offset: 0, need: 4, have: 3 })
        ));
        assert!(r.read_array_f64(usize::MAX / 2).is_err());
        assert!(r.seek(4).is_err());
    }

    #[test]
    fn widened_arrays() {
        let mut data = Vec::new();
        data.extend_from_slice(&1.5f32.to_be_bytes());
        data.extend_from_slice(&(-3i32).to_be_bytes());
        let mut r = RBuffer::new(&data);
        assert_eq!(r.read_array_f32(1).unwrap(), vec![1.5]);
        assert_eq!(r.read_array_i32(1).unwrap(), vec![-3.0]);
    }
}
