//! Primitive scalars of the legacy byte order.
//!
//! Words and shorts are little endian. Doubles store their two 32-bit halves
//! swapped. Floats are stored half-swapped with the exponent byte offset by
//! one; [`decode_float`] and [`encode_float`] reproduce that shuffle exactly
//! so existing files keep reading.

use std::io::{self, ErrorKind, Read, Write};

use iv_core::{Error, Result};

pub fn decode_float(c: [u8; 4]) -> f32 {
    f32::from_le_bytes([c[2], c[3], c[0], c[1].wrapping_sub(1)])
}

pub fn encode_float(v: f32) -> [u8; 4] {
    let o = v.to_le_bytes();
    [o[2], o[3].wrapping_add(1), o[0], o[1]]
}

pub fn decode_double(c: [u8; 8]) -> f64 {
    f64::from_le_bytes([c[4], c[5], c[6], c[7], c[0], c[1], c[2], c[3]])
}

pub fn encode_double(v: f64) -> [u8; 8] {
    let o = v.to_le_bytes();
    [o[4], o[5], o[6], o[7], o[0], o[1], o[2], o[3]]
}

fn stream_error(e: io::Error) -> Error {
    if e.kind() == ErrorKind::UnexpectedEof {
        Error::TruncatedStream
    } else {
        Error::Io(e)
    }
}

/// Reads legacy scalars. Running out of bytes inside a field is
/// [`Error::TruncatedStream`]; only [`tag`](Self::tag) distinguishes a clean
/// end of stream.
#[derive(Debug)]
pub struct WireReader<R> {
    inner: R,
    position: u64,
}

impl<R: Read> WireReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, position: 0 }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Bytes consumed so far.
    pub fn position(&self) -> u64 {
        self.position
    }

    fn fill<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        self.inner.read_exact(&mut buf).map_err(stream_error)?;
        self.position += N as u64;
        Ok(buf)
    }

    /// One type tag byte, `None` at end of stream.
    pub fn tag(&mut self) -> Result<Option<u8>> {
        let mut buf = [0u8; 1];
        loop {
            match self.inner.read(&mut buf) {
                Ok(0) => return Ok(None),
                Ok(_) => {
                    self.position += 1;
                    return Ok(Some(buf[0]));
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(Error::Io(e)),
            }
        }
    }

    /// A tag byte where end of stream means truncation.
    pub fn required_tag(&mut self) -> Result<u8> {
        self.tag()?.ok_or(Error::TruncatedStream)
    }

    pub fn byte(&mut self) -> Result<u8> {
        Ok(self.fill::<1>()?[0])
    }

    pub fn word(&mut self) -> Result<i32> {
        Ok(i32::from_le_bytes(self.fill()?))
    }

    pub fn short(&mut self) -> Result<i16> {
        Ok(i16::from_le_bytes(self.fill()?))
    }

    pub fn float(&mut self) -> Result<f32> {
        Ok(decode_float(self.fill()?))
    }

    pub fn double(&mut self) -> Result<f64> {
        Ok(decode_double(self.fill()?))
    }

    /// A word that must not be negative, used for element counts.
    pub fn count(&mut self) -> Result<usize> {
        let n = self.word()?;
        usize::try_from(n).map_err(|_| Error::InvalidDomain("negative element count"))
    }

    pub fn bytes(&mut self, len: usize) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        buf.try_reserve_exact(len).map_err(Error::allocation(len))?;
        buf.resize(len, 0);
        self.inner.read_exact(&mut buf).map_err(stream_error)?;
        self.position += len as u64;
        Ok(buf)
    }
}

#[derive(Debug)]
pub struct WireWriter<W> {
    inner: W,
}

impl<W: Write> WireWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    pub fn flush(&mut self) -> Result<()> {
        Ok(self.inner.flush()?)
    }

    pub fn byte(&mut self, v: u8) -> Result<()> {
        Ok(self.inner.write_all(&[v])?)
    }

    pub fn word(&mut self, v: i32) -> Result<()> {
        Ok(self.inner.write_all(&v.to_le_bytes())?)
    }

    pub fn short(&mut self, v: i16) -> Result<()> {
        Ok(self.inner.write_all(&v.to_le_bytes())?)
    }

    pub fn float(&mut self, v: f32) -> Result<()> {
        Ok(self.inner.write_all(&encode_float(v))?)
    }

    pub fn double(&mut self, v: f64) -> Result<()> {
        Ok(self.inner.write_all(&encode_double(v))?)
    }

    /// A length written as a word.
    pub fn count(&mut self, n: usize) -> Result<()> {
        let v = i32::try_from(n).map_err(|_| Error::InvalidParameter("count exceeds word range"))?;
        self.word(v)
    }

    pub fn bytes(&mut self, data: &[u8]) -> Result<()> {
        Ok(self.inner.write_all(data)?)
    }
}
