use bytes::Buf;

use crate::error::{FrameError, Result};

/// Bounds-checked reader over one envelope body.
///
/// All multi-byte fields are little-endian on the wire and come back in host
/// order. Every read checks the remaining length first, so a record that runs
/// past the end of the body fails with [`FrameError::Truncated`] instead of
/// touching bytes that do not belong to it.
#[derive(Debug, Clone)]
pub struct FieldCursor<'a> {
    buf: &'a [u8],
    len: usize,
}

impl<'a> FieldCursor<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            len: buf.len(),
        }
    }

    /// Bytes consumed so far.
    pub fn position(&self) -> usize {
        self.len - self.buf.len()
    }

    /// Bytes left to consume.
    pub fn remaining(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    fn ensure(&self, needed: usize) -> Result<()> {
        if self.buf.len() < needed {
            return Err(FrameError::Truncated {
                offset: self.position(),
                needed,
                available: self.buf.len(),
            });
        }
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.ensure(1)?;
        Ok(self.buf.get_u8())
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        self.ensure(4)?;
        Ok(self.buf.get_u32_le())
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        self.ensure(2)?;
        Ok(self.buf.get_i16_le())
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        self.ensure(4)?;
        Ok(self.buf.get_f32_le())
    }

    /// Borrow the next `count` raw bytes.
    pub fn read_slice(&mut self, count: usize) -> Result<&'a [u8]> {
        self.ensure(count)?;
        let (head, tail) = self.buf.split_at(count);
        self.buf = tail;
        Ok(head)
    }
}
