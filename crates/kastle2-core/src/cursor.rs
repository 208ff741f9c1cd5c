//! Bounds-checked cursors over payload buffers.
//!
//! Every read advances an explicit position instead of mutating shared
//! state, so a failed decode always reports the exact offset it stopped at.

use crate::envelope::PayloadError;

pub struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left between the cursor and the end of the buffer.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, wanted: usize) -> Result<&'a [u8], PayloadError> {
        let end = self.pos.checked_add(wanted).ok_or(PayloadError::UnexpectedEof {
            offset: self.pos,
            wanted,
        })?;
        let bytes = self
            .buf
            .get(self.pos..end)
            .ok_or(PayloadError::UnexpectedEof {
                offset: self.pos,
                wanted,
            })?;
        self.pos = end;
        Ok(bytes)
    }

    pub fn read_u8(&mut self) -> Result<u8, PayloadError> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u32(&mut self) -> Result<u32, PayloadError> {
        let bytes = self.take(4)?;
        Ok(u32::from_le_bytes(bytes.try_into().expect("take returned 4 bytes")))
    }

    pub fn read_i16(&mut self) -> Result<i16, PayloadError> {
        let bytes = self.take(2)?;
        Ok(i16::from_le_bytes(bytes.try_into().expect("take returned 2 bytes")))
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], PayloadError> {
        let bytes = self.take(N)?;
        Ok(bytes.try_into().expect("take returned N bytes"))
    }

    /// Reads a fixed-width label field. The cursor always advances by
    /// `width`; NUL bytes are dropped from the decoded string.
    pub fn read_label(&mut self, width: usize) -> Result<String, PayloadError> {
        let bytes = self.take(width)?;
        let printable: Vec<u8> = bytes.iter().copied().filter(|&b| b != 0).collect();
        Ok(String::from_utf8_lossy(&printable).into_owned())
    }

    pub fn skip(&mut self, count: usize) -> Result<(), PayloadError> {
        self.take(count).map(|_| ())
    }

    /// Advances to an absolute offset. Used to land on the first body byte
    /// after a header whose trailing bytes are reserved.
    pub fn seek_to(&mut self, offset: usize) -> Result<(), PayloadError> {
        if offset < self.pos {
            return Err(PayloadError::UnexpectedEof {
                offset: self.pos,
                wanted: 0,
            });
        }
        self.skip(offset - self.pos)
    }
}

pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    pub fn position(&self) -> usize {
        self.buf.len()
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    pub fn write_u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_i16(&mut self, value: i16) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Writes a fixed-width label field, truncating or NUL-padding the
    /// string to exactly `width` bytes.
    pub fn write_label(&mut self, label: &str, width: usize) {
        let bytes = label.as_bytes();
        for i in 0..width {
            self.buf.push(bytes.get(i).copied().unwrap_or(0));
        }
    }

    /// Zero-fills up to an absolute offset.
    pub fn pad_to(&mut self, offset: usize) {
        while self.buf.len() < offset {
            self.buf.push(0);
        }
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }
}
