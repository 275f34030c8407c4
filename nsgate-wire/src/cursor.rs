use std::fmt::Display;

/// Errors produced by [`ByteCursor`] and the layer codecs built on it.
#[derive(Debug, PartialEq, Eq)]
pub enum WireError {
    /// An access past the end of the buffer: the absolute offset and the
    /// number of bytes requested there.
    OutOfBounds {
        offset: usize,
        wanted: usize,
        capacity: usize,
    },
    /// Bytes that should decode as text but don't.
    InvalidString { offset: usize },
    /// A field holds a value the codec cannot work with.
    Protocol { context: &'static str, value: u32 },
}

impl Display for WireError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OutOfBounds {
                offset,
                wanted,
                capacity,
            } => write!(
                f,
                "out of bounds: {wanted} bytes at offset {offset} with capacity {capacity}"
            ),
            Self::InvalidString { offset } => write!(f, "invalid string at offset {offset}"),
            Self::Protocol { context, value } => {
                write!(f, "unexpected value {value:#x} for {context}")
            }
        }
    }
}

impl std::error::Error for WireError {}

impl From<WireError> for std::io::Error {
    fn from(value: WireError) -> Self {
        std::io::Error::new(std::io::ErrorKind::InvalidData, value.to_string())
    }
}

/// Which half of a byte a nibble accessor touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Half {
    High,
    Low,
}

/// Growable byte buffer with independent read and write positions.
///
/// Scalar accessors come in two families: absolute (`get_*`/`set_*`, taking a
/// byte offset) and streaming (`read_*`/`write_*`, advancing the reader or
/// writer index). Multi-byte scalars are big-endian unless the accessor name
/// says otherwise. Invariant: `reader <= writer <= capacity`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ByteCursor {
    buf: Vec<u8>,
    reader: usize,
    writer: usize,
}

impl ByteCursor {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: vec![0; capacity],
            reader: 0,
            writer: 0,
        }
    }

    /// Wraps existing bytes; the writer index starts past them.
    pub fn from_slice(bytes: &[u8]) -> Self {
        Self {
            buf: bytes.to_vec(),
            reader: 0,
            writer: bytes.len(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    pub fn reader(&self) -> usize {
        self.reader
    }

    pub fn writer(&self) -> usize {
        self.writer
    }

    pub fn set_reader(&mut self, position: usize) -> Result<(), WireError> {
        if position > self.writer {
            return Err(WireError::OutOfBounds {
                offset: position,
                wanted: 0,
                capacity: self.writer,
            });
        }
        self.reader = position;
        Ok(())
    }

    pub fn set_writer(&mut self, position: usize) -> Result<(), WireError> {
        if position > self.buf.len() {
            return Err(WireError::OutOfBounds {
                offset: position,
                wanted: 0,
                capacity: self.buf.len(),
            });
        }
        self.writer = position;
        self.reader = self.reader.min(self.writer);
        Ok(())
    }

    /// The written region.
    pub fn as_slice(&self) -> &[u8] {
        &self.buf[..self.writer]
    }

    pub fn into_vec(mut self) -> Vec<u8> {
        self.buf.truncate(self.writer);
        self.buf
    }

    /// Doubles the capacity until it holds at least `wanted` bytes. Existing
    /// bytes and both indices are preserved.
    pub fn grow(&mut self, wanted: usize) {
        if wanted <= self.buf.len() {
            return;
        }
        let mut capacity = self.buf.len().max(1);
        while capacity < wanted {
            capacity *= 2;
        }
        self.buf.resize(capacity, 0);
    }

    fn check(&self, offset: usize, wanted: usize) -> Result<(), WireError> {
        if offset + wanted > self.buf.len() {
            return Err(WireError::OutOfBounds {
                offset,
                wanted,
                capacity: self.buf.len(),
            });
        }
        Ok(())
    }
}

/// Absolute accessors.
impl ByteCursor {
    pub fn get_u8(&self, offset: usize) -> Result<u8, WireError> {
        self.check(offset, 1)?;
        Ok(self.buf[offset])
    }

    pub fn get_u16(&self, offset: usize) -> Result<u16, WireError> {
        self.check(offset, 2)?;
        Ok(u16::from_be_bytes([self.buf[offset], self.buf[offset + 1]]))
    }

    pub fn get_u16_le(&self, offset: usize) -> Result<u16, WireError> {
        self.check(offset, 2)?;
        Ok(u16::from_le_bytes([self.buf[offset], self.buf[offset + 1]]))
    }

    pub fn get_u32(&self, offset: usize) -> Result<u32, WireError> {
        self.check(offset, 4)?;
        let mut raw = [0u8; 4];
        raw.copy_from_slice(&self.buf[offset..offset + 4]);
        Ok(u32::from_be_bytes(raw))
    }

    pub fn set_u8(&mut self, offset: usize, value: u8) -> Result<(), WireError> {
        self.check(offset, 1)?;
        self.buf[offset] = value;
        Ok(())
    }

    pub fn set_u16(&mut self, offset: usize, value: u16) -> Result<(), WireError> {
        self.check(offset, 2)?;
        self.buf[offset..offset + 2].copy_from_slice(&value.to_be_bytes());
        Ok(())
    }

    pub fn set_u16_le(&mut self, offset: usize, value: u16) -> Result<(), WireError> {
        self.check(offset, 2)?;
        self.buf[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
        Ok(())
    }

    pub fn set_u32(&mut self, offset: usize, value: u32) -> Result<(), WireError> {
        self.check(offset, 4)?;
        self.buf[offset..offset + 4].copy_from_slice(&value.to_be_bytes());
        Ok(())
    }

    /// Reads one bit; bit 0 is the least significant bit of the byte.
    pub fn bit(&self, offset: usize, index: u8) -> Result<bool, WireError> {
        Ok(self.get_u8(offset)? & (1 << index) != 0)
    }

    pub fn set_bit(&mut self, offset: usize, index: u8, value: bool) -> Result<(), WireError> {
        let byte = self.get_u8(offset)?;
        let byte = if value {
            byte | (1 << index)
        } else {
            byte & !(1 << index)
        };
        self.set_u8(offset, byte)
    }

    pub fn nibble(&self, offset: usize, half: Half) -> Result<u8, WireError> {
        let byte = self.get_u8(offset)?;
        Ok(match half {
            Half::High => byte >> 4,
            Half::Low => byte & 0x0F,
        })
    }

    /// Stores a nibble, leaving the other half of the byte untouched.
    pub fn set_nibble(&mut self, offset: usize, half: Half, value: u8) -> Result<(), WireError> {
        let byte = self.get_u8(offset)?;
        let byte = match half {
            Half::High => (byte & 0x0F) | (value << 4),
            Half::Low => (byte & 0xF0) | (value & 0x0F),
        };
        self.set_u8(offset, byte)
    }

    pub fn get_bytes(&self, offset: usize, len: usize) -> Result<&[u8], WireError> {
        self.check(offset, len)?;
        Ok(&self.buf[offset..offset + len])
    }

    pub fn set_bytes(&mut self, offset: usize, bytes: &[u8]) -> Result<(), WireError> {
        self.check(offset, bytes.len())?;
        self.buf[offset..offset + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }

    /// Reads a NUL-padded fixed-width string field.
    pub fn get_padded_str(&self, offset: usize, width: usize) -> Result<String, WireError> {
        let raw = self.get_bytes(offset, width)?;
        let end = raw.iter().position(|b| *b == 0).unwrap_or(width);
        std::str::from_utf8(&raw[..end])
            .map(str::to_owned)
            .map_err(|_| WireError::InvalidString { offset })
    }

    /// Writes a string into a fixed-width field, padding the rest with NULs.
    pub fn set_padded_str(
        &mut self,
        offset: usize,
        width: usize,
        value: &str,
    ) -> Result<(), WireError> {
        if value.len() > width {
            return Err(WireError::Protocol {
                context: "padded string width",
                value: value.len() as u32,
            });
        }
        self.check(offset, width)?;
        self.buf[offset..offset + value.len()].copy_from_slice(value.as_bytes());
        self.buf[offset + value.len()..offset + width].fill(0);
        Ok(())
    }
}

/// Streaming accessors. Reads fail past the written region; writes grow the
/// buffer as needed.
impl ByteCursor {
    pub fn read_u8(&mut self) -> Result<u8, WireError> {
        if self.reader >= self.writer {
            return Err(WireError::OutOfBounds {
                offset: self.reader,
                wanted: 1,
                capacity: self.writer,
            });
        }
        let value = self.buf[self.reader];
        self.reader += 1;
        Ok(value)
    }

    pub fn read_u16(&mut self) -> Result<u16, WireError> {
        Ok(((self.read_u8()? as u16) << 8) | self.read_u8()? as u16)
    }

    pub fn read_u32(&mut self) -> Result<u32, WireError> {
        Ok(((self.read_u16()? as u32) << 16) | self.read_u16()? as u32)
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>, WireError> {
        if self.reader + len > self.writer {
            return Err(WireError::OutOfBounds {
                offset: self.reader,
                wanted: len,
                capacity: self.writer,
            });
        }
        let bytes = self.buf[self.reader..self.reader + len].to_vec();
        self.reader += len;
        Ok(bytes)
    }

    pub fn write_u8(&mut self, value: u8) -> Result<(), WireError> {
        self.grow(self.writer + 1);
        self.buf[self.writer] = value;
        self.writer += 1;
        Ok(())
    }

    pub fn write_u16(&mut self, value: u16) -> Result<(), WireError> {
        self.write_bytes(&value.to_be_bytes())
    }

    pub fn write_u32(&mut self, value: u32) -> Result<(), WireError> {
        self.write_bytes(&value.to_be_bytes())
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), WireError> {
        self.grow(self.writer + bytes.len());
        self.buf[self.writer..self.writer + bytes.len()].copy_from_slice(bytes);
        self.writer += bytes.len();
        Ok(())
    }
}
