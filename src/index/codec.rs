//! Low-level binary field encoding shared by index records and the index file.
//!
//! - varint: unsigned LEB128, limited to the `u32` range
//! - string: varint byte length followed by UTF-8 bytes
//! - class id: varint segment count, each package segment as a string, then the
//!   (possibly nested, dot-joined) class name as a string

use crate::error::CodecError;
use crate::model::ClassId;

/// Append-only writer for one record or file section
#[derive(Debug, Default)]
pub struct RecordWriter {
    buf: Vec<u8>,
}

impl RecordWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writer that starts with a data type tag
    pub fn with_tag(tag: u8) -> Self {
        let mut writer = Self::new();
        writer.write_u8(tag);
        writer
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    pub fn write_varint(&mut self, mut value: u32) {
        loop {
            let byte = (value & 0x7f) as u8;
            value >>= 7;
            if value == 0 {
                self.buf.push(byte);
                return;
            }
            self.buf.push(byte | 0x80);
        }
    }

    pub fn write_str(&mut self, value: &str) {
        self.write_bytes(value.as_bytes());
    }

    /// Length-prefixed raw bytes
    pub fn write_bytes(&mut self, value: &[u8]) {
        self.write_varint(value.len() as u32);
        self.buf.extend_from_slice(value);
    }

    pub fn write_class_id(&mut self, class: &ClassId) {
        let segments = class.package_segments();
        self.write_varint(segments.len() as u32);
        for segment in segments {
            self.write_str(segment);
        }
        self.write_str(&class.name);
    }

    /// Raw bytes without a length prefix
    pub fn write_raw(&mut self, value: &[u8]) {
        self.buf.extend_from_slice(value);
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// Cursor over an encoded record or file section
#[derive(Debug)]
pub struct RecordReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> RecordReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    pub fn read_u8(&mut self) -> Result<u8, CodecError> {
        let byte = *self
            .bytes
            .get(self.pos)
            .ok_or(CodecError::UnexpectedEof("byte"))?;
        self.pos += 1;
        Ok(byte)
    }

    pub fn read_varint(&mut self) -> Result<u32, CodecError> {
        let mut result: u32 = 0;
        let mut shift = 0u32;
        loop {
            let byte = *self
                .bytes
                .get(self.pos)
                .ok_or(CodecError::UnexpectedEof("varint"))?;
            self.pos += 1;

            let low = u32::from(byte & 0x7f);
            if shift == 28 && low > 0x0f {
                return Err(CodecError::VarintOverflow);
            }
            result |= low << shift;
            if byte & 0x80 == 0 {
                return Ok(result);
            }
            shift += 7;
            if shift > 28 {
                return Err(CodecError::VarintOverflow);
            }
        }
    }

    /// Length-prefixed raw bytes
    pub fn read_bytes(&mut self) -> Result<&'a [u8], CodecError> {
        let len = self.read_varint()? as usize;
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.bytes.len())
            .ok_or(CodecError::UnexpectedEof("bytes"))?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    pub fn read_string(&mut self) -> Result<String, CodecError> {
        let bytes = self
            .read_bytes()
            .map_err(|_| CodecError::UnexpectedEof("string"))?;
        std::str::from_utf8(bytes)
            .map(str::to_string)
            .map_err(|_| CodecError::InvalidUtf8)
    }

    pub fn read_class_id(&mut self) -> Result<ClassId, CodecError> {
        let count = self.read_varint()?;
        let mut segments = Vec::with_capacity(count.min(64) as usize);
        for _ in 0..count {
            segments.push(self.read_string()?);
        }
        let name = self.read_string()?;
        Ok(ClassId::new(segments.join("."), name))
    }

    /// Raw bytes without a length prefix
    pub fn read_raw(&mut self, len: usize) -> Result<&'a [u8], CodecError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.bytes.len())
            .ok_or(CodecError::UnexpectedEof("raw bytes"))?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    /// Fail if any bytes are left unread
    pub fn finish(&self) -> Result<(), CodecError> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(CodecError::TrailingBytes(n)),
        }
    }
}
