//! Fortran sequential record framing.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::{UamivError, UamivResult};

/// Number of 4-byte words in a UAM-IV name field.
pub const NAME_WORDS: usize = 10;

/// Byte order of record markers and numeric fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Big,
    Little,
}

impl Endian {
    fn read_u32(self, bytes: [u8; 4]) -> u32 {
        match self {
            Endian::Big => u32::from_be_bytes(bytes),
            Endian::Little => u32::from_le_bytes(bytes),
        }
    }
}

/// Iterates the records of a Fortran sequential unformatted buffer.
#[derive(Debug)]
pub struct RecordReader<'a> {
    data: &'a [u8],
    pos: usize,
    index: usize,
    endian: Endian,
}

impl<'a> RecordReader<'a> {
    /// Create a reader, detecting byte order from the first record.
    pub fn new(data: &'a [u8]) -> UamivResult<Self> {
        let endian = detect_endian(data).ok_or(UamivError::UnrecognizedLayout)?;
        Ok(Self {
            data,
            pos: 0,
            index: 0,
            endian,
        })
    }

    /// Create a reader with a known byte order.
    pub fn with_endian(data: &'a [u8], endian: Endian) -> Self {
        Self {
            data,
            pos: 0,
            index: 0,
            endian,
        }
    }

    pub fn endian(&self) -> Endian {
        self.endian
    }

    /// True once every record has been consumed.
    pub fn is_at_end(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Number of records read so far.
    pub fn records_read(&self) -> usize {
        self.index
    }

    /// Read the next record's payload.
    pub fn next_record(&mut self) -> UamivResult<Record<'a>> {
        let index = self.index;
        let remaining = self.data.len() - self.pos;
        if remaining < 4 {
            return Err(UamivError::Truncated {
                record: index,
                needed: 4,
                available: remaining,
            });
        }

        let leading = self.marker_at(self.pos);
        let len = leading as usize;
        let needed = len + 8;
        if remaining < needed {
            return Err(UamivError::Truncated {
                record: index,
                needed,
                available: remaining,
            });
        }

        let trailing = self.marker_at(self.pos + 4 + len);
        if trailing != leading {
            return Err(UamivError::MarkerMismatch {
                record: index,
                leading,
                trailing,
            });
        }

        let payload = &self.data[self.pos + 4..self.pos + 4 + len];
        self.pos += needed;
        self.index += 1;

        Ok(Record {
            buf: payload,
            index,
            endian: self.endian,
        })
    }

    fn marker_at(&self, pos: usize) -> u32 {
        let mut word = [0u8; 4];
        word.copy_from_slice(&self.data[pos..pos + 4]);
        self.endian.read_u32(word)
    }
}

fn detect_endian(data: &[u8]) -> Option<Endian> {
    if data.len() < 8 {
        return None;
    }
    let mut lead = [0u8; 4];
    lead.copy_from_slice(&data[..4]);

    [Endian::Big, Endian::Little].into_iter().find(|&endian| {
        let len = endian.read_u32(lead) as usize;
        if len == 0 || len + 8 > data.len() {
            return false;
        }
        let mut trail = [0u8; 4];
        trail.copy_from_slice(&data[4 + len..8 + len]);
        endian.read_u32(trail) as usize == len
    })
}

/// Cursor over a single record's payload.
#[derive(Debug)]
pub struct Record<'a> {
    buf: &'a [u8],
    index: usize,
    endian: Endian,
}

impl<'a> Record<'a> {
    /// Zero-based position of this record in the file.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.buf.len()
    }

    /// Fail unless `count` items of `size` bytes each remain.
    pub(crate) fn ensure_items(&self, count: usize, size: usize) -> UamivResult<()> {
        let needed = count.checked_mul(size).ok_or_else(|| {
            UamivError::InvalidFormat(format!(
                "record {}: {} items of {} bytes overflow",
                self.index, count, size
            ))
        })?;
        self.ensure(needed)
    }

    pub(crate) fn ensure(&self, needed: usize) -> UamivResult<()> {
        if self.buf.len() < needed {
            return Err(UamivError::Truncated {
                record: self.index,
                needed,
                available: self.buf.len(),
            });
        }
        Ok(())
    }

    pub fn i32(&mut self) -> UamivResult<i32> {
        self.ensure(4)?;
        Ok(match self.endian {
            Endian::Big => self.buf.get_i32(),
            Endian::Little => self.buf.get_i32_le(),
        })
    }

    pub fn f32(&mut self) -> UamivResult<f32> {
        self.ensure(4)?;
        Ok(match self.endian {
            Endian::Big => self.buf.get_f32(),
            Endian::Little => self.buf.get_f32_le(),
        })
    }

    /// Read `count` consecutive reals.
    pub fn f32_vec(&mut self, count: usize) -> UamivResult<Vec<f32>> {
        self.ensure_items(count, 4)?;
        (0..count).map(|_| self.f32()).collect()
    }

    /// Read a name stored as `words` 4-byte words, one character each.
    ///
    /// The character may sit in any byte of its word (character*4 padding,
    /// or an integer-encoded character in either byte order).
    pub fn name(&mut self, words: usize) -> UamivResult<String> {
        self.ensure(words * 4)?;
        let mut name = String::with_capacity(words);
        for _ in 0..words {
            let mut word = [0u8; 4];
            self.buf.copy_to_slice(&mut word);
            let ch = word
                .iter()
                .copied()
                .find(|&b| b != 0 && b != b' ')
                .unwrap_or(b' ');
            name.push(ch as char);
        }
        Ok(name.trim_end().to_string())
    }
}

/// Builds a Fortran sequential buffer record by record.
#[derive(Debug)]
pub struct RecordWriter {
    out: BytesMut,
    record: BytesMut,
    endian: Endian,
}

impl RecordWriter {
    pub fn new(endian: Endian) -> Self {
        Self {
            out: BytesMut::new(),
            record: BytesMut::new(),
            endian,
        }
    }

    pub fn i32(&mut self, value: i32) -> &mut Self {
        match self.endian {
            Endian::Big => self.record.put_i32(value),
            Endian::Little => self.record.put_i32_le(value),
        }
        self
    }

    pub fn f32(&mut self, value: f32) -> &mut Self {
        match self.endian {
            Endian::Big => self.record.put_f32(value),
            Endian::Little => self.record.put_f32_le(value),
        }
        self
    }

    /// Write a name as `words` character*4 words, space padded.
    pub fn name(&mut self, name: &str, words: usize) -> &mut Self {
        let mut chars = name.bytes();
        for _ in 0..words {
            let ch = chars.next().unwrap_or(b' ');
            self.record.put_slice(&[ch, b' ', b' ', b' ']);
        }
        self
    }

    /// Close the pending record, framing it with length markers.
    pub fn end_record(&mut self) -> &mut Self {
        let len = self.record.len() as u32;
        let payload = self.record.split();
        self.put_marker(len);
        self.out.put_slice(&payload);
        self.put_marker(len);
        self
    }

    fn put_marker(&mut self, len: u32) {
        match self.endian {
            Endian::Big => self.out.put_u32(len),
            Endian::Little => self.out.put_u32_le(len),
        }
    }

    /// Finish writing; any unterminated record is closed first.
    pub fn finish(mut self) -> Bytes {
        if !self.record.is_empty() {
            self.end_record();
        }
        self.out.freeze()
    }
}
