//! Bit stream reader

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use super::{Endian, check_width};
use crate::error::{MapError, Result};

macro_rules! read_fixed {
    ($(#[$doc:meta] $name:ident -> $ty:ty, $len:expr;)*) => {
        $(
            #[$doc]
            pub fn $name(&mut self) -> Result<$ty> {
                let order = self.order;
                let bytes = self.take($len)?;
                Ok(match order {
                    Endian::Little => LittleEndian::$name(bytes),
                    Endian::Big => BigEndian::$name(bytes),
                })
            }
        )*
    };
}

/// Sequential reader over a borrowed byte buffer
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    data: &'a [u8],
    pos: usize,
    order: Endian,
    /// Byte the current bit field is read from
    bit_byte: u8,
    /// Absolute position `bit_byte` was read at
    bit_byte_pos: Option<usize>,
    /// Unread bits left in `bit_byte`
    bits_left: u8,
}

impl<'a> BitReader<'a> {
    /// Create a little-endian reader
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_order(data, Endian::Little)
    }

    /// Create a reader with an explicit byte order
    pub fn with_order(data: &'a [u8], order: Endian) -> Self {
        Self {
            data,
            pos: 0,
            order,
            bit_byte: 0,
            bit_byte_pos: None,
            bits_left: 0,
        }
    }

    pub fn order(&self) -> Endian {
        self.order
    }

    /// Current absolute cursor position
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Total buffer length
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Bytes left after the cursor
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Move the cursor to an absolute position (the end is a valid target)
    pub fn seek(&mut self, pos: usize) -> Result<()> {
        if pos > self.data.len() {
            return Err(MapError::SeekOutOfBounds {
                target: pos,
                len: self.data.len(),
            });
        }
        self.pos = pos;
        Ok(())
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let remaining = self.remaining();
        if len > remaining {
            return Err(MapError::OutOfData {
                offset: self.pos,
                needed: len,
                remaining,
            });
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    /// Read `len` raw bytes
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        self.take(len)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.take(1)?[0] as i8)
    }

    read_fixed! {
        /// Read a 16-bit unsigned integer
        read_u16 -> u16, 2;
        /// Read a 16-bit signed integer
        read_i16 -> i16, 2;
        /// Read a 32-bit unsigned integer
        read_u32 -> u32, 4;
        /// Read a 32-bit signed integer
        read_i32 -> i32, 4;
        /// Read a 64-bit unsigned integer
        read_u64 -> u64, 8;
        /// Read a 64-bit signed integer
        read_i64 -> i64, 8;
        /// Read a 32-bit float
        read_f32 -> f32, 4;
        /// Read a 64-bit float
        read_f64 -> f64, 8;
    }

    /// Read a null-terminated UTF-8 string, consuming the terminator
    pub fn read_string(&mut self) -> Result<String> {
        let start = self.pos;
        let len = self.data[start..]
            .iter()
            .position(|&b| b == 0)
            .ok_or(MapError::UnterminatedString(start))?;
        let text = std::str::from_utf8(&self.data[start..start + len])
            .map_err(|_| MapError::InvalidUtf8(start))?;
        self.pos = start + len + 1;
        Ok(text.to_string())
    }

    /// Read one packed bit as a boolean
    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_bits(1)? != 0)
    }

    /// Read `bits` packed bits (1-32), most significant first
    pub fn read_bits(&mut self, bits: u32) -> Result<u32> {
        check_width(bits)?;

        let saved = (self.pos, self.bit_byte, self.bit_byte_pos, self.bits_left);
        let mut value = 0u32;
        for _ in 0..bits {
            match self.next_bit() {
                Ok(bit) => value = (value << 1) | u32::from(bit),
                Err(e) => {
                    (self.pos, self.bit_byte, self.bit_byte_pos, self.bits_left) = saved;
                    return Err(e);
                }
            }
        }
        Ok(value)
    }

    /// Read `bits` packed bits (1-32) as a sign-extended two's complement value
    pub fn read_signed_bits(&mut self, bits: u32) -> Result<i32> {
        let raw = self.read_bits(bits)?;
        let shift = 32 - bits;
        Ok(((raw << shift) as i32) >> shift)
    }

    fn next_bit(&mut self) -> Result<u8> {
        // Sharing depends only on the cursor sitting right behind the bit byte,
        // so any aligned read in between starts a fresh byte.
        let shared = self.bits_left > 0 && self.bit_byte_pos.is_some_and(|p| p + 1 == self.pos);
        if !shared {
            let pos = self.pos;
            self.bit_byte = self.read_u8()?;
            self.bit_byte_pos = Some(pos);
            self.bits_left = 8;
        }
        self.bits_left -= 1;
        Ok((self.bit_byte >> self.bits_left) & 1)
    }
}
