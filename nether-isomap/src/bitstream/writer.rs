//! Bit stream writer

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use flate2::Compression;
use flate2::write::ZlibEncoder;
use std::io::Write;

use super::{Endian, check_width, min_bits_signed, min_bits_unsigned};
use crate::error::{MapError, Result};

macro_rules! write_fixed {
    ($(#[$doc:meta] $name:ident($ty:ty), $len:expr;)*) => {
        $(
            #[$doc]
            pub fn $name(&mut self, value: $ty) {
                let mut bytes = [0u8; $len];
                match self.order {
                    Endian::Little => LittleEndian::$name(&mut bytes, value),
                    Endian::Big => BigEndian::$name(&mut bytes, value),
                }
                self.write_bytes(&bytes);
            }
        )*
    };
}

/// Growable writer mirroring [`super::BitReader`]
#[derive(Debug, Clone, Default)]
pub struct BitWriter {
    buf: Vec<u8>,
    order: Endian,
    /// Pending bits, right-aligned
    acc: u8,
    acc_bits: u8,
    compress: bool,
}

impl BitWriter {
    /// Create a little-endian writer
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a writer with an explicit byte order
    pub fn with_order(order: Endian) -> Self {
        Self {
            order,
            ..Self::default()
        }
    }

    pub fn order(&self) -> Endian {
        self.order
    }

    /// Bytes emitted so far, counting a pending partial bit byte
    pub fn len(&self) -> usize {
        self.buf.len() + usize::from(self.acc_bits > 0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Request zlib wrapping of the finished output. Idempotent.
    pub fn compress(&mut self) {
        self.compress = true;
    }

    pub fn is_compressed(&self) -> bool {
        self.compress
    }

    /// Emit the pending bit byte, zero-padding its low bits
    fn flush_bits(&mut self) {
        if self.acc_bits > 0 {
            self.buf.push(self.acc << (8 - self.acc_bits));
            self.acc = 0;
            self.acc_bits = 0;
        }
    }

    fn push_bit(&mut self, bit: bool) {
        self.acc = (self.acc << 1) | u8::from(bit);
        self.acc_bits += 1;
        if self.acc_bits == 8 {
            self.buf.push(self.acc);
            self.acc = 0;
            self.acc_bits = 0;
        }
    }

    /// Write raw bytes. An empty slice leaves a pending bit byte open.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }
        self.flush_bits();
        self.buf.extend_from_slice(bytes);
    }

    pub fn write_u8(&mut self, value: u8) {
        self.write_bytes(&[value]);
    }

    pub fn write_i8(&mut self, value: i8) {
        self.write_bytes(&[value as u8]);
    }

    write_fixed! {
        /// Write a 16-bit unsigned integer
        write_u16(u16), 2;
        /// Write a 16-bit signed integer
        write_i16(i16), 2;
        /// Write a 32-bit unsigned integer
        write_u32(u32), 4;
        /// Write a 32-bit signed integer
        write_i32(i32), 4;
        /// Write a 64-bit unsigned integer
        write_u64(u64), 8;
        /// Write a 64-bit signed integer
        write_i64(i64), 8;
        /// Write a 32-bit float
        write_f32(f32), 4;
        /// Write a 64-bit float
        write_f64(f64), 8;
    }

    /// Write a string followed by a NUL terminator
    pub fn write_string(&mut self, text: &str) -> Result<()> {
        if text.as_bytes().contains(&0) {
            return Err(MapError::InteriorNul);
        }
        self.write_bytes(text.as_bytes());
        self.write_u8(0);
        Ok(())
    }

    /// Write one packed bit
    pub fn write_bool(&mut self, value: bool) {
        self.push_bit(value);
    }

    /// Write the low `bits` bits of `value`, most significant first.
    ///
    /// Fails if `value` needs more than `bits` bits; never truncates.
    pub fn write_bits(&mut self, value: u32, bits: u32) -> Result<()> {
        check_width(bits)?;
        let required = min_bits_unsigned(value);
        if bits < required {
            return Err(MapError::InsufficientBitWidth {
                value: i64::from(value),
                bits,
                required,
            });
        }
        for i in (0..bits).rev() {
            self.push_bit((value >> i) & 1 != 0);
        }
        Ok(())
    }

    /// Write `value` as a `bits`-wide two's complement field
    pub fn write_signed_bits(&mut self, value: i32, bits: u32) -> Result<()> {
        check_width(bits)?;
        let required = min_bits_signed(value);
        if bits < required {
            return Err(MapError::InsufficientBitWidth {
                value: i64::from(value),
                bits,
                required,
            });
        }
        let mask = if bits == 32 { u32::MAX } else { (1u32 << bits) - 1 };
        self.write_bits(value as u32 & mask, bits)
    }

    /// Flush pending bits and return the output, deflated once if requested
    pub fn finish(mut self) -> Result<Vec<u8>> {
        self.flush_bits();
        if !self.compress {
            return Ok(self.buf);
        }
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&self.buf)?;
        Ok(encoder.finish()?)
    }
}
