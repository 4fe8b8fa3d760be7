//! Bit level reading and writing over byte buffers.
//!
//! Every codec in the crate is built on these two types.  Fields are packed
//! back to back with no byte alignment between them, only the final byte of a
//! stream is padded (with zeros).  Within a field the bits are packed according
//! to `BitOrder`, almost everything uses `Msb0`, GIF raster data uses `Lsb0`.

use bit_vec::BitVec;
use crate::BitOrder;

/// Signals that a read or peek ran past the end of the buffer.
/// This is often the normal end of a stream, callers that know how much
/// data to expect should convert it to `Error::TruncatedInput`.
#[derive(thiserror::Error,Debug,Clone,Copy,PartialEq)]
#[error("end of stream")]
pub struct EndOfStream;

/// bit_vec crate only handles MSB, this assumes starting alignment
fn bits_to_bytes_lsb0(bits: &BitVec) -> Vec<u8> {
    let mut ans = vec![0;(bits.len() + 7) / 8];
    for (i,bit) in bits.iter().enumerate() {
        ans[i/8] |= (bit as u8) << (i%8);
    }
    ans
}

/// bit_vec crate only handles MSB, this assumes starting alignment
fn byte_to_bits_lsb0(val: u8) -> BitVec {
    (0..8).map(|b| val & (1 << b) != 0).collect()
}

/// Accumulates fields into a bit vector, convert to bytes when done.
#[derive(Clone)]
pub struct BitWriter {
    bits: BitVec,
    ord: BitOrder
}

impl BitWriter {
    pub fn new(ord: BitOrder) -> Self {
        Self {
            bits: BitVec::new(),
            ord
        }
    }
    /// Append the low `width` bits of `value`, `width` can be at most 64.
    pub fn write_bits(&mut self,value: u64,width: usize) {
        debug_assert!(width <= 64);
        match self.ord {
            BitOrder::Msb0 => {
                for i in (0..width).rev() {
                    self.bits.push(value >> i & 1 > 0);
                }
            },
            BitOrder::Lsb0 => {
                for i in 0..width {
                    self.bits.push(value >> i & 1 > 0);
                }
            }
        }
    }
    pub fn write_bit(&mut self,bit: bool) {
        self.bits.push(bit);
    }
    /// Append whole bytes, these need not be aligned with the output bytes
    pub fn write_bytes(&mut self,bytes: &[u8]) {
        for by in bytes {
            self.write_bits(*by as u64,8);
        }
    }
    /// number of bits written so far
    pub fn len(&self) -> usize {
        self.bits.len()
    }
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }
    /// Pack the bits into bytes, the last byte is padded with zeros.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self.ord {
            BitOrder::Msb0 => self.bits.to_bytes(),
            BitOrder::Lsb0 => bits_to_bytes_lsb0(&self.bits)
        }
    }
}

/// Sequential reader of bit fields.
/// Bytes are pulled from the buffer into a small bit window only as they are needed,
/// so peeking ahead loads more bytes without consuming them.
pub struct BitCursor<'a> {
    buf: &'a [u8],
    /// index of the next byte to load into the window
    next_byte: usize,
    /// bits that have been loaded, some of which may be behind us
    window: BitVec,
    /// position of the next unread bit in the window
    ptr: usize,
    /// total bits consumed
    consumed: usize,
    ord: BitOrder
}

impl<'a> BitCursor<'a> {
    pub fn new(buf: &'a [u8],ord: BitOrder) -> Self {
        Self {
            buf,
            next_byte: 0,
            window: BitVec::new(),
            ptr: 0,
            consumed: 0,
            ord
        }
    }
    /// keep the bit vector small, we don't need the bits behind us
    fn drop_leading_bits(&mut self) {
        self.window = self.window.iter().skip(self.ptr).collect();
        self.ptr = 0;
    }
    /// make sure at least `width` unread bits are in the window
    fn fill(&mut self,width: usize) -> Result<(),EndOfStream> {
        while self.window.len() - self.ptr < width {
            let by = *self.buf.get(self.next_byte).ok_or(EndOfStream)?;
            self.next_byte += 1;
            if self.ptr > 512 {
                self.drop_leading_bits();
            }
            match self.ord {
                BitOrder::Msb0 => self.window.append(&mut BitVec::from_bytes(&[by])),
                BitOrder::Lsb0 => self.window.append(&mut byte_to_bits_lsb0(by))
            }
        }
        Ok(())
    }
    /// Get the next `width` bits without advancing, `width` can be at most 64.
    pub fn peek_bits(&mut self,width: usize) -> Result<u64,EndOfStream> {
        debug_assert!(width <= 64);
        self.fill(width)?;
        let mut ans: u64 = 0;
        for i in 0..width {
            // fill guarantees the bit is present
            let bit = self.window.get(self.ptr + i).unwrap_or(false) as u64;
            match self.ord {
                BitOrder::Msb0 => ans = ans << 1 | bit,
                BitOrder::Lsb0 => ans |= bit << i
            }
        }
        Ok(ans)
    }
    /// Get the next `width` bits and advance.  If there are not enough bits
    /// the cursor does not move.
    pub fn read_bits(&mut self,width: usize) -> Result<u64,EndOfStream> {
        let ans = self.peek_bits(width)?;
        self.ptr += width;
        self.consumed += width;
        Ok(ans)
    }
    pub fn read_bit(&mut self) -> Result<bool,EndOfStream> {
        Ok(self.read_bits(1)? > 0)
    }
    /// Read `count` whole bytes, these need not be aligned with the input bytes
    pub fn read_bytes(&mut self,count: usize) -> Result<Vec<u8>,EndOfStream> {
        if self.remaining() < count * 8 {
            return Err(EndOfStream);
        }
        let mut ans = Vec::with_capacity(count);
        for _i in 0..count {
            ans.push(self.read_bits(8)? as u8);
        }
        Ok(ans)
    }
    /// number of bits consumed so far
    pub fn position(&self) -> usize {
        self.consumed
    }
    /// number of bits not yet consumed
    pub fn remaining(&self) -> usize {
        self.buf.len() * 8 - self.consumed
    }
}
