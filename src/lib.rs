//! # Classical lossless compression
//!
//! Each codec module exposes `encode` and `decode` over byte slices:
//! * `huffman` - static Huffman coding with a serialized tree
//! * `lz77`, `lzss` - sliding window dictionary coding
//! * `lzw` - fixed width, variable width, and GIF flavors of LZW
//! * `bzip` - BWT + move-to-front + run-length + Huffman, in blocks
//! * `lz77_huff`, `lzw_huff` - dictionary coders followed by Huffman coding
//!
//! The `gif` module reads GIF containers, using the GIF flavor of LZW to
//! recover the pixels.

pub mod tools;
pub mod huffman;
pub mod lz77;
pub mod lzss;
pub mod lzw;
pub mod bwt;
pub mod mtf;
pub mod rle;
pub mod bzip;
pub mod gif;
pub mod lz77_huff;
pub mod lzw_huff;

pub use tools::bit_cursor::{BitCursor,BitWriter,EndOfStream};

pub type DYNERR = Box<dyn std::error::Error>;
pub type STDRESULT = Result<(),Box<dyn std::error::Error>>;

/// Codec Errors
#[derive(thiserror::Error,Debug,Clone,PartialEq)]
pub enum Error {
    #[error("input ended before decoding was complete")]
    TruncatedInput,
    #[error("serialized Huffman tree is malformed")]
    MalformedTree,
    #[error("code {0} has no dictionary entry")]
    UnknownCode(u64),
    #[error("unsupported block type {0:#04x}")]
    UnsupportedBlock(u8),
    #[error("GIF signature not found")]
    BadSignature,
    #[error("back reference {0} reaches before start of data")]
    BadReference(usize),
    #[error("primary index {0} is outside the block")]
    BadPrimaryIndex(usize),
    #[error("symbol {0} out of range")]
    SymbolOutOfRange(u64),
    #[error("{0} does not fit its header field")]
    FieldOverflow(&'static str),
    #[error("invalid options: {0}")]
    InvalidOptions(&'static str)
}

impl From<EndOfStream> for Error {
    fn from(_: EndOfStream) -> Self {
        Error::TruncatedInput
    }
}

/// Order in which the bits of a code are packed into bytes
#[derive(Clone,Copy,Debug,PartialEq)]
pub enum BitOrder {
    /// most significant bit of a code goes first, bytes fill from the MSB
    Msb0,
    /// least significant bit of a code goes first, bytes fill from the LSB (GIF)
    Lsb0
}
