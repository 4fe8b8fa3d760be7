//! Fixed width LZW with Huffman Coding
//!
//! The LZW output is sliced back into codes, which become the Huffman symbols.

use crate::lzw::{self,Variant};
use crate::huffman::{self,Encoded};
use crate::{BitOrder,Error};

/// Options controlling compression
#[derive(Clone)]
pub struct Options {
    /// width of the LZW codes and the Huffman symbols, 9 to 12
    pub code_len: usize
}

pub const STD_OPTIONS: Options = Options {
    code_len: 12
};

impl Options {
    fn lzw_options(&self) -> lzw::Options {
        lzw::Options {
            variant: Variant::Fixed(self.code_len),
            ord: BitOrder::Msb0
        }
    }
}

/// Main compression function
pub fn encode(ibuf: &[u8],opt: &Options) -> Result<Encoded,Error> {
    let codes = lzw::encode(ibuf,&opt.lzw_options())?;
    huffman::encode(&codes,opt.code_len)
}

/// Main decompression function
pub fn decode(encoded: &Encoded,opt: &Options) -> Result<Vec<u8>,Error> {
    let codes = huffman::decode(&encoded.payload,encoded.symbol_count,&encoded.tree,opt.code_len)?;
    lzw::decode(&codes,&opt.lzw_options())
}

#[test]
fn invertibility() {
    let test_data = "TOBEORNOTTOBEORTOBEORNOT#\n".as_bytes();
    for code_len in [9,12] {
        let opt = Options { code_len };
        let encoded = encode(test_data,&opt).expect("compression failed");
        // one symbol per LZW code
        assert_eq!(encoded.symbol_count,18);
        let expanded = decode(&encoded,&opt).expect("expansion failed");
        assert_eq!(test_data.to_vec(),expanded);
    }
}

#[test]
fn bad_code_len() {
    let opt = Options { code_len: 13 };
    assert!(matches!(encode(b"abc",&opt),Err(Error::InvalidOptions(_))));
}
