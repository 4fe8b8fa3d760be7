//! LZ77 with Huffman Coding
//!
//! Each LZ77 token becomes three symbols (distance, length, literal) that are all
//! `window_bits` wide, and one Huffman tree codes all of them.  This is not how DEFLATE
//! does it, there is no separation of literal and distance alphabets.

use crate::lz77::{self,Options,Token};
use crate::huffman::{self,Encoded};
use crate::Error;

fn check(opt: &Options) -> Result<(),Error> {
    match opt.window_bits {
        8..=16 => Ok(()),
        _ => Err(Error::InvalidOptions("window must be 8 to 16 bits to hold a literal"))
    }
}

/// Main compression function
pub fn encode(ibuf: &[u8],opt: &Options) -> Result<Encoded,Error> {
    check(opt)?;
    let tokens = lz77::tokenize(ibuf,opt);
    let symbols: Vec<u64> = tokens.iter()
        .flat_map(|t| [t.distance as u64,t.length as u64,t.literal as u64])
        .collect();
    log::debug!("{} tokens, {} symbols",tokens.len(),symbols.len());
    huffman::encode_symbols(&symbols,opt.window_bits)
}

/// Main decompression function
pub fn decode(encoded: &Encoded,opt: &Options) -> Result<Vec<u8>,Error> {
    check(opt)?;
    let symbols = huffman::decode_symbols(&encoded.payload,encoded.symbol_count,&encoded.tree,opt.window_bits)?;
    if symbols.len() % 3 != 0 {
        log::error!("{} symbols do not form whole tokens",symbols.len());
        return Err(Error::TruncatedInput);
    }
    let mut tokens = Vec::with_capacity(symbols.len() / 3);
    for triple in symbols.chunks_exact(3) {
        if triple[1] > lz77::MAX_MATCH as u64 || triple[2] > 0xff {
            log::error!("token {:?} cannot be expanded",triple);
            return Err(Error::SymbolOutOfRange(triple[1].max(triple[2])));
        }
        tokens.push(Token {
            distance: triple[0] as usize,
            length: triple[1] as usize,
            literal: triple[2] as u8
        });
    }
    lz77::expand_tokens(&tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbols_share_one_tree() {
        let test_data = "ABABABAB".as_bytes();
        let encoded = encode(test_data,&lz77::STD_OPTIONS).expect("compression failed");
        // (0,0,A) (0,0,B) (2,5,B)
        assert_eq!(encoded.symbol_count,9);
        let tree = huffman::Tree::deserialize(&encoded.tree,12).expect("bad tree");
        assert_eq!(tree.leaf_count(),5);
    }

    #[test]
    fn invertibility() {
        let test_data = "I am Sam. Sam I am. I do not like this Sam I am.\n".repeat(20);
        for window_bits in [8,12,16] {
            let opt = Options { window_bits };
            let encoded = encode(test_data.as_bytes(),&opt).expect("compression failed");
            let expanded = decode(&encoded,&opt).expect("expansion failed");
            assert_eq!(test_data.as_bytes().to_vec(),expanded);
        }
    }

    #[test]
    fn partial_token() {
        let test_data = "I am Sam. Sam I am.".as_bytes();
        let mut encoded = encode(test_data,&lz77::STD_OPTIONS).expect("compression failed");
        encoded.symbol_count -= 2;
        assert_eq!(decode(&encoded,&lz77::STD_OPTIONS),Err(Error::TruncatedInput));
    }

    #[test]
    fn narrow_window_rejected() {
        let opt = Options { window_bits: 7 };
        assert!(matches!(encode(b"abc",&opt),Err(Error::InvalidOptions(_))));
    }
}
