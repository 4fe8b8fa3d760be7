//! LZSS Compression
//!
//! Uses the LZ77 tokenizer, but prefixes each token with a flag bit so that a
//! token without a back reference costs only the flag and the literal.
//!
//! Stream format: repeating `(flag: 1 bit)` followed by either `(literal: 8 bits)`
//! when the flag is 1, or a full LZ77 token when the flag is 0.

use crate::tools::bit_cursor::*;
use crate::lz77::{self,Options,Token,LITERAL_BITS};
use crate::{BitOrder,Error};

const LITERAL: bool = true;
const REFERENCE: bool = false;

/// Main compression function
pub fn encode(ibuf: &[u8],opt: &Options) -> Result<Vec<u8>,Error> {
    opt.check()?;
    let tokens = lz77::tokenize(ibuf,opt);
    let mut writer = BitWriter::new(BitOrder::Msb0);
    let mut references = 0;
    for token in &tokens {
        if token.is_literal() {
            writer.write_bit(LITERAL);
            writer.write_bits(token.literal as u64,LITERAL_BITS);
        } else {
            writer.write_bit(REFERENCE);
            lz77::put_token(token,&mut writer,opt);
            references += 1;
        }
    }
    log::debug!("{} tokens, {} are references",tokens.len(),references);
    Ok(writer.to_bytes())
}

/// Read one flagged token
fn get_token(cursor: &mut BitCursor,opt: &Options) -> Result<Token,EndOfStream> {
    if cursor.read_bit()? == LITERAL {
        Ok(Token::literal(cursor.read_bits(LITERAL_BITS)? as u8))
    } else {
        lz77::get_token(cursor,opt)
    }
}

/// Main decompression function, runs until the input is exhausted.
pub fn decode(ibuf: &[u8],opt: &Options) -> Result<Vec<u8>,Error> {
    opt.check()?;
    let mut cursor = BitCursor::new(ibuf,BitOrder::Msb0);
    let mut tokens = Vec::new();
    while let Ok(token) = get_token(&mut cursor,opt) {
        tokens.push(token);
    }
    lz77::expand_tokens(&tokens)
}

#[test]
fn compression_works() {
    // literal A = 1 01000001, literal B = 1 01000010, reference = 0 002 5 42
    let test_data = "ABABABAB".as_bytes();
    let compressed = encode(test_data,&lz77::STD_OPTIONS).expect("compression failed");
    assert_eq!(compressed,hex::decode("A0D08004A840").unwrap());
}

#[test]
fn smaller_than_lz77_on_text() {
    let test_data = "I am Sam. Sam I am. I do not like this Sam I am.\n".as_bytes();
    let lzss = encode(test_data,&lz77::STD_OPTIONS).expect("compression failed");
    let lz77 = lz77::encode(test_data,&lz77::STD_OPTIONS).expect("compression failed");
    assert!(lzss.len() < lz77.len());
}

#[test]
fn invertibility() {
    let test_data = "I am Sam. Sam I am. I do not like this Sam I am.\n".as_bytes();
    let compressed = encode(test_data,&lz77::STD_OPTIONS).expect("compression failed");
    let expanded = decode(&compressed,&lz77::STD_OPTIONS).expect("expansion failed");
    assert_eq!(test_data.to_vec(),expanded);

    let test_data = [0xffu8;100];
    let compressed = encode(&test_data,&lz77::STD_OPTIONS).expect("compression failed");
    let expanded = decode(&compressed,&lz77::STD_OPTIONS).expect("expansion failed");
    assert_eq!(test_data.to_vec(),expanded);
}
