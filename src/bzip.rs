//! Block Sorting Compression
//!
//! Loosely modeled on bzip2: each block goes through the Burrows-Wheeler transform,
//! move-to-front, PCX style run-length encoding, and finally Huffman coding.
//! Blocks are independent, so they are encoded and decoded in parallel.
//!
//! Stream format, MSB first: repeating `(block length in bytes: 16 bits, block)`.
//! A block starts with a flag bit.  If the flag is 1 the block is a single literal byte.
//! Otherwise it continues with 16 bit tree length, tree, 16 bit symbol count,
//! 16 bit payload length, payload, and 16 bit primary index.  Each block is padded
//! to a whole number of bytes.

use rayon::prelude::*;
use crate::tools::bit_cursor::*;
use crate::{bwt,mtf,rle,huffman};
use crate::{BitOrder,Error};

const FIELD_BITS: usize = 16;
const LITERAL_BLOCK: bool = true;

/// Options controlling compression
#[derive(Clone)]
pub struct Options {
    /// largest block in bytes, 1 to 65535
    pub block_size: usize
}

/// Every header field fits its 16 bits with this block size, even if RLE doubles the block.
pub const STD_OPTIONS: Options = Options {
    block_size: 32000
};

impl Options {
    fn check(&self) -> Result<(),Error> {
        match self.block_size {
            1..=0xffff => Ok(()),
            _ => Err(Error::InvalidOptions("block size must be 1 to 65535"))
        }
    }
}

fn put_field(writer: &mut BitWriter,val: usize,name: &'static str) -> Result<(),Error> {
    if val >= 1 << FIELD_BITS {
        log::error!("{} is {}",name,val);
        return Err(Error::FieldOverflow(name));
    }
    writer.write_bits(val as u64,FIELD_BITS);
    Ok(())
}

fn get_field(cursor: &mut BitCursor) -> Result<usize,Error> {
    Ok(cursor.read_bits(FIELD_BITS)? as usize)
}

/// Compress one block, the block must not be empty
pub fn encode_block(block: &[u8]) -> Result<Vec<u8>,Error> {
    let mut writer = BitWriter::new(BitOrder::Msb0);
    if block.len() == 1 {
        writer.write_bit(LITERAL_BLOCK);
        writer.write_bytes(block);
        return Ok(writer.to_bytes());
    }
    let (xf,primary) = bwt::transform(block);
    let runs = rle::encode(&mtf::transform(&xf));
    let huff = huffman::encode(&runs,8)?;
    log::debug!("block of {} bytes, {} after RLE, {} after Huffman",block.len(),runs.len(),huff.payload.len());
    writer.write_bit(!LITERAL_BLOCK);
    put_field(&mut writer,huff.tree.len(),"tree length")?;
    writer.write_bytes(&huff.tree);
    put_field(&mut writer,huff.symbol_count,"symbol count")?;
    put_field(&mut writer,huff.payload.len(),"payload length")?;
    writer.write_bytes(&huff.payload);
    put_field(&mut writer,primary,"primary index")?;
    Ok(writer.to_bytes())
}

/// Expand one block
pub fn decode_block(ibuf: &[u8]) -> Result<Vec<u8>,Error> {
    let mut cursor = BitCursor::new(ibuf,BitOrder::Msb0);
    if cursor.read_bit()? == LITERAL_BLOCK {
        return Ok(cursor.read_bytes(1)?);
    }
    let tree_len = get_field(&mut cursor)?;
    let tree = cursor.read_bytes(tree_len)?;
    let symbol_count = get_field(&mut cursor)?;
    let payload_len = get_field(&mut cursor)?;
    let payload = cursor.read_bytes(payload_len)?;
    let primary = get_field(&mut cursor)?;
    log::trace!("block tree {} bytes, {} symbols, payload {} bytes",tree_len,symbol_count,payload_len);
    let runs = huffman::decode(&payload,symbol_count,&tree,8)?;
    let xf = mtf::inverse_transform(&rle::decode(&runs)?);
    bwt::inverse_transform(&xf,primary)
}

/// Main compression function
pub fn encode(ibuf: &[u8],opt: &Options) -> Result<Vec<u8>,Error> {
    opt.check()?;
    let blocks = ibuf.par_chunks(opt.block_size)
        .map(encode_block)
        .collect::<Result<Vec<Vec<u8>>,Error>>()?;
    log::debug!("{} bytes in {} blocks",ibuf.len(),blocks.len());
    let mut writer = BitWriter::new(BitOrder::Msb0);
    for block in &blocks {
        put_field(&mut writer,block.len(),"block length")?;
        writer.write_bytes(block);
    }
    Ok(writer.to_bytes())
}

/// Main decompression function, runs until the input is exhausted.
pub fn decode(ibuf: &[u8]) -> Result<Vec<u8>,Error> {
    let mut cursor = BitCursor::new(ibuf,BitOrder::Msb0);
    let mut blocks = Vec::new();
    while cursor.remaining() > 0 {
        let len = get_field(&mut cursor)?;
        blocks.push(cursor.read_bytes(len)?);
    }
    log::debug!("{} blocks found",blocks.len());
    let expanded = blocks.par_iter()
        .map(|block| decode_block(block))
        .collect::<Result<Vec<Vec<u8>>,Error>>()?;
    Ok(expanded.concat())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_block() {
        // length 2, flag 1, 'x'
        let compressed = encode(b"x",&STD_OPTIONS).expect("compression failed");
        assert_eq!(compressed,hex::decode("0002BC00").unwrap());
        assert_eq!(decode(&compressed),Ok(b"x".to_vec()));
    }

    #[test]
    fn invertibility() {
        let test_data = "TOBEORNOTTOBEORTOBEORNOT".as_bytes();
        for block_size in [1,5,23,32000] {
            let opt = Options { block_size };
            let compressed = encode(test_data,&opt).expect("compression failed");
            let expanded = decode(&compressed).expect("expansion failed");
            assert_eq!(test_data.to_vec(),expanded);
        }
    }

    #[test]
    fn compresses_repetitive_data() {
        let test_data = "I am Sam. Sam I am. I do not like this Sam I am.\n".repeat(200);
        let compressed = encode(test_data.as_bytes(),&Options { block_size: 4000 }).expect("compression failed");
        assert!(compressed.len() < test_data.len() / 4);
        assert_eq!(decode(&compressed),Ok(test_data.into_bytes()));
        let test_data = vec![0u8;70000];
        let compressed = encode(&test_data,&STD_OPTIONS).expect("compression failed");
        assert_eq!(decode(&compressed),Ok(test_data));
    }

    #[test]
    fn empty_stream() {
        assert_eq!(encode(&[],&STD_OPTIONS),Ok(vec![]));
        assert_eq!(decode(&[]),Ok(vec![]));
    }

    #[test]
    fn errors() {
        let mut writer = BitWriter::new(BitOrder::Msb0);
        assert_eq!(put_field(&mut writer,0x10000,"test"),Err(Error::FieldOverflow("test")));
        assert!(matches!(encode(b"abc",&Options { block_size: 0 }),Err(Error::InvalidOptions(_))));
        // block claims 5 bytes but only 2 follow
        assert_eq!(decode(&hex::decode("0005BC00").unwrap()),Err(Error::TruncatedInput));
        // stray byte after the last block
        let mut compressed = encode(b"TOBEORNOTTOBEORTOBEORNOT",&STD_OPTIONS).expect("compression failed");
        compressed.push(0);
        assert_eq!(decode(&compressed),Err(Error::TruncatedInput));
        // full block with nothing after the flag
        assert_eq!(decode(&hex::decode("000100").unwrap()),Err(Error::TruncatedInput));
    }
}
