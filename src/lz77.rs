//! LZ77 Compression
//!
//! The input is broken into tokens, each token is a back reference into a sliding
//! window of already-processed bytes, followed by one literal byte.  A token with
//! distance 0 (or length 0) is a pure literal.  Every token moves forward by at
//! least one byte, so tokenizing always terminates.
//!
//! Stream format: repeating `(distance: window_bits, length: 4 bits, literal: 8 bits)`,
//! MSB first, with no end marker.
//!
//! The match search is a naive scan of the whole window, this favors clarity over speed.

use crate::tools::bit_cursor::*;
use crate::{BitOrder,Error};

/// width of the length field
pub const REF_BITS: usize = 4;
/// width of the literal field
pub const LITERAL_BITS: usize = 8;
/// longest match that can be expressed
pub const MAX_MATCH: usize = (1 << REF_BITS) - 1;
/// shorter matches are not worth a reference
pub const MIN_MATCH: usize = 2;

/// Options controlling compression
#[derive(Clone)]
pub struct Options {
    /// width of the distance field, the window holds `2^window_bits - 1` bytes
    pub window_bits: usize
}

pub const STD_OPTIONS: Options = Options {
    window_bits: 12
};

impl Options {
    /// largest distance that can be expressed
    pub fn max_distance(&self) -> usize {
        (1 << self.window_bits) - 1
    }
    pub(crate) fn check(&self) -> Result<(),Error> {
        match self.window_bits {
            1..=16 => Ok(()),
            _ => Err(Error::InvalidOptions("window must be 1 to 16 bits"))
        }
    }
}

/// One step of LZ77 compression
#[derive(Clone,Copy,Debug,PartialEq)]
pub struct Token {
    pub distance: usize,
    pub length: usize,
    pub literal: u8
}

impl Token {
    pub fn literal(literal: u8) -> Self {
        Self {
            distance: 0,
            length: 0,
            literal
        }
    }
    /// true if this token carries no back reference
    pub fn is_literal(&self) -> bool {
        self.distance == 0 || self.length == 0
    }
}

/// Find the longest match for the bytes at `pos`, searching the window
/// `[pos - max_distance, pos)`.  The matched bytes may run past `pos`, i.e., the
/// reference can overlap the bytes it encodes.  The length is limited so that
/// there is always a next literal.  `pos` must be inside `input`.
pub fn find_longest_match(input: &[u8],pos: usize,max_distance: usize) -> Token {
    let max_len = MAX_MATCH.min(input.len() - pos - 1);
    let win_start = pos.saturating_sub(max_distance);
    let mut best = Token::literal(input[pos]);
    if max_len < MIN_MATCH {
        return best;
    }
    // nearest candidates first, so the shortest distance wins a tie
    for start in (win_start..pos).rev() {
        let mut len = 0;
        while len < max_len && input[start + len] == input[pos + len] {
            len += 1;
        }
        if len >= MIN_MATCH && len > best.length {
            best = Token {
                distance: pos - start,
                length: len,
                literal: input[pos + len]
            };
            if len == max_len {
                break;
            }
        }
    }
    best
}

/// Break the input into tokens
pub fn tokenize(input: &[u8],opt: &Options) -> Vec<Token> {
    let mut ans = Vec::new();
    let mut pos = 0;
    while pos < input.len() {
        let token = find_longest_match(input,pos,opt.max_distance());
        log::trace!("{:?}",token);
        pos += token.length + 1;
        ans.push(token);
    }
    ans
}

/// Rebuild the data from tokens.  References are copied byte by byte,
/// so a reference that overlaps its own output repeats the pattern.
pub fn expand_tokens(tokens: &[Token]) -> Result<Vec<u8>,Error> {
    let mut ans: Vec<u8> = Vec::new();
    for token in tokens {
        if !token.is_literal() {
            if token.distance > ans.len() {
                log::error!("reference {} but only {} bytes expanded",token.distance,ans.len());
                return Err(Error::BadReference(token.distance));
            }
            let start = ans.len() - token.distance;
            for i in start..start + token.length {
                ans.push(ans[i]);
            }
        }
        ans.push(token.literal);
    }
    Ok(ans)
}

/// Write a full token
pub(crate) fn put_token(token: &Token,writer: &mut BitWriter,opt: &Options) {
    writer.write_bits(token.distance as u64,opt.window_bits);
    writer.write_bits(token.length as u64,REF_BITS);
    writer.write_bits(token.literal as u64,LITERAL_BITS);
}

/// Read a full token, any field can hit the end of the stream
pub(crate) fn get_token(cursor: &mut BitCursor,opt: &Options) -> Result<Token,EndOfStream> {
    let distance = cursor.read_bits(opt.window_bits)? as usize;
    let length = cursor.read_bits(REF_BITS)? as usize;
    let literal = cursor.read_bits(LITERAL_BITS)? as u8;
    Ok(Token { distance, length, literal })
}

/// Main compression function
pub fn encode(ibuf: &[u8],opt: &Options) -> Result<Vec<u8>,Error> {
    opt.check()?;
    let tokens = tokenize(ibuf,opt);
    log::debug!("{} bytes became {} tokens",ibuf.len(),tokens.len());
    let mut writer = BitWriter::new(BitOrder::Msb0);
    for token in &tokens {
        put_token(token,&mut writer,opt);
    }
    Ok(writer.to_bytes())
}

/// Main decompression function, runs until the input is exhausted.
pub fn decode(ibuf: &[u8],opt: &Options) -> Result<Vec<u8>,Error> {
    opt.check()?;
    let mut cursor = BitCursor::new(ibuf,BitOrder::Msb0);
    let mut tokens = Vec::new();
    // trailing pad bits can never form a whole token
    while let Ok(token) = get_token(&mut cursor,opt) {
        tokens.push(token);
    }
    log::debug!("{} tokens read",tokens.len());
    expand_tokens(&tokens)
}
