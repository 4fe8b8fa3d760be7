//! LZW Compression
//!
//! Three flavors share one dictionary state machine:
//! * `Variant::Fixed` - every code has the same width, no sentinels
//! * `Variant::Variable` - codes start at 9 bits and grow to 12, no sentinels
//! * `Variant::Gif` - GIF raster data, codes start at `code_size+1` bits and grow to 12,
//!   with CLEAR and END codes just above the pixel alphabet
//!
//! The dictionary never holds more than 4096 entries (fewer for narrow fixed codes).
//! Once it is full the fixed and variable flavors keep going with a stale dictionary,
//! while the GIF encoder emits CLEAR and starts over.
//!
//! The decoder adds a dictionary entry as soon as it reads a code, by peeking at
//! the code that follows: the new string is the current string plus the first symbol
//! of the next string.  If the next code is the one being defined, its first symbol is
//! the first symbol of the current string.

use std::collections::HashMap;
use crate::tools::bit_cursor::*;
use crate::{BitOrder,Error};

/// Code widths never exceed this
pub const MAX_CODE_WIDTH: usize = 12;
const MAX_ENTRIES: usize = 1 << MAX_CODE_WIDTH;
const VARIABLE_START_WIDTH: usize = 9;

#[derive(Clone,Copy,Debug,PartialEq)]
pub enum Variant {
    /// constant code width in bits, 9 to 12
    Fixed(usize),
    /// code width grows from 9 to 12 bits
    Variable,
    /// minimum code size as stored in a GIF file, 2 to 8
    Gif(usize)
}

/// Options controlling compression
#[derive(Clone)]
pub struct Options {
    pub variant: Variant,
    /// bit packing strategy
    pub ord: BitOrder
}

pub const FIXED_OPTIONS: Options = Options {
    variant: Variant::Fixed(12),
    ord: BitOrder::Msb0
};

pub const VARIABLE_OPTIONS: Options = Options {
    variant: Variant::Variable,
    ord: BitOrder::Msb0
};

pub const GIF_OPTIONS: Options = Options {
    variant: Variant::Gif(8),
    ord: BitOrder::Lsb0
};

impl Options {
    fn check(&self) -> Result<(),Error> {
        match self.variant {
            Variant::Fixed(9..=MAX_CODE_WIDTH) | Variant::Variable | Variant::Gif(2..=8) => Ok(()),
            Variant::Fixed(_) => Err(Error::InvalidOptions("fixed code width must be 9 to 12 bits")),
            Variant::Gif(_) => Err(Error::InvalidOptions("GIF code size must be 2 to 8"))
        }
    }
}

/// Dictionary element.  Strings are stored as a link to the code of the prefix
/// plus one symbol, the first symbol is cached so it never has to be searched for.
#[derive(Clone,Copy,Debug)]
enum Entry {
    Root(u8),
    Link { prefix: usize, sym: u8, first: u8 },
    Clear,
    End
}

#[derive(Clone,Copy,Debug,PartialEq)]
enum State {
    /// dictionary holds only the initial alphabet
    Cleared,
    /// dictionary is growing
    Accumulating,
    /// END code was read
    Ended
}

/// Structure to perform LZW compression.
struct LZW {
    variant: Variant,
    /// code -> entry, the length is the dictionary size
    table: Vec<Entry>,
    /// (prefix code,next symbol) -> code
    index: HashMap<(usize,u8),usize>,
    /// current code width
    width: usize,
    state: State
}

impl LZW {
    /// Create LZW structures, including the initial dictionary
    fn create(variant: Variant) -> Self {
        let mut lzw = Self {
            variant,
            table: Vec::new(),
            index: HashMap::new(),
            width: 0,
            state: State::Cleared
        };
        lzw.reset();
        lzw
    }
    /// number of single symbol strings
    fn alphabet(&self) -> usize {
        match self.variant {
            Variant::Gif(code_size) => 1 << code_size,
            _ => 256
        }
    }
    fn capacity(&self) -> usize {
        match self.variant {
            Variant::Fixed(width) => 1 << width,
            _ => MAX_ENTRIES
        }
    }
    fn clear_code(&self) -> Option<usize> {
        match self.variant {
            Variant::Gif(code_size) => Some(1 << code_size),
            _ => None
        }
    }
    fn end_code(&self) -> Option<usize> {
        self.clear_code().map(|c| c + 1)
    }
    /// Throw away everything that was learned and start with the initial dictionary.
    fn reset(&mut self) {
        self.table = (0..self.alphabet()).map(|i| Entry::Root(i as u8)).collect();
        if self.clear_code().is_some() {
            self.table.push(Entry::Clear);
            self.table.push(Entry::End);
        }
        self.index.clear();
        self.width = match self.variant {
            Variant::Fixed(width) => width,
            Variant::Variable => VARIABLE_START_WIDTH,
            Variant::Gif(code_size) => code_size + 1
        };
        self.state = State::Cleared;
    }
    /// Walk back through the links to form the string
    fn get_string(&self,mut code: usize) -> Vec<u8> {
        let mut rev = Vec::new();
        loop {
            match self.table[code] {
                Entry::Link { prefix, sym, first: _ } => {
                    rev.push(sym);
                    code = prefix;
                },
                Entry::Root(sym) => {
                    rev.push(sym);
                    break;
                },
                _ => break
            }
        }
        rev.reverse();
        rev
    }
    /// first symbol of the string for `code`, None for sentinels or unknown codes
    fn first_sym(&self,code: usize) -> Option<u8> {
        match self.table.get(code) {
            Some(Entry::Root(sym)) => Some(*sym),
            Some(Entry::Link { first, .. }) => Some(*first),
            _ => None
        }
    }
    /// Account for one code passing through the coder, before the dictionary entry that
    /// goes with it is added.  Encoder and decoder must call this at the same point.
    fn grow(&mut self) {
        let c = self.table.len();
        if c >= self.capacity() {
            return;
        }
        let bump = match self.variant {
            Variant::Variable => c == (1 << self.width) - 1,
            Variant::Gif(_) => c == 1 << self.width,
            Variant::Fixed(_) => false
        };
        if bump && self.width < MAX_CODE_WIDTH {
            self.width += 1;
            log::trace!("code width is now {}",self.width);
        }
    }
    /// Add the string for `prefix` extended by `sym`, if there is room.
    fn insert(&mut self,prefix: usize,sym: u8) -> Option<usize> {
        let code = self.table.len();
        if code >= self.capacity() {
            return None;
        }
        let first = self.first_sym(prefix)?;
        self.table.push(Entry::Link { prefix, sym, first });
        self.index.insert((prefix,sym),code);
        self.state = State::Accumulating;
        log::trace!("add {} linking to {}.{}",code,prefix,sym);
        Some(code)
    }
}

/// Main compression function
pub fn encode(ibuf: &[u8],opt: &Options) -> Result<Vec<u8>,Error> {
    opt.check()?;
    let mut lzw = LZW::create(opt.variant);
    let mut writer = BitWriter::new(opt.ord);
    let alphabet = lzw.alphabet();
    if let Some(clear) = lzw.clear_code() {
        writer.write_bits(clear as u64,lzw.width);
    }
    // code for the longest string matched so far
    let mut curr_match: Option<usize> = None;
    let mut count = 0;
    log::debug!("entering loop over matches");
    for sym in ibuf {
        if *sym as usize >= alphabet {
            log::error!("symbol {} does not fit in the alphabet",sym);
            return Err(Error::SymbolOutOfRange(*sym as u64));
        }
        let prefix = match curr_match {
            Some(p) => p,
            None => {
                curr_match = Some(*sym as usize);
                continue;
            }
        };
        if let Some(code) = lzw.index.get(&(prefix,*sym)) {
            // keep matching
            curr_match = Some(*code);
            continue;
        }
        writer.write_bits(prefix as u64,lzw.width);
        count += 1;
        lzw.grow();
        lzw.insert(prefix,*sym);
        if let Some(clear) = lzw.clear_code() {
            if lzw.table.len() == MAX_ENTRIES {
                log::debug!("dictionary full after {} codes, clearing",count);
                writer.write_bits(clear as u64,lzw.width);
                lzw.reset();
            }
        }
        // the symbol that didn't match starts the next string
        curr_match = Some(*sym as usize);
    }
    if let Some(code) = curr_match {
        writer.write_bits(code as u64,lzw.width);
        count += 1;
        lzw.grow();
    }
    if let Some(end) = lzw.end_code() {
        writer.write_bits(end as u64,lzw.width);
    }
    log::debug!("{} bytes became {} codes",ibuf.len(),count);
    Ok(writer.to_bytes())
}

/// Decode, calling `observe` after every code so that the dictionary can be inspected.
fn decode_observed<F>(ibuf: &[u8],opt: &Options,mut observe: F) -> Result<Vec<u8>,Error>
where F: FnMut(&LZW) {
    opt.check()?;
    let mut lzw = LZW::create(opt.variant);
    let mut cursor = BitCursor::new(ibuf,opt.ord);
    let mut ans = Vec::new();
    log::debug!("enter main LZW loop");
    while lzw.state != State::Ended {
        let code = match cursor.read_bits(lzw.width) {
            Ok(c) => c as usize,
            Err(EndOfStream) if lzw.end_code().is_some() => {
                log::error!("stream ended without an END code");
                return Err(Error::TruncatedInput);
            },
            Err(EndOfStream) => break
        };
        let curr = match lzw.table.get(code).copied() {
            Some(Entry::Clear) => {
                log::debug!("clear code at bit {}",cursor.position());
                lzw.reset();
                observe(&lzw);
                continue;
            },
            Some(Entry::End) => {
                lzw.state = State::Ended;
                continue;
            },
            Some(_) => lzw.get_string(code),
            None => {
                log::error!("bad LZW code {}, dictionary has {} entries",code,lzw.table.len());
                return Err(Error::UnknownCode(code as u64));
            }
        };
        ans.extend_from_slice(&curr);
        lzw.grow();
        // predict the next entry, end of stream simply means there is no next entry
        if let Ok(next) = cursor.peek_bits(lzw.width) {
            let next = next as usize;
            let c = lzw.table.len();
            let sym = match next {
                n if n < c => lzw.first_sym(n),
                n if n == c => Some(curr[0]),
                _ => None
            };
            if let Some(sym) = sym {
                lzw.insert(code,sym);
            }
        }
        observe(&lzw);
    }
    log::debug!("end of data");
    Ok(ans)
}

/// Main decompression function
pub fn decode(ibuf: &[u8],opt: &Options) -> Result<Vec<u8>,Error> {
    decode_observed(ibuf,opt,|_| {})
}

// *************** TESTS *****************
