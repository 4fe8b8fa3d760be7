//! Static Huffman Coding
//!
//! The input is sliced into symbols of a caller-chosen bit width, a prefix code is
//! built from the symbol counts, and the symbols are replaced by their codes.
//! The tree travels out of band in a compact pre-order serialization, along with
//! the number of symbols that were coded.
//!
//! * Left edges are `0`, right edges are `1`
//! * Tree serialization: internal node = `0`, leaf = `1` followed by the symbol
//! * A tree with a single leaf assigns the 1-bit code `0`
//!
//! The tree is kept in an arena (a vector of nodes linked by index), and all
//! traversals use an explicit stack.

use std::cmp::Reverse;
use std::collections::{BinaryHeap,HashMap};
use crate::tools::bit_cursor::*;
use crate::{BitOrder,Error};

/// Node in the arena, leaves have a symbol and no children
#[derive(Clone,Debug)]
pub struct Node {
    pub symbol: Option<u64>,
    pub count: usize,
    pub left: Option<usize>,
    pub right: Option<usize>
}

impl Node {
    fn leaf(symbol: u64,count: usize) -> Self {
        Self {
            symbol: Some(symbol),
            count,
            left: None,
            right: None
        }
    }
    fn branch(left: usize,right: usize,count: usize) -> Self {
        Self {
            symbol: None,
            count,
            left: Some(left),
            right: Some(right)
        }
    }
    pub fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }
}

/// A prefix code of `len` bits, stored in the low bits of `bits`
#[derive(Clone,Copy,Debug,PartialEq,Eq,Hash)]
pub struct Code {
    pub bits: u64,
    pub len: usize
}

/// Prefix code tree, the root is always the last node in the arena
#[derive(Clone,Debug)]
pub struct Tree {
    nodes: Vec<Node>
}

/// Output of the Huffman encoder, all three parts are needed to decode
#[derive(Clone,Debug,PartialEq)]
pub struct Encoded {
    pub payload: Vec<u8>,
    pub symbol_count: usize,
    pub tree: Vec<u8>
}

/// Count symbols, the result is in order of first appearance
pub fn count_symbols(symbols: &[u64]) -> Vec<(u64,usize)> {
    let mut slot: HashMap<u64,usize> = HashMap::new();
    let mut ans: Vec<(u64,usize)> = Vec::new();
    for s in symbols {
        match slot.get(s) {
            Some(i) => ans[*i].1 += 1,
            None => {
                slot.insert(*s,ans.len());
                ans.push((*s,1));
            }
        }
    }
    ans
}

/// Build the tree by repeatedly merging the two lowest counts.
/// Ties go to whichever node entered the queue first.
/// Returns `None` if there are no symbols.
pub fn build_tree(frequencies: &[(u64,usize)]) -> Option<Tree> {
    let mut nodes: Vec<Node> = Vec::with_capacity(2*frequencies.len());
    // arena index doubles as the insertion order
    let mut queue: BinaryHeap<Reverse<(usize,usize)>> = BinaryHeap::new();
    for (symbol,count) in frequencies {
        queue.push(Reverse((*count,nodes.len())));
        nodes.push(Node::leaf(*symbol,*count));
    }
    while queue.len() > 1 {
        if let (Some(Reverse((c1,n1))),Some(Reverse((c2,n2)))) = (queue.pop(),queue.pop()) {
            queue.push(Reverse((c1+c2,nodes.len())));
            nodes.push(Node::branch(n1,n2,c1+c2));
        }
    }
    match nodes.is_empty() {
        true => None,
        false => Some(Tree { nodes })
    }
}

impl Tree {
    fn root(&self) -> usize {
        self.nodes.len() - 1
    }
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }
    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }
    /// Map each symbol to its code.
    pub fn code_table(&self) -> HashMap<u64,Code> {
        let mut ans = HashMap::new();
        let root = self.root();
        if let Some(symbol) = self.nodes[root].symbol {
            ans.insert(symbol,Code { bits: 0, len: 1 });
            return ans;
        }
        let mut stack = vec![(root,Code { bits: 0, len: 0 })];
        while let Some((idx,code)) = stack.pop() {
            let node = &self.nodes[idx];
            if let Some(symbol) = node.symbol {
                ans.insert(symbol,code);
                continue;
            }
            if let Some(right) = node.right {
                stack.push((right,Code { bits: code.bits << 1 | 1, len: code.len + 1 }));
            }
            if let Some(left) = node.left {
                stack.push((left,Code { bits: code.bits << 1, len: code.len + 1 }));
            }
        }
        ans
    }
    /// Pre-order serialization, returns the bytes and the exact bit count.
    pub fn serialize_bits(&self,symbol_bits: usize) -> (Vec<u8>,usize) {
        let mut writer = BitWriter::new(BitOrder::Msb0);
        let mut stack = vec![self.root()];
        while let Some(idx) = stack.pop() {
            let node = &self.nodes[idx];
            match (node.symbol,node.left,node.right) {
                (Some(symbol),_,_) => {
                    writer.write_bit(true);
                    writer.write_bits(symbol,symbol_bits);
                },
                (None,Some(left),Some(right)) => {
                    writer.write_bit(false);
                    stack.push(right);
                    stack.push(left);
                },
                _ => {}
            }
        }
        (writer.to_bytes(),writer.len())
    }
    /// Pre-order serialization, padded to a whole number of bytes.
    pub fn serialize(&self,symbol_bits: usize) -> Vec<u8> {
        self.serialize_bits(symbol_bits).0
    }
    /// Rebuild a tree from its serialization, trailing padding is ignored.
    pub fn deserialize(serialized: &[u8],symbol_bits: usize) -> Result<Self,Error> {
        let mut cursor = BitCursor::new(serialized,BitOrder::Msb0);
        Self::read(&mut cursor,symbol_bits)
    }
    /// Rebuild a tree starting at the cursor, leaving the cursor just past the tree.
    pub fn read(cursor: &mut BitCursor,symbol_bits: usize) -> Result<Self,Error> {
        // children are filled in as they are parsed, so build with placeholders
        let mut nodes: Vec<Node> = Vec::new();
        let mut seen: HashMap<u64,usize> = HashMap::new();
        // internal nodes still waiting for a child
        let mut pending: Vec<usize> = Vec::new();
        loop {
            let is_leaf = cursor.read_bit().map_err(|_| Error::MalformedTree)?;
            let idx = nodes.len();
            if is_leaf {
                let symbol = cursor.read_bits(symbol_bits).map_err(|_| Error::MalformedTree)?;
                if seen.insert(symbol,idx).is_some() {
                    log::error!("symbol {} appears twice in tree",symbol);
                    return Err(Error::MalformedTree);
                }
                nodes.push(Node::leaf(symbol,0));
            } else {
                nodes.push(Node { symbol: None, count: 0, left: None, right: None });
            }
            if let Some(parent) = pending.last().copied() {
                if nodes[parent].left.is_none() {
                    nodes[parent].left = Some(idx);
                } else {
                    nodes[parent].right = Some(idx);
                    pending.pop();
                }
            }
            if !is_leaf {
                pending.push(idx);
            }
            if pending.is_empty() {
                break;
            }
        }
        log::debug!("tree has {} nodes",nodes.len());
        // arena convention puts the root last
        let n = nodes.len();
        let remap = |i: usize| n - 1 - i;
        let nodes = nodes.into_iter().rev().map(|node| Node {
            left: node.left.map(remap),
            right: node.right.map(remap),
            ..node
        }).collect();
        Ok(Self { nodes })
    }
}

fn check_symbol_bits(symbol_bits: usize) -> Result<(),Error> {
    match symbol_bits {
        1..=32 => Ok(()),
        _ => Err(Error::InvalidOptions("symbol width must be 1 to 32 bits"))
    }
}

/// Encode a sequence of symbols, each of which must fit in `symbol_bits`.
pub fn encode_symbols(symbols: &[u64],symbol_bits: usize) -> Result<Encoded,Error> {
    check_symbol_bits(symbol_bits)?;
    if let Some(s) = symbols.iter().find(|s| **s >> symbol_bits > 0) {
        return Err(Error::SymbolOutOfRange(*s));
    }
    let tree = match build_tree(&count_symbols(symbols)) {
        Some(t) => t,
        None => return Ok(Encoded { payload: Vec::new(), symbol_count: 0, tree: Vec::new() })
    };
    let table = tree.code_table();
    log::debug!("Huffman tree has {} leaves",table.len());
    let mut writer = BitWriter::new(BitOrder::Msb0);
    for s in symbols {
        // every symbol is in the table by construction
        let code = table.get(s).ok_or(Error::UnknownCode(*s))?;
        writer.write_bits(code.bits,code.len);
    }
    Ok(Encoded {
        payload: writer.to_bytes(),
        symbol_count: symbols.len(),
        tree: tree.serialize(symbol_bits)
    })
}

/// Decode exactly `symbol_count` symbols.  Each code is found by peeking a window
/// that starts at the shortest code length and widens one bit at a time.
pub fn decode_symbols(payload: &[u8],symbol_count: usize,tree: &[u8],symbol_bits: usize) -> Result<Vec<u64>,Error> {
    check_symbol_bits(symbol_bits)?;
    if symbol_count == 0 {
        return Ok(Vec::new());
    }
    // every code is at least one bit
    if symbol_count > payload.len() * 8 {
        log::error!("{} symbols cannot fit in {} bytes",symbol_count,payload.len());
        return Err(Error::TruncatedInput);
    }
    let mut ans = Vec::with_capacity(symbol_count);
    let tree = Tree::deserialize(tree,symbol_bits)?;
    let lookup: HashMap<Code,u64> = tree.code_table().into_iter().map(|(s,c)| (c,s)).collect();
    let min_len = lookup.keys().map(|c| c.len).min().unwrap_or(1);
    let max_len = lookup.keys().map(|c| c.len).max().unwrap_or(1);
    if max_len > 64 {
        return Err(Error::MalformedTree);
    }
    let mut cursor = BitCursor::new(payload,BitOrder::Msb0);
    while ans.len() < symbol_count {
        let mut len = min_len;
        loop {
            let bits = cursor.peek_bits(len).map_err(|_| {
                log::error!("payload ended after {} of {} symbols",ans.len(),symbol_count);
                Error::TruncatedInput
            })?;
            if let Some(symbol) = lookup.get(&Code { bits, len }) {
                ans.push(*symbol);
                cursor.read_bits(len)?;
                break;
            }
            if len == max_len {
                return Err(Error::UnknownCode(bits));
            }
            len += 1;
        }
    }
    Ok(ans)
}

/// Slice `ibuf` into `symbol_bits` symbols (a trailing partial symbol is dropped)
/// and encode them.
pub fn encode(ibuf: &[u8],symbol_bits: usize) -> Result<Encoded,Error> {
    check_symbol_bits(symbol_bits)?;
    let mut cursor = BitCursor::new(ibuf,BitOrder::Msb0);
    let mut symbols = Vec::with_capacity(ibuf.len() * 8 / symbol_bits);
    while let Ok(s) = cursor.read_bits(symbol_bits) {
        symbols.push(s);
    }
    encode_symbols(&symbols,symbol_bits)
}

/// Decode `symbol_count` symbols and pack them back into bytes.
pub fn decode(payload: &[u8],symbol_count: usize,tree: &[u8],symbol_bits: usize) -> Result<Vec<u8>,Error> {
    let symbols = decode_symbols(payload,symbol_count,tree,symbol_bits)?;
    let mut writer = BitWriter::new(BitOrder::Msb0);
    for s in symbols {
        writer.write_bits(s,symbol_bits);
    }
    Ok(writer.to_bytes())
}

impl Encoded {
    /// Self-describing container: symbol count (u32 LE), tree length (u32 LE), tree, payload
    pub fn to_bytes(&self) -> Result<Vec<u8>,Error> {
        let count = u32::try_from(self.symbol_count).map_err(|_| Error::FieldOverflow("symbol count"))?;
        let tree_len = u32::try_from(self.tree.len()).map_err(|_| Error::FieldOverflow("tree length"))?;
        let mut ans = Vec::with_capacity(8 + self.tree.len() + self.payload.len());
        ans.extend_from_slice(&u32::to_le_bytes(count));
        ans.extend_from_slice(&u32::to_le_bytes(tree_len));
        ans.extend_from_slice(&self.tree);
        ans.extend_from_slice(&self.payload);
        Ok(ans)
    }
    /// Inverse of `to_bytes`
    pub fn from_bytes(buf: &[u8]) -> Result<Self,Error> {
        if buf.len() < 8 {
            return Err(Error::TruncatedInput);
        }
        let symbol_count = u32::from_le_bytes([buf[0],buf[1],buf[2],buf[3]]) as usize;
        let tree_len = u32::from_le_bytes([buf[4],buf[5],buf[6],buf[7]]) as usize;
        if buf.len() < 8 + tree_len {
            return Err(Error::TruncatedInput);
        }
        Ok(Self {
            symbol_count,
            tree: buf[8..8+tree_len].to_vec(),
            payload: buf[8+tree_len..].to_vec()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code_len(table: &HashMap<u64,Code>,c: u8) -> usize {
        table.get(&(c as u64)).expect("symbol missing").len
    }

    #[test]
    fn counts_and_code_lengths() {
        let test_data = "AAABBC".as_bytes();
        let symbols: Vec<u64> = test_data.iter().map(|x| *x as u64).collect();
        let counts = count_symbols(&symbols);
        assert_eq!(counts,vec![(b'A' as u64,3),(b'B' as u64,2),(b'C' as u64,1)]);
        let tree = build_tree(&counts).expect("no tree");
        assert_eq!(tree.leaf_count(),3);
        assert_eq!(tree.nodes().len(),5);
        let table = tree.code_table();
        assert!(code_len(&table,b'A') < code_len(&table,b'C'));
        assert!(code_len(&table,b'C') >= code_len(&table,b'B'));
        let weighted: usize = counts.iter().map(|(s,n)| n * table[s].len).sum();
        assert_eq!(weighted,9);
    }

    #[test]
    fn fibonacci_counts() {
        let counts: Vec<(u64,usize)> = [1,1,2,3,5,8].iter().enumerate().map(|(s,n)| (s as u64,*n)).collect();
        let tree = build_tree(&counts).expect("no tree");
        let table = tree.code_table();
        let lengths: Vec<usize> = (0..6u64).map(|s| table[&s].len).collect();
        assert_eq!(lengths,vec![5,5,4,3,2,1]);
        let weighted: usize = counts.iter().map(|(s,n)| n * table[s].len).sum();
        assert_eq!(weighted,45);
    }

    #[test]
    fn tree_serialization() {
        // C,B merge first, then A joins: 0 1A 0 1C 1B
        let counts = vec![(b'A' as u64,3),(b'B' as u64,2),(b'C' as u64,1)];
        let tree = build_tree(&counts).expect("no tree");
        let (bytes,bit_count) = tree.serialize_bits(8);
        assert_eq!(bit_count,29);
        assert_eq!(bytes,hex::decode("50543A10").unwrap());
        let restored = Tree::deserialize(&bytes,8).expect("deserialize failed");
        assert_eq!(restored.code_table(),tree.code_table());
    }

    #[test]
    fn codes_are_prefix_free() {
        let test_data = "I am Sam. Sam I am. I do not like this Sam I am.\n".as_bytes();
        let symbols: Vec<u64> = test_data.iter().map(|x| *x as u64).collect();
        let tree = build_tree(&count_symbols(&symbols)).expect("no tree");
        let codes: Vec<Code> = tree.code_table().into_values().collect();
        for a in &codes {
            for b in &codes {
                if a != b && a.len <= b.len {
                    assert_ne!(b.bits >> (b.len - a.len),a.bits);
                }
            }
        }
    }

    #[test]
    fn invertibility() {
        let test_data = "AAABBC".as_bytes();
        let encoded = encode(test_data,8).expect("encoding failed");
        assert_eq!(encoded.symbol_count,6);
        // A=0, B=11, C=10
        assert_eq!(encoded.payload,vec![0b00011111,0b00000000]);
        let decoded = decode(&encoded.payload,6,&encoded.tree,8).expect("decoding failed");
        assert_eq!(decoded,test_data.to_vec());

        let test_data = "I am Sam. Sam I am. I do not like this Sam I am.\n".as_bytes();
        let encoded = encode(test_data,8).expect("encoding failed");
        assert!(encoded.payload.len() < test_data.len());
        let decoded = decode(&encoded.payload,encoded.symbol_count,&encoded.tree,8).expect("decoding failed");
        assert_eq!(decoded,test_data.to_vec());
    }

    #[test]
    fn wide_symbols() {
        let symbols: Vec<u64> = vec![4095,0,17,17,17,4095,300];
        let encoded = encode_symbols(&symbols,12).expect("encoding failed");
        let decoded = decode_symbols(&encoded.payload,encoded.symbol_count,&encoded.tree,12).expect("decoding failed");
        assert_eq!(decoded,symbols);
        assert_eq!(encode_symbols(&[4096],12),Err(Error::SymbolOutOfRange(4096)));
    }

    #[test]
    fn degenerate_inputs() {
        let encoded = encode(&[],8).expect("encoding failed");
        assert_eq!(encoded.symbol_count,0);
        assert_eq!(decode(&encoded.payload,0,&encoded.tree,8),Ok(vec![]));

        let test_data = [b'Z';10];
        let encoded = encode(&test_data,8).expect("encoding failed");
        assert_eq!(encoded.tree,vec![0b10101101,0]);
        assert_eq!(encoded.payload,vec![0,0]);
        assert_eq!(decode(&encoded.payload,10,&encoded.tree,8),Ok(test_data.to_vec()));
    }

    #[test]
    fn decode_errors() {
        let encoded = encode("AAABBC".as_bytes(),8).expect("encoding failed");
        assert_eq!(decode(&encoded.payload,17,&encoded.tree,8),Err(Error::TruncatedInput));
        assert_eq!(decode(&encoded.payload,6,&[0x00],8),Err(Error::MalformedTree));
        // two leaves with the same symbol
        assert_eq!(decode(&encoded.payload,6,&hex::decode("506820").unwrap(),8),Err(Error::MalformedTree));
        // single leaf tree only knows the code 0
        assert_eq!(decode(&[0x80],1,&[0b10101101,0],8),Err(Error::UnknownCode(1)));
    }

    #[test]
    fn huge_symbol_count() {
        let encoded = encode("AAABBC".as_bytes(),8).expect("encoding failed");
        let mut packed = encoded.to_bytes().expect("packing failed");
        packed[0..4].copy_from_slice(&u32::MAX.to_le_bytes());
        let bad = Encoded::from_bytes(&packed).expect("unpacking failed");
        assert_eq!(decode(&bad.payload,bad.symbol_count,&bad.tree,8),Err(Error::TruncatedInput));
    }

    #[test]
    fn container() {
        let encoded = encode("hello huffman".as_bytes(),8).expect("encoding failed");
        let packed = encoded.to_bytes().expect("packing failed");
        assert_eq!(Encoded::from_bytes(&packed),Ok(encoded));
        assert_eq!(Encoded::from_bytes(&packed[0..5]),Err(Error::TruncatedInput));
    }
}
