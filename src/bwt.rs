//! Burrows-Wheeler Transform
//!
//! The forward transform sorts the cyclic rotations of a block and keeps the
//! last byte of each, along with the rank of the unrotated block (the primary index).
//! Rotations are ranked by prefix doubling: after each round the rank of a rotation
//! accounts for twice as many of its leading bytes, so no rotation is ever materialized.
//!
//! The inverse follows the permutation that takes each byte of the transform to the
//! byte that comes after it in the original block, which is linear in the block length.

use crate::Error;

/// Returns the transformed block and the primary index.
/// Among identical rotations, the primary index is the first in sorted order.
pub fn transform(block: &[u8]) -> (Vec<u8>,usize) {
    let n = block.len();
    if n == 0 {
        return (Vec::new(),0);
    }
    let mut rank: Vec<usize> = block.iter().map(|b| *b as usize).collect();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by_key(|i| rank[*i]);
    // length of the prefix that the ranks account for
    let mut k = 1;
    while k < n {
        let key = |i: usize| (rank[i],rank[(i + k) % n]);
        order.sort_by_key(|i| key(*i));
        let mut next = vec![0;n];
        let mut classes = 1;
        for w in 1..n {
            if key(order[w]) != key(order[w-1]) {
                classes += 1;
            }
            next[order[w]] = classes - 1;
        }
        rank = next;
        if classes == n {
            break;
        }
        k *= 2;
    }
    log::trace!("rotations sorted with prefix length {}",k);
    let primary = rank.iter().filter(|r| **r < rank[0]).count();
    let ans = order.iter().map(|i| block[(i + n - 1) % n]).collect();
    (ans,primary)
}

/// Recover the block from the transformed bytes and the primary index
pub fn inverse_transform(xf: &[u8],primary: usize) -> Result<Vec<u8>,Error> {
    if xf.is_empty() {
        return Ok(Vec::new());
    }
    if primary >= xf.len() {
        log::error!("primary index {} but block has {} bytes",primary,xf.len());
        return Err(Error::BadPrimaryIndex(primary));
    }
    // positions of each byte value, in ascending order, concatenated
    let mut start = [0usize;257];
    for b in xf {
        start[*b as usize + 1] += 1;
    }
    for i in 1..257 {
        start[i] += start[i-1];
    }
    let mut links = vec![0;xf.len()];
    for (i,b) in xf.iter().enumerate() {
        links[start[*b as usize]] = i;
        start[*b as usize] += 1;
    }
    let mut ans = Vec::with_capacity(xf.len());
    let mut i = links[primary];
    while ans.len() < xf.len() {
        ans.push(xf[i]);
        i = links[i];
    }
    Ok(ans)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// sort materialized rotations, only for checking
    fn naive(block: &[u8]) -> (Vec<u8>,usize) {
        let n = block.len();
        let mut rotations: Vec<Vec<u8>> = (0..n).map(|i| [&block[i..],&block[..i]].concat()).collect();
        rotations.sort();
        let primary = rotations.iter().position(|r| r == block).unwrap();
        (rotations.iter().map(|r| r[n-1]).collect(),primary)
    }

    #[test]
    fn banana() {
        assert_eq!(transform(b"banana"),(b"nnbaaa".to_vec(),3));
        assert_eq!(inverse_transform(b"nnbaaa",3),Ok(b"banana".to_vec()));
    }

    #[test]
    fn periodic_blocks() {
        assert_eq!(transform(b"abababab"),(b"bbbbaaaa".to_vec(),0));
        assert_eq!(transform(b"aaaa"),(b"aaaa".to_vec(),0));
        assert_eq!(transform(b"a"),(b"a".to_vec(),0));
        assert_eq!(inverse_transform(b"bbbbaaaa",0),Ok(b"abababab".to_vec()));
    }

    #[test]
    fn matches_rotation_sort() {
        let cases: [&[u8];5] = [
            b"TOBEORNOTTOBEORTOBEORNOT",
            b"mississippi",
            b"abcabcabcab",
            b"the quick brown fox jumps over the lazy dog",
            &[0,255,0,255,255,0,1]
        ];
        for block in cases {
            let (xf,primary) = transform(block);
            assert_eq!((xf.clone(),primary),naive(block));
            assert_eq!(inverse_transform(&xf,primary),Ok(block.to_vec()));
        }
        assert_eq!(transform(b"TOBEORNOTTOBEORTOBEORNOT"),(b"OOOBBBRRTTTEEENNOOORTTOO".to_vec(),20));
    }

    #[test]
    fn bad_primary_index() {
        assert_eq!(inverse_transform(b"nnbaaa",6),Err(Error::BadPrimaryIndex(6)));
        assert_eq!(inverse_transform(b"",0),Ok(vec![]));
    }
}
