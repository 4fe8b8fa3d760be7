//! Run-Length Encoding, PCX style
//!
//! A byte below 0x80 that is not repeated stands for itself.  Anything else is a
//! header byte `0x80 | count` followed by the byte to repeat, with the count at most 127.
//! High bytes therefore cost two bytes even when they are not repeated.

use crate::Error;

pub const MAX_RUN: usize = 127;
const RUN_FLAG: u8 = 0x80;

fn put_run(ans: &mut Vec<u8>,byte: u8,count: usize) {
    if count == 1 && byte < RUN_FLAG {
        ans.push(byte);
    } else {
        ans.push(RUN_FLAG | count as u8);
        ans.push(byte);
    }
}

pub fn encode(data: &[u8]) -> Vec<u8> {
    let mut ans = Vec::new();
    let mut iter = data.iter();
    let mut curr = match iter.next() {
        Some(b) => *b,
        None => return ans
    };
    let mut count = 1;
    for byte in iter {
        if *byte == curr && count < MAX_RUN {
            count += 1;
        } else {
            put_run(&mut ans,curr,count);
            curr = *byte;
            count = 1;
        }
    }
    put_run(&mut ans,curr,count);
    ans
}

pub fn decode(data: &[u8]) -> Result<Vec<u8>,Error> {
    let mut ans = Vec::new();
    let mut iter = data.iter();
    while let Some(byte) = iter.next() {
        if *byte < RUN_FLAG {
            ans.push(*byte);
            continue;
        }
        match iter.next() {
            Some(val) => {
                let count = (*byte & !RUN_FLAG) as usize;
                ans.extend(std::iter::repeat(*val).take(count));
            },
            None => {
                log::error!("run header {:#04x} at end of data",byte);
                return Err(Error::TruncatedInput);
            }
        }
    }
    Ok(ans)
}

#[test]
fn runs_and_literals() {
    let test_data = [b'A',b'A',b'A',b'B',0xc8,b'C'];
    assert_eq!(encode(&test_data),hex::decode("83414281c843").unwrap());
    assert_eq!(decode(&hex::decode("83414281c843").unwrap()),Ok(test_data.to_vec()));
}

#[test]
fn long_runs_are_split() {
    let test_data = [0u8;300];
    assert_eq!(encode(&test_data),hex::decode("ff00ff00ae00").unwrap());
    let test_data = [0x55u8;10000];
    let encoded = encode(&test_data);
    assert!(encoded.chunks(2).all(|c| c[0] & 0x7f <= MAX_RUN as u8));
    assert_eq!(decode(&encoded),Ok(test_data.to_vec()));
}

#[test]
fn no_repeats() {
    let test_data: Vec<u8> = (0..=255).collect();
    let encoded = encode(&test_data);
    assert_eq!(encoded.len(),128 + 2*128);
    assert_eq!(decode(&encoded),Ok(test_data));
    assert_eq!(encode(&[]),Vec::<u8>::new());
}

#[test]
fn truncated_run() {
    assert_eq!(decode(&[0x41,0x85]),Err(Error::TruncatedInput));
}
