//! Move-to-Front Transform
//!
//! Each byte is replaced by its position in a list of all 256 byte values,
//! then moved to the front of the list.  Runs of a byte become runs of zeros.

fn identity() -> Vec<u8> {
    (0..=255).collect()
}

pub fn transform(data: &[u8]) -> Vec<u8> {
    let mut list = identity();
    let mut ans = Vec::with_capacity(data.len());
    for byte in data {
        // every byte value is in the list
        let pos = list.iter().position(|b| b == byte).unwrap_or(0);
        ans.push(pos as u8);
        if pos > 0 {
            list.remove(pos);
            list.insert(0,*byte);
        }
    }
    ans
}

pub fn inverse_transform(data: &[u8]) -> Vec<u8> {
    let mut list = identity();
    let mut ans = Vec::with_capacity(data.len());
    for pos in data {
        let byte = list[*pos as usize];
        ans.push(byte);
        if *pos > 0 {
            list.remove(*pos as usize);
            list.insert(0,byte);
        }
    }
    ans
}

#[test]
fn ranks_are_correct() {
    assert_eq!(transform(b"banana"),hex::decode("62626e010101").unwrap());
    assert_eq!(transform(b"nnbaaa"),hex::decode("6e0063630000").unwrap());
}

#[test]
fn invertibility() {
    let test_data: Vec<u8> = (0..=255).rev().chain(0..=255).chain([7;20]).collect();
    assert_eq!(inverse_transform(&transform(&test_data)),test_data);
    assert_eq!(inverse_transform(&[]),Vec::<u8>::new());
}
