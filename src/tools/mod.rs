//! Helpers shared by the codecs

pub mod bit_cursor;
