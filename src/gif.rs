//! GIF Container
//!
//! Reads enough of a GIF file to recover the pixels: signature, screen descriptor,
//! palettes, image descriptors, and raster data.  Extension blocks are skipped.
//! Pixels from every image are concatenated into one buffer, there is no attempt
//! to composite frames or deinterlace.
//!
//! The packed flag bytes are read as bit fields starting from the MSB, multi-byte
//! integers are little endian.

use num_derive::FromPrimitive;
use num_traits::FromPrimitive;
use crate::tools::bit_cursor::*;
use crate::lzw;
use crate::{BitOrder,Error};

const SIGNATURE: &[u8] = b"GIF";
const MAX_SUB_BLOCK: usize = 255;

/// Sentinel byte that starts each block after the screen descriptor
#[derive(FromPrimitive,Clone,Copy,Debug,PartialEq)]
pub enum BlockKind {
    Image = 0x2c,
    Extension = 0x21,
    Trailer = 0x3b
}

#[derive(Clone,Debug,PartialEq)]
pub struct ScreenDescriptor {
    pub width: u16,
    pub height: u16,
    pub has_palette: bool,
    pub bits_per_channel: u8,
    pub sorted: bool,
    /// also sets the size of the global palette
    pub bits_per_pixel: u8,
    pub background: u8,
    pub aspect: u8
}

#[derive(Clone,Debug,PartialEq)]
pub struct ImageDescriptor {
    pub left: u16,
    pub top: u16,
    pub width: u16,
    pub height: u16,
    pub has_palette: bool,
    pub interlaced: bool,
    pub bits_per_pixel: u8
}

/// LZW codes for one image, with the sub-block framing removed
#[derive(Clone,Debug,PartialEq)]
pub struct RasterData {
    pub code_size: u8,
    pub data: Vec<u8>
}

/// Everything we keep from a GIF file
#[derive(Clone,Debug)]
pub struct Gif {
    pub version: String,
    pub screen: ScreenDescriptor,
    /// RGB triples, the last local palette if any, otherwise the global palette
    pub palette: Vec<u8>,
    pub images: Vec<ImageDescriptor>,
    /// pixels of all images, one byte each
    pub pixels: Vec<u8>
}

impl RasterData {
    /// Compress pixels, each pixel must be less than `2^code_size`
    pub fn from_pixels(pixels: &[u8],code_size: u8) -> Result<Self,Error> {
        let opt = lzw::Options {
            variant: lzw::Variant::Gif(code_size as usize),
            ord: BitOrder::Lsb0
        };
        Ok(Self {
            code_size,
            data: lzw::encode(pixels,&opt)?
        })
    }
    /// Expand the raster data to pixels
    pub fn pixels(&self) -> Result<Vec<u8>,Error> {
        let opt = lzw::Options {
            variant: lzw::Variant::Gif(self.code_size as usize),
            ord: BitOrder::Lsb0
        };
        lzw::decode(&self.data,&opt)
    }
}

fn read_u8(cursor: &mut BitCursor) -> Result<u8,Error> {
    Ok(cursor.read_bits(8)? as u8)
}

fn read_u16(cursor: &mut BitCursor) -> Result<u16,Error> {
    let lo = read_u8(cursor)? as u16;
    let hi = read_u8(cursor)? as u16;
    Ok(lo | hi << 8)
}

/// Read sub-blocks up to and including the zero length terminator
fn read_sub_blocks(cursor: &mut BitCursor) -> Result<Vec<u8>,Error> {
    let mut ans = Vec::new();
    loop {
        let len = read_u8(cursor)? as usize;
        if len == 0 {
            return Ok(ans);
        }
        ans.append(&mut cursor.read_bytes(len)?);
    }
}

fn read_screen_descriptor(cursor: &mut BitCursor) -> Result<ScreenDescriptor,Error> {
    Ok(ScreenDescriptor {
        width: read_u16(cursor)?,
        height: read_u16(cursor)?,
        has_palette: cursor.read_bit()?,
        bits_per_channel: cursor.read_bits(3)? as u8 + 1,
        sorted: cursor.read_bit()?,
        bits_per_pixel: cursor.read_bits(3)? as u8 + 1,
        background: read_u8(cursor)?,
        aspect: read_u8(cursor)?
    })
}

/// Read the descriptor following the image separator
fn read_image_descriptor(cursor: &mut BitCursor) -> Result<ImageDescriptor,Error> {
    let left = read_u16(cursor)?;
    let top = read_u16(cursor)?;
    let width = read_u16(cursor)?;
    let height = read_u16(cursor)?;
    let has_palette = cursor.read_bit()?;
    let interlaced = cursor.read_bit()?;
    let _reserved = cursor.read_bits(3)?;
    let bits_per_pixel = cursor.read_bits(3)? as u8 + 1;
    Ok(ImageDescriptor { left, top, width, height, has_palette, interlaced, bits_per_pixel })
}

fn read_palette(cursor: &mut BitCursor,bits_per_pixel: u8) -> Result<Vec<u8>,Error> {
    Ok(cursor.read_bytes(3 << bits_per_pixel)?)
}

/// Read the code size and the sub-blocks that follow it
pub fn read_raster_data(cursor: &mut BitCursor) -> Result<RasterData,Error> {
    let code_size = read_u8(cursor)?;
    let data = read_sub_blocks(cursor)?;
    log::debug!("raster data has code size {} and {} bytes",code_size,data.len());
    Ok(RasterData { code_size, data })
}

/// Frame raster data as it appears in a GIF file
pub fn write_raster_data(raster: &RasterData) -> Vec<u8> {
    let mut ans = vec![raster.code_size];
    for chunk in raster.data.chunks(MAX_SUB_BLOCK) {
        ans.push(chunk.len() as u8);
        ans.extend_from_slice(chunk);
    }
    ans.push(0);
    ans
}

/// Decode a GIF file into its descriptors, palette, and a flat pixel buffer
pub fn decode(ibuf: &[u8]) -> Result<Gif,Error> {
    let mut cursor = BitCursor::new(ibuf,BitOrder::Msb0);
    match cursor.read_bytes(3) {
        Ok(sig) if sig == SIGNATURE => {},
        _ => {
            log::error!("GIF signature not found");
            return Err(Error::BadSignature);
        }
    }
    let version = String::from_utf8_lossy(&cursor.read_bytes(3)?).to_string();
    let screen = read_screen_descriptor(&mut cursor)?;
    log::debug!("GIF{} screen is {}x{}",version,screen.width,screen.height);
    let mut palette = match screen.has_palette {
        true => read_palette(&mut cursor,screen.bits_per_pixel)?,
        false => Vec::new()
    };
    let mut images = Vec::new();
    let mut pixels = Vec::new();
    loop {
        let sentinel = read_u8(&mut cursor)?;
        match BlockKind::from_u8(sentinel) {
            Some(BlockKind::Image) => {
                let image = read_image_descriptor(&mut cursor)?;
                if image.has_palette {
                    palette = read_palette(&mut cursor,image.bits_per_pixel)?;
                }
                let raster = read_raster_data(&mut cursor)?;
                pixels.append(&mut raster.pixels()?);
                images.push(image);
            },
            Some(BlockKind::Extension) => {
                let label = read_u8(&mut cursor)?;
                let skipped = read_sub_blocks(&mut cursor)?;
                log::debug!("skipping extension {:#04x} with {} bytes",label,skipped.len());
            },
            Some(BlockKind::Trailer) => break,
            None => {
                log::error!("unknown block {:#04x} at byte {}",sentinel,cursor.position()/8 - 1);
                return Err(Error::UnsupportedBlock(sentinel));
            }
        }
    }
    log::debug!("{} images with {} pixels",images.len(),pixels.len());
    Ok(Gif { version, screen, palette, images, pixels })
}
