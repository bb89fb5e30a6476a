// Copyright © 2018 Cormac O'Brien
//
// Permission is hereby granted, free of charge, to any person obtaining a copy of this software
// and associated documentation files (the "Software"), to deal in the Software without
// restriction, including without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to permit persons to whom the
// Software is furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all copies or
// substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING
// BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM,
// DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! The ART archive format.
//!
//! An archive is a 16-byte header (version, an unreliable tile count, the first and last tile
//! number), followed by the width table, the height table and the packed animation table for
//! every tile in range, followed by the column-major pixel data of each tile in order.

use std::io::Cursor;

use crate::tile::{TileError, MAXUSERTILES};

use byteorder::{LittleEndian, ReadBytesExt};
use crc32fast::Hasher;

/// Optional prefix some tools write in front of the header.
pub const BUILDART_MAGIC: &[u8; 8] = b"BUILDART";
pub const ART_VERSION: u32 = 1;
pub const HEADER_SIZE: usize = 16;

/// The number of base-game ART files probed by `TileStore::load_art_set`.
pub const MAXARTFILES_BASE: usize = 200;

/// The total number of ART file slots, base plus per-map.
pub const MAXARTFILES_TOTAL: usize = 220;

/// The index archives use for transparency on disk.
const DISK_TRANSPARENT_INDEX: u8 = 255;

/// One tile's record in an archive.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ArtEntry {
    /// Position within the archive's tile range, starting at 0.
    pub index: usize,
    pub width: u16,
    pub height: u16,
    pub anim: u32,
    /// Byte offset of the pixel data within the archive.
    pub offset: usize,
}

impl ArtEntry {
    pub fn len(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The parsed index of an ART archive.
#[derive(Clone, Debug)]
pub struct ArtHeader {
    tile_start: usize,
    tile_end: usize,
    entries: Vec<ArtEntry>,
}

impl ArtHeader {
    /// Parses and validates the header and tables of an archive.
    ///
    /// `data` must already have any `BUILDART` prefix removed. Fails if the version is not 1, the
    /// tile range is outside `[0, MAXUSERTILES)` or inverted, or the tables or pixel data run past
    /// the end of the buffer.
    pub fn parse(name: &str, data: &[u8]) -> Result<ArtHeader, TileError> {
        let format_err = |reason: String| TileError::Format {
            name: name.to_owned(),
            reason,
        };

        if data.len() < HEADER_SIZE {
            return Err(format_err(format!(
                "truncated header ({} bytes)",
                data.len()
            )));
        }

        let mut reader = Cursor::new(data);
        let version = reader.read_u32::<LittleEndian>().map_err(|e| format_err(e.to_string()))?;
        if version != ART_VERSION {
            return Err(format_err(format!(
                "Invalid art file version. Must be {}, got {}",
                ART_VERSION, version
            )));
        }

        // the tile count field is not reliable
        let _numtiles = reader.read_u32::<LittleEndian>().map_err(|e| format_err(e.to_string()))?;
        let tile_start = reader.read_i32::<LittleEndian>().map_err(|e| format_err(e.to_string()))?;
        let tile_end = reader.read_i32::<LittleEndian>().map_err(|e| format_err(e.to_string()))?;

        let in_range = |t: i32| t >= 0 && (t as usize) < MAXUSERTILES;
        if !in_range(tile_start) || !in_range(tile_end) {
            return Err(format_err(format!(
                "Invalid tilestart or tileend ({}, {})",
                tile_start, tile_end
            )));
        }

        if tile_end < tile_start {
            return Err(format_err(format!(
                "tileend < tilestart ({} < {})",
                tile_end, tile_start
            )));
        }

        let tile_start = tile_start as usize;
        let tile_end = tile_end as usize;
        let count = tile_end - tile_start + 1;

        let tables_len = count * (2 + 2 + 4);
        if data.len() < HEADER_SIZE + tables_len {
            return Err(format_err(format!(
                "truncated tile tables ({} tiles)",
                count
            )));
        }

        let mut widths = vec![0u16; count];
        let mut heights = vec![0u16; count];
        let mut anims = vec![0u32; count];
        reader
            .read_u16_into::<LittleEndian>(&mut widths)
            .and_then(|_| reader.read_u16_into::<LittleEndian>(&mut heights))
            .and_then(|_| reader.read_u32_into::<LittleEndian>(&mut anims))
            .map_err(|e| format_err(e.to_string()))?;

        let mut offset = HEADER_SIZE + tables_len;
        let mut entries = Vec::with_capacity(count);
        for index in 0..count {
            let entry = ArtEntry {
                index,
                width: widths[index],
                height: heights[index],
                anim: anims[index],
                offset,
            };

            offset += entry.len();
            if offset > data.len() {
                return Err(format_err(format!(
                    "truncated pixel data for tile {}",
                    tile_start + index
                )));
            }

            entries.push(entry);
        }

        Ok(ArtHeader {
            tile_start,
            tile_end,
            entries,
        })
    }

    pub fn tile_start(&self) -> usize {
        self.tile_start
    }

    pub fn tile_end(&self) -> usize {
        self.tile_end
    }

    /// The number of tiles in the archive's range, empty ones included.
    pub fn tile_count(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[ArtEntry] {
        &self.entries
    }
}

/// Removes the `BUILDART` prefix if present.
pub fn strip_magic(mut data: Vec<u8>) -> Vec<u8> {
    if data.starts_with(BUILDART_MAGIC) {
        data.drain(..BUILDART_MAGIC.len());
    }
    data
}

/// Exchanges palette indices 0 and 255 in place.
///
/// Archives mark transparency with 255; everything downstream expects 0. Applying this twice is
/// the identity.
pub fn swap_transparent(pixels: &mut [u8]) {
    for p in pixels.iter_mut() {
        *p = swap_index(*p);
    }
}

#[inline]
fn swap_index(p: u8) -> u8 {
    match p {
        0 => DISK_TRANSPARENT_INDEX,
        DISK_TRANSPARENT_INDEX => 0,
        p => p,
    }
}

/// Computes the CRC32 of loaded tile pixels as they were stored on disk.
pub fn art_crc32(pixels: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    let mut chunk = [0u8; 256];

    for block in pixels.chunks(chunk.len()) {
        for (dst, src) in chunk.iter_mut().zip(block.iter()) {
            *dst = swap_index(*src);
        }
        hasher.update(&chunk[..block.len()]);
    }

    hasher.finalize()
}
