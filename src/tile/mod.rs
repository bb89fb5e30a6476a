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

//! The tile registry: every 2D image the game addresses by number.
//!
//! Tiles are loaded from ART archives into a fixed table of `MAXTILES` slots. Each slot holds the
//! active pixel source, a backup used to undo per-map overrides, the animation descriptor, the
//! list of high-resolution replacements and a decode cache for CPU-side reads.

pub mod anim;
pub mod art;
pub mod cache;
pub mod config;
pub mod defs;
pub mod mapart;
pub mod replace;
pub mod source;
pub mod store;

pub use self::{
    anim::{AnimFlags, AnimType, PicAnm},
    config::TileConfig,
    replace::{HightileFlags, HightileReplacement, ImageInfo, TextureId, TextureResolver},
    source::{ArtFile, PixelSource, ReplacementKind},
    store::TileStore,
};

use crate::common::vfs::VfsError;

use thiserror::Error;

/// The number of tile slots.
pub const MAXTILES: usize = 30720;

/// Slots at or above this index are reserved and never assigned by content loaders.
pub const MAXUSERTILES: usize = MAXTILES - 16;

/// The number of palette lookup tables.
pub const MAXPALOOKUPS: usize = 256;

/// The number of palettes at the top of the lookup range reserved for the engine.
pub const RESERVEDPALS: usize = 4;

/// The largest width or height a tile may have.
pub const MAXTILESIZE: i32 = i16::MAX as i32;

/// The palette index that marks a transparent pixel in loaded tile data.
pub const TRANSPARENT_INDEX: u8 = 0;

#[derive(Error, Debug)]
pub enum TileError {
    #[error("{name}: {reason}")]
    Format { name: String, reason: String },
    #[error("Tile index out of range: {0}")]
    SlotOutOfRange(usize),
    #[error("Palette index out of range: {0}")]
    InvalidPalette(usize),
    #[error("Tile {0} is empty")]
    EmptyTile(usize),
    #[error("Tile {0} is overridden by map art")]
    MapOverride(usize),
    #[error("Tile {slot} already holds a {existing} replacement, cannot make it {requested}")]
    ReplacementConflict {
        slot: usize,
        existing: ReplacementKind,
        requested: ReplacementKind,
    },
    #[error("Invalid tile size {width}x{height}")]
    InvalidSize { width: i32, height: i32 },
    #[error("Tile {0} is not writable")]
    NotWritable(usize),
    #[error("{name}: image for tile {slot} does not exist or is invalid")]
    NoSuchImage { slot: usize, name: String },
    #[error("Definition script error: {0}")]
    Script(String),
    #[error("{0}")]
    Vfs(#[from] VfsError),
}

impl TileError {
    /// Returns true if this error means something simply wasn't there.
    pub fn is_not_found(&self) -> bool {
        match self {
            TileError::Vfs(VfsError::NoSuchFile(_))
            | TileError::NoSuchImage { .. }
            | TileError::SlotOutOfRange(_) => true,
            _ => false,
        }
    }
}

/// Checks that a tile size is positive and within `MAXTILESIZE` on both axes.
#[inline]
pub(crate) fn check_size(width: i32, height: i32) -> Result<(), TileError> {
    let valid = |v: i32| v > 0 && v <= MAXTILESIZE;
    if valid(width) && valid(height) {
        Ok(())
    } else {
        Err(TileError::InvalidSize { width, height })
    }
}

/// Checks that `slot` addresses a tile.
#[inline]
pub(crate) fn check_slot(slot: usize) -> Result<(), TileError> {
    if slot < MAXTILES {
        Ok(())
    } else {
        Err(TileError::SlotOutOfRange(slot))
    }
}
