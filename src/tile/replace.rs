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

//! High-resolution replacements for tiles.
//!
//! A replacement substitutes an externally managed image for a tile's native art when a given
//! palette is active. A skybox is a replacement with six faces. Each tile keeps at most one
//! replacement per palette and kind.

use std::collections::HashMap;

use crate::tile::{
    check_size, check_slot, store::TileStore, PixelSource, TileError, MAXPALOOKUPS, MAXTILESIZE,
    RESERVEDPALS,
};

/// A handle to an image owned by the texture manager.
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
pub struct TextureId(pub u32);

/// What the texture manager knows about an image.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ImageInfo {
    pub id: TextureId,
    pub width: u32,
    pub height: u32,
}

/// Maps image file names to texture handles.
pub trait TextureResolver {
    /// Returns the image named `name`, or `None` if it does not exist or failed to load.
    fn resolve(&self, name: &str) -> Option<ImageInfo>;
}

impl TextureResolver for HashMap<String, ImageInfo> {
    fn resolve(&self, name: &str) -> Option<ImageInfo> {
        self.get(name).copied()
    }
}

bitflags! {
    pub struct HightileFlags: u8 {
        const INDEXED        = 1 << 0;
        const NO_COMPRESS    = 1 << 1;
        const FORCE_FILTER   = 1 << 2;
        const ART_IMMUNITY   = 1 << 3;
        const TRANSLUCENT    = 1 << 4;
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct HightileReplacement {
    /// Only the first face is used by a plain replacement, skyboxes use all six.
    pub faces: [Option<TextureId>; 6],
    pub scale: (f32, f32),
    pub alphacut: f32,
    pub specpower: f32,
    pub specfactor: f32,
    pub palnum: u16,
    pub flags: HightileFlags,
}

impl HightileReplacement {
    fn new(palnum: u16, flags: HightileFlags) -> HightileReplacement {
        HightileReplacement {
            faces: [None; 6],
            scale: (1.0, 1.0),
            alphacut: 0.0,
            specpower: 1.0,
            specfactor: 1.0,
            palnum,
            flags,
        }
    }

    pub fn is_skybox(&self) -> bool {
        self.faces[1].is_some()
    }
}

fn check_palette(pal: usize) -> Result<(), TileError> {
    if pal < MAXPALOOKUPS {
        Ok(())
    } else {
        Err(TileError::InvalidPalette(pal))
    }
}

impl TileStore {
    /// Adds a replacement to `slot`, overwriting any existing one with the same palette and kind.
    ///
    /// Fails if the tile is empty.
    pub fn add_replacement(
        &mut self,
        slot: usize,
        replacement: HightileReplacement,
    ) -> Result<(), TileError> {
        check_slot(slot)?;
        if !self.tile_check(slot) {
            return Err(TileError::EmptyTile(slot));
        }

        let hightiles = &mut self.entries[slot].hightiles;
        let existing = hightiles.iter_mut().find(|h| {
            h.palnum == replacement.palnum && h.is_skybox() == replacement.is_skybox()
        });

        match existing {
            Some(h) => *h = replacement,
            None => hightiles.push(replacement),
        }

        Ok(())
    }

    /// Removes every replacement of `slot` for palette `pal`, skyboxes included.
    pub fn remove_replacement(&mut self, slot: usize, pal: usize) {
        if let Some(entry) = self.entries.get_mut(slot) {
            entry.hightiles.retain(|h| h.palnum as usize != pal);
        }
    }

    /// Removes every replacement of `slot`.
    pub fn remove_replacements(&mut self, slot: usize) {
        if let Some(entry) = self.entries.get_mut(slot) {
            entry.hightiles.clear();
        }
    }

    /// Finds the replacement of `slot` for palette `pal`.
    ///
    /// If there is none, the palette 0 replacement is used instead, except for palettes in the
    /// reserved band at the top of the lookup range.
    pub fn find_replacement(
        &self,
        slot: usize,
        pal: usize,
        skybox: bool,
    ) -> Option<&HightileReplacement> {
        let hightiles = &self.entries.get(slot)?.hightiles;
        let lookup = |pal: usize| {
            hightiles
                .iter()
                .find(|h| h.palnum as usize == pal && h.is_skybox() == skybox)
        };

        match lookup(pal) {
            Some(h) => Some(h),
            None if pal == 0 || pal >= MAXPALOOKUPS - RESERVEDPALS => None,
            None => lookup(0),
        }
    }

    /// Every replacement registered for `slot`.
    pub fn replacements(&self, slot: usize) -> &[HightileReplacement] {
        self.entries.get(slot).map_or(&[][..], |e| &e.hightiles[..])
    }

    /// Registers image `file` as the replacement of `slot` under palette `pal`.
    ///
    /// `alphacut` is clamped to at most 1.
    pub fn set_hightile<R>(
        &mut self,
        resolver: &R,
        slot: usize,
        pal: usize,
        file: &str,
        alphacut: f32,
        scale: (f32, f32),
        specpower: f32,
        specfactor: f32,
        flags: HightileFlags,
    ) -> Result<(), TileError>
    where
        R: TextureResolver + ?Sized,
    {
        check_slot(slot)?;
        check_palette(pal)?;

        if !self.tile_check(slot) {
            warn!("Defined hightile replacement for empty tile {}", slot);
            return Err(TileError::EmptyTile(slot));
        }

        let image = resolver.resolve(file).ok_or_else(|| {
            let e = TileError::NoSuchImage {
                slot,
                name: file.to_owned(),
            };
            warn!("{}", e);
            e
        })?;

        let mut replacement = HightileReplacement::new(pal as u16, flags);
        replacement.faces[0] = Some(image.id);
        replacement.alphacut = alphacut.min(1.0);
        replacement.scale = scale;
        replacement.specpower = specpower;
        replacement.specfactor = specfactor;

        self.add_replacement(slot, replacement)
    }

    /// Registers six images as the skybox of `slot` under palette `pal`.
    ///
    /// Nothing is registered unless every face resolves.
    pub fn set_skybox<R>(
        &mut self,
        resolver: &R,
        slot: usize,
        pal: usize,
        faces: &[&str; 6],
        flags: HightileFlags,
    ) -> Result<(), TileError>
    where
        R: TextureResolver + ?Sized,
    {
        check_slot(slot)?;
        check_palette(pal)?;

        if !self.tile_check(slot) {
            warn!("Defined skybox replacement for empty tile {}", slot);
            return Err(TileError::EmptyTile(slot));
        }

        let mut replacement = HightileReplacement::new(pal as u16, flags);
        for (face, name) in replacement.faces.iter_mut().zip(faces.iter()) {
            match resolver.resolve(name) {
                Some(image) => *face = Some(image.id),
                None => {
                    warn!("{}: Skybox image for tile {} does not exist or is invalid", name, slot);
                    return Err(TileError::NoSuchImage {
                        slot,
                        name: (*name).to_owned(),
                    });
                }
            }
        }

        self.add_replacement(slot, replacement)
    }

    /// Removes the replacements of `slot` for palette `pal`.
    pub fn delete_hightile(&mut self, slot: usize, pal: usize) -> Result<(), TileError> {
        check_slot(slot)?;
        check_palette(pal)?;
        self.remove_replacement(slot, pal);
        Ok(())
    }

    /// Turns `slot` into a tile showing an external image.
    ///
    /// The slot gets a pixel-less tile the size of the image and the image becomes its palette 0
    /// replacement. `alphacut` is the 8-bit opacity below which pixels are cut.
    pub fn import_from_texture<R>(
        &mut self,
        resolver: &R,
        file: &str,
        slot: usize,
        alphacut: u8,
    ) -> Result<(), TileError>
    where
        R: TextureResolver + ?Sized,
    {
        check_slot(slot)?;

        let image = resolver.resolve(file).ok_or_else(|| TileError::NoSuchImage {
            slot,
            name: file.to_owned(),
        })?;

        let (width, height) = (image.width as i32, image.height as i32);
        if image.width > MAXTILESIZE as u32 || image.height > MAXTILESIZE as u32 {
            return Err(TileError::InvalidSize { width, height });
        }
        check_size(width, height)?;

        let dummy = PixelSource::Dummy {
            width: image.width,
            height: image.height,
        };
        self.install(slot, dummy.into(), false)?;

        let alphacut = (255 - alphacut) as f32 / 255.0;
        self.set_hightile(
            resolver,
            slot,
            0,
            file,
            alphacut,
            (1.0, 1.0),
            1.0,
            1.0,
            HightileFlags::empty(),
        )
    }
}
