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

use std::{cell::RefMut, rc::Rc};

use crate::{
    common::{bitset::BitSet, vfs::Vfs},
    tile::{
        anim::{AnimFlags, PicAnm, MISC_MASK},
        art::{self, ArtHeader, MAXARTFILES_BASE},
        cache::RawCache,
        check_size, check_slot,
        replace::HightileReplacement,
        source::{ArtFile, ArtView, PixelSource, ReplacementKind, Surface},
        TileConfig, TileError, MAXTILES, MAXUSERTILES, TRANSPARENT_INDEX,
    },
};

use chrono::{DateTime, Utc};

const DIRTY_BLOCKS: usize = MAXTILES / 64;

/// Links between a tile and its rotated copy made by `TileStore::create_rotated`.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct RotTile {
    /// The rotated copy of this tile.
    pub newtile: Option<usize>,
    /// The tile this one is a rotated copy of.
    pub owner: Option<usize>,
}

pub(crate) struct TileEntry {
    // the currently active tile
    pub(crate) texture: Rc<PixelSource>,
    // the base-game tile, restored when map art is closed
    pub(crate) backup: Rc<PixelSource>,
    pub(crate) raw_cache: RawCache,
    pub(crate) anim: PicAnm,
    pub(crate) anim_backup: PicAnm,
    pub(crate) rot: RotTile,
    pub(crate) hightiles: Vec<HightileReplacement>,
    pub(crate) replacement: ReplacementKind,
}

impl TileEntry {
    fn new(placeholder: &Rc<PixelSource>) -> TileEntry {
        TileEntry {
            texture: placeholder.clone(),
            backup: placeholder.clone(),
            raw_cache: RawCache::new(),
            anim: PicAnm::default(),
            anim_backup: PicAnm::default(),
            rot: RotTile::default(),
            hightiles: Vec::new(),
            replacement: ReplacementKind::Art,
        }
    }

    pub(crate) fn is_map_scoped(&self) -> bool {
        !Rc::ptr_eq(&self.texture, &self.backup)
    }

    // a custom tile is only ever replaced by deleting it
    fn check_not_custom(&self, slot: usize) -> Result<(), TileError> {
        match self.replacement {
            ReplacementKind::Art => Ok(()),
            existing => Err(TileError::ReplacementConflict {
                slot,
                existing,
                requested: ReplacementKind::Art,
            }),
        }
    }
}

/// The registry of all tiles.
///
/// One `TileStore` is created at startup and owns every slot, every loaded ART file and every
/// custom tile. The slot index is the tile's identity.
pub struct TileStore {
    placeholder: Rc<PixelSource>,
    pub(crate) entries: Box<[TileEntry]>,

    // base-game archives, kept for the life of the store
    art_files: Vec<Rc<ArtFile>>,

    // archives of the open map art overlay
    pub(crate) per_map_files: Vec<Rc<ArtFile>>,
    pub(crate) current_map_art: Option<String>,

    // cursor of the backward scan in find_unused_tile
    last_unused: Option<usize>,

    dirty: Box<BitSet<DIRTY_BLOCKS>>,
    invalidate_hook: Option<Box<dyn FnMut(usize)>>,
}

impl TileStore {
    /// Creates a store with the placeholder installed in every slot.
    pub fn new() -> TileStore {
        let placeholder = Rc::new(PixelSource::placeholder());
        let entries = (0..MAXTILES)
            .map(|_| TileEntry::new(&placeholder))
            .collect::<Vec<_>>()
            .into_boxed_slice();

        TileStore {
            placeholder,
            entries,
            art_files: Vec::new(),
            per_map_files: Vec::new(),
            current_map_art: None,
            last_unused: Some(MAXUSERTILES - 1),
            dirty: Box::new(BitSet::new()),
            invalidate_hook: None,
        }
    }

    pub fn placeholder(&self) -> &Rc<PixelSource> {
        &self.placeholder
    }

    /// Makes `source` the active texture of `slot`.
    ///
    /// Unless `map_scoped` is set the backup is replaced too, so closing map art keeps this
    /// texture. Fails, changing nothing, if `slot` is out of range, or if `map_scoped` is not set
    /// and the slot holds a custom tile.
    pub fn install(
        &mut self,
        slot: usize,
        source: Rc<PixelSource>,
        map_scoped: bool,
    ) -> Result<(), TileError> {
        check_slot(slot)?;

        let entry = &mut self.entries[slot];
        if !map_scoped {
            entry.check_not_custom(slot)?;
            entry.backup = source.clone();
        }
        entry.texture = source;

        self.invalidate(slot);
        Ok(())
    }

    /// Returns the active texture of `slot`.
    pub fn get_active(&self, slot: usize) -> Option<&Rc<PixelSource>> {
        self.entries.get(slot).map(|e| &e.texture)
    }

    /// Returns the base-game texture of `slot`.
    pub fn backup(&self, slot: usize) -> Option<&Rc<PixelSource>> {
        self.entries.get(slot).map(|e| &e.backup)
    }

    /// Returns true if `slot` currently shows a per-map override.
    pub fn is_map_scoped(&self, slot: usize) -> bool {
        self.entries.get(slot).map_or(false, TileEntry::is_map_scoped)
    }

    pub fn replacement_kind(&self, slot: usize) -> Option<ReplacementKind> {
        self.entries.get(slot).map(|e| e.replacement)
    }

    /// Checks whether `slot` may hold a custom tile of `kind` and creates it if needed.
    ///
    /// For each slot there can be only one custom tile, and its kind never changes. Returns the
    /// existing tile if the slot already has the requested kind. Fails without side effects if
    /// the slot is out of range, shows map art, already holds a different custom kind, or (for
    /// `Restorable`) is empty.
    pub fn validate_custom(
        &mut self,
        slot: usize,
        kind: ReplacementKind,
    ) -> Result<Rc<PixelSource>, TileError> {
        check_slot(slot)?;

        let entry = &self.entries[slot];
        if entry.is_map_scoped() {
            return Err(TileError::MapOverride(slot));
        }

        if entry.replacement == kind {
            return Ok(entry.texture.clone());
        }

        if entry.replacement != ReplacementKind::Art {
            return Err(TileError::ReplacementConflict {
                slot,
                existing: entry.replacement,
                requested: kind,
            });
        }

        let replacement = match kind {
            ReplacementKind::Art => return Ok(entry.texture.clone()),
            ReplacementKind::Writable => PixelSource::writable(),
            ReplacementKind::Restorable => {
                if entry.texture.is_empty() {
                    return Err(TileError::EmptyTile(slot));
                }

                let base = entry.texture.clone();
                let pixels = self.raw_pixels(slot).map(<[u8]>::to_vec).unwrap_or_default();
                PixelSource::restorable(base, pixels)
            }
            ReplacementKind::Canvas => PixelSource::canvas(),
        };

        let replacement = Rc::new(replacement);
        self.install(slot, replacement.clone(), false)?;
        self.entries[slot].replacement = kind;

        debug!("Tile {} is now {}", slot, kind);
        Ok(replacement)
    }

    /// Creates an empty writable tile of the given size and returns its pixels.
    pub fn tile_create(
        &mut self,
        slot: usize,
        width: i32,
        height: i32,
    ) -> Result<RefMut<'_, [u8]>, TileError> {
        check_size(width, height)?;

        let tex = self.validate_custom(slot, ReplacementKind::Writable)?;
        if !tex.resize(width, height) {
            return Err(TileError::InvalidSize { width, height });
        }

        self.invalidate(slot);
        self.tile_data(slot).ok_or(TileError::NotWritable(slot))
    }

    /// Turns an existing tile into a drawable copy of itself and returns its pixels.
    pub fn tile_make_writable(&mut self, slot: usize) -> Result<RefMut<'_, [u8]>, TileError> {
        self.validate_custom(slot, ReplacementKind::Restorable)?;
        self.tile_data(slot).ok_or(TileError::NotWritable(slot))
    }

    /// Resets a tile made writable by `tile_make_writable` to its original pixels.
    pub fn tile_restore(&mut self, slot: usize) -> bool {
        let reloaded = self.entries.get(slot).map_or(false, |e| e.texture.reload());
        if reloaded {
            self.invalidate(slot);
        }
        reloaded
    }

    /// Turns a tile into a render target of the given size.
    pub fn make_canvas(&mut self, slot: usize, width: i32, height: i32) -> Result<(), TileError> {
        check_size(width, height)?;

        let canvas = self.validate_custom(slot, ReplacementKind::Canvas)?;
        if !canvas.resize(width, height) {
            return Err(TileError::InvalidSize { width, height });
        }

        self.invalidate(slot);
        Ok(())
    }

    /// Returns the pixels of a writable tile.
    ///
    /// Callers that draw into the buffer must call `invalidate` afterwards.
    pub fn tile_data(&self, slot: usize) -> Option<RefMut<'_, [u8]>> {
        self.entries.get(slot)?.texture.writable_pixels()
    }

    /// Resets `slot` to the placeholder, dropping any custom tile and all replacements.
    pub fn delete(&mut self, slot: usize) {
        let placeholder = self.placeholder.clone();
        match self.entries.get_mut(slot) {
            Some(entry) => {
                entry.texture = placeholder.clone();
                entry.backup = placeholder;
                entry.replacement = ReplacementKind::Art;
                entry.hightiles.clear();
            }
            None => return,
        }

        self.invalidate(slot);
    }

    /// Gives `slot` a size without pixels. A zero size deletes the tile; negative sizes are
    /// ignored.
    ///
    /// Fails if a side exceeds `MAXTILESIZE` or the slot holds a custom tile.
    pub fn set_dummy(&mut self, slot: usize, width: i32, height: i32) -> Result<(), TileError> {
        check_slot(slot)?;

        if width == 0 || height == 0 {
            self.delete(slot);
        } else if width > 0 && height > 0 {
            check_size(width, height)?;
            let dummy = PixelSource::Dummy {
                width: width as u32,
                height: height as u32,
            };
            self.install(slot, Rc::new(dummy), false)?;
        }

        Ok(())
    }

    /// Drops the decoded pixels of `slot` and marks it dirty for the renderer.
    ///
    /// Must be called after drawing into a tile's pixels.
    pub fn invalidate(&mut self, slot: usize) {
        if let Some(entry) = self.entries.get_mut(slot) {
            entry.raw_cache.clear();
            self.dirty.set(slot);

            if let Some(hook) = self.invalidate_hook.as_mut() {
                hook(slot);
            }
        }
    }

    /// Registers a function called with the slot of every invalidated tile.
    pub fn set_invalidate_hook(&mut self, hook: Box<dyn FnMut(usize)>) {
        self.invalidate_hook = Some(hook);
    }

    /// Returns the slots invalidated since the last call, in ascending order.
    pub fn take_dirty(&mut self) -> Vec<usize> {
        let dirty = self.dirty.iter().collect();
        self.dirty.clear_all();
        dirty
    }

    /// Returns the decoded pixels of `slot`, decoding them on first use.
    ///
    /// Returns `None` for empty tiles. The buffer is column-major, `width * height` bytes.
    pub fn raw_pixels(&mut self, slot: usize) -> Option<&[u8]> {
        let entry = self.entries.get_mut(slot)?;
        if entry.texture.is_empty() {
            return None;
        }

        let texture = &entry.texture;
        Some(entry.raw_cache.get_or_fill(|| texture.decode()))
    }

    /// Decodes `slot` into the cache, returning false if there is nothing to decode.
    pub fn tile_load(&mut self, slot: usize) -> bool {
        self.raw_pixels(slot).is_some()
    }

    /// When the decoded pixels of `slot` were last read.
    pub fn raw_cache_stamp(&self, slot: usize) -> Option<DateTime<Utc>> {
        self.entries.get(slot)?.raw_cache.last_use()
    }

    /// The number of bytes held by all decode caches.
    pub fn cached_bytes(&self) -> usize {
        self.entries.iter().map(|e| e.raw_cache.len()).sum()
    }

    /// Returns true if `slot` holds a tile with a nonzero size.
    pub fn tile_check(&self, slot: usize) -> bool {
        self.entries.get(slot).map_or(false, |e| !e.texture.is_empty())
    }

    pub fn width(&self, slot: usize) -> u32 {
        self.entries.get(slot).map_or(0, |e| e.texture.width())
    }

    pub fn height(&self, slot: usize) -> u32 {
        self.entries.get(slot).map_or(0, |e| e.texture.height())
    }

    pub fn left_offset(&self, slot: usize) -> i32 {
        self.entries.get(slot).map_or(0, |e| e.anim.xofs as i32)
    }

    pub fn top_offset(&self, slot: usize) -> i32 {
        self.entries.get(slot).map_or(0, |e| e.anim.yofs as i32)
    }

    /// The base-2 logarithm of the width, rounded down and clamped to `1..=15`.
    pub fn width_bits(&self, slot: usize) -> u32 {
        size_bits(self.width(slot))
    }

    /// The base-2 logarithm of the height, rounded down and clamped to `1..=15`.
    pub fn height_bits(&self, slot: usize) -> u32 {
        size_bits(self.height(slot))
    }

    pub fn anim(&self, slot: usize) -> Option<PicAnm> {
        self.entries.get(slot).map(|e| e.anim)
    }

    /// Replaces the animation descriptor of `slot`.
    ///
    /// The backup descriptor follows unless the slot is showing map art.
    pub fn set_anim(&mut self, slot: usize, anim: PicAnm) {
        if let Some(entry) = self.entries.get_mut(slot) {
            entry.anim = anim;
            if !entry.is_map_scoped() {
                entry.anim_backup = anim;
            }
        }
    }

    /// Finds the slot whose active texture is `source`.
    ///
    /// The placeholder belongs to no slot.
    pub fn tile_index_of(&self, source: &Rc<PixelSource>) -> Option<usize> {
        if Rc::ptr_eq(source, &self.placeholder) {
            return None;
        }

        self.entries
            .iter()
            .position(|e| Rc::ptr_eq(&e.texture, source))
    }

    pub fn rot_tile(&self, slot: usize) -> Option<RotTile> {
        self.entries.get(slot).map(|e| e.rot)
    }

    /// Every base-game ART file loaded so far.
    pub fn art_files(&self) -> &[Rc<ArtFile>] {
        &self.art_files
    }

    /// Finds a loaded ART file by name, ignoring case.
    pub fn find_file(&self, name: &str) -> Option<&Rc<ArtFile>> {
        self.art_files
            .iter()
            .chain(self.per_map_files.iter())
            .find(|f| f.name().eq_ignore_ascii_case(name))
    }

    /// Loads an ART file and installs its tiles.
    ///
    /// The tiles are installed at the archive's own range, or starting at `first_tile` if given.
    /// Returns the number of tiles in the archive's range. A file that is already loaded is not
    /// loaded again and yields `Ok(0)`.
    pub fn load_art_file(
        &mut self,
        vfs: &Vfs,
        name: &str,
        map_scoped: bool,
        first_tile: Option<usize>,
    ) -> Result<usize, TileError> {
        if self.find_file(name).is_some() {
            debug!("{} already loaded", name);
            return Ok(0);
        }

        let data = art::strip_magic(vfs.read(name)?);
        let header = ArtHeader::parse(name, &data).map_err(|e| {
            warn!("{}", e);
            e
        })?;

        let mut data = data;
        for entry in header.entries() {
            art::swap_transparent(&mut data[entry.offset..entry.offset + entry.len()]);
        }

        let file = Rc::new(ArtFile::new(name, data.into_boxed_slice()));
        if map_scoped {
            self.per_map_files.push(file.clone());
        } else {
            self.art_files.push(file.clone());
        }

        self.add_tiles(&file, &header, map_scoped, first_tile);

        debug!(
            "Loaded {}: tiles {}..={}{}",
            name,
            header.tile_start(),
            header.tile_end(),
            if map_scoped { " (map art)" } else { "" }
        );

        Ok(header.tile_count())
    }

    fn add_tiles(
        &mut self,
        file: &Rc<ArtFile>,
        header: &ArtHeader,
        map_scoped: bool,
        first_tile: Option<usize>,
    ) {
        let start = first_tile.unwrap_or_else(|| header.tile_start());

        for entry in header.entries().iter().filter(|e| !e.is_empty()) {
            let slot = start + entry.index;
            let view = ArtView::new(
                file.clone(),
                entry.offset,
                entry.width as u32,
                entry.height as u32,
            );

            let source = Rc::new(PixelSource::Archive(view));
            if let Err(e) = self.install(slot, source, map_scoped) {
                debug!("{}: {}", file.name(), e);
                continue;
            }

            trace!("tile {}: {}x{}", slot, entry.width, entry.height);
            let anim = PicAnm::from_packed(entry.anim);
            let tile = &mut self.entries[slot];
            tile.anim = anim;
            if !map_scoped {
                tile.anim_backup = anim;
            }
        }
    }

    /// Loads the base ART set named by `config`, then its extra ART files.
    ///
    /// Missing base files are skipped. Returns the number of tiles loaded.
    pub fn load_art_set(&mut self, vfs: &Vfs, config: &TileConfig) -> usize {
        let mut total = 0;

        for index in 0..MAXARTFILES_BASE {
            let name = config.art_file_name(index);
            match self.load_art_file(vfs, &name, false, None) {
                Ok(count) => total += count,
                Err(ref e) if e.is_not_found() => (),
                Err(e) => warn!("Skipping {}: {}", name, e),
            }
        }

        for name in config.added_art.iter() {
            match self.load_art_file(vfs, name, false, None) {
                Ok(count) => total += count,
                Err(e) => warn!("Skipping {}: {}", name, e),
            }
        }

        total
    }

    /// Finds an empty user slot, scanning down from the top of the user range.
    ///
    /// The scan resumes where the previous call stopped.
    pub fn find_unused_tile(&mut self) -> Option<usize> {
        let mut cursor = self.last_unused?;

        loop {
            if self.entries[cursor].texture.is_empty() {
                self.last_unused = Some(cursor);
                return Some(cursor);
            }

            if cursor == 0 {
                self.last_unused = None;
                return None;
            }

            cursor -= 1;
        }
    }

    /// Creates a copy of `slot` rotated a quarter turn and returns the new slot.
    ///
    /// Returns `slot` itself if it is empty or no unused slot is left.
    pub fn create_rotated(&mut self, slot: usize) -> usize {
        let tex = match self.entries.get(slot) {
            Some(e) if !e.texture.is_empty() => e.texture.clone(),
            _ => return slot,
        };

        let (width, height) = (tex.width() as usize, tex.height() as usize);
        let src = tex.decode();
        let mut dst = vec![0; src.len()];

        for x in 0..width {
            let xofs = width - x - 1;
            let yofs = height * x;

            for y in 0..height {
                dst[y * width + xofs] = src[y + yofs];
            }
        }

        let index = match self.find_unused_tile() {
            Some(i) => i,
            None => {
                warn!("No unused tile left for rotated copy of {}", slot);
                return slot;
            }
        };

        let map_scoped = self.is_map_scoped(slot);
        let rotated = Surface::new(height as u32, width as u32, dst);
        if let Err(e) = self.install(index, Rc::new(PixelSource::Loose(rotated)), map_scoped) {
            warn!("Can't store rotated copy of {}: {}", slot, e);
            return slot;
        }

        self.entries[slot].rot.newtile = Some(index);
        self.entries[index].rot.owner = Some(slot);
        index
    }

    /// Copies a tile into `tile`, optionally translating its palette, and updates its offsets.
    ///
    /// With no other `source` and no `remap` only the animation descriptor of `tile` changes.
    /// Offsets default to the source's; given offsets are clamped to a signed byte. The source's
    /// miscellaneous flags and `flags` are merged into the descriptor.
    pub fn copy_tile(
        &mut self,
        tile: usize,
        source: Option<usize>,
        remap: Option<&[u8; 256]>,
        xoffset: Option<i32>,
        yoffset: Option<i32>,
        flags: AnimFlags,
    ) -> Result<(), TileError> {
        let source = source.unwrap_or(tile);
        check_slot(tile)?;
        check_slot(source)?;

        let source_anim = self.entries[source].anim;

        if source != tile || remap.is_some() {
            self.entries[tile].check_not_custom(tile)?;

            let src = self.entries[source].texture.clone();
            let mut pixels = src.decode();
            if let Some(remap) = remap {
                for p in pixels.iter_mut() {
                    *p = remap[*p as usize];
                }
            }

            let copy = Surface::new(src.width(), src.height(), pixels);
            self.install(tile, Rc::new(PixelSource::Loose(copy)), false)?;
        }

        let mut anim = self.entries[tile].anim;
        match xoffset {
            Some(x) => anim.set_xofs(x),
            None => anim.xofs = source_anim.xofs,
        }
        match yoffset {
            Some(y) => anim.set_yofs(y),
            None => anim.yofs = source_anim.yofs,
        }
        anim.sf = (anim.sf & !MISC_MASK) | (source_anim.sf & MISC_MASK) | flags.bits();
        self.set_anim(tile, anim);

        Ok(())
    }

    /// Blits a `width` x `height` block of `src` at (`sx`, `sy`) into the writable tile `dst` at
    /// (`dx`, `dy`).
    ///
    /// Source coordinates wrap around, destination pixels outside the tile are dropped, and
    /// transparent source pixels are skipped.
    pub fn copy_section(
        &mut self,
        src: usize,
        sx: i32,
        sy: i32,
        width: i32,
        height: i32,
        dst: usize,
        dx: i32,
        dy: i32,
    ) -> Result<(), TileError> {
        check_slot(src)?;
        check_slot(dst)?;

        let (w1, h1) = (self.width(src) as i32, self.height(src) as i32);
        let (w2, h2) = (self.width(dst) as i32, self.height(dst) as i32);

        if w1 > 0 && h1 > 0 && w2 > 0 && h2 > 0 {
            self.tile_load(src);

            let entries = &self.entries;
            let p1 = entries[src].raw_cache.peek().unwrap_or(&[]);
            let mut p2 = entries[dst]
                .texture
                .writable_pixels()
                .ok_or(TileError::NotWritable(dst))?;

            let mut x1 = sx;
            let mut x2 = dx;
            for _ in 0..width {
                let mut y1 = sy;
                let mut y2 = dy;
                for _ in 0..height {
                    let (src_ok, dst_ok) = (
                        x1 >= 0 && y1 >= 0 && x1 < w1 && y1 < h1,
                        x2 >= 0 && y2 >= 0 && x2 < w2 && y2 < h2,
                    );

                    if src_ok && dst_ok {
                        let pixel = p1[(x1 * h1 + y1) as usize];
                        if pixel != TRANSPARENT_INDEX {
                            p2[(x2 * h2 + y2) as usize] = pixel;
                        }
                    }

                    y1 += 1;
                    y2 += 1;
                    if y1 >= h1 {
                        y1 = 0;
                    }
                }

                x1 += 1;
                x2 += 1;
                if x1 >= w1 {
                    x1 = 0;
                }
            }
        }

        self.invalidate(dst);
        Ok(())
    }

    /// Computes the CRC32 of an ART tile's pixels as stored on disk.
    ///
    /// Returns `None` for tiles that do not come from an ART file.
    pub fn crc32(&self, slot: usize) -> Option<u32> {
        let view = self.entries.get(slot)?.texture.art_view()?;
        let pixels = view.pixels();
        if pixels.is_empty() {
            return None;
        }

        Some(art::art_crc32(pixels))
    }
}

impl Default for TileStore {
    fn default() -> Self {
        TileStore::new()
    }
}

fn size_bits(size: u32) -> u32 {
    let mut j = 15;
    while j > 1 && (1 << j) > size {
        j -= 1;
    }
    j
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;

    use std::cell::RefCell;

    use crate::tile::{art::test::build_art, MAXTILESIZE};

    /// A 2x2 tile at 10 and a 1x3 tile at 12, with an empty slot at 11.
    pub fn sample_art() -> Vec<u8> {
        build_art(
            10,
            &[
                (2, 2, 0x0302_0001, vec![0, 255, 7, 1]),
                (0, 0, 0, vec![]),
                (1, 3, 0, vec![4, 0, 6]),
            ],
        )
    }

    pub fn vfs_with<S>(files: Vec<(S, Vec<u8>)>) -> Vfs
    where
        S: AsRef<str>,
    {
        let mut vfs = Vfs::new();
        vfs.add_memory(files);
        vfs
    }

    fn loaded_store() -> TileStore {
        let vfs = vfs_with(vec![("tiles000.art", sample_art())]);
        let mut store = TileStore::new();
        assert_eq!(store.load_art_file(&vfs, "tiles000.art", false, None).unwrap(), 3);
        store
    }

    #[test]
    fn test_new_store_is_all_placeholder() {
        let store = TileStore::new();
        for slot in [0, 1, MAXUSERTILES, MAXTILES - 1].iter().copied() {
            let tex = store.get_active(slot).unwrap();
            assert!(Rc::ptr_eq(tex, store.placeholder()));
            assert!(!store.tile_check(slot));
        }
        assert!(store.get_active(MAXTILES).is_none());
    }

    #[test]
    fn test_load_installs_and_swaps_transparency() {
        let mut store = loaded_store();

        assert_eq!((store.width(10), store.height(10)), (2, 2));
        assert_eq!((store.width(12), store.height(12)), (1, 3));
        assert!(!store.tile_check(11));
        assert!(store.get_active(10).unwrap().is_archive());

        assert_eq!(store.raw_pixels(10).unwrap(), &[255, 0, 7, 1]);
        assert_eq!(store.raw_pixels(12).unwrap(), &[4, 255, 6]);
        assert!(store.raw_pixels(11).is_none());

        let anim = store.anim(10).unwrap();
        assert_eq!(anim.num, 1);
        assert_eq!(anim.xofs, 0);
        assert_eq!(anim.yofs, 2);
        assert_eq!(store.left_offset(10), 0);
        assert_eq!(store.top_offset(10), 2);
    }

    #[test]
    fn test_archive_tiles_share_one_buffer() {
        let store = loaded_store();
        let a = store.get_active(10).unwrap().art_view().unwrap();
        let b = store.get_active(12).unwrap().art_view().unwrap();

        assert!(Rc::ptr_eq(a.file(), b.file()));
        assert!(Rc::ptr_eq(a.file(), &store.art_files()[0]));
    }

    #[test]
    fn test_crc_matches_disk_bytes() {
        let store = loaded_store();

        assert_eq!(store.crc32(10), Some(crc32fast::hash(&[0, 255, 7, 1])));
        assert_eq!(store.crc32(12), Some(crc32fast::hash(&[4, 0, 6])));
        assert_eq!(store.crc32(11), None);
    }

    #[test]
    fn test_first_tile_override() {
        let vfs = vfs_with(vec![("moved.art", sample_art())]);
        let mut store = TileStore::new();
        store.load_art_file(&vfs, "moved.art", false, Some(500)).unwrap();

        assert!(!store.tile_check(10));
        assert!(store.tile_check(500));
        assert!(!store.tile_check(501));
        assert!(store.tile_check(502));
    }

    #[test]
    fn test_buildart_prefix() {
        let mut data = b"BUILDART".to_vec();
        data.extend(sample_art());
        let vfs = vfs_with(vec![("prefixed.art", data)]);

        let mut store = TileStore::new();
        assert_eq!(store.load_art_file(&vfs, "prefixed.art", false, None).unwrap(), 3);
        assert_eq!(store.raw_pixels(12).unwrap(), &[4, 255, 6]);
    }

    #[test]
    fn test_first_tile_past_end_is_skipped() {
        let vfs = vfs_with(vec![("edge.art", sample_art())]);
        let mut store = TileStore::new();

        let count = store
            .load_art_file(&vfs, "edge.art", false, Some(MAXTILES - 2))
            .unwrap();
        assert_eq!(count, 3);
        assert_eq!((store.width(MAXTILES - 2), store.height(MAXTILES - 2)), (2, 2));
        assert!(!store.tile_check(MAXTILES - 1));
        assert!(store.get_active(MAXTILES).is_none());
    }

    #[test]
    fn test_out_of_range_archive_installs_nothing() {
        let vfs = vfs_with(vec![("far.art", build_art(40000, &[(2, 2, 0, vec![1; 4])]))]);
        let mut store = TileStore::new();

        match store.load_art_file(&vfs, "far.art", false, None) {
            Err(TileError::Format { .. }) => (),
            other => panic!("expected format error, got {:?}", other),
        }
        assert!(store.art_files().is_empty());
        assert!((0..MAXTILES).all(|slot| !store.tile_check(slot)));
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let vfs = Vfs::new();
        let mut store = TileStore::new();

        let err = store.load_art_file(&vfs, "nowhere.art", false, None).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_duplicate_load_is_noop() {
        let vfs = vfs_with(vec![("tiles000.art", sample_art())]);
        let mut store = TileStore::new();

        store.load_art_file(&vfs, "tiles000.art", false, None).unwrap();
        let first = store.get_active(10).unwrap().clone();

        assert_eq!(store.load_art_file(&vfs, "TILES000.ART", false, None).unwrap(), 0);
        assert_eq!(store.art_files().len(), 1);
        assert!(Rc::ptr_eq(store.get_active(10).unwrap(), &first));
    }

    #[test]
    fn test_load_art_set() {
        let vfs = vfs_with(vec![
            ("tiles000.art", sample_art()),
            ("tiles001.art", build_art(20, &[(1, 1, 0, vec![9])])),
            ("extra.art", build_art(30, &[(1, 1, 0, vec![8])])),
        ]);
        let config = TileConfig {
            added_art: vec!["extra.art".to_owned()],
            ..TileConfig::default()
        };

        let mut store = TileStore::new();
        assert_eq!(store.load_art_set(&vfs, &config), 5);
        assert!(store.tile_check(20));
        assert!(store.tile_check(30));
        assert_eq!(store.art_files().len(), 3);
    }

    #[test]
    fn test_restorable_rejects_writable() {
        let mut store = loaded_store();

        let restorable = store.validate_custom(10, ReplacementKind::Restorable).unwrap();
        assert_eq!(restorable.decode(), vec![255, 0, 7, 1]);

        match store.validate_custom(10, ReplacementKind::Writable) {
            Err(TileError::ReplacementConflict { existing, .. }) => {
                assert_eq!(existing, ReplacementKind::Restorable)
            }
            other => panic!("expected conflict, got {:?}", other),
        }
        assert!(Rc::ptr_eq(store.get_active(10).unwrap(), &restorable));
        assert_eq!(store.replacement_kind(10), Some(ReplacementKind::Restorable));

        let again = store.validate_custom(10, ReplacementKind::Restorable).unwrap();
        assert!(Rc::ptr_eq(&again, &restorable));
    }

    #[test]
    fn test_validate_rejects_map_art_and_bad_slots() {
        let mut store = loaded_store();
        let map_tile = Rc::new(PixelSource::Dummy {
            width: 4,
            height: 4,
        });
        store.install(10, map_tile, true).unwrap();

        assert!(store.is_map_scoped(10));
        match store.validate_custom(10, ReplacementKind::Canvas) {
            Err(TileError::MapOverride(10)) => (),
            other => panic!("expected map override, got {:?}", other),
        }
        assert_eq!(store.replacement_kind(10), Some(ReplacementKind::Art));

        assert!(store.validate_custom(MAXTILES, ReplacementKind::Writable).is_err());
        match store.validate_custom(11, ReplacementKind::Restorable) {
            Err(TileError::EmptyTile(11)) => (),
            other => panic!("expected empty tile, got {:?}", other),
        }
    }

    #[test]
    fn test_tile_create_and_draw() {
        let mut store = TileStore::new();
        {
            let mut pixels = store.tile_create(100, 2, 3).unwrap();
            assert_eq!(pixels.len(), 6);
            pixels[5] = 42;
        }
        store.invalidate(100);

        assert_eq!(store.replacement_kind(100), Some(ReplacementKind::Writable));
        assert_eq!(store.raw_pixels(100).unwrap(), &[0, 0, 0, 0, 0, 42]);
        assert!(store.tile_create(100, 0, 3).is_err());
        assert!(store.tile_create(MAXTILES, 2, 2).is_err());
    }

    #[test]
    fn test_make_writable_and_restore() {
        let mut store = loaded_store();
        store.tile_make_writable(12).unwrap()[0] = 77;
        store.invalidate(12);
        assert_eq!(store.raw_pixels(12).unwrap(), &[77, 255, 6]);

        store.take_dirty();
        assert!(store.tile_restore(12));
        assert_eq!(store.take_dirty(), vec![12]);
        assert_eq!(store.raw_pixels(12).unwrap(), &[4, 255, 6]);

        assert!(!store.tile_restore(10));
        assert!(store.take_dirty().is_empty());
    }

    #[test]
    fn test_size_readable_while_drawing() {
        let mut store = TileStore::new();
        store.tile_create(100, 4, 6).unwrap();

        let mut pixels = store.tile_data(100).unwrap();
        pixels[0] = 9;
        assert_eq!((store.width(100), store.height(100)), (4, 6));
        assert!(store.tile_check(100));
        assert_eq!(store.width_bits(100), 2);
    }

    #[test]
    fn test_oversized_tiles_rejected() {
        let mut store = TileStore::new();

        for result in vec![
            store.set_dummy(5, 70000, 70000),
            store.set_dummy(5, MAXTILESIZE + 1, 1),
            store.make_canvas(6, 1, 70000),
            store.tile_create(7, 70000, 2).map(|_| ()),
        ] {
            match result {
                Err(TileError::InvalidSize { .. }) => (),
                other => panic!("expected invalid size, got {:?}", other),
            }
        }

        assert!(!store.tile_check(5));
        assert_eq!(store.replacement_kind(6), Some(ReplacementKind::Art));
        assert_eq!(store.replacement_kind(7), Some(ReplacementKind::Art));

        store.set_dummy(5, MAXTILESIZE, 2).unwrap();
        assert_eq!(store.raw_pixels(5).unwrap().len(), MAXTILESIZE as usize * 2);
    }

    #[test]
    fn test_custom_tile_survives_installs() {
        let vfs = vfs_with(vec![("tiles000.art", sample_art())]);
        let mut store = TileStore::new();
        store.tile_create(10, 4, 4).unwrap();

        match store.set_dummy(10, 8, 8) {
            Err(TileError::ReplacementConflict { existing, .. }) => {
                assert_eq!(existing, ReplacementKind::Writable)
            }
            other => panic!("expected conflict, got {:?}", other),
        }

        // the archive's tile 10 is skipped, tile 12 still loads
        store.load_art_file(&vfs, "tiles000.art", false, None).unwrap();
        assert!(store.tile_check(12));

        assert_eq!(store.replacement_kind(10), Some(ReplacementKind::Writable));
        assert_eq!((store.width(10), store.height(10)), (4, 4));
        assert!(store.tile_data(10).is_some());
        assert!(store.tile_create(10, 4, 4).is_ok());

        // deleting releases the slot
        store.delete(10);
        assert!(store.set_dummy(10, 8, 8).is_ok());
    }

    #[test]
    fn test_make_canvas() {
        let mut store = TileStore::new();
        store.make_canvas(200, 128, 64).unwrap();

        assert_eq!((store.width(200), store.height(200)), (128, 64));
        assert_eq!(store.replacement_kind(200), Some(ReplacementKind::Canvas));
        assert!(store.tile_data(200).is_none());
        assert!(store.tile_create(200, 4, 4).is_err());
    }

    #[test]
    fn test_delete_resets_slot() {
        let mut store = loaded_store();
        store.tile_make_writable(10).unwrap();
        store.delete(10);

        assert!(Rc::ptr_eq(store.get_active(10).unwrap(), store.placeholder()));
        assert!(Rc::ptr_eq(store.backup(10).unwrap(), store.placeholder()));
        assert_eq!(store.replacement_kind(10), Some(ReplacementKind::Art));

        // a deleted slot may take another custom kind
        assert!(store.make_canvas(10, 8, 8).is_ok());
    }

    #[test]
    fn test_set_dummy() {
        let mut store = loaded_store();
        store.set_dummy(300, 16, 8).unwrap();
        assert_eq!((store.width(300), store.height(300)), (16, 8));
        assert_eq!(store.raw_pixels(300).unwrap(), &[0; 128][..]);

        store.set_dummy(300, -1, 8).unwrap();
        assert!(store.tile_check(300));

        store.set_dummy(10, 0, 5).unwrap();
        assert!(!store.tile_check(10));
    }

    #[test]
    fn test_size_bits() {
        let mut store = TileStore::new();
        store.set_dummy(1, 64, 100).unwrap();
        assert_eq!(store.width_bits(1), 6);
        assert_eq!(store.height_bits(1), 6);
        assert_eq!(store.width_bits(2), 1);
    }

    #[test]
    fn test_find_unused_scans_down() {
        let mut store = TileStore::new();
        assert_eq!(store.find_unused_tile(), Some(MAXUSERTILES - 1));

        store.set_dummy(MAXUSERTILES - 1, 1, 1).unwrap();
        store.set_dummy(MAXUSERTILES - 2, 1, 1).unwrap();
        assert_eq!(store.find_unused_tile(), Some(MAXUSERTILES - 3));
    }

    #[test]
    fn test_user_range_exhausted() {
        let mut store = loaded_store();
        for slot in 0..MAXUSERTILES {
            if !store.tile_check(slot) {
                store.set_dummy(slot, 1, 1).unwrap();
            }
        }

        assert_eq!(store.find_unused_tile(), None);
        assert_eq!(store.find_unused_tile(), None);
        assert_eq!(store.create_rotated(10), 10);
        assert_eq!(store.rot_tile(10).unwrap().newtile, None);
    }

    #[test]
    fn test_tile_index_of() {
        let store = loaded_store();

        let tex = store.get_active(12).unwrap().clone();
        assert_eq!(store.tile_index_of(&tex), Some(12));
        assert_eq!(store.tile_index_of(store.placeholder()), None);

        let stray = Rc::new(PixelSource::Dummy {
            width: 1,
            height: 1,
        });
        assert_eq!(store.tile_index_of(&stray), None);
    }

    #[test]
    fn test_create_rotated() {
        let vfs = vfs_with(vec![("r.art", build_art(5, &[(2, 3, 0, vec![1, 2, 3, 4, 5, 6])]))]);
        let mut store = TileStore::new();
        store.load_art_file(&vfs, "r.art", false, None).unwrap();

        let rotated = store.create_rotated(5);
        assert_eq!(rotated, MAXUSERTILES - 1);
        assert_eq!((store.width(rotated), store.height(rotated)), (3, 2));

        assert_eq!(store.raw_pixels(rotated).unwrap(), &[4, 1, 5, 2, 6, 3]);

        assert_eq!(store.rot_tile(5).unwrap().newtile, Some(rotated));
        assert_eq!(store.rot_tile(rotated).unwrap().owner, Some(5));
        assert_eq!(store.create_rotated(6), 6);
    }

    #[test]
    fn test_copy_tile_with_remap() {
        let mut store = loaded_store();
        let mut remap = [0u8; 256];
        for (i, entry) in remap.iter_mut().enumerate() {
            *entry = (i as u8).wrapping_add(1);
        }

        store
            .copy_tile(50, Some(10), Some(&remap), Some(300), None, AnimFlags::TEX_HITSCAN)
            .unwrap();

        assert_eq!(store.raw_pixels(50).unwrap(), &[0, 1, 8, 2]);
        let anim = store.anim(50).unwrap();
        assert_eq!(anim.xofs, 127);
        assert_eq!(anim.yofs, 2);
        assert!(anim.flags().contains(AnimFlags::TEX_HITSCAN));

        // the original is untouched
        assert_eq!(store.raw_pixels(10).unwrap(), &[255, 0, 7, 1]);
    }

    #[test]
    fn test_copy_tile_offsets_only() {
        let mut store = loaded_store();
        let before = store.get_active(10).unwrap().clone();

        store
            .copy_tile(10, None, None, Some(-5), Some(6), AnimFlags::empty())
            .unwrap();

        assert!(Rc::ptr_eq(store.get_active(10).unwrap(), &before));
        assert_eq!(store.left_offset(10), -5);
        assert_eq!(store.top_offset(10), 6);
    }

    #[test]
    fn test_copy_tile_refuses_custom_destination() {
        let mut store = loaded_store();
        store.make_canvas(60, 4, 4).unwrap();

        assert!(store
            .copy_tile(60, Some(10), None, None, None, AnimFlags::empty())
            .is_err());
        assert_eq!(store.replacement_kind(60), Some(ReplacementKind::Canvas));
    }

    #[test]
    fn test_copy_section_skips_transparent() {
        let mut store = loaded_store();
        store.tile_create(70, 3, 3).unwrap();

        // tile 10 decodes to [255, 0, 7, 1]: (0,0)=255 (0,1)=0 (1,0)=7 (1,1)=1
        store.copy_section(10, 0, 0, 2, 2, 70, 1, 1).unwrap();

        let pixels = store.raw_pixels(70).unwrap();
        assert_eq!(pixels, &[0, 0, 0, 0, 255, 0, 0, 7, 1]);
    }

    #[test]
    fn test_copy_section_needs_writable_destination() {
        let mut store = loaded_store();
        match store.copy_section(10, 0, 0, 1, 1, 12, 0, 0) {
            Err(TileError::NotWritable(12)) => (),
            other => panic!("expected not writable, got {:?}", other),
        }
    }

    #[test]
    fn test_invalidate_marks_dirty_and_clears_cache() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut store = loaded_store();
        store.take_dirty();

        let hook_seen = seen.clone();
        store.set_invalidate_hook(Box::new(move |slot| hook_seen.borrow_mut().push(slot)));

        store.raw_pixels(12);
        assert!(store.cached_bytes() > 0);
        let stamp = store.raw_cache_stamp(12);
        assert!(stamp.is_some());

        store.invalidate(12);
        store.invalidate(3);
        assert_eq!(store.cached_bytes(), 0);
        assert_eq!(store.raw_cache_stamp(12), stamp);
        assert_eq!(store.take_dirty(), vec![3, 12]);
        assert!(store.take_dirty().is_empty());
        assert_eq!(*seen.borrow(), vec![12, 3]);
    }
}
