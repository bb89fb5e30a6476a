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

//! Per-map ART overlays.
//!
//! A map may ship ART files named `<map>_00.art` to `<map>_19.art` that replace tiles while the
//! map is loaded. Their tiles are installed without touching the backups, so closing the overlay
//! is a copy of every backup back into the active slot.

use std::rc::Rc;

use crate::{
    common::vfs::Vfs,
    tile::{
        art::{MAXARTFILES_BASE, MAXARTFILES_TOTAL},
        store::TileStore,
        TileConfig, TileError,
    },
};

/// The number of per-map ART files probed for each map.
pub const MAX_MAP_ART_FILES: usize = MAXARTFILES_TOTAL - MAXARTFILES_BASE;

/// The file name of per-map ART file `index` for `prefix`.
pub fn map_art_file_name(prefix: &str, index: usize) -> String {
    format!("{}_{:02}.art", prefix, index)
}

impl TileStore {
    /// The prefix of the open map art overlay, if any.
    pub fn current_map_art(&self) -> Option<&str> {
        self.current_map_art.as_ref().map(String::as_str)
    }

    /// Opens the map art overlay for `prefix`, closing any other one first.
    ///
    /// Does nothing if the overlay for `prefix` is already open. If `<prefix>_00.art` does not
    /// exist the store is left with only the base tiles. Returns the number of ART files loaded.
    pub fn open_map_art(
        &mut self,
        vfs: &Vfs,
        config: &TileConfig,
        prefix: &str,
    ) -> Result<usize, TileError> {
        if let Some(ref current) = self.current_map_art {
            if current.eq_ignore_ascii_case(prefix) {
                return Ok(0);
            }
        }

        self.close_map_art();

        if !config.map_art {
            return Ok(0);
        }

        if !vfs.contains(map_art_file_name(prefix, 0)) {
            debug!("No map art for {}", prefix);
            return Ok(0);
        }

        self.current_map_art = Some(prefix.to_owned());

        let mut loaded = 0;
        for index in 0..MAX_MAP_ART_FILES {
            let name = map_art_file_name(prefix, index);
            match self.load_art_file(vfs, &name, true, None) {
                Ok(_) => loaded += 1,
                Err(ref e) if e.is_not_found() => (),
                Err(e) => warn!("Skipping {}: {}", name, e),
            }
        }

        debug!("Opened map art {} ({} files)", prefix, loaded);
        Ok(loaded)
    }

    /// Drops the open map art overlay and restores the base tiles.
    pub fn close_map_art(&mut self) {
        self.per_map_files.clear();
        self.current_map_art = None;

        let mut restored = Vec::new();
        for (slot, entry) in self.entries.iter_mut().enumerate() {
            if !Rc::ptr_eq(&entry.texture, &entry.backup) {
                entry.texture = entry.backup.clone();
                restored.push(slot);
            }
            entry.anim = entry.anim_backup;
        }

        for slot in restored {
            self.invalidate(slot);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use crate::tile::{
        art::test::build_art,
        store::test::{sample_art, vfs_with},
    };

    fn map_vfs() -> Vfs {
        vfs_with(vec![
            ("tiles000.art", sample_art()),
            (
                "e1m1_00.art",
                build_art(5, &[(4, 4, 0x0000_0100, vec![3; 16]), (0, 0, 0, vec![])]),
            ),
            ("E1M1_01.ART", build_art(9, &[(1, 1, 0, vec![5])])),
            ("e1m2_00.art", build_art(10, &[(3, 1, 0, vec![1, 2, 3])])),
        ])
    }

    fn base_store(vfs: &Vfs) -> TileStore {
        let mut store = TileStore::new();
        store.load_art_set(vfs, &TileConfig::default());
        store
    }

    #[test]
    fn test_close_restores_backup() {
        let vfs = map_vfs();
        let mut store = base_store(&vfs);
        let before: Vec<_> = [5, 9, 10]
            .iter()
            .map(|&s| (store.get_active(s).unwrap().clone(), store.anim(s)))
            .collect();

        assert_eq!(store.open_map_art(&vfs, &TileConfig::default(), "e1m1").unwrap(), 2);
        assert_eq!(store.current_map_art(), Some("e1m1"));
        assert!(store.is_map_scoped(5));
        assert!(store.is_map_scoped(9));
        assert!(!store.is_map_scoped(10));
        assert_eq!(store.width(5), 4);
        assert_eq!(store.left_offset(5), 1);

        // backups are never touched by map art
        assert!(Rc::ptr_eq(store.backup(5).unwrap(), &before[0].0));

        store.close_map_art();
        assert_eq!(store.current_map_art(), None);
        for (&slot, (tex, anim)) in [5, 9, 10].iter().zip(before.iter()) {
            assert!(Rc::ptr_eq(store.get_active(slot).unwrap(), tex));
            assert!(Rc::ptr_eq(store.get_active(slot).unwrap(), store.backup(slot).unwrap()));
            assert_eq!(store.anim(slot), *anim);
        }
        assert_eq!(store.left_offset(5), 0);
    }

    #[test]
    fn test_reopen_same_map_is_noop() {
        let vfs = map_vfs();
        let config = TileConfig::default();
        let mut store = base_store(&vfs);

        store.open_map_art(&vfs, &config, "e1m1").unwrap();
        let overlay = store.get_active(5).unwrap().clone();

        assert_eq!(store.open_map_art(&vfs, &config, "E1M1").unwrap(), 0);
        assert!(Rc::ptr_eq(store.get_active(5).unwrap(), &overlay));
    }

    #[test]
    fn test_switch_maps() {
        let vfs = map_vfs();
        let config = TileConfig::default();
        let mut store = base_store(&vfs);

        store.open_map_art(&vfs, &config, "e1m1").unwrap();
        assert_eq!(store.open_map_art(&vfs, &config, "e1m2").unwrap(), 1);

        assert!(!store.is_map_scoped(5));
        assert!(store.is_map_scoped(10));
        assert_eq!((store.width(10), store.height(10)), (3, 1));
        assert_eq!(store.current_map_art(), Some("e1m2"));
    }

    #[test]
    fn test_missing_map_art_closes() {
        let vfs = map_vfs();
        let config = TileConfig::default();
        let mut store = base_store(&vfs);

        store.open_map_art(&vfs, &config, "e1m1").unwrap();
        assert_eq!(store.open_map_art(&vfs, &config, "e4m9").unwrap(), 0);

        assert_eq!(store.current_map_art(), None);
        assert!(!store.is_map_scoped(5));
        assert!(!store.is_map_scoped(9));
    }

    #[test]
    fn test_missing_map_art_is_probed_again() {
        let config = TileConfig::default();
        let vfs = map_vfs();
        let mut store = base_store(&vfs);

        assert_eq!(store.open_map_art(&vfs, &config, "e2m1").unwrap(), 0);
        assert_eq!(store.current_map_art(), None);
        assert_eq!(store.open_map_art(&vfs, &config, "e2m1").unwrap(), 0);
        assert_eq!(store.current_map_art(), None);

        // the same prefix picks up files that appear later
        let mut later = map_vfs();
        later.add_memory(vec![("e2m1_00.art", build_art(7, &[(1, 1, 0, vec![2])]))]);
        assert_eq!(store.open_map_art(&later, &config, "e2m1").unwrap(), 1);
        assert_eq!(store.current_map_art(), Some("e2m1"));
        assert!(store.is_map_scoped(7));
    }

    #[test]
    fn test_bad_map_file_is_skipped() {
        let mut broken = build_art(10, &[(2, 2, 0, vec![9; 4])]);
        broken[0] = 2;

        let vfs = vfs_with(vec![
            ("tiles000.art", sample_art()),
            ("e3m1_00.art", build_art(5, &[(1, 1, 0, vec![1])])),
            ("e3m1_01.art", broken),
            ("e3m1_02.art", build_art(20, &[(2, 1, 0, vec![1, 2])])),
        ]);
        let mut store = base_store(&vfs);
        let base = store.get_active(10).unwrap().clone();

        assert_eq!(store.open_map_art(&vfs, &TileConfig::default(), "e3m1").unwrap(), 2);
        assert!(store.is_map_scoped(5));
        assert!(store.is_map_scoped(20));
        assert!(!store.is_map_scoped(10));
        assert!(Rc::ptr_eq(store.get_active(10).unwrap(), &base));
        assert_eq!(store.raw_pixels(10).unwrap(), &[255, 0, 7, 1]);
    }

    #[test]
    fn test_map_art_disabled() {
        let vfs = map_vfs();
        let config = TileConfig {
            map_art: false,
            ..TileConfig::default()
        };
        let mut store = base_store(&vfs);

        assert_eq!(store.open_map_art(&vfs, &config, "e1m1").unwrap(), 0);
        assert!(!store.is_map_scoped(5));
    }

    #[test]
    fn test_map_art_blocks_custom_tiles() {
        let vfs = map_vfs();
        let mut store = base_store(&vfs);
        store.open_map_art(&vfs, &TileConfig::default(), "e1m1").unwrap();

        assert!(store.tile_create(5, 2, 2).is_err());
        store.close_map_art();
        assert!(store.tile_create(5, 2, 2).is_ok());
    }

    #[test]
    fn test_map_file_names() {
        assert_eq!(map_art_file_name("e1m1", 0), "e1m1_00.art");
        assert_eq!(map_art_file_name("e1m1", 19), "e1m1_19.art");
        assert_eq!(MAX_MAP_ART_FILES, 20);
    }
}
