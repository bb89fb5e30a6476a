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

use crate::common::console::{ConsoleError, CvarRegistry};

/// Settings read from the cvar registry.
#[derive(Clone, Debug, PartialEq)]
pub struct TileConfig {
    /// Base name of the ART set; files are `<art_base>NNN.art`.
    pub art_base: String,

    /// Extra ART files loaded after the base set.
    pub added_art: Vec<String>,

    /// Whether per-map ART overlays are loaded.
    pub map_art: bool,
}

impl TileConfig {
    pub fn register_cvars(cvars: &CvarRegistry) -> Result<(), ConsoleError> {
        cvars.register("r_artbase", "tiles")?;
        cvars.register("r_addart", "")?;
        cvars.register("r_maparts", "1")?;
        Ok(())
    }

    pub fn from_cvars(cvars: &CvarRegistry) -> Result<TileConfig, ConsoleError> {
        Ok(TileConfig {
            art_base: cvars.get("r_artbase")?,
            added_art: cvars
                .get("r_addart")?
                .split_whitespace()
                .map(str::to_owned)
                .collect(),
            map_art: cvars.get_value("r_maparts")? != 0.0,
        })
    }

    /// The file name of base ART file `index`.
    pub fn art_file_name(&self, index: usize) -> String {
        format!("{}{:03}.art", self.art_base, index)
    }
}

impl Default for TileConfig {
    fn default() -> Self {
        TileConfig {
            art_base: "tiles".to_owned(),
            added_art: Vec::new(),
            map_art: true,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_defaults_match_cvars() {
        let cvars = CvarRegistry::new();
        TileConfig::register_cvars(&cvars).unwrap();

        assert_eq!(TileConfig::from_cvars(&cvars).unwrap(), TileConfig::default());
    }

    #[test]
    fn test_added_art_list() {
        let cvars = CvarRegistry::new();
        TileConfig::register_cvars(&cvars).unwrap();
        cvars.set("r_addart", "  extra1.art\textra2.art ").unwrap();
        cvars.set("r_maparts", "0").unwrap();

        let config = TileConfig::from_cvars(&cvars).unwrap();
        assert_eq!(config.added_art, vec!["extra1.art", "extra2.art"]);
        assert!(!config.map_art);
    }

    #[test]
    fn test_art_file_name() {
        let config = TileConfig::default();
        assert_eq!(config.art_file_name(7), "tiles007.art");
        assert_eq!(config.art_file_name(123), "tiles123.art");
    }
}
