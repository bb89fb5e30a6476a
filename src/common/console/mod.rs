// Copyright © 2018 Cormac O'Brien
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in
// all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.

use std::{cell::RefCell, collections::HashMap};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConsoleError {
    #[error("Could not parse cvar as a number: {name} = \"{value}\"")]
    CvarParseFailed { name: String, value: String },
    #[error("Cvar already registered: {0}")]
    DuplicateCvar(String),
    #[error("No such cvar: {0}")]
    NoSuchCvar(String),
}

/// A configuration variable.
struct Cvar {
    // Value of this variable
    val: String,

    // The default value of this variable
    default: String,
}

/// Stores the string-valued configuration variables of the tile system.
pub struct CvarRegistry {
    cvars: RefCell<HashMap<String, Cvar>>,
}

impl CvarRegistry {
    /// Construct a new empty `CvarRegistry`.
    pub fn new() -> CvarRegistry {
        CvarRegistry {
            cvars: RefCell::new(HashMap::new()),
        }
    }

    /// Register a new `Cvar` with the given name.
    pub fn register<S>(&self, name: S, default: S) -> Result<(), ConsoleError>
    where
        S: AsRef<str>,
    {
        let name = name.as_ref();
        let default = default.as_ref();

        let mut cvars = self.cvars.borrow_mut();
        if cvars.contains_key(name) {
            return Err(ConsoleError::DuplicateCvar(name.to_owned()));
        }

        cvars.insert(
            name.to_owned(),
            Cvar {
                val: default.to_owned(),
                default: default.to_owned(),
            },
        );

        Ok(())
    }

    pub fn get<S>(&self, name: S) -> Result<String, ConsoleError>
    where
        S: AsRef<str>,
    {
        Ok(self
            .cvars
            .borrow()
            .get(name.as_ref())
            .ok_or_else(|| ConsoleError::NoSuchCvar(name.as_ref().to_owned()))?
            .val
            .clone())
    }

    /// Read a cvar as a number.
    ///
    /// If the current value does not parse, the cvar is reset to its default and that is parsed
    /// instead.
    pub fn get_value<S>(&self, name: S) -> Result<f32, ConsoleError>
    where
        S: AsRef<str>,
    {
        let name = name.as_ref();
        let mut cvars = self.cvars.borrow_mut();
        let cvar = cvars
            .get_mut(name)
            .ok_or_else(|| ConsoleError::NoSuchCvar(name.to_owned()))?;

        let val_string = cvar.val.clone();
        match val_string.parse::<f32>() {
            Ok(v) => Ok(v),
            Err(_) => {
                cvar.val = cvar.default.clone();
                cvar.val
                    .parse::<f32>()
                    .map_err(|_| ConsoleError::CvarParseFailed {
                        name: name.to_owned(),
                        value: val_string,
                    })
            }
        }
    }

    pub fn set<S>(&self, name: S, value: S) -> Result<(), ConsoleError>
    where
        S: AsRef<str>,
    {
        trace!("cvar assignment: {} {}", name.as_ref(), value.as_ref());
        let mut cvars = self.cvars.borrow_mut();
        let cvar = cvars
            .get_mut(name.as_ref())
            .ok_or_else(|| ConsoleError::NoSuchCvar(name.as_ref().to_owned()))?;
        cvar.val = value.as_ref().to_owned();

        Ok(())
    }
}

impl Default for CvarRegistry {
    fn default() -> Self {
        CvarRegistry::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_register_duplicate() {
        let cvars = CvarRegistry::new();
        cvars.register("r_artbase", "tiles").unwrap();

        match cvars.register("r_artbase", "other") {
            Err(ConsoleError::DuplicateCvar(name)) => assert_eq!(name, "r_artbase"),
            _ => panic!("expected DuplicateCvar"),
        }
        assert_eq!(cvars.get("r_artbase").unwrap(), "tiles");
    }

    #[test]
    fn test_get_value_resets_to_default() {
        let cvars = CvarRegistry::new();
        cvars.register("r_maparts", "1").unwrap();
        cvars.set("r_maparts", "yes please").unwrap();

        assert_eq!(cvars.get_value("r_maparts").unwrap(), 1.0);
        assert_eq!(cvars.get("r_maparts").unwrap(), "1");
    }

    #[test]
    fn test_no_such_cvar() {
        let cvars = CvarRegistry::new();
        assert!(cvars.set("missing", "0").is_err());
        assert!(cvars.get("missing").is_err());
    }
}
