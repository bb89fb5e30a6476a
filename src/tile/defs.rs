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

//! Tile definition scripts.
//!
//! A definition script registers replacements and placeholder tiles by number:
//!
//! ```text
//! // replacement art for tile 1024
//! hightile 1024 0 "hires/1024.png" alphacut 0.3 xscale 2.0 yscale 2.0
//! skybox 80 0 sky_ft.png sky_rt.png sky_bk.png sky_lf.png sky_up.png sky_dn.png
//! undefhightile 1024 7
//! dummytile 4000 64 64
//! importtile 4001 "sprites/imported.png" alphacut 128
//! ```

use std::convert::TryFrom;

use crate::{
    common::parse::{self, commands},
    tile::{HightileFlags, TextureResolver, TileError, TileStore},
};

fn script_error<S>(msg: S) -> TileError
where
    S: AsRef<str>,
{
    TileError::Script(msg.as_ref().to_owned())
}

fn index_arg(cmd: &str, name: &str, arg: Option<&&str>) -> Result<usize, TileError> {
    let arg = arg.ok_or_else(|| script_error(format!("{}: missing {}", cmd, name)))?;
    parse::index(arg).ok_or_else(|| script_error(format!("{}: bad {} \"{}\"", cmd, name, arg)))
}

fn size_arg(cmd: &str, name: &str, arg: Option<&&str>) -> Result<i32, TileError> {
    let arg = arg.ok_or_else(|| script_error(format!("{}: missing {}", cmd, name)))?;
    parse::integer(arg)
        .and_then(|i| i32::try_from(i).ok())
        .ok_or_else(|| script_error(format!("{}: bad {} \"{}\"", cmd, name, arg)))
}

fn str_arg<'a>(cmd: &str, name: &str, arg: Option<&&'a str>) -> Result<&'a str, TileError> {
    arg.copied()
        .ok_or_else(|| script_error(format!("{}: missing {}", cmd, name)))
}

/// The `key value` options after the positional arguments of a command.
struct Options<'a> {
    cmd: &'a str,
    pairs: Vec<(&'a str, &'a str)>,
}

impl<'a> Options<'a> {
    fn parse(cmd: &'a str, args: &[&'a str]) -> Result<Options<'a>, TileError> {
        if args.len() % 2 != 0 {
            return Err(script_error(format!(
                "{}: option \"{}\" has no value",
                cmd,
                args[args.len() - 1]
            )));
        }

        Ok(Options {
            cmd,
            pairs: args.chunks(2).map(|p| (p[0], p[1])).collect(),
        })
    }

    fn check_known(&self, known: &[&str]) -> Result<(), TileError> {
        for (key, _) in self.pairs.iter() {
            if !known.iter().any(|k| k.eq_ignore_ascii_case(key)) {
                return Err(script_error(format!("{}: unknown option \"{}\"", self.cmd, key)));
            }
        }
        Ok(())
    }

    fn get(&self, key: &str) -> Option<&'a str> {
        self.pairs
            .iter()
            .rev()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| *v)
    }

    fn float(&self, key: &str, default: f32) -> Result<f32, TileError> {
        match self.get(key) {
            Some(v) => parse::float(v)
                .ok_or_else(|| script_error(format!("{}: bad {} \"{}\"", self.cmd, key, v))),
            None => Ok(default),
        }
    }

    fn integer(&self, key: &str, default: i64) -> Result<i64, TileError> {
        match self.get(key) {
            Some(v) => parse::integer(v)
                .ok_or_else(|| script_error(format!("{}: bad {} \"{}\"", self.cmd, key, v))),
            None => Ok(default),
        }
    }

    fn flags(&self) -> Result<HightileFlags, TileError> {
        Ok(HightileFlags::from_bits_truncate(self.integer("flags", 0)? as u8))
    }
}

fn hightile<R>(store: &mut TileStore, resolver: &R, args: &[&str]) -> Result<(), TileError>
where
    R: TextureResolver + ?Sized,
{
    let cmd = "hightile";
    let tile = index_arg(cmd, "tile", args.get(1))?;
    let pal = index_arg(cmd, "palette", args.get(2))?;
    let file = str_arg(cmd, "file", args.get(3))?;

    let opts = Options::parse(cmd, args.get(4..).unwrap_or(&[]))?;
    opts.check_known(&[
        "alphacut",
        "xscale",
        "yscale",
        "specpower",
        "specfactor",
        "flags",
    ])?;

    store.set_hightile(
        resolver,
        tile,
        pal,
        file,
        opts.float("alphacut", 0.5)?,
        (opts.float("xscale", 1.0)?, opts.float("yscale", 1.0)?),
        opts.float("specpower", 1.0)?,
        opts.float("specfactor", 1.0)?,
        opts.flags()?,
    )
}

fn skybox<R>(store: &mut TileStore, resolver: &R, args: &[&str]) -> Result<(), TileError>
where
    R: TextureResolver + ?Sized,
{
    let cmd = "skybox";
    let tile = index_arg(cmd, "tile", args.get(1))?;
    let pal = index_arg(cmd, "palette", args.get(2))?;

    let mut faces = [""; 6];
    for (i, face) in faces.iter_mut().enumerate() {
        *face = str_arg(cmd, "face", args.get(3 + i))?;
    }

    let opts = Options::parse(cmd, args.get(9..).unwrap_or(&[]))?;
    opts.check_known(&["flags"])?;

    store.set_skybox(resolver, tile, pal, &faces, opts.flags()?)
}

fn undefhightile(store: &mut TileStore, args: &[&str]) -> Result<(), TileError> {
    let cmd = "undefhightile";
    let tile = index_arg(cmd, "tile", args.get(1))?;
    let pal = index_arg(cmd, "palette", args.get(2))?;
    store.delete_hightile(tile, pal)
}

fn dummytile(store: &mut TileStore, args: &[&str]) -> Result<(), TileError> {
    let cmd = "dummytile";
    let tile = index_arg(cmd, "tile", args.get(1))?;
    let width = size_arg(cmd, "width", args.get(2))?;
    let height = size_arg(cmd, "height", args.get(3))?;

    store.set_dummy(tile, width, height)
}

fn importtile<R>(store: &mut TileStore, resolver: &R, args: &[&str]) -> Result<(), TileError>
where
    R: TextureResolver + ?Sized,
{
    let cmd = "importtile";
    let tile = index_arg(cmd, "tile", args.get(1))?;
    let file = str_arg(cmd, "file", args.get(2))?;

    let opts = Options::parse(cmd, args.get(3..).unwrap_or(&[]))?;
    opts.check_known(&["alphacut"])?;
    let alphacut = opts.integer("alphacut", 255)?.max(0).min(255) as u8;

    store.import_from_texture(resolver, file, tile, alphacut)
}

fn apply_command<R>(store: &mut TileStore, resolver: &R, args: &[&str]) -> Result<(), TileError>
where
    R: TextureResolver + ?Sized,
{
    match args[0].to_ascii_lowercase().as_str() {
        "hightile" => hightile(store, resolver, args),
        "skybox" => skybox(store, resolver, args),
        "undefhightile" => undefhightile(store, args),
        "dummytile" => dummytile(store, args),
        "importtile" => importtile(store, resolver, args),
        other => Err(script_error(format!("unknown command \"{}\"", other))),
    }
}

/// Runs a definition script against `store`.
///
/// Commands that fail are logged and skipped. Returns the number of commands applied, or
/// `TileError::Script` if the script cannot be tokenized.
pub fn apply_defs<R>(store: &mut TileStore, resolver: &R, text: &str) -> Result<usize, TileError>
where
    R: TextureResolver + ?Sized,
{
    let mut text = text.to_owned();
    if !text.ends_with('\n') {
        text.push('\n');
    }

    let (rest, cmds) = commands(&text).map_err(|e| script_error(format!("{:?}", e)))?;
    if !rest.is_empty() {
        let line = text[..text.len() - rest.len()].lines().count() + 1;
        return Err(script_error(format!("parse error on line {}", line)));
    }

    let mut applied = 0;
    for args in cmds.iter() {
        match apply_command(store, resolver, args) {
            Ok(()) => applied += 1,
            Err(e) => warn!("{}: {}", args.join(" "), e),
        }
    }

    debug!("Applied {} of {} tile definitions", applied, cmds.len());
    Ok(applied)
}
