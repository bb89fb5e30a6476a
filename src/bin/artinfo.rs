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

extern crate buildtile;
extern crate docopt;
extern crate env_logger;
#[macro_use]
extern crate serde_derive;

use std::{path::Path, process::exit};

use buildtile::{
    common::vfs::Vfs,
    tile::{art, art::ArtHeader, TileStore},
};

use docopt::Docopt;

#[derive(Deserialize)]
struct Args {
    arg_file: String,
    flag_crc: bool,
    flag_v: bool,
    flag_verbose: bool,
    flag_version: bool,
}

const USAGE: &'static str = "
Usage: artinfo [options] <file>

Options:
    --crc          Print the CRC32 of each tile.
    -v, --verbose  Print animation details.

    -h, --help     Show this message and exit.
        --version  Print version information and exit.
";

const VERSION: &'static str = "
artinfo 0.1
Copyright © 2018 Cormac O'Brien
Released under the terms of the MIT License
";

fn main() {
    env_logger::init();

    let args: Args = Docopt::new(USAGE)
        .and_then(|d| d.help(true).deserialize())
        .unwrap_or_else(|e| e.exit());

    if args.flag_version {
        println!("{}", VERSION);
        exit(0);
    }

    let path = Path::new(&args.arg_file);
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let name = match path.file_name().and_then(|n| n.to_str()) {
        Some(n) => n,
        None => {
            println!("Not a file name: {}", args.arg_file);
            exit(1);
        }
    };

    let vfs = Vfs::with_directory(if dir.as_os_str().is_empty() {
        Path::new(".")
    } else {
        dir
    });

    let header = match vfs
        .read(name)
        .map_err(From::from)
        .and_then(|data| ArtHeader::parse(name, &art::strip_magic(data)))
    {
        Ok(h) => h,
        Err(why) => {
            println!("Couldn't open {}: {}", args.arg_file, why);
            exit(1);
        }
    };

    let mut store = TileStore::new();
    if let Err(why) = store.load_art_file(&vfs, name, false, None) {
        println!("Couldn't load {}: {}", args.arg_file, why);
        exit(1);
    }

    println!(
        "{}: tiles {}..={} ({} non-empty)",
        name,
        header.tile_start(),
        header.tile_end(),
        header.entries().iter().filter(|e| !e.is_empty()).count()
    );

    let verbose = args.flag_v || args.flag_verbose;
    for entry in header.entries().iter().filter(|e| !e.is_empty()) {
        let slot = header.tile_start() + entry.index;
        let mut line = format!(
            "{:5} {:4}x{:<4} ofs {:4},{:4}",
            slot,
            store.width(slot),
            store.height(slot),
            store.left_offset(slot),
            store.top_offset(slot),
        );

        if verbose {
            if let Some(anim) = store.anim(slot) {
                line.push_str(&format!(
                    " anim {:?} frames {} speed {} extra {}",
                    anim.anim_type(),
                    anim.num,
                    anim.speed(),
                    anim.extra
                ));
            }
        }

        if args.flag_crc {
            if let Some(crc) = store.crc32(slot) {
                line.push_str(&format!(" crc {:08x}", crc));
            }
        }

        println!("{}", line);
    }
}
