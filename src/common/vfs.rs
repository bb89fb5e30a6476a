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

use std::{
    collections::HashMap,
    fs::File,
    io::{self, BufReader, Cursor, Read},
    path::{Path, PathBuf},
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VfsError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("File does not exist: {0}")]
    NoSuchFile(String),
}

#[derive(Debug)]
enum VfsComponent {
    /// Files already resident in memory, keyed by lowercased name.
    Memory(HashMap<String, Box<[u8]>>),
    Directory(PathBuf),
}

/// A layered file source. Components added later shadow earlier ones.
#[derive(Debug)]
pub struct Vfs {
    components: Vec<VfsComponent>,
}

impl Vfs {
    pub fn new() -> Vfs {
        Vfs {
            components: Vec::new(),
        }
    }

    /// Initializes the virtual filesystem with a single game directory.
    pub fn with_directory<P>(dir: P) -> Vfs
    where
        P: AsRef<Path>,
    {
        let mut vfs = Vfs::new();
        vfs.add_directory(dir);
        vfs
    }

    pub fn add_directory<P>(&mut self, path: P)
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        if !path.is_dir() {
            warn!("{} is not a directory", path.display());
        }

        self.components
            .push(VfsComponent::Directory(path.to_path_buf()));
    }

    /// Adds a set of in-memory files as a new component.
    pub fn add_memory<I, S>(&mut self, files: I)
    where
        I: IntoIterator<Item = (S, Vec<u8>)>,
        S: AsRef<str>,
    {
        let files = files
            .into_iter()
            .map(|(name, data)| (name.as_ref().to_ascii_lowercase(), data.into_boxed_slice()))
            .collect();
        self.components.push(VfsComponent::Memory(files));
    }

    pub fn open<S>(&self, virtual_path: S) -> Result<VirtualFile, VfsError>
    where
        S: AsRef<str>,
    {
        let vp = virtual_path.as_ref();

        // iterate in reverse so later components shadow earlier ones
        for c in self.components.iter().rev() {
            match c {
                VfsComponent::Memory(files) => {
                    if let Some(f) = files.get(&vp.to_ascii_lowercase()) {
                        return Ok(VirtualFile::MemoryBacked(Cursor::new(f)));
                    }
                }

                VfsComponent::Directory(path) => {
                    // try the name as given, then lowercase, then uppercase
                    let candidates = [
                        vp.to_owned(),
                        vp.to_ascii_lowercase(),
                        vp.to_ascii_uppercase(),
                    ];

                    for candidate in candidates.iter() {
                        let full_path = path.join(candidate);
                        if let Ok(f) = File::open(&full_path) {
                            return Ok(VirtualFile::FileBacked(BufReader::new(f)));
                        }
                    }
                }
            }
        }

        Err(VfsError::NoSuchFile(vp.to_owned()))
    }

    /// Reads the full contents of a file.
    pub fn read<S>(&self, virtual_path: S) -> Result<Vec<u8>, VfsError>
    where
        S: AsRef<str>,
    {
        let mut file = self.open(virtual_path)?;
        let mut data = Vec::new();
        file.read_to_end(&mut data)?;
        Ok(data)
    }

    pub fn contains<S>(&self, virtual_path: S) -> bool
    where
        S: AsRef<str>,
    {
        self.open(virtual_path).is_ok()
    }
}

impl Default for Vfs {
    fn default() -> Self {
        Vfs::new()
    }
}

pub enum VirtualFile<'a> {
    MemoryBacked(Cursor<&'a [u8]>),
    FileBacked(BufReader<File>),
}

impl<'a> Read for VirtualFile<'a> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            VirtualFile::MemoryBacked(curs) => curs.read(buf),
            VirtualFile::FileBacked(file) => file.read(buf),
        }
    }
}
