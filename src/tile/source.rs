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
    cell::{Cell, Ref, RefCell, RefMut},
    rc::Rc,
};

/// The kind of custom content occupying a slot.
///
/// A slot starts out as `Art`. Once it holds one of the custom kinds it keeps that kind until the
/// tile is deleted.
#[derive(Copy, Clone, Debug, Display, Eq, PartialEq)]
pub enum ReplacementKind {
    #[strum(serialize = "art")]
    Art,
    #[strum(serialize = "writable")]
    Writable,
    #[strum(serialize = "restorable")]
    Restorable,
    #[strum(serialize = "canvas")]
    Canvas,
}

impl Default for ReplacementKind {
    fn default() -> Self {
        ReplacementKind::Art
    }
}

/// One loaded ART archive.
///
/// The pixel data has already had its transparent index moved to 0. Every `ArtView` carved from
/// the archive shares this buffer.
#[derive(Debug)]
pub struct ArtFile {
    name: String,
    data: Box<[u8]>,
}

impl ArtFile {
    pub fn new<S>(name: S, data: Box<[u8]>) -> ArtFile
    where
        S: AsRef<str>,
    {
        ArtFile {
            name: name.as_ref().to_owned(),
            data,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/// A zero-copy view of one tile inside an `ArtFile`.
#[derive(Debug)]
pub struct ArtView {
    file: Rc<ArtFile>,
    offset: usize,
    width: u32,
    height: u32,
}

impl ArtView {
    /// Creates a view of `width * height` bytes at `offset`.
    ///
    /// The caller guarantees the range lies inside the archive.
    pub fn new(file: Rc<ArtFile>, offset: usize, width: u32, height: u32) -> ArtView {
        debug_assert!(offset + area(width, height) <= file.data().len());
        ArtView {
            file,
            offset,
            width,
            height,
        }
    }

    pub fn file(&self) -> &Rc<ArtFile> {
        &self.file
    }

    pub fn pixels(&self) -> &[u8] {
        let len = area(self.width, self.height);
        &self.file.data()[self.offset..self.offset + len]
    }
}

#[inline]
fn area(width: u32, height: u32) -> usize {
    width as usize * height as usize
}

/// An owned, column-major 8-bit pixel buffer.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Surface {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Surface {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Surface {
        debug_assert_eq!(pixels.len(), area(width, height));
        Surface {
            width,
            height,
            pixels,
        }
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

/// A pixel buffer that can be drawn into.
///
/// The size is kept outside the pixel cell, so it can be read while the pixels are borrowed.
#[derive(Debug, Default)]
pub struct DrawSurface {
    size: Cell<(u32, u32)>,
    pixels: RefCell<Vec<u8>>,
}

impl DrawSurface {
    fn new(width: u32, height: u32, pixels: Vec<u8>) -> DrawSurface {
        debug_assert_eq!(pixels.len(), area(width, height));
        DrawSurface {
            size: Cell::new((width, height)),
            pixels: RefCell::new(pixels),
        }
    }

    pub fn size(&self) -> (u32, u32) {
        self.size.get()
    }

    fn pixels(&self) -> Ref<'_, [u8]> {
        Ref::map(self.pixels.borrow(), |p| &p[..])
    }

    fn pixels_mut(&self) -> RefMut<'_, [u8]> {
        RefMut::map(self.pixels.borrow_mut(), |p| &mut p[..])
    }

    fn replace(&self, width: u32, height: u32, pixels: Vec<u8>) {
        *self.pixels.borrow_mut() = pixels;
        self.size.set((width, height));
    }

    /// Resizes the surface, clearing it.
    ///
    /// A non-positive size empties the surface and returns false.
    fn resize(&self, width: i32, height: i32) -> bool {
        if width <= 0 || height <= 0 {
            self.replace(0, 0, Vec::new());
            return false;
        }

        let (width, height) = (width as u32, height as u32);
        self.replace(width, height, vec![0; area(width, height)]);
        true
    }
}

/// Where a tile's pixels come from.
#[derive(Debug)]
pub enum PixelSource {
    /// Pixels inside a loaded ART archive.
    Archive(ArtView),

    /// A tile with its own pixel buffer.
    Loose(Surface),

    /// A tile with a size but no pixels.
    Dummy { width: u32, height: u32 },

    /// A drawable surface created from scratch.
    Writable(DrawSurface),

    /// A drawable copy of another tile that can be reset to the original.
    Restorable {
        surface: DrawSurface,
        base: Rc<PixelSource>,
    },

    /// A render target. Its contents live on the GPU.
    Canvas(Cell<(u32, u32)>),
}

impl PixelSource {
    /// The placeholder installed in every unused slot.
    pub fn placeholder() -> PixelSource {
        PixelSource::Dummy {
            width: 0,
            height: 0,
        }
    }

    pub fn writable() -> PixelSource {
        PixelSource::Writable(DrawSurface::default())
    }

    /// Creates a restorable copy of `base` holding `pixels`, its decoded contents.
    pub fn restorable(base: Rc<PixelSource>, pixels: Vec<u8>) -> PixelSource {
        PixelSource::Restorable {
            surface: DrawSurface::new(base.width(), base.height(), pixels),
            base,
        }
    }

    pub fn canvas() -> PixelSource {
        PixelSource::Canvas(Cell::new((0, 0)))
    }

    pub fn size(&self) -> (u32, u32) {
        match self {
            PixelSource::Archive(view) => (view.width, view.height),
            PixelSource::Loose(surface) => (surface.width, surface.height),
            PixelSource::Dummy { width, height } => (*width, *height),
            PixelSource::Writable(surface) | PixelSource::Restorable { surface, .. } => {
                surface.size()
            }
            PixelSource::Canvas(size) => size.get(),
        }
    }

    pub fn width(&self) -> u32 {
        self.size().0
    }

    pub fn height(&self) -> u32 {
        self.size().1
    }

    /// Returns true if this source has no area.
    pub fn is_empty(&self) -> bool {
        let (w, h) = self.size();
        w == 0 || h == 0
    }

    /// Returns true if the pixels are a view into an archive rather than an owned buffer.
    pub fn is_archive(&self) -> bool {
        match self {
            PixelSource::Archive(_) => true,
            _ => false,
        }
    }

    /// Returns the archive view backing this source, if there is one.
    pub fn art_view(&self) -> Option<&ArtView> {
        match self {
            PixelSource::Archive(view) => Some(view),
            _ => None,
        }
    }

    /// Produces the full `width * height` paletted buffer.
    ///
    /// Sources without CPU-side pixels decode to all zeroes (fully transparent).
    pub fn decode(&self) -> Vec<u8> {
        let (w, h) = self.size();

        let mut out = match self {
            PixelSource::Archive(view) => view.pixels().to_vec(),
            PixelSource::Loose(surface) => surface.pixels().to_vec(),
            PixelSource::Writable(surface) | PixelSource::Restorable { surface, .. } => {
                surface.pixels().to_vec()
            }
            PixelSource::Dummy { .. } | PixelSource::Canvas(_) => Vec::new(),
        };

        out.resize(area(w, h), 0);
        out
    }

    /// Mutably borrows the pixels of a writable source.
    pub fn writable_pixels(&self) -> Option<RefMut<'_, [u8]>> {
        match self {
            PixelSource::Writable(surface) | PixelSource::Restorable { surface, .. } => {
                Some(surface.pixels_mut())
            }
            _ => None,
        }
    }

    /// Resizes a writable surface or a canvas. Returns false for any other source or an invalid
    /// size.
    pub fn resize(&self, width: i32, height: i32) -> bool {
        match self {
            PixelSource::Writable(surface) => surface.resize(width, height),
            PixelSource::Canvas(size) if width > 0 && height > 0 => {
                size.set((width as u32, height as u32));
                true
            }
            _ => false,
        }
    }

    /// Copies the base pixels back into a restorable surface.
    pub fn reload(&self) -> bool {
        match self {
            PixelSource::Restorable { surface, base } => {
                surface.replace(base.width(), base.height(), base.decode());
                true
            }
            _ => false,
        }
    }
}
