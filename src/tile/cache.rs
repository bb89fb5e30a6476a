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

use chrono::{DateTime, Utc};

/// A decoded copy of a tile's pixels for CPU-side reads such as hitscan tests.
///
/// The buffer is filled on first access and dropped whenever the tile changes. Nothing evicts
/// entries yet; `last_use` records when the buffer was last read so an eviction pass can pick the
/// least recently used ones.
#[derive(Debug, Default)]
pub struct RawCache {
    data: Vec<u8>,
    last_use: Option<DateTime<Utc>>,
}

impl RawCache {
    pub fn new() -> RawCache {
        RawCache::default()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the cached pixels, decoding them with `decode` if the cache is empty, and stamps
    /// the access time.
    pub fn get_or_fill<F>(&mut self, decode: F) -> &[u8]
    where
        F: FnOnce() -> Vec<u8>,
    {
        if self.data.is_empty() {
            self.data = decode();
        }

        self.last_use = Some(Utc::now());
        &self.data
    }

    /// Returns the cached pixels without decoding or stamping.
    pub fn peek(&self) -> Option<&[u8]> {
        if self.data.is_empty() {
            None
        } else {
            Some(&self.data)
        }
    }

    pub fn last_use(&self) -> Option<DateTime<Utc>> {
        self.last_use
    }

    /// The number of bytes held.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn clear(&mut self) {
        self.data = Vec::new();
    }
}
