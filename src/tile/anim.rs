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

use num::FromPrimitive;

/// Mask of the animation type bits in `PicAnm::sf`.
pub const ANIMTYPE_MASK: u8 = 3 << 6;
pub const ANIMTYPE_SHIFT: u8 = 6;

/// Mask of the miscellaneous flag bits in `PicAnm::sf`.
pub const MISC_MASK: u8 = 3 << 4;

/// Mask of the animation speed bits in `PicAnm::sf`.
pub const ANIMSPEED_MASK: u8 = 15;

bitflags! {
    pub struct AnimFlags: u8 {
        const NO_FULLBRIGHT = 1 << 4;
        const TEX_HITSCAN   = 2 << 4;
    }
}

#[derive(Copy, Clone, Debug, Eq, FromPrimitive, PartialEq)]
pub enum AnimType {
    None = 0,
    Oscillate = 1,
    Forward = 2,
    Backward = 3,
}

/// The animation descriptor of a tile.
///
/// `sf` packs the animation type (bits 6-7), two flag bits (bits 4-5) and the speed (bits 0-3).
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct PicAnm {
    /// The number of frames following this tile in the animation loop.
    pub num: u8,
    pub sf: u8,
    pub extra: u8,
    pub xofs: i8,
    pub yofs: i8,
}

impl PicAnm {
    /// Unpacks the 32-bit descriptor stored in ART archives.
    pub fn from_packed(raw: u32) -> PicAnm {
        PicAnm {
            num: (raw & 63) as u8,
            xofs: ((raw >> 8) & 255) as u8 as i8,
            yofs: ((raw >> 16) & 255) as u8 as i8,
            sf: (((raw >> 24) & 15) | (raw & 192)) as u8,
            extra: ((raw >> 28) & 15) as u8,
        }
    }

    /// Packs this descriptor back into the archive layout.
    pub fn to_packed(&self) -> u32 {
        (self.num as u32 & 63)
            | (self.sf as u32 & ANIMTYPE_MASK as u32)
            | (self.xofs as u8 as u32) << 8
            | (self.yofs as u8 as u32) << 16
            | (self.sf as u32 & ANIMSPEED_MASK as u32) << 24
            | (self.extra as u32 & 15) << 28
    }

    pub fn clear(&mut self) {
        *self = PicAnm::default();
    }

    pub fn anim_type(&self) -> AnimType {
        AnimType::from_u8((self.sf & ANIMTYPE_MASK) >> ANIMTYPE_SHIFT).unwrap_or(AnimType::None)
    }

    pub fn speed(&self) -> u8 {
        self.sf & ANIMSPEED_MASK
    }

    pub fn flags(&self) -> AnimFlags {
        AnimFlags::from_bits_truncate(self.sf)
    }

    /// Sets the horizontal offset, clamping it to the signed byte range.
    pub fn set_xofs(&mut self, xofs: i32) {
        self.xofs = clamp_offset(xofs);
    }

    /// Sets the vertical offset, clamping it to the signed byte range.
    pub fn set_yofs(&mut self, yofs: i32) {
        self.yofs = clamp_offset(yofs);
    }
}

#[inline]
fn clamp_offset(ofs: i32) -> i8 {
    ofs.max(i8::MIN as i32).min(i8::MAX as i32) as i8
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_from_packed_fields() {
        // num = 5, type = forward, xofs = -3, yofs = 16, speed = 7, extra = 9
        let raw: u32 = 5 | (2 << 6) | (0xfd << 8) | (16 << 16) | (7 << 24) | (9 << 28);
        let anm = PicAnm::from_packed(raw);

        assert_eq!(anm.num, 5);
        assert_eq!(anm.anim_type(), AnimType::Forward);
        assert_eq!(anm.xofs, -3);
        assert_eq!(anm.yofs, 16);
        assert_eq!(anm.speed(), 7);
        assert_eq!(anm.extra, 9);
        assert_eq!(anm.to_packed(), raw);
    }

    #[test]
    fn test_flag_bits_come_from_neither_source() {
        // bits 4-5 of the raw value are not part of the disk format
        let anm = PicAnm::from_packed(0x30);
        assert_eq!(anm.num, 0x30);
        assert!(anm.flags().is_empty());
    }

    #[test]
    fn test_offset_clamp() {
        let mut anm = PicAnm::default();
        anm.set_xofs(400);
        anm.set_yofs(-1000);
        assert_eq!(anm.xofs, 127);
        assert_eq!(anm.yofs, -128);
    }
}
