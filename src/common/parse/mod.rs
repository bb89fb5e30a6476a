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

pub mod defs;

use nom::{
    bytes::complete::{tag, take_while1},
    sequence::delimited,
};

pub use self::defs::commands;

fn string_contents(input: &str) -> nom::IResult<&str, &str> {
    take_while1(|c: char| c != '"' && c.is_ascii() && !c.is_ascii_control())(input)
}

/// Match a string enclosed in double quotes, returning the contents.
pub fn quoted(input: &str) -> nom::IResult<&str, &str> {
    delimited(tag("\""), string_contents, tag("\""))(input)
}

/// Parse a tile or palette number.
pub fn index<S>(src: S) -> Option<usize>
where
    S: AsRef<str>,
{
    src.as_ref().parse().ok()
}

/// Parse a signed integer, accepting a `0x` prefix for hexadecimal.
pub fn integer<S>(src: S) -> Option<i64>
where
    S: AsRef<str>,
{
    let src = src.as_ref();
    match src.strip_prefix("0x").or_else(|| src.strip_prefix("0X")) {
        Some(hex) => i64::from_str_radix(hex, 16).ok(),
        None => src.parse().ok(),
    }
}

pub fn float<S>(src: S) -> Option<f32>
where
    S: AsRef<str>,
{
    src.as_ref().parse().ok()
}
