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

//! Tokenizer for tile definition scripts.
//!
//! A script is a sequence of commands, one per line or separated by semicolons. Each command is a
//! list of bare or double-quoted arguments. `//` starts a comment that runs to the end of the line.

use crate::common::parse::quoted;

use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{line_ending, not_line_ending, one_of, space0},
    combinator::{opt, recognize},
    multi::{many0, many1},
    sequence::{delimited, preceded, terminated, tuple},
};

/// Match a line comment, from `//` up to (but not including) the line ending.
pub fn line_comment(input: &str) -> nom::IResult<&str, &str> {
    recognize(preceded(tag("//"), not_line_ending))(input)
}

/// Match a line holding nothing but whitespace and an optional comment.
pub fn empty_line(input: &str) -> nom::IResult<&str, &str> {
    recognize(tuple((space0, opt(line_comment), line_ending)))(input)
}

/// Match a character that ends a bare argument without being part of it.
pub fn basic_arg_terminator(input: &str) -> nom::IResult<&str, &str> {
    alt((recognize(one_of(" \t;\"")), line_ending, tag("//")))(input)
}

/// Match a run of printable ASCII characters up to whitespace, a quote, a semicolon, a comment or
/// a line ending.
pub fn basic_arg(input: &str) -> nom::IResult<&str, &str> {
    let mut match_len = 0;

    for chr in input.chars() {
        let remaining = &input[match_len..];
        if basic_arg_terminator(remaining).is_ok() || !chr.is_ascii() || chr.is_ascii_control() {
            break;
        }
        match_len += chr.len_utf8();
    }

    if match_len == 0 {
        return Err(nom::Err::Error((input, nom::error::ErrorKind::Many1)));
    }

    let (matched, rest) = input.split_at(match_len);
    Ok((rest, matched))
}

/// Match a bare argument or a quoted string.
pub fn arg(input: &str) -> nom::IResult<&str, &str> {
    alt((quoted, basic_arg))(input)
}

/// Match the end of a command: a semicolon or the rest of the line.
pub fn command_terminator(input: &str) -> nom::IResult<&str, &str> {
    alt((empty_line, recognize(tuple((space0, tag(";"))))))(input)
}

/// Match a single command and return its arguments.
pub fn command(input: &str) -> nom::IResult<&str, Vec<&str>> {
    terminated(many1(preceded(space0, arg)), command_terminator)(input)
}

/// Match every command in a script, skipping blank and comment lines.
pub fn commands(input: &str) -> nom::IResult<&str, Vec<Vec<&str>>> {
    delimited(
        many0(empty_line),
        many0(terminated(command, many0(empty_line))),
        many0(empty_line),
    )(input)
}
