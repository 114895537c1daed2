//! Fixed-count color tables in the three interchange layouts.
use byte_writer::ByteWriter;
use nom::{
    bytes::complete::take,
    character::complete::{digit1, space0, space1},
    combinator::{all_consuming, map, map_res},
    multi::count,
    sequence::{delimited, preceded},
    Parser,
};

use crate::{
    error::{PrtError, Section},
    nom_helpers::{run, IResult, PResult},
    Color,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorTableFormat {
    /// Windows LOGPALETTE entries: r, g, b, flags.
    ///
    /// `reverse` stores blue before red.
    Binary4 { reverse: bool },
    /// Photoshop entries: r, g, b. Flags read back as 0.
    Binary3 { reverse: bool },
    /// Paint Shop Pro: one "r g b" line per entry.
    Text,
}

fn from_disk([first, g, last]: [u8; 3], flags: u8, reverse: bool) -> Color {
    if reverse {
        Color::new(last, g, first, flags)
    } else {
        Color::new(first, g, last, flags)
    }
}

fn to_disk(color: &Color, reverse: bool) -> [u8; 3] {
    if reverse {
        [color.b, color.g, color.r]
    } else {
        [color.r, color.g, color.b]
    }
}

pub fn parse_color_table(
    i: &[u8],
    color_count: usize,
    format: ColorTableFormat,
    section: Section,
) -> PResult<'_, Vec<Color>> {
    match format {
        ColorTableFormat::Binary4 { reverse } => run(
            i,
            section,
            count(
                map(take(4usize), move |res: &[u8]| {
                    from_disk([res[0], res[1], res[2]], res[3], reverse)
                }),
                color_count,
            ),
        ),
        ColorTableFormat::Binary3 { reverse } => run(
            i,
            section,
            count(
                map(take(3usize), move |res: &[u8]| {
                    from_disk([res[0], res[1], res[2]], 0, reverse)
                }),
                color_count,
            ),
        ),
        ColorTableFormat::Text => parse_text_table(i, color_count, section),
    }
}

/// Splits off one line, dropping the line ending.
pub(crate) fn next_line(i: &[u8]) -> Option<(&[u8], &[u8])> {
    if i.is_empty() {
        return None;
    }

    let (line, rest) = match i.iter().position(|&c| c == b'\n') {
        Some(end) => (&i[..end], &i[end + 1..]),
        None => (i, &i[i.len()..]),
    };

    let line = line.strip_suffix(b"\r").unwrap_or(line);

    Some((rest, line))
}

fn channel(i: &[u8]) -> IResult<'_, u8> {
    map_res(digit1, |digits: &[u8]| {
        std::str::from_utf8(digits)
            .ok()
            .and_then(|digits| digits.parse::<u8>().ok())
            .ok_or(())
    })
    .parse(i)
}

fn text_color(i: &[u8]) -> IResult<'_, Color> {
    all_consuming(delimited(
        space0,
        map(
            (channel, preceded(space1, channel), preceded(space1, channel)),
            |(r, g, b)| Color::rgb(r, g, b),
        ),
        space0,
    ))
    .parse(i)
}

fn parse_text_table(
    mut i: &[u8],
    color_count: usize,
    section: Section,
) -> PResult<'_, Vec<Color>> {
    // the count comes from the file, the shortest line is "0 0 0\n"
    let mut colors = Vec::with_capacity(color_count.min(i.len() / 6 + 1));

    for line in 0..color_count {
        let Some((rest, content)) = next_line(i) else {
            return Err(PrtError::Truncated {
                section,
                remaining: 0,
            });
        };

        let Ok((_, color)) = text_color(content) else {
            return Err(PrtError::TextLine {
                section,
                line,
                content: String::from_utf8_lossy(content).into_owned(),
            });
        };

        colors.push(color);
        i = rest;
    }

    Ok((i, colors))
}

pub fn write_color_table(writer: &mut ByteWriter, colors: &[Color], format: ColorTableFormat) {
    match format {
        ColorTableFormat::Binary4 { reverse } => colors.iter().for_each(|color| {
            writer.append_u8_slice(&to_disk(color, reverse));
            writer.append_u8(color.flags);
        }),
        ColorTableFormat::Binary3 { reverse } => colors
            .iter()
            .for_each(|color| writer.append_u8_slice(&to_disk(color, reverse))),
        ColorTableFormat::Text => colors.iter().for_each(|color| {
            writer.append_string(&format!("{} {} {}\r\n", color.r, color.g, color.b))
        }),
    }
}
