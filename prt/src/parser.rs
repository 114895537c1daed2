use std::{ffi::OsStr, path::Path};

use nom::{
    combinator::map,
    multi::count,
    number::complete::{le_i16, le_u32, le_u8},
    Parser,
};

use crate::{
    bmp::parse_file_header,
    color_table::{parse_color_table, ColorTableFormat},
    constants::{
        CPAL_TAG, DATA_SIZE, DATA_TAG, HEAD_SIZE, HEAD_TAG, INITIAL_CHUNK_BUDGET, PPAL_SIZE,
        PPAL_TAG, RIFF_TAG,
    },
    error::{PrtError, Section},
    nom_helpers::{run, tag4, IResult, PResult},
    padded_row_width, Animation, Appendix, Archive, Bitmap, Color, Frame, OptionalPair, Palette,
    Point, Rect, Subframe, OPTIONAL_PAIR_FLAG, PALETTE_COLOR_COUNT,
};

impl Archive {
    pub fn open_from_bytes(container: &[u8], companion: &[u8]) -> Result<Archive, PrtError> {
        parse_archive(container, companion)
    }

    pub fn open_from_files(
        container_path: impl AsRef<OsStr> + AsRef<Path>,
        companion_path: impl AsRef<OsStr> + AsRef<Path>,
    ) -> Result<Archive, PrtError> {
        let container = std::fs::read(container_path)?;
        let companion = std::fs::read(companion_path)?;

        Self::open_from_bytes(&container, &companion)
    }
}

enum PaletteChunk {
    Group,
    /// Overwrites the number of chunks left
    Head(u32),
    Data(Vec<Color>),
}

fn check_chunk_size(
    section: Section,
    field: &'static str,
    expect: u32,
    have: u32,
) -> Result<(), PrtError> {
    if expect != have {
        return Err(PrtError::SizeMismatch {
            section,
            field,
            expect: expect as u64,
            have: have as u64,
        });
    }

    Ok(())
}

fn parse_palette_chunk(i: &[u8], section: Section) -> PResult<'_, PaletteChunk> {
    let (i, (tag, size)) = run(i, section, (tag4, le_u32))?;

    log::trace!(
        "{section}: chunk {:?} ({size} bytes)",
        String::from_utf8_lossy(&tag)
    );

    match tag {
        PPAL_TAG => {
            check_chunk_size(section, "PPAL chunk size", PPAL_SIZE, size)?;

            Ok((i, PaletteChunk::Group))
        }
        HEAD_TAG => {
            check_chunk_size(section, "head chunk size", HEAD_SIZE, size)?;

            let (i, chunks_left) = run(i, section, le_u32)?;

            Ok((i, PaletteChunk::Head(chunks_left)))
        }
        DATA_TAG => {
            check_chunk_size(section, "data chunk size", DATA_SIZE, size)?;

            // blue and red are swapped in here
            let (i, colors) = parse_color_table(
                i,
                PALETTE_COLOR_COUNT,
                ColorTableFormat::Binary4 { reverse: true },
                section,
            )?;

            Ok((i, PaletteChunk::Data(colors)))
        }
        RIFF_TAG => Err(PrtError::Unsupported {
            section,
            what: "embedded RIFF palette".to_string(),
        }),
        _ => Err(PrtError::signature(section, b"PPAL|head|data", &tag)),
    }
}

fn parse_palette(mut i: &[u8], palette_index: usize) -> PResult<'_, Palette> {
    let section = Section::Palette {
        palette: palette_index,
    };

    let mut palette = Palette::default();
    let mut chunks_left = INITIAL_CHUNK_BUDGET;

    while chunks_left > 0 {
        chunks_left -= 1;

        let (rest, chunk) = parse_palette_chunk(i, section)?;
        i = rest;

        match chunk {
            PaletteChunk::Group => (),
            PaletteChunk::Head(count) => chunks_left = count,
            PaletteChunk::Data(colors) => palette.colors.extend(colors),
        }
    }

    Ok((i, palette))
}

fn parse_palettes(i: &[u8]) -> PResult<'_, Vec<Palette>> {
    let (mut i, (tag, palette_count)) = run(i, Section::PaletteHeader, (tag4, le_u32))?;

    if tag != CPAL_TAG {
        return Err(PrtError::signature(Section::PaletteHeader, &CPAL_TAG, &tag));
    }

    let mut palettes = vec![];

    for palette_index in 0..palette_count as usize {
        let (rest, palette) = parse_palette(i, palette_index)?;
        i = rest;

        palettes.push(palette);
    }

    log::debug!("parsed {} palettes", palettes.len());

    Ok((i, palettes))
}

/// On-disk bitmap metadata
struct BitmapRecord {
    padded_width: u32,
    /// Relative to the start of the companion pixel data
    offset: u32,
    height: u32,
    width: u32,
    image_type: i16,
    palette_id: i16,
}

fn parse_bitmap_record(i: &[u8]) -> IResult<'_, BitmapRecord> {
    map(
        (le_u32, le_u32, le_u32, le_u32, le_i16, le_i16),
        |(padded_width, offset, height, width, image_type, palette_id)| BitmapRecord {
            padded_width,
            offset,
            height,
            width,
            image_type,
            palette_id,
        },
    )
    .parse(i)
}

fn parse_bitmaps<'a>(
    i: &'a [u8],
    companion: &[u8],
    palette_count: usize,
) -> PResult<'a, Vec<Bitmap>> {
    let (_, companion_header) = parse_file_header(companion, Section::Companion)?;
    let data_start = companion_header.data_offset as usize;

    let (mut i, bitmap_count) = run(i, Section::BitmapHeader, le_u32)?;

    let mut bitmaps = vec![];

    for bitmap_index in 0..bitmap_count as usize {
        let section = Section::Bitmap {
            bitmap: bitmap_index,
        };

        let (rest, record) = run(i, section, parse_bitmap_record)?;
        i = rest;

        if record.palette_id < 0 || record.palette_id as usize >= palette_count {
            return Err(PrtError::OutOfRange {
                section,
                palette_id: record.palette_id as i64,
                palette_count,
            });
        }

        let padded_width = padded_row_width(record.width);

        if padded_width != Some(record.padded_width) {
            return Err(PrtError::SizeMismatch {
                section,
                field: "padded width",
                // widths close to u32::MAX pad past it
                expect: (record.width as u64 + 3) & !3,
                have: record.padded_width as u64,
            });
        }

        // never trust a stored length, always derive it
        let length = (record.padded_width as usize).checked_mul(record.height as usize);
        let start = data_start.saturating_add(record.offset as usize);

        let Some(data) = length.and_then(|length| {
            companion
                .get(start..)
                .and_then(|pixels| pixels.get(..length))
        }) else {
            return Err(PrtError::Truncated {
                section,
                remaining: companion.len().saturating_sub(start),
            });
        };

        bitmaps.push(Bitmap {
            width: record.width,
            height: record.height,
            data: data.to_vec(),
            image_type: record.image_type,
            palette_id: record.palette_id,
        });
    }

    log::debug!("parsed {} bitmaps", bitmaps.len());

    Ok((i, bitmaps))
}

/// Totals declared ahead of the animations
struct Counts {
    animations: u32,
    frames: u32,
    subframes: u32,
    optional_entries: u32,
}

fn parse_counts(i: &[u8]) -> IResult<'_, Counts> {
    map(
        (le_u32, le_u32, le_u32, le_u32),
        |(animations, frames, subframes, optional_entries)| Counts {
            animations,
            frames,
            subframes,
            optional_entries,
        },
    )
    .parse(i)
}

fn parse_subframe(i: &[u8]) -> IResult<'_, Subframe> {
    map(
        (le_i16, le_u8, le_u8, le_i16, le_i16),
        |(bitmap_id, unknown, subframe_id, x, y)| Subframe {
            bitmap_id,
            unknown,
            subframe_id,
            offset: Point { x, y },
        },
    )
    .parse(i)
}

/// Reads the pair following the frame header when `raw` has the flag bit set.
fn parse_optional_pair(i: &[u8], raw: u8, section: Section) -> PResult<'_, OptionalPair> {
    if raw & OPTIONAL_PAIR_FLAG == 0 {
        return Ok((i, None));
    }

    let (i, pair) = run(i, section, (le_u8, le_u8))?;

    Ok((i, Some(pair)))
}

fn parse_frame(i: &[u8], section: Section) -> PResult<'_, Frame> {
    let (i, (raw_subframe_count, raw_unknown)) = run(i, section, (le_u8, le_u8))?;

    let (i, optional12) = parse_optional_pair(i, raw_subframe_count, section)?;
    let (i, optional34) = parse_optional_pair(i, raw_unknown, section)?;

    let subframe_count = (raw_subframe_count & !OPTIONAL_PAIR_FLAG) as usize;
    let (i, subframes) = run(i, section, count(parse_subframe, subframe_count))?;

    Ok((
        i,
        Frame {
            subframes,
            unknown: raw_unknown & !OPTIONAL_PAIR_FLAG,
            optional12,
            optional34,
        },
    ))
}

fn parse_appendix(i: &[u8]) -> IResult<'_, Appendix> {
    map((le_u32, le_u32, le_u32, le_u32), |(a, b, c, d)| [a, b, c, d]).parse(i)
}

fn parse_animation(i: &[u8], animation_index: usize) -> PResult<'_, Animation> {
    let section = Section::Animation {
        animation: animation_index,
    };

    let (mut i, (unknown1, left, top, right, bottom, x, y, unknown2, frame_count)) = run(
        i,
        section,
        (
            le_u32, le_u32, le_u32, le_u32, le_u32, le_u32, le_u32, le_u32, le_u32,
        ),
    )?;

    let mut frames = vec![];

    for frame_index in 0..frame_count as usize {
        let (rest, frame) = parse_frame(
            i,
            Section::Frame {
                animation: animation_index,
                frame: frame_index,
            },
        )?;
        i = rest;

        frames.push(frame);
    }

    let (i, appendix_count) = run(i, section, le_u32)?;
    let (i, appendix) = run(i, section, count(parse_appendix, appendix_count as usize))?;

    Ok((
        i,
        Animation {
            unknown1,
            bounding_box: Rect {
                left,
                top,
                right,
                bottom,
            },
            offset: Point { x, y },
            unknown2,
            frames,
            appendix,
        },
    ))
}

fn check_count(what: &'static str, expect: u32, have: usize) -> Result<(), PrtError> {
    if expect as usize != have {
        return Err(PrtError::CountMismatch {
            what,
            expect: expect as usize,
            have,
        });
    }

    Ok(())
}

fn parse_archive(container: &[u8], companion: &[u8]) -> Result<Archive, PrtError> {
    let (i, palettes) = parse_palettes(container)?;
    let (i, bitmaps) = parse_bitmaps(i, companion, palettes.len())?;
    let (mut i, counts) = run(i, Section::Counts, parse_counts)?;

    let mut animations = vec![];

    for animation_index in 0..counts.animations as usize {
        let (rest, animation) = parse_animation(i, animation_index)?;
        i = rest;

        animations.push(animation);
    }

    let archive = Archive {
        palettes,
        bitmaps,
        animations,
        num_optional_entries: counts.optional_entries,
        extra_data: i.to_vec(),
    };

    check_count("animation", counts.animations, archive.animations.len())?;
    check_count("frame", counts.frames, archive.frame_count())?;
    check_count("subframe", counts.subframes, archive.subframe_count())?;

    log::debug!(
        "parsed {} animations, {} frames, {} subframes, {} bytes of extra data",
        archive.animations.len(),
        archive.frame_count(),
        archive.subframe_count(),
        archive.extra_data.len()
    );

    Ok(archive)
}
