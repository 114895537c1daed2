use std::{
    fs::OpenOptions,
    io::Write,
    path::{Path, PathBuf},
};

use byte_writer::ByteWriter;

use crate::{
    bmp::write_bmp,
    color_table::{write_color_table, ColorTableFormat},
    constants::{
        CANONICAL_CHUNKS_AFTER_HEAD, COMPANION_WIDTH, CPAL_TAG, DATA_SIZE, DATA_TAG, HEAD_SIZE,
        HEAD_TAG, PPAL_SIZE, PPAL_TAG,
    },
    error::{PrtError, Section},
    Animation, Archive, Bitmap, Frame, OptionalPair, Palette, Subframe, OPTIONAL_PAIR_FLAG,
    PALETTE_COLOR_COUNT,
};

trait WriteToWriter {
    fn write_to_writer(&self, writer: &mut ByteWriter);
}

impl Archive {
    /// Returns the container and the companion bitmap.
    pub fn write_to_bytes(&self) -> Result<(Vec<u8>, Vec<u8>), PrtError> {
        let mut writer = ByteWriter::new();

        write_palettes(&mut writer, &self.palettes)?;

        let companion = write_bitmaps(&mut writer, &self.bitmaps, self.palettes.len())?;

        // totals are always recomputed
        writer.append_u32(self.animations.len() as u32);
        writer.append_u32(self.frame_count() as u32);
        writer.append_u32(self.subframe_count() as u32);
        writer.append_u32(self.num_optional_entries);

        self.animations
            .iter()
            .enumerate()
            .try_for_each(|(animation_index, animation)| {
                write_animation(&mut writer, animation, animation_index)
            })?;

        writer.append_u8_slice(&self.extra_data);

        log::debug!(
            "wrote {} bytes of container and {} bytes of companion",
            writer.data.len(),
            companion.len()
        );

        Ok((writer.data, companion))
    }

    /// Nothing is written unless both files encode.
    pub fn write_to_files(
        &self,
        container_path: impl AsRef<Path> + Into<PathBuf>,
        companion_path: impl AsRef<Path> + Into<PathBuf>,
    ) -> Result<(), PrtError> {
        let (container, companion) = self.write_to_bytes()?;

        for (path, bytes) in [
            (container_path.into(), container),
            (companion_path.into(), companion),
        ] {
            let mut file = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(path)?;

            file.write_all(&bytes)?;

            file.flush()?;
        }

        Ok(())
    }
}

fn write_chunk_header(writer: &mut ByteWriter, tag: &[u8; 4], size: u32) {
    writer.append_u8_slice(tag);
    writer.append_u32(size);
}

/// Always three chunks per palette: group, head saying one more, data.
fn write_palettes(writer: &mut ByteWriter, palettes: &[Palette]) -> Result<(), PrtError> {
    writer.append_u8_slice(&CPAL_TAG);
    writer.append_u32(palettes.len() as u32);

    for (palette_index, palette) in palettes.iter().enumerate() {
        if palette.colors.len() != PALETTE_COLOR_COUNT {
            return Err(PrtError::invalid(
                Section::Palette {
                    palette: palette_index,
                },
                format!(
                    "need exactly {PALETTE_COLOR_COUNT} colors, have {}",
                    palette.colors.len()
                ),
            ));
        }

        write_chunk_header(writer, &PPAL_TAG, PPAL_SIZE);

        write_chunk_header(writer, &HEAD_TAG, HEAD_SIZE);
        writer.append_u32(CANONICAL_CHUNKS_AFTER_HEAD);

        write_chunk_header(writer, &DATA_TAG, DATA_SIZE);
        write_color_table(
            writer,
            &palette.colors,
            ColorTableFormat::Binary4 { reverse: true },
        );
    }

    log::debug!("wrote {} palettes", palettes.len());

    Ok(())
}

/// Writes the metadata records and returns the companion bitmap holding every pixel buffer.
///
/// Offsets are assigned in order, whatever they were when the archive was read.
fn write_bitmaps(
    writer: &mut ByteWriter,
    bitmaps: &[Bitmap],
    palette_count: usize,
) -> Result<Vec<u8>, PrtError> {
    writer.append_u32(bitmaps.len() as u32);

    let mut pixels: Vec<u8> = vec![];

    for (bitmap_index, bitmap) in bitmaps.iter().enumerate() {
        let section = Section::Bitmap {
            bitmap: bitmap_index,
        };

        if bitmap.palette_id < 0 || bitmap.palette_id as usize >= palette_count {
            return Err(PrtError::OutOfRange {
                section,
                palette_id: bitmap.palette_id as i64,
                palette_count,
            });
        }

        let (Some(padded_width), Some(expected_len)) =
            (bitmap.padded_width(), bitmap.expected_len())
        else {
            return Err(PrtError::invalid(
                section,
                format!("{}x{} is too large", bitmap.width, bitmap.height),
            ));
        };

        if bitmap.data.len() != expected_len {
            return Err(PrtError::invalid(
                section,
                format!(
                    "{}x{} needs {expected_len} bytes of pixels, have {}",
                    bitmap.width,
                    bitmap.height,
                    bitmap.data.len()
                ),
            ));
        }

        let Ok(offset) = u32::try_from(pixels.len()) else {
            return Err(PrtError::invalid(
                section,
                format!("pixel offset {} does not fit in 32 bits", pixels.len()),
            ));
        };

        writer.append_u32(padded_width);
        writer.append_u32(offset);
        writer.append_u32(bitmap.height);
        writer.append_u32(bitmap.width);
        writer.append_i16(bitmap.image_type);
        writer.append_i16(bitmap.palette_id);

        pixels.extend_from_slice(&bitmap.data);
    }

    let mut companion = ByteWriter::new();

    let Ok(companion_height) = u32::try_from(pixels.len() / COMPANION_WIDTH as usize) else {
        return Err(PrtError::invalid(
            Section::Companion,
            format!("{} bytes of pixels do not fit in one bitmap", pixels.len()),
        ));
    };

    write_bmp(
        &mut companion,
        (COMPANION_WIDTH, companion_height),
        8,
        &Palette::black(),
        &pixels,
        Section::Companion,
    )?;

    log::debug!(
        "wrote {} bitmaps with {} bytes of pixels",
        bitmaps.len(),
        pixels.len()
    );

    Ok(companion.data)
}

impl WriteToWriter for Subframe {
    fn write_to_writer(&self, writer: &mut ByteWriter) {
        let Self {
            bitmap_id,
            unknown,
            subframe_id,
            offset,
        } = self;

        writer.append_i16(*bitmap_id);
        writer.append_u8(*unknown);
        writer.append_u8(*subframe_id);
        writer.append_i16(offset.x);
        writer.append_i16(offset.y);
    }
}

impl WriteToWriter for OptionalPair {
    fn write_to_writer(&self, writer: &mut ByteWriter) {
        if let Some((first, second)) = self {
            writer.append_u8(*first);
            writer.append_u8(*second);
        }
    }
}

fn with_flag(value: u8, pair: &OptionalPair) -> u8 {
    if pair.is_some() {
        value | OPTIONAL_PAIR_FLAG
    } else {
        value
    }
}

fn write_frame(writer: &mut ByteWriter, frame: &Frame, section: Section) -> Result<(), PrtError> {
    let subframe_count = frame.subframes.len();

    if subframe_count > (!OPTIONAL_PAIR_FLAG) as usize {
        return Err(PrtError::invalid(
            section,
            format!("at most 127 subframes, have {subframe_count}"),
        ));
    }

    if frame.unknown & OPTIONAL_PAIR_FLAG != 0 {
        return Err(PrtError::invalid(
            section,
            format!("unknown byte must fit in 7 bits, have {}", frame.unknown),
        ));
    }

    writer.append_u8(with_flag(subframe_count as u8, &frame.optional12));
    writer.append_u8(with_flag(frame.unknown, &frame.optional34));

    frame.optional12.write_to_writer(writer);
    frame.optional34.write_to_writer(writer);

    frame
        .subframes
        .iter()
        .for_each(|subframe| subframe.write_to_writer(writer));

    Ok(())
}

fn write_animation(
    writer: &mut ByteWriter,
    animation: &Animation,
    animation_index: usize,
) -> Result<(), PrtError> {
    let Animation {
        unknown1,
        bounding_box,
        offset,
        unknown2,
        frames,
        appendix,
    } = animation;

    writer.append_u32(*unknown1);
    writer.append_u32(bounding_box.left);
    writer.append_u32(bounding_box.top);
    writer.append_u32(bounding_box.right);
    writer.append_u32(bounding_box.bottom);
    writer.append_u32(offset.x);
    writer.append_u32(offset.y);
    writer.append_u32(*unknown2);
    writer.append_u32(frames.len() as u32);

    for (frame_index, frame) in frames.iter().enumerate() {
        write_frame(
            writer,
            frame,
            Section::Frame {
                animation: animation_index,
                frame: frame_index,
            },
        )?;
    }

    writer.append_u32(appendix.len() as u32);

    appendix
        .iter()
        .flatten()
        .for_each(|&value| writer.append_u32(value));

    Ok(())
}

#[cfg(test)]
mod test {
    use crate::{Point, Subframe};

    use super::*;

    fn frame_section() -> Section {
        Section::Frame {
            animation: 0,
            frame: 0,
        }
    }

    #[test]
    fn frame_header_flags() {
        let frame = Frame {
            subframes: vec![Subframe::default(); 5],
            unknown: 2,
            optional12: Some((3, 7)),
            optional34: None,
        };

        let mut writer = ByteWriter::new();
        write_frame(&mut writer, &frame, frame_section()).unwrap();

        assert_eq!(&writer.data[..4], &[0x85, 0x02, 3, 7]);
        assert_eq!(writer.data.len(), 4 + 5 * 10);
    }

    #[test]
    fn frame_header_both_pairs() {
        let frame = Frame {
            subframes: vec![Subframe {
                bitmap_id: -2,
                unknown: 1,
                subframe_id: 9,
                offset: Point { x: -1, y: 300 },
            }],
            unknown: 0x7f,
            optional12: Some((1, 2)),
            optional34: Some((3, 4)),
        };

        let mut writer = ByteWriter::new();
        write_frame(&mut writer, &frame, frame_section()).unwrap();

        assert_eq!(
            writer.data,
            vec![0x81, 0xff, 1, 2, 3, 4, 0xfe, 0xff, 1, 9, 0xff, 0xff, 0x2c, 0x01]
        );
    }

    #[test]
    fn frame_limits() {
        let too_many = Frame {
            subframes: vec![Subframe::default(); 128],
            ..Default::default()
        };

        assert!(matches!(
            write_frame(&mut ByteWriter::new(), &too_many, frame_section()),
            Err(PrtError::InvalidModel { .. })
        ));

        let wide_unknown = Frame {
            unknown: 0x80,
            ..Default::default()
        };

        assert!(matches!(
            write_frame(&mut ByteWriter::new(), &wide_unknown, frame_section()),
            Err(PrtError::InvalidModel { .. })
        ));
    }

    #[test]
    fn canonical_palette_chunks() {
        let mut writer = ByteWriter::new();
        write_palettes(&mut writer, &[Palette::black()]).unwrap();

        let bytes = writer.data;

        assert_eq!(&bytes[..4], b"CPAL");
        assert_eq!(&bytes[4..8], &1u32.to_le_bytes());
        assert_eq!(&bytes[8..12], b"PPAL");
        assert_eq!(&bytes[12..16], &1048u32.to_le_bytes());
        assert_eq!(&bytes[16..20], b"head");
        assert_eq!(&bytes[20..24], &4u32.to_le_bytes());
        assert_eq!(&bytes[24..28], &1u32.to_le_bytes());
        assert_eq!(&bytes[28..32], b"data");
        assert_eq!(&bytes[32..36], &1024u32.to_le_bytes());
        assert_eq!(bytes.len(), 36 + 1024);
    }

    #[test]
    fn palette_must_have_256_colors() {
        let mut writer = ByteWriter::new();

        assert!(matches!(
            write_palettes(&mut writer, &[Palette::black(), Palette::default()]),
            Err(PrtError::InvalidModel {
                section: Section::Palette { palette: 1 },
                ..
            })
        ));
    }

    #[test]
    fn bitmap_offsets_follow_concatenation() {
        let bitmaps = [
            Bitmap {
                width: 5,
                height: 2,
                data: vec![1; 16],
                ..Default::default()
            },
            Bitmap {
                width: 4,
                height: 1,
                data: vec![2; 4],
                image_type: 4,
                palette_id: 1,
            },
        ];

        let mut writer = ByteWriter::new();
        let companion = write_bitmaps(&mut writer, &bitmaps, 2).unwrap();

        let bytes = writer.data;

        assert_eq!(&bytes[..4], &2u32.to_le_bytes());
        // padded width, offset
        assert_eq!(&bytes[4..12], &[8, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(&bytes[24..32], &[4, 0, 0, 0, 16, 0, 0, 0]);
        assert_eq!(&bytes[40..44], &[4, 0, 1, 0]);

        let (image, palette) = Bitmap::open_bmp_from_bytes(&companion).unwrap();

        assert_eq!(palette, Palette::black());
        assert_eq!((image.width, image.height), (4, 5));
        assert_eq!(&image.data[..16], &[1; 16]);
        assert_eq!(&image.data[16..], &[2; 4]);
    }

    #[test]
    fn bitmap_checks() {
        let out_of_range = Bitmap {
            width: 4,
            height: 1,
            data: vec![0; 4],
            palette_id: 1,
            ..Default::default()
        };

        assert!(matches!(
            write_bitmaps(&mut ByteWriter::new(), &[out_of_range], 1),
            Err(PrtError::OutOfRange { .. })
        ));

        let short = Bitmap {
            width: 5,
            height: 1,
            data: vec![0; 5],
            ..Default::default()
        };

        assert!(matches!(
            write_bitmaps(&mut ByteWriter::new(), &[short], 1),
            Err(PrtError::InvalidModel { .. })
        ));

        let too_wide = Bitmap {
            width: u32::MAX,
            height: 1,
            ..Default::default()
        };

        assert!(matches!(
            write_bitmaps(&mut ByteWriter::new(), &[too_wide], 1),
            Err(PrtError::InvalidModel {
                section: Section::Bitmap { bitmap: 0 },
                ..
            })
        ));
    }
}
