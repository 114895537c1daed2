//! Windows bitmap container for a single paletted image.
//!
//! https://en.wikipedia.org/wiki/BMP_file_format
//!
//! Images are always written top-down with a negative height, that is how the
//! archive stores its rows.
use std::{
    ffi::OsStr,
    fs::OpenOptions,
    io::Write,
    path::{Path, PathBuf},
};

use byte_writer::ByteWriter;
use nom::{
    bytes::complete::take,
    combinator::map,
    number::complete::{le_i16, le_i32, le_u16, le_u32},
    Parser,
};

use crate::{
    color_table::{parse_color_table, write_color_table, ColorTableFormat},
    error::{PrtError, Section},
    nom_helpers::{run, IResult, PResult},
    padded_row_width, Bitmap, Palette, PALETTE_COLOR_COUNT,
};

pub const SIGNATURE: &[u8; 2] = b"BM";
pub const FILE_HEADER_LENGTH: u32 = 14;
pub const INFO_HEADER_LENGTH: u32 = 40;

const COLOR_TABLE_FORMAT: ColorTableFormat = ColorTableFormat::Binary4 { reverse: false };

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHeader {
    pub file_size: u32,
    pub reserved1: i16,
    pub reserved2: i16,
    /// Offset of the pixel array from the start of the file
    pub data_offset: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoHeader {
    pub header_size: u32,
    pub width: i32,
    /// Negative for top-down images
    pub height: i32,
    pub planes: u16,
    pub bits_per_pixel: u16,
    pub compression: u32,
    pub image_size: u32,
    pub x_resolution: i32,
    pub y_resolution: i32,
    pub colors_used: u32,
    pub colors_important: u32,
}

/// The signature is checked before anything else is read.
pub fn parse_file_header(i: &[u8], section: Section) -> PResult<'_, FileHeader> {
    let (i, signature) = run(i, section, take(2usize))?;

    if signature != SIGNATURE {
        return Err(PrtError::signature(section, SIGNATURE, signature));
    }

    run(
        i,
        section,
        map(
            (le_u32, le_i16, le_i16, le_u32),
            |(file_size, reserved1, reserved2, data_offset)| FileHeader {
                file_size,
                reserved1,
                reserved2,
                data_offset,
            },
        ),
    )
}

fn parse_info_header(i: &[u8]) -> IResult<'_, InfoHeader> {
    map(
        (
            le_u32, le_i32, le_i32, le_u16, le_u16, le_u32, le_u32, le_i32, le_i32, le_u32, le_u32,
        ),
        |(
            header_size,
            width,
            height,
            planes,
            bits_per_pixel,
            compression,
            image_size,
            x_resolution,
            y_resolution,
            colors_used,
            colors_important,
        )| InfoHeader {
            header_size,
            width,
            height,
            planes,
            bits_per_pixel,
            compression,
            image_size,
            x_resolution,
            y_resolution,
            colors_used,
            colors_important,
        },
    )
    .parse(i)
}

fn too_large(section: Section, what: &str, value: impl std::fmt::Display) -> PrtError {
    PrtError::invalid(section, format!("{what} {value} does not fit in a bitmap header"))
}

/// Writes headers, color table and pixels. The file size is patched in at the end.
pub fn write_bmp(
    writer: &mut ByteWriter,
    (width, height): (u32, u32),
    bits_per_pixel: u16,
    palette: &Palette,
    data: &[u8],
    section: Section,
) -> Result<(), PrtError> {
    let width = i32::try_from(width).map_err(|_| too_large(section, "width", width))?;
    let height = i32::try_from(height).map_err(|_| too_large(section, "height", height))?;

    let start = writer.get_offset();
    let color_table_length = palette.colors.len() as u32 * 4;

    // file header
    writer.append_u8_slice(SIGNATURE);
    let file_size_index = writer.get_offset();
    writer.append_u32(0);
    writer.append_i16(0);
    writer.append_i16(0);
    writer.append_u32(FILE_HEADER_LENGTH + INFO_HEADER_LENGTH + color_table_length);

    // info header
    writer.append_u32(INFO_HEADER_LENGTH);
    writer.append_i32(width);
    writer.append_i32(-height);
    writer.append_u16(1);
    writer.append_u16(bits_per_pixel);
    writer.append_u32(0); // compression
    writer.append_u32(0); // image size
    writer.append_i32(0);
    writer.append_i32(0);
    writer.append_u32(palette.colors.len() as u32);
    writer.append_u32(0);

    write_color_table(writer, &palette.colors, COLOR_TABLE_FORMAT);

    writer.append_u8_slice(data);

    let file_size = writer.get_offset() - start;
    let file_size =
        u32::try_from(file_size).map_err(|_| too_large(section, "file size", file_size))?;
    writer.replace_with_u32(file_size_index, file_size);

    Ok(())
}

fn parse_bmp(bytes: &[u8]) -> Result<(Bitmap, Palette), PrtError> {
    let section = Section::Bmp;

    let (i, file_header) = parse_file_header(bytes, section)?;
    let (i, info_header) = run(i, section, parse_info_header)?;

    if info_header.header_size != INFO_HEADER_LENGTH {
        return Err(PrtError::SizeMismatch {
            section,
            field: "info header size",
            expect: INFO_HEADER_LENGTH as u64,
            have: info_header.header_size as u64,
        });
    }

    if info_header.height >= 0 {
        return Err(PrtError::Unsupported {
            section,
            what: format!("bottom-up image (height {})", info_header.height),
        });
    }

    if info_header.width < 0 {
        return Err(PrtError::Unsupported {
            section,
            what: format!("negative width {}", info_header.width),
        });
    }

    if info_header.colors_used != PALETTE_COLOR_COUNT as u32 {
        return Err(PrtError::SizeMismatch {
            section,
            field: "palette color count",
            expect: PALETTE_COLOR_COUNT as u64,
            have: info_header.colors_used as u64,
        });
    }

    if !matches!(info_header.bits_per_pixel, 1 | 8) {
        return Err(PrtError::Unsupported {
            section,
            what: format!("{} bits per pixel", info_header.bits_per_pixel),
        });
    }

    if info_header.compression != 0 {
        return Err(PrtError::Unsupported {
            section,
            what: format!("compression {}", info_header.compression),
        });
    }

    let (_, colors) = parse_color_table(i, PALETTE_COLOR_COUNT, COLOR_TABLE_FORMAT, section)?;

    let width = info_header.width as u32;
    let height = info_header.height.unsigned_abs();
    let length = padded_row_width(width)
        .and_then(|padded_width| (padded_width as usize).checked_mul(height as usize));

    let Some(data) = length.and_then(|length| {
        bytes
            .get(file_header.data_offset as usize..)
            .and_then(|pixels| pixels.get(..length))
    }) else {
        return Err(PrtError::Truncated {
            section,
            remaining: bytes.len().saturating_sub(file_header.data_offset as usize),
        });
    };

    let bitmap = Bitmap {
        width,
        height,
        data: data.to_vec(),
        ..Default::default()
    };

    Ok((bitmap, Palette::new(colors)))
}

impl Bitmap {
    /// Reads a standalone image. Image type and palette id are left at 0.
    pub fn open_bmp_from_bytes(bytes: &[u8]) -> Result<(Bitmap, Palette), PrtError> {
        parse_bmp(bytes)
    }

    pub fn open_bmp_from_file(
        path: impl AsRef<OsStr> + AsRef<Path>,
    ) -> Result<(Bitmap, Palette), PrtError> {
        let bytes = std::fs::read(path)?;

        Self::open_bmp_from_bytes(&bytes)
    }

    pub fn write_bmp_to_bytes(&self, palette: &Palette) -> Result<Vec<u8>, PrtError> {
        let mut writer = ByteWriter::new();

        write_bmp(
            &mut writer,
            (self.width, self.height),
            self.bits_per_pixel(),
            palette,
            &self.data,
            Section::Bmp,
        )?;

        Ok(writer.data)
    }

    pub fn write_bmp_to_file(
        &self,
        path: impl AsRef<Path> + Into<PathBuf>,
        palette: &Palette,
    ) -> Result<(), PrtError> {
        let bytes = self.write_bmp_to_bytes(palette)?;

        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;

        file.write_all(&bytes)?;

        file.flush()?;

        Ok(())
    }
}
