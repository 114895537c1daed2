//! Standalone palette files: Microsoft RIFF PAL, JASC-PAL text and Photoshop ACT.
//!
//! RIFF layout is described in http://www.aelius.com/njh/wavemetatools/doc/riffmci.pdf
use std::{
    ffi::OsStr,
    fs::OpenOptions,
    io::Write,
    path::{Path, PathBuf},
};

use byte_writer::ByteWriter;
use nom::{
    bytes::complete::take,
    number::complete::{le_u16, le_u32},
};

use crate::{
    color_table::{next_line, parse_color_table, write_color_table, ColorTableFormat},
    error::{PrtError, Section},
    nom_helpers::{run, tag4},
    Palette, PALETTE_COLOR_COUNT,
};

const RIFF_TAG: &[u8; 4] = b"RIFF";
// Only the PAL chunk header is counted, not the colors.
const RIFF_LENGTH: u32 = 16;
const PAL_DATA_TAG: &[u8; 8] = b"PAL data";
const PAL_VERSION: u16 = 0x0300;

const JASC_SIGNATURE: &[u8] = b"JASC-PAL";
const JASC_VERSION: &[u8] = b"0100";
const JASC_HEADER_LINES: usize = 3;

const SECTION: Section = Section::PaletteFile;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaletteFormat {
    /// Microsoft RIFF PAL
    RiffPal,
    /// Paint Shop Pro text palette
    JascPal,
    /// Photoshop color table
    Act,
}

impl PaletteFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            PaletteFormat::RiffPal | PaletteFormat::JascPal => "pal",
            PaletteFormat::Act => "act",
        }
    }
}

fn parse_riff_pal(i: &[u8]) -> Result<Palette, PrtError> {
    let (i, (tag, length)) = run(i, SECTION, (tag4, le_u32))?;

    if &tag != RIFF_TAG {
        return Err(PrtError::signature(SECTION, RIFF_TAG, &tag));
    }

    if length != RIFF_LENGTH {
        return Err(PrtError::SizeMismatch {
            section: SECTION,
            field: "RIFF length",
            expect: RIFF_LENGTH as u64,
            have: length as u64,
        });
    }

    let (i, (data_tag, data_length, version, color_count)) =
        run(i, SECTION, (take(8usize), le_u32, le_u16, le_u16))?;

    if data_tag != PAL_DATA_TAG {
        return Err(PrtError::signature(SECTION, PAL_DATA_TAG, data_tag));
    }

    if version != PAL_VERSION {
        return Err(PrtError::Unsupported {
            section: SECTION,
            what: format!("PAL version {version:#06x}"),
        });
    }

    let expect = color_count as u64 * 4 + 4;
    if data_length as u64 != expect {
        return Err(PrtError::SizeMismatch {
            section: SECTION,
            field: "PAL data length",
            expect,
            have: data_length as u64,
        });
    }

    let (_, colors) = parse_color_table(
        i,
        color_count as usize,
        ColorTableFormat::Binary4 { reverse: true },
        SECTION,
    )?;

    Ok(Palette::new(colors))
}

fn jasc_header_line<'a>(i: &'a [u8], line: usize) -> Result<(&'a [u8], &'a [u8]), PrtError> {
    let Some((rest, content)) = next_line(i) else {
        return Err(PrtError::Truncated {
            section: SECTION,
            remaining: 0,
        });
    };

    log::trace!(
        "JASC header line {line}: {:?}",
        String::from_utf8_lossy(content)
    );

    Ok((rest, content))
}

fn parse_jasc_pal(i: &[u8]) -> Result<Palette, PrtError> {
    let (i, signature) = jasc_header_line(i, 0)?;

    if signature != JASC_SIGNATURE {
        return Err(PrtError::signature(SECTION, JASC_SIGNATURE, signature));
    }

    let (i, version) = jasc_header_line(i, 1)?;

    if version != JASC_VERSION {
        return Err(PrtError::signature(SECTION, JASC_VERSION, version));
    }

    let (i, color_count) = jasc_header_line(i, 2)?;

    let Some(color_count) = std::str::from_utf8(color_count)
        .ok()
        .and_then(|count| count.trim().parse::<usize>().ok())
    else {
        return Err(PrtError::TextLine {
            section: SECTION,
            line: 2,
            content: String::from_utf8_lossy(color_count).into_owned(),
        });
    };

    let (_, colors) = parse_color_table(i, color_count, ColorTableFormat::Text, SECTION)
        .map_err(|err| match err {
            PrtError::TextLine {
                section,
                line,
                content,
            } => PrtError::TextLine {
                section,
                line: line + JASC_HEADER_LINES,
                content,
            },
            err => err,
        })?;

    Ok(Palette::new(colors))
}

fn parse_act(i: &[u8]) -> Result<Palette, PrtError> {
    let (_, colors) = parse_color_table(
        i,
        PALETTE_COLOR_COUNT,
        ColorTableFormat::Binary3 { reverse: true },
        SECTION,
    )?;

    Ok(Palette::new(colors))
}

impl Palette {
    pub fn open_from_bytes(bytes: &[u8], format: PaletteFormat) -> Result<Palette, PrtError> {
        let palette = match format {
            PaletteFormat::RiffPal => parse_riff_pal(bytes),
            PaletteFormat::JascPal => parse_jasc_pal(bytes),
            PaletteFormat::Act => parse_act(bytes),
        }?;

        log::debug!("read {:?} palette with {} colors", format, palette.colors.len());

        Ok(palette)
    }

    pub fn open_from_file(
        path: impl AsRef<OsStr> + AsRef<Path>,
        format: PaletteFormat,
    ) -> Result<Palette, PrtError> {
        let bytes = std::fs::read(path)?;

        Self::open_from_bytes(&bytes, format)
    }

    pub fn write_to_bytes(&self, format: PaletteFormat) -> Result<Vec<u8>, PrtError> {
        let mut writer = ByteWriter::new();

        match format {
            PaletteFormat::RiffPal => {
                let color_count = u16::try_from(self.colors.len()).map_err(|_| {
                    PrtError::invalid(
                        SECTION,
                        format!("{} colors do not fit a PAL header", self.colors.len()),
                    )
                })?;

                writer.append_u8_slice(RIFF_TAG);
                writer.append_u32(RIFF_LENGTH);
                writer.append_u8_slice(PAL_DATA_TAG);
                writer.append_u32(color_count as u32 * 4 + 4);
                writer.append_u16(PAL_VERSION);
                writer.append_u16(color_count);

                write_color_table(
                    &mut writer,
                    &self.colors,
                    ColorTableFormat::Binary4 { reverse: true },
                );
            }
            PaletteFormat::JascPal => {
                writer.append_u8_slice(JASC_SIGNATURE);
                writer.append_string("\r\n");
                writer.append_u8_slice(JASC_VERSION);
                writer.append_string("\r\n");
                writer.append_string(&format!("{}\r\n", self.colors.len()));

                write_color_table(&mut writer, &self.colors, ColorTableFormat::Text);
            }
            PaletteFormat::Act => {
                if self.colors.len() != PALETTE_COLOR_COUNT {
                    return Err(PrtError::invalid(
                        SECTION,
                        format!(
                            "ACT needs exactly {PALETTE_COLOR_COUNT} colors, have {}",
                            self.colors.len()
                        ),
                    ));
                }

                write_color_table(
                    &mut writer,
                    &self.colors,
                    ColorTableFormat::Binary3 { reverse: true },
                );
            }
        }

        Ok(writer.data)
    }

    pub fn write_to_file(
        &self,
        path: impl AsRef<Path> + Into<PathBuf>,
        format: PaletteFormat,
    ) -> Result<(), PrtError> {
        let bytes = self.write_to_bytes(format)?;

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

#[cfg(test)]
mod test {
    use crate::Color;

    use super::*;

    fn gradient(len: usize) -> Palette {
        Palette::new(
            (0..len)
                .map(|i| Color::rgb(i as u8, (i * 3) as u8, 255 - i as u8))
                .collect::<Vec<Color>>(),
        )
    }

    #[test]
    fn riff_pal_layout() {
        let palette = Palette::new(vec![Color::new(10, 20, 30, 5), Color::rgb(1, 2, 3)]);
        let bytes = palette.write_to_bytes(PaletteFormat::RiffPal).unwrap();

        assert_eq!(&bytes[..4], b"RIFF");
        assert_eq!(&bytes[4..8], &16u32.to_le_bytes());
        assert_eq!(&bytes[8..16], b"PAL data");
        assert_eq!(&bytes[16..20], &12u32.to_le_bytes());
        assert_eq!(&bytes[20..22], &[0x00, 0x03]);
        assert_eq!(&bytes[22..24], &2u16.to_le_bytes());
        assert_eq!(&bytes[24..28], &[30, 20, 10, 5]);
        assert_eq!(bytes.len(), 24 + 8);

        let parsed = Palette::open_from_bytes(&bytes, PaletteFormat::RiffPal).unwrap();
        assert_eq!(parsed, palette);
    }

    #[test]
    fn riff_pal_rejects_bad_headers() {
        let bytes = gradient(4).write_to_bytes(PaletteFormat::RiffPal).unwrap();

        let mut bad_tag = bytes.clone();
        bad_tag[0] = b'X';
        assert!(matches!(
            Palette::open_from_bytes(&bad_tag, PaletteFormat::RiffPal),
            Err(PrtError::SignatureMismatch { .. })
        ));

        let mut bad_length = bytes.clone();
        bad_length[4] = 17;
        assert!(matches!(
            Palette::open_from_bytes(&bad_length, PaletteFormat::RiffPal),
            Err(PrtError::SizeMismatch { .. })
        ));

        let mut bad_version = bytes.clone();
        bad_version[21] = 0x02;
        assert!(matches!(
            Palette::open_from_bytes(&bad_version, PaletteFormat::RiffPal),
            Err(PrtError::Unsupported { .. })
        ));

        let mut bad_count = bytes.clone();
        bad_count[22] = 5;
        assert!(matches!(
            Palette::open_from_bytes(&bad_count, PaletteFormat::RiffPal),
            Err(PrtError::SizeMismatch { .. })
        ));

        assert!(matches!(
            Palette::open_from_bytes(&bytes[..bytes.len() - 1], PaletteFormat::RiffPal),
            Err(PrtError::Truncated { .. })
        ));
    }

    #[test]
    fn jasc_pal() {
        let palette = gradient(3);
        let bytes = palette.write_to_bytes(PaletteFormat::JascPal).unwrap();

        assert_eq!(
            String::from_utf8(bytes.clone()).unwrap(),
            "JASC-PAL\r\n0100\r\n3\r\n0 0 255\r\n1 3 254\r\n2 6 253\r\n"
        );

        let parsed = Palette::open_from_bytes(&bytes, PaletteFormat::JascPal).unwrap();
        assert_eq!(parsed, palette);

        // unix line endings are fine too
        let parsed =
            Palette::open_from_bytes(b"JASC-PAL\n0100\n1\n7 8 9\n", PaletteFormat::JascPal)
                .unwrap();
        assert_eq!(parsed.colors, vec![Color::rgb(7, 8, 9)]);
    }

    #[test]
    fn jasc_pal_rejects_bad_headers() {
        assert!(matches!(
            Palette::open_from_bytes(b"JASC-PAX\n0100\n0\n", PaletteFormat::JascPal),
            Err(PrtError::SignatureMismatch { .. })
        ));
        assert!(matches!(
            Palette::open_from_bytes(b"JASC-PAL\n0200\n0\n", PaletteFormat::JascPal),
            Err(PrtError::SignatureMismatch { .. })
        ));
        assert!(matches!(
            Palette::open_from_bytes(b"JASC-PAL\n0100\nmany\n", PaletteFormat::JascPal),
            Err(PrtError::TextLine { line: 2, .. })
        ));
        assert!(matches!(
            Palette::open_from_bytes(b"JASC-PAL\n0100\n2\n1 2 3\n1 2\n", PaletteFormat::JascPal),
            Err(PrtError::TextLine { line: 4, .. })
        ));
    }

    #[test]
    fn jasc_pal_huge_color_count() {
        let bytes = format!("JASC-PAL\r\n0100\r\n{}\r\n1 2 3\r\n", usize::MAX);

        assert!(matches!(
            Palette::open_from_bytes(bytes.as_bytes(), PaletteFormat::JascPal),
            Err(PrtError::Truncated {
                section: Section::PaletteFile,
                ..
            })
        ));
    }

    #[test]
    fn act_channels() {
        let mut palette = gradient(PALETTE_COLOR_COUNT);
        palette.colors[0] = Color::new(10, 20, 30, 0);
        palette.colors[1] = Color::new(40, 50, 60, 9);

        let bytes = palette.write_to_bytes(PaletteFormat::Act).unwrap();

        assert_eq!(bytes.len(), PALETTE_COLOR_COUNT * 3);
        assert_eq!(&bytes[..3], &[30, 20, 10]);

        let parsed = Palette::open_from_bytes(&bytes, PaletteFormat::Act).unwrap();

        assert_eq!(parsed.colors[0], Color::new(10, 20, 30, 0));
        // flags do not survive ACT
        assert_eq!(parsed.colors[1], Color::new(40, 50, 60, 0));
    }

    #[test]
    fn act_needs_256_colors() {
        assert!(matches!(
            gradient(255).write_to_bytes(PaletteFormat::Act),
            Err(PrtError::InvalidModel { .. })
        ));

        assert!(matches!(
            Palette::open_from_bytes(&[0u8; 765], PaletteFormat::Act),
            Err(PrtError::Truncated { .. })
        ));
    }
}
