pub mod build;
pub mod extract;
pub mod metadata;

pub use build::build;
pub use extract::extract;

pub static PALETTES_FOLDER: &str = "palettes";
pub static BITMAPS_FOLDER: &str = "bitmaps";
pub static EXTRA_DATA_FILE_NAME: &str = "extra.dat";

#[cfg(test)]
mod test {
    use prt::{
        padded_row_width, Animation, Archive, Bitmap, Color, Frame, Palette, PaletteFormat, Point,
        Rect, Subframe,
    };

    use super::{
        build::read_tree,
        extract::write_tree,
        metadata::{ANIMATIONS_FILE_NAME, BITMAPS_FILE_NAME},
    };

    fn palette(seed: u8) -> Palette {
        Palette::new(
            (0..256)
                .map(|i| Color::rgb(i as u8, seed, 255 - i as u8))
                .collect::<Vec<Color>>(),
        )
    }

    fn bitmap(width: u32, height: u32, image_type: i16, palette_id: i16) -> Bitmap {
        let length = padded_row_width(width).unwrap() * height;

        Bitmap {
            width,
            height,
            data: vec![palette_id as u8 + 1; length as usize],
            image_type,
            palette_id,
        }
    }

    fn archive() -> Archive {
        Archive {
            palettes: vec![palette(1), palette(2)],
            bitmaps: vec![bitmap(3, 2, 1, 1), bitmap(16, 4, 4, 0)],
            animations: vec![Animation {
                unknown1: 5,
                bounding_box: Rect {
                    left: 1,
                    top: 2,
                    right: 3,
                    bottom: 4,
                },
                offset: Point { x: 7, y: 8 },
                unknown2: 9,
                frames: vec![
                    Frame {
                        subframes: vec![Subframe {
                            bitmap_id: 1,
                            unknown: 2,
                            subframe_id: 3,
                            offset: Point { x: -10, y: 10 },
                        }],
                        unknown: 4,
                        optional12: Some((3, 7)),
                        optional34: None,
                    },
                    Frame {
                        optional34: Some((1, 0)),
                        ..Default::default()
                    },
                ],
                appendix: vec![[4, 3, 2, 1]],
            }],
            num_optional_entries: 11,
            extra_data: vec![1, 2, 3],
        }
    }

    #[test]
    fn tree_round_trip() {
        for palette_format in [
            PaletteFormat::Act,
            PaletteFormat::RiffPal,
            PaletteFormat::JascPal,
        ] {
            let dir = tempfile::tempdir().unwrap();
            let archive = archive();

            write_tree(&archive, dir.path(), palette_format).unwrap();

            assert!(dir.path().join(BITMAPS_FILE_NAME).exists());
            assert!(dir.path().join(ANIMATIONS_FILE_NAME).exists());
            assert!(dir
                .path()
                .join("palettes")
                .join(format!("1.{}", palette_format.extension()))
                .exists());

            let rebuilt = read_tree(dir.path(), palette_format, false).unwrap();

            assert_eq!(rebuilt, archive);
        }
    }

    #[test]
    fn palettes_from_bitmaps() {
        let dir = tempfile::tempdir().unwrap();
        let archive = archive();

        write_tree(&archive, dir.path(), PaletteFormat::Act).unwrap();

        let rebuilt = read_tree(dir.path(), PaletteFormat::Act, true).unwrap();

        assert_eq!(rebuilt.palettes.len(), archive.bitmaps.len());
        assert_eq!(rebuilt.bitmaps[0].palette_id, 0);
        assert_eq!(rebuilt.bitmaps[1].palette_id, 1);
        assert_eq!(rebuilt.palettes[0], archive.palettes[1]);
        assert_eq!(rebuilt.palettes[1], archive.palettes[0]);

        // still a valid archive
        let (container, companion) = rebuilt.write_to_bytes().unwrap();
        let decoded = Archive::open_from_bytes(&container, &companion).unwrap();

        assert_eq!(decoded, rebuilt);
    }

    #[test]
    fn missing_palette_file() {
        let dir = tempfile::tempdir().unwrap();

        write_tree(&archive(), dir.path(), PaletteFormat::Act).unwrap();

        std::fs::remove_file(dir.path().join("palettes").join("1.act")).unwrap();

        assert!(read_tree(dir.path(), PaletteFormat::Act, false).is_err());
    }
}
