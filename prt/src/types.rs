use crate::error::{PrtError, Section};

/// Number of colors in every palette stored inside the archive.
pub const PALETTE_COLOR_COUNT: usize = 256;

/// Bit 7 of the frame header bytes flags a trailing optional pair.
pub const OPTIONAL_PAIR_FLAG: u8 = 0x80;

/// Logical RGB order. On-disk order depends on the container.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub flags: u8,
}

impl Color {
    pub fn new(r: u8, g: u8, b: u8, flags: u8) -> Self {
        Self { r, g, b, flags }
    }

    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Palette {
    pub colors: Vec<Color>,
}

impl Palette {
    pub fn new(colors: impl Into<Vec<Color>>) -> Self {
        Self {
            colors: colors.into(),
        }
    }

    /// The placeholder palette written into the companion raster file.
    pub fn black() -> Self {
        Self::new(vec![Color::default(); PALETTE_COLOR_COUNT])
    }
}

/// Rows are padded to 4 bytes based on the pixel width, even for 1 bpp images.
///
/// That over-allocates 1 bpp rows but it is how the archive lays them out.
/// `None` when the padded width does not fit in a `u32`.
pub fn padded_row_width(width: u32) -> Option<u32> {
    width.checked_add(3).map(|width| width & !3)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bitmap {
    pub width: u32,
    pub height: u32,
    // [[u8; padded_row_width]; height]
    pub data: Vec<u8>,
    pub image_type: i16,
    /// Index into [`Archive::palettes`]
    pub palette_id: i16,
}

impl Bitmap {
    pub fn padded_width(&self) -> Option<u32> {
        padded_row_width(self.width)
    }

    /// Length the pixel buffer must have, `None` if it cannot be addressed.
    pub fn expected_len(&self) -> Option<usize> {
        (self.padded_width()? as usize).checked_mul(self.height as usize)
    }

    /// Image types 4 and 5 are monochrome.
    pub fn bits_per_pixel(&self) -> u16 {
        match self.image_type {
            4 | 5 => 1,
            _ => 8,
        }
    }

    /// Looks up the palette this bitmap refers to.
    pub fn palette<'a>(&self, palettes: &'a [Palette]) -> Option<&'a Palette> {
        usize::try_from(self.palette_id)
            .ok()
            .and_then(|id| palettes.get(id))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Point<T> {
    pub x: T,
    pub y: T,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rect<T> {
    pub left: T,
    pub top: T,
    pub right: T,
    pub bottom: T,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Subframe {
    /// Negative values are used as a sentinel by the game
    pub bitmap_id: i16,
    pub unknown: u8,
    pub subframe_id: u8,
    pub offset: Point<i16>,
}

/// Two optional bytes that are always present or absent together.
pub type OptionalPair = Option<(u8, u8)>;

/// Joins two separately stored optional values into an [`OptionalPair`].
pub fn optional_pair(
    first: Option<u8>,
    second: Option<u8>,
    section: Section,
) -> Result<OptionalPair, PrtError> {
    match (first, second) {
        (Some(first), Some(second)) => Ok(Some((first, second))),
        (None, None) => Ok(None),
        (first, second) => Err(PrtError::invalid(
            section,
            format!("optional pair must be complete, have ({first:?}, {second:?})"),
        )),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    pub subframes: Vec<Subframe>,
    /// 7 bits, the high bit is taken by the flag of `optional34`
    pub unknown: u8,
    /// optional1 and optional2
    pub optional12: OptionalPair,
    /// optional3 and optional4
    pub optional34: OptionalPair,
}

pub type Appendix = [u32; 4];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Animation {
    pub unknown1: u32,
    pub bounding_box: Rect<u32>,
    pub offset: Point<u32>,
    pub unknown2: u32,
    pub frames: Vec<Frame>,
    pub appendix: Vec<Appendix>,
}

impl Animation {
    pub fn subframe_count(&self) -> usize {
        self.frames.iter().map(|frame| frame.subframes.len()).sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Archive {
    pub palettes: Vec<Palette>,
    pub bitmaps: Vec<Bitmap>,
    pub animations: Vec<Animation>,
    /// Unknown meaning, kept as is
    pub num_optional_entries: u32,
    /// Everything after the animations, kept byte for byte
    pub extra_data: Vec<u8>,
}

impl Archive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frame_count(&self) -> usize {
        self.animations
            .iter()
            .map(|animation| animation.frames.len())
            .sum()
    }

    pub fn subframe_count(&self) -> usize {
        self.animations
            .iter()
            .map(|animation| animation.subframe_count())
            .sum()
    }

    pub fn bitmap_palette(&self, bitmap_index: usize) -> Option<&Palette> {
        self.bitmaps
            .get(bitmap_index)
            .and_then(|bitmap| bitmap.palette(&self.palettes))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn row_padding() {
        assert_eq!(padded_row_width(5), Some(8));
        assert_eq!(padded_row_width(8), Some(8));
        assert_eq!(padded_row_width(9), Some(12));
        assert_eq!(padded_row_width(1), Some(4));
    }

    #[test]
    fn row_padding_overflow() {
        assert_eq!(padded_row_width(u32::MAX - 3), Some(u32::MAX - 3));
        assert_eq!(padded_row_width(u32::MAX - 2), None);
        assert_eq!(padded_row_width(u32::MAX), None);

        let bitmap = Bitmap {
            width: u32::MAX,
            height: 1,
            ..Default::default()
        };

        assert_eq!(bitmap.expected_len(), None);
    }

    #[test]
    fn monochrome_image_types() {
        let mut bitmap = Bitmap::default();

        assert_eq!(bitmap.bits_per_pixel(), 8);

        bitmap.image_type = 4;
        assert_eq!(bitmap.bits_per_pixel(), 1);

        bitmap.image_type = 5;
        assert_eq!(bitmap.bits_per_pixel(), 1);
    }

    #[test]
    fn padding_ignores_bit_depth() {
        let bitmap = Bitmap {
            width: 9,
            height: 2,
            image_type: 4,
            ..Default::default()
        };

        assert_eq!(bitmap.expected_len(), Some(24));
    }

    #[test]
    fn half_optional_pair() {
        let section = Section::Frame {
            animation: 0,
            frame: 0,
        };

        assert_eq!(optional_pair(Some(3), Some(7), section).unwrap(), Some((3, 7)));
        assert_eq!(optional_pair(None, None, section).unwrap(), None);
        assert!(matches!(
            optional_pair(Some(3), None, section),
            Err(PrtError::InvalidModel { .. })
        ));
        assert!(matches!(
            optional_pair(None, Some(7), section),
            Err(PrtError::InvalidModel { .. })
        ));
    }

    #[test]
    fn palette_lookup_is_bounded() {
        let archive = Archive {
            palettes: vec![Palette::black()],
            bitmaps: vec![
                Bitmap {
                    palette_id: 0,
                    ..Default::default()
                },
                Bitmap {
                    palette_id: 1,
                    ..Default::default()
                },
                Bitmap {
                    palette_id: -1,
                    ..Default::default()
                },
            ],
            ..Default::default()
        };

        assert!(archive.bitmap_palette(0).is_some());
        assert!(archive.bitmap_palette(1).is_none());
        assert!(archive.bitmap_palette(2).is_none());
    }
}
