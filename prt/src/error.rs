use std::fmt;

/// Where in the input a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    /// `CPAL` tag and palette count
    PaletteHeader,
    Palette { palette: usize },
    BitmapHeader,
    Bitmap { bitmap: usize },
    /// Raster header of the companion file
    Companion,
    Counts,
    Animation { animation: usize },
    Frame { animation: usize, frame: usize },
    /// Standalone palette interchange file
    PaletteFile,
    /// Standalone raster image
    Bmp,
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Section::PaletteHeader => write!(f, "palette section header"),
            Section::Palette { palette } => write!(f, "palette {palette}"),
            Section::BitmapHeader => write!(f, "bitmap section header"),
            Section::Bitmap { bitmap } => write!(f, "bitmap {bitmap}"),
            Section::Companion => write!(f, "companion bitmap header"),
            Section::Counts => write!(f, "animation counts"),
            Section::Animation { animation } => write!(f, "animation {animation}"),
            Section::Frame { animation, frame } => {
                write!(f, "animation {animation} frame {frame}")
            }
            Section::PaletteFile => write!(f, "palette file"),
            Section::Bmp => write!(f, "bitmap file"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PrtError {
    #[error("Truncated input in {section}: ran out of data with {remaining} byte(s) left")]
    Truncated { section: Section, remaining: usize },
    #[error("Signature mismatch in {section}. Expect ({expect:?}). Have ({have:?})")]
    SignatureMismatch {
        section: Section,
        expect: String,
        have: String,
    },
    #[error("Size mismatch for {field} in {section}. Expect ({expect}). Have ({have})")]
    SizeMismatch {
        section: Section,
        field: &'static str,
        expect: u64,
        have: u64,
    },
    #[error("Mismatched {what} count. Expect ({expect}). Have ({have})")]
    CountMismatch {
        what: &'static str,
        expect: usize,
        have: usize,
    },
    #[error("Palette id {palette_id} of {section} is out of range ({palette_count} palettes)")]
    OutOfRange {
        section: Section,
        palette_id: i64,
        palette_count: usize,
    },
    #[error("Unsupported {what} in {section}")]
    Unsupported { section: Section, what: String },
    #[error("Invalid {section} for encoding: {message}")]
    InvalidModel { section: Section, message: String },
    #[error("Cannot parse color on line {line} of {section}: {content:?}")]
    TextLine {
        section: Section,
        line: usize,
        content: String,
    },
    #[error("IOError: {source}")]
    IOError {
        #[from]
        source: std::io::Error,
    },
}

impl PrtError {
    pub(crate) fn signature(section: Section, expect: &[u8], have: &[u8]) -> Self {
        Self::SignatureMismatch {
            section,
            expect: String::from_utf8_lossy(expect).into_owned(),
            have: String::from_utf8_lossy(have).into_owned(),
        }
    }

    pub(crate) fn invalid(section: Section, message: impl Into<String>) -> Self {
        Self::InvalidModel {
            section,
            message: message.into(),
        }
    }
}
