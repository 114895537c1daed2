//! Human-editable descriptions of bitmaps and animations.
use prt::{optional_pair, Animation, Bitmap, Frame, Point, PrtError, Rect, Section, Subframe};
use serde::{Deserialize, Serialize};

pub static BITMAPS_FILE_NAME: &str = "bitmaps.toml";
pub static ANIMATIONS_FILE_NAME: &str = "animations.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BitmapsMetadata {
    pub num_palettes: usize,
    #[serde(default)]
    pub bitmaps: Vec<BitmapMetadata>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BitmapMetadata {
    #[serde(rename = "type")]
    pub image_type: i16,
    pub palette: i16,
}

impl From<&Bitmap> for BitmapMetadata {
    fn from(bitmap: &Bitmap) -> Self {
        Self {
            image_type: bitmap.image_type,
            palette: bitmap.palette_id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointMetadata<T> {
    pub x: T,
    pub y: T,
}

impl<T> From<Point<T>> for PointMetadata<T> {
    fn from(Point { x, y }: Point<T>) -> Self {
        Self { x, y }
    }
}

impl<T> From<PointMetadata<T>> for Point<T> {
    fn from(PointMetadata { x, y }: PointMetadata<T>) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RectMetadata {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubframeMetadata {
    pub bitmap_id: i16,
    pub unknown: u8,
    pub subframe_id: u8,
    pub offset: PointMetadata<i16>,
}

/// The optional values are stored one by one, a lone half is rejected on build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameMetadata {
    pub unknown: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optional1: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optional2: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optional3: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optional4: Option<u8>,
    #[serde(default)]
    pub subframes: Vec<SubframeMetadata>,
}

// scalars first so that toml writes them before the nested tables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationMetadata {
    pub unknown1: u32,
    pub unknown2: u32,
    #[serde(default)]
    pub appendix: Vec<[u32; 4]>,
    pub bounding_box: RectMetadata,
    pub offset: PointMetadata<u32>,
    #[serde(default)]
    pub frames: Vec<FrameMetadata>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationsMetadata {
    pub num_optional_entries: u32,
    #[serde(default)]
    pub animations: Vec<AnimationMetadata>,
}

impl From<&Animation> for AnimationMetadata {
    fn from(animation: &Animation) -> Self {
        let Rect {
            left,
            top,
            right,
            bottom,
        } = animation.bounding_box;

        Self {
            unknown1: animation.unknown1,
            unknown2: animation.unknown2,
            appendix: animation.appendix.clone(),
            bounding_box: RectMetadata {
                left,
                top,
                right,
                bottom,
            },
            offset: animation.offset.into(),
            frames: animation
                .frames
                .iter()
                .map(|frame| FrameMetadata {
                    unknown: frame.unknown,
                    optional1: frame.optional12.map(|(first, _)| first),
                    optional2: frame.optional12.map(|(_, second)| second),
                    optional3: frame.optional34.map(|(first, _)| first),
                    optional4: frame.optional34.map(|(_, second)| second),
                    subframes: frame
                        .subframes
                        .iter()
                        .map(|subframe| SubframeMetadata {
                            bitmap_id: subframe.bitmap_id,
                            unknown: subframe.unknown,
                            subframe_id: subframe.subframe_id,
                            offset: subframe.offset.into(),
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}

impl AnimationMetadata {
    pub fn into_animation(self, animation_index: usize) -> Result<Animation, PrtError> {
        let frames = self
            .frames
            .into_iter()
            .enumerate()
            .map(|(frame_index, frame)| {
                let section = Section::Frame {
                    animation: animation_index,
                    frame: frame_index,
                };

                Ok(Frame {
                    optional12: optional_pair(frame.optional1, frame.optional2, section)?,
                    optional34: optional_pair(frame.optional3, frame.optional4, section)?,
                    unknown: frame.unknown,
                    subframes: frame
                        .subframes
                        .into_iter()
                        .map(|subframe| Subframe {
                            bitmap_id: subframe.bitmap_id,
                            unknown: subframe.unknown,
                            subframe_id: subframe.subframe_id,
                            offset: subframe.offset.into(),
                        })
                        .collect(),
                })
            })
            .collect::<Result<Vec<Frame>, PrtError>>()?;

        let RectMetadata {
            left,
            top,
            right,
            bottom,
        } = self.bounding_box;

        Ok(Animation {
            unknown1: self.unknown1,
            bounding_box: Rect {
                left,
                top,
                right,
                bottom,
            },
            offset: self.offset.into(),
            unknown2: self.unknown2,
            frames,
            appendix: self.appendix,
        })
    }
}
