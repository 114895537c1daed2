/// Palette section tag
pub const CPAL_TAG: [u8; 4] = *b"CPAL";

/// Groups the chunks of one palette
pub const PPAL_TAG: [u8; 4] = *b"PPAL";
pub const PPAL_SIZE: u32 = 1048;

/// Holds how many more chunks follow
pub const HEAD_TAG: [u8; 4] = *b"head";
pub const HEAD_SIZE: u32 = 4;

pub const DATA_TAG: [u8; 4] = *b"data";
pub const DATA_SIZE: u32 = 1024;

/// Embedded RIFF palette, recognised but not supported
pub const RIFF_TAG: [u8; 4] = *b"RIFF";

/// Chunks read before the first `head` can say otherwise
pub const INITIAL_CHUNK_BUDGET: u32 = 2;

/// Chunks following `head` in the palettes we write
pub const CANONICAL_CHUNKS_AFTER_HEAD: u32 = 1;

/// Pixel width of the companion image, every bitmap buffer is a multiple of it
pub const COMPANION_WIDTH: u32 = 4;
