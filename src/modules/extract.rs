use std::{fs, path::Path};

use eyre::eyre;
use prt::{Archive, PaletteFormat};

use super::{
    metadata::{
        AnimationMetadata, AnimationsMetadata, BitmapMetadata, BitmapsMetadata,
        ANIMATIONS_FILE_NAME, BITMAPS_FILE_NAME,
    },
    BITMAPS_FOLDER, EXTRA_DATA_FILE_NAME, PALETTES_FOLDER,
};

/// Decodes `op2_art.prt` and `op2_art.bmp` into a folder of editable files.
pub fn extract(
    prt_path: &Path,
    bmp_path: &Path,
    output: &Path,
    palette_format: PaletteFormat,
) -> eyre::Result<()> {
    println!("Loading op2_art data...");
    let archive = Archive::open_from_files(prt_path, bmp_path)?;

    write_tree(&archive, output, palette_format)?;

    println!("Success!");

    Ok(())
}

pub fn write_tree(
    archive: &Archive,
    output: &Path,
    palette_format: PaletteFormat,
) -> eyre::Result<()> {
    let palette_path = output.join(PALETTES_FOLDER);
    let bitmap_path = output.join(BITMAPS_FOLDER);

    fs::create_dir_all(&palette_path)?;
    fs::create_dir_all(&bitmap_path)?;

    println!("Dumping palettes...");
    for (index, palette) in archive.palettes.iter().enumerate() {
        let path = palette_path.join(format!("{index}.{}", palette_format.extension()));

        palette.write_to_file(path, palette_format)?;
    }

    println!("Dumping bitmaps...");
    for (index, bitmap) in archive.bitmaps.iter().enumerate() {
        let Some(palette) = archive.bitmap_palette(index) else {
            return Err(eyre!(
                "bitmap {index} uses palette {} which does not exist",
                bitmap.palette_id
            ));
        };

        bitmap.write_bmp_to_file(bitmap_path.join(format!("{index}.bmp")), palette)?;
    }

    println!("Dumping bitmap metadata...");
    let bitmaps = BitmapsMetadata {
        num_palettes: archive.palettes.len(),
        bitmaps: archive.bitmaps.iter().map(BitmapMetadata::from).collect(),
    };
    fs::write(output.join(BITMAPS_FILE_NAME), toml::to_string(&bitmaps)?)?;

    println!("Dumping animation metadata...");
    let animations = AnimationsMetadata {
        num_optional_entries: archive.num_optional_entries,
        animations: archive
            .animations
            .iter()
            .map(AnimationMetadata::from)
            .collect(),
    };
    fs::write(output.join(ANIMATIONS_FILE_NAME), toml::to_string(&animations)?)?;

    println!("Dumping extra data...");
    fs::write(output.join(EXTRA_DATA_FILE_NAME), &archive.extra_data)?;

    log::debug!(
        "extracted {} palettes, {} bitmaps, {} animations into {}",
        archive.palettes.len(),
        archive.bitmaps.len(),
        archive.animations.len(),
        output.display()
    );

    Ok(())
}
