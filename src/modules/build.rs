use std::{fs, path::Path};

use eyre::eyre;
use prt::{Archive, Bitmap, Palette, PaletteFormat};

use super::{
    metadata::{AnimationsMetadata, BitmapsMetadata, ANIMATIONS_FILE_NAME, BITMAPS_FILE_NAME},
    BITMAPS_FOLDER, EXTRA_DATA_FILE_NAME, PALETTES_FOLDER,
};

/// Recompiles `op2_art.prt` and `op2_art.bmp` from a folder made by [`super::extract`].
pub fn build(
    input: &Path,
    prt_path: &Path,
    bmp_path: &Path,
    palette_format: PaletteFormat,
    palettes_from_bitmaps: bool,
) -> eyre::Result<()> {
    let archive = read_tree(input, palette_format, palettes_from_bitmaps)?;

    println!("Writing op2_art data...");
    archive.write_to_files(prt_path, bmp_path)?;

    println!("Success!");

    Ok(())
}

/// With `palettes_from_bitmaps`, every bitmap brings its own palette and the
/// palette files are ignored.
pub fn read_tree(
    input: &Path,
    palette_format: PaletteFormat,
    palettes_from_bitmaps: bool,
) -> eyre::Result<Archive> {
    let palette_path = input.join(PALETTES_FOLDER);
    let bitmap_path = input.join(BITMAPS_FOLDER);

    let mut archive = Archive::new();

    println!("Loading bitmaps...");
    let bitmaps_metadata: BitmapsMetadata =
        toml::from_str(&fs::read_to_string(input.join(BITMAPS_FILE_NAME))?)?;

    let mut embedded_palettes: Vec<Palette> = vec![];

    for (index, metadata) in bitmaps_metadata.bitmaps.iter().enumerate() {
        let path = bitmap_path.join(format!("{index}.bmp"));

        let (mut bitmap, palette) = Bitmap::open_bmp_from_file(&path)
            .map_err(|err| eyre!("cannot load {}: {err}", path.display()))?;

        bitmap.image_type = metadata.image_type;
        bitmap.palette_id = if palettes_from_bitmaps {
            i16::try_from(index).map_err(|_| eyre!("too many bitmaps for one palette each"))?
        } else {
            metadata.palette
        };

        archive.bitmaps.push(bitmap);
        embedded_palettes.push(palette);
    }

    if palettes_from_bitmaps {
        archive.palettes = embedded_palettes;
    } else {
        println!("Loading palettes...");

        for index in 0..bitmaps_metadata.num_palettes {
            let path = palette_path.join(format!("{index}.{}", palette_format.extension()));

            let palette = Palette::open_from_file(&path, palette_format)
                .map_err(|err| eyre!("cannot load {}: {err}", path.display()))?;

            archive.palettes.push(palette);
        }
    }

    println!("Loading animation metadata...");
    let animations_metadata: AnimationsMetadata =
        toml::from_str(&fs::read_to_string(input.join(ANIMATIONS_FILE_NAME))?)?;

    archive.num_optional_entries = animations_metadata.num_optional_entries;
    archive.animations = animations_metadata
        .animations
        .into_iter()
        .enumerate()
        .map(|(index, animation)| animation.into_animation(index))
        .collect::<Result<_, _>>()?;

    println!("Loading extra data...");
    archive.extra_data = fs::read(input.join(EXTRA_DATA_FILE_NAME))?;

    log::debug!(
        "read {} palettes, {} bitmaps, {} animations from {}",
        archive.palettes.len(),
        archive.bitmaps.len(),
        archive.animations.len(),
        input.display()
    );

    Ok(archive)
}
