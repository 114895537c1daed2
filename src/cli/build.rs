use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::modules::build;

use super::*;

#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct BuildCli {
    // This is just dummy command because we are already in the command
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Packs an extracted folder back into op2_art.prt and op2_art.bmp
    Build {
        /// Folder made by `extract`
        #[arg(short, long)]
        input: PathBuf,
        /// Output op2_art.prt
        #[arg(short, long)]
        prt: PathBuf,
        /// Output op2_art.bmp
        #[arg(short, long)]
        bmp: PathBuf,
        #[arg(long, value_enum, default_value_t)]
        palette_format: PaletteFormatArg,
        /// Uses the palette embedded in every bitmap instead of the palette folder
        #[arg(long)]
        palettes_from_bitmaps: bool,
    },
}

pub struct Build;

impl Cli for Build {
    fn name(&self) -> &'static str {
        "build"
    }

    fn cli(&self) -> CliRes {
        let cli = BuildCli::parse();

        let Commands::Build {
            input,
            prt,
            bmp,
            palette_format,
            palettes_from_bitmaps,
        } = cli.command;

        match build(
            &input,
            &prt,
            &bmp,
            palette_format.into(),
            palettes_from_bitmaps,
        ) {
            Ok(_) => CliRes::Ok,
            Err(err) => {
                println!("{}", err);
                CliRes::Err
            }
        }
    }
}
