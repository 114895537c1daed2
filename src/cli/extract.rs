use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::modules::extract;

use super::*;

#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct ExtractCli {
    // This is just dummy command because we are already in the command
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Dumps palettes, bitmaps and animation metadata into a folder
    Extract {
        /// Path to op2_art.prt
        #[arg(short, long)]
        prt: PathBuf,
        /// Path to op2_art.bmp
        #[arg(short, long)]
        bmp: PathBuf,
        /// Output folder
        #[arg(short, long)]
        output: PathBuf,
        #[arg(long, value_enum, default_value_t)]
        palette_format: PaletteFormatArg,
    },
}

pub struct Extract;

impl Cli for Extract {
    fn name(&self) -> &'static str {
        "extract"
    }

    fn cli(&self) -> CliRes {
        let cli = ExtractCli::parse();

        let Commands::Extract {
            prt,
            bmp,
            output,
            palette_format,
        } = cli.command;

        match extract(&prt, &bmp, &output, palette_format.into()) {
            Ok(_) => CliRes::Ok,
            Err(err) => {
                println!("{}", err);
                CliRes::Err
            }
        }
    }
}
