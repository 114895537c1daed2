use clap::ValueEnum;
use prt::PaletteFormat;

use self::{build::Build, extract::Extract};

mod build;
mod extract;

pub enum CliRes {
    Ok,
    Err,
}

pub trait Cli {
    fn name(&self) -> &'static str;
    /// Each module parses the full argument list by itself.
    fn cli(&self) -> CliRes;
}

/// Palette file flavor as written on the command line.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum PaletteFormatArg {
    /// RIFF palette
    Pal,
    /// JASC text palette
    Text,
    /// Adobe color table
    #[default]
    Act,
}

impl From<PaletteFormatArg> for PaletteFormat {
    fn from(value: PaletteFormatArg) -> Self {
        match value {
            PaletteFormatArg::Pal => PaletteFormat::RiffPal,
            PaletteFormatArg::Text => PaletteFormat::JascPal,
            PaletteFormatArg::Act => PaletteFormat::Act,
        }
    }
}

/// Runs command-line options
pub fn cli() -> CliRes {
    let args: Vec<String> = std::env::args().collect();

    // Add new modules here.
    let modules: &[&dyn Cli] = &[&Extract, &Build];

    let help = || {
        println!(
            "\
op2art

Available modules:"
        );
        for module in modules {
            println!("{}", module.name());
        }
    };

    let Some(command) = args.get(1) else {
        help();
        return CliRes::Err;
    };

    for module in modules {
        if command == module.name() {
            return module.cli();
        }
    }

    // In case nothing fits then prints this again.
    help();

    CliRes::Err
}
