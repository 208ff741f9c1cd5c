use clap::{Parser, ValueEnum};
use env_logger::Env;
use log::*;

use std::io::Write;
use std::path::PathBuf;

use crate::image::{info, merge, validate};
use crate::pack::pack;
use crate::unpack::unpack;

mod image;
mod pack;
mod unpack;

#[derive(Parser, Debug)]
enum Command {
    /// Encode a JSON parameter file into a flashable UF2 image
    #[command(arg_required_else_help = true)]
    Pack {
        /// Target device variant
        #[clap(short, long, value_enum)]
        device: Device,

        /// Input JSON parameter file
        input: PathBuf,

        /// Output UF2 file
        output: PathBuf,

        /// Base firmware UF2 to merge the user data into
        #[clap(short, long)]
        base: Option<PathBuf>,
    },
    /// Decode the parameters stored in a UF2 firmware image
    #[command(arg_required_else_help = true)]
    Unpack {
        /// Input UF2 file
        input: PathBuf,

        /// Output JSON file (stdout if omitted)
        output: Option<PathBuf>,
    },
    /// Merge multiple UF2 files into one re-addressed stream
    #[command(arg_required_else_help = true)]
    Merge {
        /// Input UF2 files
        #[clap(required = true)]
        inputs: Vec<PathBuf>,

        /// Output UF2 file
        #[clap(short, long)]
        output: PathBuf,

        /// Synthesize empty blocks so the output has no address gaps
        #[clap(short, long)]
        fill_gaps: bool,
    },
    /// Check the structure of a UF2 file
    #[command(arg_required_else_help = true)]
    Validate {
        /// Input UF2 file
        input: PathBuf,
    },
    /// Print block and address information about a UF2 file
    #[command(arg_required_else_help = true)]
    Info {
        /// Input UF2 file
        input: PathBuf,
    },
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum Device {
    Alchemist,
    FxWizard,
    WaveBard,
}

#[derive(Parser, Debug)]
#[clap(version, about = "Kastle 2 firmware image tool", long_about = None)]
#[command(arg_required_else_help = true)]
struct Cli {
    /// Set the logging verbosity
    #[clap(short, long, value_enum, global = true, default_value_t = LogLevel::Info)]
    verbose: LogLevel,

    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Copy, Clone, Debug, Default, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
            LogLevel::Off => LevelFilter::Off,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::from_env(Env::default())
        .filter_level(cli.verbose.into())
        .target(env_logger::Target::Stdout)
        .format(|buf, record| {
            let level = record.level();
            if level == Level::Info {
                writeln!(buf, "{}", record.args())
            } else {
                writeln!(buf, "{}: {}", record.level(), record.args())
            }
        })
        .init();

    let command = match cli.command {
        Some(command) => command,
        None => return Ok(()),
    };

    match command {
        Command::Pack {
            device,
            input,
            output,
            base,
        } => pack(device, &input, &output, base.as_deref()),
        Command::Unpack { input, output } => unpack(&input, output.as_deref()),
        Command::Merge {
            inputs,
            output,
            fill_gaps,
        } => merge(&inputs, &output, fill_gaps),
        Command::Validate { input } => validate(&input),
        Command::Info { input } => info(&input),
    }
}
