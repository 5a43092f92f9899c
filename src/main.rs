//! qmkjson - convert QMK keymap.c files into keymap.json documents
//!
//! Converts a single keymap, converts every keymap of a QMK tree in parallel,
//! and inspects the keyboards, layouts and keymaps the tree declares.

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use qmkjson::cli::{
    C2JsonArgs, CliResult, CreateAllKeymapsArgs, GlobalArgs, ListKeyboardsArgs, ListKeymapsArgs,
    ListLayoutsArgs, LocateInfoJsonArgs,
};
use qmkjson::config::Config;

/// Convert QMK keymap.c files into keymap.json documents
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a keymap.json from a keymap.c file
    C2json(C2JsonArgs),
    /// Generate keymap.json files for all keyboards
    CreateAllKeymaps(CreateAllKeymapsArgs),
    /// List keyboards in the QMK tree
    ListKeyboards(ListKeyboardsArgs),
    /// List layout variants of a keyboard
    ListLayouts(ListLayoutsArgs),
    /// List keymaps of a keyboard
    ListKeymaps(ListKeymapsArgs),
    /// Print the most specific info.json of a keyboard
    LocateInfoJson(LocateInfoJsonArgs),
}

impl Command {
    fn execute(&self, config: &Config, global: &GlobalArgs) -> CliResult<()> {
        match self {
            Self::C2json(args) => args.execute(config, global.quiet),
            Self::CreateAllKeymaps(args) => args.execute(config),
            Self::ListKeyboards(args) => args.execute(config),
            Self::ListLayouts(args) => args.execute(config),
            Self::ListKeymaps(args) => args.execute(config),
            Self::LocateInfoJson(args) => args.execute(config),
        }
    }
}

fn init_tracing(filter: &str) {
    // Logs go to stderr so stdout carries only command output
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.global.log_filter());

    let result = cli
        .global
        .resolve_config()
        .and_then(|config| cli.command.execute(&config, &cli.global));

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(e.exit_code().code());
    }
}
