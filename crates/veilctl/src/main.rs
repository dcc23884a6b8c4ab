use anyhow::Result;
use clap::{Arg, Command};
use std::str::FromStr;
use tracing::{subscriber::set_global_default, Level};

mod commands;
mod config;

fn main() -> Result<()> {
    let matches = Command::new("veilctl")
        .version("0.1.0")
        .about("Masks table rows with configurable transformers")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .takes_value(true)
                .default_value("./veil.toml")
                .help("Path to the config file to use"),
        )
        .arg(
            Arg::new("verbosity")
                .short('v')
                .long("verbosity")
                .takes_value(true)
                .default_value("INFO")
                .help("Sets the level of verbosity"),
        )
        .subcommand_required(true)
        .subcommand(Command::new("validate").about("Validates the configured transformers"))
        .subcommand(
            Command::new("mask")
                .about("Reads COPY text rows from stdin and writes masked rows to stdout"),
        )
        .subcommand(
            Command::new("inspect")
                .about("Lists the available transformers")
                .arg(
                    Arg::new("transformer")
                        .help("Print a config stanza for this transformer instead"),
                ),
        )
        .get_matches();

    let tracing_level = Level::from_str(
        matches
            .value_of("verbosity")
            .expect("Missing value for 'verbosity' argument"),
    )?;

    let collector = tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(std::io::stderr)
        .finish();

    set_global_default(collector)?;

    match matches.subcommand() {
        Some(("validate", _)) => commands::validate::execute(&matches),
        Some(("mask", _)) => commands::mask::execute(&matches),
        Some(("inspect", sub_matches)) => commands::inspect::execute(sub_matches),
        _ => unreachable!("a subcommand is required"),
    }
}
