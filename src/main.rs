/*
 *  main.rs
 *
 *  Arcade - hot-swappable game host
 *
 *  Command line entry point
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

#[cfg(not(feature = "plugin-system"))]
compile_error!("Arcade requires the 'plugin-system' feature to load modules. Use --features plugin-system");

use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use anyhow::Context;
use clap::{error::ErrorKind, value_parser, Arg, Command};
use env_logger::Env;
use log::{error, info};

use arcade::config;
use arcade::constants::EXIT_FAILURE;
use arcade::core::Orchestrator;
use arcade::module::{ModuleOpener, NativeOpener};

include!(concat!(env!("OUT_DIR"), "/build_info.rs"));

fn cli() -> Command {
    Command::new(env!("CARGO_PKG_NAME")) // Use Cargo.toml name
        .about(format!("{} (v.{} built {})",
            env!("CARGO_PKG_DESCRIPTION"), env!("CARGO_PKG_VERSION"), BUILD_DATE))
        .disable_version_flag(true)
        .arg(Arg::new("display")
        .value_name("DISPLAY_MODULE")
        .value_parser(value_parser!(PathBuf))
        .help("Display module to start with, e.g. ./lib/arcade_ncurses.so")
        .required(true))
}

fn main() {
    let matches = match cli().try_get_matches() {
        Ok(matches) => matches,
        Err(e) => {
            // help is the only successful early exit
            let code = if e.kind() == ErrorKind::DisplayHelp { 0 } else { EXIT_FAILURE };
            let _ = e.print();
            process::exit(code);
        }
    };

    let Some(display) = matches.get_one::<PathBuf>("display") else {
        process::exit(EXIT_FAILURE);
    };

    if let Err(e) = run(display) {
        error!("{:#}", e);
        eprintln!("arcade: {:#}", e);
        process::exit(EXIT_FAILURE);
    }
}

fn run(display: &Path) -> anyhow::Result<()> {
    let config = config::load().context("loading configuration")?;

    env_logger::Builder::from_env(Env::default().default_filter_or(config.log_level()))
        .format_timestamp_secs()
        .init();

    info!("{} v.{} built {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"), BUILD_DATE);
    info!("Modules from {}", config.library_dir().display());

    let opener: Arc<dyn ModuleOpener> = Arc::new(NativeOpener);
    let mut host = Orchestrator::new(opener, &config);
    host.start(display)?;
    host.run();

    info!("Bye after {} ticks", host.ticks());
    Ok(())
}
