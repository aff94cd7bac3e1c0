use std::io;

use clap::Parser;
use cli::{CliApp, Config};
use log::error;
use util::SimpleLogger;

mod catalog;
mod cli;
mod core;
mod sql;
mod util;

static LOGGER: SimpleLogger = SimpleLogger;

pub fn main() {
    let config = Config::parse();

    log::set_logger(&LOGGER)
        .map(|()| log::set_max_level(config.log_level()))
        .expect("logger is only installed once");

    let stdout = io::stdout();
    let mut app = CliApp::new(config, stdout.lock());
    if let Err(e) = app.run() {
        error!("{}", e);
        std::process::exit(1);
    }
}
