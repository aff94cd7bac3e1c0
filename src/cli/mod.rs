use std::{
    fs::File,
    io::Write,
    path::{Path, PathBuf},
};

use clap::Parser;
use log::{info, LevelFilter};

use crate::{
    catalog::Catalog,
    core::{CompileError, ErrorKind},
    sql::{compile_catalog, planner::cell::MessageStore, runtime::DDLEmitter},
};

/// viewgen - compile a schema catalog into union, text, values and cells views
#[derive(Parser, Debug, Clone)]
#[command(name = "viewgen")]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Path to the column relation
    #[arg(long, default_value = "src/schema/column.tsv")]
    pub column: PathBuf,

    /// Path to the datatype relation
    #[arg(long, default_value = "src/schema/datatype.tsv")]
    pub datatype: PathBuf,

    /// Field delimiter of both relations, a single ASCII character
    #[arg(long, default_value = "\t", value_parser = parse_delimiter)]
    pub delimiter: u8,

    /// Relation holding one row of messages per cell
    #[arg(long, default_value = "message_cell")]
    pub message_table: String,

    /// Relation mapping message severities to levels
    #[arg(long, default_value = "levels")]
    pub level_table: String,

    /// Log debug output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    pub fn log_level(&self) -> LevelFilter {
        if self.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        }
    }

    pub fn message_store(&self) -> MessageStore {
        MessageStore {
            message_table: self.message_table.clone(),
            level_table: self.level_table.clone(),
        }
    }
}

pub struct CliApp<O: Write> {
    config: Config,

    output: O,
}

impl<O: Write> CliApp<O> {
    pub fn new(config: Config, output: O) -> Self {
        Self { config, output }
    }

    /// Load the catalog, compile every view and write the DDL. Nothing is
    /// written if loading or compiling fails.
    pub fn run(&mut self) -> Result<(), CompileError> {
        let column_source = open(&self.config.column)?;
        let datatype_source = open(&self.config.datatype)?;

        let catalog = Catalog::load(column_source, datatype_source, self.config.delimiter)?;
        info!("Tables: {}", catalog.list_tables().join(", "));

        let views = compile_catalog(&catalog, &self.config.message_store())?;
        DDLEmitter::new(&mut self.output).emit(&views)?;

        Ok(())
    }
}

fn parse_delimiter(value: &str) -> Result<u8, String> {
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii() => Ok(c as u8),
        _ => Err(format!("expected a single ASCII character, got {:?}", value)),
    }
}

fn open(path: &Path) -> Result<File, CompileError> {
    File::open(path).map_err(|e| {
        CompileError::new(
            ErrorKind::IoError,
            format!("cannot open {}: {}", path.display(), e),
        )
    })
}
