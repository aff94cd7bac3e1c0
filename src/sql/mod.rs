pub mod parser;
pub mod planner;
pub mod runtime;

use log::info;

use self::planner::{
    cell::MessageStore,
    compiler::{CompiledView, ViewCompiler},
};
use crate::{
    catalog::{nulltype::resolve_nulltypes, Catalog},
    core::CompileError,
};

/// Resolve nulltypes and compile every view of the catalog. Nothing is
/// returned unless every table compiles.
pub fn compile_catalog(
    catalog: &Catalog,
    store: &MessageStore,
) -> Result<Vec<CompiledView>, CompileError> {
    let nulltypes = resolve_nulltypes(&catalog.tables, &catalog.datatypes)?;
    info!("Resolved {} nulltypes", nulltypes.len());

    ViewCompiler::new(&nulltypes, store).compile_all(&catalog.tables)
}
