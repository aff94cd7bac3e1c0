use std::io::Write;

use log::info;

use super::planner::compiler::{CompiledView, ViewKind};
use crate::core::CompileError;

/// Writes compiled views as `DROP VIEW IF EXISTS` / `CREATE VIEW` pairs.
pub struct DDLEmitter<W: Write> {
    output: W,
}

impl<W: Write> DDLEmitter<W> {
    pub fn new(output: W) -> Self {
        Self { output }
    }

    /// Emit views table by table, in the order tables first appear, and
    /// union, text, values, cells within a table. Returns the number of
    /// views written.
    pub fn emit(&mut self, views: &[CompiledView]) -> Result<usize, CompileError> {
        let mut tables: Vec<&str> = vec![];
        for view in views {
            if !tables.contains(&view.table.as_str()) {
                tables.push(&view.table);
            }
        }

        let mut ordered = views.iter().collect::<Vec<_>>();
        ordered.sort_by_key(|view| {
            (
                tables.iter().position(|table| *table == view.table),
                ViewKind::ALL.iter().position(|kind| *kind == view.kind),
            )
        });

        for view in &ordered {
            writeln!(self.output, "{}\n", view.ddl_text())?;
        }
        self.output.flush()?;

        info!(
            "Emitted {} views for {} tables",
            ordered.len(),
            tables.len()
        );

        Ok(ordered.len())
    }

    #[allow(dead_code)]
    pub fn into_inner(self) -> W {
        self.output
    }
}
