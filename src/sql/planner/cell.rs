//! JSON documents describing a single cell of the cells view.

use super::{Expr, Select, SelectItem, TableRef};
use crate::{
    catalog::{defs::ColumnDescriptor, nulltype::NullTypeMap},
    core::{CompileError, ErrorKind},
};

/// Names of the relations holding validation messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageStore {
    /// One row per (table, row, column) with `value`, `severity` and `messages`.
    pub message_table: String,
    /// Maps a `severity` to its display `level`.
    pub level_table: String,
}

impl Default for MessageStore {
    fn default() -> Self {
        Self {
            message_table: "message_cell".to_string(),
            level_table: "levels".to_string(),
        }
    }
}

/// Alias of the message-store join for a column.
pub fn cell_alias(column: &str) -> String {
    format!("{} cell", column)
}

/// The document for a cell before messages are applied:
///
/// - null without nulltype: `{value: null, valid: false, text: <message text>}`
/// - null with nulltype: `{value: null, nulltype: <name>, text: <display text>}`
/// - otherwise: `{value: <value>, datatype: <datatype>}`
pub fn base_cell_json(
    column: &ColumnDescriptor,
    value: Expr,
    nulltypes: &NullTypeMap,
    cell_alias: &str,
) -> Result<Expr, CompileError> {
    let null_document = match &column.nulltype {
        None => Expr::json_object(vec![
            ("value".to_string(), Expr::Null),
            (
                "valid".to_string(),
                Expr::function("json", vec![Expr::literal("false")]),
            ),
            (
                "text".to_string(),
                Expr::qualified_column(cell_alias, "value"),
            ),
        ]),
        Some(nulltype) => {
            let text = nulltypes.get(nulltype).ok_or_else(|| {
                CompileError::new(
                    ErrorKind::UnknownDatatype,
                    format!(
                        "nulltype \"{}\" of column \"{}\".\"{}\" was not resolved",
                        nulltype, column.table, column.column
                    ),
                )
            })?;
            Expr::json_object(vec![
                ("value".to_string(), Expr::Null),
                ("nulltype".to_string(), Expr::literal(nulltype.as_str())),
                ("text".to_string(), Expr::literal(text)),
            ])
        }
    };

    let value_document = Expr::json_object(vec![
        ("value".to_string(), value.clone()),
        ("datatype".to_string(), Expr::literal(column.datatype.as_str())),
    ]);

    Ok(Expr::Case(
        vec![(Expr::IsNull(Box::new(value)), null_document)],
        Box::new(value_document),
    ))
}

/// Patch a cell document with the message level and messages recorded for
/// it. Keys of the patch replace keys of the document.
pub fn overlay_messages(document: Expr, cell_alias: &str, store: &MessageStore) -> Expr {
    let mut level = Select::new(
        vec![SelectItem::unnamed(Expr::qualified_column(
            store.level_table.as_str(),
            "level",
        ))],
        TableRef::new(store.level_table.as_str()),
    );
    level.selection = Some(Expr::equals(
        Expr::qualified_column(store.level_table.as_str(), "severity"),
        Expr::qualified_column(cell_alias, "severity"),
    ));

    let patch = Expr::json_object(vec![
        ("message_level".to_string(), Expr::Subquery(Box::new(level))),
        (
            "messages".to_string(),
            Expr::function("json", vec![Expr::qualified_column(cell_alias, "messages")]),
        ),
    ]);

    Expr::function("json_patch", vec![document, patch])
}
