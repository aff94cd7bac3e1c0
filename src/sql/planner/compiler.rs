use std::fmt::Display;

use log::debug;

use super::{
    cell::{base_cell_json, cell_alias, overlay_messages, MessageStore},
    Expr, Join, Query, Select, SelectItem, Statement, TableRef,
};
use crate::{
    catalog::{defs::TableSchema, nulltype::NullTypeMap},
    core::CompileError,
};

const ROW_NUMBER: &str = "row_number";

/// The four views built for every table, in emission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    /// Accepted rows plus conflicting rows.
    Union,
    /// Every column as text, overridden by message-store text.
    Text,
    /// Every row as a JSON object.
    Values,
    /// Every cell as a JSON document with its validation state.
    Cells,
}

impl ViewKind {
    pub const ALL: [ViewKind; 4] = [
        ViewKind::Union,
        ViewKind::Text,
        ViewKind::Values,
        ViewKind::Cells,
    ];

    pub fn view_name(&self, table: &str) -> String {
        format!("{}_{}", table, self)
    }
}

impl Display for ViewKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ViewKind::Union => write!(f, "union"),
            ViewKind::Text => write!(f, "text"),
            ViewKind::Values => write!(f, "values"),
            ViewKind::Cells => write!(f, "cells"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompiledView {
    pub name: String,
    pub table: String,
    pub kind: ViewKind,
    pub query: Query,
}

impl CompiledView {
    pub fn statements(&self) -> [Statement; 2] {
        [
            Statement::DropViewIfExists(self.name.clone()),
            Statement::CreateView {
                name: self.name.clone(),
                query: self.query.clone(),
            },
        ]
    }

    /// `DROP VIEW IF EXISTS ...; CREATE VIEW ... AS ...;`
    pub fn ddl_text(&self) -> String {
        self.statements()
            .iter()
            .map(|statement| statement.to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

pub struct ViewCompiler<'a> {
    nulltypes: &'a NullTypeMap,
    store: &'a MessageStore,
}

impl<'a> ViewCompiler<'a> {
    pub fn new(nulltypes: &'a NullTypeMap, store: &'a MessageStore) -> Self {
        Self { nulltypes, store }
    }

    /// Compile the union, text, values and cells views of a table, in that order.
    pub fn compile_table(&self, table: &TableSchema) -> Result<Vec<CompiledView>, CompileError> {
        ViewKind::ALL
            .iter()
            .map(|kind| {
                let query = match kind {
                    ViewKind::Union => self.union_query(table),
                    ViewKind::Text => self.text_query(table),
                    ViewKind::Values => self.values_query(table),
                    ViewKind::Cells => self.cells_query(table)?,
                };
                let view = CompiledView {
                    name: kind.view_name(&table.name),
                    table: table.name.clone(),
                    kind: *kind,
                    query,
                };
                debug!("Compiled view \"{}\"", view.name);
                Ok::<_, CompileError>(view)
            })
            .collect()
    }

    pub fn compile_all(&self, tables: &[TableSchema]) -> Result<Vec<CompiledView>, CompileError> {
        let mut views = vec![];
        for table in tables {
            views.extend(self.compile_table(table)?);
        }
        Ok(views)
    }

    fn union_query(&self, table: &TableSchema) -> Query {
        let select_all = |relation: String| {
            Select::new(
                vec![SelectItem::unnamed(Expr::Wildcard(None))],
                TableRef::new(relation),
            )
        };

        Query::UnionAll(vec![
            select_all(table.name.clone()),
            select_all(format!("{}_conflict", table.name)),
        ])
    }

    fn text_query(&self, table: &TableSchema) -> Query {
        let union = ViewKind::Union.view_name(&table.name);

        let mut projection = vec![SelectItem::unnamed(Expr::qualified_column(
            union.as_str(),
            ROW_NUMBER,
        ))];
        for column in &table.columns {
            let alias = cell_alias(&column.column);
            let text = Expr::function(
                "COALESCE",
                vec![
                    Expr::qualified_column(alias.as_str(), "value"),
                    Expr::Cast(
                        Box::new(Expr::qualified_column(union.as_str(), column.column.as_str())),
                        "TEXT".to_string(),
                    ),
                ],
            );
            projection.push(SelectItem::aliased(text, column.column.as_str()));
        }

        let mut select = Select::new(projection, TableRef::new(union.as_str()));
        select.joins = self.message_joins(table, &union);

        Query::Select(select)
    }

    fn values_query(&self, table: &TableSchema) -> Query {
        let union = ViewKind::Union.view_name(&table.name);

        let mut entries = vec![(
            "_row_number".to_string(),
            Expr::qualified_column(union.as_str(), ROW_NUMBER),
        )];
        entries.extend(table.columns.iter().map(|column| {
            (
                column.column.clone(),
                Expr::qualified_column(union.as_str(), column.column.as_str()),
            )
        }));

        Query::Select(Select::new(
            vec![
                SelectItem::unnamed(Expr::Wildcard(Some(union.clone()))),
                SelectItem::aliased(Expr::json_object(entries), "json_result"),
            ],
            TableRef::new(union),
        ))
    }

    fn cells_query(&self, table: &TableSchema) -> Result<Query, CompileError> {
        let union = ViewKind::Union.view_name(&table.name);

        let mut entries = vec![(
            ROW_NUMBER.to_string(),
            Expr::json_object(vec![
                (
                    "value".to_string(),
                    Expr::qualified_column(union.as_str(), ROW_NUMBER),
                ),
                ("datatype".to_string(), Expr::literal("integer")),
            ]),
        )];
        for column in &table.columns {
            let alias = cell_alias(&column.column);
            let value = Expr::qualified_column(union.as_str(), column.column.as_str());
            let document = base_cell_json(column, value, self.nulltypes, &alias)?;
            entries.push((
                column.column.clone(),
                overlay_messages(document, &alias, self.store),
            ));
        }

        let mut select = Select::new(
            vec![
                SelectItem::unnamed(Expr::Wildcard(Some(union.clone()))),
                SelectItem::aliased(Expr::json_object(entries), "json_result"),
            ],
            TableRef::new(union.as_str()),
        );
        select.joins = self.message_joins(table, &union);

        Ok(Query::Select(select))
    }

    /// One left join against the message store per column, matching the
    /// cell's row, table and column.
    fn message_joins(&self, table: &TableSchema, union: &str) -> Vec<Join> {
        table
            .columns
            .iter()
            .map(|column| {
                let alias = cell_alias(&column.column);
                Join {
                    relation: TableRef::aliased(self.store.message_table.as_str(), alias.as_str()),
                    on: vec![
                        Expr::equals(
                            Expr::qualified_column(union, ROW_NUMBER),
                            Expr::qualified_column(alias.as_str(), "row"),
                        ),
                        Expr::equals(
                            Expr::qualified_column(alias.as_str(), "table"),
                            Expr::literal(table.name.as_str()),
                        ),
                        Expr::equals(
                            Expr::qualified_column(alias.as_str(), "column"),
                            Expr::literal(column.column.as_str()),
                        ),
                    ],
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use sqlparser::{dialect::PostgreSqlDialect, parser::Parser};

    use super::*;
    use crate::catalog::{
        defs::{ColumnDescriptor, DatatypeDescriptor},
        nulltype::resolve_nulltypes,
    };

    fn scenario() -> (Vec<TableSchema>, NullTypeMap) {
        let columns = [("a", "integer", None), ("b", "text", Some("empty"))]
            .iter()
            .map(|(name, datatype, nulltype)| ColumnDescriptor {
                table: "T".to_string(),
                column: name.to_string(),
                datatype: datatype.to_string(),
                nulltype: nulltype.map(str::to_string),
            })
            .collect();
        let tables = vec![TableSchema {
            name: "T".to_string(),
            columns,
        }];
        let datatypes = vec![DatatypeDescriptor {
            datatype: "empty".to_string(),
            condition: "equals(\"\")".to_string(),
        }];
        let nulltypes = resolve_nulltypes(&tables, &datatypes).unwrap();
        (tables, nulltypes)
    }

    fn compile(kind: ViewKind) -> CompiledView {
        let (tables, nulltypes) = scenario();
        let store = MessageStore::default();
        ViewCompiler::new(&nulltypes, &store)
            .compile_table(&tables[0])
            .unwrap()
            .into_iter()
            .find(|view| view.kind == kind)
            .unwrap()
    }

    fn normalize(sql: &str) -> String {
        sql.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn views_in_order() {
        let (tables, nulltypes) = scenario();
        let store = MessageStore::default();
        let views = ViewCompiler::new(&nulltypes, &store)
            .compile_table(&tables[0])
            .unwrap();

        let names = views.iter().map(|v| v.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec!["T_union", "T_text", "T_values", "T_cells"]);
        assert!(views.iter().all(|v| v.table == "T"));
    }

    #[test]
    fn union_view() {
        let view = compile(ViewKind::Union);

        assert_eq!(
            normalize(&view.query.to_string()),
            "SELECT * FROM \"T\" UNION ALL SELECT * FROM \"T_conflict\""
        );
    }

    #[test]
    fn text_view_prefers_message_text() {
        let view = compile(ViewKind::Text);
        let Query::Select(select) = &view.query else {
            panic!("text view is a plain select");
        };

        assert_eq!(
            select.projection[0].to_string(),
            "\"T_union\".\"row_number\""
        );
        assert_eq!(
            select.projection[1].to_string(),
            "COALESCE(\"a cell\".\"value\", CAST(\"T_union\".\"a\" AS TEXT)) AS \"a\""
        );
        assert_eq!(select.joins.len(), 2);
        assert_eq!(
            normalize(&format!("{}", view.query)).matches("LEFT JOIN").count(),
            2
        );
        assert!(normalize(&view.query.to_string()).contains(
            "LEFT JOIN \"message_cell\" AS \"b cell\" \
             ON \"T_union\".\"row_number\" = \"b cell\".\"row\" \
             AND \"b cell\".\"table\" = 'T' \
             AND \"b cell\".\"column\" = 'b'"
        ));
    }

    #[test]
    fn values_view_keys() {
        let view = compile(ViewKind::Values);
        let Query::Select(select) = &view.query else {
            panic!("values view is a plain select");
        };

        let (_, args) = select.projection[1].expr.as_function_call().unwrap();
        let keys = args
            .iter()
            .step_by(2)
            .map(|key| key.as_literal().unwrap().as_str())
            .collect::<Vec<_>>();
        assert_eq!(keys, vec!["_row_number", "a", "b"]);
        assert_eq!(select.projection[1].alias.as_deref(), Some("json_result"));
        assert!(select.joins.is_empty());
    }

    #[test]
    fn cells_view_entries() {
        let view = compile(ViewKind::Cells);
        let Query::Select(select) = &view.query else {
            panic!("cells view is a plain select");
        };

        let (_, args) = select.projection[1].expr.as_function_call().unwrap();
        let keys = args
            .iter()
            .step_by(2)
            .map(|key| key.as_literal().unwrap().as_str())
            .collect::<Vec<_>>();
        assert_eq!(keys, vec!["row_number", "a", "b"]);

        assert_eq!(
            args[1].to_string(),
            "json_object('value', \"T_union\".\"row_number\", 'datatype', 'integer')"
        );

        let a = args[3].to_string();
        assert!(a.starts_with("json_patch(CASE WHEN \"T_union\".\"a\" IS NULL"));
        assert!(a.contains(
            "json_object('value', NULL, 'valid', json('false'), 'text', \"a cell\".\"value\")"
        ));
        assert!(a.contains("json_object('value', \"T_union\".\"a\", 'datatype', 'integer')"));

        let b = args[5].to_string();
        assert!(b.contains("json_object('value', NULL, 'nulltype', 'empty', 'text', '')"));
        assert!(!b.contains("'valid'"));
        assert!(b.contains("'messages', json(\"b cell\".\"messages\")"));

        assert_eq!(select.joins.len(), 2);
    }

    #[test]
    fn quoted_names_are_escaped() {
        let tables = vec![TableSchema {
            name: "it's".to_string(),
            columns: vec![ColumnDescriptor {
                table: "it's".to_string(),
                column: "say \"hi\"".to_string(),
                datatype: "text".to_string(),
                nulltype: None,
            }],
        }];
        let nulltypes = NullTypeMap::default();
        let store = MessageStore::default();

        let views = ViewCompiler::new(&nulltypes, &store)
            .compile_all(&tables)
            .unwrap();
        let sql = views
            .iter()
            .map(|view| view.ddl_text())
            .collect::<Vec<_>>()
            .join("\n");

        assert!(sql.contains("\"say \"\"hi\"\" cell\".\"table\" = 'it''s'"));
        assert!(sql.contains("CREATE VIEW \"it's_cells\" AS"));
    }

    #[test]
    fn ddl_is_valid_sql() {
        let (tables, nulltypes) = scenario();
        let store = MessageStore::default();
        let views = ViewCompiler::new(&nulltypes, &store)
            .compile_all(&tables)
            .unwrap();

        for view in &views {
            let statements = Parser::parse_sql(&PostgreSqlDialect {}, &view.ddl_text()).unwrap();
            assert_eq!(statements.len(), 2, "{}", view.name);
        }
    }
}
