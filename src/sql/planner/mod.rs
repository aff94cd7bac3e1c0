//! A small SQL tree for view definitions.
//!
//! Views are built as [`Statement`] trees and turned into text only through
//! the `Display` implementations below, so identifier quoting, literal
//! escaping and layout live in one place.

use std::fmt::{Display, Formatter, Result as FmtResult};

use enum_as_inner::EnumAsInner;

pub mod cell;
pub mod compiler;

/// A possibly qualified name, rendered as a quoted identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualifiedObjectName {
    pub names: Vec<String>,
}

impl QualifiedObjectName {
    #[allow(dead_code)]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            names: vec![name.into()],
        }
    }

    pub fn qualified(qualifier: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            names: vec![qualifier.into(), name.into()],
        }
    }
}

impl Display for QualifiedObjectName {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "{}",
            self.names
                .iter()
                .map(|name| quote_ident(name))
                .collect::<Vec<_>>()
                .join(".")
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BinaryOperator {
    Eq,
}

impl Display for BinaryOperator {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            BinaryOperator::Eq => write!(f, "="),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, EnumAsInner)]
pub enum Expr {
    Column(QualifiedObjectName),
    /// `*` or `"<relation>".*`
    Wildcard(Option<String>),
    /// Single-quoted text literal.
    Literal(String),
    Null,
    Cast(Box<Expr>, String),
    FunctionCall(String, Vec<Expr>),
    IsNull(Box<Expr>),
    BinaryOp(Box<Expr>, BinaryOperator, Box<Expr>),
    /// `CASE WHEN <cond> THEN <expr> ... ELSE <expr> END`
    Case(Vec<(Expr, Expr)>, Box<Expr>),
    Subquery(Box<Select>),
}

impl Expr {
    #[allow(dead_code)]
    pub fn column(name: impl Into<String>) -> Self {
        Expr::Column(QualifiedObjectName::new(name))
    }

    pub fn qualified_column(relation: impl Into<String>, name: impl Into<String>) -> Self {
        Expr::Column(QualifiedObjectName::qualified(relation, name))
    }

    pub fn literal(text: impl Into<String>) -> Self {
        Expr::Literal(text.into())
    }

    pub fn function(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::FunctionCall(name.into(), args)
    }

    pub fn equals(left: Expr, right: Expr) -> Self {
        Expr::BinaryOp(Box::new(left), BinaryOperator::Eq, Box::new(right))
    }

    /// `json_object('k1', v1, 'k2', v2, ...)`, keys in the given order.
    pub fn json_object(entries: Vec<(String, Expr)>) -> Self {
        let args = entries
            .into_iter()
            .flat_map(|(key, value)| [Expr::Literal(key), value])
            .collect();
        Expr::FunctionCall("json_object".to_string(), args)
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Expr::Column(name) => write!(f, "{}", name),
            Expr::Wildcard(None) => write!(f, "*"),
            Expr::Wildcard(Some(relation)) => write!(f, "{}.*", quote_ident(relation)),
            Expr::Literal(text) => write!(f, "{}", quote_literal(text)),
            Expr::Null => write!(f, "NULL"),
            Expr::Cast(expr, typ) => write!(f, "CAST({} AS {})", expr, typ),
            Expr::FunctionCall(name, args) => write!(
                f,
                "{}({})",
                name,
                args.iter()
                    .map(|arg| arg.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            Expr::IsNull(expr) => write!(f, "{} IS NULL", expr),
            Expr::BinaryOp(left, op, right) => write!(f, "{} {} {}", left, op, right),
            Expr::Case(whens, otherwise) => {
                write!(f, "CASE")?;
                for (condition, result) in whens {
                    write!(f, " WHEN {} THEN {}", condition, result)?;
                }
                write!(f, " ELSE {} END", otherwise)
            }
            Expr::Subquery(select) => {
                write!(f, "(")?;
                format_select(f, select, SelectLayout::Inline)?;
                write!(f, ")")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectItem {
    pub expr: Expr,
    pub alias: Option<String>,
}

impl SelectItem {
    pub fn unnamed(expr: Expr) -> Self {
        Self { expr, alias: None }
    }

    pub fn aliased(expr: Expr, alias: impl Into<String>) -> Self {
        Self {
            expr,
            alias: Some(alias.into()),
        }
    }
}

impl Display for SelectItem {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match &self.alias {
            Some(alias) => write!(f, "{} AS {}", self.expr, quote_ident(alias)),
            None => write!(f, "{}", self.expr),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    pub name: String,
    pub alias: Option<String>,
}

impl TableRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
        }
    }

    pub fn aliased(name: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: Some(alias.into()),
        }
    }
}

impl Display for TableRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", quote_ident(&self.name))?;
        if let Some(alias) = &self.alias {
            write!(f, " AS {}", quote_ident(alias))?;
        }
        Ok(())
    }
}

/// `LEFT JOIN <relation> ON <c1> AND <c2> ...`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Join {
    pub relation: TableRef,
    pub on: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Select {
    pub projection: Vec<SelectItem>,
    pub from: TableRef,
    pub joins: Vec<Join>,
    pub selection: Option<Expr>,
}

impl Select {
    pub fn new(projection: Vec<SelectItem>, from: TableRef) -> Self {
        Self {
            projection,
            from,
            joins: vec![],
            selection: None,
        }
    }
}

impl Display for Select {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        format_select(f, self, SelectLayout::Block)
    }
}

#[derive(Clone, Copy)]
enum SelectLayout {
    /// One clause per line, one projection item per line.
    Block,
    /// Everything on one line, used for subqueries.
    Inline,
}

fn format_select(f: &mut Formatter, select: &Select, layout: SelectLayout) -> FmtResult {
    let (item_sep, clause_sep, condition_sep) = match layout {
        SelectLayout::Block => (",\n  ", "\n", "\n  "),
        SelectLayout::Inline => (", ", " ", " "),
    };

    write!(
        f,
        "SELECT {}",
        select
            .projection
            .iter()
            .map(|item| item.to_string())
            .collect::<Vec<_>>()
            .join(item_sep)
    )?;
    write!(f, "{}FROM {}", clause_sep, select.from)?;
    for join in &select.joins {
        write!(f, "{}LEFT JOIN {}", clause_sep, join.relation)?;
        for (i, condition) in join.on.iter().enumerate() {
            let keyword = if i == 0 { "ON" } else { "AND" };
            write!(f, "{}{} {}", condition_sep, keyword, condition)?;
        }
    }
    if let Some(selection) = &select.selection {
        write!(f, "{}WHERE {}", clause_sep, selection)?;
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    Select(Select),
    UnionAll(Vec<Select>),
}

impl Display for Query {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Query::Select(select) => write!(f, "{}", select),
            Query::UnionAll(selects) => write!(
                f,
                "{}",
                selects
                    .iter()
                    .map(|select| select.to_string())
                    .collect::<Vec<_>>()
                    .join("\nUNION ALL\n")
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    DropViewIfExists(String),
    CreateView { name: String, query: Query },
}

impl Display for Statement {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Statement::DropViewIfExists(name) => {
                write!(f, "DROP VIEW IF EXISTS {};", quote_ident(name))
            }
            Statement::CreateView { name, query } => {
                write!(f, "CREATE VIEW {} AS\n{};", quote_ident(name), query)
            }
        }
    }
}

pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

pub fn quote_literal(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}
