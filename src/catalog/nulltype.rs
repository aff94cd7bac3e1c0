use std::collections::HashMap;

use log::debug;

use super::defs::{DatatypeDescriptor, TableSchema};
use crate::{
    core::{CompileError, ErrorKind},
    sql::parser::{parse_condition, Condition},
};

/// Display text of every nulltype referenced by the catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NullTypeMap {
    display_texts: HashMap<String, String>,
}

impl NullTypeMap {
    pub fn get(&self, nulltype: &str) -> Option<&str> {
        self.display_texts.get(nulltype).map(String::as_str)
    }

    pub fn contains(&self, nulltype: &str) -> bool {
        self.display_texts.contains_key(nulltype)
    }

    pub fn len(&self) -> usize {
        self.display_texts.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.display_texts.is_empty()
    }
}

/// Resolve each nulltype used by a column against its datatype definition,
/// whose condition must have the form `equals("<text>")`.
pub fn resolve_nulltypes(
    tables: &[TableSchema],
    datatypes: &[DatatypeDescriptor],
) -> Result<NullTypeMap, CompileError> {
    let mut map = NullTypeMap::default();

    for column in tables.iter().flat_map(|table| table.columns.iter()) {
        let nulltype = match &column.nulltype {
            Some(nulltype) if !map.contains(nulltype) => nulltype,
            _ => continue,
        };
        let referenced_by = format!("\"{}\".\"{}\"", column.table, column.column);

        let mut candidates = datatypes.iter().filter(|d| &d.datatype == nulltype);
        let datatype = match (candidates.next(), candidates.next()) {
            (Some(datatype), None) => datatype,
            (None, _) => {
                return Err(CompileError::new(
                    ErrorKind::UnknownDatatype,
                    format!(
                        "nulltype \"{}\" of column {} has no datatype definition",
                        nulltype, referenced_by
                    ),
                ))
            }
            (Some(_), Some(_)) => {
                return Err(CompileError::new(
                    ErrorKind::MalformedCatalog,
                    format!(
                        "nulltype \"{}\" of column {} has more than one datatype definition",
                        nulltype, referenced_by
                    ),
                ))
            }
        };

        let Condition::Equals(text) = parse_condition(&datatype.condition).map_err(|e| {
            CompileError::new(
                e.kind,
                format!(
                    "{} (nulltype \"{}\" of column {})",
                    e.message, nulltype, referenced_by
                ),
            )
        })?;

        debug!("Resolved nulltype \"{}\" to {:?}", nulltype, text);
        map.display_texts.insert(nulltype.clone(), text);
    }

    Ok(map)
}
