use std::io::Read;

use csv::{ReaderBuilder, StringRecord};
use log::{debug, info};

use self::defs::{ColumnDescriptor, DatatypeDescriptor, TableSchema};
use crate::core::{CompileError, ErrorKind};

pub mod defs;
pub mod nulltype;

/// Names the generated views already use for the row number.
pub const RESERVED_COLUMNS: [&str; 2] = ["row_number", "_row_number"];

/// In-memory view of the `column` and `datatype` relations.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub tables: Vec<TableSchema>,
    pub datatypes: Vec<DatatypeDescriptor>,
}

impl Catalog {
    /// Load both relations. Tables keep the order in which they first appear
    /// in the column relation, and columns keep their row order.
    pub fn load<C: Read, D: Read>(
        column_source: C,
        datatype_source: D,
        delimiter: u8,
    ) -> Result<Self, CompileError> {
        let mut catalog = Self::default();

        for column in read_columns(column_source, delimiter)? {
            catalog.add_column(column)?;
        }
        catalog.datatypes = read_datatypes(datatype_source, delimiter)?;

        info!(
            "Loaded catalog: {} tables, {} datatypes",
            catalog.tables.len(),
            catalog.datatypes.len()
        );

        Ok(catalog)
    }

    pub fn add_column(&mut self, column: ColumnDescriptor) -> Result<(), CompileError> {
        if RESERVED_COLUMNS.contains(&column.column.as_str()) {
            return Err(CompileError::new(
                ErrorKind::MalformedCatalog,
                format!(
                    "column name \"{}\" of table \"{}\" is reserved",
                    column.column, column.table
                ),
            ));
        }

        match self.tables.iter_mut().find(|t| t.name == column.table) {
            Some(table) => {
                if table.find_column(&column.column).is_some() {
                    return Err(CompileError::new(
                        ErrorKind::MalformedCatalog,
                        format!(
                            "column \"{}\" is defined twice for table \"{}\"",
                            column.column, column.table
                        ),
                    ));
                }
                table.columns.push(column);
            }
            None => {
                debug!("Found table \"{}\"", column.table);
                self.tables.push(TableSchema {
                    name: column.table.clone(),
                    columns: vec![column],
                });
            }
        }

        Ok(())
    }

    pub fn list_tables(&self) -> Vec<String> {
        self.tables.iter().map(|table| table.name.clone()).collect()
    }
}

/// A relation's records together with the positions of its required fields.
struct Relation {
    name: &'static str,
    indices: Vec<usize>,
    records: Vec<(u64, StringRecord)>,
}

impl Relation {
    fn read<R: Read>(
        name: &'static str,
        source: R,
        delimiter: u8,
        required: &[&str],
    ) -> Result<Self, CompileError> {
        let mut reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .quoting(false)
            .from_reader(source);

        let headers = reader.headers().map_err(|e| malformed(name, e))?.clone();
        let indices = required
            .iter()
            .map(|field| {
                headers.iter().position(|h| h == *field).ok_or_else(|| {
                    CompileError::new(
                        ErrorKind::MalformedCatalog,
                        format!("{} relation is missing required field \"{}\"", name, field),
                    )
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let records = reader
            .records()
            .map(|record| {
                let record = record.map_err(|e| malformed(name, e))?;
                let line = record.position().map_or(0, |p| p.line());
                Ok((line, record))
            })
            .collect::<Result<Vec<_>, CompileError>>()?;

        Ok(Self {
            name,
            indices,
            records,
        })
    }

    /// Field values in the order they were required.
    fn fields<'a>(&self, record: &'a StringRecord) -> Vec<&'a str> {
        self.indices
            .iter()
            .map(|index| record.get(*index).unwrap_or_default())
            .collect()
    }
}

fn malformed(relation: &str, e: csv::Error) -> CompileError {
    CompileError::new(
        ErrorKind::MalformedCatalog,
        format!("cannot read {} relation: {}", relation, e),
    )
}

fn read_columns<R: Read>(source: R, delimiter: u8) -> Result<Vec<ColumnDescriptor>, CompileError> {
    let relation = Relation::read(
        "column",
        source,
        delimiter,
        &["table", "column", "datatype", "nulltype"],
    )?;

    relation
        .records
        .iter()
        .map(|(line, record)| {
            let fields = relation.fields(record);
            let (table, column, datatype, nulltype) = (fields[0], fields[1], fields[2], fields[3]);

            if table.is_empty() || column.is_empty() {
                return Err(CompileError::new(
                    ErrorKind::MalformedCatalog,
                    format!(
                        "{} relation, line {}: \"table\" and \"column\" must not be empty",
                        relation.name, line
                    ),
                ));
            }

            let nulltype = nulltype.trim();
            Ok(ColumnDescriptor {
                table: table.to_string(),
                column: column.to_string(),
                datatype: datatype.to_string(),
                nulltype: (!nulltype.is_empty()).then(|| nulltype.to_string()),
            })
        })
        .collect()
}

fn read_datatypes<R: Read>(
    source: R,
    delimiter: u8,
) -> Result<Vec<DatatypeDescriptor>, CompileError> {
    let relation = Relation::read("datatype", source, delimiter, &["datatype", "condition"])?;

    Ok(relation
        .records
        .iter()
        .map(|(_, record)| {
            let fields = relation.fields(record);
            DatatypeDescriptor {
                datatype: fields[0].to_string(),
                condition: fields[1].to_string(),
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLUMNS: &str = "table\tcolumn\tdescription\tdatatype\tnulltype\n\
        penguin\tstudy_name\tStudy\tword\t\n\
        penguin\tsample_number\tSample\tinteger\t\n\
        island\tname\tIsland\tlabel\t\n\
        penguin\tcomments\tComments\ttext\tempty\n";

    const DATATYPES: &str = "datatype\tparent\tcondition\n\
        empty\ttext\tequals(\"\")\n\
        word\ttext\texclude(/\\W/)\n";

    #[test]
    fn groups_columns_by_table_in_order() {
        let catalog = Catalog::load(COLUMNS.as_bytes(), DATATYPES.as_bytes(), b'\t').unwrap();

        assert_eq!(catalog.list_tables(), vec!["penguin", "island"]);
        let penguin = &catalog.tables[0];
        let names = penguin
            .columns
            .iter()
            .map(|c| c.column.as_str())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["study_name", "sample_number", "comments"]);
        assert_eq!(penguin.columns[0].nulltype, None);
        assert_eq!(penguin.columns[2].nulltype.as_deref(), Some("empty"));
        assert_eq!(penguin.columns[1].datatype, "integer");

        assert_eq!(catalog.datatypes.len(), 2);
        assert_eq!(catalog.datatypes[0].condition, "equals(\"\")");
    }

    #[test]
    fn whitespace_nulltype_is_absent() {
        let columns = "table\tcolumn\tdatatype\tnulltype\nt\ta\ttext\t  \n";
        let catalog = Catalog::load(columns.as_bytes(), DATATYPES.as_bytes(), b'\t').unwrap();

        assert_eq!(catalog.tables[0].columns[0].nulltype, None);
    }

    #[test]
    fn missing_required_field() {
        let columns = "table\tcolumn\tdatatype\nt\ta\ttext\n";
        let err = Catalog::load(columns.as_bytes(), DATATYPES.as_bytes(), b'\t').unwrap_err();

        assert_eq!(err.kind, ErrorKind::MalformedCatalog);
        assert!(err.message.contains("nulltype"));

        let datatypes = "datatype\tparent\nempty\ttext\n";
        let err = Catalog::load(COLUMNS.as_bytes(), datatypes.as_bytes(), b'\t').unwrap_err();

        assert_eq!(err.kind, ErrorKind::MalformedCatalog);
        assert!(err.message.contains("condition"));
    }

    #[test]
    fn ragged_record() {
        let columns = "table\tcolumn\tdatatype\tnulltype\nt\ta\ttext\n";
        let err = Catalog::load(columns.as_bytes(), DATATYPES.as_bytes(), b'\t').unwrap_err();

        assert_eq!(err.kind, ErrorKind::MalformedCatalog);
    }

    #[test]
    fn empty_table_name() {
        let columns = "table\tcolumn\tdatatype\tnulltype\n\ta\ttext\t\n";
        let err = Catalog::load(columns.as_bytes(), DATATYPES.as_bytes(), b'\t').unwrap_err();

        assert_eq!(err.kind, ErrorKind::MalformedCatalog);
        assert!(err.message.contains("line 2"));
    }

    #[test]
    fn duplicate_column() {
        let columns = "table\tcolumn\tdatatype\tnulltype\nt\ta\ttext\t\nt\ta\tinteger\t\n";
        let err = Catalog::load(columns.as_bytes(), DATATYPES.as_bytes(), b'\t').unwrap_err();

        assert_eq!(err.kind, ErrorKind::MalformedCatalog);
        assert!(err.message.contains("defined twice"));
    }

    #[test]
    fn reserved_column_names() {
        for name in RESERVED_COLUMNS {
            let columns = format!("table\tcolumn\tdatatype\tnulltype\nt\ta\ttext\t\nt\t{}\ttext\t\n", name);
            let err = Catalog::load(columns.as_bytes(), DATATYPES.as_bytes(), b'\t').unwrap_err();

            assert_eq!(err.kind, ErrorKind::MalformedCatalog);
            assert!(err.message.contains("reserved"), "{}", name);
        }
    }

    #[test]
    fn custom_delimiter() {
        let columns = "table,column,datatype,nulltype\nt,a,text,empty\n";
        let datatypes = "datatype,condition\nempty,equals(\"\")\n";
        let catalog = Catalog::load(columns.as_bytes(), datatypes.as_bytes(), b',').unwrap();

        assert_eq!(catalog.tables[0].columns[0].nulltype.as_deref(), Some("empty"));
    }
}
