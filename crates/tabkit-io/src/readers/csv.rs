//! Delimited-text loader.
//!
//! Lines are split on the exact delimiter byte with quoting disabled, so a
//! field containing the delimiter splits into two fields. Every field is
//! trimmed once here; downstream comparisons see trimmed values.

use std::io::Read;

use tabkit_core::config::LoadOptions;
use tabkit_core::schema::{positional_name, DataType, Field, Schema};
use tabkit_core::table::Table;
use tabkit_core::types::Row;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::infer::{infer_types, parse_value};

pub struct CsvLoader {
    options: LoadOptions,
}

impl CsvLoader {
    pub fn new(options: LoadOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &LoadOptions {
        &self.options
    }

    /// Read every line of `reader` into a table. `location` is only used for
    /// error messages and logs.
    pub fn load<R: Read>(&self, reader: R, location: &str) -> Result<Table> {
        let delimiter = self.options.delimiter_byte()?;
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .delimiter(delimiter)
            .quoting(false)
            .flexible(true)
            .from_reader(reader);

        let mut width: Option<usize> = None;
        let mut records: Vec<Vec<String>> = Vec::new();
        for result in rdr.records() {
            let record = result?;
            // Whitespace-only lines count as blank.
            if record.len() == 1 && record[0].trim().is_empty() {
                continue;
            }
            let line = record.position().map(|p| p.line()).unwrap_or_default();
            let fields: Vec<String> = record.iter().map(|f| f.trim().to_string()).collect();

            match width {
                None => width = Some(fields.len()),
                Some(expected) if expected != fields.len() => {
                    return Err(Error::MalformedRow {
                        location: location.to_string(),
                        line,
                        expected,
                        found: fields.len(),
                    });
                }
                Some(_) => {}
            }
            records.push(fields);
        }

        let Some(width) = width else {
            return Err(Error::EmptyInput {
                location: location.to_string(),
            });
        };

        let names: Vec<String> = if self.options.header {
            records
                .remove(0)
                .into_iter()
                .enumerate()
                .map(|(i, name)| if name.is_empty() { positional_name(i) } else { name })
                .collect()
        } else {
            (0..width).map(positional_name).collect()
        };

        let types = if self.options.infer_schema {
            infer_types(width, &records)
        } else {
            vec![DataType::Utf8; width]
        };
        debug!(location, ?types, "column types");

        let schema = Schema::new(
            names
                .into_iter()
                .zip(&types)
                .map(|(name, dt)| Field::new(name, *dt, true))
                .collect(),
        );

        let rows: Vec<Row> = records
            .into_iter()
            .map(|rec| {
                Row::new(
                    rec.into_iter()
                        .zip(&types)
                        .map(|(raw, dt)| parse_value(raw, *dt))
                        .collect(),
                )
            })
            .collect();

        let table = Table::try_new(schema, rows)?;
        info!(
            location,
            rows = table.num_rows(),
            columns = table.num_columns(),
            header = self.options.header,
            infer_schema = self.options.infer_schema,
            "loaded table"
        );
        Ok(table)
    }
}
