//! Streaming row parser.

use super::{ColumnKind, ColumnSchema, RawRow};
use crate::models::{FieldValue, ParsedRow};
use crate::{Error, Result};
use std::collections::HashMap;
use std::io::Read;

/// Lazily parses delimited input against a [`ColumnSchema`].
///
/// The header is read and validated by [`RowParser::new`]. Iteration yields one
/// [`ParsedRow`] per data line in input order. The first error ends iteration.
pub struct RowParser<'s, R: Read> {
    schema: &'s ColumnSchema,
    reader: csv::Reader<R>,
    headers: Vec<String>,
    header_index: HashMap<String, usize>,
    /// Descriptor index per header position; `None` for ignored headers.
    bindings: Vec<Option<usize>>,
    record: csv::StringRecord,
    rows_read: usize,
    done: bool,
}

impl<'s, R: Read> RowParser<'s, R> {
    /// Reads the header line and binds each header to its descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SchemaValidation`] at line 1 if a required column is
    /// missing, or [`Error::OperationFailed`] if the header cannot be read.
    pub fn new(schema: &'s ColumnSchema, reader: R, delimiter: u8) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| Error::operation("read_import_header", e))?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').to_string())
            .collect();

        let header_refs: Vec<&str> = headers.iter().map(String::as_str).collect();
        let missing = schema.missing_required(&header_refs);
        if !missing.is_empty() {
            return Err(Error::SchemaValidation {
                line: 1,
                message: format!("missing required column(s): {}", missing.join(", ")),
            });
        }

        let bindings = headers
            .iter()
            .map(|h| {
                schema
                    .resolve(h)
                    .and_then(|d| schema.columns().iter().position(|c| std::ptr::eq(c, d)))
            })
            .collect();
        let header_index = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.clone(), i))
            .collect();

        Ok(Self {
            schema,
            reader,
            headers,
            header_index,
            bindings,
            record: csv::StringRecord::new(),
            rows_read: 0,
            done: false,
        })
    }

    /// Header names in file order.
    #[must_use]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Number of data lines parsed so far.
    #[must_use]
    pub const fn rows_read(&self) -> usize {
        self.rows_read
    }

    fn parse_record(&self, line: usize) -> Result<ParsedRow> {
        let raw = RawRow::new(&self.header_index, &self.record);
        let mut row = ParsedRow::new();
        let invalid = |message: String| Error::SchemaValidation { line, message };

        for (position, binding) in self.bindings.iter().enumerate() {
            let Some(descriptor) = binding.map(|i| &self.schema.columns()[i]) else {
                continue;
            };
            let value = self.record.get(position).unwrap_or_default();
            let header = &self.headers[position];

            if value.is_empty() && descriptor.required {
                return Err(invalid(format!("{} is required", descriptor.name)));
            }

            match &descriptor.kind {
                ColumnKind::Static { map_to, transform } => {
                    if value.is_empty() {
                        continue;
                    }
                    let parsed = match transform {
                        Some(f) => f(value).map_err(|m| invalid(format!("{header}: {m}")))?,
                        None => FieldValue::Text(value.to_string()),
                    };
                    row.set(map_to.clone(), parsed);
                },
                ColumnKind::Dynamic { reducer, .. } => {
                    reducer(&mut row, header, value, &raw)
                        .map_err(|m| invalid(format!("{header}: {m}")))?;
                },
            }
        }
        Ok(row)
    }
}

impl<R: Read> Iterator for RowParser<'_, R> {
    type Item = Result<ParsedRow>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.reader.read_record(&mut self.record) {
            Ok(true) => {},
            Ok(false) => {
                self.done = true;
                return None;
            },
            Err(e) => {
                self.done = true;
                return Some(Err(Error::operation("read_import_row", e)));
            },
        }
        self.rows_read += 1;
        // Header is line 1; fall back to counting when the reader has no position.
        let line = self
            .record
            .position()
            .map_or(self.rows_read + 1, |p| usize::try_from(p.line()).unwrap_or(usize::MAX));

        let parsed = self.parse_record(line);
        if parsed.is_err() {
            self.done = true;
        } else {
            metrics::counter!("import_rows_parsed_total").increment(1);
        }
        Some(parsed)
    }
}
