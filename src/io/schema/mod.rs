//! Declarative column schema and the row parser driven by it.
//!
//! A schema is an ordered list of [`ColumnDescriptor`]s. Each descriptor is
//! either *static* (one header, mapped to one dot-path, optionally transformed)
//! or *dynamic* (a header pattern plus a reducer that folds every matching column
//! into an array-valued group of the row).
//!
//! Header resolution tries exact static names first, then the dynamic patterns in
//! schema order. Headers that resolve to nothing are ignored.

mod parser;
pub mod product;

pub use parser::RowParser;
pub use product::product_import_schema;

use crate::models::{FieldValue, ParsedRow};
use regex::Regex;
use std::collections::HashMap;

/// Converts the raw text of a static column into a value.
///
/// The error is a message; the parser attaches the line number.
pub type Transform = fn(&str) -> std::result::Result<FieldValue, String>;

/// Folds one dynamic column into a row.
///
/// Called with the row under construction, the column's header, the column's raw
/// value and a view of the whole raw line. Reducers are pure apart from the row
/// they are handed.
pub type Reducer =
    fn(&mut ParsedRow, &str, &str, &RawRow<'_>) -> std::result::Result<(), String>;

/// What a descriptor does with its column.
#[derive(Debug, Clone)]
pub enum ColumnKind {
    /// One header to one dot-path.
    Static {
        /// Target dot-path, `<entity>.<field>`.
        map_to: String,
        /// Optional conversion of the raw text.
        transform: Option<Transform>,
    },
    /// Every header matching `pattern`, folded by `reducer`.
    Dynamic {
        /// Header pattern.
        pattern: Regex,
        /// Fold function.
        reducer: Reducer,
    },
}

/// One entry of a column schema.
#[derive(Debug, Clone)]
pub struct ColumnDescriptor {
    /// Header name (static) or a label for the group (dynamic).
    pub name: String,
    /// Whether an empty value or a missing header fails validation.
    pub required: bool,
    /// Static or dynamic behavior.
    pub kind: ColumnKind,
}

impl ColumnDescriptor {
    /// A static column copying its raw text to `map_to`.
    #[must_use]
    pub fn mapped(name: impl Into<String>, map_to: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: false,
            kind: ColumnKind::Static {
                map_to: map_to.into(),
                transform: None,
            },
        }
    }

    /// A dynamic column group.
    #[must_use]
    pub fn matching(name: impl Into<String>, pattern: Regex, reducer: Reducer) -> Self {
        Self {
            name: name.into(),
            required: false,
            kind: ColumnKind::Dynamic { pattern, reducer },
        }
    }

    /// Marks the column required.
    #[must_use]
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Sets the transform of a static column. No-op on dynamic columns.
    #[must_use]
    pub fn with_transform(mut self, f: Transform) -> Self {
        if let ColumnKind::Static { transform, .. } = &mut self.kind {
            *transform = Some(f);
        }
        self
    }

    /// Returns whether this is a static column.
    #[must_use]
    pub const fn is_static(&self) -> bool {
        matches!(self.kind, ColumnKind::Static { .. })
    }
}

/// An ordered list of column descriptors.
#[derive(Debug, Clone, Default)]
pub struct ColumnSchema {
    columns: Vec<ColumnDescriptor>,
}

impl ColumnSchema {
    /// Creates a schema from descriptors in resolution order.
    #[must_use]
    pub const fn new(columns: Vec<ColumnDescriptor>) -> Self {
        Self { columns }
    }

    /// Returns the descriptors.
    #[must_use]
    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    /// Finds the descriptor for a header: exact static name first, then the first
    /// dynamic pattern that matches.
    #[must_use]
    pub fn resolve(&self, header: &str) -> Option<&ColumnDescriptor> {
        self.columns
            .iter()
            .find(|c| c.is_static() && c.name == header)
            .or_else(|| {
                self.columns.iter().find(|c| match &c.kind {
                    ColumnKind::Dynamic { pattern, .. } => pattern.is_match(header),
                    ColumnKind::Static { .. } => false,
                })
            })
    }

    /// Required static columns absent from `headers`.
    #[must_use]
    pub fn missing_required<'a>(&'a self, headers: &[&str]) -> Vec<&'a str> {
        self.columns
            .iter()
            .filter(|c| c.required && c.is_static() && !headers.contains(&c.name.as_str()))
            .map(|c| c.name.as_str())
            .collect()
    }
}

/// Read-only view of one raw line, keyed by header.
#[derive(Debug, Clone, Copy)]
pub struct RawRow<'a> {
    index: &'a HashMap<String, usize>,
    record: &'a csv::StringRecord,
}

impl<'a> RawRow<'a> {
    pub(crate) const fn new(index: &'a HashMap<String, usize>, record: &'a csv::StringRecord) -> Self {
        Self { index, record }
    }

    /// Returns the raw value under `header`, if the header exists.
    #[must_use]
    pub fn get(&self, header: &str) -> Option<&'a str> {
        self.index.get(header).and_then(|&i| self.record.get(i))
    }
}
