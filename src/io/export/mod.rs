//! Export column model.
//!
//! - [`shape`]: discovery of the variable-width part of the header
//! - [`columns`]: the ordered column descriptors built from a shape

pub mod columns;
pub mod shape;

pub use columns::{ExportAccessor, ExportColumnDescriptor, build_export_columns, price_matches};
pub use shape::ShapeAccumulator;
