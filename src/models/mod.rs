//! Data models for catalog batch jobs.
//!
//! - [`product`]: catalog entities and the inputs used to create/update them
//! - [`row`]: parsed import rows
//! - [`job`]: batch job records, contexts and results

pub mod job;
pub mod product;
pub mod row;

pub use job::{
    BatchJob, BatchJobKind, BatchJobStatus, BatchJobUpdate, ExportJobContext, ExportShape,
    ImportJobContext, JobContext, JobResult, ListConfig, PriceColumn, ProductFilter,
    RegionColumn, SortOrder, StatDescriptor,
};
pub use product::{
    Image, MoneyAmount, PriceInput, Product, ProductCollection, ProductInput, ProductOption,
    ProductOptionValue, ProductStatus, ProductVariant, Region, ShippingProfile,
    ShippingProfileType, VariantInput, VariantOptionInput,
};
pub use row::{FieldValue, OptionRecord, OptionValueRecord, ParsedRow, PriceRecord, paths};
