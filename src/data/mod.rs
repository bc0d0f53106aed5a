/// Data layer: core types, loading, cleaning, filtering and aggregation.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  read file → Vec<RawListing>
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  clean    │  parse units, derive Brand, impute → ListingTable
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  FilterSpec → FilteredView (row indices)
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ aggregate  │  means, counts, correlation, extremes, tiers
///   └───────────┘
/// ```

pub mod aggregate;
pub mod cache;
pub mod clean;
pub mod filter;
pub mod loader;
pub mod model;
pub mod parse;
pub mod stats;
