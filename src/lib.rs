//! Load a used-car listings file, clean it, and compute the filtered
//! aggregates a dashboard shows.

pub mod data;
pub mod session;

pub use data::aggregate::Dashboard;
pub use data::cache::DatasetCache;
pub use data::clean::{CleaningConfig, Imputation};
pub use data::filter::{apply, FilterSpec, FilteredView};
pub use data::loader::{load_file, LoadError};
pub use data::model::{Listing, ListingTable, NumericRange, OwnerType};
pub use data::parse::PriceUnit;
pub use session::Session;
