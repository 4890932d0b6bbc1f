mod basemap;
mod incidents;
mod locations;
mod store;

pub use basemap::{load_basemap, load_fallback_world};
pub use incidents::{strip_citations, Dataset, Incident, DATE_FORMAT};
pub use locations::{LocationIndex, TOKEN_SEPARATOR};
pub use store::DatasetStore;
