mod open;
mod models;
mod frontier;
mod insert;
mod query;
mod schema;
mod export;

pub use open::{Db, Store};
pub use models::*;
pub use export::ExportFormat;
