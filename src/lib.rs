pub mod db;
pub mod errors;
pub mod quotations;
pub mod schema;

pub use quotations::*;
