//! Output artifact generation.

mod csv;

pub use csv::generate_csv;
