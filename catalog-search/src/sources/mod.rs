//! Row sources for the catalog search binary.

mod csv_file;

pub use csv_file::CsvSource;
