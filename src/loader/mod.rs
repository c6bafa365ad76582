//! Loaders turning ledger and bank statement files into records

pub mod csv_file;

pub use csv_file::*;
