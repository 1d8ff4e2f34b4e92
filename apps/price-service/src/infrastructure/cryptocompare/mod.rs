//! CryptoCompare Adapter
//!
//! Implements the price feed port over the CryptoCompare min-api:
//!
//! - `/data/all/coinlist`: symbols currently listed
//! - `/data/pricemulti`: `fsym -> tsym -> rate` for symbol sets
//! - `/data/price`: one `fsym` against a set of `tsyms`

mod client;

pub use client::CryptoCompareClient;
