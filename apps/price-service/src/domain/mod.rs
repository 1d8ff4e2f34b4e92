//! Domain Layer - Core pricing types and business logic.
//!
//! This layer contains the symbol registry, price snapshots and the
//! cross-rate synthesis. Nothing here performs I/O.

/// Managed/supported symbol sets and eligibility.
pub mod symbols;

/// Price snapshots, rate tables and cross-rate synthesis.
pub mod pricing;
