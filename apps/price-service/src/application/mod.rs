//! Application Layer - Use cases and port definitions.
//!
//! This layer contains the application services and port interfaces
//! that define how the domain interacts with external systems.

/// Port interfaces for the upstream feed, snapshot store and scheduled jobs.
pub mod ports;

/// Application services for price resolution and background refreshes.
pub mod services;
