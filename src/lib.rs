//! truetrace - offline-first site inspection reports
//!
//! Field engineers capture a site photo with their engineer ID, capture
//! time, and location. Reports are submitted to a remote ledger when the
//! device is online, or parked in a durable local queue and submitted in
//! capture order once connectivity returns.

pub mod config;
pub mod connectivity;
pub mod error;
pub mod history;
pub mod quality;
pub mod remote;
pub mod store;
pub mod submit;
pub mod types;
