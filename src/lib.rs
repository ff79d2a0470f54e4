//! Group expense splitting: net balances, debt settlement, savings goals and
//! personal revenue, served over HTTP.
//!
//! The ledger itself is two pure functions, [`balance::compute_balances`] and
//! [`exchange::compute_debts`]. They are recomputed from the full expense list
//! on every call; nothing is cached.

pub mod auth;
pub mod balance;
pub mod config;
pub mod error;
pub mod exchange;
pub mod goals;
pub mod reports;
pub mod revenue;
pub mod routes;
pub mod schemas;
pub mod store;
pub mod validation;
