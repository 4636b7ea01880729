//! Envelope-style personal budgeting backend.
//!
//! Users register and authenticate with JWT access tokens, organise their
//! budget into categories ("envelopes"), and record income/expense
//! transactions that can be filtered, sorted, paginated, and aggregated.

pub mod config;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod security;
pub mod services;
pub mod state;
pub mod validation;
