//! KASSA Marketplace Settlement Library
//!
//! This library provides the escrow-backed settlement core for the KASSA
//! marketplace: payment lifecycle, group-buy deal closing, service booking
//! completion, and shipping quotes.

pub mod application;
pub mod auth;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod persistence;
pub mod rate_limit;
