//! Geogate - A tiered IP-geolocation lookup gateway
//!
//! This library provides the core functionality for the Geogate service:
//! resolving IP addresses against multiple geolocation backends and shaping
//! the response by the caller's access tier.
//!
//! # Architecture
//! - `access`: credential store, tier policy and fixed-window rate limiting
//! - `services::geo`: provider adapters (public API, commercial API, MaxMind)
//!   and the fallback/merge resolver
//! - `services`: the access gateway orchestrating the request pipeline
//! - `output`: field projection and JSON/XML/CSV serialization
//! - `api`: HTTP route handlers and middleware
//! - `config`: configuration management
//! - `runtime`: server assembly and execution
//! - `system`: logging and system utilities

pub mod access;
pub mod api;
pub mod config;
pub mod errors;
pub mod output;
pub mod runtime;
pub mod services;
pub mod system;
pub mod utils;
