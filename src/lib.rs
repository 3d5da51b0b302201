#![forbid(unsafe_code)]

//! Minimal user-account service: registration, credential verification,
//! bearer-token issuance and profile management over HTTP, persisted to a
//! single JSON document.

pub mod auth;
pub mod config;
pub mod gateway;

pub use config::Config;
