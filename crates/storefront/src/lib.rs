//! Tidewater storefront account API.
//!
//! Registration and login hand out signed bearer tokens; profile and billing
//! address routes require one. This crate provides the service as a library,
//! allowing it to be tested in-process and reused by the CLI.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
