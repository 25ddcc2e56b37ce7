//! Use-case services.
//!
//! # Responsibility
//! - Give request-handling layers one entry point over a repository and
//!   its entity factory.
//! - Keep callers unaware of which backend is active.

pub mod user_service;
