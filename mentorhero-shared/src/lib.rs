//! # MentorHero Shared Library
//!
//! This crate contains the domain models, database layer, and authentication
//! primitives shared by the MentorHero API server.
//!
//! ## Module Organization
//!
//! - `models`: Database models (users, catalog, tutoring requests, ratings)
//! - `auth`: Token issuance/validation and password hashing
//! - `db`: Connection pool and migration runner
//! - `reputation`: Tutor reputation arithmetic and badge derivation

pub mod auth;
pub mod db;
pub mod models;
pub mod reputation;

/// Current version of the MentorHero shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
