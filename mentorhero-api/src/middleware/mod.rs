/// Middleware modules for the API server
///
/// This module contains custom middleware for:
/// - Security headers
///
/// Authentication middleware lives in the shared crate so its tests can
/// exercise it without the full application.

pub mod security;
