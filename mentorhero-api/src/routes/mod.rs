/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Authentication endpoints (register, login)
/// - `catalog`: Public reference data (majors, subjects)
/// - `users`: Profile and tutor directory endpoints
/// - `requests`: Tutoring request lifecycle endpoints

pub mod auth;
pub mod catalog;
pub mod health;
pub mod requests;
pub mod users;
