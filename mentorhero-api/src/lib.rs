//! # MentorHero API Server Library
//!
//! This library provides the core functionality for the MentorHero API
//! server: a peer-tutoring marketplace backend where learners browse
//! tutors, request sessions, and both sides exchange ratings.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `media`: Image host client for profile pictures
//! - `middleware`: Security headers
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod media;
pub mod middleware;
pub mod routes;
