//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate document store calls into dashboard-level APIs.
//! - Keep UI layers decoupled from storage details.

pub mod document_service;
