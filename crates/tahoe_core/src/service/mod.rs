//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Enforce relationship rules (parent existence, acyclic parent chains).
//! - Keep the store and CLI layers decoupled from storage details.

pub mod folder_service;
pub mod interchange;
pub mod note_service;
