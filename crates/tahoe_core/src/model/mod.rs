//! Domain model for notes and folders.
//!
//! # Responsibility
//! - Define canonical records shared by repositories, services and the store.
//!
//! # Invariants
//! - Every note and folder is identified by a stable UUID.
//! - A note never names itself as parent.

pub mod folder;
pub mod note;
