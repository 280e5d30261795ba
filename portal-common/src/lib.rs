//! # Learning Portal Common Library
//!
//! The content hierarchy store behind the learning portal:
//! - Data model (Organization → Phase → Module → Lesson, roster, posts, resources)
//! - Identifier allocation and tree path resolution
//! - Pure mutation engine with progress aggregation
//! - Bulk structure import and interchange text
//! - Selection reconciliation and the single-path `PortalStore`
//! - Generation collaborator seam, login check, configuration and events

pub mod auth;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod generation;
pub mod ids;
pub mod import;
pub mod interchange;
pub mod model;
pub mod progress;
pub mod queries;
pub mod resolver;
pub mod scoring;
pub mod seed;
pub mod selection;
pub mod store;
pub mod time;

pub use error::{Error, Result};
pub use store::{MutationOutcome, PortalStore, SharedPortal};
