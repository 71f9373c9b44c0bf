//! pa-core/src/lib.rs
//!
//! The central domain logic and interface definitions for the participation
//! archive: models, ports, and every pure computation over a loaded corpus.

pub mod dates;
pub mod error;
pub mod filter;
pub mod gate;
pub mod homework;
pub mod links;
pub mod markdown;
pub mod models;
pub mod paginate;
pub mod related;
pub mod reports;
pub mod service;
pub mod topics;
pub mod traits;

// Re-exporting for easier access in other crates
pub use error::*;
pub use filter::PostFilter;
pub use gate::AuthGate;
pub use models::*;
pub use paginate::SortKey;
pub use service::{ArchiveService, ListQuery, ListingOptions};
pub use traits::*;
