//! Services layer (ports + adapters).
//!
//! - `ports`: pure contracts/types used across the app (kernel-facing).
//! - `adapters`: OS/runtime specific implementations (IO/async).
//! - `host`: the boundary a UI/CLI collaborator talks to.

pub mod adapters;
pub mod host;
pub mod ports;

pub use host::{HostEvent, SearchQuery, SearchSummary, ViewerHost};
