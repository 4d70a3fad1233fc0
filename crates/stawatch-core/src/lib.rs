#![forbid(unsafe_code)]

//! Functional core of the station reachability monitor.
//!
//! Everything in this crate is pure: no clocks, no sockets, no files. The
//! runner feeds probe outcomes and timestamps in, and gets events back.

pub mod engine;
pub mod error;
pub mod events;
pub mod ids;
pub mod model;
pub mod store;

pub use engine::*;
pub use error::*;
pub use events::*;
pub use ids::*;
pub use model::*;
pub use store::*;
