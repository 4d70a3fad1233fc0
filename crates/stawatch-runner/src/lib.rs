//! Imperative shell around `stawatch-core`: probes, logs, timing.

pub mod clock;
pub mod config;
pub mod coordinator;
pub mod monitor;
pub mod prober;
pub mod render;
pub mod reporter;
pub mod shutdown;
pub mod summary;
pub mod targets;
pub mod util;

pub use clock::*;
pub use config::*;
pub use coordinator::*;
pub use monitor::*;
pub use prober::*;
pub use render::*;
pub use reporter::*;
pub use shutdown::*;
pub use summary::*;
pub use targets::*;
pub use util::*;
