//! # EMBERVALE
//!
//! The main server crate, tying the layers together.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                        EMBERVALE SERVER                           │
//! ├───────────────────────────────────────────────────────────────────┤
//! │                                                                   │
//! │   ┌──────────────┐    ┌──────────────┐    ┌──────────────┐       │
//! │   │   shared     │    │    path      │    │    actor     │       │
//! │   │              │───>│              │    │              │       │
//! │   │  • grid      │    │  • A* search │    │  • router    │       │
//! │   │  • protocol  │    │  • costs     │    │  • pods      │       │
//! │   │  • constants │    │              │    │  • directory │       │
//! │   └──────┬───────┘    └──────┬───────┘    └──────┬───────┘       │
//! │          │                   │                   │               │
//! │          └─────────┬─────────┴─────────┬─────────┘               │
//! │                    v                   v                         │
//! │             ┌──────────────┐    ┌──────────────┐                 │
//! │             │    world     │    │  this crate  │                 │
//! │             │              │───>│              │                 │
//! │             │  • players   │    │  • config    │                 │
//! │             │  • monsters  │    │  • tick loop │                 │
//! │             │  • keepers   │    │  • spawning  │                 │
//! │             └──────────────┘    └──────────────┘                 │
//! │                                                                   │
//! └───────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `config`: TOML server configuration with production defaults
//! - `world_loop`: the composition root that spawns and ticks everything

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod config;
pub mod world_loop;

// Re-export the layers
pub use embervale_actor as actor;
pub use embervale_path as path;
pub use embervale_shared as shared;
pub use embervale_world as world;

// Re-export commonly used types
pub use config::{ConfigError, ServerConfig};
pub use world_loop::{TickLedger, TickSummary, WorldLoop};
