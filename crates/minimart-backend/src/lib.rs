//! # minimart-backend: ERP Request Boundary
//!
//! The only way the till talks to the ERP.
//!
//! ## Components
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        minimart-backend                                 │
//! │                                                                         │
//! │  ┌─────────────────┐                                                   │
//! │  │   PosBackend    │  async trait, one method per ERP call             │
//! │  └────────┬────────┘                                                   │
//! │           │ implemented by                                              │
//! │     ┌─────┴──────────────┐                                              │
//! │     ▼                    ▼                                              │
//! │  ┌─────────────┐   ┌───────────────┐                                   │
//! │  │FrappeClient │   │ MemoryBackend │                                   │
//! │  │ reqwest     │   │ tests / demo  │                                   │
//! │  └──────┬──────┘   └───────────────┘                                   │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌─────────────┐   ┌───────────────┐                                   │
//! │  │    wire     │   │BackendSettings│                                   │
//! │  │ JSON shapes │   │ [backend] TOML│                                   │
//! │  └─────────────┘   └───────────────┘                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod frappe;
pub mod memory;
pub mod wire;

pub use backend::{methods, PosBackend};
pub use config::BackendSettings;
pub use error::{BackendError, BackendResult};
pub use frappe::FrappeClient;
pub use memory::MemoryBackend;
