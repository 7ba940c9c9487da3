//! # minimart-session: Cashier Session Orchestration
//!
//! Glues the pure [`minimart_core::Till`] to a [`minimart_backend::PosBackend`].
//!
//! ## Request Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                  Every backend-bound operation                          │
//! │                                                                         │
//! │  1. Local check on the Till   (shift open? cart non-empty? tender?)     │
//! │         │ fails ──► Err, nothing sent                                   │
//! │         ▼                                                               │
//! │  2. PosBackend request        (awaited while holding &mut PosSession)   │
//! │         │ fails ──► Err, Till untouched                                 │
//! │         ▼                                                               │
//! │  3. Apply confirmed result to the Till                                  │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  4. Best-effort follow-up     (catalog / recent list, warn! on failure) │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`session`] - `PosSession` and the detached `StockSync`
//! - [`config`] - `PosConfig` (TOML file + `MINIMART_*` environment)
//! - [`error`] - `SessionError` and its machine-readable `ErrorCode`

pub mod config;
pub mod error;
pub mod session;

pub use config::{PosConfig, TillSettings};
pub use error::{ErrorCode, SessionError, SessionResult};
pub use session::{PosSession, StockSync};
