//! # Shift Lifecycle
//!
//! State machine for the cash-drawer shift. Every sale operation is gated on
//! the shift being open.
//!
//! ## States
//! ```text
//!                 open / resume               close
//!   ┌────────┐ ─────────────────► ┌────────┐ ─────────► ┌─────────┐
//!   │ Closed │                    │  Open  │            │  Ended  │
//!   └────────┘ ◄── open rejected  └────────┘            └─────────┘
//!                 (stay Closed)        │                  terminal:
//!                                      │                  start a new
//!                              close rejected             session to
//!                              (stay Open)                reopen
//! ```
//!
//! The lifecycle itself never talks to the backend. The session asks it
//! whether a transition is allowed, performs the request, and only then
//! records the transition.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Shift, ShiftStatus};

/// Where the shift is.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ShiftState {
    /// No shift yet: only `open` / `resume` are allowed.
    #[default]
    Closed,

    /// Selling.
    Open(Shift),

    /// Closed at the backend; the session is finished.
    Ended { closing_entry: Option<String> },
}

/// The shift state machine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShiftLifecycle {
    state: ShiftState,
}

impl ShiftLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ShiftState {
        &self.state
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, ShiftState::Open(_))
    }

    pub fn is_ended(&self) -> bool {
        matches!(self.state, ShiftState::Ended { .. })
    }

    /// The open shift, if any.
    pub fn shift(&self) -> Option<&Shift> {
        match &self.state {
            ShiftState::Open(shift) => Some(shift),
            _ => None,
        }
    }

    /// Gate for every sale operation.
    ///
    /// ## Errors
    /// `ShiftNotOpen` in any state other than `Open`.
    pub fn require_open(&self) -> CoreResult<&Shift> {
        self.shift().ok_or(CoreError::ShiftNotOpen)
    }

    /// Checks that an `open` request may be sent.
    pub fn check_can_open(&self) -> CoreResult<()> {
        match &self.state {
            ShiftState::Closed => Ok(()),
            ShiftState::Open(shift) => Err(CoreError::ShiftAlreadyOpen {
                opening_entry: shift.opening_entry_id.clone().unwrap_or_default(),
            }),
            ShiftState::Ended { .. } => Err(CoreError::SessionEnded),
        }
    }

    /// Records a successful opening.
    pub fn mark_open(&mut self, shift: Shift) -> CoreResult<&Shift> {
        self.check_can_open()?;
        info!(
            opening_entry = ?shift.opening_entry_id,
            pos_profile = %shift.profile.pos_profile,
            opening_amount = %shift.opening_amount,
            "Shift opened"
        );
        self.state = ShiftState::Open(shift);
        self.require_open()
    }

    /// Adopts a shift the backend reports as already open.
    ///
    /// ## Returns
    /// - `Some(shift)` if the status carried an open entry
    /// - `None` if there is nothing to resume (state stays `Closed`)
    ///
    /// The opening amount is not part of the status; a resumed shift
    /// carries zero.
    pub fn resume(&mut self, status: &ShiftStatus) -> CoreResult<Option<&Shift>> {
        self.check_can_open()?;

        let Some(entry) = status.opening_entry.as_ref() else {
            return Ok(None);
        };

        let shift = Shift {
            opening_entry_id: Some(entry.clone()),
            opening_amount: Money::ZERO,
            profile: status.profile.clone(),
        };
        self.mark_open(shift).map(Some)
    }

    /// Checks that a `close` request may be sent.
    pub fn check_can_close(&self) -> CoreResult<&Shift> {
        match &self.state {
            ShiftState::Ended { .. } => Err(CoreError::SessionEnded),
            _ => self.require_open(),
        }
    }

    /// Records a successful close. The lifecycle is terminal afterwards.
    pub fn mark_closed(&mut self, closing_entry: Option<String>) -> CoreResult<Shift> {
        self.check_can_close()?;
        info!(closing_entry = ?closing_entry, "Shift closed");

        match std::mem::replace(&mut self.state, ShiftState::Ended { closing_entry }) {
            ShiftState::Open(shift) => Ok(shift),
            // check_can_close only passes in Open
            other => {
                self.state = other;
                Err(CoreError::ShiftNotOpen)
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
