//! Hand-presence latch
//!
//! Remembers whether each hand was last reported visible. Positional data
//! is only forwarded while the gate is open.
//!
//! With [`GateMode::Shared`] either visible hand opens the gate for both
//! hands. That matches the behavior peers already depend on; it means a
//! left-hand sample is forwarded while only the right hand is visible.
//! [`GateMode::PerHand`] gates each side on its own flag.

use serde::{Deserialize, Serialize};

use crate::schema::Side;

/// How visibility flags gate positional samples
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GateMode {
    /// Any visible hand opens the gate for every hand
    #[default]
    Shared,
    /// Each hand is gated by its own flag
    PerHand,
}

/// Visibility flags for both hands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HandLatch {
    left_visible: bool,
    right_visible: bool,
}

impl HandLatch {
    /// Both hands invisible
    pub fn new() -> Self {
        Self::default()
    }

    /// Set one side's flag
    pub fn update(&mut self, side: Side, visible: bool) {
        match side {
            Side::Left => self.left_visible = visible,
            Side::Right => self.right_visible = visible,
        }
    }

    pub fn is_visible(&self, side: Side) -> bool {
        match side {
            Side::Left => self.left_visible,
            Side::Right => self.right_visible,
        }
    }

    pub fn is_any_visible(&self) -> bool {
        self.left_visible || self.right_visible
    }

    /// Whether a positional sample for `side` may be forwarded
    pub fn allows(&self, side: Side, mode: GateMode) -> bool {
        match mode {
            GateMode::Shared => self.is_any_visible(),
            GateMode::PerHand => self.is_visible(side),
        }
    }

    /// Copy of the current flags
    pub fn snapshot(&self) -> Self {
        *self
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
