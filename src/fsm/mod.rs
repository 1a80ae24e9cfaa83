//! Wake-cycle phase tracker.
//!
//! One wake cycle is a straight run through a small state graph:
//!
//! ```text
//!  Start ─▶ Classifying ─┬─▶ Debouncing ─▶ Classified
//!                        └───────────────▶ Classified
//!
//!  Classified ─┬─▶ Idle ──────────────────────────────────────▶ Sleeping
//!              └─▶ Connecting ─┬─▶ Composing ─┬─▶ Delivering ─▶ Sleeping
//!                              │              └──────────────▶ Sleeping
//!                              └─▶ Halted
//! ```
//!
//! `Sleeping` and `Halted` are terminal.  The tracker does not drive the
//! cycle; [`CycleService`](crate::app::service::CycleService) does, and
//! calls [`PhaseTracker::advance`] at each step so that an out-of-order
//! step is caught instead of silently executed.

use core::fmt;

use heapless::Vec;
use log::{error, info};

// ---------------------------------------------------------------------------
// Phase identity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CyclePhase {
    Start = 0,
    Classifying = 1,
    Debouncing = 2,
    Classified = 3,
    Idle = 4,
    Connecting = 5,
    Composing = 6,
    Delivering = 7,
    Sleeping = 8,
    Halted = 9,
}

impl CyclePhase {
    /// Total number of phases, used to size the successor table.
    pub const COUNT: usize = 10;

    pub fn name(self) -> &'static str {
        match self {
            Self::Start => "Start",
            Self::Classifying => "Classifying",
            Self::Debouncing => "Debouncing",
            Self::Classified => "Classified",
            Self::Idle => "Idle",
            Self::Connecting => "Connecting",
            Self::Composing => "Composing",
            Self::Delivering => "Delivering",
            Self::Sleeping => "Sleeping",
            Self::Halted => "Halted",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Sleeping | Self::Halted)
    }
}

/// Legal successors, indexed by `CyclePhase as usize`.
const SUCCESSORS: [&[CyclePhase]; CyclePhase::COUNT] = {
    use CyclePhase::*;
    [
        /* Start       */ &[Classifying],
        /* Classifying */ &[Debouncing, Classified],
        /* Debouncing  */ &[Classified],
        /* Classified  */ &[Idle, Connecting],
        /* Idle        */ &[Sleeping],
        /* Connecting  */ &[Composing, Halted],
        // Nothing accepted by the streams: skip delivery.
        /* Composing   */ &[Delivering, Sleeping],
        /* Delivering  */ &[Sleeping],
        /* Sleeping    */ &[],
        /* Halted      */ &[],
    ]
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IllegalTransition {
    pub from: CyclePhase,
    pub to: CyclePhase,
}

impl fmt::Display for IllegalTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "illegal phase transition {} -> {}", self.from.name(), self.to.name())
    }
}

// ---------------------------------------------------------------------------
// Tracker
// ---------------------------------------------------------------------------

/// Longest possible path through the graph.
const HISTORY_CAPACITY: usize = 8;

pub struct PhaseTracker {
    current: CyclePhase,
    history: Vec<CyclePhase, HISTORY_CAPACITY>,
}

impl PhaseTracker {
    pub fn new() -> Self {
        let mut history = Vec::new();
        let _ = history.push(CyclePhase::Start);
        Self { current: CyclePhase::Start, history }
    }

    pub fn current(&self) -> CyclePhase {
        self.current
    }

    /// Every phase visited so far, starting with `Start`.
    pub fn history(&self) -> &[CyclePhase] {
        &self.history
    }

    /// Move to `next` if the graph allows it.
    pub fn advance(&mut self, next: CyclePhase) -> Result<(), IllegalTransition> {
        let from = self.current;
        if !SUCCESSORS[from as usize].contains(&next) {
            error!("PHASE | rejected {} -> {}", from.name(), next.name());
            return Err(IllegalTransition { from, to: next });
        }
        info!("PHASE | {} -> {}", from.name(), next.name());
        self.current = next;
        // Every legal path fits; a full history only loses bookkeeping.
        let _ = self.history.push(next);
        Ok(())
    }
}

impl Default for PhaseTracker {
    fn default() -> Self {
        Self::new()
    }
}
