//! Phase transition rules.
//!
//! The finite state machine governing a unit's pedagogical progression.
//! Given the current phase, the current counts, and the signal set parsed
//! from a completion, [`apply_signals`] produces the next state — it never
//! touches storage, so the whole transition table is testable in isolation.

use crate::marker::Signal;
use crate::session::{AssignmentCounts, Phase};
use std::collections::HashSet;

/// The order in which co-occurring signals are applied.
///
/// The source behavior never documented an intended order, so this is an
/// explicit policy rather than rediscovered intent. The default processes
/// the phase advance first, then the counter increment, then the mastery
/// flag — a completion that both finishes the learning phase and signals
/// mastery in one turn still ends in the assignment phase with the mastery
/// flag set.
#[derive(Debug, Clone)]
pub struct SignalPolicy {
    pub order: [Signal; 3],
}

impl Default for SignalPolicy {
    fn default() -> Self {
        Self {
            order: [
                Signal::AdvanceToAssignment,
                Signal::AssignmentDone,
                Signal::UnitMastered,
            ],
        }
    }
}

/// The outcome of applying one completion's signals to a unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// The phase after all signals are applied.
    pub phase: Phase,
    /// Counts after all signals are applied.
    pub counts: AssignmentCounts,
    /// Whether the phase moved this turn.
    pub phase_changed: bool,
    /// One-shot mastery flag; returned to the caller, never persisted.
    pub unit_complete: bool,
}

/// Applies a parsed signal set to the current state.
///
/// Transition table:
///
/// | Phase      | Signal                | Effect                                  |
/// |------------|-----------------------|-----------------------------------------|
/// | learning   | `AdvanceToAssignment` | phase becomes assignment                |
/// | assignment | `AssignmentDone`      | completed += 1, total += 1              |
/// | assignment | `UnitMastered`        | unit_complete flag, phase unchanged     |
///
/// Signals with no row for the current phase are ignored; the parser has
/// already stripped them from the user-visible text. A phase reached
/// earlier in the same application pass counts as the current phase for
/// later signals.
pub fn apply_signals(
    phase: Phase,
    counts: AssignmentCounts,
    signals: &HashSet<Signal>,
    policy: &SignalPolicy,
) -> Transition {
    let mut next = Transition {
        phase,
        counts,
        phase_changed: false,
        unit_complete: false,
    };

    for signal in policy.order.iter().copied() {
        if !signals.contains(&signal) {
            continue;
        }
        match signal {
            Signal::AdvanceToAssignment => {
                if next.phase == Phase::Learning {
                    next.phase = Phase::Assignment;
                    next.phase_changed = true;
                }
            }
            Signal::AssignmentDone => {
                if next.phase == Phase::Assignment {
                    next.counts.record_completed();
                }
            }
            Signal::UnitMastered => {
                if next.phase == Phase::Assignment {
                    next.unit_complete = true;
                }
            }
        }
    }

    next
}
