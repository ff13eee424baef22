// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Telecom Network Engine - Terminal Availability State Machine
//
// Idle <-> Silent <-> Off, Idle/Silent -> Busy -> (previous state).
// Each unreachable state remembers who tried to get through; the sets are
// drained into notifications on the way back towards Idle.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::mem;

use crate::notification::NotificationKind;
use crate::types::ClientKey;

// ─── Errors ──────────────────────────────────────────────────────────────────

/// Power and silence toggles are illegal while a call is in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("power and silence toggles are illegal while busy")]
pub struct StateConflict;

// ─── Flush ───────────────────────────────────────────────────────────────────

/// Notifications owed by a transition: one per recipient, all of `kind`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flush {
    pub kind: NotificationKind,
    pub recipients: BTreeSet<ClientKey>,
}

fn flush(kind: NotificationKind, recipients: BTreeSet<ClientKey>, out: &mut Vec<Flush>) {
    if !recipients.is_empty() {
        out.push(Flush { kind, recipients });
    }
}

// ─── TerminalState ───────────────────────────────────────────────────────────

/// State a busy terminal returns to once its call ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resume {
    Idle,
    Silent,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerminalState {
    #[default]
    Idle,
    Busy {
        resume: Resume,
        missed_interactive: BTreeSet<ClientKey>,
    },
    Silent {
        missed_interactive: BTreeSet<ClientKey>,
    },
    Off {
        missed_text: BTreeSet<ClientKey>,
        missed_interactive: BTreeSet<ClientKey>,
    },
}

impl TerminalState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Busy { .. })
    }

    pub fn is_silent(&self) -> bool {
        matches!(self, Self::Silent { .. })
    }

    pub fn is_off(&self) -> bool {
        matches!(self, Self::Off { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "IDLE",
            Self::Busy { .. } => "BUSY",
            Self::Silent { .. } => "SILENCE",
            Self::Off { .. } => "OFF",
        }
    }

    /// Import token for the state this terminal rests in once no call is
    /// running.
    pub fn resting_token(&self) -> &'static str {
        match self {
            Self::Idle | Self::Busy { resume: Resume::Idle, .. } => "ON",
            Self::Silent { .. } | Self::Busy { resume: Resume::Silent, .. } => "SILENCE",
            Self::Off { .. } => "OFF",
        }
    }

    pub fn can_start_communication(&self) -> bool {
        matches!(self, Self::Idle | Self::Silent { .. })
    }

    /// Clients waiting for a text-reachability notification.
    pub fn missed_text(&self) -> Option<&BTreeSet<ClientKey>> {
        match self {
            Self::Off { missed_text, .. } => Some(missed_text),
            _ => None,
        }
    }

    /// Clients waiting for an interactive-reachability notification.
    pub fn missed_interactive(&self) -> Option<&BTreeSet<ClientKey>> {
        match self {
            Self::Idle => None,
            Self::Busy { missed_interactive, .. }
            | Self::Silent { missed_interactive }
            | Self::Off { missed_interactive, .. } => Some(missed_interactive),
        }
    }

    // ─── Commands ────────────────────────────────────────────────────────────

    pub fn turn_on(&mut self) -> Result<Vec<Flush>, StateConflict> {
        let mut out = Vec::new();
        match mem::take(self) {
            Self::Idle => {}
            Self::Silent { missed_interactive } => {
                flush(NotificationKind::SilentToIdle, missed_interactive, &mut out);
            }
            Self::Off { missed_text, missed_interactive } => {
                flush(NotificationKind::OffToIdle, missed_text, &mut out);
                flush(NotificationKind::OffToIdle, missed_interactive, &mut out);
            }
            busy @ Self::Busy { .. } => {
                *self = busy;
                return Err(StateConflict);
            }
        }
        Ok(out)
    }

    pub fn turn_off(&mut self) -> Result<Vec<Flush>, StateConflict> {
        *self = match mem::take(self) {
            Self::Idle => Self::Off { missed_text: BTreeSet::new(), missed_interactive: BTreeSet::new() },
            Self::Silent { missed_interactive } => Self::Off { missed_text: BTreeSet::new(), missed_interactive },
            off @ Self::Off { .. } => off,
            busy @ Self::Busy { .. } => {
                *self = busy;
                return Err(StateConflict);
            }
        };
        Ok(Vec::new())
    }

    pub fn silence(&mut self) -> Result<Vec<Flush>, StateConflict> {
        let mut out = Vec::new();
        *self = match mem::take(self) {
            Self::Idle => Self::Silent { missed_interactive: BTreeSet::new() },
            silent @ Self::Silent { .. } => silent,
            Self::Off { missed_text, missed_interactive } => {
                flush(NotificationKind::OffToSilent, missed_text, &mut out);
                Self::Silent { missed_interactive }
            }
            busy @ Self::Busy { .. } => {
                *self = busy;
                return Err(StateConflict);
            }
        };
        Ok(out)
    }

    // ─── Communication events ────────────────────────────────────────────────

    /// An interactive call involving this terminal was established.
    /// Only Idle and Silent can take a call; other states are left alone.
    pub fn on_start_interactive(&mut self) {
        *self = match mem::take(self) {
            Self::Idle => Self::Busy { resume: Resume::Idle, missed_interactive: BTreeSet::new() },
            Self::Silent { missed_interactive } => Self::Busy { resume: Resume::Silent, missed_interactive },
            other => other,
        };
    }

    /// The call this terminal was busy with ended.
    pub fn on_end_interactive(&mut self) -> Vec<Flush> {
        let mut out = Vec::new();
        *self = match mem::take(self) {
            Self::Busy { resume: Resume::Idle, missed_interactive } => {
                flush(NotificationKind::BusyToIdle, missed_interactive, &mut out);
                Self::Idle
            }
            Self::Busy { resume: Resume::Silent, missed_interactive } => Self::Silent { missed_interactive },
            other => other,
        };
        out
    }

    /// A text could not be delivered. Only Off keeps track.
    pub fn on_text_attempt(&mut self, from: &ClientKey) {
        if let Self::Off { missed_text, missed_interactive } = self {
            missed_interactive.remove(from);
            missed_text.insert(from.clone());
        }
    }

    /// A call could not be established.
    pub fn on_interactive_attempt(&mut self, from: &ClientKey) {
        match self {
            Self::Idle => {}
            Self::Off { missed_text, missed_interactive } => {
                missed_text.remove(from);
                missed_interactive.insert(from.clone());
            }
            Self::Busy { missed_interactive, .. } | Self::Silent { missed_interactive } => {
                missed_interactive.insert(from.clone());
            }
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
