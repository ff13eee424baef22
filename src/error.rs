// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Telecom Network Engine - Errors

//! Error types for the network core.
//!
//! Every command fails with one named condition. Callers that only care about
//! the broad category use [`NetworkError::kind`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::communication::LifecycleError;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, NetworkError>;

// ---------------------------------------------------------------------------
// ErrorKind
// ---------------------------------------------------------------------------

/// Broad failure category, independent of the exact condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    NotFound,
    AlreadyExists,
    InvalidIdentifier,
    InvalidState,
    Unreachable,
    CapabilityUnsupported,
    MalformedInput,
}

// ---------------------------------------------------------------------------
// NetworkError
// ---------------------------------------------------------------------------

/// Named failure conditions raised by [`Network`](crate::Network) commands.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetworkError {
    #[error("unknown client: {0}")]
    ClientNotFound(String),

    #[error("unknown terminal: {0}")]
    TerminalNotFound(String),

    #[error("unknown communication: {0}")]
    CommunicationNotFound(u32),

    #[error("terminal {terminal} has no friend {friend}")]
    FriendNotFound { terminal: String, friend: String },

    #[error("unknown tariff plan: {0}")]
    TariffPlanNotFound(String),

    #[error("client already exists: {0}")]
    ClientExists(String),

    #[error("terminal already exists: {0}")]
    TerminalExists(String),

    #[error("terminal {terminal} is already friends with {friend}")]
    AlreadyFriends { terminal: String, friend: String },

    #[error("tariff plan already exists: {0}")]
    TariffPlanExists(String),

    #[error("tariff plan {0} is assigned to at least one client")]
    TariffPlanInUse(String),

    #[error("invalid terminal id {0:?}: expected exactly six digits")]
    InvalidTerminalId(String),

    #[error("invalid terminal kind: {0}")]
    InvalidTerminalKind(String),

    #[error("invalid communication kind: {0}")]
    InvalidCommunicationKind(String),

    #[error("terminal {0} is busy")]
    TerminalBusy(String),

    #[error("terminal {0} has no ongoing communication")]
    NoOngoingCommunication(String),

    #[error("terminal {0} did not originate its ongoing communication")]
    NotCommunicationOrigin(String),

    #[error("communication {0} is already finished")]
    CommunicationAlreadyFinished(u32),

    #[error("communication {0} is still ongoing")]
    CommunicationNotFinished(u32),

    #[error("communication {0} is already paid")]
    CommunicationAlreadyPaid(u32),

    #[error("communication {0} costs more than can be represented")]
    CostOverflow(u32),

    #[error("invalid tariff plan {name}: {reason}")]
    InvalidTariffPlan { name: String, reason: String },

    #[error("invalid client {field} {value:?}: must not contain '|' or line breaks")]
    InvalidClientField { field: &'static str, value: String },

    #[error("notifications already enabled for client {0}")]
    NotificationsAlreadyEnabled(String),

    #[error("notifications already disabled for client {0}")]
    NotificationsAlreadyDisabled(String),

    #[error("origin terminal {0} is off")]
    OriginOff(String),

    #[error("origin terminal {0} is busy")]
    OriginBusy(String),

    #[error("destination terminal {0} is off")]
    DestinationOff(String),

    #[error("destination terminal {0} is busy")]
    DestinationBusy(String),

    #[error("destination terminal {0} is silent")]
    DestinationSilent(String),

    #[error("origin terminal {terminal} does not support {kind}")]
    UnsupportedAtOrigin { terminal: String, kind: String },

    #[error("destination terminal {terminal} does not support {kind}")]
    UnsupportedAtDestination { terminal: String, kind: String },

    #[error("bad entry {line:?}: {reason}")]
    UnrecognizedEntry { line: String, reason: String },
}

impl NetworkError {
    /// Category of this failure.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ClientNotFound(_)
            | Self::TerminalNotFound(_)
            | Self::CommunicationNotFound(_)
            | Self::FriendNotFound { .. }
            | Self::TariffPlanNotFound(_) => ErrorKind::NotFound,

            Self::ClientExists(_)
            | Self::TerminalExists(_)
            | Self::AlreadyFriends { .. }
            | Self::TariffPlanExists(_) => ErrorKind::AlreadyExists,

            Self::InvalidTerminalId(_)
            | Self::InvalidTerminalKind(_)
            | Self::InvalidCommunicationKind(_) => ErrorKind::InvalidIdentifier,

            Self::TerminalBusy(_)
            | Self::NoOngoingCommunication(_)
            | Self::NotCommunicationOrigin(_)
            | Self::CommunicationAlreadyFinished(_)
            | Self::CommunicationNotFinished(_)
            | Self::CommunicationAlreadyPaid(_)
            | Self::CostOverflow(_)
            | Self::NotificationsAlreadyEnabled(_)
            | Self::NotificationsAlreadyDisabled(_)
            | Self::TariffPlanInUse(_)
            | Self::OriginOff(_)
            | Self::OriginBusy(_) => ErrorKind::InvalidState,

            Self::DestinationOff(_) | Self::DestinationBusy(_) | Self::DestinationSilent(_) => {
                ErrorKind::Unreachable
            }

            Self::UnsupportedAtOrigin { .. } | Self::UnsupportedAtDestination { .. } => {
                ErrorKind::CapabilityUnsupported
            }

            Self::UnrecognizedEntry { .. }
            | Self::InvalidTariffPlan { .. }
            | Self::InvalidClientField { .. } => ErrorKind::MalformedInput,
        }
    }

    /// Whether the failure came from an unreachable destination. Such failures
    /// still leave a missed-attempt record behind.
    pub fn is_unreachable(&self) -> bool {
        self.kind() == ErrorKind::Unreachable
    }

    pub(crate) fn bad_entry(line: &str, reason: impl ToString) -> Self {
        Self::UnrecognizedEntry { line: line.to_string(), reason: reason.to_string() }
    }
}

/// Lift a communication lifecycle violation.
impl From<LifecycleError> for NetworkError {
    fn from(err: LifecycleError) -> Self {
        match err {
            LifecycleError::AlreadyFinished(id) => Self::CommunicationAlreadyFinished(id.0),
            LifecycleError::NotFinished(id) => Self::CommunicationNotFinished(id.0),
            LifecycleError::AlreadyPaid(id) => Self::CommunicationAlreadyPaid(id.0),
            LifecycleError::CostOverflow(id) => Self::CostOverflow(id.0),
        }
    }
}
