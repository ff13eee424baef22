// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Telecom Network Engine - Notifications

//! Notifications sent to clients whose contact attempt missed a terminal.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{ClientKey, TerminalId};

/// Which recovery transition produced the notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NotificationKind {
    /// Off -> Idle.
    OffToIdle,
    /// Off -> Silent.
    OffToSilent,
    /// Silent -> Idle.
    SilentToIdle,
    /// Busy -> Idle.
    BusyToIdle,
}

impl NotificationKind {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::OffToIdle => "O2I",
            Self::OffToSilent => "O2S",
            Self::SilentToIdle => "S2I",
            Self::BusyToIdle => "B2I",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Immutable notice that `terminal` became reachable again.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub terminal: TerminalId,
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.kind, self.terminal)
    }
}

/// Where a client's notifications go.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryChannel {
    /// Buffered until the client drains them.
    #[default]
    InApp,
    /// Forwarded to the installed `tracing` subscriber, never buffered.
    Trace,
}

impl DeliveryChannel {
    /// Deliver `notification` to `recipient`, buffering in `inbox` if this
    /// channel keeps notifications.
    pub(crate) fn deliver(&self, recipient: &ClientKey, notification: Notification, inbox: &mut Vec<Notification>) {
        match self {
            Self::InApp => inbox.push(notification),
            Self::Trace => tracing::info!(
                client = %recipient,
                kind = notification.kind.tag(),
                terminal = %notification.terminal,
                "notification delivered"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notification() -> Notification {
        Notification {
            kind: NotificationKind::OffToSilent,
            terminal: TerminalId::parse("123456").expect("test: valid id"),
        }
    }

    #[test]
    fn test_renders_tag_and_terminal() {
        assert_eq!(notification().to_string(), "O2S|123456");
        assert_eq!(NotificationKind::BusyToIdle.to_string(), "B2I");
    }

    #[test]
    fn test_in_app_buffers_and_trace_does_not() {
        let who = ClientKey::from("alice");
        let mut inbox = Vec::new();
        DeliveryChannel::InApp.deliver(&who, notification(), &mut inbox);
        DeliveryChannel::Trace.deliver(&who, notification(), &mut inbox);
        assert_eq!(inbox, vec![notification()]);
    }
}
