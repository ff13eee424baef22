// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Telecom Network Engine - Terminals

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::communication::Communication;
use crate::error::{NetworkError, Result};
use crate::terminal_state::{Flush, TerminalState};
use crate::types::{ClientKey, CommunicationId, CommunicationKind, Credits, TerminalId};

// ─── TerminalKind ────────────────────────────────────────────────────────────

/// Hardware class; decides which media a terminal can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TerminalKind {
    /// Text and voice.
    Basic,
    /// Text, voice and video.
    Fancy,
}

impl TerminalKind {
    pub fn supports(&self, kind: CommunicationKind) -> bool {
        match kind {
            CommunicationKind::Text | CommunicationKind::Voice => true,
            CommunicationKind::Video => matches!(self, Self::Fancy),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Basic => "BASIC",
            Self::Fancy => "FANCY",
        }
    }
}

impl fmt::Display for TerminalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TerminalKind {
    type Err = NetworkError;
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "BASIC" => Ok(Self::Basic),
            "FANCY" => Ok(Self::Fancy),
            other => Err(NetworkError::InvalidTerminalKind(other.to_string())),
        }
    }
}

// ─── Terminal ────────────────────────────────────────────────────────────────

/// An addressable endpoint. Ledgers hold communication ids; the network owns
/// the communications themselves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Terminal {
    id: TerminalId,
    owner: ClientKey,
    kind: TerminalKind,
    friends: BTreeSet<TerminalId>,
    state: TerminalState,
    ongoing: Option<CommunicationId>,
    outbox: BTreeSet<CommunicationId>,
    inbox: BTreeSet<CommunicationId>,
}

impl Terminal {
    pub fn new(id: TerminalId, owner: ClientKey, kind: TerminalKind) -> Self {
        Self {
            id,
            owner,
            kind,
            friends: BTreeSet::new(),
            state: TerminalState::default(),
            ongoing: None,
            outbox: BTreeSet::new(),
            inbox: BTreeSet::new(),
        }
    }

    pub fn id(&self) -> &TerminalId {
        &self.id
    }

    pub fn owner(&self) -> &ClientKey {
        &self.owner
    }

    pub fn kind(&self) -> TerminalKind {
        self.kind
    }

    pub fn state(&self) -> &TerminalState {
        &self.state
    }

    pub fn supports(&self, kind: CommunicationKind) -> bool {
        self.kind.supports(kind)
    }

    pub fn is_idle(&self) -> bool {
        self.state.is_idle()
    }

    pub fn is_busy(&self) -> bool {
        self.state.is_busy()
    }

    pub fn is_silent(&self) -> bool {
        self.state.is_silent()
    }

    pub fn is_off(&self) -> bool {
        self.state.is_off()
    }

    pub fn can_start_communication(&self) -> bool {
        self.state.can_start_communication()
    }

    /// Only the terminal that placed the running call may hang it up.
    pub fn can_end_current_communication(&self, ongoing: Option<&Communication>) -> bool {
        self.state.is_busy() && ongoing.is_some_and(|comm| comm.origin() == &self.id)
    }

    pub fn ongoing_communication(&self) -> Option<CommunicationId> {
        self.ongoing
    }

    pub fn outbox(&self) -> impl Iterator<Item = CommunicationId> + '_ {
        self.outbox.iter().copied()
    }

    pub fn inbox(&self) -> impl Iterator<Item = CommunicationId> + '_ {
        self.inbox.iter().copied()
    }

    pub fn in_outbox(&self, id: CommunicationId) -> bool {
        self.outbox.contains(&id)
    }

    /// True while nothing was ever sent from or to this terminal.
    pub fn is_unused(&self) -> bool {
        self.outbox.is_empty() && self.inbox.is_empty()
    }

    // ─── Friends ─────────────────────────────────────────────────────────────

    pub fn friends(&self) -> impl Iterator<Item = &TerminalId> {
        self.friends.iter()
    }

    pub fn has_friends(&self) -> bool {
        !self.friends.is_empty()
    }

    pub fn is_friend(&self, other: &TerminalId) -> bool {
        self.friends.contains(other)
    }

    /// Link `friend` for discounted calls. Linking to itself is ignored.
    pub(crate) fn add_friend(&mut self, friend: TerminalId) -> Result<()> {
        if friend == self.id {
            return Ok(());
        }
        if self.friends.contains(&friend) {
            return Err(NetworkError::AlreadyFriends { terminal: self.id.to_string(), friend: friend.to_string() });
        }
        self.friends.insert(friend);
        Ok(())
    }

    /// Unlink `friend`. Any id not in the friend set, well-formed or not, is
    /// reported as [`NetworkError::FriendNotFound`].
    pub(crate) fn remove_friend(&mut self, friend: &str) -> Result<()> {
        let linked = self.friends.iter().find(|f| f.as_str() == friend).cloned();
        match linked {
            Some(id) => {
                self.friends.remove(&id);
                Ok(())
            }
            None => Err(NetworkError::FriendNotFound { terminal: self.id.to_string(), friend: friend.to_string() }),
        }
    }

    // ─── Power ───────────────────────────────────────────────────────────────

    pub(crate) fn turn_on(&mut self) -> Result<Vec<Flush>> {
        self.state.turn_on().map_err(|_| NetworkError::TerminalBusy(self.id.to_string()))
    }

    pub(crate) fn turn_off(&mut self) -> Result<Vec<Flush>> {
        self.state.turn_off().map_err(|_| NetworkError::TerminalBusy(self.id.to_string()))
    }

    pub(crate) fn silence(&mut self) -> Result<Vec<Flush>> {
        self.state.silence().map_err(|_| NetworkError::TerminalBusy(self.id.to_string()))
    }

    // ─── Communication events ────────────────────────────────────────────────

    /// File `comm` under the ledger(s) this terminal takes part in. Returns
    /// false if it was already filed.
    fn file(&mut self, comm: &Communication) -> bool {
        let sent = comm.origin() == &self.id && self.outbox.insert(comm.id());
        let received = comm.destination() == &self.id && self.inbox.insert(comm.id());
        sent || received
    }

    pub(crate) fn on_text(&mut self, comm: &Communication) {
        self.file(comm);
    }

    pub(crate) fn on_start_interactive(&mut self, comm: &Communication) {
        if !self.file(comm) {
            return;
        }
        self.ongoing = Some(comm.id());
        self.state.on_start_interactive();
    }

    /// Leave the busy state if `comm` is the call in progress and it has
    /// finished.
    pub(crate) fn on_end_interactive(&mut self, comm: &Communication) -> Vec<Flush> {
        if self.ongoing != Some(comm.id()) || !comm.is_finished() {
            return Vec::new();
        }
        self.ongoing = None;
        self.state.on_end_interactive()
    }

    pub(crate) fn on_text_attempt(&mut self, from: &ClientKey) {
        self.state.on_text_attempt(from);
    }

    pub(crate) fn on_interactive_attempt(&mut self, from: &ClientKey) {
        self.state.on_interactive_attempt(from);
    }

    // ─── Credits ─────────────────────────────────────────────────────────────

    fn sent<'a>(&'a self, log: &'a [Communication]) -> impl Iterator<Item = &'a Communication> + 'a {
        self.outbox.iter().filter_map(|id| id.index().and_then(|i| log.get(i)))
    }

    /// Paid cost of everything this terminal sent.
    pub fn payments(&self, log: &[Communication]) -> Credits {
        self.sent(log).filter(|c| c.is_paid()).map(Communication::cost).sum()
    }

    /// Unpaid cost of everything this terminal sent.
    pub fn debts(&self, log: &[Communication]) -> Credits {
        self.sent(log).filter(|c| !c.is_paid()).map(Communication::cost).sum()
    }

    pub fn balance(&self, log: &[Communication]) -> Credits {
        self.payments(log) - self.debts(log)
    }

    /// `KIND|id|owner|STATE|paid|debt[|friend,friend]`
    pub fn describe(&self, log: &[Communication]) -> String {
        let mut line = format!(
            "{}|{}|{}|{}|{}|{}",
            self.kind,
            self.id,
            self.owner,
            self.state.label(),
            self.payments(log),
            self.debts(log),
        );
        if self.has_friends() {
            let friends: Vec<&str> = self.friends.iter().map(TerminalId::as_str).collect();
            line.push('|');
            line.push_str(&friends.join(","));
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tariff::TariffPlan;
    use crate::types::TierLabel;

    fn tid(s: &str) -> TerminalId {
        TerminalId::parse(s).expect("test: valid id")
    }

    fn terminal(id: &str, kind: TerminalKind) -> Terminal {
        Terminal::new(tid(id), ClientKey::from("owner"), kind)
    }

    #[test]
    fn test_capabilities_follow_kind() {
        assert!(TerminalKind::Basic.supports(CommunicationKind::Voice));
        assert!(TerminalKind::Basic.supports(CommunicationKind::Text));
        assert!(!TerminalKind::Basic.supports(CommunicationKind::Video));
        assert!(TerminalKind::Fancy.supports(CommunicationKind::Video));
        assert!("SMART".parse::<TerminalKind>().is_err());
    }

    #[test]
    fn test_friends_are_a_set_without_self() {
        let mut t = terminal("100001", TerminalKind::Basic);
        t.add_friend(tid("100001")).expect("test: self link ignored");
        assert!(!t.has_friends());

        t.add_friend(tid("100002")).expect("test: first link");
        let err = t.add_friend(tid("100002")).expect_err("test: duplicate link");
        assert!(matches!(err, NetworkError::AlreadyFriends { .. }));

        t.remove_friend("100002").expect("test: remove link");
        let err = t.remove_friend("100002").expect_err("test: already removed");
        assert!(matches!(err, NetworkError::FriendNotFound { .. }));
    }

    #[test]
    fn test_busy_iff_ongoing() {
        let mut a = terminal("100001", TerminalKind::Fancy);
        let mut b = terminal("100002", TerminalKind::Fancy);
        let mut call = Communication::interactive(CommunicationId(1), CommunicationKind::Video, tid("100001"), tid("100002"));

        a.on_start_interactive(&call);
        b.on_start_interactive(&call);
        assert!(a.is_busy() && a.ongoing_communication().is_some());
        assert!(b.is_busy() && b.ongoing_communication().is_some());
        assert!(a.can_end_current_communication(Some(&call)));
        assert!(!b.can_end_current_communication(Some(&call)));

        // An unfinished call does not release the terminals.
        assert!(a.on_end_interactive(&call).is_empty());
        assert!(a.is_busy());

        call.finish(2, &TariffPlan::default(), TierLabel::Normal, false).expect("test: finish once");
        a.on_end_interactive(&call);
        b.on_end_interactive(&call);
        assert!(!a.is_busy() && a.ongoing_communication().is_none());
        assert!(!b.is_busy() && b.ongoing_communication().is_none());
        assert_eq!(a.outbox().collect::<Vec<_>>(), vec![CommunicationId(1)]);
        assert_eq!(b.inbox().collect::<Vec<_>>(), vec![CommunicationId(1)]);
    }

    #[test]
    fn test_balance_counts_only_sent() {
        let plan = TariffPlan::default();
        let mut a = terminal("100001", TerminalKind::Basic);
        let mut b = terminal("100002", TerminalKind::Basic);
        let mut log = vec![
            Communication::text(CommunicationId(1), tid("100001"), tid("100002"), "hello".into(), &plan, TierLabel::Normal)
                .expect("test: priced"),
            Communication::text(CommunicationId(2), tid("100002"), tid("100001"), "hey".into(), &plan, TierLabel::Normal)
                .expect("test: priced"),
        ];
        for comm in &log {
            a.on_text(comm);
            b.on_text(comm);
        }
        log[0].pay().expect("test: pay once");

        assert_eq!(a.payments(&log), Credits::from_decimal(10.into()));
        assert!(a.debts(&log).is_zero());
        assert!(a.balance(&log).is_positive());
        assert!(b.balance(&log).is_negative());
        assert!(!a.is_unused());
    }

    #[test]
    fn test_describe_lists_friends_last() {
        let mut t = terminal("100001", TerminalKind::Fancy);
        assert_eq!(t.describe(&[]), "FANCY|100001|owner|IDLE|0|0");
        t.add_friend(tid("100003")).expect("test: link");
        t.add_friend(tid("100002")).expect("test: link");
        t.turn_off().expect("test: idle terminal powers down");
        assert_eq!(t.describe(&[]), "FANCY|100001|owner|OFF|0|0|100002,100003");
    }
}
