// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Telecom Network Engine - Network Orchestrator

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, trace};
use wasm_bindgen::prelude::*;

use crate::client::Client;
use crate::communication::Communication;
use crate::error::{NetworkError, Result};
use crate::loyalty::LoyaltyPolicy;
use crate::notification::{DeliveryChannel, Notification};
use crate::tariff::TariffPlan;
use crate::terminal::{Terminal, TerminalKind};
use crate::terminal_state::Flush;
use crate::types::{ClientKey, CommunicationId, CommunicationKind, Credits, TerminalId, TierLabel};

// ─── Configuration ───────────────────────────────────────────────────────────

/// Construction-time settings of a [`Network`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub policy: LoyaltyPolicy,
    /// Plan assigned to newly registered clients.
    pub default_plan: String,
    /// Extra named plans registered next to the built-in one.
    pub plans: BTreeMap<String, TariffPlan>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            policy: LoyaltyPolicy::default(),
            default_plan: TariffPlan::BASE.to_string(),
            plans: BTreeMap::new(),
        }
    }
}

// ─── Network ─────────────────────────────────────────────────────────────────

/// Owns every client, terminal and communication and sequences the
/// transitions between them. Commands validate everything before touching
/// any state, so a failed command leaves the network as it was. The one
/// exception is an unreachable destination, which keeps a record of the
/// missed attempt.
#[wasm_bindgen]
#[derive(Debug, Clone)]
pub struct Network {
    pub(crate) config: NetworkConfig,
    pub(crate) plans: BTreeMap<String, TariffPlan>,
    pub(crate) clients: BTreeMap<ClientKey, Client>,
    pub(crate) terminals: BTreeMap<TerminalId, Terminal>,
    /// Canonical list; the communication with id `n` sits at index `n - 1`.
    pub(crate) communications: Vec<Communication>,
    pub(crate) changed: bool,
}

impl Default for Network {
    fn default() -> Self {
        Self::new()
    }
}

impl Network {
    pub fn new() -> Self {
        let mut plans = BTreeMap::new();
        plans.insert(TariffPlan::BASE.to_string(), TariffPlan::default());
        Self {
            config: NetworkConfig::default(),
            plans,
            clients: BTreeMap::new(),
            terminals: BTreeMap::new(),
            communications: Vec::new(),
            changed: false,
        }
    }

    /// Build a network with a custom policy and plan set. Fails if the
    /// default plan is not among the registered ones.
    pub fn with_config(config: NetworkConfig) -> Result<Self> {
        for (name, plan) in &config.plans {
            Self::check_plan(name, plan)?;
        }
        let mut network = Self::new();
        network.plans.extend(config.plans.clone());
        if !network.plans.contains_key(&config.default_plan) {
            return Err(NetworkError::TariffPlanNotFound(config.default_plan));
        }
        network.config = config;
        Ok(network)
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    /// True if anything changed since construction or the last
    /// [`mark_saved`](Self::mark_saved).
    pub fn is_changed(&self) -> bool {
        self.changed
    }

    pub fn mark_saved(&mut self) {
        self.changed = false;
    }

    fn touch(&mut self) {
        self.changed = true;
    }

    // ─── Lookups ─────────────────────────────────────────────────────────────

    pub fn client(&self, key: &str) -> Result<&Client> {
        self.clients.get(&ClientKey::from(key)).ok_or_else(|| NetworkError::ClientNotFound(key.to_string()))
    }

    fn client_mut(&mut self, key: &str) -> Result<&mut Client> {
        self.clients.get_mut(&ClientKey::from(key)).ok_or_else(|| NetworkError::ClientNotFound(key.to_string()))
    }

    pub fn terminal(&self, id: &str) -> Result<&Terminal> {
        let tid = TerminalId::parse(id)?;
        self.terminals.get(&tid).ok_or_else(|| NetworkError::TerminalNotFound(id.to_string()))
    }

    fn terminal_mut(&mut self, id: &str) -> Result<&mut Terminal> {
        let tid = TerminalId::parse(id)?;
        self.terminals.get_mut(&tid).ok_or_else(|| NetworkError::TerminalNotFound(id.to_string()))
    }

    pub fn communication(&self, id: u32) -> Result<&Communication> {
        CommunicationId(id)
            .index()
            .and_then(|i| self.communications.get(i))
            .ok_or(NetworkError::CommunicationNotFound(id))
    }

    /// Clients ordered by key.
    pub fn clients(&self) -> impl Iterator<Item = &Client> {
        self.clients.values()
    }

    /// Terminals ordered by id.
    pub fn terminals(&self) -> impl Iterator<Item = &Terminal> {
        self.terminals.values()
    }

    /// Every communication, ordered by id.
    pub fn communications(&self) -> &[Communication] {
        &self.communications
    }

    fn next_communication_id(&self) -> CommunicationId {
        CommunicationId(u32::try_from(self.communications.len()).unwrap_or(u32::MAX).saturating_add(1))
    }

    // ─── Registration ────────────────────────────────────────────────────────

    /// Keys and names end up as `|`-separated export fields, so neither may
    /// contain the separator or a line break.
    pub fn register_client(&mut self, key: &str, name: &str, tax_id: u32) -> Result<()> {
        for (field, value) in [("key", key), ("name", name)] {
            if value.contains(['|', '\n', '\r']) {
                return Err(NetworkError::InvalidClientField { field, value: value.to_string() });
            }
        }
        let key = ClientKey::from(key);
        if self.clients.contains_key(&key) {
            return Err(NetworkError::ClientExists(key.to_string()));
        }
        debug!(client = %key, "client registered");
        let client = Client::new(key.clone(), name, tax_id, self.config.default_plan.clone());
        self.clients.insert(key, client);
        self.touch();
        Ok(())
    }

    pub fn register_terminal(&mut self, id: &str, kind: TerminalKind, owner: &str) -> Result<()> {
        let tid = TerminalId::parse(id)?;
        if self.terminals.contains_key(&tid) {
            return Err(NetworkError::TerminalExists(id.to_string()));
        }
        let client = self.client_mut(owner)?;
        client.add_terminal(tid.clone());
        let owner = client.key().clone();
        debug!(terminal = %tid, %kind, client = %owner, "terminal registered");
        self.terminals.insert(tid.clone(), Terminal::new(tid, owner, kind));
        self.touch();
        Ok(())
    }

    // ─── Friends ─────────────────────────────────────────────────────────────

    pub fn add_friend(&mut self, terminal: &str, friend: &str) -> Result<()> {
        self.terminal(terminal)?;
        let friend_id = self.terminal(friend)?.id().clone();
        self.terminal_mut(terminal)?.add_friend(friend_id)?;
        debug!(terminal, friend, "friend added");
        self.touch();
        Ok(())
    }

    pub fn remove_friend(&mut self, terminal: &str, friend: &str) -> Result<()> {
        self.terminal_mut(terminal)?.remove_friend(friend)?;
        debug!(terminal, friend, "friend removed");
        self.touch();
        Ok(())
    }

    // ─── Power ───────────────────────────────────────────────────────────────

    pub fn turn_on(&mut self, terminal: &str) -> Result<()> {
        let flushes = self.terminal_mut(terminal)?.turn_on()?;
        debug!(terminal, "terminal on");
        self.settle(terminal, flushes)
    }

    pub fn turn_off(&mut self, terminal: &str) -> Result<()> {
        let flushes = self.terminal_mut(terminal)?.turn_off()?;
        debug!(terminal, "terminal off");
        self.settle(terminal, flushes)
    }

    pub fn silence(&mut self, terminal: &str) -> Result<()> {
        let flushes = self.terminal_mut(terminal)?.silence()?;
        debug!(terminal, "terminal silenced");
        self.settle(terminal, flushes)
    }

    fn settle(&mut self, terminal: &str, flushes: Vec<Flush>) -> Result<()> {
        let tid = TerminalId::parse(terminal)?;
        self.deliver(&tid, flushes);
        self.touch();
        Ok(())
    }

    /// Hand each owed notification to its recipient's channel.
    fn deliver(&mut self, terminal: &TerminalId, flushes: Vec<Flush>) {
        for Flush { kind, recipients } in flushes {
            for recipient in recipients {
                let Some(client) = self.clients.get_mut(&recipient) else {
                    continue;
                };
                debug!(client = %recipient, %terminal, kind = kind.tag(), "notification sent");
                client.notify(Notification { kind, terminal: terminal.clone() });
            }
        }
    }

    // ─── Notifications ───────────────────────────────────────────────────────

    pub fn enable_notifications(&mut self, client: &str) -> Result<()> {
        self.client_mut(client)?.enable_notifications()?;
        self.touch();
        Ok(())
    }

    pub fn disable_notifications(&mut self, client: &str) -> Result<()> {
        self.client_mut(client)?.disable_notifications()?;
        self.touch();
        Ok(())
    }

    pub fn set_delivery_channel(&mut self, client: &str, channel: DeliveryChannel) -> Result<()> {
        self.client_mut(client)?.set_channel(channel);
        Ok(())
    }

    /// Drain and return the client's buffered notifications.
    pub fn read_notifications(&mut self, client: &str) -> Result<Vec<Notification>> {
        Ok(self.client_mut(client)?.read_notifications())
    }

    /// Remember that `attempter` could not reach `target`. Only clients who
    /// want notifications are remembered.
    fn record_attempt(&mut self, target: &TerminalId, attempter: &ClientKey, kind: CommunicationKind) {
        let wants_notice = self.clients.get(attempter).is_some_and(Client::notifications_enabled);
        let Some(terminal) = self.terminals.get_mut(target) else {
            return;
        };
        if !wants_notice {
            return;
        }
        trace!(terminal = %target, client = %attempter, %kind, "missed attempt recorded");
        if kind.is_interactive() {
            terminal.on_interactive_attempt(attempter);
        } else {
            terminal.on_text_attempt(attempter);
        }
        self.changed = true;
    }

    // ─── Communications ──────────────────────────────────────────────────────

    /// Plan, tier and friendliness that price a communication from `origin`
    /// to `destination`.
    fn pricing(&self, origin: &Terminal, destination: &TerminalId) -> Result<(&TariffPlan, TierLabel, bool)> {
        let owner = self
            .clients
            .get(origin.owner())
            .ok_or_else(|| NetworkError::ClientNotFound(origin.owner().to_string()))?;
        let plan = self
            .plans
            .get(owner.tariff_plan())
            .ok_or_else(|| NetworkError::TariffPlanNotFound(owner.tariff_plan().to_string()))?;
        Ok((plan, owner.tier_label(), origin.is_friend(destination)))
    }

    fn check_origin(origin: &Terminal) -> Result<()> {
        if origin.can_start_communication() {
            Ok(())
        } else if origin.is_off() {
            Err(NetworkError::OriginOff(origin.id().to_string()))
        } else {
            Err(NetworkError::OriginBusy(origin.id().to_string()))
        }
    }

    /// Send a text. It is priced and finished immediately.
    pub fn send_text(&mut self, origin: &str, destination: &str, message: &str) -> Result<CommunicationId> {
        let from = self.terminal(origin)?;
        let to = self.terminal(destination)?;
        Self::check_origin(from)?;
        let (from_id, to_id) = (from.id().clone(), to.id().clone());
        if to.is_off() {
            let attempter = from.owner().clone();
            self.record_attempt(&to_id, &attempter, CommunicationKind::Text);
            return Err(NetworkError::DestinationOff(destination.to_string()));
        }

        let (plan, tier, _) = self.pricing(from, &to_id)?;
        let id = self.next_communication_id();
        let comm = Communication::text(id, from_id.clone(), to_id.clone(), message.to_string(), plan, tier)?;
        let (from_owner, to_owner) = (from.owner().clone(), to.owner().clone());
        debug!(%id, origin, destination, units = comm.units(), cost = %comm.cost(), "text sent");
        self.communications.push(comm);

        let comm = &self.communications[self.communications.len() - 1];
        if let Some(t) = self.terminals.get_mut(&to_id) {
            t.on_text(comm);
        }
        if let Some(t) = self.terminals.get_mut(&from_id) {
            t.on_text(comm);
        }
        if let Some(c) = self.clients.get_mut(&from_owner) {
            c.on_finished_as_origin(comm, &self.communications, &self.config.policy);
            debug!(client = %from_owner, tier = %c.tier_label(), "tier evaluated");
        }
        trace!(client = %to_owner, %id, "text received");
        self.touch();
        Ok(id)
    }

    /// Open a voice or video call. Both terminals stay busy until the origin
    /// calls [`end_interactive`](Self::end_interactive).
    pub fn start_interactive(&mut self, origin: &str, destination: &str, kind: CommunicationKind) -> Result<CommunicationId> {
        if !kind.is_interactive() {
            return Err(NetworkError::InvalidCommunicationKind(kind.to_string()));
        }
        let from = self.terminal(origin)?;
        let to = self.terminal(destination)?;
        if !from.supports(kind) {
            return Err(NetworkError::UnsupportedAtOrigin { terminal: origin.to_string(), kind: kind.to_string() });
        }
        if !to.supports(kind) {
            return Err(NetworkError::UnsupportedAtDestination {
                terminal: destination.to_string(),
                kind: kind.to_string(),
            });
        }
        if from.id() == to.id() {
            return Err(NetworkError::DestinationBusy(destination.to_string()));
        }
        Self::check_origin(from)?;
        if !to.is_idle() {
            let refusal = if to.is_off() {
                NetworkError::DestinationOff(destination.to_string())
            } else if to.is_busy() {
                NetworkError::DestinationBusy(destination.to_string())
            } else {
                NetworkError::DestinationSilent(destination.to_string())
            };
            let (attempter, target) = (from.owner().clone(), to.id().clone());
            self.record_attempt(&target, &attempter, kind);
            return Err(refusal);
        }

        let id = self.next_communication_id();
        let (from_id, to_id) = (from.id().clone(), to.id().clone());
        let owners = [from.owner().clone(), to.owner().clone()];
        debug!(%id, %kind, origin, destination, "call started");
        self.communications.push(Communication::interactive(id, kind, from_id.clone(), to_id.clone()));

        let comm = &self.communications[self.communications.len() - 1];
        for tid in [&from_id, &to_id] {
            if let Some(t) = self.terminals.get_mut(tid) {
                t.on_start_interactive(comm);
            }
        }
        for owner in &owners {
            if let Some(c) = self.clients.get_mut(owner) {
                c.on_start_interactive(id);
            }
        }
        self.touch();
        Ok(id)
    }

    /// Hang up the call `terminal` placed, after `duration` units. Returns the
    /// frozen cost.
    pub fn end_interactive(&mut self, terminal: &str, duration: u32) -> Result<Credits> {
        let origin = self.terminal(terminal)?;
        let ongoing = origin
            .ongoing_communication()
            .and_then(|id| id.index())
            .and_then(|i| self.communications.get(i))
            .filter(|_| origin.is_busy())
            .ok_or_else(|| NetworkError::NoOngoingCommunication(terminal.to_string()))?;
        if !origin.can_end_current_communication(Some(ongoing)) {
            return Err(NetworkError::NotCommunicationOrigin(terminal.to_string()));
        }
        let (id, to_id) = (ongoing.id(), ongoing.destination().clone());
        let (plan, tier, friendly) = self.pricing(origin, &to_id)?;
        let plan = plan.clone();
        let from_id = origin.id().clone();
        let from_owner = origin.owner().clone();
        let to_owner = self.terminals.get(&to_id).map(|t| t.owner().clone());

        let index = id.index().ok_or(NetworkError::CommunicationNotFound(id.0))?;
        let cost = self.communications[index].finish(duration, &plan, tier, friendly)?;
        debug!(%id, terminal, duration, %cost, friendly, "call ended");

        for tid in [&from_id, &to_id] {
            let comm = &self.communications[index];
            let flushes = self.terminals.get_mut(tid).map(|t| t.on_end_interactive(comm)).unwrap_or_default();
            self.deliver(tid, flushes);
        }
        let comm = &self.communications[index];
        if let Some(c) = self.clients.get_mut(&from_owner) {
            c.on_finished_as_origin(comm, &self.communications, &self.config.policy);
            debug!(client = %from_owner, tier = %c.tier_label(), "tier evaluated");
        }
        if let Some(c) = to_owner.and_then(|owner| self.clients.get_mut(&owner)) {
            c.on_finished_as_destination(id);
        }
        self.touch();
        Ok(cost)
    }

    /// Pay communication `id`, which must have been sent from `terminal`.
    pub fn perform_payment(&mut self, terminal: &str, id: u32) -> Result<()> {
        let comm_id = CommunicationId(id);
        let origin = self.terminal(terminal)?;
        if !origin.in_outbox(comm_id) {
            return Err(NetworkError::CommunicationNotFound(id));
        }
        let owner = origin.owner().clone();
        let index = comm_id.index().ok_or(NetworkError::CommunicationNotFound(id))?;
        let comm = self.communications.get_mut(index).ok_or(NetworkError::CommunicationNotFound(id))?;
        comm.pay()?;
        debug!(%comm_id, terminal, cost = %comm.cost(), "communication paid");
        if let Some(c) = self.clients.get_mut(&owner) {
            c.on_payment(comm_id, &self.communications, &self.config.policy);
            debug!(client = %owner, tier = %c.tier_label(), "tier evaluated");
        }
        self.touch();
        Ok(())
    }

    // ─── Tariff plans ────────────────────────────────────────────────────────

    pub fn tariff_plan(&self, name: &str) -> Result<&TariffPlan> {
        self.plans.get(name).ok_or_else(|| NetworkError::TariffPlanNotFound(name.to_string()))
    }

    pub fn tariff_plan_names(&self) -> impl Iterator<Item = &str> {
        self.plans.keys().map(String::as_str)
    }

    pub fn add_tariff_plan(&mut self, name: &str, plan: TariffPlan) -> Result<()> {
        if self.plans.contains_key(name) {
            return Err(NetworkError::TariffPlanExists(name.to_string()));
        }
        Self::check_plan(name, &plan)?;
        debug!(plan = name, "tariff plan added");
        self.plans.insert(name.to_string(), plan);
        self.touch();
        Ok(())
    }

    fn check_plan(name: &str, plan: &TariffPlan) -> Result<()> {
        plan.validate()
            .map_err(|err| NetworkError::InvalidTariffPlan { name: name.to_string(), reason: err.to_string() })
    }

    /// Drop a plan nobody uses. The default plan always counts as in use.
    pub fn remove_tariff_plan(&mut self, name: &str) -> Result<()> {
        if !self.plans.contains_key(name) {
            return Err(NetworkError::TariffPlanNotFound(name.to_string()));
        }
        if name == self.config.default_plan || self.clients.values().any(|c| c.tariff_plan() == name) {
            return Err(NetworkError::TariffPlanInUse(name.to_string()));
        }
        debug!(plan = name, "tariff plan removed");
        self.plans.remove(name);
        self.touch();
        Ok(())
    }

    /// Switch the plan that prices a client's future communications.
    pub fn set_client_tariff_plan(&mut self, client: &str, plan: &str) -> Result<()> {
        if !self.plans.contains_key(plan) {
            return Err(NetworkError::TariffPlanNotFound(plan.to_string()));
        }
        self.client_mut(client)?.set_tariff_plan(plan);
        debug!(client, plan, "tariff plan assigned");
        self.touch();
        Ok(())
    }

    // ─── Balances ────────────────────────────────────────────────────────────

    pub fn client_balance(&self, client: &str) -> Result<Credits> {
        Ok(self.client(client)?.balance(&self.communications))
    }

    pub fn terminal_balance(&self, terminal: &str) -> Result<Credits> {
        Ok(self.terminal(terminal)?.balance(&self.communications))
    }

    pub fn global_payments(&self) -> Credits {
        self.clients.values().map(|c| c.payments(&self.communications)).sum()
    }

    pub fn global_debts(&self) -> Credits {
        self.clients.values().map(|c| c.debts(&self.communications)).sum()
    }

    pub fn global_balance(&self) -> Credits {
        self.global_payments() - self.global_debts()
    }

    // ─── Views ───────────────────────────────────────────────────────────────

    /// Clients owing anything, largest debt first.
    pub fn clients_with_debts(&self) -> Vec<&Client> {
        let mut owing: Vec<(&Client, Credits)> = self
            .clients
            .values()
            .map(|c| (c, c.debts(&self.communications)))
            .filter(|(_, debt)| debt.is_positive())
            .collect();
        owing.sort_by(|a, b| b.1.cmp(&a.1));
        owing.into_iter().map(|(c, _)| c).collect()
    }

    pub fn clients_without_debts(&self) -> Vec<&Client> {
        self.clients.values().filter(|c| c.debts(&self.communications).is_zero()).collect()
    }

    /// Terminals that never sent nor received anything.
    pub fn unused_terminals(&self) -> Vec<&Terminal> {
        self.terminals.values().filter(|t| t.is_unused()).collect()
    }

    pub fn terminals_with_positive_balance(&self) -> Vec<&Terminal> {
        self.terminals.values().filter(|t| t.balance(&self.communications).is_positive()).collect()
    }

    fn collect_client_ledger<'a, I>(&'a self, client: &str, ledger: impl Fn(&'a Terminal) -> I) -> Result<Vec<&'a Communication>>
    where
        I: Iterator<Item = CommunicationId>,
    {
        let ids: BTreeSet<CommunicationId> = self
            .client(client)?
            .terminals()
            .filter_map(|tid| self.terminals.get(tid))
            .flat_map(ledger)
            .collect();
        Ok(ids.into_iter().filter_map(|id| id.index().and_then(|i| self.communications.get(i))).collect())
    }

    /// Everything sent from any of the client's terminals, ordered by id.
    pub fn communications_from_client(&self, client: &str) -> Result<Vec<&Communication>> {
        self.collect_client_ledger(client, |t| t.outbox())
    }

    /// Everything received by any of the client's terminals, ordered by id.
    pub fn communications_to_client(&self, client: &str) -> Result<Vec<&Communication>> {
        self.collect_client_ledger(client, |t| t.inbox())
    }

    // ─── Display ─────────────────────────────────────────────────────────────

    pub fn describe_client(&self, client: &str) -> Result<String> {
        Ok(self.client(client)?.describe(&self.communications))
    }

    pub fn describe_terminal(&self, terminal: &str) -> Result<String> {
        Ok(self.terminal(terminal)?.describe(&self.communications))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::notification::NotificationKind;
    use rust_decimal_macros::dec;

    /// alice: 111111 (FANCY), 111112 (BASIC); bob: 222222 (FANCY).
    fn network() -> Network {
        let mut n = Network::new();
        n.register_client("alice", "Alice", 100).expect("test: alice");
        n.register_client("bob", "Bob", 200).expect("test: bob");
        n.register_terminal("111111", TerminalKind::Fancy, "alice").expect("test: t1");
        n.register_terminal("111112", TerminalKind::Basic, "alice").expect("test: t2");
        n.register_terminal("222222", TerminalKind::Fancy, "bob").expect("test: t3");
        n
    }

    #[test]
    fn test_registration_rejects_duplicates_and_bad_ids() {
        let mut n = network();
        assert_eq!(n.register_client("ALICE", "x", 1), Err(NetworkError::ClientExists("ALICE".into())));
        assert!(matches!(n.register_terminal("111111", TerminalKind::Basic, "bob"), Err(NetworkError::TerminalExists(_))));
        assert!(matches!(n.register_terminal("11111", TerminalKind::Basic, "bob"), Err(NetworkError::InvalidTerminalId(_))));
        assert!(matches!(n.register_terminal("333333", TerminalKind::Basic, "carol"), Err(NetworkError::ClientNotFound(_))));
        assert_eq!(n.client("Bob").expect("test: bob").terminal_count(), 1);
        assert!(n.is_changed());
    }

    #[test]
    fn test_text_costs_and_ledgers() {
        let mut n = network();
        let id = n.send_text("111111", "222222", &"a".repeat(40)).expect("test: send");
        assert_eq!(id, CommunicationId(1));
        let comm = n.communication(1).expect("test: stored");
        assert!(comm.is_finished());
        assert_eq!(comm.cost(), Credits(dec!(10)));
        assert_eq!(n.client_balance("alice"), Ok(Credits(dec!(-10))));
        assert_eq!(n.terminal("222222").expect("test: t3").inbox().count(), 1);
        assert_eq!(n.clients_with_debts().len(), 1);
    }

    #[test]
    fn test_text_to_off_terminal_is_refused_and_remembered() {
        let mut n = network();
        n.turn_off("222222").expect("test: off");
        let err = n.send_text("111111", "222222", "hello").expect_err("test: refused");
        assert_eq!(err, NetworkError::DestinationOff("222222".into()));
        assert!(n.communications().is_empty());
        assert!(n.terminal("111111").expect("test: t1").is_unused());

        n.turn_on("222222").expect("test: on");
        let notes = n.read_notifications("alice").expect("test: alice");
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].kind, NotificationKind::OffToIdle);
        assert_eq!(notes[0].terminal.as_str(), "222222");
    }

    #[test]
    fn test_attempts_are_not_recorded_for_silent_attempters() {
        let mut n = network();
        n.disable_notifications("alice").expect("test: disable");
        n.turn_off("222222").expect("test: off");
        assert!(n.start_interactive("111111", "222222", CommunicationKind::Voice).is_err());
        n.turn_on("222222").expect("test: on");
        assert!(n.read_notifications("alice").expect("test: alice").is_empty());
    }

    #[test]
    fn test_origin_checks_come_first() {
        let mut n = network();
        n.turn_off("111111").expect("test: off");
        assert_eq!(n.send_text("111111", "222222", "x"), Err(NetworkError::OriginOff("111111".into())));
        assert_eq!(
            n.start_interactive("111112", "222222", CommunicationKind::Video),
            Err(NetworkError::UnsupportedAtOrigin { terminal: "111112".into(), kind: "VIDEO".into() })
        );
        assert_eq!(
            n.start_interactive("222222", "222222", CommunicationKind::Voice),
            Err(NetworkError::DestinationBusy("222222".into()))
        );
        assert_eq!(
            n.start_interactive("222222", "111112", CommunicationKind::Video),
            Err(NetworkError::UnsupportedAtDestination { terminal: "111112".into(), kind: "VIDEO".into() })
        );
    }

    #[test]
    fn test_call_lifecycle_and_payment() {
        let mut n = network();
        n.add_friend("111111", "222222").expect("test: friend");
        let id = n.start_interactive("111111", "222222", CommunicationKind::Video).expect("test: start");
        assert!(n.terminal("111111").expect("test: t1").is_busy());
        assert!(n.terminal("222222").expect("test: t3").is_busy());
        assert_eq!(n.turn_off("111111"), Err(NetworkError::TerminalBusy("111111".into())));
        assert_eq!(n.perform_payment("111111", id.0), Err(NetworkError::CommunicationNotFinished(1)));

        assert_eq!(n.end_interactive("222222", 4), Err(NetworkError::NotCommunicationOrigin("222222".into())));
        let cost = n.end_interactive("111111", 4).expect("test: end");
        assert_eq!(cost, Credits(dec!(60)));
        assert!(n.terminal("111111").expect("test: t1").is_idle());
        assert!(n.terminal("222222").expect("test: t3").is_idle());
        assert_eq!(n.end_interactive("111111", 4), Err(NetworkError::NoOngoingCommunication("111111".into())));

        assert_eq!(n.perform_payment("222222", id.0), Err(NetworkError::CommunicationNotFound(1)));
        n.perform_payment("111111", id.0).expect("test: pay");
        assert_eq!(n.perform_payment("111111", id.0), Err(NetworkError::CommunicationAlreadyPaid(1)));
        assert_eq!(n.client_balance("alice"), Ok(Credits(dec!(60))));
        assert_eq!(n.global_balance(), Credits(dec!(60)));
        assert_eq!(n.terminals_with_positive_balance().len(), 1);
    }

    #[test]
    fn test_busy_destination_notifies_when_call_ends() {
        let mut n = network();
        n.register_client("carol", "Carol", 300).expect("test: carol");
        n.register_terminal("333333", TerminalKind::Basic, "carol").expect("test: t4");
        n.start_interactive("111111", "222222", CommunicationKind::Voice).expect("test: start");
        assert_eq!(
            n.send_text("333333", "222222", "hey").map(|id| id.0),
            Ok(2),
            "texts still reach busy terminals"
        );
        assert_eq!(
            n.start_interactive("333333", "222222", CommunicationKind::Voice),
            Err(NetworkError::DestinationBusy("222222".into()))
        );
        n.end_interactive("111111", 1).expect("test: end");
        let notes = n.read_notifications("carol").expect("test: carol");
        assert_eq!(notes.iter().map(ToString::to_string).collect::<Vec<_>>(), vec!["B2I|222222"]);
    }

    #[test]
    fn test_silent_destination_resumes_silence_after_call() {
        let mut n = network();
        n.silence("222222").expect("test: silence");
        assert_eq!(
            n.start_interactive("111111", "222222", CommunicationKind::Voice),
            Err(NetworkError::DestinationSilent("222222".into()))
        );
        n.turn_on("222222").expect("test: on");
        assert_eq!(n.read_notifications("alice").expect("test: alice").len(), 1);
    }

    #[test]
    fn test_tariff_registry() {
        let mut n = network();
        let mut cheap = TariffPlan::default();
        cheap.normal.voice.regular = dec!(1);
        n.add_tariff_plan("cheap", cheap.clone()).expect("test: add");
        assert_eq!(n.add_tariff_plan("cheap", cheap), Err(NetworkError::TariffPlanExists("cheap".into())));
        n.set_client_tariff_plan("alice", "cheap").expect("test: assign");
        assert_eq!(n.remove_tariff_plan("cheap"), Err(NetworkError::TariffPlanInUse("cheap".into())));
        assert_eq!(n.remove_tariff_plan(TariffPlan::BASE), Err(NetworkError::TariffPlanInUse("base".into())));

        n.start_interactive("111111", "222222", CommunicationKind::Voice).expect("test: start");
        assert_eq!(n.end_interactive("111111", 7), Ok(Credits(dec!(7))));

        n.set_client_tariff_plan("alice", TariffPlan::BASE).expect("test: back to base");
        n.remove_tariff_plan("cheap").expect("test: remove");
        assert_eq!(n.remove_tariff_plan("cheap"), Err(NetworkError::TariffPlanNotFound("cheap".into())));
    }

    #[test]
    fn test_with_config_requires_known_default_plan() {
        let config = NetworkConfig { default_plan: "premium".into(), ..NetworkConfig::default() };
        assert!(matches!(Network::with_config(config), Err(NetworkError::TariffPlanNotFound(_))));

        let mut plans = BTreeMap::new();
        plans.insert("premium".to_string(), TariffPlan::default());
        let config = NetworkConfig { default_plan: "premium".into(), plans, ..NetworkConfig::default() };
        let mut n = Network::with_config(config).expect("test: valid config");
        n.register_client("dan", "Dan", 1).expect("test: dan");
        assert_eq!(n.client("dan").expect("test: dan").tariff_plan(), "premium");
    }

    #[test]
    fn test_payment_promotes_to_gold() {
        let policy = LoyaltyPolicy { gold_balance_threshold: dec!(5), ..LoyaltyPolicy::default() };
        let mut n = Network::with_config(NetworkConfig { policy, ..NetworkConfig::default() }).expect("test: config");
        n.register_client("alice", "Alice", 1).expect("test: alice");
        n.register_client("bob", "Bob", 2).expect("test: bob");
        n.register_terminal("111111", TerminalKind::Basic, "alice").expect("test: t1");
        n.register_terminal("222222", TerminalKind::Basic, "bob").expect("test: t2");
        let id = n.send_text("111111", "222222", "hello").expect("test: text");
        n.perform_payment("111111", id.0).expect("test: pay");
        assert_eq!(n.client("alice").expect("test: alice").tier_label(), TierLabel::Gold);
    }

    #[test]
    fn test_views_and_dirty_flag() {
        let mut n = network();
        n.mark_saved();
        assert!(!n.is_changed());
        n.send_text("111111", "222222", "one").expect("test: text");
        n.send_text("222222", "111112", "two").expect("test: text");
        assert!(n.is_changed());

        let from: Vec<u32> = n.communications_from_client("alice").expect("test: alice").iter().map(|c| c.id().0).collect();
        let to: Vec<u32> = n.communications_to_client("alice").expect("test: alice").iter().map(|c| c.id().0).collect();
        assert_eq!(from, vec![1]);
        assert_eq!(to, vec![2]);
        assert!(n.unused_terminals().is_empty());
        assert!(n.clients_without_debts().is_empty());
        assert_eq!(n.global_debts(), Credits(dec!(20)));
        assert_eq!(n.describe_client("alice").expect("test: line"), "CLIENT|alice|Alice|100|NORMAL|YES|2|0|10");
    }

    #[test]
    fn test_client_fields_reject_separator_and_line_breaks() {
        let mut n = Network::new();
        n.mark_saved();
        assert_eq!(
            n.register_client("ana", "Ana|Lopes", 1),
            Err(NetworkError::InvalidClientField { field: "name", value: "Ana|Lopes".into() })
        );
        assert!(matches!(
            n.register_client("a\nb", "Ana", 1),
            Err(NetworkError::InvalidClientField { field: "key", .. })
        ));
        assert!(matches!(n.register_client("ana", "Ana\r", 1), Err(NetworkError::InvalidClientField { .. })));
        assert_eq!(n.clients().count(), 0);
        assert!(!n.is_changed());
    }

    #[test]
    fn test_unpriceable_call_is_refused_and_keeps_running() {
        let mut n = network();
        let mut plan = TariffPlan::default();
        plan.normal.voice.regular = rust_decimal::Decimal::MAX;
        n.plans.insert("broken".into(), plan);
        n.set_client_tariff_plan("alice", "broken").expect("test: assign");
        let id = n.start_interactive("111111", "222222", CommunicationKind::Voice).expect("test: call");

        assert_eq!(n.end_interactive("111111", 2), Err(NetworkError::CostOverflow(id.0)));
        let comm = n.communication(id.0).expect("test: stored");
        assert!(!comm.is_finished());
        assert_eq!(comm.units(), 0);
        assert!(n.terminal("111111").expect("test: t1").is_busy());
        assert!(n.terminal("222222").expect("test: t3").is_busy());

        n.set_client_tariff_plan("alice", TariffPlan::BASE).expect("test: reassign");
        assert_eq!(n.end_interactive("111111", 2), Ok(Credits(dec!(40))));
    }

    #[test]
    fn test_registry_rejects_out_of_range_plans() {
        let mut plan = TariffPlan::default();
        plan.gold.video.friendly = rust_decimal::Decimal::MAX;

        let mut n = network();
        let err = n.add_tariff_plan("greedy", plan.clone()).expect_err("test: rate above cap");
        assert!(matches!(&err, NetworkError::InvalidTariffPlan { name, .. } if name == "greedy"), "got {err:?}");
        assert_eq!(err.kind(), ErrorKind::MalformedInput);
        assert!(n.tariff_plan("greedy").is_err());

        let config = NetworkConfig { plans: BTreeMap::from([("greedy".to_string(), plan)]), ..NetworkConfig::default() };
        assert!(matches!(Network::with_config(config), Err(NetworkError::InvalidTariffPlan { .. })));
    }

    #[test]
    fn test_removing_unknown_friend_reports_friend_not_found() {
        let mut n = network();
        n.add_friend("111111", "222222").expect("test: friend");
        for friend in ["12", "111112", "abcdef"] {
            assert!(
                matches!(n.remove_friend("111111", friend), Err(NetworkError::FriendNotFound { .. })),
                "friend {friend}"
            );
        }
        n.remove_friend("111111", "222222").expect("test: unfriend");
        assert!(!n.terminal("111111").expect("test: t1").has_friends());
    }

    #[test]
    fn test_origin_that_cannot_start_is_refused() {
        let mut n = network();
        n.turn_off("111111").expect("test: off");
        assert_eq!(n.send_text("111111", "222222", "hi"), Err(NetworkError::OriginOff("111111".into())));
        n.start_interactive("111112", "222222", CommunicationKind::Voice).expect("test: call");
        assert_eq!(
            n.start_interactive("111112", "111111", CommunicationKind::Voice),
            Err(NetworkError::OriginBusy("111112".into()))
        );
        n.turn_on("111111").expect("test: on");
        n.silence("111111").expect("test: silence");
        assert!(n.terminal("111111").expect("test: t1").can_start_communication());
        n.send_text("111111", "111112", "silent terminals still send").expect("test: text");
    }
}
