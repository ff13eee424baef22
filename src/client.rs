// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Telecom Network Engine - Clients

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::mem;

use crate::communication::Communication;
use crate::error::{NetworkError, Result};
use crate::loyalty::{LoyaltyPolicy, LoyaltyTier};
use crate::notification::{DeliveryChannel, Notification};
use crate::types::{ClientKey, CommunicationId, Credits, TerminalId, TierLabel};

/// A subscriber. Owns terminals, pays for what they originate and climbs
/// loyalty tiers.
///
/// Each communication id the client originated sits in exactly one of
/// `ongoing`, `in_debt` or `paid`. Calls received are tracked in `ongoing`
/// only while they run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    key: ClientKey,
    name: String,
    tax_id: u32,
    tier: LoyaltyTier,
    tariff_plan: String,
    terminals: BTreeSet<TerminalId>,
    ongoing: BTreeSet<CommunicationId>,
    in_debt: BTreeSet<CommunicationId>,
    paid: BTreeSet<CommunicationId>,
    notifications_enabled: bool,
    channel: DeliveryChannel,
    inbox: Vec<Notification>,
}

impl Client {
    pub fn new(key: ClientKey, name: impl Into<String>, tax_id: u32, tariff_plan: impl Into<String>) -> Self {
        Self {
            key,
            name: name.into(),
            tax_id,
            tier: LoyaltyTier::default(),
            tariff_plan: tariff_plan.into(),
            terminals: BTreeSet::new(),
            ongoing: BTreeSet::new(),
            in_debt: BTreeSet::new(),
            paid: BTreeSet::new(),
            notifications_enabled: true,
            channel: DeliveryChannel::default(),
            inbox: Vec::new(),
        }
    }

    pub fn key(&self) -> &ClientKey {
        &self.key
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tax_id(&self) -> u32 {
        self.tax_id
    }

    pub fn tier(&self) -> LoyaltyTier {
        self.tier
    }

    pub fn tier_label(&self) -> TierLabel {
        self.tier.label()
    }

    pub fn tariff_plan(&self) -> &str {
        &self.tariff_plan
    }

    pub(crate) fn set_tariff_plan(&mut self, plan: impl Into<String>) {
        self.tariff_plan = plan.into();
    }

    pub fn terminals(&self) -> impl Iterator<Item = &TerminalId> {
        self.terminals.iter()
    }

    pub fn terminal_count(&self) -> usize {
        self.terminals.len()
    }

    pub(crate) fn add_terminal(&mut self, id: TerminalId) {
        self.terminals.insert(id);
    }

    pub fn ongoing(&self) -> impl Iterator<Item = CommunicationId> + '_ {
        self.ongoing.iter().copied()
    }

    pub fn unpaid(&self) -> impl Iterator<Item = CommunicationId> + '_ {
        self.in_debt.iter().copied()
    }

    pub fn settled(&self) -> impl Iterator<Item = CommunicationId> + '_ {
        self.paid.iter().copied()
    }

    // ─── Notifications ───────────────────────────────────────────────────────

    pub fn notifications_enabled(&self) -> bool {
        self.notifications_enabled
    }

    pub(crate) fn enable_notifications(&mut self) -> Result<()> {
        if self.notifications_enabled {
            return Err(NetworkError::NotificationsAlreadyEnabled(self.key.to_string()));
        }
        self.notifications_enabled = true;
        Ok(())
    }

    pub(crate) fn disable_notifications(&mut self) -> Result<()> {
        if !self.notifications_enabled {
            return Err(NetworkError::NotificationsAlreadyDisabled(self.key.to_string()));
        }
        self.notifications_enabled = false;
        Ok(())
    }

    pub fn channel(&self) -> DeliveryChannel {
        self.channel
    }

    pub(crate) fn set_channel(&mut self, channel: DeliveryChannel) {
        self.channel = channel;
    }

    pub(crate) fn notify(&mut self, notification: Notification) {
        self.channel.deliver(&self.key, notification, &mut self.inbox);
    }

    /// Buffered notifications, oldest first, without consuming them.
    pub fn notifications(&self) -> &[Notification] {
        &self.inbox
    }

    /// Drain the buffer.
    pub(crate) fn read_notifications(&mut self) -> Vec<Notification> {
        mem::take(&mut self.inbox)
    }

    // ─── Communication events ────────────────────────────────────────────────

    pub(crate) fn on_start_interactive(&mut self, id: CommunicationId) {
        self.ongoing.insert(id);
    }

    /// A communication this client originated has finished. `log` already
    /// holds its cost.
    pub(crate) fn on_finished_as_origin(&mut self, comm: &Communication, log: &[Communication], policy: &LoyaltyPolicy) {
        self.ongoing.remove(&comm.id());
        self.in_debt.insert(comm.id());
        self.tier = self.tier.on_communication(self.balance(log), comm.kind(), policy);
    }

    pub(crate) fn on_finished_as_destination(&mut self, id: CommunicationId) {
        self.ongoing.remove(&id);
    }

    pub(crate) fn on_payment(&mut self, id: CommunicationId, log: &[Communication], policy: &LoyaltyPolicy) {
        if !self.in_debt.remove(&id) {
            return;
        }
        self.paid.insert(id);
        self.tier = self.tier.on_payment(self.balance(log), policy);
    }

    // ─── Credits ─────────────────────────────────────────────────────────────

    fn total(ids: &BTreeSet<CommunicationId>, log: &[Communication]) -> Credits {
        ids.iter()
            .filter_map(|id| id.index().and_then(|i| log.get(i)))
            .map(Communication::cost)
            .sum()
    }

    pub fn payments(&self, log: &[Communication]) -> Credits {
        Self::total(&self.paid, log)
    }

    pub fn debts(&self, log: &[Communication]) -> Credits {
        Self::total(&self.in_debt, log)
    }

    pub fn balance(&self, log: &[Communication]) -> Credits {
        self.payments(log) - self.debts(log)
    }

    /// `CLIENT|key|name|taxId|TIER|YES/NO|terminals|paid|debt`
    pub fn describe(&self, log: &[Communication]) -> String {
        format!(
            "CLIENT|{}|{}|{}|{}|{}|{}|{}|{}",
            self.key,
            self.name,
            self.tax_id,
            self.tier_label(),
            if self.notifications_enabled { "YES" } else { "NO" },
            self.terminals.len(),
            self.payments(log),
            self.debts(log),
        )
    }
}
