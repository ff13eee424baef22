// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Telecom Network Engine - Communications

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::tariff::TariffPlan;
use crate::types::{CommunicationId, CommunicationKind, Credits, TerminalId, TierLabel};

/// Lifecycle violation of a single communication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LifecycleError {
    #[error("communication {0} is already finished")]
    AlreadyFinished(CommunicationId),
    #[error("communication {0} is not finished")]
    NotFinished(CommunicationId),
    #[error("communication {0} is already paid")]
    AlreadyPaid(CommunicationId),
    #[error("communication {0} costs more than can be represented")]
    CostOverflow(CommunicationId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommunicationStatus {
    Ongoing,
    Finished,
}

impl CommunicationStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Ongoing => "ONGOING",
            Self::Finished => "FINISHED",
        }
    }
}

/// One text, voice or video exchange between two terminals.
///
/// Cost is fixed once, at finish time, from the origin owner's plan and tier.
/// Texts finish the moment they are created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Communication {
    id: CommunicationId,
    kind: CommunicationKind,
    origin: TerminalId,
    destination: TerminalId,
    message: Option<String>,
    status: CommunicationStatus,
    units: u32,
    cost: Credits,
    paid: bool,
}

impl Communication {
    /// A text, priced and finished on the spot. Units are the message's
    /// character count.
    pub fn text(
        id: CommunicationId,
        origin: TerminalId,
        destination: TerminalId,
        message: String,
        plan: &TariffPlan,
        tier: TierLabel,
    ) -> Result<Self, LifecycleError> {
        let units = u32::try_from(message.chars().count()).unwrap_or(u32::MAX);
        let cost = plan
            .price(CommunicationKind::Text, tier, units, false)
            .ok_or(LifecycleError::CostOverflow(id))?;
        Ok(Self {
            id,
            kind: CommunicationKind::Text,
            origin,
            destination,
            message: Some(message),
            status: CommunicationStatus::Finished,
            units,
            cost,
            paid: false,
        })
    }

    /// A voice or video call that stays ongoing until [`finish`](Self::finish).
    pub fn interactive(id: CommunicationId, kind: CommunicationKind, origin: TerminalId, destination: TerminalId) -> Self {
        Self {
            id,
            kind,
            origin,
            destination,
            message: None,
            status: CommunicationStatus::Ongoing,
            units: 0,
            cost: Credits::zero(),
            paid: false,
        }
    }

    pub fn id(&self) -> CommunicationId {
        self.id
    }

    pub fn kind(&self) -> CommunicationKind {
        self.kind
    }

    pub fn origin(&self) -> &TerminalId {
        &self.origin
    }

    pub fn destination(&self) -> &TerminalId {
        &self.destination
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn status(&self) -> CommunicationStatus {
        self.status
    }

    pub fn is_finished(&self) -> bool {
        self.status == CommunicationStatus::Finished
    }

    pub fn is_paid(&self) -> bool {
        self.paid
    }

    /// Characters for texts, duration for calls.
    pub fn units(&self) -> u32 {
        self.units
    }

    pub fn cost(&self) -> Credits {
        self.cost
    }

    /// Close the call after `units` of duration and fix its cost. Nothing
    /// changes when the call cannot be priced.
    pub fn finish(
        &mut self,
        units: u32,
        plan: &TariffPlan,
        tier: TierLabel,
        friendly: bool,
    ) -> Result<Credits, LifecycleError> {
        if self.is_finished() {
            return Err(LifecycleError::AlreadyFinished(self.id));
        }
        let cost = plan.price(self.kind, tier, units, friendly).ok_or(LifecycleError::CostOverflow(self.id))?;
        self.units = units;
        self.cost = cost;
        self.status = CommunicationStatus::Finished;
        Ok(self.cost)
    }

    pub fn pay(&mut self) -> Result<(), LifecycleError> {
        if !self.is_finished() {
            return Err(LifecycleError::NotFinished(self.id));
        }
        if self.paid {
            return Err(LifecycleError::AlreadyPaid(self.id));
        }
        self.paid = true;
        Ok(())
    }
}

impl fmt::Display for Communication {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}|{}|{}|{}|{}|{}|{}",
            self.kind,
            self.id,
            self.origin,
            self.destination,
            self.units,
            self.cost,
            self.status.label()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn tid(s: &str) -> TerminalId {
        TerminalId::parse(s).expect("test: valid id")
    }

    #[test]
    fn test_text_is_finished_and_priced_by_length() {
        let plan = TariffPlan::default();
        let text = Communication::text(CommunicationId(1), tid("111111"), tid("222222"), "x".repeat(60), &plan, TierLabel::Normal)
            .expect("test: priced");
        assert!(text.is_finished());
        assert!(!text.is_paid());
        assert_eq!(text.units(), 60);
        assert_eq!(text.cost(), Credits(dec!(16)));
        assert_eq!(text.to_string(), "TEXT|1|111111|222222|60|16|FINISHED");
    }

    #[test]
    fn test_text_counts_characters_not_bytes() {
        let plan = TariffPlan::default();
        let text = Communication::text(CommunicationId(1), tid("111111"), tid("222222"), "ééé".into(), &plan, TierLabel::Normal)
            .expect("test: priced");
        assert_eq!(text.units(), 3);
    }

    #[test]
    fn test_call_lifecycle() {
        let plan = TariffPlan::default();
        let mut call = Communication::interactive(CommunicationId(4), CommunicationKind::Voice, tid("111111"), tid("222222"));
        assert_eq!(call.to_string(), "VOICE|4|111111|222222|0|0|ONGOING");
        assert_eq!(call.pay(), Err(LifecycleError::NotFinished(CommunicationId(4))));

        let cost = call.finish(3, &plan, TierLabel::Gold, true).expect("test: first finish");
        assert_eq!(cost, Credits(dec!(15)));
        assert_eq!(call.to_string(), "VOICE|4|111111|222222|3|15|FINISHED");
        assert_eq!(
            call.finish(9, &plan, TierLabel::Gold, true),
            Err(LifecycleError::AlreadyFinished(CommunicationId(4)))
        );
        assert_eq!(call.cost(), Credits(dec!(15)));

        call.pay().expect("test: first payment");
        assert_eq!(call.pay(), Err(LifecycleError::AlreadyPaid(CommunicationId(4))));
    }

    #[test]
    fn test_unpriceable_call_stays_ongoing() {
        let mut plan = TariffPlan::default();
        plan.normal.voice.regular = rust_decimal::Decimal::MAX;
        let mut call = Communication::interactive(CommunicationId(2), CommunicationKind::Voice, tid("111111"), tid("222222"));
        assert_eq!(
            call.finish(2, &plan, TierLabel::Normal, false),
            Err(LifecycleError::CostOverflow(CommunicationId(2)))
        );
        assert!(!call.is_finished());
        assert_eq!(call.units(), 0);
        assert!(call.cost().is_zero());
    }
}
