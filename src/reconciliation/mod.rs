//! Reconciliation of raw movement rows into display entities
//!
//! Conversions and transfers are stored as two rows sharing a group id. This
//! module folds such pairs back into one [`ConversionGroup`] or
//! [`TransferGroup`]. Buckets that cannot be paired are shown as their
//! standalone rows, so no row ever disappears from view.

use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::collections::HashMap;

use crate::config::{MovementsConfig, OversizedGroupPolicy};
use crate::types::*;

/// Role of a row inside a conversion or transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegRole {
    /// Outgoing leg
    Debit,
    /// Incoming leg
    Credit,
}

/// Metadata shared by both group shapes, taken from the outgoing leg
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSummary {
    pub group_id: String,
    pub description: Option<String>,
    pub movement_date: NaiveDate,
    pub created_at: NaiveDateTime,
    pub created_by: String,
    pub organization_id: String,
    pub project_id: Option<String>,
    pub outgoing_movement_id: String,
    pub incoming_movement_id: String,
    /// True only when every member is a favorite
    pub is_favorite: bool,
}

impl GroupSummary {
    fn new(group_id: &str, debit: &Movement, credit: &Movement, members: &[Movement]) -> Self {
        Self {
            group_id: group_id.to_string(),
            description: debit.description.clone(),
            movement_date: debit.movement_date,
            created_at: debit.created_at,
            created_by: debit.created_by.clone(),
            organization_id: debit.organization_id.clone(),
            project_id: debit.project_id.clone(),
            outgoing_movement_id: debit.id.clone(),
            incoming_movement_id: credit.id.clone(),
            is_favorite: !members.is_empty() && members.iter().all(|m| m.is_favorite),
        }
    }
}

/// "Amount X of currency A became amount Y of currency B"
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionGroup {
    pub is_conversion_group: bool,
    #[serde(flatten)]
    pub summary: GroupSummary,
    pub movements: Vec<Movement>,
    pub from_currency: String,
    pub to_currency: String,
    pub from_amount: BigDecimal,
    pub to_amount: BigDecimal,
    pub from_wallet: String,
    pub to_wallet: String,
    pub exchange_rate: Option<BigDecimal>,
}

/// Funds moved from one wallet to another
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferGroup {
    pub is_transfer_group: bool,
    #[serde(flatten)]
    pub summary: GroupSummary,
    pub movements: Vec<Movement>,
    pub from_wallet: String,
    pub to_wallet: String,
    /// Absolute value of the outgoing leg
    pub amount: BigDecimal,
    pub currency: String,
}

/// One row of the movements view
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MovementView {
    Conversion(ConversionGroup),
    Transfer(TransferGroup),
    Single(Movement),
}

impl MovementView {
    pub fn kind(&self) -> Option<GroupKind> {
        match self {
            MovementView::Conversion(_) => Some(GroupKind::Conversion),
            MovementView::Transfer(_) => Some(GroupKind::Transfer),
            MovementView::Single(_) => None,
        }
    }

    /// Group id for groups, movement id for standalone rows
    pub fn id(&self) -> &str {
        match self {
            MovementView::Conversion(g) => &g.summary.group_id,
            MovementView::Transfer(g) => &g.summary.group_id,
            MovementView::Single(m) => &m.id,
        }
    }

    /// Rows backing this view entry
    pub fn members(&self) -> &[Movement] {
        match self {
            MovementView::Conversion(g) => &g.movements,
            MovementView::Transfer(g) => &g.movements,
            MovementView::Single(m) => std::slice::from_ref(m),
        }
    }

    pub fn movement_ids(&self) -> Vec<String> {
        self.members().iter().map(|m| m.id.clone()).collect()
    }

    /// Leg that stands for the whole entry in editors: the outgoing leg of a group.
    ///
    /// `None` only for a hand-built group with no legs.
    pub fn representative(&self) -> Option<&Movement> {
        let summary = match self {
            MovementView::Conversion(g) => &g.summary,
            MovementView::Transfer(g) => &g.summary,
            MovementView::Single(m) => return Some(m),
        };
        let members = self.members();
        members
            .iter()
            .find(|m| m.id == summary.outgoing_movement_id)
            .or_else(|| members.first())
    }

    pub fn summary(&self) -> Option<&GroupSummary> {
        match self {
            MovementView::Conversion(g) => Some(&g.summary),
            MovementView::Transfer(g) => Some(&g.summary),
            MovementView::Single(_) => None,
        }
    }

    pub fn movement_date(&self) -> NaiveDate {
        match self {
            MovementView::Conversion(g) => g.summary.movement_date,
            MovementView::Transfer(g) => g.summary.movement_date,
            MovementView::Single(m) => m.movement_date,
        }
    }

    pub fn created_at(&self) -> NaiveDateTime {
        match self {
            MovementView::Conversion(g) => g.summary.created_at,
            MovementView::Transfer(g) => g.summary.created_at,
            MovementView::Single(m) => m.created_at,
        }
    }

    pub fn is_favorite(&self) -> bool {
        match self {
            MovementView::Single(m) => m.is_favorite,
            _ => self.summary().is_some_and(|s| s.is_favorite),
        }
    }
}

/// Every row recoverable from a list of view entries, in output order
pub fn flatten_views(views: &[MovementView]) -> Vec<&Movement> {
    views.iter().flat_map(|v| v.members().iter()).collect()
}

/// Group rows with the default configuration
pub fn group_movements(movements: &[Movement]) -> Vec<MovementView> {
    MovementGrouper::default().group(movements)
}

/// Rows bucketed by group id, in first-seen order
struct Buckets<'a> {
    index: HashMap<&'a str, usize>,
    entries: Vec<(&'a str, Vec<&'a Movement>)>,
}

impl<'a> Buckets<'a> {
    fn new() -> Self {
        Self {
            index: HashMap::new(),
            entries: Vec::new(),
        }
    }

    fn push(&mut self, group_id: &'a str, movement: &'a Movement) {
        match self.index.get(group_id) {
            Some(&i) => self.entries[i].1.push(movement),
            None => {
                self.index.insert(group_id, self.entries.len());
                self.entries.push((group_id, vec![movement]));
            }
        }
    }
}

/// Folds raw rows into conversion/transfer groups
#[derive(Debug, Clone)]
pub struct MovementGrouper {
    debit_keyword: String,
    credit_keyword: String,
    policy: OversizedGroupPolicy,
}

impl Default for MovementGrouper {
    fn default() -> Self {
        Self::from_valid(&MovementsConfig::default())
    }
}

impl MovementGrouper {
    /// Build a grouper from a configuration, rejecting keywords that cannot
    /// tell the two legs apart
    pub fn new(config: &MovementsConfig) -> MovementResult<Self> {
        config.validate()?;
        Ok(Self::from_valid(config))
    }

    fn from_valid(config: &MovementsConfig) -> Self {
        Self {
            debit_keyword: config.debit_keyword.to_lowercase(),
            credit_keyword: config.credit_keyword.to_lowercase(),
            policy: config.oversized_group_policy,
        }
    }

    /// Role a row would play inside a group, judged by its type name
    pub fn leg_role(&self, movement: &Movement) -> Option<LegRole> {
        if movement.movement_type.name_contains(&self.debit_keyword) {
            Some(LegRole::Debit)
        } else if movement.movement_type.name_contains(&self.credit_keyword) {
            Some(LegRole::Credit)
        } else {
            None
        }
    }

    /// Group rows into display entities.
    ///
    /// Output order is conversions, then transfers, then standalone rows.
    /// Callers sort before display.
    pub fn group(&self, movements: &[Movement]) -> Vec<MovementView> {
        let mut conversions = Buckets::new();
        let mut transfers = Buckets::new();
        let mut standalone: Vec<MovementView> = Vec::new();

        for movement in movements {
            if let Some(id) = movement.conversion_group_id.as_deref() {
                conversions.push(id, movement);
            } else if let Some(id) = movement.transfer_group_id.as_deref() {
                transfers.push(id, movement);
            } else {
                standalone.push(MovementView::Single(movement.clone()));
            }
        }

        let mut degraded = Vec::new();
        let mut output = Vec::with_capacity(movements.len());

        for (kind, buckets) in [
            (GroupKind::Conversion, conversions),
            (GroupKind::Transfer, transfers),
        ] {
            for (group_id, members) in buckets.entries {
                match self.pair(kind, group_id, &members) {
                    Some(view) => output.push(view),
                    None => {
                        tracing::warn!(
                            kind = kind.label(),
                            group_id,
                            legs = members.len(),
                            "group cannot be paired, showing legs standalone"
                        );
                        degraded.extend(members.into_iter().map(|m| MovementView::Single(m.clone())));
                    }
                }
            }
        }

        tracing::debug!(
            rows = movements.len(),
            groups = output.len(),
            standalone = standalone.len(),
            degraded = degraded.len(),
            "grouped movements"
        );

        output.extend(standalone);
        output.extend(degraded);
        output
    }

    /// Locate the first outgoing and the first incoming leg of a bucket
    fn find_legs<'a>(&self, members: &[&'a Movement]) -> Option<(&'a Movement, &'a Movement)> {
        let debit = members
            .iter()
            .copied()
            .find(|m| m.movement_type.name_contains(&self.debit_keyword))?;
        let credit = members
            .iter()
            .copied()
            .find(|m| m.id != debit.id && m.movement_type.name_contains(&self.credit_keyword))?;
        Some((debit, credit))
    }

    fn pair(&self, kind: GroupKind, group_id: &str, members: &[&Movement]) -> Option<MovementView> {
        if members.len() < 2 {
            return None;
        }
        if members.len() > 2 && self.policy == OversizedGroupPolicy::Reject {
            return None;
        }

        let (debit, credit) = self.find_legs(members)?;

        let legs: Vec<Movement> = if members.len() > 2 {
            tracing::warn!(
                kind = kind.label(),
                group_id,
                legs = members.len(),
                "group has extra legs, keeping the first debit/credit pair"
            );
            members
                .iter()
                .filter(|m| m.id == debit.id || m.id == credit.id)
                .map(|m| (*m).clone())
                .collect()
        } else {
            members.iter().map(|m| (*m).clone()).collect()
        };

        let summary = GroupSummary::new(group_id, debit, credit, &legs);

        let view = match kind {
            GroupKind::Conversion => MovementView::Conversion(ConversionGroup {
                is_conversion_group: true,
                summary,
                from_currency: debit.currency.clone(),
                to_currency: credit.currency.clone(),
                from_amount: debit.amount.clone(),
                to_amount: credit.amount.clone(),
                from_wallet: debit.wallet.clone(),
                to_wallet: credit.wallet.clone(),
                exchange_rate: debit
                    .exchange_rate
                    .clone()
                    .or_else(|| credit.exchange_rate.clone()),
                movements: legs,
            }),
            GroupKind::Transfer => MovementView::Transfer(TransferGroup {
                is_transfer_group: true,
                summary,
                from_wallet: debit.wallet.clone(),
                to_wallet: credit.wallet.clone(),
                amount: debit.amount.abs(),
                currency: debit.currency.clone(),
                movements: legs,
            }),
        };

        Some(view)
    }
}
