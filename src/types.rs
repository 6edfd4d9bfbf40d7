//! Core types and data structures for the movements ledger

use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Classification of a movement row as stored by the ledger
///
/// The name is free text coming from the organization's type catalogue
/// ("Ingreso", "Egreso", ...). Leg roles are derived from it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MovementType {
    /// Identifier of the type in the catalogue
    pub id: String,
    /// Display name of the type
    pub name: String,
}

impl MovementType {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    /// Case-insensitive substring match against the type name
    pub fn name_contains(&self, keyword: &str) -> bool {
        self.name.to_lowercase().contains(&keyword.to_lowercase())
    }
}

/// Compound entity a movement row belongs to, if any
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupKind {
    Conversion,
    Transfer,
}

impl GroupKind {
    pub fn label(&self) -> &'static str {
        match self {
            GroupKind::Conversion => "conversion",
            GroupKind::Transfer => "transfer",
        }
    }
}

/// A single ledger row: income, expense, or one leg of a conversion/transfer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movement {
    /// Opaque identifier
    pub id: String,
    /// Calendar date the movement applies to
    pub movement_date: NaiveDate,
    /// When the row was created
    pub created_at: NaiveDateTime,
    /// Movement type (income, expense, conversion leg, transfer leg)
    #[serde(rename = "type")]
    pub movement_type: MovementType,
    pub category: String,
    #[serde(default)]
    pub subcategory: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Signed amount; outgoing legs are usually negative
    pub amount: BigDecimal,
    /// Currency code
    pub currency: String,
    /// Wallet (fund bucket) the amount is booked against
    pub wallet: String,
    #[serde(default)]
    pub exchange_rate: Option<BigDecimal>,
    #[serde(default)]
    pub conversion_group_id: Option<String>,
    #[serde(default)]
    pub transfer_group_id: Option<String>,
    pub organization_id: String,
    /// Absent for organization-level movements
    #[serde(default)]
    pub project_id: Option<String>,
    /// User that created the row
    pub created_by: String,
    #[serde(default)]
    pub is_favorite: bool,
}

impl Movement {
    /// Which compound entity this row is a leg of, if any.
    /// A conversion id wins when both ids are set.
    pub fn group_kind(&self) -> Option<GroupKind> {
        if self.conversion_group_id.is_some() {
            Some(GroupKind::Conversion)
        } else if self.transfer_group_id.is_some() {
            Some(GroupKind::Transfer)
        } else {
            None
        }
    }

    /// Group id for the given kind
    pub fn group_id(&self, kind: GroupKind) -> Option<&str> {
        match kind {
            GroupKind::Conversion => self.conversion_group_id.as_deref(),
            GroupKind::Transfer => self.transfer_group_id.as_deref(),
        }
    }

    /// Whether the movement is scoped to the whole organization
    pub fn is_organization_level(&self) -> bool {
        self.project_id.is_none()
    }
}

/// Which movements a fetch should return
///
/// Passed explicitly to every query instead of living in process-wide
/// selection state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum MovementScope {
    /// Every movement of the organization, project-level ones included
    Organization { organization_id: String },
    /// Only movements without a project
    OrganizationOnly { organization_id: String },
    /// Movements of one project
    Project {
        organization_id: String,
        project_id: String,
    },
}

impl MovementScope {
    pub fn organization(organization_id: impl Into<String>) -> Self {
        MovementScope::Organization {
            organization_id: organization_id.into(),
        }
    }

    pub fn project(organization_id: impl Into<String>, project_id: impl Into<String>) -> Self {
        MovementScope::Project {
            organization_id: organization_id.into(),
            project_id: project_id.into(),
        }
    }

    pub fn organization_id(&self) -> &str {
        match self {
            MovementScope::Organization { organization_id }
            | MovementScope::OrganizationOnly { organization_id }
            | MovementScope::Project {
                organization_id, ..
            } => organization_id,
        }
    }

    /// Check whether a movement falls inside this scope
    pub fn contains(&self, movement: &Movement) -> bool {
        if movement.organization_id != self.organization_id() {
            return false;
        }
        match self {
            MovementScope::Organization { .. } => true,
            MovementScope::OrganizationOnly { .. } => movement.project_id.is_none(),
            MovementScope::Project { project_id, .. } => {
                movement.project_id.as_deref() == Some(project_id.as_str())
            }
        }
    }
}

/// Errors that can occur in the movements ledger
#[derive(Debug, thiserror::Error)]
pub enum MovementError {
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Movement not found: {0}")]
    MovementNotFound(String),
    #[error("Invalid group: {0}")]
    InvalidGroup(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for movement operations
pub type MovementResult<T> = Result<T, MovementError>;


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_group_kind_prefers_conversion() {
        let mut m = conversion_leg("1", "Egreso", "-10", "USD", "g1");
        assert_eq!(m.group_kind(), Some(GroupKind::Conversion));

        m.transfer_group_id = Some("t1".to_string());
        assert_eq!(m.group_kind(), Some(GroupKind::Conversion));

        m.conversion_group_id = None;
        assert_eq!(m.group_kind(), Some(GroupKind::Transfer));
        assert_eq!(m.group_id(GroupKind::Transfer), Some("t1"));
    }

    #[test]
    fn test_type_name_match_ignores_case() {
        let t = MovementType::new("x", "EGRESO por conversión");
        assert!(t.name_contains("egreso"));
        assert!(!t.name_contains("ingreso"));
    }

    #[test]
    fn test_scope_contains() {
        let mut org_row = movement("1", "Ingreso", "5", "USD");
        let mut project_row = movement("2", "Ingreso", "5", "USD");
        project_row.project_id = Some("p1".to_string());

        let org = MovementScope::organization("org1");
        let org_only = MovementScope::OrganizationOnly {
            organization_id: "org1".to_string(),
        };
        let project = MovementScope::project("org1", "p1");

        assert!(org.contains(&org_row) && org.contains(&project_row));
        assert!(org_only.contains(&org_row) && !org_only.contains(&project_row));
        assert!(!project.contains(&org_row) && project.contains(&project_row));

        org_row.organization_id = "other".to_string();
        assert!(!org.contains(&org_row));
    }

    #[test]
    fn test_movement_deserializes_type_field() {
        let json = r#"{
            "id": "m1",
            "movement_date": "2024-03-01",
            "created_at": "2024-03-01T10:00:00",
            "type": {"id": "t1", "name": "Ingreso"},
            "category": "Ventas",
            "amount": "1850",
            "currency": "ARS",
            "wallet": "Banco",
            "organization_id": "org1",
            "created_by": "user1"
        }"#;
        let m: Movement = serde_json::from_str(json).unwrap();
        assert_eq!(m.movement_type.name, "Ingreso");
        assert!(m.conversion_group_id.is_none());
        assert!(m.is_organization_level());
        assert!(!m.is_favorite);
    }
}
