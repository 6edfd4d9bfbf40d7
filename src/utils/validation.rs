//! Validation utilities

use bigdecimal::BigDecimal;

use crate::config::MovementsConfig;
use crate::reconciliation::{LegRole, MovementGrouper};
use crate::traits::*;
use crate::types::*;

/// Validate that an amount is not zero
pub fn validate_non_zero_amount(amount: &BigDecimal) -> MovementResult<()> {
    if *amount == BigDecimal::from(0) {
        Err(MovementError::Validation(
            "Amount cannot be zero".to_string(),
        ))
    } else {
        Ok(())
    }
}

/// Validate a currency code (e.g. USD, ARS)
pub fn validate_currency_code(currency: &str) -> MovementResult<()> {
    if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_uppercase()) {
        return Err(MovementError::Validation(format!(
            "Currency '{}' must be a three-letter uppercase code",
            currency
        )));
    }

    Ok(())
}

/// Validate that a wallet name is valid
pub fn validate_wallet_name(wallet: &str) -> MovementResult<()> {
    if wallet.trim().is_empty() {
        return Err(MovementError::Validation(
            "Wallet cannot be empty".to_string(),
        ));
    }

    if wallet.len() > 100 {
        return Err(MovementError::Validation(
            "Wallet name cannot exceed 100 characters".to_string(),
        ));
    }

    Ok(())
}

/// Validate that a movement description is valid
pub fn validate_description(description: Option<&str>) -> MovementResult<()> {
    if description.is_some_and(|d| d.len() > 500) {
        return Err(MovementError::Validation(
            "Movement description cannot exceed 500 characters".to_string(),
        ));
    }

    Ok(())
}

/// Enhanced validator that also checks leg roles and pairing
pub struct EnhancedMovementValidator {
    grouper: MovementGrouper,
}

impl EnhancedMovementValidator {
    pub fn new(config: &MovementsConfig) -> MovementResult<Self> {
        Ok(Self {
            grouper: MovementGrouper::new(config)?,
        })
    }
}

impl Default for EnhancedMovementValidator {
    fn default() -> Self {
        Self {
            grouper: MovementGrouper::default(),
        }
    }
}

impl MovementValidator for EnhancedMovementValidator {
    fn validate_movement(&self, movement: &Movement) -> MovementResult<()> {
        DefaultMovementValidator.validate_movement(movement)?;

        validate_non_zero_amount(&movement.amount)?;
        validate_currency_code(&movement.currency)?;
        validate_wallet_name(&movement.wallet)?;
        validate_description(movement.description.as_deref())?;

        if movement.movement_type.name.trim().is_empty() {
            return Err(MovementError::Validation(
                "Movement type cannot be empty".to_string(),
            ));
        }

        Ok(())
    }

    fn validate_legs(&self, kind: GroupKind, legs: &[Movement]) -> MovementResult<()> {
        DefaultMovementValidator.validate_legs(kind, legs)?;
        for leg in legs {
            self.validate_movement(leg)?;
        }

        let (first, second) = (&legs[0], &legs[1]);
        if first.id == second.id {
            return Err(MovementError::InvalidGroup(
                "Legs must be different movements".to_string(),
            ));
        }

        let group_id = first.group_id(kind);
        if group_id.is_none() || group_id != second.group_id(kind) {
            return Err(MovementError::InvalidGroup(format!(
                "Both legs must share one {} group id",
                kind.label()
            )));
        }

        let roles = (self.grouper.leg_role(first), self.grouper.leg_role(second));
        match roles {
            (Some(LegRole::Debit), Some(LegRole::Credit))
            | (Some(LegRole::Credit), Some(LegRole::Debit)) => Ok(()),
            _ => Err(MovementError::InvalidGroup(format!(
                "A {} needs one outgoing and one incoming leg",
                kind.label()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::fixtures::*;

    #[test]
    fn test_field_validators() {
        assert!(validate_currency_code("USD").is_ok());
        assert!(validate_currency_code("usd").is_err());
        assert!(validate_currency_code("USDT").is_err());
        assert!(validate_wallet_name("  ").is_err());
        assert!(validate_non_zero_amount(&BigDecimal::from(0)).is_err());
        assert!(validate_description(Some("x".repeat(501).as_str())).is_err());
        assert!(validate_description(None).is_ok());
    }

    #[test]
    fn test_valid_legs() {
        let validator = EnhancedMovementValidator::default();
        let legs = vec![
            conversion_leg("1", "Egreso", "-100", "USD", "g1"),
            conversion_leg("2", "Ingreso", "1850", "ARS", "g1"),
        ];
        assert!(validator.validate_legs(GroupKind::Conversion, &legs).is_ok());
    }

    #[test]
    fn test_invalid_legs() {
        let validator = EnhancedMovementValidator::default();

        let same_role = vec![
            conversion_leg("1", "Egreso", "-100", "USD", "g1"),
            conversion_leg("2", "Egreso", "-5", "ARS", "g1"),
        ];
        assert!(matches!(
            validator.validate_legs(GroupKind::Conversion, &same_role),
            Err(MovementError::InvalidGroup(_))
        ));

        let split = vec![
            transfer_leg("1", "Egreso", "-5", "Caja", "t1"),
            transfer_leg("2", "Ingreso", "5", "Banco", "t2"),
        ];
        assert!(validator.validate_legs(GroupKind::Transfer, &split).is_err());

        let single = vec![transfer_leg("1", "Egreso", "-5", "Caja", "t1")];
        assert!(validator.validate_legs(GroupKind::Transfer, &single).is_err());
    }
}
