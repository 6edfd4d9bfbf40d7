//! Traits for storage abstraction and extensibility

use async_trait::async_trait;

use crate::reconciliation::MovementView;
use crate::types::*;

/// Storage abstraction for the movements ledger
///
/// This trait lets the ledger work against any backend (a hosted database's
/// REST client, SQL, in-memory, ...). Every method is one request; the ledger
/// never assumes atomicity across calls.
#[async_trait]
pub trait MovementStorage: Send + Sync {
    /// Save a movement
    async fn save_movement(&mut self, movement: &Movement) -> MovementResult<()>;

    /// Save several movements in one request (used for conversion/transfer legs)
    async fn save_movements(&mut self, movements: &[Movement]) -> MovementResult<()>;

    /// Get a movement by ID
    async fn get_movement(&self, movement_id: &str) -> MovementResult<Option<Movement>>;

    /// List movements inside a scope
    async fn list_movements(&self, scope: &MovementScope) -> MovementResult<Vec<Movement>>;

    /// Replace an existing movement
    async fn update_movement(&mut self, movement: &Movement) -> MovementResult<()>;

    /// Delete a single movement
    async fn delete_movement(&mut self, movement_id: &str) -> MovementResult<()>;

    /// Delete every listed movement in one batch request
    async fn delete_movements(&mut self, movement_ids: &[String]) -> MovementResult<()>;

    /// Write `movements` (inserting or overwriting by id) and delete
    /// `removed_ids` in one request that either applies fully or not at all
    async fn replace_movements(
        &mut self,
        removed_ids: &[String],
        movements: &[Movement],
    ) -> MovementResult<()>;

    /// Set the favorite flag of one movement
    async fn set_favorite(&mut self, movement_id: &str, is_favorite: bool) -> MovementResult<()>;
}

/// Trait for implementing custom movement validation rules
pub trait MovementValidator: Send + Sync {
    /// Validate a movement before saving
    fn validate_movement(&self, movement: &Movement) -> MovementResult<()>;

    /// Validate the two legs of a conversion or transfer before saving
    fn validate_legs(&self, kind: GroupKind, legs: &[Movement]) -> MovementResult<()>;
}

/// Default movement validator with basic rules
pub struct DefaultMovementValidator;

impl MovementValidator for DefaultMovementValidator {
    fn validate_movement(&self, movement: &Movement) -> MovementResult<()> {
        if movement.id.trim().is_empty() {
            return Err(MovementError::Validation(
                "Movement ID cannot be empty".to_string(),
            ));
        }

        if movement.conversion_group_id.is_some() && movement.transfer_group_id.is_some() {
            return Err(MovementError::Validation(format!(
                "Movement '{}' cannot belong to a conversion and a transfer at once",
                movement.id
            )));
        }

        Ok(())
    }

    fn validate_legs(&self, kind: GroupKind, legs: &[Movement]) -> MovementResult<()> {
        if legs.len() != 2 {
            return Err(MovementError::InvalidGroup(format!(
                "A {} needs exactly two legs, got {}",
                kind.label(),
                legs.len()
            )));
        }

        for leg in legs {
            self.validate_movement(leg)?;
        }

        Ok(())
    }
}

/// Editor contract for a grouped movement
///
/// The editor receives one representative leg plus the whole view and must
/// return every row that should be written back as one logical save.
pub trait GroupEditor: Send + Sync {
    fn edit(&self, representative: &Movement, view: &MovementView) -> MovementResult<Vec<Movement>>;
}
