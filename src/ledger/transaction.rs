//! Movement recording and management

use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime};
use uuid::Uuid;

use crate::traits::*;
use crate::types::*;

/// Parameters for recording a currency conversion
pub struct ConversionParams {
    pub date: NaiveDate,
    pub organization_id: String,
    pub project_id: Option<String>,
    pub created_by: String,
    pub description: Option<String>,
    pub outgoing_type: MovementType,
    pub incoming_type: MovementType,
    pub category: String,
    pub from_wallet: String,
    pub to_wallet: String,
    pub from_currency: String,
    pub to_currency: String,
    /// Amount leaving `from_wallet`, positive
    pub from_amount: BigDecimal,
    /// Amount arriving in `to_wallet`, positive
    pub to_amount: BigDecimal,
}

/// Parameters for recording a transfer between wallets
pub struct TransferParams {
    pub date: NaiveDate,
    pub organization_id: String,
    pub project_id: Option<String>,
    pub created_by: String,
    pub description: Option<String>,
    pub outgoing_type: MovementType,
    pub incoming_type: MovementType,
    pub category: String,
    pub from_wallet: String,
    pub to_wallet: String,
    pub currency: String,
    /// Amount moved, positive
    pub amount: BigDecimal,
}

/// Movement manager for handling movement operations
pub struct MovementManager<S: MovementStorage> {
    pub(crate) storage: S,
    validator: Box<dyn MovementValidator>,
}

impl<S: MovementStorage> MovementManager<S> {
    /// Create a new movement manager
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            validator: Box::new(DefaultMovementValidator),
        }
    }

    /// Create a new movement manager with custom validator
    pub fn with_validator(storage: S, validator: Box<dyn MovementValidator>) -> Self {
        Self { storage, validator }
    }

    /// Record a new standalone movement
    pub async fn create_movement(&mut self, movement: Movement) -> MovementResult<Movement> {
        self.validator.validate_movement(&movement)?;

        if self.storage.get_movement(&movement.id).await?.is_some() {
            return Err(MovementError::Validation(format!(
                "Movement with ID '{}' already exists",
                movement.id
            )));
        }

        self.storage.save_movement(&movement).await?;
        tracing::info!(movement_id = %movement.id, "movement recorded");

        Ok(movement)
    }

    /// Get a movement by ID
    pub async fn get_movement(&self, movement_id: &str) -> MovementResult<Option<Movement>> {
        self.storage.get_movement(movement_id).await
    }

    /// Get a movement by ID, returning an error if not found
    pub async fn get_movement_required(&self, movement_id: &str) -> MovementResult<Movement> {
        self.storage
            .get_movement(movement_id)
            .await?
            .ok_or_else(|| MovementError::MovementNotFound(movement_id.to_string()))
    }

    /// List movements inside a scope
    pub async fn list_movements(&self, scope: &MovementScope) -> MovementResult<Vec<Movement>> {
        self.storage.list_movements(scope).await
    }

    /// Update a movement
    pub async fn update_movement(&mut self, movement: &Movement) -> MovementResult<()> {
        self.validator.validate_movement(movement)?;

        if self.storage.get_movement(&movement.id).await?.is_none() {
            return Err(MovementError::MovementNotFound(movement.id.clone()));
        }

        self.storage.update_movement(movement).await
    }

    /// Delete a single movement
    pub async fn delete_movement(&mut self, movement_id: &str) -> MovementResult<()> {
        if self.storage.get_movement(movement_id).await?.is_none() {
            return Err(MovementError::MovementNotFound(movement_id.to_string()));
        }

        self.storage.delete_movement(movement_id).await
    }

    /// Record both legs of a conversion in one request; returns the group id
    pub async fn record_conversion(&mut self, params: ConversionParams) -> MovementResult<String> {
        let legs = patterns::conversion_legs(params)?;
        self.record_legs(GroupKind::Conversion, legs).await
    }

    /// Record both legs of a transfer in one request; returns the group id
    pub async fn record_transfer(&mut self, params: TransferParams) -> MovementResult<String> {
        let legs = patterns::transfer_legs(params)?;
        self.record_legs(GroupKind::Transfer, legs).await
    }

    async fn record_legs(&mut self, kind: GroupKind, legs: [Movement; 2]) -> MovementResult<String> {
        self.validator.validate_legs(kind, &legs)?;

        let group_id = legs[0]
            .group_id(kind)
            .map(str::to_string)
            .ok_or_else(|| MovementError::InvalidGroup(format!("{} legs lack a group id", kind.label())))?;

        self.storage.save_movements(&legs).await?;
        tracing::info!(kind = kind.label(), group_id = %group_id, "group recorded");

        Ok(group_id)
    }
}

/// Builder for movement rows
#[derive(Debug)]
pub struct MovementBuilder {
    movement: Movement,
}

impl MovementBuilder {
    /// Start a movement; the id is generated
    pub fn new(date: NaiveDate, organization_id: String, created_by: String) -> Self {
        let now = chrono::Utc::now().naive_utc();
        Self {
            movement: Movement {
                id: Uuid::new_v4().to_string(),
                movement_date: date,
                created_at: now,
                movement_type: MovementType::new("", ""),
                category: String::new(),
                subcategory: None,
                description: None,
                amount: BigDecimal::from(0),
                currency: String::new(),
                wallet: String::new(),
                exchange_rate: None,
                conversion_group_id: None,
                transfer_group_id: None,
                organization_id,
                project_id: None,
                created_by,
                is_favorite: false,
            },
        }
    }

    pub fn id(mut self, id: String) -> Self {
        self.movement.id = id;
        self
    }

    pub fn created_at(mut self, created_at: NaiveDateTime) -> Self {
        self.movement.created_at = created_at;
        self
    }

    pub fn movement_type(mut self, movement_type: MovementType) -> Self {
        self.movement.movement_type = movement_type;
        self
    }

    pub fn category(mut self, category: String) -> Self {
        self.movement.category = category;
        self
    }

    pub fn subcategory(mut self, subcategory: String) -> Self {
        self.movement.subcategory = Some(subcategory);
        self
    }

    pub fn description(mut self, description: String) -> Self {
        self.movement.description = Some(description);
        self
    }

    /// Signed amount with its currency
    pub fn amount(mut self, amount: BigDecimal, currency: String) -> Self {
        self.movement.amount = amount;
        self.movement.currency = currency;
        self
    }

    pub fn wallet(mut self, wallet: String) -> Self {
        self.movement.wallet = wallet;
        self
    }

    pub fn exchange_rate(mut self, rate: BigDecimal) -> Self {
        self.movement.exchange_rate = Some(rate);
        self
    }

    pub fn project(mut self, project_id: String) -> Self {
        self.movement.project_id = Some(project_id);
        self
    }

    pub fn conversion_group(mut self, group_id: String) -> Self {
        self.movement.conversion_group_id = Some(group_id);
        self.movement.transfer_group_id = None;
        self
    }

    pub fn transfer_group(mut self, group_id: String) -> Self {
        self.movement.transfer_group_id = Some(group_id);
        self.movement.conversion_group_id = None;
        self
    }

    pub fn favorite(mut self, is_favorite: bool) -> Self {
        self.movement.is_favorite = is_favorite;
        self
    }

    /// Build the movement
    pub fn build(self) -> MovementResult<Movement> {
        let m = &self.movement;
        if m.movement_type.name.trim().is_empty() {
            return Err(MovementError::Validation(
                "Movement type is required".to_string(),
            ));
        }
        if m.currency.trim().is_empty() || m.wallet.trim().is_empty() {
            return Err(MovementError::Validation(
                "Movement needs a currency and a wallet".to_string(),
            ));
        }
        DefaultMovementValidator.validate_movement(m)?;
        Ok(self.movement)
    }
}

/// Common movement patterns
pub mod patterns {
    use super::*;

    fn require_positive(amount: &BigDecimal, what: &str) -> MovementResult<()> {
        if *amount <= BigDecimal::from(0) {
            return Err(MovementError::Validation(format!(
                "{} must be positive",
                what
            )));
        }
        Ok(())
    }

    /// Money coming into a wallet
    #[allow(clippy::too_many_arguments)]
    pub fn income(
        date: NaiveDate,
        organization_id: String,
        created_by: String,
        movement_type: MovementType,
        category: String,
        wallet: String,
        currency: String,
        amount: BigDecimal,
    ) -> MovementResult<Movement> {
        require_positive(&amount, "Income amount")?;
        MovementBuilder::new(date, organization_id, created_by)
            .movement_type(movement_type)
            .category(category)
            .wallet(wallet)
            .amount(amount, currency)
            .build()
    }

    /// Money leaving a wallet; stored with a negative amount
    #[allow(clippy::too_many_arguments)]
    pub fn expense(
        date: NaiveDate,
        organization_id: String,
        created_by: String,
        movement_type: MovementType,
        category: String,
        wallet: String,
        currency: String,
        amount: BigDecimal,
    ) -> MovementResult<Movement> {
        require_positive(&amount, "Expense amount")?;
        MovementBuilder::new(date, organization_id, created_by)
            .movement_type(movement_type)
            .category(category)
            .wallet(wallet)
            .amount(-amount, currency)
            .build()
    }

    /// Outgoing and incoming legs of a conversion sharing a fresh group id
    pub fn conversion_legs(params: ConversionParams) -> MovementResult<[Movement; 2]> {
        require_positive(&params.from_amount, "Conversion source amount")?;
        require_positive(&params.to_amount, "Conversion target amount")?;

        let group_id = Uuid::new_v4().to_string();
        let rate = &params.to_amount / &params.from_amount;

        let leg = |movement_type: MovementType, wallet: String, amount: BigDecimal, currency: String| {
            let mut builder = MovementBuilder::new(
                params.date,
                params.organization_id.clone(),
                params.created_by.clone(),
            )
            .movement_type(movement_type)
            .category(params.category.clone())
            .wallet(wallet)
            .amount(amount, currency)
            .exchange_rate(rate.clone())
            .conversion_group(group_id.clone());
            if let Some(description) = &params.description {
                builder = builder.description(description.clone());
            }
            if let Some(project_id) = &params.project_id {
                builder = builder.project(project_id.clone());
            }
            builder.build()
        };

        let outgoing = leg(
            params.outgoing_type.clone(),
            params.from_wallet.clone(),
            -params.from_amount.clone(),
            params.from_currency.clone(),
        )?;
        let incoming = leg(
            params.incoming_type.clone(),
            params.to_wallet.clone(),
            params.to_amount.clone(),
            params.to_currency.clone(),
        )?;

        Ok([outgoing, incoming])
    }

    /// Outgoing and incoming legs of a transfer sharing a fresh group id
    pub fn transfer_legs(params: TransferParams) -> MovementResult<[Movement; 2]> {
        require_positive(&params.amount, "Transfer amount")?;

        let group_id = Uuid::new_v4().to_string();

        let leg = |movement_type: MovementType, wallet: String, amount: BigDecimal| {
            let mut builder = MovementBuilder::new(
                params.date,
                params.organization_id.clone(),
                params.created_by.clone(),
            )
            .movement_type(movement_type)
            .category(params.category.clone())
            .wallet(wallet)
            .amount(amount, params.currency.clone())
            .transfer_group(group_id.clone());
            if let Some(description) = &params.description {
                builder = builder.description(description.clone());
            }
            if let Some(project_id) = &params.project_id {
                builder = builder.project(project_id.clone());
            }
            builder.build()
        };

        let outgoing = leg(
            params.outgoing_type.clone(),
            params.from_wallet.clone(),
            -params.amount.clone(),
        )?;
        let incoming = leg(
            params.incoming_type.clone(),
            params.to_wallet.clone(),
            params.amount.clone(),
        )?;

        Ok([outgoing, incoming])
    }
}

#[cfg(test)]
pub(crate) mod test_params {
    use super::*;

    pub fn conversion(from: i64, to: i64) -> ConversionParams {
        ConversionParams {
            date: NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
            organization_id: "org1".to_string(),
            project_id: None,
            created_by: "user1".to_string(),
            description: Some("Compra de pesos".to_string()),
            outgoing_type: MovementType::new("t-eg", "Egreso"),
            incoming_type: MovementType::new("t-in", "Ingreso"),
            category: "Conversión".to_string(),
            from_wallet: "Caja USD".to_string(),
            to_wallet: "Caja ARS".to_string(),
            from_currency: "USD".to_string(),
            to_currency: "ARS".to_string(),
            from_amount: BigDecimal::from(from),
            to_amount: BigDecimal::from(to),
        }
    }

    pub fn transfer(amount: i64) -> TransferParams {
        TransferParams {
            date: NaiveDate::from_ymd_opt(2024, 3, 11).unwrap(),
            organization_id: "org1".to_string(),
            project_id: Some("p1".to_string()),
            created_by: "user1".to_string(),
            description: Some("Fondos a obra".to_string()),
            outgoing_type: MovementType::new("t-eg", "Egreso"),
            incoming_type: MovementType::new("t-in", "Ingreso"),
            category: "Transferencia".to_string(),
            from_wallet: "Banco".to_string(),
            to_wallet: "Caja".to_string(),
            currency: "USD".to_string(),
            amount: BigDecimal::from(amount),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconciliation::{group_movements, MovementView};
    use crate::utils::memory_storage::MemoryStorage;

    #[test]
    fn test_builder_requires_type_and_wallet() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let missing = MovementBuilder::new(date, "org1".to_string(), "u".to_string())
            .amount(BigDecimal::from(5), "USD".to_string())
            .wallet("Caja".to_string())
            .build();
        assert!(missing.is_err());

        let built = MovementBuilder::new(date, "org1".to_string(), "u".to_string())
            .id("m1".to_string())
            .movement_type(MovementType::new("t", "Ingreso"))
            .amount(BigDecimal::from(5), "USD".to_string())
            .wallet("Caja".to_string())
            .build()
            .unwrap();
        assert_eq!(built.id, "m1");
        assert!(built.is_organization_level());
    }

    #[test]
    fn test_expense_is_negative() {
        let expense = patterns::expense(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            "org1".to_string(),
            "u".to_string(),
            MovementType::new("t", "Egreso"),
            "Materiales".to_string(),
            "Caja".to_string(),
            "USD".to_string(),
            BigDecimal::from(40),
        )
        .unwrap();
        assert_eq!(expense.amount, BigDecimal::from(-40));
    }

    #[test]
    fn test_conversion_legs_share_group() {
        let [outgoing, incoming] = patterns::conversion_legs(test_params::conversion(100, 1850)).unwrap();

        assert_eq!(outgoing.conversion_group_id, incoming.conversion_group_id);
        assert!(outgoing.conversion_group_id.is_some());
        assert_eq!(outgoing.amount, BigDecimal::from(-100));
        assert_eq!(incoming.amount, BigDecimal::from(1850));
        assert_eq!(outgoing.exchange_rate, Some(BigDecimal::from(1850) / BigDecimal::from(100)));

        let views = group_movements(&[outgoing, incoming]);
        assert!(matches!(views.as_slice(), [MovementView::Conversion(_)]));
    }

    #[test]
    fn test_non_positive_amounts_rejected() {
        assert!(patterns::conversion_legs(test_params::conversion(0, 10)).is_err());
        assert!(patterns::transfer_legs(test_params::transfer(-5)).is_err());
    }

    #[tokio::test]
    async fn test_record_transfer_is_one_request() {
        let storage = MemoryStorage::new();
        let mut manager = MovementManager::new(storage.clone());

        let before = storage.request_count();
        let group_id = manager.record_transfer(test_params::transfer(500)).await.unwrap();
        assert_eq!(storage.request_count(), before + 1);

        let rows = manager
            .list_movements(&MovementScope::project("org1", "p1"))
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows
            .iter()
            .all(|m| m.transfer_group_id.as_deref() == Some(group_id.as_str())));
    }

    #[tokio::test]
    async fn test_duplicate_and_missing_movements() {
        let mut manager = MovementManager::new(MemoryStorage::new());
        let movement = patterns::income(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            "org1".to_string(),
            "u".to_string(),
            MovementType::new("t", "Ingreso"),
            "Ventas".to_string(),
            "Caja".to_string(),
            "USD".to_string(),
            BigDecimal::from(10),
        )
        .unwrap();

        manager.create_movement(movement.clone()).await.unwrap();
        assert!(matches!(
            manager.create_movement(movement.clone()).await,
            Err(MovementError::Validation(_))
        ));

        manager.delete_movement(&movement.id).await.unwrap();
        assert!(matches!(
            manager.get_movement_required(&movement.id).await,
            Err(MovementError::MovementNotFound(_))
        ));
        assert!(manager.update_movement(&movement).await.is_err());
    }
}
