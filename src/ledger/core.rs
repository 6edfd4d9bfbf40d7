//! Main ledger orchestrator that coordinates movements, grouping and views

use crate::config::MovementsConfig;
use crate::ledger::{
    wallet_balances, ActionOutcome, ConversionParams, FanOutReport, MovementActions,
    MovementManager, TransferParams, WalletBalance,
};
use crate::listing::{movement_columns, ListQuery, ListView, Page};
use crate::reconciliation::{MovementGrouper, MovementView};
use crate::traits::*;
use crate::types::*;

/// Movements ledger for one application session
///
/// Owns its configuration and storage handles; nothing here is process-wide.
pub struct MovementLedger<S: MovementStorage> {
    manager: MovementManager<S>,
    actions: MovementActions<S>,
    grouper: MovementGrouper,
    config: MovementsConfig,
}

impl<S: MovementStorage + Clone> MovementLedger<S> {
    /// Create a new ledger with default configuration
    pub fn new(storage: S) -> Self {
        let config = MovementsConfig::default();
        Self {
            manager: MovementManager::new(storage.clone()),
            actions: MovementActions::new(storage),
            grouper: MovementGrouper::default(),
            config,
        }
    }

    /// Create a new ledger with a validated configuration
    pub fn with_config(storage: S, config: MovementsConfig) -> MovementResult<Self> {
        Ok(Self {
            grouper: MovementGrouper::new(&config)?,
            manager: MovementManager::new(storage.clone()),
            actions: MovementActions::new(storage),
            config,
        })
    }

    /// Create a new ledger with custom validators for writes and group edits
    pub fn with_validators(
        storage: S,
        config: MovementsConfig,
        movement_validator: Box<dyn MovementValidator>,
        edit_validator: Box<dyn MovementValidator>,
    ) -> MovementResult<Self> {
        Ok(Self {
            grouper: MovementGrouper::new(&config)?,
            manager: MovementManager::with_validator(storage.clone(), movement_validator),
            actions: MovementActions::with_validator(storage, edit_validator),
            config,
        })
    }

    pub fn config(&self) -> &MovementsConfig {
        &self.config
    }

    // Movement operations
    /// Record a new standalone movement
    pub async fn create_movement(&mut self, movement: Movement) -> MovementResult<Movement> {
        self.manager.create_movement(movement).await
    }

    /// Get a movement by ID
    pub async fn get_movement(&self, movement_id: &str) -> MovementResult<Option<Movement>> {
        self.manager.get_movement(movement_id).await
    }

    /// List raw movements inside a scope
    pub async fn list_movements(&self, scope: &MovementScope) -> MovementResult<Vec<Movement>> {
        self.manager.list_movements(scope).await
    }

    /// Update a movement
    pub async fn update_movement(&mut self, movement: &Movement) -> MovementResult<()> {
        self.manager.update_movement(movement).await
    }

    /// Delete a single movement
    pub async fn delete_movement(&mut self, movement_id: &str) -> MovementResult<()> {
        self.manager.delete_movement(movement_id).await
    }

    /// Record a currency conversion; returns the group id
    pub async fn record_conversion(&mut self, params: ConversionParams) -> MovementResult<String> {
        self.manager.record_conversion(params).await
    }

    /// Record a transfer between wallets; returns the group id
    pub async fn record_transfer(&mut self, params: TransferParams) -> MovementResult<String> {
        self.manager.record_transfer(params).await
    }

    // View operations
    /// Movements inside a scope with conversion and transfer legs folded together
    pub async fn grouped_movements(&self, scope: &MovementScope) -> MovementResult<Vec<MovementView>> {
        let movements = self.list_movements(scope).await?;
        Ok(self.grouper.group(&movements))
    }

    /// List view over the grouped movements of a scope
    pub fn list_view(&self) -> ListView<MovementView> {
        ListView::new(movement_columns())
            .page_size(self.config.page_size)
            .window_threshold(self.config.page_window_threshold)
            .date_fallback("created_at")
    }

    /// Fetch, group, filter, sort and paginate one page of the movements table
    pub async fn list_page(
        &self,
        scope: &MovementScope,
        query: &ListQuery,
    ) -> MovementResult<Page<MovementView>> {
        let views = self.grouped_movements(scope).await?;
        Ok(self.list_view().apply(views, query))
    }

    /// Balances per wallet and currency inside a scope
    pub async fn wallet_balances(&self, scope: &MovementScope) -> MovementResult<Vec<WalletBalance>> {
        let movements = self.list_movements(scope).await?;
        Ok(wallet_balances(&movements))
    }

    // Fan-out actions
    /// Toggle the favorite flag on every leg of a view
    pub async fn toggle_favorite(&mut self, view: &MovementView) -> (ActionOutcome, FanOutReport) {
        self.actions.toggle_favorite(view).await
    }

    /// Delete every leg of a view in one batch
    pub async fn delete_view(&mut self, view: &MovementView) -> ActionOutcome {
        self.actions.delete(view).await
    }

    /// Edit a view through a group editor
    pub async fn edit_view(
        &mut self,
        view: &MovementView,
        editor: &dyn GroupEditor,
    ) -> MovementResult<Vec<Movement>> {
        self.actions.edit(view, editor).await
    }
}
