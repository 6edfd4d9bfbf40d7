//! User actions fanned out over every leg of a grouped movement

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashSet;

use crate::reconciliation::MovementView;
use crate::traits::*;
use crate::types::*;

/// Single user-facing result of an action, whatever number of requests it took
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionOutcome {
    pub success: bool,
    pub message: String,
}

impl ActionOutcome {
    fn succeeded(message: String) -> Self {
        Self {
            success: true,
            message,
        }
    }

    fn failed(message: String) -> Self {
        Self {
            success: false,
            message,
        }
    }
}

/// Per-leg results of a fan-out; nothing is rolled back on failure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FanOutReport {
    pub succeeded: Vec<String>,
    pub failed: Vec<(String, String)>,
}

impl FanOutReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

fn entity_label(view: &MovementView) -> &'static str {
    view.kind().map(|k| k.label()).unwrap_or("movement")
}

/// Rewrites shared metadata onto every leg of a view
#[derive(Debug, Clone, Default)]
pub struct LegRewriter {
    pub description: Option<String>,
    pub movement_date: Option<NaiveDate>,
    pub category: Option<String>,
}

impl GroupEditor for LegRewriter {
    fn edit(&self, _representative: &Movement, view: &MovementView) -> MovementResult<Vec<Movement>> {
        Ok(view
            .members()
            .iter()
            .cloned()
            .map(|mut leg| {
                if let Some(description) = &self.description {
                    leg.description = Some(description.clone());
                }
                if let Some(date) = self.movement_date {
                    leg.movement_date = date;
                }
                if let Some(category) = &self.category {
                    leg.category = category.clone();
                }
                leg
            })
            .collect())
    }
}

/// Favorite toggles, edits and deletes over movement views
pub struct MovementActions<S: MovementStorage> {
    storage: S,
    validator: Box<dyn MovementValidator>,
}

impl<S: MovementStorage> MovementActions<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            validator: Box::new(DefaultMovementValidator),
        }
    }

    pub fn with_validator(storage: S, validator: Box<dyn MovementValidator>) -> Self {
        Self { storage, validator }
    }

    /// Flip the favorite flag of every leg, one independent request per leg.
    ///
    /// Each leg flips its own flag, so legs that already disagree keep
    /// disagreeing. Failures are collected, not retried or rolled back.
    pub async fn toggle_favorite(&mut self, view: &MovementView) -> (ActionOutcome, FanOutReport) {
        let mut report = FanOutReport::default();

        for leg in view.members() {
            match self.storage.set_favorite(&leg.id, !leg.is_favorite).await {
                Ok(()) => report.succeeded.push(leg.id.clone()),
                Err(e) => {
                    tracing::warn!(movement_id = %leg.id, error = %e, "favorite toggle failed");
                    report.failed.push((leg.id.clone(), e.to_string()));
                }
            }
        }

        let label = entity_label(view);
        let outcome = if report.is_complete() {
            ActionOutcome::succeeded(format!("{} favorite updated", label))
        } else {
            ActionOutcome::failed(format!("could not update {} favorite", label))
        };

        (outcome, report)
    }

    /// Delete every leg in one batch request
    pub async fn delete(&mut self, view: &MovementView) -> ActionOutcome {
        let ids = view.movement_ids();
        let label = entity_label(view);

        match self.storage.delete_movements(&ids).await {
            Ok(()) => {
                tracing::info!(kind = label, id = %view.id(), legs = ids.len(), "deleted");
                ActionOutcome::succeeded(format!("{} deleted", label))
            }
            Err(e) => {
                tracing::warn!(kind = label, id = %view.id(), error = %e, "delete failed");
                ActionOutcome::failed(format!("could not delete {}", label))
            }
        }
    }

    /// Run an editor over a view and write back its result as one logical save.
    ///
    /// The rewritten rows and the removal of legs the editor dropped go out
    /// in a single `replace_movements` request, so a failed write leaves the
    /// stored legs untouched.
    pub async fn edit(
        &mut self,
        view: &MovementView,
        editor: &dyn GroupEditor,
    ) -> MovementResult<Vec<Movement>> {
        let representative = view.representative().ok_or_else(|| {
            MovementError::InvalidGroup(format!("{} '{}' has no legs", entity_label(view), view.id()))
        })?;
        let rows = editor.edit(representative, view)?;

        match view.kind() {
            Some(kind) => self.validator.validate_legs(kind, &rows)?,
            None => {
                if rows.len() != 1 {
                    return Err(MovementError::Validation(
                        "Editing a movement must yield exactly one row".to_string(),
                    ));
                }
                self.validator.validate_movement(&rows[0])?;
            }
        }

        let kept: HashSet<&str> = rows.iter().map(|row| row.id.as_str()).collect();
        let stale: Vec<String> = view
            .movement_ids()
            .into_iter()
            .filter(|id| !kept.contains(id.as_str()))
            .collect();

        if let Err(e) = self.storage.replace_movements(&stale, &rows).await {
            tracing::warn!(kind = entity_label(view), id = %view.id(), error = %e, "edit failed");
            return Err(e);
        }

        tracing::info!(
            kind = entity_label(view),
            id = %view.id(),
            replaced = stale.len(),
            "edited"
        );
        Ok(rows)
    }
}
