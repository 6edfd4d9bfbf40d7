//! In-memory storage implementation for testing

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::feed::{ChangeFeed, MovementChange};
use crate::traits::*;
use crate::types::*;

/// In-memory storage implementation for testing and development
///
/// Clones share the same data, feed and request counter.
#[derive(Debug, Clone)]
pub struct MemoryStorage {
    movements: Arc<RwLock<HashMap<String, Movement>>>,
    failing: Arc<RwLock<HashSet<String>>>,
    requests: Arc<AtomicUsize>,
    feed: ChangeFeed,
}

impl MemoryStorage {
    /// Create a new memory storage instance
    pub fn new() -> Self {
        Self {
            movements: Arc::new(RwLock::new(HashMap::new())),
            failing: Arc::new(RwLock::new(HashSet::new())),
            requests: Arc::new(AtomicUsize::new(0)),
            feed: ChangeFeed::new(),
        }
    }

    /// Feed receiving an event for every write
    pub fn feed(&self) -> &ChangeFeed {
        &self.feed
    }

    /// Make every request touching this movement fail
    pub fn fail_on(&self, movement_id: &str) -> MovementResult<()> {
        self.failing
            .write()
            .map_err(|_| MovementError::Storage("failure set lock poisoned".to_string()))?
            .insert(movement_id.to_string());
        Ok(())
    }

    /// Number of requests served so far
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    /// Clear all data (useful for testing)
    pub fn clear(&self) -> MovementResult<()> {
        self.write()?.clear();
        Ok(())
    }

    fn read(&self) -> MovementResult<RwLockReadGuard<'_, HashMap<String, Movement>>> {
        self.movements
            .read()
            .map_err(|_| MovementError::Storage("movement store lock poisoned".to_string()))
    }

    fn write(&self) -> MovementResult<RwLockWriteGuard<'_, HashMap<String, Movement>>> {
        self.movements
            .write()
            .map_err(|_| MovementError::Storage("movement store lock poisoned".to_string()))
    }

    /// Count a request and reject it if it touches a failing movement
    fn begin_request<'a>(&self, ids: impl IntoIterator<Item = &'a str>) -> MovementResult<()> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .failing
            .read()
            .map_err(|_| MovementError::Storage("failure set lock poisoned".to_string()))?;
        for id in ids {
            if failing.contains(id) {
                return Err(MovementError::Storage(format!(
                    "request for movement '{}' failed",
                    id
                )));
            }
        }
        Ok(())
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MovementStorage for MemoryStorage {
    async fn save_movement(&mut self, movement: &Movement) -> MovementResult<()> {
        self.begin_request([movement.id.as_str()])?;
        self.write()?
            .insert(movement.id.clone(), movement.clone());
        self.feed
            .publish(&MovementChange::Inserted(movement.id.clone()));
        Ok(())
    }

    async fn save_movements(&mut self, movements: &[Movement]) -> MovementResult<()> {
        self.begin_request(movements.iter().map(|m| m.id.as_str()))?;
        {
            let mut store = self.write()?;
            for movement in movements {
                store.insert(movement.id.clone(), movement.clone());
            }
        }
        for movement in movements {
            self.feed
                .publish(&MovementChange::Inserted(movement.id.clone()));
        }
        Ok(())
    }

    async fn get_movement(&self, movement_id: &str) -> MovementResult<Option<Movement>> {
        self.begin_request([movement_id])?;
        Ok(self.read()?.get(movement_id).cloned())
    }

    async fn list_movements(&self, scope: &MovementScope) -> MovementResult<Vec<Movement>> {
        self.begin_request(std::iter::empty())?;
        let mut filtered: Vec<Movement> = self
            .read()?
            .values()
            .filter(|movement| scope.contains(movement))
            .cloned()
            .collect();
        // HashMap order is arbitrary; keep listings stable
        filtered.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(filtered)
    }

    async fn update_movement(&mut self, movement: &Movement) -> MovementResult<()> {
        self.begin_request([movement.id.as_str()])?;
        {
            let mut store = self.write()?;
            match store.get_mut(&movement.id) {
                Some(existing) => *existing = movement.clone(),
                None => return Err(MovementError::MovementNotFound(movement.id.clone())),
            }
        }
        self.feed
            .publish(&MovementChange::Updated(movement.id.clone()));
        Ok(())
    }

    async fn delete_movement(&mut self, movement_id: &str) -> MovementResult<()> {
        self.begin_request([movement_id])?;
        if self.write()?.remove(movement_id).is_none() {
            return Err(MovementError::MovementNotFound(movement_id.to_string()));
        }
        self.feed
            .publish(&MovementChange::Deleted(movement_id.to_string()));
        Ok(())
    }

    async fn delete_movements(&mut self, movement_ids: &[String]) -> MovementResult<()> {
        self.begin_request(movement_ids.iter().map(String::as_str))?;
        {
            let mut store = self.write()?;
            // The batch either removes every row or none
            if let Some(missing) = movement_ids.iter().find(|id| !store.contains_key(*id)) {
                return Err(MovementError::MovementNotFound(missing.clone()));
            }
            for id in movement_ids {
                store.remove(id);
            }
        }
        for id in movement_ids {
            self.feed.publish(&MovementChange::Deleted(id.clone()));
        }
        Ok(())
    }

    async fn replace_movements(
        &mut self,
        removed_ids: &[String],
        movements: &[Movement],
    ) -> MovementResult<()> {
        self.begin_request(
            removed_ids
                .iter()
                .map(String::as_str)
                .chain(movements.iter().map(|m| m.id.as_str())),
        )?;

        let mut changes = Vec::with_capacity(removed_ids.len() + movements.len());
        {
            let mut store = self.write()?;
            if let Some(missing) = removed_ids.iter().find(|id| !store.contains_key(*id)) {
                return Err(MovementError::MovementNotFound(missing.clone()));
            }
            for id in removed_ids {
                store.remove(id);
                changes.push(MovementChange::Deleted(id.clone()));
            }
            for movement in movements {
                let change = match store.insert(movement.id.clone(), movement.clone()) {
                    Some(_) => MovementChange::Updated(movement.id.clone()),
                    None => MovementChange::Inserted(movement.id.clone()),
                };
                changes.push(change);
            }
        }
        for change in &changes {
            self.feed.publish(change);
        }
        Ok(())
    }

    async fn set_favorite(&mut self, movement_id: &str, is_favorite: bool) -> MovementResult<()> {
        self.begin_request([movement_id])?;
        {
            let mut store = self.write()?;
            let movement = store
                .get_mut(movement_id)
                .ok_or_else(|| MovementError::MovementNotFound(movement_id.to_string()))?;
            movement.is_favorite = is_favorite;
        }
        self.feed
            .publish(&MovementChange::Updated(movement_id.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::fixtures::*;
    use std::sync::Mutex;

    #[tokio::test]
    async fn test_crud_and_scope() {
        let mut storage = MemoryStorage::new();
        let mut project_row = movement("2", "Egreso", "-5", "USD");
        project_row.project_id = Some("p1".to_string());

        storage
            .save_movements(&[movement("1", "Ingreso", "5", "USD"), project_row])
            .await
            .unwrap();

        let all = storage
            .list_movements(&MovementScope::organization("org1"))
            .await
            .unwrap();
        assert_eq!(all.len(), 2);

        let project = storage
            .list_movements(&MovementScope::project("org1", "p1"))
            .await
            .unwrap();
        assert_eq!(project.len(), 1);
        assert_eq!(project[0].id, "2");

        storage.set_favorite("1", true).await.unwrap();
        assert!(storage.get_movement("1").await.unwrap().unwrap().is_favorite);

        storage.delete_movement("1").await.unwrap();
        assert!(storage.get_movement("1").await.unwrap().is_none());
        assert!(matches!(
            storage.delete_movement("1").await,
            Err(MovementError::MovementNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_batch_delete_is_all_or_nothing() {
        let mut storage = MemoryStorage::new();
        storage
            .save_movement(&movement("1", "Ingreso", "5", "USD"))
            .await
            .unwrap();

        let result = storage
            .delete_movements(&["1".to_string(), "missing".to_string()])
            .await;
        assert!(result.is_err());
        assert!(storage.get_movement("1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_replace_is_all_or_nothing() {
        let mut storage = MemoryStorage::new();
        storage
            .save_movements(&[
                movement("1", "Egreso", "-5", "USD"),
                movement("2", "Ingreso", "5", "USD"),
            ])
            .await
            .unwrap();

        let mut edited = movement("1", "Egreso", "-7", "USD");
        edited.description = Some("ajuste".to_string());
        let result = storage
            .replace_movements(
                &["2".to_string(), "missing".to_string()],
                &[edited.clone(), movement("3", "Ingreso", "7", "USD")],
            )
            .await;
        assert!(matches!(result, Err(MovementError::MovementNotFound(_))));
        assert!(storage.get_movement("2").await.unwrap().is_some());
        assert!(storage.get_movement("3").await.unwrap().is_none());
        assert_eq!(
            storage.get_movement("1").await.unwrap().unwrap().description.as_deref(),
            Some("Movement 1")
        );

        storage
            .replace_movements(&["2".to_string()], &[edited, movement("3", "Ingreso", "7", "USD")])
            .await
            .unwrap();
        assert!(storage.get_movement("2").await.unwrap().is_none());
        assert!(storage.get_movement("3").await.unwrap().is_some());
        assert_eq!(
            storage.get_movement("1").await.unwrap().unwrap().description.as_deref(),
            Some("ajuste")
        );
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let mut storage = MemoryStorage::new();
        storage
            .save_movement(&movement("1", "Ingreso", "5", "USD"))
            .await
            .unwrap();
        storage.fail_on("1").unwrap();

        assert!(matches!(
            storage.set_favorite("1", true).await,
            Err(MovementError::Storage(_))
        ));
    }

    #[tokio::test]
    async fn test_writes_are_published() {
        let mut storage = MemoryStorage::new();
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let _subscription = storage
            .feed()
            .subscribe(move |change| sink.lock().unwrap().push(change.clone()));

        storage
            .save_movement(&movement("1", "Ingreso", "5", "USD"))
            .await
            .unwrap();
        storage.set_favorite("1", true).await.unwrap();
        storage.delete_movements(&["1".to_string()]).await.unwrap();

        assert_eq!(
            *events.lock().unwrap(),
            vec![
                MovementChange::Inserted("1".to_string()),
                MovementChange::Updated("1".to_string()),
                MovementChange::Deleted("1".to_string()),
            ]
        );
    }
}
