//! Round-robin category rotation and its persistence.

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// Pointer into a fixed list of categories.
///
/// `current_index` is the category used by the last successful tick and is
/// always within `[0, categories.len())` for a non-empty list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotationState {
    pub current_index: usize,
    pub last_run: Option<DateTime<Utc>>,
    pub categories: Vec<String>,
}

impl RotationState {
    /// State before any tick: the first tick picks the head of the list.
    pub fn initial(categories: Vec<String>) -> Self {
        Self {
            current_index: categories.len().saturating_sub(1),
            last_run: None,
            categories,
        }
    }

    /// Category for the next tick and the index it sits at.
    ///
    /// `None` when there are no categories.
    pub fn next_category(&self) -> Option<(&str, usize)> {
        let len = self.categories.len();
        if len == 0 {
            return None;
        }
        let index = (self.current_index % len + 1) % len;
        Some((self.categories[index].as_str(), index))
    }

    /// State after a successful tick that used the category at `index`.
    pub fn advanced_to(&self, index: usize, now: DateTime<Utc>) -> Self {
        Self {
            current_index: index % self.categories.len().max(1),
            last_run: Some(now),
            categories: self.categories.clone(),
        }
    }
}

/// Persistence for rotation state, keyed by automation name.
#[async_trait]
pub trait RotationStore: Send + Sync {
    async fn load(&self, name: &str) -> Result<Option<RotationState>>;

    async fn save(&self, name: &str, state: &RotationState) -> Result<()>;
}

// =============================================================================
// Postgres
// =============================================================================

#[derive(sqlx::FromRow)]
struct RotationRow {
    current_index: i32,
    last_run: Option<DateTime<Utc>>,
    categories: sqlx::types::Json<Vec<String>>,
}

pub struct PostgresRotationStore {
    pool: PgPool,
}

impl PostgresRotationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RotationStore for PostgresRotationStore {
    async fn load(&self, name: &str) -> Result<Option<RotationState>> {
        let row = sqlx::query_as::<_, RotationRow>(
            "SELECT current_index, last_run, categories FROM automation_state WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| RotationState {
            current_index: row.current_index.max(0) as usize,
            last_run: row.last_run,
            categories: row.categories.0,
        }))
    }

    async fn save(&self, name: &str, state: &RotationState) -> Result<()> {
        let current_index =
            i32::try_from(state.current_index).context("Rotation index out of range")?;

        sqlx::query(
            r#"
            INSERT INTO automation_state (name, current_index, last_run, categories, updated_at)
            VALUES ($1, $2, $3, $4, NOW())
            ON CONFLICT (name) DO UPDATE
            SET current_index = EXCLUDED.current_index,
                last_run = EXCLUDED.last_run,
                categories = EXCLUDED.categories,
                updated_at = NOW()
            "#,
        )
        .bind(name)
        .bind(current_index)
        .bind(state.last_run)
        .bind(sqlx::types::Json(&state.categories))
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// =============================================================================
// In-memory
// =============================================================================

#[derive(Default)]
pub struct MemoryRotationStore {
    states: Mutex<HashMap<String, RotationState>>,
}

impl MemoryRotationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RotationStore for MemoryRotationStore {
    async fn load(&self, name: &str) -> Result<Option<RotationState>> {
        let states = self.states.lock().unwrap_or_else(|e| e.into_inner());
        Ok(states.get(name).cloned())
    }

    async fn save(&self, name: &str, state: &RotationState) -> Result<()> {
        let mut states = self.states.lock().unwrap_or_else(|e| e.into_inner());
        states.insert(name.to_string(), state.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn abc(current_index: usize) -> RotationState {
        RotationState {
            current_index,
            last_run: None,
            categories: vec!["A".into(), "B".into(), "C".into()],
        }
    }

    #[test]
    fn test_wraps_around() {
        assert_eq!(abc(2).next_category(), Some(("A", 0)));
    }

    #[test]
    fn test_steps_forward() {
        assert_eq!(abc(0).next_category(), Some(("B", 1)));
    }

    #[test]
    fn test_initial_starts_at_head() {
        let state = RotationState::initial(vec!["A".into(), "B".into()]);
        assert_eq!(state.next_category(), Some(("A", 0)));
    }

    #[test]
    fn test_out_of_range_index_is_normalised() {
        assert_eq!(abc(7).next_category(), Some(("C", 2)));
    }

    #[test]
    fn test_empty_has_no_next() {
        assert_eq!(RotationState::initial(vec![]).next_category(), None);
    }

    #[test]
    fn test_advanced_to_records_run() {
        let now = Utc::now();
        let state = abc(2).advanced_to(0, now);
        assert_eq!(state.current_index, 0);
        assert_eq!(state.last_run, Some(now));
    }

    #[tokio::test]
    async fn test_memory_store_round_trip() {
        let store = MemoryRotationStore::new();
        assert!(store.load("rotation").await.unwrap().is_none());

        store.save("rotation", &abc(1)).await.unwrap();
        assert_eq!(store.load("rotation").await.unwrap(), Some(abc(1)));
    }
}
