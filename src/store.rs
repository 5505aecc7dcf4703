//! Department persistence
//!
//! Writes are insert-only: a row whose id already exists is reported as a
//! duplicate and left untouched. Every insert runs in its own savepoint so a
//! rejected row never aborts an enclosing transaction.

use chrono::Utc;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, SqlErr, TransactionTrait,
};
use tracing::{debug, warn};

use crate::department::{Department, DepartmentUpdate};
use crate::entity::department;
use crate::error::AppResult;

/// Result of a single insert attempt
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InsertOutcome {
    /// A new row was written
    Created,
    /// The id was already present; nothing changed
    Duplicate,
}

impl InsertOutcome {
    pub fn is_created(self) -> bool {
        self == InsertOutcome::Created
    }
}

/// Store handle, opened once per process and passed explicitly
#[derive(Clone)]
pub struct DepartmentStore {
    db: DatabaseConnection,
}

impl DepartmentStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Close the underlying pool
    pub async fn close(self) -> AppResult<()> {
        self.db.close().await?;
        Ok(())
    }

    /// Insert one department. Returns `true` if a row was created and
    /// `false` if the id already exists. Other store errors are returned.
    pub async fn persist(&self, dept: &Department) -> AppResult<bool> {
        let outcome = insert_or_skip(&self.db, dept).await?;
        Ok(outcome.is_created())
    }

    /// Insert a department, optionally writing its ancestors first (root to
    /// leaf). All writes share one transaction; only the department's own
    /// outcome is returned.
    pub async fn persist_with_ancestors(
        &self,
        dept: &Department,
        with_ancestors: bool,
    ) -> AppResult<bool> {
        let txn = self.db.begin().await?;

        if with_ancestors {
            let mut ancestors: Vec<&Department> = dept.ancestors().collect();
            while let Some(ancestor) = ancestors.pop() {
                insert_or_skip(&txn, ancestor).await?;
            }
        }

        let outcome = insert_or_skip(&txn, dept).await?;
        txn.commit().await?;

        Ok(outcome.is_created())
    }

    /// Apply `changes` to the row with `id` and refresh `updated_at`.
    /// Returns the number of rows modified (0 or 1).
    pub async fn update(&self, id: &str, changes: DepartmentUpdate) -> AppResult<u64> {
        let txn = self.db.begin().await?;

        let result = department::Entity::update_many()
            .set(changes.into_active_model(Utc::now()))
            .filter(department::Column::Id.eq(id))
            .exec(&txn)
            .await?;

        txn.commit().await?;

        debug!("Updated department {}: {} row(s)", id, result.rows_affected);
        Ok(result.rows_affected)
    }

    pub async fn find(&self, id: &str) -> AppResult<Option<department::Model>> {
        Ok(department::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await?)
    }

    pub async fn all(&self) -> AppResult<Vec<department::Model>> {
        Ok(department::Entity::find()
            .order_by_asc(department::Column::Id)
            .all(&self.db)
            .await?)
    }

    pub async fn count(&self) -> AppResult<u64> {
        Ok(department::Entity::find().count(&self.db).await?)
    }
}

/// Insert-only write inside a savepoint on `conn`
async fn insert_or_skip<C>(conn: &C, dept: &Department) -> AppResult<InsertOutcome>
where
    C: TransactionTrait,
{
    let savepoint = conn.begin().await?;

    let result = department::Entity::insert(dept.to_active_model())
        .exec_without_returning(&savepoint)
        .await;

    match result {
        Ok(_) => {
            savepoint.commit().await?;
            Ok(InsertOutcome::Created)
        }
        Err(err) => match duplicate_detail(&err) {
            Some(detail) => {
                savepoint.rollback().await?;
                warn!("Department {} not persisted: {}", dept.id, detail);
                Ok(InsertOutcome::Duplicate)
            }
            None => Err(err.into()),
        },
    }
}

/// Conflict detail if `err` is a primary key / unique violation
fn duplicate_detail(err: &DbErr) -> Option<String> {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => Some(detail),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::error::AppError;
    use sea_orm::ConnectionTrait;
    use chrono::TimeZone;
    use std::sync::Arc;

    async fn store() -> DepartmentStore {
        DepartmentStore::new(db::connect_url("sqlite::memory:").await.unwrap())
    }

    fn old_timestamp() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()
    }

    fn chain() -> (Arc<Department>, Arc<Department>, Department) {
        let z = Arc::new(Department::new("Z", "Zed", "Zed"));
        let y = Arc::new(Department::new("Z_Y", "Why", "Zed/Why").with_parent(Some(z.clone())));
        let x = Department::new("Z_Y_X", "Ex", "Zed/Why/Ex").with_parent(Some(y.clone()));
        (z, y, x)
    }

    #[tokio::test]
    async fn test_persist_twice_is_duplicate() {
        let store = store().await;
        let dept = Department::new("3944", "Auto & Tires", "Auto & Tires");

        assert!(store.persist(&dept).await.unwrap());
        assert!(!store.persist(&dept).await.unwrap());
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_does_not_overwrite() {
        let store = store().await;
        let first = Department::new("1", "Original", "Original");
        let second = Department::new("1", "Replacement", "Replacement");

        assert!(store.persist(&first).await.unwrap());
        assert!(!store.persist(&second).await.unwrap());

        let row = store.find("1").await.unwrap().unwrap();
        assert_eq!(row.title, "Original");
    }

    #[tokio::test]
    async fn test_persist_stores_all_columns() {
        let store = store().await;
        let (z, _, _) = chain();
        let child = Department::new("Z_Q", "Queue", "Zed/Queue")
            .with_parent(Some(z.clone()))
            .with_conflict_ids(vec!["Q2".to_string(), "Q3".to_string()]);

        assert!(store.persist(&z).await.unwrap());
        assert!(store.persist(&child).await.unwrap());

        let row = store.find("Z_Q").await.unwrap().unwrap();
        assert_eq!(row.title, "Queue");
        assert_eq!(row.path, "Zed/Queue");
        assert_eq!(row.parent_id.as_deref(), Some("Z"));
        assert_eq!(
            row.conflict_ids,
            Some(department::ConflictIds(vec!["Q2".to_string(), "Q3".to_string()]))
        );
    }

    #[tokio::test]
    async fn test_persist_with_ancestors_writes_chain() {
        let store = store().await;
        let (_, _, x) = chain();

        let order: Vec<&str> = x.lineage().iter().map(|d| d.id.as_str()).collect();
        assert_eq!(order, vec!["Z", "Z_Y", "Z_Y_X"]);

        assert!(store.persist_with_ancestors(&x, true).await.unwrap());

        let ids: Vec<String> = store.all().await.unwrap().into_iter().map(|m| m.id).collect();
        assert_eq!(ids, vec!["Z", "Z_Y", "Z_Y_X"]);
        let y = store.find("Z_Y").await.unwrap().unwrap();
        assert_eq!(y.parent_id.as_deref(), Some("Z"));
    }

    #[tokio::test]
    async fn test_persist_with_existing_ancestors_is_noop_for_them() {
        let store = store().await;
        let (z, y, x) = chain();

        assert!(store.persist(&z).await.unwrap());
        assert!(store.persist(&y).await.unwrap());

        assert!(store.persist_with_ancestors(&x, true).await.unwrap());
        assert!(!store.persist_with_ancestors(&x, true).await.unwrap());
        assert_eq!(store.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_persist_without_ancestor_flag_writes_only_self() {
        let store = store().await;
        let root = Department::new("R", "Root", "Root");

        assert!(store.persist_with_ancestors(&root, false).await.unwrap());
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_update_title_only() {
        let store = store().await;
        let (z, _, _) = chain();
        let mut child = Department::new("Z_A", "Alpha", "Zed/Alpha")
            .with_parent(Some(z.clone()))
            .with_conflict_ids(vec!["A1".to_string()]);
        child.updated_at = old_timestamp();
        store.persist(&z).await.unwrap();
        store.persist(&child).await.unwrap();

        let modified = store
            .update("Z_A", DepartmentUpdate::new().title("Alpha Prime"))
            .await
            .unwrap();
        assert_eq!(modified, 1);

        let row = store.find("Z_A").await.unwrap().unwrap();
        assert_eq!(row.title, "Alpha Prime");
        assert_eq!(row.path, "Zed/Alpha");
        assert_eq!(row.parent_id.as_deref(), Some("Z"));
        assert_eq!(row.conflict_ids, Some(department::ConflictIds(vec!["A1".to_string()])));
        assert!(row.updated_at > old_timestamp());
    }

    #[tokio::test]
    async fn test_update_missing_id() {
        let store = store().await;
        let dept = Department::new("1", "One", "One");
        store.persist(&dept).await.unwrap();

        let modified = store
            .update("nope", DepartmentUpdate::new().title("Changed"))
            .await
            .unwrap();
        assert_eq!(modified, 0);

        let rows = store.all().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].title, "One");
    }

    #[tokio::test]
    async fn test_update_with_no_changes_refreshes_timestamp() {
        let store = store().await;
        let mut dept = Department::new("1", "One", "One");
        dept.updated_at = old_timestamp();
        store.persist(&dept).await.unwrap();

        let modified = store.update("1", DepartmentUpdate::new()).await.unwrap();
        assert_eq!(modified, 1);
        let row = store.find("1").await.unwrap().unwrap();
        assert!(row.updated_at > old_timestamp());
    }

    #[tokio::test]
    async fn test_missing_parent_row_is_error_not_duplicate() {
        let store = store().await;
        let (_, y, _) = chain();

        let result = store.persist(&y).await;
        assert!(matches!(result, Err(AppError::Database(_))));
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_persist_with_ancestors_rolls_back_chain_on_failure() {
        let store = store().await;
        store
            .db
            .execute_unprepared(
                "CREATE TRIGGER reject_leaf BEFORE INSERT ON department \
                 WHEN NEW.id = 'Z_Y_X' BEGIN SELECT RAISE(ABORT, 'leaf rejected'); END",
            )
            .await
            .unwrap();
        let (_, _, x) = chain();

        let result = store.persist_with_ancestors(&x, true).await;
        assert!(matches!(result, Err(AppError::Database(_))));
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[test]
    fn test_non_unique_error_is_not_duplicate() {
        let err = DbErr::Custom("connection reset".to_string());
        assert!(duplicate_detail(&err).is_none());
        assert!(InsertOutcome::Created.is_created());
        assert!(!InsertOutcome::Duplicate.is_created());
    }
}
