//! One sync pass: fetch the taxonomy and insert every department that is
//! not stored yet.

use tracing::{info, warn};

use crate::config::Config;
use crate::db;
use crate::department::Department;
use crate::error::AppResult;
use crate::store::DepartmentStore;
use crate::taxonomy::TaxonomyClient;

/// Persist departments in the order given and return how many rows were
/// newly created. Stops at the first fatal error.
pub async fn persist_all<I>(store: &DepartmentStore, departments: I) -> AppResult<usize>
where
    I: IntoIterator<Item = AppResult<Department>>,
{
    let mut n_persisted = 0;
    for dept in departments {
        if store.persist(&dept?).await? {
            n_persisted += 1;
        }
    }
    Ok(n_persisted)
}

/// Fetch the taxonomy with `client` and store it in `store`
pub async fn sync(client: &TaxonomyClient, store: &DepartmentStore) -> AppResult<usize> {
    let departments = client.fetch_departments().await?;
    let n_persisted = persist_all(store, departments).await?;
    info!("Persisted {} departments", n_persisted);
    Ok(n_persisted)
}

/// Open the store, run one sync pass, close the store
pub async fn run(config: &Config) -> AppResult<usize> {
    let client = TaxonomyClient::new(&config.api)?;
    let store = DepartmentStore::new(db::init_database(&config.database).await?);

    let result = sync(&client, &store).await;
    finish(store, result).await
}

/// Close the store; a close failure is logged and never masks `result`
async fn finish(store: DepartmentStore, result: AppResult<usize>) -> AppResult<usize> {
    if let Err(e) = store.close().await {
        warn!("Failed to close database connection: {}", e);
    }
    result
}
