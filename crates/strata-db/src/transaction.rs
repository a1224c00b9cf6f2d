//! Scoped transactions over a [`Database`].

use crate::error::DbError;
use crate::traits::Database;
use std::future::Future;

/// Run `body` inside `BEGIN` / `COMMIT`, issuing `ROLLBACK` when it fails.
///
/// A failed `COMMIT` is rolled back as well and reported as
/// [`DbError::TransactionError`]. `body` must not issue its own transaction
/// control statements.
pub async fn with_transaction<T, E, Fut>(db: &dyn Database, body: Fut) -> Result<T, E>
where
    Fut: Future<Output = Result<T, E>>,
    E: From<DbError>,
{
    db.execute_batch("BEGIN TRANSACTION")
        .await
        .map_err(|e| DbError::TransactionError(format!("BEGIN failed: {e}")))?;

    match body.await {
        Ok(value) => {
            if let Err(commit_err) = db.execute_batch("COMMIT").await {
                if let Err(rollback_err) = db.execute_batch("ROLLBACK").await {
                    log::warn!("ROLLBACK after failed COMMIT also failed: {rollback_err}");
                }
                return Err(DbError::TransactionError(format!("COMMIT failed: {commit_err}")).into());
            }
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = db.execute_batch("ROLLBACK").await {
                log::warn!("ROLLBACK failed: {rollback_err}");
            }
            Err(err)
        }
    }
}
