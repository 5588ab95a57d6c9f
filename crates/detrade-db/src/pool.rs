use std::time::Duration;

use crate::errors::{DatabaseError, contextualize};
use deadpool_diesel::postgres::Pool;

/// Extension trait for deadpool-diesel Pool to provide cleaner error handling
pub trait DetradePool {
    /// Interact with the database with automatic error handling and logging,
    /// giving up after `timeout` with a retryable [`DatabaseError::Timeout`].
    ///
    /// # Example
    /// ```ignore
    /// let vault = pool
    ///     .interact_with_timeout("find vault".into(), timeout, move |conn| Vault::find_by_id(&id, conn))
    ///     .await?;
    /// ```
    fn interact_with_timeout<F, T, E>(
        &self,
        operation: String,
        timeout: Duration,
        f: F,
    ) -> impl std::future::Future<Output = Result<T, DatabaseError>> + Send
    where
        F: FnOnce(&mut diesel::PgConnection) -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: Into<DatabaseError> + Send + 'static;
}

impl DetradePool for Pool {
    async fn interact_with_timeout<F, T, E>(
        &self,
        operation: String,
        timeout: Duration,
        f: F,
    ) -> Result<T, DatabaseError>
    where
        F: FnOnce(&mut diesel::PgConnection) -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: Into<DatabaseError> + Send + 'static,
    {
        let interaction = async {
            // Get connection from pool
            let conn = self.get().await.map_err(|e| {
                tracing::error!(
                    operation = %operation,
                    error = %e,
                    "Failed to get database connection from pool"
                );
                DatabaseError::PoolError {
                    operation: operation.clone(),
                    message: e.to_string(),
                }
            })?;

            // Execute the database operation
            conn.interact(move |conn| f(conn))
                .await
                .map_err(|e| {
                    tracing::error!(
                        operation = %operation,
                        error = %e,
                        "Database interaction failed (deadpool error)"
                    );
                    DatabaseError::InteractionError {
                        operation: operation.clone(),
                        message: e.to_string(),
                    }
                })?
                .map_err(|e| {
                    let db_error = contextualize(e.into(), &operation);
                    if !db_error.is_not_found() {
                        tracing::error!(
                            operation = %operation,
                            error = %db_error,
                            "Database query failed"
                        );
                    }
                    db_error
                })
        };

        match tokio::time::timeout(timeout, interaction).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    operation = %operation,
                    timeout_ms = timeout.as_millis() as u64,
                    "Database operation timed out"
                );
                Err(DatabaseError::Timeout {
                    operation: operation.clone(),
                    timeout,
                })
            }
        }
    }
}
