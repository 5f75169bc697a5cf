//! Statement execution stage.
//!
//! The executor re-checks the admin credential and then runs the statement
//! through the driver seam. It performs no safety re-validation; it trusts
//! that the validator already ran. The only boundary enforced here is the
//! credential gate, which fires before any connection is opened.

use tracing::debug;

use crate::config::AdminCredential;
use crate::drivers::DatabaseDriver;
use crate::error::{QueryPilotError, Result};
use crate::models::{PipelineStage, ResultSet};

/// Final pipeline stage: runs a validated SELECT and returns its rows.
pub struct SqlExecutor<'a> {
    driver: &'a dyn DatabaseDriver,
    credential: &'a AdminCredential,
}

impl<'a> SqlExecutor<'a> {
    /// Creates an executor bound to a driver and the reference credential.
    pub fn new(driver: &'a dyn DatabaseDriver, credential: &'a AdminCredential) -> Self {
        Self { driver, credential }
    }

    /// Checks the credential, then executes the statement.
    ///
    /// Rows come back in cursor order with field keys matching the query's
    /// projected column names.
    ///
    /// # Errors
    /// - [`QueryPilotError::Unauthorized`] when the supplied credential does
    ///   not exactly match the configured one (no database call is made)
    /// - [`QueryPilotError::Execution`] when the statement fails at the
    ///   engine
    pub async fn execute(&self, sql: &str, supplied_credential: &str) -> Result<ResultSet> {
        if !self.credential.matches(supplied_credential) {
            return Err(QueryPilotError::unauthorized(PipelineStage::Execute));
        }

        let results = self.driver.run_select(sql).await?;
        debug!(rows = results.row_count(), "statement executed");
        Ok(results)
    }
}
