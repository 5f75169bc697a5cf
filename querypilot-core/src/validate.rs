//! SQL safety validation: the gate between generated SQL and execution.
//!
//! Checks run in a fixed order and short-circuit on the first failure:
//! credential match, keyword denylist, SELECT shape, an informational
//! schema cross-reference, and finally a database-native `EXPLAIN` probe.
//! The first three checks never touch the database; a statement that fails
//! them is rejected without opening a connection.
//!
//! # Security
//! This boundary is deliberately coarse. The denylist is a substring test
//! and the shape check is a prefix test; neither defends against obfuscated
//! or multi-statement injection. The `EXPLAIN` probe is the only check the
//! engine itself performs.

use tracing::debug;

use crate::config::AdminCredential;
use crate::drivers::DatabaseDriver;
use crate::error::{QueryPilotError, Result};
use crate::models::PipelineStage;

/// Keywords that disqualify a statement outright.
///
/// Matched case-insensitively as substrings anywhere in the statement, not
/// token-aware. A column literally named `updated_at` will trip the
/// `UPDATE` entry; that coarseness is part of the contract.
pub const FORBIDDEN_KEYWORDS: [&str; 7] = [
    "DROP", "DELETE", "UPDATE", "INSERT", "ALTER", "CREATE", "TRUNCATE",
];

/// Second gate of the pipeline: validates a candidate statement before the
/// executor is allowed to see it.
pub struct SqlValidator<'a> {
    driver: &'a dyn DatabaseDriver,
    credential: &'a AdminCredential,
}

impl<'a> SqlValidator<'a> {
    /// Creates a validator bound to a driver and the reference credential.
    pub fn new(driver: &'a dyn DatabaseDriver, credential: &'a AdminCredential) -> Self {
        Self { driver, credential }
    }

    /// Runs every check against the statement, in order.
    ///
    /// # Errors
    /// - [`QueryPilotError::Unauthorized`] when the supplied credential does
    ///   not exactly match the configured one (no database call is made)
    /// - [`QueryPilotError::ForbiddenKeyword`] when a denylisted keyword
    ///   appears anywhere in the statement
    /// - [`QueryPilotError::NotASelect`] when the trimmed statement does not
    ///   begin with `SELECT`
    /// - [`QueryPilotError::PlanRejected`] when the engine refuses to plan
    ///   the statement, carrying the engine's own error detail
    pub async fn validate(&self, sql: &str, supplied_credential: &str) -> Result<()> {
        if !self.credential.matches(supplied_credential) {
            return Err(QueryPilotError::unauthorized(PipelineStage::Validate));
        }

        let upper = sql.to_uppercase();
        for keyword in FORBIDDEN_KEYWORDS {
            if upper.contains(keyword) {
                return Err(QueryPilotError::ForbiddenKeyword { keyword });
            }
        }

        if !upper.trim().starts_with("SELECT") {
            return Err(QueryPilotError::NotASelect);
        }

        self.cross_reference_schema(&upper).await;

        self.driver.explain(sql).await?;
        debug!("statement passed all validation checks");
        Ok(())
    }

    /// Informational schema cross-reference. Never affects the verdict and
    /// swallows its own errors; it exists to leave a trace of which tables
    /// the statement touches and which of their columns it omits.
    async fn cross_reference_schema(&self, upper_sql: &str) {
        match self.driver.inspect_schema().await {
            Ok(snapshot) => {
                for table in snapshot.table_names() {
                    if !upper_sql.contains(&table.to_uppercase()) {
                        continue;
                    }
                    let unmentioned: Vec<&str> = snapshot
                        .columns(table)
                        .into_iter()
                        .flat_map(|columns| columns.keys())
                        .map(String::as_str)
                        .filter(|column| !upper_sql.contains(&column.to_uppercase()))
                        .collect();
                    debug!(
                        table,
                        unmentioned_columns = ?unmentioned,
                        "statement references table"
                    );
                }
            }
            Err(error) => {
                debug!(%error, "schema cross-reference skipped");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::models::{DatabaseType, ResultSet, SchemaSnapshot};

    /// Driver double that counts database touches and can be told to
    /// reject the plan probe.
    #[derive(Default)]
    struct RecordingDriver {
        explain_calls: AtomicUsize,
        inspect_calls: AtomicUsize,
        reject_plan_with: Option<String>,
    }

    #[async_trait]
    impl DatabaseDriver for RecordingDriver {
        async fn test_connection(&self) -> Result<()> {
            Ok(())
        }

        async fn inspect_schema(&self) -> Result<SchemaSnapshot> {
            self.inspect_calls.fetch_add(1, Ordering::SeqCst);
            let mut snapshot = SchemaSnapshot::new();
            snapshot.add_column("users", "id", "integer");
            snapshot.add_column("users", "name", "text");
            Ok(snapshot)
        }

        async fn explain(&self, _sql: &str) -> Result<()> {
            self.explain_calls.fetch_add(1, Ordering::SeqCst);
            match &self.reject_plan_with {
                Some(detail) => Err(QueryPilotError::plan_rejected(detail.clone())),
                None => Ok(()),
            }
        }

        async fn run_select(&self, _sql: &str) -> Result<ResultSet> {
            Ok(ResultSet::default())
        }

        fn database_type(&self) -> DatabaseType {
            DatabaseType::SQLite
        }
    }

    fn credential() -> AdminCredential {
        AdminCredential::new("letmein".to_string())
    }

    #[tokio::test]
    async fn test_wrong_credential_rejected_without_database_call() {
        let driver = RecordingDriver::default();
        let credential = credential();
        let validator = SqlValidator::new(&driver, &credential);

        let error = validator
            .validate("SELECT 1", "wrong")
            .await
            .unwrap_err();

        assert!(matches!(
            error,
            QueryPilotError::Unauthorized {
                stage: PipelineStage::Validate
            }
        ));
        assert_eq!(driver.explain_calls.load(Ordering::SeqCst), 0);
        assert_eq!(driver.inspect_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_forbidden_keyword_rejected_before_database() {
        let driver = RecordingDriver::default();
        let credential = credential();
        let validator = SqlValidator::new(&driver, &credential);

        let error = validator
            .validate("DROP TABLE users;", "letmein")
            .await
            .unwrap_err();

        assert!(matches!(
            error,
            QueryPilotError::ForbiddenKeyword { keyword: "DROP" }
        ));
        assert_eq!(driver.explain_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_denylist_is_substring_based() {
        let driver = RecordingDriver::default();
        let credential = credential();
        let validator = SqlValidator::new(&driver, &credential);

        // A column name containing a denylisted keyword still trips it.
        let error = validator
            .validate("SELECT updated_at FROM users", "letmein")
            .await
            .unwrap_err();

        assert!(matches!(
            error,
            QueryPilotError::ForbiddenKeyword { keyword: "UPDATE" }
        ));
    }

    #[tokio::test]
    async fn test_non_select_rejected_before_plan_probe() {
        let driver = RecordingDriver::default();
        let credential = credential();
        let validator = SqlValidator::new(&driver, &credential);

        let error = validator
            .validate("EXPLAIN SELECT 1", "letmein")
            .await
            .unwrap_err();

        assert!(matches!(error, QueryPilotError::NotASelect));
        assert_eq!(driver.explain_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_leading_whitespace_and_case_are_tolerated() {
        let driver = RecordingDriver::default();
        let credential = credential();
        let validator = SqlValidator::new(&driver, &credential);

        validator
            .validate("  select id FROM users", "letmein")
            .await
            .unwrap();
        assert_eq!(driver.explain_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_plan_rejection_carries_engine_detail() {
        let driver = RecordingDriver {
            reject_plan_with: Some("no such column: naem".to_string()),
            ..RecordingDriver::default()
        };
        let credential = credential();
        let validator = SqlValidator::new(&driver, &credential);

        let error = validator
            .validate("SELECT naem FROM users", "letmein")
            .await
            .unwrap_err();

        assert!(error.to_string().contains("no such column: naem"));
        assert!(error.is_safety_rejection());
    }

    #[tokio::test]
    async fn test_cross_reference_does_not_change_verdict() {
        // Statement references no known table; validation still succeeds.
        let driver = RecordingDriver::default();
        let credential = credential();
        let validator = SqlValidator::new(&driver, &credential);

        validator.validate("SELECT 1", "letmein").await.unwrap();
        assert_eq!(driver.inspect_calls.load(Ordering::SeqCst), 1);
    }
}
