//! Pipeline orchestrator: inspect, generate, validate, execute.
//!
//! The four stages run strictly in order with no retries and no parallel
//! fan-out; each stage's output is the next stage's input, and the first
//! failure terminates the run. Every invocation is stateless and fully
//! isolated, so callers may run pipelines concurrently against the same
//! read-only configuration.

use serde::Serialize;
use tracing::info;

use crate::config::PipelineConfig;
use crate::drivers::DatabaseDriver;
use crate::error::Result;
use crate::execute::SqlExecutor;
use crate::generate::SqlGenerator;
use crate::inspect::SchemaInspector;
use crate::models::ResultSet;
use crate::validate::SqlValidator;

/// Result of a full pipeline run: the statement that survived validation
/// and the rows it produced.
#[derive(Debug, Serialize)]
pub struct PipelineOutcome {
    /// The validated statement, after generation post-processing.
    pub sql: String,
    /// Rows in cursor order.
    pub rows: ResultSet,
}

impl PipelineOutcome {
    /// Renders the outcome as a JSON document.
    ///
    /// # Errors
    /// Returns [`crate::error::QueryPilotError::Serialization`] if the
    /// outcome cannot be rendered.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| {
            crate::error::QueryPilotError::Serialization {
                context: "pipeline outcome".to_string(),
                source: e,
            }
        })
    }
}

/// Sequences the four stages over a shared driver and generator.
pub struct Pipeline<'a> {
    config: &'a PipelineConfig,
    driver: &'a dyn DatabaseDriver,
    generator: &'a dyn SqlGenerator,
}

impl<'a> Pipeline<'a> {
    /// Creates a pipeline over the given driver and generator.
    pub fn new(
        config: &'a PipelineConfig,
        driver: &'a dyn DatabaseDriver,
        generator: &'a dyn SqlGenerator,
    ) -> Self {
        Self {
            config,
            driver,
            generator,
        }
    }

    /// Runs one question through all four stages.
    ///
    /// # Errors
    /// Propagates the first stage failure unchanged; see
    /// [`crate::error::QueryPilotError`] for the per-stage variants.
    pub async fn run(
        &self,
        question: &str,
        supplied_credential: &str,
    ) -> Result<PipelineOutcome> {
        info!("stage 1/4: inspecting schema");
        let snapshot = SchemaInspector::new(self.driver).inspect().await?;

        info!("stage 2/4: generating SQL");
        let sql = self.generator.generate(question, &snapshot).await?;

        info!("stage 3/4: validating statement");
        SqlValidator::new(self.driver, &self.config.admin_credential)
            .validate(&sql, supplied_credential)
            .await?;

        info!("stage 4/4: executing statement");
        let rows = SqlExecutor::new(self.driver, &self.config.admin_credential)
            .execute(&sql, supplied_credential)
            .await?;

        Ok(PipelineOutcome { sql, rows })
    }
}
