//! Schema inspection stage.
//!
//! Produces the snapshot of tables, columns, and declared types that the
//! SQL generator receives as grounding context. Every call reads the live
//! catalog; nothing is cached, so two calls with no schema change in
//! between yield identical snapshots.

use tracing::debug;

use crate::drivers::DatabaseDriver;
use crate::error::Result;
use crate::models::SchemaSnapshot;

/// First pipeline stage: reads the catalog through the driver seam.
pub struct SchemaInspector<'a> {
    driver: &'a dyn DatabaseDriver,
}

impl<'a> SchemaInspector<'a> {
    /// Creates an inspector over the given driver.
    pub fn new(driver: &'a dyn DatabaseDriver) -> Self {
        Self { driver }
    }

    /// Returns a fresh snapshot of the queryable schema.
    ///
    /// # Errors
    /// Returns [`crate::error::QueryPilotError::Inspection`] if the catalog
    /// cannot be read.
    pub async fn inspect(&self) -> Result<SchemaSnapshot> {
        let snapshot = self.driver.inspect_schema().await?;
        debug!(
            tables = snapshot.table_count(),
            engine = %self.driver.database_type(),
            "schema snapshot collected"
        );
        Ok(snapshot)
    }
}
