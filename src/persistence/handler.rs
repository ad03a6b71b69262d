//! # Persistence Handler
//!
//! Sole owner of durable component state. One generic implementation serves
//! all four levels; the `ComponentType` descriptor supplies the entity table
//! and the parent association table.
//!
//! ## Write-then-mutate
//!
//! `start` and `end` commit their writes before touching the in-memory
//! component. A failed write leaves the caller's view unchanged.
//!
//! ## Integrity checks
//!
//! Transition UPDATEs are guarded by the status the row must currently hold,
//! so a duplicated or missing row, or a repeated `start`/`end`, affects a row
//! count other than one and fails with [`TrackerError::Integrity`].
//!
//! ```rust
//! use workload_tracker::models::{Component, Metadata, Workload};
//! use workload_tracker::persistence::PersistenceHandler;
//! use workload_tracker::state_machine::ExecutionStatus;
//!
//! # tokio_test::block_on(async {
//! let handler = PersistenceHandler::in_memory().await.unwrap();
//! let mut workload: Workload = handler.create("nightly", ()).await.unwrap();
//!
//! handler.start(&mut workload, None, &Metadata::new()).await.unwrap();
//! handler.end(&mut workload, ExecutionStatus::Finished, None).await.unwrap();
//!
//! // a second end touches no row
//! let err = handler.end(&mut workload, ExecutionStatus::Finished, None).await.unwrap_err();
//! assert!(err.is_integrity());
//! # });
//! ```

use chrono::{DateTime, Utc};
use sqlx::sqlite::{Sqlite, SqlitePool, SqliteRow};
use sqlx::{Executor, Row};
use tracing::{debug, error};
use uuid::Uuid;

use super::codec::{decode_metadata, encode_metadata};
use crate::config::DatabaseConfig;
use crate::database::{create_pool, DatabaseMigrations};
use crate::error::{TrackerError, TrackerResult};
use crate::logging::log_database_operation;
use crate::models::{
    AssociationRecord, Component, ComponentRecord, ComponentType, Metadata, StoredComponent,
    TaskType,
};
use crate::state_machine::{ExecutionStatus, TransitionEvent, TransitionGuard};

const BASE_COLUMNS: &str =
    "uuid, name, create_time, start_time, end_time, status, component_type, meta_data, error_msg";

/// Handle to the embedded workload store.
///
/// Cloning is cheap and shares the underlying pool. Connections are acquired
/// per operation.
#[derive(Debug, Clone)]
pub struct PersistenceHandler {
    pool: SqlitePool,
}

impl PersistenceHandler {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open the configured store and bring its schema up to date
    pub async fn connect(config: &DatabaseConfig) -> TrackerResult<Self> {
        let handler = Self::new(create_pool(config).await?);
        handler.ensure_schema().await?;
        Ok(handler)
    }

    /// Fresh, isolated in-memory store with the schema applied
    pub async fn in_memory() -> TrackerResult<Self> {
        Self::connect(&DatabaseConfig::in_memory()).await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn ensure_schema(&self) -> TrackerResult<()> {
        DatabaseMigrations::run_all(&self.pool).await
    }

    /// Insert a new NOT_YET_STARTED component. No parent association is created.
    pub async fn create<C: Component>(&self, name: &str, init: C::Init) -> TrackerResult<C> {
        let component = C::from_parts(ComponentRecord::new(name, C::COMPONENT_TYPE), init);
        let record = component.record();
        let table = C::COMPONENT_TYPE.table_name();

        let sql = match component.task_type() {
            Some(_) => format!(
                "INSERT INTO {table} ({BASE_COLUMNS}, task_type) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
            ),
            None => format!("INSERT INTO {table} ({BASE_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"),
        };

        let mut query = sqlx::query(&sql)
            .bind(record.uuid.to_string())
            .bind(&record.name)
            .bind(record.create_time)
            .bind(record.start_time)
            .bind(record.end_time)
            .bind(record.status.as_str())
            .bind(record.component_type.as_str())
            .bind(&record.meta_data)
            .bind(record.error_msg.as_deref());
        if let Some(task_type) = component.task_type() {
            query = query.bind(task_type.as_str());
        }
        query.execute(&self.pool).await?;

        log_database_operation("create", table, record.uuid, record.status, Some(1));
        Ok(component)
    }

    /// Attach `component` to its running parent and mark it RUNNING.
    ///
    /// The guarded status update and the association insert commit in one
    /// transaction; on any failure neither is visible.
    pub async fn start<C: Component>(
        &self,
        component: &mut C,
        parent: Option<&ComponentRecord>,
        metadata: &Metadata,
    ) -> TrackerResult<()> {
        let kind = C::COMPONENT_TYPE;
        let event = TransitionEvent::Start;
        TransitionGuard::check(event)?;
        Self::check_parent(kind, parent)?;

        let uuid = component.uuid();
        let encoded = encode_metadata(metadata)?;
        let start_time = Utc::now();

        let mut tx = self.pool.begin().await?;

        let rows = Self::apply_transition(&mut *tx, kind, uuid, event, start_time, None).await?;
        Self::expect_single_row(kind, uuid, event, rows)?;

        if let (Some(association), Some(parent)) = (kind.association(), parent) {
            let sql = format!(
                "INSERT INTO {} ({}, {}, metadata) VALUES (?, ?, ?)",
                association.table, association.parent_column, association.child_column
            );
            sqlx::query(&sql)
                .bind(parent.uuid.to_string())
                .bind(uuid.to_string())
                .bind(&encoded)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        let record = component.record_mut();
        record.start_time = Some(start_time);
        record.status = ExecutionStatus::Running;
        Ok(())
    }

    /// Move a RUNNING component into a terminal `status`.
    ///
    /// Status, end time and error message are written by a single UPDATE.
    /// `None` is stored as NULL.
    pub async fn end<C: Component>(
        &self,
        component: &mut C,
        status: ExecutionStatus,
        error_msg: Option<&str>,
    ) -> TrackerResult<()> {
        let kind = C::COMPONENT_TYPE;
        let event = TransitionEvent::End(status);
        TransitionGuard::check(event)?;

        let uuid = component.uuid();
        let end_time = Utc::now();

        let rows =
            Self::apply_transition(&self.pool, kind, uuid, event, end_time, error_msg).await?;
        Self::expect_single_row(kind, uuid, event, rows)?;

        let record = component.record_mut();
        record.end_time = Some(end_time);
        record.status = status;
        record.error_msg = error_msg.map(str::to_string);
        Ok(())
    }

    pub async fn find(
        &self,
        kind: ComponentType,
        uuid: Uuid,
    ) -> TrackerResult<Option<StoredComponent>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE uuid = ?",
            Self::select_columns(kind),
            kind.table_name()
        );
        let row = sqlx::query(&sql)
            .bind(uuid.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| Self::map_component(&row, kind)).transpose()
    }

    pub async fn find_by_name(
        &self,
        kind: ComponentType,
        name: &str,
    ) -> TrackerResult<Vec<StoredComponent>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE name = ? ORDER BY create_time",
            Self::select_columns(kind),
            kind.table_name()
        );
        let rows = sqlx::query(&sql).bind(name).fetch_all(&self.pool).await?;

        rows.iter()
            .map(|row| Self::map_component(row, kind))
            .collect()
    }

    /// Every stored component of `kind`, oldest first
    pub async fn list(&self, kind: ComponentType) -> TrackerResult<Vec<StoredComponent>> {
        let sql = format!(
            "SELECT {} FROM {} ORDER BY create_time",
            Self::select_columns(kind),
            kind.table_name()
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        rows.iter()
            .map(|row| Self::map_component(row, kind))
            .collect()
    }

    /// The edge attaching a component of `kind` to its parent, if it has started
    pub async fn association_for(
        &self,
        kind: ComponentType,
        child_uuid: Uuid,
    ) -> TrackerResult<Option<AssociationRecord>> {
        let (Some(association), Some(parent_kind)) = (kind.association(), kind.parent()) else {
            return Ok(None);
        };

        let sql = format!(
            "SELECT {parent}, {child}, metadata FROM {table} WHERE {child} = ?",
            parent = association.parent_column,
            child = association.child_column,
            table = association.table,
        );
        let row = sqlx::query(&sql)
            .bind(child_uuid.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| Self::map_association(&row, parent_kind, kind))
            .transpose()
    }

    /// Edges from `parent` to its started children, in start order
    pub async fn children_of(
        &self,
        parent: &ComponentRecord,
    ) -> TrackerResult<Vec<AssociationRecord>> {
        let Some(child_kind) = parent.component_type.child() else {
            return Ok(Vec::new());
        };
        let Some(association) = child_kind.association() else {
            return Ok(Vec::new());
        };

        let sql = format!(
            "SELECT {parent}, {child}, metadata FROM {table} WHERE {parent} = ? ORDER BY rowid",
            parent = association.parent_column,
            child = association.child_column,
            table = association.table,
        );
        let rows = sqlx::query(&sql)
            .bind(parent.uuid.to_string())
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| Self::map_association(row, parent.component_type, child_kind))
            .collect()
    }

    fn check_parent(kind: ComponentType, parent: Option<&ComponentRecord>) -> TrackerResult<()> {
        match (kind.parent(), parent) {
            (None, None) => Ok(()),
            (None, Some(parent)) => Err(TrackerError::Validation(format!(
                "{kind} cannot be started under {} '{}'",
                parent.component_type, parent.name
            ))),
            (Some(expected), None) => Err(TrackerError::Validation(format!(
                "{kind} must be started under a running {expected}"
            ))),
            (Some(expected), Some(parent)) if parent.component_type != expected => {
                Err(TrackerError::Validation(format!(
                    "{kind} must be started under a {expected}, got {} '{}'",
                    parent.component_type, parent.name
                )))
            }
            (Some(_), Some(parent)) if !parent.status.is_active() => {
                Err(TrackerError::Validation(format!(
                    "parent {} '{}' is {}, expected running",
                    parent.component_type, parent.name, parent.status
                )))
            }
            (Some(_), Some(_)) => Ok(()),
        }
    }

    async fn apply_transition<'e, E>(
        executor: E,
        kind: ComponentType,
        uuid: Uuid,
        event: TransitionEvent,
        timestamp: DateTime<Utc>,
        error_msg: Option<&str>,
    ) -> TrackerResult<u64>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let table = kind.table_name();
        let result = match event {
            TransitionEvent::Start => {
                let sql =
                    format!("UPDATE {table} SET start_time = ?, status = ? WHERE uuid = ? AND status = ?");
                sqlx::query(&sql)
                    .bind(timestamp)
                    .bind(event.target_status().as_str())
                    .bind(uuid.to_string())
                    .bind(event.required_status().as_str())
                    .execute(executor)
                    .await?
            }
            TransitionEvent::End(status) => {
                let sql = format!(
                    "UPDATE {table} SET end_time = ?, status = ?, error_msg = ? WHERE uuid = ? AND status = ?"
                );
                sqlx::query(&sql)
                    .bind(timestamp)
                    .bind(status.as_str())
                    .bind(error_msg)
                    .bind(uuid.to_string())
                    .bind(event.required_status().as_str())
                    .execute(executor)
                    .await?
            }
        };

        let rows = result.rows_affected();
        log_database_operation(
            event.operation(),
            table,
            uuid,
            event.target_status(),
            Some(rows),
        );
        Ok(rows)
    }

    fn expect_single_row(
        kind: ComponentType,
        uuid: Uuid,
        event: TransitionEvent,
        rows_affected: u64,
    ) -> TrackerResult<()> {
        if rows_affected == 1 {
            return Ok(());
        }

        error!(
            table = kind.table_name(),
            uuid = %uuid,
            operation = event.operation(),
            expected_status = %event.required_status(),
            rows_affected,
            "Incorrectly updated rows"
        );
        Err(TrackerError::Integrity {
            operation: event.operation(),
            table: kind.table_name(),
            uuid,
            rows_affected,
        })
    }

    fn select_columns(kind: ComponentType) -> String {
        match kind {
            ComponentType::Task => format!("{BASE_COLUMNS}, task_type"),
            _ => BASE_COLUMNS.to_string(),
        }
    }

    fn map_component(row: &SqliteRow, kind: ComponentType) -> TrackerResult<StoredComponent> {
        let status: String = row.try_get("status")?;
        let component_type: String = row.try_get("component_type")?;

        let record = ComponentRecord {
            name: row.try_get("name")?,
            uuid: parse_uuid(row.try_get("uuid")?)?,
            create_time: row.try_get("create_time")?,
            start_time: row.try_get("start_time")?,
            end_time: row.try_get("end_time")?,
            status: status.parse().map_err(TrackerError::Validation)?,
            component_type: component_type.parse().map_err(TrackerError::Validation)?,
            meta_data: row.try_get("meta_data")?,
            error_msg: row.try_get("error_msg")?,
        };

        let task_type = match kind {
            ComponentType::Task => {
                let raw: String = row.try_get("task_type")?;
                Some(raw.parse::<TaskType>().map_err(TrackerError::Validation)?)
            }
            _ => None,
        };

        debug!(table = kind.table_name(), uuid = %record.uuid, "Loaded component row");
        Ok(StoredComponent { record, task_type })
    }

    fn map_association(
        row: &SqliteRow,
        parent_type: ComponentType,
        child_type: ComponentType,
    ) -> TrackerResult<AssociationRecord> {
        let metadata: String = row.try_get(2)?;
        Ok(AssociationRecord {
            parent_type,
            parent_uuid: parse_uuid(row.try_get(0)?)?,
            child_type,
            child_uuid: parse_uuid(row.try_get(1)?)?,
            metadata: decode_metadata(&metadata)?,
        })
    }
}

fn parse_uuid(raw: String) -> TrackerResult<Uuid> {
    Uuid::parse_str(&raw)
        .map_err(|e| TrackerError::Validation(format!("invalid uuid '{raw}' in store: {e}")))
}
