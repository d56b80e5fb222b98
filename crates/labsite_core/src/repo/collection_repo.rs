//! Generic collection repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD, paging and search over any orderable collection table.
//! - Route every position change through the reorder engine so inserts,
//!   updates and soft deletes keep live rows dense.
//!
//! # Invariants
//! - Only active (`is_deleted=0`) rows are returned by default.
//! - Listing is deterministic: `sort_order ASC, id ASC`.
//! - Field edits and the position change of one update commit together or
//!   not at all.
//! - Write paths validate the record before any SQL mutation.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::job::JobStatus;
use crate::model::ordering::{Collection, Orderable, RecordId};
use crate::model::page::{Page, PageInfo, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::model::validation::RecordValidationError;
use crate::repo::order_repo::{
    insert_position_in_tx, release_position_in_tx, reorder_in_tx, OrderRepoError,
    OrderRepository, SqliteOrderRepository,
};
use log::info;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Row, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::marker::PhantomData;

/// Bookkeeping columns shared by every collection table.
pub(crate) const META_COLUMNS: &[&str] = &[
    "id",
    "sort_order",
    "is_deleted",
    "created_at",
    "updated_at",
];

pub type CollectionRepoResult<T> = Result<T, CollectionRepoError>;

/// Errors from collection repository operations.
#[derive(Debug)]
pub enum CollectionRepoError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Target row does not exist or is soft-deleted.
    NotFound {
        collection: Collection,
        id: RecordId,
    },
    /// Requested position is outside `1..=max_order`.
    InvalidOrder {
        collection: Collection,
        requested: i64,
        max_order: i64,
    },
    /// Record content failed validation.
    Validation(RecordValidationError),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Required column is missing from expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Persisted data cannot be converted to a valid record.
    InvalidData(String),
    /// Listing filter does not apply to this collection.
    UnsupportedFilter {
        collection: Collection,
        filter: &'static str,
    },
}

impl Display for CollectionRepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { collection, id } => {
                write!(f, "{} not found: {id}", collection.item_label())
            }
            Self::InvalidOrder {
                requested,
                max_order,
                ..
            } => write!(
                f,
                "order must be between 1 and {max_order}, got {requested}"
            ),
            Self::Validation(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "collection repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "collection repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "collection repository requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid collection data: {message}"),
            Self::UnsupportedFilter { collection, filter } => {
                write!(f, "{collection} cannot be filtered by `{filter}`")
            }
        }
    }
}

impl Error for CollectionRepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for CollectionRepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for CollectionRepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<RecordValidationError> for CollectionRepoError {
    fn from(value: RecordValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<OrderRepoError> for CollectionRepoError {
    fn from(value: OrderRepoError) -> Self {
        match value {
            OrderRepoError::NotFound { collection, id } => Self::NotFound { collection, id },
            OrderRepoError::InvalidOrder {
                collection,
                requested,
                max_order,
            } => Self::InvalidOrder {
                collection,
                requested,
                max_order,
            },
            OrderRepoError::Db(err) => Self::Db(err),
        }
    }
}

/// Mapping between one record type and its collection table.
///
/// `COLUMNS` lists payload columns only; `column_values` must return one
/// value per entry, in the same order.
pub trait OrderedRecord: Orderable + Clone {
    /// Partial update applied by `update`.
    type Patch;

    const COLLECTION: Collection;
    const COLUMNS: &'static [&'static str];
    /// Columns matched by listing search.
    const SEARCH_COLUMNS: &'static [&'static str];

    fn validate(&self) -> Result<(), RecordValidationError>;
    fn column_values(&self) -> CollectionRepoResult<Vec<Value>>;
    fn from_row(row: &Row<'_>) -> CollectionRepoResult<Self>;
    fn apply_patch(&mut self, patch: &Self::Patch);
    /// Position requested by a patch, if any.
    fn requested_order(patch: &Self::Patch) -> Option<i64>;

    /// Predicate matching `column` against one bound `LIKE` pattern.
    fn search_predicate(column: &str) -> String {
        format!("{column} LIKE ? ESCAPE '\\'")
    }

    /// Collection-specific listing filter as a SQL fragment plus its values.
    ///
    /// Rejects filters the collection has no column for.
    fn list_filter(query: &ListQuery) -> CollectionRepoResult<Option<(String, Vec<Value>)>> {
        if query.status.is_some() {
            return Err(CollectionRepoError::UnsupportedFilter {
                collection: Self::COLLECTION,
                filter: "status",
            });
        }
        Ok(None)
    }
}

/// Query options for listing a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    /// 1-based page number.
    pub page: u32,
    /// Page size, clamped to `1..=MAX_PAGE_SIZE`.
    pub size: u32,
    /// Case-insensitive substring matched against search columns.
    pub search: Option<String>,
    /// Posting status; only job listings accept it.
    pub status: Option<JobStatus>,
    pub include_deleted: bool,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            size: DEFAULT_PAGE_SIZE,
            search: None,
            status: None,
            include_deleted: false,
        }
    }
}

/// Repository interface for one orderable collection.
pub trait CollectionRepository<T: OrderedRecord> {
    /// Inserts a record at `requested_order`, or last when `None`.
    ///
    /// Store-assigned fields of `record` are ignored.
    fn create(&self, record: &T, requested_order: Option<i64>) -> CollectionRepoResult<T>;
    /// Loads one record by id.
    fn get(&self, id: RecordId, include_deleted: bool) -> CollectionRepoResult<Option<T>>;
    /// Lists one page of records.
    fn list(&self, query: &ListQuery) -> CollectionRepoResult<Page<T>>;
    /// Applies a patch, moving the record when the patch requests a new order.
    fn update(&self, id: RecordId, patch: &T::Patch) -> CollectionRepoResult<T>;
    /// Soft-deletes one record and closes its position gap.
    fn soft_delete(&self, id: RecordId) -> CollectionRepoResult<()>;
    /// Moves one record to `new_order`.
    fn reorder(&self, id: RecordId, new_order: i64) -> CollectionRepoResult<()>;
    /// Renumbers live records to `1..=N`.
    fn compact(&self) -> CollectionRepoResult<usize>;
    /// Reports whether live records hold exactly `1..=N`.
    fn check_dense(&self) -> CollectionRepoResult<bool>;
}

/// SQLite-backed repository for record type `T`.
pub struct SqliteCollectionRepository<'conn, T> {
    conn: &'conn Connection,
    _record: PhantomData<fn() -> T>,
}

impl<'conn, T: OrderedRecord> SqliteCollectionRepository<'conn, T> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> CollectionRepoResult<Self> {
        ensure_collection_ready::<T>(conn)?;
        Ok(Self {
            conn,
            _record: PhantomData,
        })
    }
}

impl<T: OrderedRecord> CollectionRepository<T> for SqliteCollectionRepository<'_, T> {
    fn create(&self, record: &T, requested_order: Option<i64>) -> CollectionRepoResult<T> {
        record.validate()?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let position = insert_position_in_tx(&tx, T::COLLECTION, requested_order)?;

        let mut values = record.column_values()?;
        values.push(Value::Integer(position));
        let placeholders = (1..=values.len())
            .map(|index| format!("?{index}"))
            .collect::<Vec<_>>()
            .join(", ");
        tx.execute(
            &format!(
                "INSERT INTO {} ({}, sort_order, is_deleted) VALUES ({placeholders}, 0);",
                T::COLLECTION.table_name(),
                T::COLUMNS.join(", ")
            ),
            params_from_iter(values),
        )?;

        let id = tx.last_insert_rowid();
        let created = load_required::<T>(&tx, id)?;
        tx.commit()?;

        info!(
            "event=record_create module=collection_repo status=ok collection={} id={} order={}",
            T::COLLECTION,
            id,
            position
        );
        Ok(created)
    }

    fn get(&self, id: RecordId, include_deleted: bool) -> CollectionRepoResult<Option<T>> {
        load_record::<T>(self.conn, id, include_deleted)
    }

    fn list(&self, query: &ListQuery) -> CollectionRepoResult<Page<T>> {
        let page = query.page.max(1);
        let size = query.size.clamp(1, MAX_PAGE_SIZE);
        let table = T::COLLECTION.table_name();

        let mut where_sql = String::from("WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if !query.include_deleted {
            where_sql.push_str(" AND is_deleted = 0");
        }

        if let Some((clause, values)) = T::list_filter(query)? {
            where_sql.push_str(&format!(" AND ({clause})"));
            bind_values.extend(values);
        }

        let search = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty());
        if let Some(search) = search {
            if !T::SEARCH_COLUMNS.is_empty() {
                let pattern = format!("%{}%", escape_like(search));
                let clauses = T::SEARCH_COLUMNS
                    .iter()
                    .map(|column| T::search_predicate(column))
                    .collect::<Vec<_>>()
                    .join(" OR ");
                where_sql.push_str(&format!(" AND ({clauses})"));
                for _ in T::SEARCH_COLUMNS {
                    bind_values.push(Value::Text(pattern.clone()));
                }
            }
        }

        let total: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {table} {where_sql};"),
            params_from_iter(bind_values.iter()),
            |row| row.get(0),
        )?;
        let page_info = PageInfo::new(total.max(0) as u64, page, size);

        bind_values.push(Value::Integer(i64::from(size)));
        bind_values.push(Value::Integer(page_info.offset() as i64));
        let mut stmt = self.conn.prepare(&format!(
            "{} {where_sql}
             ORDER BY is_deleted ASC, sort_order ASC, id ASC
             LIMIT ? OFFSET ?;",
            select_sql::<T>()
        ))?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(T::from_row(row)?);
        }

        Ok(Page { items, page_info })
    }

    fn update(&self, id: RecordId, patch: &T::Patch) -> CollectionRepoResult<T> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let current = load_required::<T>(&tx, id)?;

        let mut updated = current.clone();
        updated.apply_patch(patch);
        updated.validate()?;

        let assignments = T::COLUMNS
            .iter()
            .enumerate()
            .map(|(index, column)| format!("{column} = ?{}", index + 1))
            .collect::<Vec<_>>()
            .join(", ");
        let mut values = updated.column_values()?;
        values.push(Value::Integer(id));
        let id_param = values.len();
        tx.execute(
            &format!(
                "UPDATE {}
                 SET {assignments},
                     updated_at = (strftime('%s', 'now') * 1000)
                 WHERE id = ?{id_param}
                   AND is_deleted = 0;",
                T::COLLECTION.table_name()
            ),
            params_from_iter(values),
        )?;

        let mut moved = false;
        if let Some(new_order) = T::requested_order(patch) {
            if new_order != current.sort_order() {
                moved = reorder_in_tx(&tx, T::COLLECTION, id, new_order)?;
            }
        }

        let saved = load_required::<T>(&tx, id)?;
        tx.commit()?;

        info!(
            "event=record_update module=collection_repo status=ok collection={} id={} moved={}",
            T::COLLECTION,
            id,
            moved
        );
        Ok(saved)
    }

    fn soft_delete(&self, id: RecordId) -> CollectionRepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        release_position_in_tx(&tx, T::COLLECTION, id)?;
        tx.execute(
            &format!(
                "UPDATE {}
                 SET is_deleted = 1,
                     updated_at = (strftime('%s', 'now') * 1000)
                 WHERE id = ?1
                   AND is_deleted = 0;",
                T::COLLECTION.table_name()
            ),
            [id],
        )?;
        tx.commit()?;

        info!(
            "event=record_delete module=collection_repo status=ok collection={} id={}",
            T::COLLECTION,
            id
        );
        Ok(())
    }

    fn reorder(&self, id: RecordId, new_order: i64) -> CollectionRepoResult<()> {
        SqliteOrderRepository::new(self.conn)
            .reorder(T::COLLECTION, id, new_order)
            .map_err(Into::into)
    }

    fn compact(&self) -> CollectionRepoResult<usize> {
        SqliteOrderRepository::new(self.conn)
            .compact(T::COLLECTION)
            .map_err(Into::into)
    }

    fn check_dense(&self) -> CollectionRepoResult<bool> {
        SqliteOrderRepository::new(self.conn)
            .check_dense(T::COLLECTION)
            .map_err(Into::into)
    }
}

fn select_sql<T: OrderedRecord>() -> String {
    format!(
        "SELECT id, {}, sort_order, is_deleted, created_at, updated_at FROM {}",
        T::COLUMNS.join(", "),
        T::COLLECTION.table_name()
    )
}

fn load_record<T: OrderedRecord>(
    conn: &Connection,
    id: RecordId,
    include_deleted: bool,
) -> CollectionRepoResult<Option<T>> {
    let mut stmt = conn.prepare(&format!(
        "{}
         WHERE id = ?1
           AND (?2 = 1 OR is_deleted = 0);",
        select_sql::<T>()
    ))?;
    let mut rows = stmt.query([id, i64::from(include_deleted)])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(T::from_row(row)?));
    }
    Ok(None)
}

fn load_required<T: OrderedRecord>(conn: &Connection, id: RecordId) -> CollectionRepoResult<T> {
    load_record::<T>(conn, id, false)?.ok_or(CollectionRepoError::NotFound {
        collection: T::COLLECTION,
        id,
    })
}

fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

fn ensure_collection_ready<T: OrderedRecord>(conn: &Connection) -> CollectionRepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(CollectionRepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    let table = T::COLLECTION.table_name();
    if !table_exists(conn, table)? {
        return Err(CollectionRepoError::MissingRequiredTable(table));
    }

    let existing = table_columns(conn, table)?;
    for column in META_COLUMNS.iter().chain(T::COLUMNS.iter()).copied() {
        if !existing.iter().any(|name| name == column) {
            return Err(CollectionRepoError::MissingRequiredColumn { table, column });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> CollectionRepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_columns(conn: &Connection, table: &str) -> CollectionRepoResult<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    let mut columns = Vec::new();
    while let Some(row) = rows.next()? {
        columns.push(row.get(1)?);
    }
    Ok(columns)
}

#[cfg(test)]
mod tests {
    use super::escape_like;

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("100%_a\\b"), "100\\%\\_a\\\\b");
        assert_eq!(escape_like("plain"), "plain");
    }
}
