//! Reorder engine over the SQLite collection store.
//!
//! # Responsibility
//! - Load the live ordering slots of one collection and persist the shifts
//!   planned by `model::ordering`.
//! - Offer transaction-scoped primitives (`*_in_tx`) to repositories that
//!   combine ordering with other field writes, and self-contained
//!   operations through `SqliteOrderRepository`.
//!
//! # Invariants
//! - Only `sort_order` columns are written; no other field changes.
//! - Slots are read after the write lock is taken (`BEGIN IMMEDIATE`), so
//!   concurrent reorders of one collection serialize.
//! - A failed call leaves every row unchanged: validation happens before
//!   the first write and store errors roll the transaction back.

use crate::db::DbError;
use crate::model::ordering::{
    is_dense, plan_compact, plan_insert, plan_remove, plan_reorder, Collection, OrderShift,
    OrderSlot, OrderingError, RecordId,
};
use log::{debug, info, log, Level};
use rusqlite::{params, Connection, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

pub type OrderRepoResult<T> = Result<T, OrderRepoError>;

/// Errors raised by the reorder engine.
#[derive(Debug)]
pub enum OrderRepoError {
    /// Target row is absent or soft-deleted.
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
    /// Store failure; the transaction was rolled back.
    Db(DbError),
}

impl OrderRepoError {
    fn from_ordering(collection: Collection, err: OrderingError) -> Self {
        match err {
            OrderingError::ItemNotFound(id) => Self::NotFound { collection, id },
            OrderingError::OutOfRange {
                requested,
                max_order,
            } => Self::InvalidOrder {
                collection,
                requested,
                max_order,
            },
        }
    }
}

impl Display for OrderRepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { collection, id } => {
                write!(f, "{} not found: {id}", collection.item_label())
            }
            Self::InvalidOrder {
                max_order,
                requested,
                ..
            } => write!(
                f,
                "order must be between 1 and {max_order}, got {requested}"
            ),
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for OrderRepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::NotFound { .. } => None,
            Self::InvalidOrder { .. } => None,
        }
    }
}

impl From<DbError> for OrderRepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for OrderRepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Loads the live ordering slots of `collection`, `sort_order ASC, id ASC`.
pub fn load_live_slots(conn: &Connection, collection: Collection) -> OrderRepoResult<Vec<OrderSlot>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT id, sort_order
         FROM {}
         WHERE is_deleted = 0
         ORDER BY sort_order ASC, id ASC;",
        collection.table_name()
    ))?;
    let mut rows = stmt.query([])?;
    let mut slots = Vec::new();
    while let Some(row) = rows.next()? {
        slots.push(OrderSlot {
            id: row.get(0)?,
            sort_order: row.get(1)?,
            is_deleted: false,
        });
    }
    Ok(slots)
}

/// Moves one live row to `new_order` on a connection that already holds a
/// write transaction.
///
/// Returns `false` when the row already sits at `new_order`.
pub fn reorder_in_tx(
    conn: &Connection,
    collection: Collection,
    item_id: RecordId,
    new_order: i64,
) -> OrderRepoResult<bool> {
    let mut slots = load_live_slots(conn, collection)?;
    let shifts = plan_reorder(&mut slots, item_id, new_order)
        .map_err(|err| OrderRepoError::from_ordering(collection, err))?;
    write_shifts(conn, collection, &shifts)?;
    Ok(!shifts.is_empty())
}

/// Reserves the position for a row about to be inserted.
///
/// Live rows at or after the returned position are shifted up by one.
pub fn insert_position_in_tx(
    conn: &Connection,
    collection: Collection,
    requested: Option<i64>,
) -> OrderRepoResult<i64> {
    let mut slots = load_live_slots(conn, collection)?;
    let (position, shifts) = plan_insert(&mut slots, requested)
        .map_err(|err| OrderRepoError::from_ordering(collection, err))?;
    write_shifts(conn, collection, &shifts)?;
    Ok(position)
}

/// Closes the gap left by a live row that is about to be soft-deleted.
pub fn release_position_in_tx(
    conn: &Connection,
    collection: Collection,
    item_id: RecordId,
) -> OrderRepoResult<()> {
    let mut slots = load_live_slots(conn, collection)?;
    let shifts = plan_remove(&mut slots, item_id)
        .map_err(|err| OrderRepoError::from_ordering(collection, err))?;
    write_shifts(conn, collection, &shifts)
}

/// Renumbers live rows to `1..=N`. Returns how many rows moved.
pub fn compact_in_tx(conn: &Connection, collection: Collection) -> OrderRepoResult<usize> {
    let mut slots = load_live_slots(conn, collection)?;
    let shifts = plan_compact(&mut slots);
    write_shifts(conn, collection, &shifts)?;
    Ok(shifts.len())
}

fn write_shifts(
    conn: &Connection,
    collection: Collection,
    shifts: &[OrderShift],
) -> OrderRepoResult<()> {
    if shifts.is_empty() {
        return Ok(());
    }
    let mut stmt = conn.prepare(&format!(
        "UPDATE {}
         SET sort_order = ?2
         WHERE id = ?1
           AND is_deleted = 0;",
        collection.table_name()
    ))?;
    for shift in shifts {
        let changed = stmt.execute(params![shift.id, shift.to])?;
        if changed == 0 {
            return Err(OrderRepoError::NotFound {
                collection,
                id: shift.id,
            });
        }
        debug!(
            "event=order_shift module=order_repo collection={} id={} from={} to={}",
            collection, shift.id, shift.from, shift.to
        );
    }
    Ok(())
}

/// Repository interface for collection-wide ordering operations.
pub trait OrderRepository {
    /// Moves one live item to `new_order`, shifting its siblings.
    fn reorder(
        &self,
        collection: Collection,
        item_id: RecordId,
        new_order: i64,
    ) -> OrderRepoResult<()>;
    /// Renumbers live items to `1..=N`.
    fn compact(&self, collection: Collection) -> OrderRepoResult<usize>;
    /// Reports whether live items hold exactly `1..=N`.
    fn check_dense(&self, collection: Collection) -> OrderRepoResult<bool>;
    /// Lists live ordering slots.
    fn live_slots(&self, collection: Collection) -> OrderRepoResult<Vec<OrderSlot>>;
}

/// Store failures warn; caller mistakes (missing row, bad position) do not.
fn failure_log_level(err: &OrderRepoError) -> (Level, &'static str) {
    match err {
        OrderRepoError::Db(_) => (Level::Warn, "error"),
        OrderRepoError::NotFound { .. } | OrderRepoError::InvalidOrder { .. } => {
            (Level::Info, "rejected")
        }
    }
}

/// SQLite-backed reorder engine.
pub struct SqliteOrderRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteOrderRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl OrderRepository for SqliteOrderRepository<'_> {
    fn reorder(
        &self,
        collection: Collection,
        item_id: RecordId,
        new_order: i64,
    ) -> OrderRepoResult<()> {
        let started_at = Instant::now();
        let result = (|| -> OrderRepoResult<bool> {
            let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
            let moved = reorder_in_tx(&tx, collection, item_id, new_order)?;
            tx.commit()?;
            Ok(moved)
        })();

        match result {
            Ok(moved) => {
                info!(
                    "event=reorder module=order_repo status=ok collection={} id={} to={} moved={} duration_ms={}",
                    collection,
                    item_id,
                    new_order,
                    moved,
                    started_at.elapsed().as_millis()
                );
                Ok(())
            }
            Err(err) => {
                let (level, status) = failure_log_level(&err);
                log!(
                    level,
                    "event=reorder module=order_repo status={} collection={} id={} to={} duration_ms={} error={}",
                    status,
                    collection,
                    item_id,
                    new_order,
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }

    fn compact(&self, collection: Collection) -> OrderRepoResult<usize> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let moved = compact_in_tx(&tx, collection)?;
        tx.commit()?;
        info!(
            "event=compact module=order_repo status=ok collection={} moved={}",
            collection, moved
        );
        Ok(moved)
    }

    fn check_dense(&self, collection: Collection) -> OrderRepoResult<bool> {
        let slots = load_live_slots(self.conn, collection)?;
        Ok(is_dense(&slots))
    }

    fn live_slots(&self, collection: Collection) -> OrderRepoResult<Vec<OrderSlot>> {
        load_live_slots(self.conn, collection)
    }
}

#[cfg(test)]
mod tests {
    use super::{failure_log_level, OrderRepoError};
    use crate::db::DbError;
    use crate::model::ordering::Collection;
    use log::Level;

    #[test]
    fn caller_mistakes_log_below_warn() {
        let missing = OrderRepoError::NotFound {
            collection: Collection::Jobs,
            id: 4,
        };
        let out_of_range = OrderRepoError::InvalidOrder {
            collection: Collection::Jobs,
            requested: 9,
            max_order: 3,
        };

        assert_eq!(failure_log_level(&missing), (Level::Info, "rejected"));
        assert_eq!(failure_log_level(&out_of_range), (Level::Info, "rejected"));
    }

    #[test]
    fn store_failures_log_at_warn() {
        let store = OrderRepoError::Db(DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows));

        assert_eq!(failure_log_level(&store), (Level::Warn, "error"));
    }
}
