//! Ordering capability shared by every orderable collection.
//!
//! # Responsibility
//! - Define the `Orderable` capability implemented by each entity type.
//! - Plan the position shifts for reorder, insert, remove and compaction
//!   without touching storage.
//!
//! # Invariants
//! - Live (non-deleted) items of one collection carry `sort_order` values
//!   exactly `1..=N`, each once.
//! - Planning validates before it mutates: an `Err` leaves every item
//!   unchanged.
//! - Deleted items never move and never count toward `N`.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Store-assigned integer identity of a collection row.
pub type RecordId = i64;

/// Orderable collection kinds kept by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Jobs,
    News,
    Papers,
    TeamMembers,
    FeaturePublications,
}

impl Collection {
    /// Every collection, in schema order.
    pub const ALL: [Collection; 5] = [
        Collection::Jobs,
        Collection::News,
        Collection::Papers,
        Collection::TeamMembers,
        Collection::FeaturePublications,
    ];

    /// Backing table name.
    pub fn table_name(self) -> &'static str {
        match self {
            Self::Jobs => "jobs",
            Self::News => "news",
            Self::Papers => "papers",
            Self::TeamMembers => "team_members",
            Self::FeaturePublications => "feature_publications",
        }
    }

    /// Singular, human-readable item name used in error messages.
    pub fn item_label(self) -> &'static str {
        match self {
            Self::Jobs => "job",
            Self::News => "news item",
            Self::Papers => "paper",
            Self::TeamMembers => "team member",
            Self::FeaturePublications => "feature publication",
        }
    }

    /// Parses a table name, accepting `-` in place of `_`.
    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|collection| collection.table_name() == normalized)
    }
}

impl Display for Collection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.table_name())
    }
}

/// Capability required by the ordering planner.
pub trait Orderable {
    fn id(&self) -> RecordId;
    fn sort_order(&self) -> i64;
    fn set_sort_order(&mut self, value: i64);
    fn is_deleted(&self) -> bool;
}

/// Minimal ordering projection of one stored row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderSlot {
    pub id: RecordId,
    pub sort_order: i64,
    pub is_deleted: bool,
}

impl Orderable for OrderSlot {
    fn id(&self) -> RecordId {
        self.id
    }

    fn sort_order(&self) -> i64 {
        self.sort_order
    }

    fn set_sort_order(&mut self, value: i64) {
        self.sort_order = value;
    }

    fn is_deleted(&self) -> bool {
        self.is_deleted
    }
}

/// One planned position change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderShift {
    pub id: RecordId,
    pub from: i64,
    pub to: i64,
}

/// Rejections raised while planning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderingError {
    /// Target is absent or soft-deleted.
    ItemNotFound(RecordId),
    /// Requested position lies outside `1..=max_order`.
    OutOfRange { requested: i64, max_order: i64 },
}

impl Display for OrderingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ItemNotFound(id) => write!(f, "item not found: {id}"),
            Self::OutOfRange {
                requested,
                max_order,
            } => write!(
                f,
                "order must be between 1 and {max_order}, got {requested}"
            ),
        }
    }
}

impl Error for OrderingError {}

/// Moves one live item to `new_order`, shifting the siblings in between.
///
/// Returns the applied shifts, target last. An unchanged position yields an
/// empty plan.
///
/// # Errors
/// - `ItemNotFound` when `item_id` is not a live item.
/// - `OutOfRange` when `new_order` is outside `1..=live_count`.
pub fn plan_reorder<T: Orderable>(
    items: &mut [T],
    item_id: RecordId,
    new_order: i64,
) -> Result<Vec<OrderShift>, OrderingError> {
    let target_index = items
        .iter()
        .position(|item| item.id() == item_id && !item.is_deleted())
        .ok_or(OrderingError::ItemNotFound(item_id))?;

    let siblings = items
        .iter()
        .filter(|item| !item.is_deleted() && item.id() != item_id)
        .count() as i64;
    let max_order = siblings + 1;
    if new_order < 1 || new_order > max_order {
        return Err(OrderingError::OutOfRange {
            requested: new_order,
            max_order,
        });
    }

    let current = items[target_index].sort_order();
    if new_order == current {
        return Ok(Vec::new());
    }

    let mut shifts = Vec::new();
    for item in items
        .iter_mut()
        .filter(|item| !item.is_deleted() && item.id() != item_id)
    {
        let order = item.sort_order();
        let moved = if new_order > current {
            (order > current && order <= new_order).then(|| order - 1)
        } else {
            (order >= new_order && order < current).then(|| order + 1)
        };
        if let Some(to) = moved {
            item.set_sort_order(to);
            shifts.push(OrderShift {
                id: item.id(),
                from: order,
                to,
            });
        }
    }

    items[target_index].set_sort_order(new_order);
    shifts.push(OrderShift {
        id: item_id,
        from: current,
        to: new_order,
    });
    Ok(shifts)
}

/// Reserves a position for a new item.
///
/// `None` appends after the last live item. Live items at or after the
/// reserved position move up by one.
///
/// # Errors
/// - `OutOfRange` when `requested` is outside `1..=live_count + 1`.
pub fn plan_insert<T: Orderable>(
    items: &mut [T],
    requested: Option<i64>,
) -> Result<(i64, Vec<OrderShift>), OrderingError> {
    let max_order = live_count(items) + 1;
    let position = requested.unwrap_or(max_order);
    if position < 1 || position > max_order {
        return Err(OrderingError::OutOfRange {
            requested: position,
            max_order,
        });
    }

    let mut shifts = Vec::new();
    for item in items.iter_mut().filter(|item| !item.is_deleted()) {
        let order = item.sort_order();
        if order >= position {
            item.set_sort_order(order + 1);
            shifts.push(OrderShift {
                id: item.id(),
                from: order,
                to: order + 1,
            });
        }
    }
    Ok((position, shifts))
}

/// Closes the gap a live item leaves behind when it is soft-deleted.
///
/// The removed item keeps its stale position; only live siblings after it
/// move down by one.
///
/// # Errors
/// - `ItemNotFound` when `item_id` is not a live item.
pub fn plan_remove<T: Orderable>(
    items: &mut [T],
    item_id: RecordId,
) -> Result<Vec<OrderShift>, OrderingError> {
    let removed_order = items
        .iter()
        .find(|item| item.id() == item_id && !item.is_deleted())
        .map(Orderable::sort_order)
        .ok_or(OrderingError::ItemNotFound(item_id))?;

    let mut shifts = Vec::new();
    for item in items
        .iter_mut()
        .filter(|item| !item.is_deleted() && item.id() != item_id)
    {
        let order = item.sort_order();
        if order > removed_order {
            item.set_sort_order(order - 1);
            shifts.push(OrderShift {
                id: item.id(),
                from: order,
                to: order - 1,
            });
        }
    }
    Ok(shifts)
}

/// Renumbers live items to `1..=N`, keeping `(sort_order, id)` order.
///
/// Used to heal gaps and duplicates left by data written outside the
/// engine. Only items whose position changes are reported.
pub fn plan_compact<T: Orderable>(items: &mut [T]) -> Vec<OrderShift> {
    let mut live: Vec<usize> = (0..items.len())
        .filter(|index| !items[*index].is_deleted())
        .collect();
    live.sort_by_key(|index| (items[*index].sort_order(), items[*index].id()));

    let mut shifts = Vec::new();
    for (position, index) in live.into_iter().enumerate() {
        let to = position as i64 + 1;
        let item = &mut items[index];
        let from = item.sort_order();
        if from != to {
            item.set_sort_order(to);
            shifts.push(OrderShift {
                id: item.id(),
                from,
                to,
            });
        }
    }
    shifts
}

/// Returns whether live items hold exactly the positions `1..=N`.
pub fn is_dense<T: Orderable>(items: &[T]) -> bool {
    let mut orders: Vec<i64> = items
        .iter()
        .filter(|item| !item.is_deleted())
        .map(Orderable::sort_order)
        .collect();
    orders.sort_unstable();
    orders
        .iter()
        .enumerate()
        .all(|(index, order)| *order == index as i64 + 1)
}

fn live_count<T: Orderable>(items: &[T]) -> i64 {
    items.iter().filter(|item| !item.is_deleted()).count() as i64
}

#[cfg(test)]
mod tests {
    use super::{
        is_dense, plan_compact, plan_insert, plan_remove, plan_reorder, Collection, OrderSlot,
        OrderingError,
    };

    fn slots(orders: &[(i64, i64, bool)]) -> Vec<OrderSlot> {
        orders
            .iter()
            .map(|(id, sort_order, is_deleted)| OrderSlot {
                id: *id,
                sort_order: *sort_order,
                is_deleted: *is_deleted,
            })
            .collect()
    }

    fn five_live() -> Vec<OrderSlot> {
        slots(&[
            (10, 1, false),
            (20, 2, false),
            (30, 3, false),
            (40, 4, false),
            (50, 5, false),
        ])
    }

    fn order_of(items: &[OrderSlot], id: i64) -> i64 {
        items.iter().find(|slot| slot.id == id).unwrap().sort_order
    }

    #[test]
    fn moving_forward_decrements_the_skipped_siblings() {
        let mut items = five_live();
        let shifts = plan_reorder(&mut items, 20, 5).unwrap();

        assert_eq!(order_of(&items, 10), 1);
        assert_eq!(order_of(&items, 30), 2);
        assert_eq!(order_of(&items, 40), 3);
        assert_eq!(order_of(&items, 50), 4);
        assert_eq!(order_of(&items, 20), 5);
        assert_eq!(shifts.len(), 4);
        assert_eq!(shifts.last().unwrap().id, 20);
        assert!(is_dense(&items));
    }

    #[test]
    fn moving_backward_increments_the_skipped_siblings() {
        let mut items = five_live();
        plan_reorder(&mut items, 50, 2).unwrap();

        assert_eq!(order_of(&items, 10), 1);
        assert_eq!(order_of(&items, 50), 2);
        assert_eq!(order_of(&items, 20), 3);
        assert_eq!(order_of(&items, 30), 4);
        assert_eq!(order_of(&items, 40), 5);
        assert!(is_dense(&items));
    }

    #[test]
    fn same_position_is_a_no_op() {
        let mut items = five_live();
        let shifts = plan_reorder(&mut items, 30, 3).unwrap();
        assert!(shifts.is_empty());
        assert_eq!(items, five_live());
    }

    #[test]
    fn out_of_range_positions_are_rejected_without_changes() {
        let mut items = five_live();

        let low = plan_reorder(&mut items, 30, 0).unwrap_err();
        assert_eq!(
            low,
            OrderingError::OutOfRange {
                requested: 0,
                max_order: 5
            }
        );
        let high = plan_reorder(&mut items, 30, 6).unwrap_err();
        assert_eq!(
            high,
            OrderingError::OutOfRange {
                requested: 6,
                max_order: 5
            }
        );
        assert_eq!(items, five_live());
    }

    #[test]
    fn deleted_items_do_not_count_toward_the_range() {
        let mut items = slots(&[
            (1, 1, false),
            (2, 2, true),
            (3, 2, false),
            (4, 3, false),
        ]);

        let err = plan_reorder(&mut items, 1, 4).unwrap_err();
        assert_eq!(
            err,
            OrderingError::OutOfRange {
                requested: 4,
                max_order: 3
            }
        );

        plan_reorder(&mut items, 1, 3).unwrap();
        assert_eq!(order_of(&items, 3), 1);
        assert_eq!(order_of(&items, 4), 2);
        assert_eq!(order_of(&items, 1), 3);
        assert_eq!(order_of(&items, 2), 2, "deleted row must not move");
    }

    #[test]
    fn deleted_or_missing_target_is_not_found() {
        let mut items = slots(&[(1, 1, false), (2, 2, true)]);
        assert_eq!(
            plan_reorder(&mut items, 2, 1).unwrap_err(),
            OrderingError::ItemNotFound(2)
        );
        assert_eq!(
            plan_reorder(&mut items, 99, 1).unwrap_err(),
            OrderingError::ItemNotFound(99)
        );
    }

    #[test]
    fn insert_defaults_to_append_and_shifts_on_explicit_position() {
        let mut items = slots(&[(1, 1, false), (2, 2, false), (3, 9, true)]);

        let (appended, shifts) = plan_insert(&mut items, None).unwrap();
        assert_eq!(appended, 3);
        assert!(shifts.is_empty());

        let (position, shifts) = plan_insert(&mut items, Some(1)).unwrap();
        assert_eq!(position, 1);
        assert_eq!(shifts.len(), 2);
        assert_eq!(order_of(&items, 1), 2);
        assert_eq!(order_of(&items, 2), 3);
        assert_eq!(order_of(&items, 3), 9);

        let err = plan_insert(&mut items, Some(4)).unwrap_err();
        assert_eq!(
            err,
            OrderingError::OutOfRange {
                requested: 4,
                max_order: 3
            }
        );
    }

    #[test]
    fn remove_closes_the_gap() {
        let mut items = five_live();
        let shifts = plan_remove(&mut items, 20).unwrap();
        assert_eq!(shifts.len(), 3);

        let survivors: Vec<OrderSlot> = items.into_iter().filter(|slot| slot.id != 20).collect();
        assert!(is_dense(&survivors));
    }

    #[test]
    fn compact_heals_gaps_and_duplicates() {
        let mut items = slots(&[
            (1, 4, false),
            (2, 4, false),
            (3, 1, true),
            (4, 10, false),
        ]);
        assert!(!is_dense(&items));

        plan_compact(&mut items);
        assert!(is_dense(&items));
        assert_eq!(order_of(&items, 1), 1);
        assert_eq!(order_of(&items, 2), 2);
        assert_eq!(order_of(&items, 4), 3);
        assert_eq!(order_of(&items, 3), 1);
    }

    #[test]
    fn collection_parse_accepts_table_names() {
        assert_eq!(Collection::parse("team-members"), Some(Collection::TeamMembers));
        assert_eq!(Collection::parse(" NEWS "), Some(Collection::News));
        assert_eq!(Collection::parse("contacts"), None);
    }
}
