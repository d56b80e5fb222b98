use labsite_core::db::{open_db, open_db_in_memory, open_db_with_timeout};
use labsite_core::{
    Collection, CollectionRepository, OrderRepoError, OrderRepository, RecordId,
    SqliteCollectionRepository, SqliteOrderRepository, TeamMember,
};
use rusqlite::Connection;
use std::path::Path;
use std::thread;
use std::time::Duration;

const MEMBERS: Collection = Collection::TeamMembers;

fn seed_members(conn: &Connection, names: &[&str]) -> Vec<RecordId> {
    let repo = SqliteCollectionRepository::<TeamMember>::try_new(conn).unwrap();
    names
        .iter()
        .map(|name| {
            repo.create(&TeamMember::new(*name, "faculty", "PI", "Professor"), None)
                .unwrap()
                .id
        })
        .collect()
}

/// Live ids in display order.
fn live_ids(conn: &Connection) -> Vec<RecordId> {
    SqliteOrderRepository::new(conn)
        .live_slots(MEMBERS)
        .unwrap()
        .into_iter()
        .map(|slot| slot.id)
        .collect()
}

fn order_of(conn: &Connection, id: RecordId) -> i64 {
    conn.query_row(
        "SELECT sort_order FROM team_members WHERE id = ?1;",
        [id],
        |row| row.get(0),
    )
    .unwrap()
}

/// Full `(id, sort_order, is_deleted, updated_at)` snapshot, deleted rows included.
fn snapshot(conn: &Connection) -> Vec<(i64, i64, i64, i64)> {
    let mut stmt = conn
        .prepare(
            "SELECT id, sort_order, is_deleted, updated_at
             FROM team_members
             ORDER BY id ASC;",
        )
        .unwrap();
    stmt.query_map([], |row| {
        Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
    })
    .unwrap()
    .collect::<Result<Vec<_>, _>>()
    .unwrap()
}

fn assert_dense(conn: &Connection) {
    assert!(
        SqliteOrderRepository::new(conn).check_dense(MEMBERS).unwrap(),
        "live orders are not 1..N: {:?}",
        SqliteOrderRepository::new(conn).live_slots(MEMBERS).unwrap()
    );
}

#[test]
fn moving_item_up_shifts_intermediate_siblings_down() {
    let conn = open_db_in_memory().unwrap();
    let ids = seed_members(&conn, &["A", "B", "C", "D"]);
    let (a, b, c, d) = (ids[0], ids[1], ids[2], ids[3]);

    SqliteOrderRepository::new(&conn)
        .reorder(MEMBERS, d, 2)
        .unwrap();

    assert_eq!(live_ids(&conn), vec![a, d, b, c]);
    assert_eq!(order_of(&conn, a), 1);
    assert_eq!(order_of(&conn, d), 2);
    assert_eq!(order_of(&conn, b), 3);
    assert_eq!(order_of(&conn, c), 4);
    assert_dense(&conn);
}

#[test]
fn moving_item_down_shifts_intermediate_siblings_up() {
    let conn = open_db_in_memory().unwrap();
    let ids = seed_members(&conn, &["A", "B", "C", "D"]);
    let (a, b, c, d) = (ids[0], ids[1], ids[2], ids[3]);

    SqliteOrderRepository::new(&conn)
        .reorder(MEMBERS, a, 3)
        .unwrap();

    assert_eq!(live_ids(&conn), vec![b, c, a, d]);
    assert_eq!(order_of(&conn, d), 4);
    assert_dense(&conn);
}

#[test]
fn moving_second_of_five_to_last_decrements_followers() {
    let conn = open_db_in_memory().unwrap();
    let ids = seed_members(&conn, &["A", "B", "C", "D", "E"]);

    SqliteOrderRepository::new(&conn)
        .reorder(MEMBERS, ids[1], 5)
        .unwrap();

    let orders = ids.iter().map(|id| order_of(&conn, *id)).collect::<Vec<_>>();
    assert_eq!(orders, vec![1, 5, 2, 3, 4]);
    assert_dense(&conn);
}

#[test]
fn moving_last_of_five_to_second_increments_displaced() {
    let conn = open_db_in_memory().unwrap();
    let ids = seed_members(&conn, &["A", "B", "C", "D", "E"]);

    SqliteOrderRepository::new(&conn)
        .reorder(MEMBERS, ids[4], 2)
        .unwrap();

    let orders = ids.iter().map(|id| order_of(&conn, *id)).collect::<Vec<_>>();
    assert_eq!(orders, vec![1, 3, 4, 5, 2]);
    assert_dense(&conn);
}

#[test]
fn moving_to_current_position_writes_nothing() {
    let conn = open_db_in_memory().unwrap();
    let ids = seed_members(&conn, &["A", "B", "C"]);
    let before = snapshot(&conn);

    SqliteOrderRepository::new(&conn)
        .reorder(MEMBERS, ids[1], 2)
        .unwrap();

    assert_eq!(snapshot(&conn), before);
}

#[test]
fn out_of_range_order_is_rejected_without_changes() {
    let conn = open_db_in_memory().unwrap();
    let ids = seed_members(&conn, &["A", "B", "C"]);
    let before = snapshot(&conn);
    let engine = SqliteOrderRepository::new(&conn);

    for requested in [0, -1, 4, i64::MAX] {
        let err = engine.reorder(MEMBERS, ids[0], requested).unwrap_err();
        match err {
            OrderRepoError::InvalidOrder {
                requested: got,
                max_order,
                ..
            } => {
                assert_eq!(got, requested);
                assert_eq!(max_order, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(snapshot(&conn), before);
    }

    let message = engine.reorder(MEMBERS, ids[0], 9).unwrap_err().to_string();
    assert_eq!(message, "order must be between 1 and 3, got 9");
}

#[test]
fn unknown_item_is_reported_as_not_found() {
    let conn = open_db_in_memory().unwrap();
    seed_members(&conn, &["A", "B"]);
    let before = snapshot(&conn);

    let err = SqliteOrderRepository::new(&conn)
        .reorder(MEMBERS, 9_999, 1)
        .unwrap_err();

    assert!(matches!(
        err,
        OrderRepoError::NotFound {
            collection: Collection::TeamMembers,
            id: 9_999
        }
    ));
    assert_eq!(err.to_string(), "team member not found: 9999");
    assert_eq!(snapshot(&conn), before);
}

#[test]
fn soft_deleted_items_are_outside_the_order_range() {
    let conn = open_db_in_memory().unwrap();
    let ids = seed_members(&conn, &["A", "B", "C", "D"]);
    let (a, b, c, d) = (ids[0], ids[1], ids[2], ids[3]);
    let repo = SqliteCollectionRepository::<TeamMember>::try_new(&conn).unwrap();
    repo.soft_delete(b).unwrap();
    let stale_order = order_of(&conn, b);

    assert_eq!(live_ids(&conn), vec![a, c, d]);
    assert_dense(&conn);

    let engine = SqliteOrderRepository::new(&conn);
    assert!(matches!(
        engine.reorder(MEMBERS, d, 4),
        Err(OrderRepoError::InvalidOrder { max_order: 3, .. })
    ));
    assert!(matches!(
        engine.reorder(MEMBERS, b, 1),
        Err(OrderRepoError::NotFound { id, .. }) if id == b
    ));

    engine.reorder(MEMBERS, d, 1).unwrap();
    assert_eq!(live_ids(&conn), vec![d, a, c]);
    assert_eq!(order_of(&conn, b), stale_order);
    assert_dense(&conn);
}

#[test]
fn legacy_deleted_rows_sharing_an_order_are_ignored() {
    let conn = open_db_in_memory().unwrap();
    let ids = seed_members(&conn, &["A", "B", "C"]);
    conn.execute(
        "INSERT INTO team_members
            (name, category, role, designation, description, sort_order, is_deleted)
         VALUES ('Ghost', 'alumni', 'RA', 'Former', '', 2, 1);",
        [],
    )
    .unwrap();
    let ghost = conn.last_insert_rowid();

    SqliteOrderRepository::new(&conn)
        .reorder(MEMBERS, ids[2], 1)
        .unwrap();

    assert_eq!(live_ids(&conn), vec![ids[2], ids[0], ids[1]]);
    assert_eq!(order_of(&conn, ghost), 2);
    assert_dense(&conn);
}

#[test]
fn compact_heals_gaps_and_duplicates() {
    let conn = open_db_in_memory().unwrap();
    let ids = seed_members(&conn, &["A", "B", "C", "D"]);
    conn.execute_batch(&format!(
        "UPDATE team_members SET sort_order = 3 WHERE id = {};
         UPDATE team_members SET sort_order = 7 WHERE id = {};
         UPDATE team_members SET sort_order = 7 WHERE id = {};
         UPDATE team_members SET sort_order = 20 WHERE id = {};",
        ids[0], ids[1], ids[2], ids[3]
    ))
    .unwrap();
    let engine = SqliteOrderRepository::new(&conn);
    assert!(!engine.check_dense(MEMBERS).unwrap());

    let moved = engine.compact(MEMBERS).unwrap();

    assert_eq!(moved, 4);
    assert_eq!(live_ids(&conn), ids);
    assert_dense(&conn);
    assert_eq!(engine.compact(MEMBERS).unwrap(), 0);
}

#[test]
fn engine_only_writes_the_order_column() {
    let conn = open_db_in_memory().unwrap();
    let ids = seed_members(&conn, &["A", "B", "C"]);
    conn.execute("UPDATE team_members SET updated_at = 1;", [])
        .unwrap();

    SqliteOrderRepository::new(&conn)
        .reorder(MEMBERS, ids[0], 3)
        .unwrap();

    let untouched: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM team_members WHERE updated_at = 1 AND name IN ('A', 'B', 'C');",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(untouched, 3);
}

#[test]
fn write_lock_contention_fails_without_changes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("contention.db");
    let holder = open_db(&path).unwrap();
    let ids = seed_members(&holder, &["A", "B", "C"]);
    let contender = open_db_with_timeout(&path, Duration::from_millis(50)).unwrap();
    let before = snapshot(&contender);

    holder.execute_batch("BEGIN IMMEDIATE;").unwrap();
    let err = SqliteOrderRepository::new(&contender)
        .reorder(MEMBERS, ids[2], 1)
        .unwrap_err();
    holder.execute_batch("ROLLBACK;").unwrap();

    match err {
        OrderRepoError::Db(db_err) => assert!(db_err.is_busy(), "unexpected: {db_err}"),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(snapshot(&contender), before);

    SqliteOrderRepository::new(&contender)
        .reorder(MEMBERS, ids[2], 1)
        .unwrap();
    assert_eq!(live_ids(&contender), vec![ids[2], ids[0], ids[1]]);
}

#[test]
fn concurrent_reorders_serialize_and_keep_orders_dense() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("concurrent.db");
    let ids = {
        let conn = open_db(&path).unwrap();
        seed_members(&conn, &["A", "B", "C", "D", "E", "F"])
    };

    let moves = [
        (ids[5], 1),
        (ids[0], 6),
        (ids[2], 4),
        (ids[3], 2),
        (ids[1], 5),
        (ids[4], 3),
    ];
    let handles = moves
        .into_iter()
        .map(|(id, order)| {
            let path = path.clone();
            thread::spawn(move || reorder_repeatedly(&path, id, order))
        })
        .collect::<Vec<_>>();
    for handle in handles {
        handle.join().unwrap();
    }

    let conn = open_db(&path).unwrap();
    assert_dense(&conn);
    let mut live = live_ids(&conn);
    live.sort_unstable();
    assert_eq!(live, ids);
}

fn reorder_repeatedly(path: &Path, id: RecordId, order: i64) {
    let conn = open_db(path).unwrap();
    let engine = SqliteOrderRepository::new(&conn);
    for round in 0..10 {
        let target = if round % 2 == 0 { order } else { 7 - order };
        engine.reorder(MEMBERS, id, target).unwrap();
    }
}
