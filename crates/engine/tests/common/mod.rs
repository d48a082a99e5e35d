#![allow(dead_code)]

use std::path::PathBuf;

use chrono::{DateTime, Duration, TimeZone, Utc};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use uuid::Uuid;

use engine::{DonateCmd, Engine, MoneyCents};
use migration::MigratorTrait;

pub const COMMUNITY: i64 = 1;
pub const OTHER_COMMUNITY: i64 = 2;

pub const LEADER: i64 = 1;
pub const ALICE: i64 = 2;
pub const BOB: i64 = 3;
pub const OUTSIDER: i64 = 4;
pub const FORMER: i64 = 5;

/// Fixed clock origin so date-based rules are deterministic.
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 1, 10, 0, 0).unwrap()
}

pub fn at(days: i64) -> DateTime<Utc> {
    t0() + Duration::days(days)
}

pub fn cents(value: i64) -> MoneyCents {
    MoneyCents::new(value)
}

async fn exec(db: &DatabaseConnection, sql: &str, values: Vec<sea_orm::Value>) {
    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(backend, sql, values))
        .await
        .unwrap();
}

pub async fn add_user(db: &DatabaseConnection, id: i64, username: &str, full_name: &str) {
    exec(
        db,
        "INSERT INTO users (id, username, password, full_name) VALUES (?, ?, ?, ?)",
        vec![
            id.into(),
            username.into(),
            "password".into(),
            full_name.into(),
        ],
    )
    .await;
}

pub async fn add_member(
    db: &DatabaseConnection,
    community_id: i64,
    user_id: i64,
    role: &str,
    is_active: bool,
) {
    exec(
        db,
        "INSERT INTO community_members (community_id, user_id, role, is_active) VALUES (?, ?, ?, ?)",
        vec![
            community_id.into(),
            user_id.into(),
            role.into(),
            is_active.into(),
        ],
    )
    .await;
}

pub async fn add_event(db: &DatabaseConnection, id: i64, community_id: i64, title: &str) {
    exec(
        db,
        "INSERT INTO community_events (id, community_id, title) VALUES (?, ?, ?)",
        vec![id.into(), community_id.into(), title.into()],
    )
    .await;
}

/// Engine over a migrated in-memory database with one community:
/// a leader, two members, an inactive former member and an outsider.
pub async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    seeded_engine(db).await
}

/// Same community as [`engine_with_db`], stored in a fresh SQLite file under
/// the temp dir and served by a pool of several connections, so concurrent
/// operations really overlap. Remove the files with [`remove_db_file`].
pub async fn engine_with_file_db() -> (Engine, DatabaseConnection, PathBuf) {
    let path = std::env::temp_dir().join(format!("agrifund-{}.db", Uuid::new_v4()));
    let mut options = ConnectOptions::new(format!("sqlite:{}?mode=rwc", path.display()));
    options.max_connections(4).min_connections(2);
    let db = Database::connect(options).await.unwrap();
    let (engine, db) = seeded_engine(db).await;
    (engine, db, path)
}

pub async fn remove_db_file(db: DatabaseConnection, path: PathBuf) {
    db.close().await.unwrap();
    for suffix in ["", "-wal", "-shm"] {
        let _ = std::fs::remove_file(format!("{}{suffix}", path.display()));
    }
}

async fn seeded_engine(db: DatabaseConnection) -> (Engine, DatabaseConnection) {
    migration::Migrator::up(&db, None).await.unwrap();

    add_user(&db, LEADER, "lead", "Lead Farmer").await;
    add_user(&db, ALICE, "alice", "Alice Wanjiru").await;
    add_user(&db, BOB, "bob", "Bob Otieno").await;
    add_user(&db, OUTSIDER, "eve", "Eve Outsider").await;
    add_user(&db, FORMER, "frank", "Frank Former").await;

    add_member(&db, COMMUNITY, LEADER, "leader", true).await;
    add_member(&db, COMMUNITY, ALICE, "member", true).await;
    add_member(&db, COMMUNITY, BOB, "elder", true).await;
    add_member(&db, COMMUNITY, FORMER, "member", false).await;
    add_member(&db, OTHER_COMMUNITY, LEADER, "co_leader", true).await;

    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

/// Seed the community fund with a leader donation.
pub async fn donate(engine: &Engine, community_id: i64, amount: i64, when: DateTime<Utc>) {
    engine
        .donate(DonateCmd::new(community_id, LEADER, cents(amount), when))
        .await
        .unwrap();
}

pub async fn balance(engine: &Engine, community_id: i64) -> i64 {
    engine
        .get_fund(community_id, LEADER, Utc::now())
        .await
        .unwrap()
        .current_balance
        .cents()
}

pub async fn event_return(db: &DatabaseConnection, event_id: i64) -> Option<i64> {
    let backend = db.get_database_backend();
    let row = db
        .query_one(Statement::from_sql_and_values(
            backend,
            "SELECT actual_return FROM community_events WHERE id = ?",
            vec![event_id.into()],
        ))
        .await
        .unwrap()
        .unwrap();
    row.try_get::<Option<i64>>("", "actual_return").unwrap()
}
