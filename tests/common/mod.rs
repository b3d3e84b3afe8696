//! Shared fixtures for the integration tests
//!
//! The tests need a running PostgreSQL instance named by `DATABASE_URL`; without
//! it every test returns early.

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use queryhaus::prelude::*;
use std::time::Duration;

const SCHEMA: &str = include_str!("../fixtures/schema.sql");
const SCHEMA_LOCK: i64 = 7_310_042;

/// Embedded owner as serialized by the contract view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnerSummary {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[model]
#[table(name = "qh_owners", fetch = "owners/fetch")]
pub struct Owner {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Related for Owner {
    fn associations() -> Vec<Association<Self>> {
        Vec::new()
    }
}

#[model]
#[table(name = "qh_contracts", fetch = "contracts/fetch")]
pub struct Contract {
    pub id: Uuid,
    pub title: String,
    pub owner_id: Option<Uuid>,
    pub parent_id: Option<Uuid>,

    #[sqlx(rename = "owner")]
    #[serde(skip)]
    pub owner_json: Option<JsonText>,

    #[sqlx(skip)]
    pub owner: Option<OwnerSummary>,

    #[sqlx(skip)]
    #[serde(skip)]
    pub owner_record: Option<Owner>,

    #[sqlx(skip)]
    #[serde(skip)]
    pub parent: Option<Box<Contract>>,
}

impl Related for Contract {
    fn associations() -> Vec<Association<Self>> {
        vec![
            Association::<Self>::belongs_to::<Owner, Uuid>(
                "owner_id",
                |contract| contract.owner_id,
                |contract, owner| contract.owner_record = Some(owner),
            ),
            Association::<Self>::belongs_to::<Contract, Uuid>(
                "parent_id",
                |contract| contract.parent_id,
                |contract, parent| contract.parent = Some(Box::new(parent)),
            ),
        ]
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn sql_dir() -> String {
    format!("{}/tests/sql", env!("CARGO_MANIFEST_DIR"))
}

/// Connect to `DATABASE_URL` with a fresh breaker and make sure the fixture schema exists
pub async fn setup() -> Option<QueryHaus> {
    init_tracing();
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping");
        return None;
    };

    let options = ConnectOptions::new(url, sql_dir())
        .with_pool_size(1, 4)
        .with_breaker(Settings::new("integration").with_timeout(Duration::from_secs(60)));
    let haus = QueryHaus::connect(options)
        .await
        .expect("Failed to connect to database");

    // Tests run concurrently; serialize the DDL
    let mut tx = haus.pool().unwrap().begin().await.unwrap();
    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(SCHEMA_LOCK)
        .execute(&mut *tx)
        .await
        .unwrap();
    sqlx::raw_sql(SCHEMA).execute(&mut *tx).await.unwrap();
    tx.commit().await.unwrap();

    Some(haus)
}

pub fn created_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 10, 20, 30).unwrap()
}

pub async fn insert_owner(haus: &QueryHaus, name: &str) -> Uuid {
    let id = Uuid::new_v4();
    haus.execute(
        &QueryContext::background(),
        "owners/insert",
        args![id, name.to_string(), created_at()],
    )
    .await
    .unwrap();
    id
}

pub fn contract_args(id: Uuid, title: &str, owner: Option<Uuid>, parent: Option<Uuid>) -> Args {
    args![id, title.to_string(), owner, parent]
}

pub async fn insert_contract(
    haus: &QueryHaus,
    title: &str,
    owner: Option<Uuid>,
    parent: Option<Uuid>,
) -> Uuid {
    let id = Uuid::new_v4();
    haus.execute(
        &QueryContext::background(),
        "contracts/insert",
        contract_args(id, title, owner, parent),
    )
    .await
    .unwrap();
    id
}

/// A title prefix no other test run shares
pub fn unique_prefix(tag: &str) -> String {
    format!("{}-{}-", tag, Uuid::new_v4().simple())
}
