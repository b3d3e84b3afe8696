//! Integration tests for the executor operations
//!
//! Covers fetch by key, named reads and writes, cursors, transactions and the
//! embedded JSON binding against a live PostgreSQL instance.

mod common;

use common::*;
use queryhaus::prelude::*;
use std::time::Duration;

#[derive(Debug, FromRow)]
struct TitleRow {
    id: Uuid,
    title: String,
}

/// Same rows as `Contract`, with a non-optional raw owner column
#[model]
#[table(name = "qh_contracts", fetch = "contracts/fetch")]
struct ContractSummary {
    id: Uuid,
    title: String,

    #[sqlx(rename = "owner")]
    #[serde(skip)]
    owner_json: JsonText,

    #[sqlx(skip)]
    owner: Option<OwnerSummary>,
}

#[tokio::test]
async fn test_health_check() {
    let Some(haus) = setup().await else { return };

    haus.health_check().await.unwrap();
    assert!(haus.is_connected());
    assert_eq!(haus.breaker().state(), CircuitState::Closed);
}

#[tokio::test]
async fn test_fetch_binds_embedded_owner() {
    let Some(haus) = setup().await else { return };
    let ctx = QueryContext::background();

    let owner_id = insert_owner(&haus, "ada").await;
    let id = insert_contract(&haus, "lease", Some(owner_id), None).await;

    let contract: Contract = haus.fetch(&ctx, &[id]).await.unwrap();
    assert_eq!(contract.title, "lease");
    assert!(contract.owner_json.is_some());

    // created_at arrives without zone and is normalized before binding
    let owner = contract.owner.expect("owner should be bound");
    assert_eq!(owner.id, owner_id);
    assert_eq!(owner.name, "ada");
    assert_eq!(owner.created_at, created_at());
}

#[tokio::test]
async fn test_fetch_without_owner_leaves_target_empty() {
    let Some(haus) = setup().await else { return };

    let id = insert_contract(&haus, "orphan", None, None).await;
    let contract: Contract = haus
        .fetch(&QueryContext::background(), &[id])
        .await
        .unwrap();
    assert!(contract.owner.is_none());
}

#[tokio::test]
async fn test_null_raw_column_scans_as_empty() {
    let Some(haus) = setup().await else { return };
    let ctx = QueryContext::background();

    let owner_id = insert_owner(&haus, "linus").await;
    let orphan = insert_contract(&haus, "no owner", None, None).await;
    let owned = insert_contract(&haus, "owned", Some(owner_id), None).await;

    let summary: ContractSummary = haus.fetch(&ctx, &[orphan]).await.unwrap();
    assert!(summary.owner_json.is_empty());
    assert!(summary.owner.is_none());

    let summaries: Vec<ContractSummary> = haus.fetch(&ctx, &[orphan, owned]).await.unwrap();
    assert_eq!(summaries.len(), 2);
    let with_owner = summaries.iter().find(|s| s.id == owned).unwrap();
    assert_eq!(with_owner.owner.as_ref().map(|o| o.id), Some(owner_id));
    assert_eq!(haus.breaker().counts().consecutive_failures, 0);
}

#[tokio::test]
async fn test_fetch_many_drops_missing_keys() {
    let Some(haus) = setup().await else { return };

    let first = insert_contract(&haus, "first", None, None).await;
    let second = insert_contract(&haus, "second", None, None).await;

    let contracts: Vec<Contract> = haus
        .fetch(&QueryContext::background(), &[first, Uuid::new_v4(), second])
        .await
        .unwrap();
    assert_eq!(contracts.len(), 2);
    assert!(contracts.iter().any(|c| c.id == first));
    assert!(contracts.iter().any(|c| c.id == second));
}

#[tokio::test]
async fn test_fetch_single_missing_is_not_found() {
    let Some(haus) = setup().await else { return };

    let err = haus
        .fetch::<Contract, Uuid>(&QueryContext::background(), &[Uuid::new_v4()])
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.status_code(), 404);
    // An empty result is not a store failure
    assert_eq!(haus.breaker().counts().consecutive_failures, 0);
}

#[tokio::test]
async fn test_get_distinguishes_not_found_from_scan_failure() {
    let Some(haus) = setup().await else { return };
    let ctx = QueryContext::background();
    let title = unique_prefix("get");

    let err = haus
        .get::<Contract>(&ctx, "contracts/by_title", args![title.clone()])
        .await
        .unwrap_err();
    assert!(matches!(err, DataError::NotFound(_)));

    insert_contract(&haus, &title, None, None).await;
    let found: Contract = haus
        .get(&ctx, "contracts/by_title", args![title.clone()])
        .await
        .unwrap();
    assert_eq!(found.title, title);

    let err = haus
        .get::<Contract>(&ctx, "contracts/broken", args![title])
        .await
        .unwrap_err();
    assert!(matches!(err, DataError::Scan { .. }), "unexpected error: {err}");
    assert_eq!(err.status_code(), 500);
}

#[tokio::test]
async fn test_cursor_reads_rows_in_order() {
    let Some(haus) = setup().await else { return };
    let ctx = QueryContext::background();
    let prefix = unique_prefix("cursor");

    for suffix in ["a", "b", "c"] {
        insert_contract(&haus, &format!("{prefix}{suffix}"), None, None).await;
    }

    let mut cursor = haus.query(&ctx, "contracts/titles", args![prefix.clone()]).await.unwrap();
    let first = cursor.next_as::<TitleRow>().await.unwrap().unwrap();
    assert_eq!(first.title, format!("{prefix}a"));
    assert!(!first.id.is_nil());

    let rest: Vec<TitleRow> = cursor.try_collect().await.unwrap();
    let titles: Vec<_> = rest.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec![format!("{prefix}b"), format!("{prefix}c")]);
}

#[tokio::test]
async fn test_cursor_close_drains_remaining_rows() {
    let Some(haus) = setup().await else { return };
    let ctx = QueryContext::background();
    let prefix = unique_prefix("drain");

    for suffix in ["a", "b"] {
        insert_contract(&haus, &format!("{prefix}{suffix}"), None, None).await;
    }

    let mut cursor = haus.query(&ctx, "contracts/titles", args![prefix]).await.unwrap();
    assert!(cursor.next().await.unwrap().is_some());
    assert_eq!(cursor.close().await.unwrap(), 1);
}

#[tokio::test]
async fn test_execute_reports_affected_rows() {
    let Some(haus) = setup().await else { return };

    let result = haus
        .execute(
            &QueryContext::background(),
            "contracts/insert",
            contract_args(Uuid::new_v4(), "single", None, None),
        )
        .await
        .unwrap();
    assert_eq!(result.rows_affected(), 1);
}

#[tokio::test]
async fn test_execute_batch_is_atomic() {
    let Some(haus) = setup().await else { return };
    let ctx = QueryContext::background();

    let first = Uuid::new_v4();
    let second = Uuid::new_v4();
    let result = haus
        .execute(
            &ctx,
            "contracts/insert",
            vec![
                contract_args(first, "batch-1", None, None),
                contract_args(second, "batch-2", None, None),
            ],
        )
        .await
        .unwrap();
    assert_eq!(result.rows_affected(), 2);

    // The duplicate key fails the second statement, so the first is rolled back too
    let fresh = Uuid::new_v4();
    let err = haus
        .execute(
            &ctx,
            "contracts/insert",
            vec![
                contract_args(fresh, "batch-3", None, None),
                contract_args(first, "batch-dup", None, None),
            ],
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DataError::Database { .. }), "unexpected error: {err}");

    let stored: Vec<Contract> = haus.fetch(&ctx, &[first, second, fresh]).await.unwrap();
    assert_eq!(stored.len(), 2);
    assert!(stored.iter().all(|c| c.id != fresh));
}

#[tokio::test]
async fn test_transaction_commit_and_rollback() {
    let Some(haus) = setup().await else { return };
    let ctx = QueryContext::background();

    let kept = Uuid::new_v4();
    let mut tx = haus.begin(&ctx).await.unwrap();
    haus.tx_execute(&ctx, tx.as_mut(), "contracts/insert", contract_args(kept, "kept", None, None))
        .await
        .unwrap();

    // Uncommitted rows are visible inside the transaction
    let rows: Vec<TitleRow> = haus
        .tx_query(&ctx, tx.as_mut(), "contracts/titles", args!["kept".to_string()])
        .await
        .unwrap()
        .try_collect()
        .await
        .unwrap();
    assert!(rows.iter().any(|r| r.id == kept));
    tx.commit().await.unwrap();

    let dropped = Uuid::new_v4();
    let mut tx = haus.begin(&ctx).await.unwrap();
    haus.tx_execute(&ctx, tx.as_mut(), "contracts/insert", contract_args(dropped, "dropped", None, None))
        .await
        .unwrap();
    tx.rollback().await.unwrap();

    let stored: Vec<Contract> = haus.fetch(&ctx, &[kept, dropped]).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id, kept);
}

#[tokio::test]
async fn test_fetch_page_keeps_list_order() {
    let Some(haus) = setup().await else { return };
    let ctx = QueryContext::background();
    let prefix = unique_prefix("page");

    for suffix in ["c", "a", "b"] {
        insert_contract(&haus, &format!("{prefix}{suffix}"), None, None).await;
    }

    let window = Paginate::page(1, 2);
    let page: Page<Contract> = haus
        .fetch_page(&ctx, "contracts/list", window.bind_window(args![prefix.clone()]), |c: &Contract| c.id)
        .await
        .unwrap();
    assert_eq!(page.total_count, 3);
    let titles: Vec<_> = page.items.iter().map(|c| c.title.clone()).collect();
    assert_eq!(titles, vec![format!("{prefix}a"), format!("{prefix}b")]);

    let empty: Page<Contract> = haus
        .fetch_page(
            &ctx,
            "contracts/list",
            Paginate::page(5, 2).bind_window(args![prefix]),
            |c: &Contract| c.id,
        )
        .await
        .unwrap();
    assert!(empty.is_empty());
    assert_eq!(empty.total_count, 0);
}

#[tokio::test]
async fn test_deadline_cancels_slow_query() {
    let Some(haus) = setup().await else { return };
    let ctx = QueryContext::with_timeout(Duration::from_millis(100));

    let err = haus.execute(&ctx, "sleep", args![2.0_f64]).await.unwrap_err();
    assert!(matches!(err, DataError::DeadlineExceeded(_)));
    assert_eq!(haus.breaker().counts().total_failures, 1);
}

#[tokio::test]
async fn test_unknown_query_counts_against_breaker() {
    let Some(haus) = setup().await else { return };
    let ctx = QueryContext::background();

    for _ in 0..3 {
        let err = haus.execute(&ctx, "contracts/missing", Args::new()).await.unwrap_err();
        assert!(matches!(err, DataError::QueryNotFound { .. }));
    }
    assert_eq!(haus.breaker().state(), CircuitState::Open);

    // Even a healthy query is rejected while the breaker is open
    let err = haus.health_check().await.unwrap_err();
    assert!(matches!(err, QueryHausError::Data(DataError::BreakerOpen(_))));
}

#[tokio::test]
async fn test_ensure_database_keeps_existing_database() {
    let Some(_haus) = setup().await else { return };
    let url = std::env::var("DATABASE_URL").unwrap();

    let created = bootstrap::ensure_database(&url).await.unwrap();
    assert!(!created);
}
