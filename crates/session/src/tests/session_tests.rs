use super::helpers::*;
use crate::{Session, SessionError};
use sstable::TableWriter;
use std::sync::Arc;

#[test]
fn single_transaction_decodes_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    write_table(
        &dir.path().join("000005.ldb"),
        &[(
            b"transactions/test_txn_001",
            1,
            txn_payload("Acme Coffee Shop", -4.5, "2025-01-15"),
        )],
    );

    let session = Session::open(dir.path()).unwrap();
    assert!(session.is_available());

    let ds = session.dataset().unwrap();
    assert_eq!(ds.transactions.len(), 1);
    let txn = &ds.transactions[0];
    assert_eq!(txn.transaction_id, "test_txn_001");
    assert_eq!(txn.amount, -4.5);
    assert_eq!(txn.date, "2025-01-15");
    assert_eq!(txn.display_name(), "Acme Coffee Shop");
    assert!(!txn.internal_transfer);
}

#[test]
fn account_id_comes_from_the_key() {
    let dir = tempfile::tempdir().unwrap();
    // 23-character document id, no account_id field in the payload.
    write_table(
        &dir.path().join("000005.ldb"),
        &[(
            b"accounts/AbCdEfGhIjKlMnOpQrStUvW",
            1,
            document_payload(&[
                ("current_balance", double_value(2500.0)),
                ("name", string_value("Test Checking")),
            ]),
        )],
    );

    let ds = Session::open(dir.path()).unwrap().dataset().unwrap();
    assert_eq!(ds.accounts.len(), 1);
    assert_eq!(ds.accounts[0].account_id, "AbCdEfGhIjKlMnOpQrStUvW");
    assert_eq!(ds.accounts[0].account_id.len(), 23);
}

#[test]
fn duplicates_across_files_collapse_to_one() {
    let dir = tempfile::tempdir().unwrap();
    let payload = txn_payload("Acme Coffee Shop", -4.5, "2025-01-15");
    write_table(
        &dir.path().join("000005.ldb"),
        &[(b"transactions/txn_aaa111", 1, payload.clone())],
    );
    write_table(
        &dir.path().join("000007.ldb"),
        &[(b"transactions/txn_bbb222", 2, payload)],
    );

    let ds = Session::open(dir.path()).unwrap().dataset().unwrap();
    assert_eq!(ds.transactions.len(), 1);
}

#[test]
fn truncated_field_is_omitted_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    write_table(
        &dir.path().join("000005.ldb"),
        &[
            (
                b"transactions/txn_torn_001",
                1,
                document_payload(&[
                    ("amount", truncated_double_value()),
                    ("date", string_value("2025-01-15")),
                    ("name", string_value("Torn Write Cafe")),
                ]),
            ),
            (
                b"transactions/txn_good_001",
                2,
                txn_payload("Intact Diner", -12.0, "2025-01-16"),
            ),
        ],
    );

    let session = Session::open(dir.path()).unwrap();

    // The torn document still decodes; only the bad field is gone.
    let docs = session.documents(Some("transactions")).unwrap();
    assert_eq!(docs.len(), 2);
    let torn = docs
        .iter()
        .find(|d| d.document_id == "txn_torn_001")
        .unwrap();
    assert!(torn.fields.get("amount").is_none());
    assert_eq!(
        torn.fields.get("name").unwrap().as_str(),
        Some("Torn Write Cafe")
    );

    // The builder gate drops it; the intact sibling survives.
    let ds = session.dataset().unwrap();
    assert_eq!(ds.transactions.len(), 1);
    assert_eq!(ds.transactions[0].display_name(), "Intact Diner");
}

#[test]
fn empty_directory_is_not_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let session = Session::open(dir.path()).unwrap();
    assert!(!session.is_available());

    let ds = session.dataset().unwrap();
    assert!(ds.is_empty());

    let info = session.cache_info().unwrap();
    assert_eq!(info.transaction_count, 0);
    assert_eq!(info.oldest_transaction_date, None);
    assert_eq!(info.newest_transaction_date, None);
}

#[test]
fn missing_directory_fails_with_database_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("no_such_db");
    let err = Session::open(&missing).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<SessionError>(),
        Some(SessionError::DatabaseNotFound { .. })
    ));
}

#[test]
fn later_delete_shadows_earlier_put() {
    let dir = tempfile::tempdir().unwrap();
    write_table(
        &dir.path().join("000005.ldb"),
        &[(
            b"transactions/txn_gone_001",
            5,
            txn_payload("Refunded Purchase", -30.0, "2025-01-10"),
        )],
    );
    let mut w = TableWriter::new();
    w.delete(b"transactions/txn_gone_001", 9);
    w.put(
        b"transactions/txn_kept_001",
        10,
        &txn_payload("Kept Purchase", -15.0, "2025-01-11"),
    );
    w.finish(&dir.path().join("000007.ldb")).unwrap();

    let ds = Session::open(dir.path()).unwrap().dataset().unwrap();
    assert_eq!(ds.transactions.len(), 1);
    assert_eq!(ds.transactions[0].transaction_id, "txn_kept_001");
}

#[test]
fn repeated_decodes_are_identical_and_cached() {
    let dir = tempfile::tempdir().unwrap();
    write_table(
        &dir.path().join("000005.ldb"),
        &[(
            b"transactions/txn_001",
            1,
            txn_payload("Grocery Mart", -80.0, "2025-01-12"),
        )],
    );

    let session = Session::open(dir.path()).unwrap();
    let first = session.documents(None).unwrap();
    let second = session.documents(None).unwrap();
    assert_eq!(first, second);

    let a = session.dataset().unwrap();
    let b = session.dataset().unwrap();
    assert!(Arc::ptr_eq(&a, &b));
}

#[test]
fn two_sessions_decode_identical_records() {
    let dir = tempfile::tempdir().unwrap();
    write_table(
        &dir.path().join("000005.ldb"),
        &[
            (
                b"transactions/txn_001",
                1,
                txn_payload("Grocery Mart", -80.0, "2025-01-12"),
            ),
            (
                b"accounts/acct_stable_01",
                2,
                document_payload(&[
                    ("current_balance", double_value(512.0)),
                    ("name", string_value("Stable Savings")),
                ]),
            ),
        ],
    );

    let a = Session::open(dir.path()).unwrap().dataset().unwrap();
    let b = Session::open(dir.path()).unwrap().dataset().unwrap();
    assert_eq!(a.transactions, b.transactions);
    assert_eq!(a.accounts, b.accounts);
}

#[test]
fn every_document_has_well_formed_identity() {
    let dir = tempfile::tempdir().unwrap();
    write_table(
        &dir.path().join("000005.ldb"),
        &[
            (
                b"transactions/txn_001",
                1,
                txn_payload("Identity Check", -1.0, "2025-01-01"),
            ),
            (
                b"users/u1/financial_goals/goal_1/financial_goal_history/2025-02",
                2,
                document_payload(&[("contribution", double_value(10.0))]),
            ),
        ],
    );

    let docs = Session::open(dir.path()).unwrap().documents(None).unwrap();
    assert!(!docs.is_empty());
    for doc in &docs {
        assert!(!doc.collection.is_empty());
        assert!(!doc.document_id.is_empty());
        assert!(!doc.document_id.contains('/'));
    }
}

#[test]
fn unreadable_file_falls_back_to_heuristic_recovery() {
    let dir = tempfile::tempdir().unwrap();
    write_table(
        &dir.path().join("000005.ldb"),
        &[(
            b"transactions/txn_strict_001",
            1,
            txn_payload("Strict Decode Deli", -7.25, "2025-01-20"),
        )],
    );

    // No footer, no blocks: strict open fails, but the protobuf fragments
    // inside are still recoverable.
    let mut garbage = vec![0xde, 0xad, 0xbe, 0xef];
    garbage.extend_from_slice(&field_entry("amount", &double_value(-33.1)));
    garbage.extend_from_slice(&field_entry("date", &string_value("2025-01-21")));
    garbage.extend_from_slice(&field_entry("name", &string_value("Recovered Bistro")));
    garbage.extend(vec![0x00; 128]);
    std::fs::write(dir.path().join("000007.ldb"), &garbage).unwrap();

    let ds = Session::open(dir.path()).unwrap().dataset().unwrap();
    let names: Vec<_> = ds.transactions.iter().map(|t| t.display_name()).collect();
    assert!(names.contains(&"Strict Decode Deli"));
    assert!(names.contains(&"Recovered Bistro"));
}

#[test]
fn recoveries_from_multiple_failed_files_all_survive() {
    let dir = tempfile::tempdir().unwrap();

    // Two corrupt files, each holding one recoverable transaction. Their
    // synthesized ids must not collide, or the second file's recovery
    // would be silently dropped by the merge.
    for (file, name) in [
        ("000007.ldb", "First Corrupt Cafe"),
        ("000009.ldb", "Second Corrupt Cafe"),
    ] {
        let mut garbage = vec![0xba, 0xad];
        garbage.extend_from_slice(&field_entry("amount", &double_value(-5.0)));
        garbage.extend_from_slice(&field_entry("date", &string_value("2025-01-22")));
        garbage.extend_from_slice(&field_entry("name", &string_value(name)));
        garbage.extend(vec![0x00; 128]);
        std::fs::write(dir.path().join(file), &garbage).unwrap();
    }

    let ds = Session::open(dir.path()).unwrap().dataset().unwrap();
    let mut names: Vec<_> = ds.transactions.iter().map(|t| t.display_name()).collect();
    names.sort_unstable();
    assert_eq!(names, vec!["First Corrupt Cafe", "Second Corrupt Cafe"]);
}

#[test]
fn concurrent_first_callers_share_one_dataset() {
    let dir = tempfile::tempdir().unwrap();
    write_table(
        &dir.path().join("000005.ldb"),
        &[(
            b"transactions/txn_001",
            1,
            txn_payload("Shared Decode Diner", -9.0, "2025-01-13"),
        )],
    );

    let session = Session::open(dir.path()).unwrap();
    let barrier = std::sync::Barrier::new(8);

    let datasets: Vec<_> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                s.spawn(|| {
                    barrier.wait();
                    session.dataset().unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for ds in &datasets[1..] {
        assert!(Arc::ptr_eq(&datasets[0], ds));
    }

    // The decode ran exactly once: with the directory gone, only the
    // cached result can satisfy further calls.
    std::fs::remove_dir_all(dir.path()).unwrap();
    let cached = session.dataset().unwrap();
    assert!(Arc::ptr_eq(&datasets[0], &cached));
    assert_eq!(cached.transactions.len(), 1);
}

#[test]
fn cache_info_reports_transaction_date_range() {
    let dir = tempfile::tempdir().unwrap();
    write_table(
        &dir.path().join("000005.ldb"),
        &[
            (
                b"transactions/txn_old",
                1,
                txn_payload("Old Purchase", -5.0, "2024-11-02"),
            ),
            (
                b"transactions/txn_new",
                2,
                txn_payload("New Purchase", -6.0, "2025-02-14"),
            ),
        ],
    );

    let info = Session::open(dir.path()).unwrap().cache_info().unwrap();
    assert_eq!(info.transaction_count, 2);
    assert_eq!(info.oldest_transaction_date.as_deref(), Some("2024-11-02"));
    assert_eq!(info.newest_transaction_date.as_deref(), Some("2025-02-14"));
}

#[test]
fn collection_filter_limits_documents() {
    let dir = tempfile::tempdir().unwrap();
    write_table(
        &dir.path().join("000005.ldb"),
        &[
            (
                b"transactions/txn_001",
                1,
                txn_payload("Filter Cafe", -3.0, "2025-01-05"),
            ),
            (
                b"accounts/acct_filter_01",
                2,
                document_payload(&[
                    ("current_balance", double_value(100.0)),
                    ("name", string_value("Filtered Savings")),
                ]),
            ),
        ],
    );

    let session = Session::open(dir.path()).unwrap();
    let txns = session.documents(Some("transactions")).unwrap();
    assert_eq!(txns.len(), 1);
    assert_eq!(txns[0].leaf_collection(), "transactions");
    let all = session.documents(None).unwrap();
    assert_eq!(all.len(), 2);
}

#[test]
fn subcollection_documents_route_by_leaf() {
    let dir = tempfile::tempdir().unwrap();
    write_table(
        &dir.path().join("000005.ldb"),
        &[(
            b"financial_goals/goal_abc123/financial_goal_history/2025-03",
            1,
            document_payload(&[
                ("contribution", double_value(250.0)),
                ("balance", double_value(1750.0)),
            ]),
        )],
    );

    let ds = Session::open(dir.path()).unwrap().dataset().unwrap();
    assert_eq!(ds.goal_history.len(), 1);
    let row = &ds.goal_history[0];
    assert_eq!(row.goal_id.as_deref(), Some("goal_abc123"));
    assert_eq!(row.month.as_deref(), Some("2025-03"));
    assert_eq!(row.contribution, Some(250.0));
    assert_eq!(row.balance, Some(1750.0));
}

#[test]
fn pending_flag_decodes_from_boolean_field() {
    let dir = tempfile::tempdir().unwrap();
    write_table(
        &dir.path().join("000005.ldb"),
        &[(
            b"transactions/txn_pending_01",
            1,
            document_payload(&[
                ("amount", double_value(-19.99)),
                ("date", string_value("2025-01-18")),
                ("name", string_value("Pending Web Order")),
                ("pending", bool_value(true)),
            ]),
        )],
    );

    let ds = Session::open(dir.path()).unwrap().dataset().unwrap();
    assert_eq!(ds.transactions[0].pending, Some(true));
}
