#![forbid(unsafe_code)]

mod support;

use serde_json::{Value, json};
use support::{library_graph, library_store, temp_dir, value};
use tc_core::{Config, ProposedChange, RejectReason, RelationshipGraph, RowIdentifier};
use tc_storage::{RelationalStore, StoreError};

fn tables(set: &tc_core::RelatedRowSet) -> Vec<(String, usize)> {
    set.tables()
        .iter()
        .map(|t| (t.table.to_string(), t.rows.len()))
        .collect()
}

#[test]
fn transaction_reads_its_member_and_book() {
    let graph = library_graph();
    let store = library_store();
    let (plan, related) = store
        .fetch_related(&graph, &RowIdentifier::new("library.transactions", "id", json!(1)))
        .expect("fetch");

    assert_eq!(plan.targets().len(), 3);
    assert_eq!(
        tables(&related),
        vec![
            ("library.transactions".to_string(), 1),
            ("library.members".to_string(), 1),
            ("library.books".to_string(), 1),
        ]
    );
    assert_eq!(value(&related, "library.members.name"), &json!("Ada Lovelace"));
    assert_eq!(value(&related, "library.books.title"), &json!("Dune"));
    assert_eq!(value(&related, "library.transactions.returned"), &json!(false));
    assert_eq!(value(&related, "library.transactions.return_date"), &Value::Null);
    assert!(
        related
            .flatten()
            .iter()
            .all(|(column, _)| !column.starts_with("hr."))
    );
}

#[test]
fn incoming_edges_return_every_referencing_row_in_key_order() {
    let graph = library_graph();
    let store = library_store();
    let (_, related) = store
        .fetch_related(&graph, &RowIdentifier::new("library.members", "id", json!(1)))
        .expect("fetch");

    assert_eq!(
        tables(&related),
        vec![
            ("library.members".to_string(), 1),
            ("library.transactions".to_string(), 2),
        ]
    );
    let rows = &related.tables()[1].rows;
    assert_eq!(rows[0].get("library.transactions.id"), Some(&json!(1)));
    assert_eq!(rows[1].get("library.transactions.id"), Some(&json!(2)));
    assert_eq!(
        rows[1].get("library.transactions.notes"),
        Some(&json!({"shelf": "B2"}))
    );
}

#[test]
fn second_hop_follows_the_first() {
    let graph = library_graph();
    let store = library_store();
    let (_, related) = store
        .fetch_related(&graph, &RowIdentifier::new("library.books", "id", json!(10)))
        .expect("fetch");
    assert_eq!(
        tables(&related),
        vec![
            ("library.books".to_string(), 1),
            ("library.transactions".to_string(), 1),
            ("library.members".to_string(), 1),
        ]
    );
}

#[test]
fn null_foreign_key_leaves_an_empty_table() {
    let graph = library_graph();
    let store = library_store();
    let (_, related) = store
        .fetch_related(&graph, &RowIdentifier::new("library.transactions", "id", json!(3)))
        .expect("fetch");
    assert_eq!(related.rows(&related.tables()[2].table), Some(&[][..]));
    assert_eq!(related.tables()[2].table.to_string(), "library.books");
}

#[test]
fn reads_are_idempotent() {
    let graph = library_graph();
    let store = library_store();
    let identifier = RowIdentifier::new("library.transactions", "id", json!(2));
    let (_, first) = store.fetch_related(&graph, &identifier).expect("first");
    let (_, second) = store.fetch_related(&graph, &identifier).expect("second");
    assert_eq!(first, second);
}

#[test]
fn identifier_must_name_exactly_one_row() {
    let graph = library_graph();
    let store = library_store();

    let err = store
        .fetch_related(&graph, &RowIdentifier::new("library.transactions", "id", json!(99)))
        .expect_err("missing row");
    assert!(matches!(err, StoreError::RowNotFound { .. }));

    let err = store
        .fetch_related(
            &graph,
            &RowIdentifier::new("library.transactions", "member_id", json!(1)),
        )
        .expect_err("two rows");
    assert!(matches!(err, StoreError::AmbiguousIdentifier { rows: 2, .. }));

    let err = store
        .fetch_related(&graph, &RowIdentifier::new("library.loans", "id", json!(1)))
        .expect_err("unknown table");
    assert!(matches!(
        err,
        StoreError::Core(tc_core::CoreError::UnknownTable(_))
    ));
}

#[test]
fn hostile_identifier_values_are_bound() {
    let graph = library_graph();
    let store = library_store();
    let err = store
        .fetch_related(
            &graph,
            &RowIdentifier::new("library.members", "name", json!("x' OR '1'='1")),
        )
        .expect_err("no such member");
    assert!(matches!(err, StoreError::RowNotFound { .. }));
}

#[test]
fn configured_store_attaches_files_relative_to_base_dir() {
    let dir = temp_dir("configured_store_attaches_files_relative_to_base_dir");
    {
        let seed = RelationalStore::open(dir.join("library.db")).expect("open seed");
        seed.connection()
            .execute_batch(
                "CREATE TABLE members (id INTEGER PRIMARY KEY, name TEXT NOT NULL);
                 INSERT INTO members VALUES (5, 'Hedy Lamarr');",
            )
            .expect("seed");
    }

    let config = Config::from_yaml_str(
        r#"
database:
  path: main.db
  attach:
    library: library.db
schema:
  tables:
    - name: library.members
      primary_key: id
      columns:
        - { name: id, type: integer }
        - { name: name, type: text }
  roots:
    - { table: library.members, depth: 0, direction: both }
"#,
    )
    .expect("config");
    let graph = RelationshipGraph::build(&config.schema).expect("graph");
    let store = RelationalStore::open_configured(&config.database, &dir).expect("open configured");
    let (_, related) = store
        .fetch_related(&graph, &RowIdentifier::new("library.members", "id", json!(5)))
        .expect("fetch");
    assert_eq!(value(&related, "library.members.name"), &json!("Hedy Lamarr"));
    assert!(dir.join("main.db").exists());
}

const LOANS_CONFIG: &str = r#"
schema:
  tables:
    - name: lending.members
      primary_key: id
      columns:
        - { name: id, type: integer }
        - { name: name, type: text }
    - name: lending.loans
      primary_key: id
      columns:
        - { name: id, type: integer }
        - { name: borrower_id, type: integer }
        - { name: cosigner_id, type: integer, nullable: true }
        - { name: amount, type: real }
  foreign_keys:
    - { from: lending.loans.borrower_id, to: lending.members.id }
    - { from: lending.loans.cosigner_id, to: lending.members.id }
  roots:
    - { table: lending.loans, depth: 1, direction: outgoing }
"#;

fn loans_store() -> (RelationshipGraph, RelationalStore) {
    let config = Config::from_yaml_str(LOANS_CONFIG).expect("parse loans config");
    let graph = RelationshipGraph::build(&config.schema).expect("build loans graph");
    let store = RelationalStore::open_in_memory().expect("open store");
    store.attach("lending", ":memory:").expect("attach lending");
    store
        .connection()
        .execute_batch(
            "CREATE TABLE lending.members (id INTEGER PRIMARY KEY, name TEXT NOT NULL);
             CREATE TABLE lending.loans (
                 id INTEGER PRIMARY KEY,
                 borrower_id INTEGER NOT NULL,
                 cosigner_id INTEGER,
                 amount REAL NOT NULL
             );
             INSERT INTO lending.members VALUES (1, 'Ada Lovelace');
             INSERT INTO lending.members VALUES (2, 'Grace Hopper');
             INSERT INTO lending.loans VALUES (5, 1, 2, 250.0);
             INSERT INTO lending.loans VALUES (6, 1, 1, 90.0);
             INSERT INTO lending.loans VALUES (7, 2, NULL, 40.0);",
        )
        .expect("seed loans");
    (graph, store)
}

#[test]
fn every_foreign_key_into_a_table_contributes_its_row() {
    let (graph, mut store) = loans_store();
    let loan = RowIdentifier::new("lending.loans", "id", json!(5));
    let (plan, related) = store.fetch_related(&graph, &loan).expect("fetch");

    assert_eq!(plan.targets().len(), 3);
    assert_eq!(
        tables(&related),
        vec![
            ("lending.loans".to_string(), 1),
            ("lending.members".to_string(), 2),
        ]
    );
    assert_eq!(
        related.to_json()["lending.members"],
        json!([
            {"lending.members.id": 1, "lending.members.name": "Ada Lovelace"},
            {"lending.members.id": 2, "lending.members.name": "Grace Hopper"},
        ])
    );

    let report = store
        .submit_changes(&graph, &loan, &[ProposedChange::new("members.name", "Changed")])
        .expect("submit");
    assert!(report.accepted.is_empty());
    assert_eq!(
        report.rejected[0].reason,
        RejectReason::AmbiguousRow {
            table: "lending.members".to_string(),
            rows: 2
        }
    );
    let names: Vec<String> = store
        .connection()
        .prepare("SELECT name FROM lending.members ORDER BY id")
        .and_then(|mut stmt| {
            let names = stmt
                .query_map([], |row| row.get::<_, String>(0))?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(names)
        })
        .expect("names");
    assert_eq!(names, vec!["Ada Lovelace", "Grace Hopper"]);
}

#[test]
fn keys_naming_the_same_row_read_it_once() {
    let (graph, mut store) = loans_store();
    let (_, related) = store
        .fetch_related(&graph, &RowIdentifier::new("lending.loans", "id", json!(6)))
        .expect("fetch");
    assert_eq!(
        tables(&related),
        vec![
            ("lending.loans".to_string(), 1),
            ("lending.members".to_string(), 1),
        ]
    );

    let report = store
        .submit_changes(
            &graph,
            &RowIdentifier::new("lending.loans", "id", json!(7)),
            &[ProposedChange::new("name", "Grace B. Hopper")],
        )
        .expect("submit");
    assert!(report.rejected.is_empty());
    assert_eq!(
        value(&report.confirmed, "lending.members.name"),
        &json!("Grace B. Hopper")
    );
}
