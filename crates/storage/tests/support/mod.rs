#![forbid(unsafe_code)]
#![allow(dead_code)]

use serde_json::Value;
use std::path::PathBuf;
use tc_core::{Config, RelatedRowSet, RelationshipGraph};
use tc_storage::RelationalStore;

pub const LIBRARY_CONFIG: &str = r#"
schema:
  tables:
    - name: library.members
      primary_key: id
      columns:
        - { name: id, type: integer }
        - { name: name, type: text }
        - { name: email, type: text, nullable: true, aliases: ["e-mail address"] }
    - name: library.books
      primary_key: id
      columns:
        - { name: id, type: integer }
        - { name: title, type: text }
        - { name: author, type: text }
        - { name: pages, type: integer, nullable: true }
        - { name: published_on, type: date, nullable: true }
    - name: library.transactions
      primary_key: id
      columns:
        - { name: id, type: integer }
        - { name: member_id, type: integer }
        - { name: book_id, type: integer, nullable: true }
        - { name: borrowed_on, type: date }
        - { name: return_date, type: date, nullable: true, aliases: ["returned on"] }
        - { name: returned, type: boolean }
        - { name: fee, type: real, nullable: true }
        - { name: notes, type: json, nullable: true }
        - { name: due_at, type: timestamp, nullable: true }
        - { name: desk_opens, type: time, nullable: true }
    - name: hr.employees
      primary_key: id
      columns:
        - { name: id, type: integer }
        - { name: name, type: text }
        - { name: salary, type: real }
  foreign_keys:
    - { from: library.transactions.member_id, to: library.members.id }
    - { from: library.transactions.book_id, to: library.books.id }
  roots:
    - { table: library.transactions, depth: 1, direction: both }
    - { table: library.members, depth: 1, direction: incoming }
    - { table: library.books, depth: 2, direction: both }
    - { table: hr.employees, depth: 0, direction: both }
"#;

const LIBRARY_SQL: &str = r#"
CREATE TABLE library.members (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    email TEXT
);
CREATE TABLE library.books (
    id INTEGER PRIMARY KEY,
    title TEXT NOT NULL,
    author TEXT NOT NULL,
    pages INTEGER CHECK (pages > 0),
    published_on TEXT
);
CREATE TABLE library.transactions (
    id INTEGER PRIMARY KEY,
    member_id INTEGER NOT NULL REFERENCES members(id),
    book_id INTEGER REFERENCES books(id),
    borrowed_on TEXT NOT NULL,
    return_date TEXT,
    returned INTEGER NOT NULL DEFAULT 0,
    fee REAL,
    notes TEXT,
    due_at TEXT,
    desk_opens TEXT
);
CREATE TABLE hr.employees (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    salary REAL NOT NULL
);

INSERT INTO library.members VALUES (1, 'Ada Lovelace', 'ada@example.org');
INSERT INTO library.members VALUES (2, 'Grace Hopper', NULL);
INSERT INTO library.books VALUES (10, 'Dune', 'Frank Herbert', 412, '1965-08-01');
INSERT INTO library.books VALUES (11, 'Emma', 'Jane Austen', NULL, NULL);
INSERT INTO library.transactions VALUES (1, 1, 10, '2024-08-01', NULL, 0, NULL, NULL, NULL, NULL);
INSERT INTO library.transactions VALUES (2, 1, 11, '2024-08-03', NULL, 0, 1.5, '{"shelf":"B2"}', NULL, NULL);
INSERT INTO library.transactions VALUES (3, 2, NULL, '2024-07-01', '2024-07-20', 1, NULL, NULL, NULL, NULL);
INSERT INTO hr.employees VALUES (7, 'Linus', 52000.0);
"#;

pub fn temp_dir(test_name: &str) -> PathBuf {
    let base = std::env::temp_dir();
    let pid = std::process::id();
    let nonce = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    let dir = base.join(format!("tc_storage_{test_name}_{pid}_{nonce}"));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

pub fn library_graph() -> RelationshipGraph {
    let config = Config::from_yaml_str(LIBRARY_CONFIG).expect("parse library config");
    RelationshipGraph::build(&config.schema).expect("build library graph")
}

/// In-memory main database with `library` and `hr` attached and seeded.
pub fn library_store() -> RelationalStore {
    let store = RelationalStore::open_in_memory().expect("open store");
    store.attach("library", ":memory:").expect("attach library");
    store.attach("hr", ":memory:").expect("attach hr");
    store
        .connection()
        .execute_batch(LIBRARY_SQL)
        .expect("seed library");
    store
}

pub fn value<'a>(set: &'a RelatedRowSet, qualified_column: &str) -> &'a Value {
    set.single_value(qualified_column)
        .unwrap_or_else(|| panic!("no single value for {qualified_column}"))
}
