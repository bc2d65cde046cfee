#![forbid(unsafe_code)]

use crate::config::{
    ColumnDescription, ForeignKeyDescription, RootDescription, SchemaDescription,
    TableDescription,
};
use crate::graph::{Direction, RelationshipGraph};
use crate::value::ColumnType;

pub(crate) fn column(name: &str, column_type: ColumnType, nullable: bool) -> ColumnDescription {
    ColumnDescription {
        name: name.to_string(),
        column_type,
        nullable,
        aliases: Vec::new(),
    }
}

fn aliased(mut column: ColumnDescription, aliases: &[&str]) -> ColumnDescription {
    column.aliases = aliases.iter().map(|a| a.to_string()).collect();
    column
}

pub(crate) fn library_description() -> SchemaDescription {
    SchemaDescription {
        tables: vec![
            TableDescription {
                name: "library.members".to_string(),
                primary_key: "id".to_string(),
                columns: vec![
                    column("id", ColumnType::Integer, false),
                    column("name", ColumnType::Text, false),
                    aliased(column("email", ColumnType::Text, true), &["e-mail address"]),
                ],
            },
            TableDescription {
                name: "library.books".to_string(),
                primary_key: "id".to_string(),
                columns: vec![
                    column("id", ColumnType::Integer, false),
                    column("title", ColumnType::Text, false),
                    column("author", ColumnType::Text, false),
                    column("pages", ColumnType::Integer, true),
                    column("published_on", ColumnType::Date, true),
                ],
            },
            TableDescription {
                name: "library.transactions".to_string(),
                primary_key: "id".to_string(),
                columns: vec![
                    column("id", ColumnType::Integer, false),
                    column("member_id", ColumnType::Integer, false),
                    column("book_id", ColumnType::Integer, false),
                    column("borrowed_on", ColumnType::Date, false),
                    aliased(column("return_date", ColumnType::Date, true), &["returned on"]),
                    column("returned", ColumnType::Boolean, false),
                    column("fee", ColumnType::Real, true),
                    column("notes", ColumnType::Json, true),
                ],
            },
            TableDescription {
                name: "hr.employees".to_string(),
                primary_key: "id".to_string(),
                columns: vec![
                    column("id", ColumnType::Integer, false),
                    column("name", ColumnType::Text, false),
                    column("salary", ColumnType::Integer, false),
                ],
            },
        ],
        foreign_keys: vec![
            ForeignKeyDescription {
                from: "library.transactions.member_id".to_string(),
                to: "library.members.id".to_string(),
            },
            ForeignKeyDescription {
                from: "library.transactions.book_id".to_string(),
                to: "library.books.id".to_string(),
            },
        ],
        roots: vec![
            RootDescription {
                table: "library.transactions".to_string(),
                depth: 1,
                direction: Direction::Both,
            },
            RootDescription {
                table: "library.members".to_string(),
                depth: 1,
                direction: Direction::Incoming,
            },
            RootDescription {
                table: "library.books".to_string(),
                depth: 2,
                direction: Direction::Both,
            },
            RootDescription {
                table: "hr.employees".to_string(),
                depth: 0,
                direction: Direction::Both,
            },
        ],
    }
}

pub(crate) fn library_graph() -> RelationshipGraph {
    RelationshipGraph::build(&library_description()).expect("library graph")
}
