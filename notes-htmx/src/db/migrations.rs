use lazy_static::lazy_static;
use rusqlite_migration::{Migrations, M};

lazy_static! {
    pub static ref MIGRATIONS: Migrations<'static> = Migrations::new(vec![
        M::up(
            r#"
            CREATE TABLE users (
                id BLOB PRIMARY KEY CHECK(length(id) = 16) NOT NULL UNIQUE DEFAULT (uuid7_now()),
                name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE COLLATE NOCASE,
                password TEXT NOT NULL,

                created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at DATETIME
            );
        "#
        ),
        M::up(
            r#"
            CREATE TABLE notes (
                id BLOB PRIMARY KEY CHECK(length(id) = 16) NOT NULL UNIQUE DEFAULT (uuid7_now()),

                title TEXT NOT NULL,
                body TEXT NOT NULL DEFAULT '',

                created_at DATETIME NOT NULL,
                created_by BLOB NOT NULL CHECK(length(created_by) = 16),
                updated_at DATETIME NOT NULL,

                FOREIGN KEY (created_by) REFERENCES users (id) ON DELETE CASCADE
            );

            CREATE INDEX notes_created_by_updated_at ON notes (created_by, updated_at DESC);
        "#
        ),
    ]);
}

