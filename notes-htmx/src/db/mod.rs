mod db;
mod migrations;

pub use db::*;
pub use rusqlite;
pub use tokio_rusqlite;
