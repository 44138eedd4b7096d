pub mod filesystem;
pub mod sqlite;
