//! SQLite schema for the fallback store.

/// Key/value table holding one JSON document per patient.
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS patients (
    id TEXT PRIMARY KEY,
    document TEXT NOT NULL                       -- Patient JSON, same shape as the file store
);
"#;
