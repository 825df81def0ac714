/// Page identifiers are PostgreSQL BIGSERIAL values (or their in-memory equivalent).
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
