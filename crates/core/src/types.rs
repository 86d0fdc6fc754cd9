/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Identifier of a stored technical record (time-ordered UUIDv7).
pub type RecordId = uuid::Uuid;
