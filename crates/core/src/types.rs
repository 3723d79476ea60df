/// All primary keys and owner identities are PostgreSQL UUIDs.
pub type DbId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Zero-based index into a quest's steps ordered by `sort`.
pub type StepPosition = i32;
