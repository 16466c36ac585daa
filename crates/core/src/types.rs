/// Primary keys of internal tables are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// Publicly embeddable resources (widgets, pricing tables, appointment
/// widgets) are addressed by UUID so ids cannot be enumerated.
pub type PublicId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
