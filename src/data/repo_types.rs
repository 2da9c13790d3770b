use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Data row joined with its owner's username.
#[derive(Debug, Clone, FromRow)]
pub struct DataRecord {
    pub id: Uuid,
    pub source: String,
    pub sentiment: String,
    pub text: String,
    pub created_date: OffsetDateTime,
    pub user_id: Uuid,
    pub owner_username: String,
}

#[derive(Debug, Clone)]
pub struct NewData {
    pub user_id: Uuid,
    pub source: String,
    pub sentiment: String,
    pub text: String,
}

/// Column-wise patch; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct DataChanges {
    pub source: Option<String>,
    pub sentiment: Option<String>,
    pub text: Option<String>,
}
