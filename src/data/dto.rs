use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::{DataChanges, DataRecord};

#[derive(Debug, Deserialize)]
pub struct CreateDataRequest {
    pub source: String,
    pub sentiment: String,
    pub text: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateDataRequest {
    pub source: Option<String>,
    pub sentiment: Option<String>,
    pub text: Option<String>,
}

impl From<UpdateDataRequest> for DataChanges {
    fn from(req: UpdateDataRequest) -> Self {
        Self {
            source: req.source,
            sentiment: req.sentiment,
            text: req.text,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DataOwner {
    pub id: Uuid,
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct DataResponse {
    pub id: Uuid,
    pub source: String,
    pub sentiment: String,
    pub text: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_date: OffsetDateTime,
    pub user: DataOwner,
}

impl From<DataRecord> for DataResponse {
    fn from(r: DataRecord) -> Self {
        Self {
            id: r.id,
            source: r.source,
            sentiment: r.sentiment,
            text: r.text,
            created_date: r.created_date,
            user: DataOwner {
                id: r.user_id,
                username: r.owner_username,
            },
        }
    }
}
