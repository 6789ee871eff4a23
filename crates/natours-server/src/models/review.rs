//! Review records.

use crate::repository::Record;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: Uuid,
    pub review: String,
    pub rating: u8,
    /// Tour the review belongs to.
    pub tour: Uuid,
    /// Author.
    pub user: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Record for Review {
    const RESOURCE: &'static str = "review";

    fn id(&self) -> Uuid {
        self.id
    }

    fn unique_keys(&self) -> Vec<(&'static str, String)> {
        // One review per user per tour.
        vec![("tour+user", format!("{}:{}", self.tour, self.user))]
    }
}
