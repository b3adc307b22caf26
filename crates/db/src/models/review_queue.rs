//! Pending-review message models.

use recruitflow_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const REVIEW_PENDING: &str = "pending";
pub const REVIEW_REJECTED: &str = "rejected";
pub const REVIEW_SENT: &str = "sent";

/// A row from the `review_queue` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ReviewItem {
    pub id: DbId,
    pub client_id: DbId,
    pub rule_kind: String,
    pub rule_id: DbId,
    pub template_slug: String,
    pub subject_type: String,
    pub subject_id: DbId,
    pub recipient: String,
    pub subject: String,
    pub body: String,
    pub status: String,
    pub decided_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

/// Insert payload for a rendered message awaiting review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewReviewItem {
    pub client_id: DbId,
    pub rule_kind: String,
    pub rule_id: DbId,
    pub template_slug: String,
    pub subject_type: String,
    pub subject_id: DbId,
    pub recipient: String,
    pub subject: String,
    pub body: String,
}
