//! # Client Payloads
//!
//! Requests/responses between the marketplace frontend and this backend. All JSON.
//!
//! ### Send Contact Request
//! `POST /api/contact-requests`
//! ```json
//! {
//!   "userId": "biz-1",
//!   "campaignId": "camp-9",
//!   "campaignTitle": "Spring launch",
//!   "kol": { "id": "kol-3", "handle": "@kol3", "display_name": "Kol Three" }
//! }
//! ```
//! - `userId`, `campaignId`, `kol.id` required, empty strings count as missing
//! - Response: `{ "success": true, "message": "..." }`, never the stored record
//!
//! ### List Contact Requests
//! `GET /api/contact-requests?userId=biz-1&campaignId=camp-9`
//! - Both filters optional, combined with AND
//! - Response: `{ "success": true, "data": [ContactRequest, ...] }`, newest first, no withdrawn rows
//!
//! ### Withdraw Contact Request
//! `POST /api/contact-requests/{campaignId:kolId}/withdraw`
//! - Response: `{ "success": true, "message": "..." }` whether or not the row existed
//!
//! ### Errors
//! - `{ "error": "..." }` with 400/404/500
use serde::{Deserialize, Serialize};

use crate::models::ContactRequest;

pub const SENT_MESSAGE: &str = "Contact request sent successfully";
pub const WITHDRAWN_MESSAGE: &str = "Contact request withdrawn";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntakePayload {
    pub user_id: Option<String>,
    pub campaign_id: Option<String>,
    pub campaign_title: Option<String>,
    pub kol: Option<KolPayload>,
}

/// KOL fields keep the profile table's snake_case.
#[derive(Debug, Default, Deserialize)]
pub struct KolPayload {
    pub id: Option<String>,
    pub handle: Option<String>,
    pub display_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub user_id: Option<String>,
    pub campaign_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn ok(message: &str) -> Self {
        Self {
            success: true,
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DataResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> DataResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

pub type ListResponse = DataResponse<Vec<ContactRequest>>;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub store: String,
}
