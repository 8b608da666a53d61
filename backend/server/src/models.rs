//! # Contact Requests
//!
//! A contact request records that a business wants to reach a KOL about one of its campaigns.
//!
//! ## Identity
//! - One record per (campaign, KOL) pair, held as [`ContactRequestKey`]
//! - Rendered as `campaignId:kolId` only at the HTTP boundary
//! - `:` and `%` in the campaign half are percent-escaped, so `("a:b", "c")` and `("a", "b:c")` never collide
//!
//! ## Snapshots
//! Campaign title, KOL handle and KOL display name are copied in at request time.
//! Listing returns them as they were then, never joined live.
//!
//! ## Lifecycle
//! - Intake always writes `in_progress`, overwriting whatever was there (including `withdrawn`)
//! - Withdraw always writes `withdrawn`, never deletes
use std::fmt;

use chrono::{DateTime, Utc};
use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};
use serde::{Deserialize, Serialize};

pub const KEY_DELIMITER: char = ':';

/// Escaped in the campaign half so the first raw delimiter always ends it.
const CAMPAIGN_ESCAPE: &AsciiSet = &CONTROLS.add(b':').add(b'%');

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContactRequestKey {
    pub campaign_id: String,
    pub kol_id: String,
}

impl ContactRequestKey {
    pub fn new(campaign_id: impl Into<String>, kol_id: impl Into<String>) -> Self {
        Self {
            campaign_id: campaign_id.into(),
            kol_id: kol_id.into(),
        }
    }

    /// Inverse of `Display`. The KOL half is taken verbatim and may contain the delimiter.
    pub fn parse(id: &str) -> Option<Self> {
        let (campaign, kol_id) = id.split_once(KEY_DELIMITER)?;
        let campaign_id = percent_decode_str(campaign).decode_utf8().ok()?;

        if campaign_id.is_empty() || kol_id.is_empty() {
            return None;
        }

        Some(Self::new(campaign_id.into_owned(), kol_id))
    }
}

impl fmt::Display for ContactRequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{KEY_DELIMITER}{}",
            utf8_percent_encode(&self.campaign_id, CAMPAIGN_ESCAPE),
            self.kol_id
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactStatus {
    InProgress,
    Withdrawn,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactRequest {
    pub id: String,
    pub campaign_id: String,
    pub campaign_title: Option<String>,
    pub user_id: String,
    pub kol_id: String,
    pub kol_handle: Option<String>,
    pub kol_name: Option<String>,
    pub status: ContactStatus,
    pub requested_at: DateTime<Utc>,
    pub withdrawn_at: Option<DateTime<Utc>>,
}

impl ContactRequest {
    pub fn key(&self) -> ContactRequestKey {
        ContactRequestKey::new(&self.campaign_id, &self.kol_id)
    }

    pub fn is_withdrawn(&self) -> bool {
        self.status == ContactStatus::Withdrawn
    }

    /// No-op when already withdrawn so the first timestamp survives.
    pub fn withdraw(&mut self, at: DateTime<Utc>) {
        if self.is_withdrawn() {
            return;
        }

        self.status = ContactStatus::Withdrawn;
        self.withdrawn_at = Some(at);
    }
}

/// Conjunctive filters for listing. `None` matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactFilter {
    pub user_id: Option<String>,
    pub campaign_id: Option<String>,
}

impl ContactFilter {
    pub fn matches(&self, record: &ContactRequest) -> bool {
        if record.is_withdrawn() {
            return false;
        }

        let user_ok = self
            .user_id
            .as_deref()
            .is_none_or(|user_id| record.user_id == user_id);
        let campaign_ok = self
            .campaign_id
            .as_deref()
            .is_none_or(|campaign_id| record.campaign_id == campaign_id);

        user_ok && campaign_ok
    }
}

/// Newest first, ties broken by id.
pub fn sort_newest_first(records: &mut [ContactRequest]) {
    records.sort_by(|a, b| {
        b.requested_at
            .cmp(&a.requested_at)
            .then_with(|| a.id.cmp(&b.id))
    });
}
