use chrono::{DateTime, Utc};

use crate::{
    error::AppError,
    models::{ContactFilter, ContactRequest, ContactRequestKey, ContactStatus},
    payloads::{IntakePayload, ListQuery},
};

/// Absent, null and empty all count as missing. Whitespace is a value.
fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

pub fn contact_request_from_payload(
    payload: IntakePayload,
    now: DateTime<Utc>,
) -> Result<ContactRequest, AppError> {
    let kol = payload.kol.unwrap_or_default();

    let (user_id, campaign_id, kol_id) = match (
        present(payload.user_id),
        present(payload.campaign_id),
        present(kol.id),
    ) {
        (Some(user_id), Some(campaign_id), Some(kol_id)) => (user_id, campaign_id, kol_id),
        (user_id, campaign_id, kol_id) => {
            let missing: Vec<&str> = [
                ("userId", user_id.is_none()),
                ("campaignId", campaign_id.is_none()),
                ("kol.id", kol_id.is_none()),
            ]
            .into_iter()
            .filter_map(|(name, is_missing)| is_missing.then_some(name))
            .collect();

            return Err(AppError::MissingFields(missing.join(", ")));
        }
    };

    let key = ContactRequestKey::new(campaign_id, kol_id);

    Ok(ContactRequest {
        id: key.to_string(),
        campaign_id: key.campaign_id,
        campaign_title: present(payload.campaign_title),
        user_id,
        kol_id: key.kol_id,
        kol_handle: present(kol.handle),
        kol_name: present(kol.display_name),
        status: ContactStatus::InProgress,
        requested_at: now,
        withdrawn_at: None,
    })
}

pub fn filter_from_query(query: ListQuery) -> ContactFilter {
    ContactFilter {
        user_id: present(query.user_id),
        campaign_id: present(query.campaign_id),
    }
}

/// `Ok(None)` for ids that cannot name any record, `Err` only when the id is absent.
pub fn parse_key(id: &str) -> Result<Option<ContactRequestKey>, AppError> {
    if id.is_empty() {
        return Err(AppError::MissingFields("id".to_string()));
    }

    Ok(ContactRequestKey::parse(id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payloads::KolPayload;

    fn payload() -> IntakePayload {
        IntakePayload {
            user_id: Some("biz-1".to_string()),
            campaign_id: Some("camp-9".to_string()),
            campaign_title: Some("Spring launch".to_string()),
            kol: Some(KolPayload {
                id: Some("kol-3".to_string()),
                handle: Some("@kol3".to_string()),
                display_name: None,
            }),
        }
    }

    #[test]
    fn builds_in_progress_snapshot() {
        let now = Utc::now();
        let request = contact_request_from_payload(payload(), now).unwrap();

        assert_eq!(request.id, "camp-9:kol-3");
        assert_eq!(request.status, ContactStatus::InProgress);
        assert_eq!(request.requested_at, now);
        assert_eq!(request.campaign_title.as_deref(), Some("Spring launch"));
        assert_eq!(request.kol_handle.as_deref(), Some("@kol3"));
        assert!(request.kol_name.is_none());
        assert!(request.withdrawn_at.is_none());
    }

    #[test]
    fn names_every_missing_field() {
        let mut incomplete = payload();
        incomplete.user_id = Some(String::new());
        incomplete.kol = None;

        match contact_request_from_payload(incomplete, Utc::now()) {
            Err(AppError::MissingFields(fields)) => assert_eq!(fields, "userId, kol.id"),
            other => panic!("expected missing fields, got {other:?}"),
        }
    }

    #[test]
    fn whitespace_ids_count_as_present() {
        let mut spaced = payload();
        spaced.user_id = Some(" ".to_string());

        let request = contact_request_from_payload(spaced, Utc::now()).unwrap();

        assert_eq!(request.user_id, " ");
    }

    #[test]
    fn accepts_delimiter_in_campaign_id() {
        let mut colon = payload();
        colon.campaign_id = Some("camp:9".to_string());

        let request = contact_request_from_payload(colon, Utc::now()).unwrap();

        assert_eq!(request.campaign_id, "camp:9");
        assert_eq!(request.id, "camp%3A9:kol-3");
        assert_eq!(ContactRequestKey::parse(&request.id), Some(request.key()));
    }

    #[test]
    fn unparsable_ids_name_no_record() {
        assert!(parse_key("abc").unwrap().is_none());
        assert!(parse_key(":kol").unwrap().is_none());
        assert!(matches!(parse_key(""), Err(AppError::MissingFields(_))));
    }

    #[test]
    fn empty_query_values_are_no_filter() {
        let filter = filter_from_query(ListQuery {
            user_id: Some(String::new()),
            campaign_id: Some("camp-9".to_string()),
        });

        assert!(filter.user_id.is_none());
        assert_eq!(filter.campaign_id.as_deref(), Some("camp-9"));
    }
}
