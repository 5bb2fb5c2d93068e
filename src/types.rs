use chrono::{DateTime, Datelike, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

pub const LABEL_INBOX: &str = "INBOX";
pub const LABEL_UNREAD: &str = "UNREAD";

#[derive(Debug, Deserialize)]
pub struct MessagesResponse {
    pub messages: Option<Vec<MessageRef>>,
    #[serde(rename = "nextPageToken")]
    pub next_page_token: Option<String>,
    #[serde(rename = "resultSizeEstimate")]
    #[allow(dead_code)]
    pub result_size_estimate: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct MessageRef {
    pub id: Option<String>,
    #[serde(rename = "threadId")]
    #[allow(dead_code)]
    pub thread_id: Option<String>,
}

/// One page of a message listing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub ids: Vec<String>,
    pub next_page_token: Option<String>,
}

impl From<MessagesResponse> for Page {
    fn from(response: MessagesResponse) -> Self {
        let ids = response
            .messages
            .unwrap_or_default()
            .into_iter()
            .filter_map(|m| m.id)
            .collect();
        // Gmail omits the token on the last page, but an empty one means the same
        let next_page_token = response.next_page_token.filter(|t| !t.is_empty());
        Page {
            ids,
            next_page_token,
        }
    }
}

#[derive(Debug, Serialize, Default, Clone, PartialEq)]
pub struct BatchModifyRequest {
    pub ids: Vec<String>,
    #[serde(rename = "addLabelIds")]
    pub add_label_ids: Vec<String>,
    #[serde(rename = "removeLabelIds")]
    pub remove_label_ids: Vec<String>,
}

impl BatchModifyRequest {
    /// Strips the inbox and unread labels from every id.
    pub fn archive(ids: Vec<String>) -> Self {
        Self {
            ids,
            add_label_ids: Vec::new(),
            remove_label_ids: vec![LABEL_INBOX.to_string(), LABEL_UNREAD.to_string()],
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Message {
    pub id: Option<String>,
    pub payload: Option<MessagePart>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct MessagePart {
    pub headers: Option<Vec<Header>>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Header {
    pub name: Option<String>,
    pub value: Option<String>,
}

impl Message {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.payload
            .as_ref()?
            .headers
            .as_ref()?
            .iter()
            .find(|h| h.name.as_deref() == Some(name))
            .and_then(|h| h.value.as_deref())
    }
}

/// Serialized credential blob accepted from `GOOGLE_TOKEN`.
///
/// Reads both the authorized-user JSON written by Google's Python auth
/// library (`token`, `client_id`, ...) and the `oauth2.Token` JSON written by
/// Go programs (`access_token`, `token_type`, ...).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoredToken {
    #[serde(alias = "access_token", skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scopes: Vec<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_expiry",
        skip_serializing_if = "Option::is_none"
    )]
    pub expiry: Option<DateTime<Utc>>,
}

/// Reads RFC 3339 expiries as well as offset-less ones, taken as UTC.
///
/// Go writes the zero time (year 1) for tokens that never expire, which is
/// read as no expiry at all.
fn deserialize_expiry<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = match Option::<String>::deserialize(deserializer)? {
        Some(raw) if !raw.is_empty() => raw,
        _ => return Ok(None),
    };
    let expiry = DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            NaiveDateTime::parse_from_str(raw.trim_end_matches('Z'), "%Y-%m-%dT%H:%M:%S%.f")
                .map(|naive| naive.and_utc())
        })
        .map_err(serde::de::Error::custom)?;

    Ok(Some(expiry).filter(|dt| dt.year() > 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_from_response_drops_empty_token() {
        let response: MessagesResponse = serde_json::from_str(
            r#"{"messages":[{"id":"a","threadId":"t1"},{"id":"b","threadId":"t2"}],"nextPageToken":""}"#,
        )
        .unwrap();
        let page = Page::from(response);
        assert_eq!(page.ids, vec!["a", "b"]);
        assert_eq!(page.next_page_token, None);
    }

    #[test]
    fn test_page_from_response_without_messages() {
        let response: MessagesResponse =
            serde_json::from_str(r#"{"resultSizeEstimate":0}"#).unwrap();
        let page = Page::from(response);
        assert!(page.ids.is_empty());
        assert_eq!(page.next_page_token, None);
    }

    #[test]
    fn test_archive_request_wire_format() {
        let request = BatchModifyRequest::archive(vec!["a".to_string()]);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "ids": ["a"],
                "addLabelIds": [],
                "removeLabelIds": ["INBOX", "UNREAD"]
            })
        );
    }

    #[test]
    fn test_stored_token_reads_python_format() {
        let blob = r#"{
            "token": "ya29.abc",
            "refresh_token": "1//refresh",
            "token_uri": "https://oauth2.googleapis.com/token",
            "client_id": "id.apps.googleusercontent.com",
            "client_secret": "shh",
            "scopes": ["https://www.googleapis.com/auth/gmail.modify"],
            "universe_domain": "googleapis.com",
            "account": "",
            "expiry": "2030-01-01T00:00:00.123456Z"
        }"#;
        let stored: StoredToken = serde_json::from_str(blob).unwrap();
        assert_eq!(stored.token.as_deref(), Some("ya29.abc"));
        assert_eq!(stored.client_id.as_deref(), Some("id.apps.googleusercontent.com"));
        assert_eq!(stored.scopes.len(), 1);
        assert!(stored.expiry.is_some());
    }

    #[test]
    fn test_stored_token_reads_go_format() {
        let blob = r#"{
            "access_token": "ya29.go",
            "token_type": "Bearer",
            "refresh_token": "1//go",
            "expiry": "2030-01-01T10:00:00.5+02:00"
        }"#;
        let stored: StoredToken = serde_json::from_str(blob).unwrap();
        assert_eq!(stored.token.as_deref(), Some("ya29.go"));
        assert_eq!(stored.refresh_token.as_deref(), Some("1//go"));
        assert_eq!(stored.client_id, None);
    }

    #[test]
    fn test_stored_token_zero_expiry_means_none() {
        let stored: StoredToken = serde_json::from_str(
            r#"{"access_token":"ya29.go","token_type":"Bearer","expiry":"0001-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(stored.expiry, None);
    }

    #[test]
    fn test_stored_token_expiry_without_offset_is_utc() {
        let stored: StoredToken =
            serde_json::from_str(r#"{"token":"ya29.py","expiry":"2030-01-01T00:00:00"}"#).unwrap();
        assert_eq!(
            stored.expiry.map(|e| e.to_rfc3339()),
            Some("2030-01-01T00:00:00+00:00".to_string())
        );

        let stored: StoredToken =
            serde_json::from_str(r#"{"token":"ya29.py","expiry":"2030-01-01T00:00:00.123456"}"#)
                .unwrap();
        assert!(stored.expiry.is_some());
    }

    #[test]
    fn test_stored_token_rejects_garbage_expiry() {
        let result: serde_json::Result<StoredToken> =
            serde_json::from_str(r#"{"token":"t","expiry":"tomorrow"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_message_header_lookup() {
        let message: Message = serde_json::from_str(
            r#"{"id":"a","payload":{"headers":[{"name":"Subject","value":"Hi"},{"name":"Date","value":"Mon, 1 Jan 2024 00:00:00 +0000"}]}}"#,
        )
        .unwrap();
        assert_eq!(message.header("Subject"), Some("Hi"));
        assert_eq!(message.header("From"), None);
    }
}
