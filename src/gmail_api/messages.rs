use async_trait::async_trait;
use reqwest::Response;
use secrecy::{ExposeSecret, SecretString};

use crate::error::{Error, Result};
use crate::gmail_api::auth::Credential;
use crate::types::{BatchModifyRequest, Message, MessagesResponse, Page};

pub const GMAIL_API_BASE_URL: &str = "https://gmail.googleapis.com";

/// Remote mailbox operations the archive loop needs.
#[async_trait]
pub trait MailboxApi: Send + Sync {
    /// Lists one page of message ids matching `query`.
    async fn list_messages(
        &self,
        query: &str,
        page_size: u32,
        page_token: Option<&str>,
    ) -> Result<Page>;

    /// Applies the same label changes to every id of the request.
    async fn batch_modify(&self, request: &BatchModifyRequest) -> Result<()>;

    /// Fetches the given headers of a message.
    async fn message_metadata(&self, id: &str, headers: &[&str]) -> Result<Message>;
}

/// Authenticated handle on the Gmail REST API of the signed-in user.
pub struct GmailClient {
    client: reqwest::Client,
    token: SecretString,
    base_url: String,
}

impl GmailClient {
    pub fn with_base_url(credential: &Credential, base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(Error::BuildGmailClientError)?;

        Ok(Self {
            client,
            token: SecretString::from(credential.access_token().to_string()),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn messages_url(&self) -> String {
        format!("{}/gmail/v1/users/me/messages", self.base_url)
    }
}

// Turn non-2xx responses into errors carrying the response body
async fn ensure_success(response: Response, operation: &'static str) -> Result<Response> {
    if response.status().is_success() {
        Ok(response)
    } else {
        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        Err(Error::ApiError {
            operation,
            status,
            body,
        })
    }
}

#[async_trait]
impl MailboxApi for GmailClient {
    async fn list_messages(
        &self,
        query: &str,
        page_size: u32,
        page_token: Option<&str>,
    ) -> Result<Page> {
        let page_size = page_size.to_string();
        let mut request = self
            .client
            .get(self.messages_url())
            .bearer_auth(self.token.expose_secret())
            .query(&[("q", query), ("maxResults", page_size.as_str())]);
        if let Some(page_token) = page_token {
            request = request.query(&[("pageToken", page_token)]);
        }

        let response = ensure_success(request.send().await?, "messages.list").await?;
        let messages: MessagesResponse = response.json().await?;
        Ok(Page::from(messages))
    }

    async fn batch_modify(&self, request: &BatchModifyRequest) -> Result<()> {
        let url = format!("{}/batchModify", self.messages_url());
        let response = self
            .client
            .post(&url)
            .bearer_auth(self.token.expose_secret())
            .json(request)
            .send()
            .await?;

        ensure_success(response, "messages.batchModify").await?;
        Ok(())
    }

    async fn message_metadata(&self, id: &str, headers: &[&str]) -> Result<Message> {
        let url = format!("{}/{}", self.messages_url(), id);
        let mut params = vec![("format", "metadata")];
        params.extend(headers.iter().map(|h| ("metadataHeaders", *h)));

        let response = self
            .client
            .get(&url)
            .bearer_auth(self.token.expose_secret())
            .query(&params)
            .send()
            .await?;

        let response = ensure_success(response, "messages.get").await?;
        Ok(response.json().await?)
    }
}
