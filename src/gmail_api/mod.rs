//! Gmail API module split into logical submodules
//!
//! - auth: credential acquisition (environment token or interactive flow)
//! - messages: message listing, batch label changes and metadata lookups

pub mod auth;
pub mod messages;

pub use auth::{acquire_credential, Credential, OAuthFlow, RealOAuthFlow};
pub use messages::{GmailClient, MailboxApi, GMAIL_API_BASE_URL};
