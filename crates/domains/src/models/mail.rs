use serde::{Deserialize, Serialize};

/// A message handed to the notification collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailData {
    pub to: String,
    pub from: String,
    pub subject: String,
    /// HTML body.
    pub content: String,
}
