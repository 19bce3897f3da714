//! Wire models for the REST backend.
//!
//! The backend is document-oriented: records carry `_id`, optional fields are
//! frequently absent, and populated references arrive either as ids or as
//! embedded objects. Everything here deserializes permissively.

use serde::{Deserialize, Serialize};

pub use portal_storage::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            "urgent" => Ok(Priority::Urgent),
            other => Err(format!("unknown priority: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Reply {
    pub content: String,
    pub sender_name: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Message {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub subject: String,
    pub content: String,
    pub sender_name: String,
    pub created_at: String,
    pub is_read: bool,
    pub priority: Priority,
    pub category: String,
    /// Append-only, oldest first.
    pub replies: Vec<Reply>,
}

/// Body of `POST /messages`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageDraft {
    pub subject: String,
    pub content: String,
    pub priority: Priority,
    pub category: String,
}

impl MessageDraft {
    pub fn new(subject: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            content: content.into(),
            priority: Priority::Medium,
            category: "general".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct MessagesEnvelope {
    #[serde(default)]
    pub messages: Vec<Message>,
}

/// A project's client, either as a bare id or as the populated record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClientRef {
    Id(String),
    Summary(ClientSummary),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSummary {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub company: String,
}

impl ClientRef {
    pub fn id(&self) -> &str {
        match self {
            ClientRef::Id(id) => id,
            ClientRef::Summary(summary) => &summary.id,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Project {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub name: String,
    pub description: String,
    pub status: String,
    pub priority: String,
    pub progress: u8,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub budget: Option<f64>,
    pub client_id: Option<ClientRef>,
    pub created_at: Option<String>,
}

/// Body of `POST /projects` and `PUT /projects/:id`. Absent fields are left
/// untouched on update.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDraft {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ProjectsEnvelope {
    #[serde(default)]
    pub projects: Vec<Project>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ProjectEnvelope {
    pub project: Option<Project>,
}

/// Body of `PUT /users/:id`; profile edits and admin (de)activation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl UserUpdate {
    /// Apply the set fields onto a local snapshot.
    pub fn apply_to(&self, user: &mut User) {
        if let Some(name) = &self.name {
            user.name = name.clone();
        }
        if let Some(email) = &self.email {
            user.email = email.clone();
        }
        if let Some(company) = &self.company {
            user.company = company.clone();
        }
        if self.phone.is_some() {
            user.phone = self.phone.clone();
        }
        if self.address.is_some() {
            user.address = self.address.clone();
        }
        if self.website.is_some() {
            user.website = self.website.clone();
        }
        if self.timezone.is_some() {
            user.timezone = self.timezone.clone();
        }
        if self.is_active.is_some() {
            user.is_active = self.is_active;
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct UsersEnvelope {
    #[serde(default)]
    pub users: Vec<User>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct UserEnvelope {
    pub user: Option<User>,
}

/// Body of `POST /auth/register`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub company: String,
}

/// `{token, user}` from login and register.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    #[serde(default)]
    pub message: Option<String>,
    pub token: String,
    pub user: User,
}

/// `GET /auth/verify`.
#[derive(Debug, Clone, Deserialize)]
pub struct VerifyResponse {
    #[serde(default)]
    pub valid: bool,
    #[serde(default)]
    pub user: Option<User>,
}

/// `GET /health`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HealthStatus {
    pub status: String,
    pub message: String,
    pub timestamp: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_defaults_for_sparse_record() {
        let msg: Message = serde_json::from_str(r#"{"_id":"m1","isRead":false}"#).unwrap();
        assert_eq!(msg.id, "m1");
        assert!(!msg.is_read);
        assert_eq!(msg.priority, Priority::Medium);
        assert!(msg.replies.is_empty());
    }

    #[test]
    fn test_message_full_record() {
        let msg: Message = serde_json::from_str(
            r#"{
                "_id": "m2",
                "subject": "Launch",
                "content": "Ready?",
                "senderName": "Sam",
                "createdAt": "2024-05-01T10:00:00Z",
                "isRead": true,
                "priority": "urgent",
                "category": "project",
                "replies": [{"content": "Yes", "senderName": "Ada", "createdAt": "2024-05-01T11:00:00Z"}]
            }"#,
        )
        .unwrap();
        assert_eq!(msg.sender_name, "Sam");
        assert_eq!(msg.priority, Priority::Urgent);
        assert_eq!(msg.replies.len(), 1);
        assert_eq!(msg.replies[0].sender_name, "Ada");
    }

    #[test]
    fn test_message_accepts_plain_id() {
        let msg: Message = serde_json::from_str(r#"{"id":"m3"}"#).unwrap();
        assert_eq!(msg.id, "m3");
    }

    #[test]
    fn test_draft_serializes_wire_shape() {
        let mut draft = MessageDraft::new("Hello", "Body");
        draft.priority = Priority::High;
        let json = serde_json::to_value(&draft).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "subject": "Hello",
                "content": "Body",
                "priority": "high",
                "category": "general"
            })
        );
    }

    #[test]
    fn test_project_client_ref_variants() {
        let populated: Project = serde_json::from_str(
            r#"{"_id":"p1","name":"Site","clientId":{"_id":"c1","name":"Acme"}}"#,
        )
        .unwrap();
        assert_eq!(populated.client_id.as_ref().unwrap().id(), "c1");

        let bare: Project = serde_json::from_str(r#"{"_id":"p2","clientId":"c2"}"#).unwrap();
        assert_eq!(bare.client_id.as_ref().unwrap().id(), "c2");
    }

    #[test]
    fn test_project_draft_omits_unset_fields() {
        let draft = ProjectDraft {
            status: Some("completed".to_string()),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&draft).unwrap(),
            serde_json::json!({"status": "completed"})
        );
    }

    #[test]
    fn test_user_update_apply() {
        let mut user = User {
            id: "1".to_string(),
            name: "Old".to_string(),
            ..Default::default()
        };
        let update = UserUpdate {
            name: Some("New".to_string()),
            timezone: Some("UTC".to_string()),
            ..Default::default()
        };
        update.apply_to(&mut user);
        assert_eq!(user.name, "New");
        assert_eq!(user.timezone.as_deref(), Some("UTC"));
        assert_eq!(user.id, "1");
    }

    #[test]
    fn test_priority_parse() {
        assert_eq!("URGENT".parse::<Priority>().unwrap(), Priority::Urgent);
        assert!("meh".parse::<Priority>().is_err());
    }
}
