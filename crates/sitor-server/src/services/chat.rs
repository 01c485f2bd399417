//! Per-user assistant chat transcript.

use chrono::{DateTime, Utc};

use sitor_shared::ObjectId;
use sitor_store::{ChatHistoryStore, ChatMessage, DocumentStore};

use crate::error::{ServerError, StoreContext};

pub fn chat_messages<S>(db: &S, user_id: ObjectId) -> Result<Vec<ChatMessage>, ServerError>
where
    S: DocumentStore + ?Sized,
{
    db.get_chat_messages(user_id)
        .context("Failed to fetch chat history")
}

pub fn add_chat_message<S>(
    db: &S,
    user_id: ObjectId,
    sender: String,
    message: String,
    now: DateTime<Utc>,
) -> Result<ChatMessage, ServerError>
where
    S: DocumentStore + ?Sized,
{
    if message.trim().is_empty() {
        return Err(ServerError::BadRequest("Message is required".into()));
    }
    let entry = ChatMessage {
        sender,
        message,
        created_at: now,
    };
    db.append_chat_message(user_id, &entry)
        .context("Failed to save chat message")?;
    Ok(entry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitor_store::Database;

    #[test]
    fn test_append_and_read_back() {
        let db = Database::open_in_memory().unwrap();
        let user = ObjectId::new();
        assert!(chat_messages(&db, user).unwrap().is_empty());

        add_chat_message(&db, user, "user".into(), "Saya merasa lelah".into(), Utc::now()).unwrap();
        add_chat_message(&db, user, "assistant".into(), "Istirahat dulu".into(), Utc::now()).unwrap();

        let messages = chat_messages(&db, user).unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].sender, "assistant");
    }

    #[test]
    fn test_blank_message_rejected() {
        let db = Database::open_in_memory().unwrap();
        let err = add_chat_message(&db, ObjectId::new(), "user".into(), "  ".into(), Utc::now())
            .unwrap_err();
        assert!(matches!(err, ServerError::BadRequest(_)));
    }
}
