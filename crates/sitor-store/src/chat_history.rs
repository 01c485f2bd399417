//! Typed access to the per-user `chat_histories` collection.

use sitor_shared::ObjectId;

use crate::documents::{from_document, to_document, DocumentStore, Filter, Update};
use crate::error::Result;
use crate::models::{collections::CHAT_HISTORIES, ChatHistory, ChatMessage};

fn owner_filter(user_id: ObjectId) -> Filter {
    Filter::all().eq("user_id", user_id)
}

pub trait ChatHistoryStore: DocumentStore {
    /// Messages of one user, oldest first. Empty if the user never chatted.
    fn get_chat_messages(&self, user_id: ObjectId) -> Result<Vec<ChatMessage>> {
        let history: Option<ChatHistory> = self
            .find_one(CHAT_HISTORIES, &owner_filter(user_id))?
            .map(from_document)
            .transpose()?;
        Ok(history.map(|h| h.messages).unwrap_or_default())
    }

    /// Append to the user's history document, creating it on first use.
    fn append_chat_message(&self, user_id: ObjectId, message: &ChatMessage) -> Result<()> {
        let update = Update::new().push("messages", to_document(message)?);
        self.update_one(CHAT_HISTORIES, &owner_filter(user_id), &update, true)?;
        Ok(())
    }
}

impl<S: DocumentStore + ?Sized> ChatHistoryStore for S {}
