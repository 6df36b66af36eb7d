//! Per-user conversations.
//!
//! Each user's conversation sits behind its own async mutex, so one user's
//! turns run one at a time while different users proceed concurrently.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use crate::session_state::Conversation;

pub type SharedConversation = Arc<Mutex<Conversation>>;

#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<i64, SharedConversation>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The conversation for `user_id`, created on first use.
    pub async fn conversation(&self, user_id: i64) -> SharedConversation {
        if let Some(existing) = self.sessions.read().await.get(&user_id) {
            return existing.clone();
        }
        let mut w = self.sessions.write().await;
        w.entry(user_id)
            .or_insert_with(|| Arc::new(Mutex::new(Conversation::new(user_id))))
            .clone()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
