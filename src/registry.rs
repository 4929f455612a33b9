use std::collections::HashMap;
use std::sync::Arc;

use teloxide::types::ChatId;
use tokio::sync::{mpsc, Mutex};
use tracing::info;
use uuid::Uuid;

use crate::config::{ConfigError, GameConfig};
use crate::game::{RandomSource, StdRandom};
use crate::session::{Session, SessionEvent};

type RandomFactory = fn() -> Box<dyn RandomSource + Send>;

fn entropy() -> Box<dyn RandomSource + Send> {
    Box::new(StdRandom::from_entropy())
}

/// One running session per chat, kept in memory only.
pub struct SessionRegistry {
    config: GameConfig,
    random: RandomFactory,
    sessions: Mutex<HashMap<ChatId, Arc<Session>>>,
}

impl SessionRegistry {
    pub fn new(config: GameConfig) -> Self {
        Self::with_random(config, entropy)
    }

    pub fn with_random(config: GameConfig, random: RandomFactory) -> Self {
        Self {
            config,
            random,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Starts a fresh session for `chat`, replacing the previous one.
    pub async fn start(
        &self,
        chat: ChatId,
    ) -> Result<(Arc<Session>, mpsc::UnboundedReceiver<SessionEvent>), ConfigError> {
        let (session, events) = Session::new(&self.config, (self.random)())?;
        let session = Arc::new(session);
        if let Some(previous) = self.sessions.lock().await.insert(chat, session.clone()) {
            info!(chat = chat.0, session = %previous.id(), "replacing session");
        }

        Ok((session, events))
    }

    pub async fn get(&self, chat: ChatId) -> Option<Arc<Session>> {
        self.sessions.lock().await.get(&chat).cloned()
    }

    pub async fn end(&self, chat: ChatId) -> Option<Arc<Session>> {
        self.sessions.lock().await.remove(&chat)
    }

    /// Forgets the chat's session if it is still `session` and its game is
    /// over. A replaced or restarted session stays.
    pub async fn end_finished(&self, chat: ChatId, session: Uuid) -> bool {
        let mut sessions = self.sessions.lock().await;
        let Some(current) = sessions.get(&chat) else {
            return false;
        };
        if current.id() != session || !current.snapshot().await.game_over {
            return false;
        }

        sessions.remove(&chat);
        info!(chat = chat.0, session = %session, "finished session released");
        true
    }
}
