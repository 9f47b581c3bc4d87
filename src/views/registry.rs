use slotmap::{DefaultKey, SlotMap};
use std::sync::Arc;
use tokio::{
    sync::{Mutex, RwLock},
    time::{sleep_until, Instant},
};
use tracing::{debug, warn};

use super::{session::PaginatorSession, Controls, ViewError};

type Sessions = SlotMap<DefaultKey, Arc<Mutex<PaginatorSession>>>;

/// Live paginator sessions, addressed by the key embedded in their custom ids.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<Sessions>>,
}

pub fn encode_key(key: DefaultKey) -> String {
    // A slotmap key always serializes
    serde_json::to_string(&key).unwrap_or_default()
}

/// Splits `paginator-<action>-<key>` into the action kind and the session key.
pub fn parse_custom_id(custom_id: &str) -> Option<(&str, DefaultKey)> {
    let rest = custom_id
        .strip_prefix(Controls::PREFIX)?
        .strip_prefix('-')?;
    let (kind, key) = rest.split_once('-')?;
    let key = serde_json::from_str(key).ok()?;
    Some((kind, key))
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `session`, sends its first page and starts its idle timer.
    pub async fn start(&self, mut session: PaginatorSession) -> Result<DefaultKey, ViewError> {
        let (key, handle) = {
            let mut sessions = self.sessions.write().await;
            let key = sessions.insert_with_key(|key| {
                session.bind(encode_key(key));
                Arc::new(Mutex::new(session))
            });
            (key, Arc::clone(&sessions[key]))
        };

        if let Err(why) = handle.lock().await.open().await {
            self.remove(key).await;
            return Err(why);
        }

        self.watch(key, handle);
        Ok(key)
    }

    pub async fn get(&self, key: DefaultKey) -> Option<Arc<Mutex<PaginatorSession>>> {
        self.sessions.read().await.get(key).cloned()
    }

    pub async fn remove(&self, key: DefaultKey) {
        if self.sessions.write().await.remove(key).is_some() {
            debug!(key = %encode_key(key), "Removed paginator session");
        }
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    fn watch(&self, key: DefaultKey, session: Arc<Mutex<PaginatorSession>>) {
        let registry = self.clone();
        tokio::spawn(async move {
            loop {
                let deadline = session.lock().await.deadline();
                sleep_until(deadline).await;

                let mut guard = session.lock().await;
                if guard.is_terminal() {
                    break;
                }
                // Activity while we slept moves the deadline
                if Instant::now() < guard.deadline() {
                    continue;
                }
                if let Err(why) = guard.expire().await {
                    warn!("Failed to expire paginator: {}", why);
                }
                break;
            }

            registry.remove(key).await;
        });
    }
}
