use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use pagepatch_core::{AppConfig, BlobStore, PdfDocument, ReplacementStore};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Session data for one uploaded document
pub struct Session {
    pub document: PdfDocument,
    pub original_filename: String,
    /// Blob store key of the uploaded original
    pub storage_key: String,
    /// Public URL of the uploaded original
    pub public_url: String,
    pub created_at: std::time::Instant,
    /// Currently viewed page (0-based, for restoring state)
    pub current_page: usize,
}

/// Sessions older than this are dropped by the cleanup task.
const SESSION_MAX_AGE: std::time::Duration = std::time::Duration::from_secs(3600);

/// Global application state
pub struct AppState {
    /// Active sessions indexed by UUID
    sessions: RwLock<HashMap<Uuid, Session>>,
    /// Replacement pages per (document, page index); entries live until
    /// finalize or session expiry
    pub replacements: ReplacementStore,
    /// Injected blob store collaborator
    pub blob_store: Arc<dyn BlobStore>,
    /// Base configuration
    pub config: AppConfig,
}

impl AppState {
    /// Create application state with an injected blob store.
    ///
    /// Returns an error if the replacement store's temp directory cannot
    /// be created.
    pub fn new(config: AppConfig, blob_store: Arc<dyn BlobStore>) -> Result<Self> {
        let replacements = ReplacementStore::new()
            .map_err(|e| anyhow::anyhow!("Failed to create replacement store: {e}"))?;

        Ok(Self {
            sessions: RwLock::new(HashMap::new()),
            replacements,
            blob_store,
            config,
        })
    }

    /// Create a new session for an uploaded document.
    ///
    /// Returns the session ID as a string; it doubles as the document id
    /// in every API route and in the replacement store.
    pub async fn create_session(
        &self,
        document: PdfDocument,
        filename: String,
        storage_key: String,
        public_url: String,
    ) -> String {
        let id = Uuid::new_v4();

        let session = Session {
            document,
            original_filename: filename,
            storage_key,
            public_url,
            created_at: std::time::Instant::now(),
            current_page: 0,
        };

        self.sessions.write().await.insert(id, session);
        id.to_string()
    }

    /// Get a session by ID string.
    ///
    /// Returns `None` if the ID is not a valid UUID or session doesn't exist.
    pub async fn get_session(&self, id: &str) -> Option<SessionRef<'_>> {
        let uuid = Uuid::parse_str(id).ok()?;
        let sessions = self.sessions.read().await;
        if sessions.contains_key(&uuid) {
            Some(SessionRef {
                id: uuid,
                state: self,
            })
        } else {
            None
        }
    }

    /// Drop sessions older than [`SESSION_MAX_AGE`] along with their
    /// replacement entries.
    ///
    /// Clearing replacements here bounds how long a stale entry can
    /// survive a finalize that crashed before its own clear.
    pub async fn cleanup_old_sessions(&self) {
        let now = std::time::Instant::now();

        let mut sessions = self.sessions.write().await;
        let expired: Vec<Uuid> = sessions
            .iter()
            .filter(|(_, session)| now.duration_since(session.created_at) >= SESSION_MAX_AGE)
            .map(|(id, _)| *id)
            .collect();

        for id in expired {
            sessions.remove(&id);
            self.replacements.clear(&id.to_string());
            tracing::info!("Expired session {}", id);
        }
    }
}

/// A borrowed reference to a session that provides safe access patterns.
///
/// # Why This Pattern?
///
/// In async Rust, holding a lock guard (like `RwLockReadGuard`) across an
/// `.await` point is problematic - it can cause deadlocks and the guard
/// isn't `Send`. This pattern solves that by:
///
/// 1. Storing only the session ID and a reference to the state
/// 2. Acquiring locks only within synchronous closures
/// 3. Releasing locks before any `.await` points
pub struct SessionRef<'a> {
    id: Uuid,
    state: &'a AppState,
}

impl SessionRef<'_> {
    /// Access session data immutably within a closure.
    ///
    /// The closure runs synchronously while holding a read lock.
    /// The lock is released before this method returns.
    pub async fn with_session<F, R>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&Session) -> R,
    {
        let sessions = self.state.sessions.read().await;
        sessions.get(&self.id).map(f)
    }

    /// Access session data mutably within a closure.
    ///
    /// The closure runs synchronously while holding a write lock.
    /// The lock is released before this method returns.
    pub async fn with_session_mut<F, R>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&mut Session) -> R,
    {
        let mut sessions = self.state.sessions.write().await;
        sessions.get_mut(&self.id).map(f)
    }
}
