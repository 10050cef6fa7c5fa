use chrono::DateTime;
use chrono::Utc;
use secrecy::Secret;
use tokio::sync::RwLock;

/// A short-lived bearer token plus its expiry, guarded single-writer
/// (§5 "token cache inside TicketClient ... guarded, single-writer,
/// revalidating"). Refreshed near expiry and once on a 401.
#[derive(Debug)]
pub struct TokenCache {
    inner: RwLock<Option<CachedToken>>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: Secret<String>,
    expires_at: DateTime<Utc>,
}

/// How close to expiry a cached token is treated as already stale.
const REFRESH_SKEW_SECONDS: i64 = 30;

impl TokenCache {
    pub fn new() -> Self {
        Self { inner: RwLock::new(None) }
    }

    /// Returns a still-valid cached token, if one exists.
    pub async fn get(&self) -> Option<Secret<String>> {
        let guard = self.inner.read().await;
        match guard.as_ref() {
            Some(token) if token.expires_at - chrono::Duration::seconds(REFRESH_SKEW_SECONDS) > Utc::now() => {
                Some(token.value.clone())
            }
            _ => None,
        }
    }

    pub async fn set(&self, value: Secret<String>, expires_at: DateTime<Utc>) {
        *self.inner.write().await = Some(CachedToken { value, expires_at });
    }

    /// Force the next `get` to miss, e.g. after observing a 401.
    pub async fn invalidate(&self) {
        *self.inner.write().await = None;
    }
}

impl Default for TokenCache {
    fn default() -> Self { Self::new() }
}
