//! # Token Lifecycle
//!
//! On-demand access-token resolution for a hub: returns the stored token
//! while it is still valid, and otherwise refreshes it via the OAuth token
//! endpoint, persisting the rotated pair before returning. A read-through
//! cache with a hard TTL; there is no background refresh.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use metrics::counter;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

use crate::error::AppError;
use crate::hubspot::HubSpotClient;
use crate::repositories::CredentialRepository;

/// On-demand token lifecycle manager.
///
/// Refreshes are single-flight per hub: concurrent callers for the same
/// expired hub serialize on a per-hub lock, so the second caller observes
/// the freshly persisted credential instead of issuing a duplicate refresh.
pub struct TokenRefreshService {
    credentials: CredentialRepository,
    client: HubSpotClient,
    hub_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl TokenRefreshService {
    /// Create a new token refresh service instance
    pub fn new(credentials: CredentialRepository, client: HubSpotClient) -> Self {
        Self {
            credentials,
            client,
            hub_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Return a currently-valid access token for the hub, refreshing and
    /// persisting it first when the stored one has expired.
    ///
    /// Fails with [`AppError::AccountNotFound`] when no credential exists for
    /// the hub. A refresh failure is not retried and propagates to the
    /// caller.
    #[instrument(skip(self))]
    pub async fn ensure_valid_access_token(&self, hub_id: &str) -> Result<String, AppError> {
        let lock = self.hub_lock(hub_id).await;
        let _guard = lock.lock().await;

        let credential = self
            .credentials
            .find_by_hub_id(hub_id)
            .await?
            .ok_or_else(|| AppError::AccountNotFound {
                hub_id: hub_id.to_string(),
            })?;

        let now = Utc::now();
        if credential.expire_time.with_timezone(&Utc) > now {
            debug!(hub_id, "Access token still valid, returning stored token");
            return Ok(credential.access_token);
        }

        info!(hub_id, "Access token expired, refreshing");
        counter!("token_refresh_attempts_total").increment(1);

        let refreshed = match self.client.refresh_token(&credential.refresh_token).await {
            Ok(token) => token,
            Err(err) => {
                counter!("token_refresh_failure_total").increment(1);
                return Err(err.into());
            }
        };

        let expire_time = now + Duration::seconds(refreshed.expires_in);
        self.credentials
            .update_tokens(
                hub_id,
                &refreshed.access_token,
                &refreshed.refresh_token,
                expire_time,
            )
            .await?;

        counter!("token_refresh_success_total").increment(1);
        info!(hub_id, %expire_time, "Access token refreshed");

        Ok(refreshed.access_token)
    }

    /// Fetch or create the refresh lock for a hub. Entries are kept for the
    /// process lifetime; the map is bounded by the number of installed hubs.
    async fn hub_lock(&self, hub_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.hub_locks.lock().await;
        locks
            .entry(hub_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}
