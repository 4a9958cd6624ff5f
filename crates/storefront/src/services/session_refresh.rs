//! Session recovery.
//!
//! The client calls refresh when it regains focus or after a network error.
//! Refreshes are debounced per session by a timestamp stored in the session,
//! and only one refresh per session runs at a time in this process. The profile
//! reload retries transient database errors with a linear backoff.

use std::collections::HashSet;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::Utc;
use sqlx::PgPool;
use thiserror::Error;
use tower_sessions::Session;
use tower_sessions::session::Id;
use tracing::{debug, warn};

use crate::db::{RepositoryError, UserRepository};
use crate::models::{CurrentUser, session_keys};

/// Minimum time between two refreshes of one session.
pub const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

/// Attempts made to reload the profile.
pub const MAX_ATTEMPTS: u32 = 3;

/// Backoff step between attempts (attempt n waits n × this).
pub const RETRY_BACKOFF: Duration = Duration::from_millis(200);

/// Errors from a session refresh.
#[derive(Debug, Error)]
pub enum RefreshError {
    /// The session store failed.
    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// The profile could not be loaded.
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// The account behind the session no longer exists.
    #[error("account no longer exists")]
    AccountGone,
}

/// Result of a refresh call.
#[derive(Debug, Clone)]
pub struct RefreshOutcome {
    /// Identity now stored in the session, `None` if logged out.
    pub user: Option<CurrentUser>,
    /// Whether the identity was reloaded from the database.
    pub refreshed: bool,
}

/// Coordinates session refreshes across concurrent requests.
#[derive(Clone, Default)]
pub struct SessionRefresher {
    in_flight: Arc<Mutex<HashSet<Id>>>,
}

/// Removes the session from the in-flight set when dropped.
struct InFlightGuard {
    set: Arc<Mutex<HashSet<Id>>>,
    session_id: Id,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.set
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.session_id);
    }
}

impl SessionRefresher {
    /// Create a refresher with an empty in-flight set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the refresh slot for `session_id`, `None` if one is already running.
    fn try_begin(&self, session_id: Id) -> Option<InFlightGuard> {
        let inserted = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(session_id);
        inserted.then(|| InFlightGuard {
            set: Arc::clone(&self.in_flight),
            session_id,
        })
    }

    /// Refresh the identity stored in `session`.
    ///
    /// Inside the debounce window, or while another refresh of the same
    /// session is running, the cached identity is returned with `refreshed: false`.
    ///
    /// # Errors
    ///
    /// Returns `RefreshError::AccountGone` (after clearing the session) if the
    /// user was deleted, or another `RefreshError` if the reload failed.
    pub async fn refresh(
        &self,
        pool: &PgPool,
        session: &Session,
    ) -> Result<RefreshOutcome, RefreshError> {
        let Some(current) = session
            .get::<CurrentUser>(session_keys::CURRENT_USER)
            .await?
        else {
            return Ok(RefreshOutcome {
                user: None,
                refreshed: false,
            });
        };

        let now = Utc::now().timestamp();
        let last = session.get::<i64>(session_keys::LAST_REFRESH).await?;
        if !should_refresh(last, now) {
            debug!(user_id = %current.id, "Session refresh debounced");
            return Ok(RefreshOutcome {
                user: Some(current),
                refreshed: false,
            });
        }

        // A session that was never saved has no id and cannot overlap itself
        let _guard = match session.id() {
            Some(session_id) => match self.try_begin(session_id) {
                Some(guard) => Some(guard),
                None => {
                    debug!(user_id = %current.id, "Session refresh already in flight");
                    return Ok(RefreshOutcome {
                        user: Some(current),
                        refreshed: false,
                    });
                }
            },
            None => None,
        };

        let users = UserRepository::new(pool);
        let user_id = current.id;
        let loaded = with_retry(|| async {
            let Some(user) = users.get_by_id(user_id).await? else {
                return Ok(None);
            };
            Ok(users.get_profile(user_id).await?.map(|p| (user, p)))
        })
        .await?;

        let Some((user, profile)) = loaded else {
            session.flush().await?;
            return Err(RefreshError::AccountGone);
        };

        let updated = CurrentUser::from_parts(&user, &profile);
        session.cycle_id().await?;
        session
            .insert(session_keys::CURRENT_USER, &updated)
            .await?;
        session.insert(session_keys::LAST_REFRESH, now).await?;

        Ok(RefreshOutcome {
            user: Some(updated),
            refreshed: true,
        })
    }
}

/// Whether enough time has passed since `last` (unix seconds) to refresh again.
#[must_use]
pub fn should_refresh(last: Option<i64>, now: i64) -> bool {
    let window = i64::try_from(MIN_REFRESH_INTERVAL.as_secs()).unwrap_or(i64::MAX);
    last.is_none_or(|last| now.saturating_sub(last) >= window)
}

/// Run `op` up to [`MAX_ATTEMPTS`] times, retrying only transient errors.
///
/// # Errors
///
/// Returns the last error once attempts are exhausted, or the first
/// non-transient error.
pub async fn with_retry<T, F, Fut>(mut op: F) -> Result<T, RepositoryError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, RepositoryError>>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt < MAX_ATTEMPTS => {
                warn!(attempt, error = %e, "Transient error, retrying");
                tokio::time::sleep(RETRY_BACKOFF * attempt).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    #[test]
    fn test_debounce_window() {
        assert!(should_refresh(None, 1_000));
        assert!(!should_refresh(Some(1_000), 1_000));
        assert!(!should_refresh(Some(1_000), 1_029));
        assert!(should_refresh(Some(1_000), 1_030));
        // Clock went backwards: stay debounced
        assert!(!should_refresh(Some(1_000), 900));
    }

    #[test]
    fn test_single_flight_per_session() {
        let refresher = SessionRefresher::new();
        let first = refresher.try_begin(Id(1));
        assert!(first.is_some());
        assert!(refresher.try_begin(Id(1)).is_none());

        drop(first);
        assert!(refresher.try_begin(Id(1)).is_some());
    }

    #[test]
    fn test_sessions_of_one_user_refresh_independently() {
        // Two devices logged into the same account hold different sessions
        let refresher = SessionRefresher::new();
        let phone = refresher.try_begin(Id(10));
        let laptop = refresher.try_begin(Id(11));
        assert!(phone.is_some());
        assert!(laptop.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_transient_then_succeed() {
        let calls = AtomicU32::new(0);
        let result = with_retry(|| async {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            if n < 2 {
                Err(RepositoryError::Database(sqlx::Error::PoolTimedOut))
            } else {
                Ok(n)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_gives_up() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = with_retry(|| async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(RepositoryError::Database(sqlx::Error::PoolTimedOut))
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), MAX_ATTEMPTS);
    }

    #[tokio::test]
    async fn test_no_retry_on_permanent_error() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = with_retry(|| async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(RepositoryError::NotFound)
        })
        .await;
        assert!(matches!(result, Err(RepositoryError::NotFound)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
