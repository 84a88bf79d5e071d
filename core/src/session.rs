//! Cached credential sessions with single-flight refresh.

use std::fmt::{self, Debug};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use tokio::sync::watch;

use crate::time::{now, DateTime};
use crate::{Context, Error, ProvideCredential, Result, SigningCredential};

/// Sessions expiring within this window are treated as already expired.
pub const EXPIRY_GRACE: Duration = Duration::from_secs(20);

/// Check whether a session expiring at `expires_at` can still be handed out.
///
/// `None` means the session never expires.
pub fn is_fresh(expires_at: Option<DateTime>) -> bool {
    match expires_at {
        Some(expires_at) => match chrono::TimeDelta::from_std(EXPIRY_GRACE) {
            Ok(grace) => now() + grace < expires_at,
            Err(_) => false,
        },
        None => true,
    }
}

type Outcome<C> = std::result::Result<C, Arc<Error>>;

type Inflight<C> = Option<watch::Receiver<Option<Outcome<C>>>>;

struct Inner<C> {
    provider: Box<dyn ProvideCredential<Credential = C>>,
    /// Readers of a valid session only ever take this lock.
    session: RwLock<Option<C>>,
    /// Held while deciding whether to start a refresh. Always taken before
    /// `session` when both are needed.
    inflight: Mutex<Inflight<C>>,
    refreshes: AtomicUsize,
}

/// SessionCache holds the current credential of a provider and refreshes it
/// on demand.
///
/// - A valid cached credential is returned without touching the provider.
/// - When the credential is missing or expired, exactly one refresh runs no
///   matter how many callers are waiting. All of them receive its outcome.
/// - A failed refresh is reported to every waiter and then forgotten, the
///   next [`SessionCache::get`] starts over. A refresh yielding an already
///   expired credential counts as failed.
///
/// Clones share the same cache.
pub struct SessionCache<C> {
    inner: Arc<Inner<C>>,
    timeout: Option<Duration>,
}

impl<C> Clone for SessionCache<C> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            timeout: self.timeout,
        }
    }
}

impl<C: SigningCredential> Debug for SessionCache<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cached = self
            .inner
            .session
            .read()
            .map(|s| s.is_some())
            .unwrap_or_default();
        f.debug_struct("SessionCache")
            .field("provider", &self.inner.provider)
            .field("cached", &cached)
            .field("refreshes", &self.refresh_count())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl<C: SigningCredential> SessionCache<C> {
    /// Create a cache loading credentials from `provider`.
    pub fn new(provider: impl ProvideCredential<Credential = C>) -> Self {
        Self {
            inner: Arc::new(Inner {
                provider: Box::new(provider),
                session: RwLock::new(None),
                inflight: Mutex::new(None),
                refreshes: AtomicUsize::new(0),
            }),
            timeout: None,
        }
    }

    /// Bound how long [`SessionCache::get`] waits for a refresh.
    ///
    /// The refresh itself keeps running after a caller gives up.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Return the current credential, refreshing it when needed.
    pub async fn get(&self, ctx: &Context) -> Result<C> {
        if let Some(cred) = self.cached() {
            return Ok(cred);
        }

        let mut rx = {
            let mut inflight = self.inner.inflight.lock().expect("lock poisoned");
            {
                // Another caller may have finished a refresh while we waited
                // for the lock.
                let mut session = self.inner.session.write().expect("lock poisoned");
                if let Some(cred) = session.as_ref() {
                    if cred.is_valid() {
                        return Ok(cred.clone());
                    }
                    log::debug!("cached session expired, refreshing");
                    *session = None;
                }
            }

            match &*inflight {
                // A closed channel means the refresh task died before
                // reporting, start a new one instead of waiting forever.
                Some(rx) if rx.has_changed().is_ok() => rx.clone(),
                _ => {
                    let (tx, rx) = watch::channel(None);
                    *inflight = Some(rx.clone());
                    self.inner.refreshes.fetch_add(1, Ordering::SeqCst);

                    let inner = self.inner.clone();
                    let ctx = ctx.clone();
                    tokio::spawn(async move { inner.refresh(ctx, tx).await });
                    rx
                }
            }
        };

        let wait = async {
            let outcome = rx.wait_for(|v| v.is_some()).await?;
            Ok::<_, watch::error::RecvError>((*outcome).clone())
        };
        let outcome = match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, wait).await.map_err(|_| {
                Error::timeout("timed out waiting for session refresh")
                    .with_context("timeout", format!("{timeout:?}"))
            })?,
            None => wait.await,
        };

        match outcome {
            Ok(Some(Ok(cred))) => Ok(cred),
            Ok(Some(Err(err))) => Err(Error::from_shared(err)),
            Ok(None) | Err(_) => Err(Error::unexpected(
                "session refresh finished without reporting an outcome",
            )),
        }
    }

    /// Return the cached credential if it is still valid, without refreshing.
    pub fn cached(&self) -> Option<C> {
        let session = self.inner.session.read().expect("lock poisoned");
        session.as_ref().filter(|s| s.is_valid()).cloned()
    }

    /// Drop the cached credential so the next `get` re-authenticates.
    ///
    /// A refresh already in flight is not affected.
    pub fn invalidate(&self) {
        let mut session = self.inner.session.write().expect("lock poisoned");
        if session.take().is_some() {
            log::debug!("session invalidated");
        }
    }

    /// Number of refreshes started so far.
    pub fn refresh_count(&self) -> usize {
        self.inner.refreshes.load(Ordering::SeqCst)
    }
}

impl<C: SigningCredential> Inner<C> {
    async fn refresh(self: Arc<Self>, ctx: Context, tx: watch::Sender<Option<Outcome<C>>>) {
        log::debug!("refreshing session via {:?}", self.provider);

        let outcome = match self.provider.provide_credential(&ctx).await {
            Ok(Some(cred)) if cred.is_valid() => Ok(cred),
            Ok(Some(_)) => {
                log::warn!("session refresh returned an already expired credential");
                Err(Arc::new(Error::credential_expired(
                    "credential provider returned an expired credential",
                )))
            }
            Ok(None) => Err(Arc::new(Error::credential_invalid(
                "credential provider returned no credential",
            ))),
            Err(err) => {
                log::warn!("session refresh failed: {err}");
                Err(Arc::new(err))
            }
        };

        {
            let mut inflight = self.inflight.lock().expect("lock poisoned");
            if let Ok(cred) = &outcome {
                *self.session.write().expect("lock poisoned") = Some(cred.clone());
            }
            *inflight = None;
        }

        tx.send_replace(Some(outcome));
    }
}
