use crate::{Context, ProvideCredential, Result, SessionCache, SignRequest, SigningCredential};
use std::sync::Arc;
use std::time::Duration;

/// Signer is the main struct used to sign the request.
///
/// Credentials come from a [`SessionCache`], so concurrent `sign` calls
/// against an expired credential share a single refresh.
#[derive(Clone, Debug)]
pub struct Signer<K: SigningCredential> {
    ctx: Context,
    session: SessionCache<K>,
    builder: Arc<dyn SignRequest<Credential = K>>,
}

impl<K: SigningCredential> Signer<K> {
    /// Create a new signer.
    pub fn new(
        ctx: Context,
        loader: impl ProvideCredential<Credential = K>,
        builder: impl SignRequest<Credential = K>,
    ) -> Self {
        Self::with_session(ctx, SessionCache::new(loader), builder)
    }

    /// Create a signer over an existing session cache.
    ///
    /// Use this to share one authenticated session between several signers.
    pub fn with_session(
        ctx: Context,
        session: SessionCache<K>,
        builder: impl SignRequest<Credential = K>,
    ) -> Self {
        Self {
            ctx,
            session,
            builder: Arc::new(builder),
        }
    }

    /// Context used by this signer.
    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// Session cache backing this signer.
    pub fn session(&self) -> &SessionCache<K> {
        &self.session
    }

    /// Current credential, refreshed when expired.
    pub async fn credential(&self) -> Result<K> {
        self.session.get(&self.ctx).await
    }

    /// Drop the cached credential, e.g. after the provider answered 401.
    pub fn invalidate(&self) {
        self.session.invalidate()
    }

    /// Signing request.
    pub async fn sign(
        &self,
        req: &mut http::request::Parts,
        expires_in: Option<Duration>,
    ) -> Result<()> {
        let cred = self.credential().await?;

        self.builder
            .sign_request(&self.ctx, req, Some(&cred), expires_in)
            .await
    }
}
