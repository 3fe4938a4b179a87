//! Credential resolution
//!
//! A client is configured with an access token, a share reference, or a
//! callback producing either. Each call resolves it once into a
//! [`ResolvedCredential`] that the transports put on the wire.

use crate::error::{Error, Result};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Prefix of share links handed out by the web app
pub const DEFAULT_SHARE_URL: &str = "https://share.goabstract.com/";

type CredentialCallback = Arc<dyn Fn() -> BoxFuture<'static, anyhow::Result<Credential>> + Send + Sync>;

/// Configured credential
#[derive(Clone)]
pub enum Credential {
    /// Opaque bearer token
    Token(String),
    /// Share link or share id
    Share(ShareReference),
    /// Produces a token or share reference on demand
    Callback(CredentialCallback),
}

impl Credential {
    pub fn token(token: impl Into<String>) -> Self {
        Self::Token(token.into())
    }

    pub fn share_url(url: impl Into<String>) -> Self {
        Self::Share(ShareReference::from_url(url))
    }

    pub fn share_id(share_id: impl Into<String>) -> Self {
        Self::Share(ShareReference::from_id(share_id))
    }

    /// Credential computed by an async callback on every call
    pub fn from_fn<F, Fut>(f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Credential>> + Send + 'static,
    {
        Self::Callback(Arc::new(move || f().boxed()))
    }

    /// Credential computed by a synchronous callback on every call
    pub fn from_sync_fn<F>(f: F) -> Self
    where
        F: Fn() -> anyhow::Result<Credential> + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        Self::Callback(Arc::new(move || {
            let f = Arc::clone(&f);
            async move { f() }.boxed()
        }))
    }

    /// Resolve into a wire-ready credential
    ///
    /// Callbacks are invoked once and must yield a token or share reference.
    pub async fn resolve(&self, share_prefix: &str) -> Result<ResolvedCredential> {
        let credential = match self {
            Self::Callback(callback) => {
                callback()
                    .await
                    .map_err(|e| Error::CredentialUnavailable(e.to_string()))?
            },
            other => other.clone(),
        };

        match credential {
            Self::Token(token) => Ok(ResolvedCredential::Token(token)),
            Self::Share(share) => share.resolve(share_prefix).map(ResolvedCredential::ShareId),
            Self::Callback(_) => Err(Error::CredentialUnavailable(
                "credential callback returned another callback".to_string(),
            )),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Token(_) => f.write_str("Credential::Token(<redacted>)"),
            Self::Share(share) => f.debug_tuple("Credential::Share").field(share).finish(),
            Self::Callback(_) => f.write_str("Credential::Callback"),
        }
    }
}

impl From<&str> for Credential {
    fn from(token: &str) -> Self {
        Self::token(token)
    }
}

impl From<ShareReference> for Credential {
    fn from(share: ShareReference) -> Self {
        Self::Share(share)
    }
}

/// A share link or bare share id; exactly one must be set
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShareReference {
    pub url: Option<String>,
    pub share_id: Option<String>,
}

impl ShareReference {
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            share_id: None,
        }
    }

    pub fn from_id(share_id: impl Into<String>) -> Self {
        Self {
            url: None,
            share_id: Some(share_id.into()),
        }
    }

    /// Normalize to a bare share id
    pub fn resolve(&self, share_prefix: &str) -> Result<String> {
        let id = match (&self.url, &self.share_id) {
            (Some(url), None) => share_id_from_url(url, share_prefix),
            (None, Some(id)) => Some(id.trim().to_string()),
            _ => None,
        };

        match id {
            Some(id) if !id.is_empty() => Ok(id),
            _ => Err(Error::ShareIdUnresolvable),
        }
    }
}

/// Strip the share prefix and anything after the id segment
fn share_id_from_url(url: &str, share_prefix: &str) -> Option<String> {
    let prefix = share_prefix.trim_end_matches('/');
    let rest = url.trim().strip_prefix(prefix)?;
    let rest = rest.strip_prefix('/')?;
    let id = rest.split(['/', '?', '#']).next().unwrap_or_default();
    Some(id.to_string())
}

/// Credential in the form the transports send it
#[derive(Clone, PartialEq, Eq)]
pub enum ResolvedCredential {
    Token(String),
    ShareId(String),
}

impl ResolvedCredential {
    pub fn token(&self) -> Option<&str> {
        match self {
            Self::Token(token) => Some(token),
            Self::ShareId(_) => None,
        }
    }
}

impl fmt::Debug for ResolvedCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Token(_) => f.write_str("Token(<redacted>)"),
            Self::ShareId(id) => f.debug_tuple("ShareId").field(id).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_share_url_is_stripped_to_id() {
        let share = ShareReference::from_url("https://share.goabstract.com/4f6c3b2a-aa/");
        assert_eq!(share.resolve(DEFAULT_SHARE_URL).unwrap(), "4f6c3b2a-aa");

        let share = ShareReference::from_url("https://share.goabstract.com/abc?mode=inspect");
        assert_eq!(share.resolve(DEFAULT_SHARE_URL).unwrap(), "abc");
    }

    #[test]
    fn test_share_reference_needs_exactly_one_source() {
        assert!(matches!(
            ShareReference::default().resolve(DEFAULT_SHARE_URL),
            Err(Error::ShareIdUnresolvable)
        ));

        let both = ShareReference {
            url: Some("https://share.goabstract.com/abc".to_string()),
            share_id: Some("abc".to_string()),
        };
        assert!(matches!(both.resolve(DEFAULT_SHARE_URL), Err(Error::ShareIdUnresolvable)));
    }

    #[test]
    fn test_foreign_url_is_unresolvable() {
        let share = ShareReference::from_url("https://example.com/abc");
        assert!(matches!(share.resolve(DEFAULT_SHARE_URL), Err(Error::ShareIdUnresolvable)));

        let share = ShareReference::from_url("https://share.goabstract.com/");
        assert!(matches!(share.resolve(DEFAULT_SHARE_URL), Err(Error::ShareIdUnresolvable)));
    }

    #[tokio::test]
    async fn test_callback_credential() {
        let credential = Credential::from_fn(|| async { Ok(Credential::token("from-callback")) });
        let resolved = credential.resolve(DEFAULT_SHARE_URL).await.unwrap();
        assert_eq!(resolved, ResolvedCredential::Token("from-callback".to_string()));

        let credential = Credential::from_sync_fn(|| Ok(Credential::share_id("abc")));
        let resolved = credential.resolve(DEFAULT_SHARE_URL).await.unwrap();
        assert_eq!(resolved, ResolvedCredential::ShareId("abc".to_string()));
    }

    #[tokio::test]
    async fn test_failing_callback() {
        let credential = Credential::from_sync_fn(|| Err(anyhow::anyhow!("keychain locked")));
        let err = credential.resolve(DEFAULT_SHARE_URL).await.unwrap_err();
        assert!(matches!(err, Error::CredentialUnavailable(msg) if msg.contains("keychain")));
    }
}
