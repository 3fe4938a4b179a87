//! Client
//!
//! Entry point of the library. Holds the configuration, the credential and
//! the dispatcher shared by every endpoint.

use crate::cache::ResponseCache;
use crate::config::Config;
use crate::descriptor::{self, Revisioned};
use crate::dispatch::{AnalyticsCallback, Dispatcher, Operation, RequestOptions, TransportEvent};
use crate::endpoints::{
    Activities, Branches, Comments, Commits, Files, Layers, Organizations, Pages, Previews, Projects,
};
use crate::error::{Error, Result};
use crate::transport::{ApiTransport, CliTransport, Credential, Session, TransportId};
use std::path::PathBuf;
use std::sync::Arc;

/// Main client
#[derive(Debug, Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

#[derive(Debug)]
struct ClientInner {
    config: Config,
    credential: Option<Credential>,
    http: reqwest::Client,
    dispatcher: Dispatcher,
}

impl Client {
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// Client with `config` authenticating with `credential`
    pub fn new(config: Config, credential: impl Into<Credential>) -> Result<Self> {
        Self::builder().config(config).credential(credential).build()
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub fn cache(&self) -> &ResponseCache {
        self.inner.dispatcher.cache()
    }

    /// Resolve the credential and bind both transports to it
    pub async fn session(&self) -> Result<Session> {
        let config = &self.inner.config;
        let credential = match &self.inner.credential {
            Some(credential) => Some(credential.resolve(&config.share_url).await?),
            None => None,
        };

        Ok(Session {
            api: ApiTransport::new(
                self.inner.http.clone(),
                &config.api_url,
                &config.previews_url,
                credential.clone(),
            ),
            cli: CliTransport::new(&config.cli_path, &config.api_url, credential),
        })
    }

    /// Run an operation through the dispatcher
    pub async fn dispatch<T>(&self, operation: Operation<'_, T>) -> Result<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.inner.dispatcher.dispatch(operation).await
    }

    /// Pin a descriptor carrying `latest` to the head commit of its scope
    pub async fn resolve_descriptor<D: Revisioned>(&self, descriptor: D) -> Result<D> {
        self.resolve_descriptor_with(descriptor, &RequestOptions::default())
            .await
    }

    /// [`Client::resolve_descriptor`] with the lookup dispatched under `options`
    pub async fn resolve_descriptor_with<D: Revisioned>(
        &self,
        descriptor: D,
        options: &RequestOptions,
    ) -> Result<D> {
        if !descriptor.revision().is_latest() {
            return Ok(descriptor);
        }
        let session = self.session().await?;
        self.resolve_descriptor_in(descriptor, options, &session).await
    }

    /// Resolve `descriptor` with the credential already bound to `session`
    ///
    /// Endpoints use this so the lookup and the call that follows share one
    /// resolved credential.
    pub async fn resolve_descriptor_in<D: Revisioned>(
        &self,
        descriptor: D,
        options: &RequestOptions,
        session: &Session,
    ) -> Result<D> {
        descriptor::resolve_with(descriptor, |query| async move {
            let commits = self
                .commits()
                .with_options(options.clone())
                .list_in(session, &query)
                .await?;
            Ok(commits.value.into_iter().map(|commit| commit.sha).collect())
        })
        .await
    }

    pub fn organizations(&self) -> Organizations<'_> {
        Organizations::new(self)
    }

    pub fn projects(&self) -> Projects<'_> {
        Projects::new(self)
    }

    pub fn branches(&self) -> Branches<'_> {
        Branches::new(self)
    }

    pub fn commits(&self) -> Commits<'_> {
        Commits::new(self)
    }

    pub fn files(&self) -> Files<'_> {
        Files::new(self)
    }

    pub fn pages(&self) -> Pages<'_> {
        Pages::new(self)
    }

    pub fn layers(&self) -> Layers<'_> {
        Layers::new(self)
    }

    pub fn previews(&self) -> Previews<'_> {
        Previews::new(self)
    }

    pub fn comments(&self) -> Comments<'_> {
        Comments::new(self)
    }

    pub fn activities(&self) -> Activities<'_> {
        Activities::new(self)
    }
}

/// Builder for [`Client`]
#[derive(Default)]
pub struct ClientBuilder {
    config: Config,
    credential: Option<Credential>,
    analytics: Option<AnalyticsCallback>,
    http: Option<reqwest::Client>,
}

impl ClientBuilder {
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn credential(mut self, credential: impl Into<Credential>) -> Self {
        self.credential = Some(credential.into());
        self
    }

    pub fn access_token(self, token: impl Into<String>) -> Self {
        self.credential(Credential::Token(token.into()))
    }

    pub fn transports(mut self, transports: impl IntoIterator<Item = TransportId>) -> Self {
        self.config.transports = transports.into_iter().collect();
        self
    }

    pub fn api_url(mut self, api_url: impl Into<String>) -> Self {
        self.config.api_url = api_url.into();
        self
    }

    pub fn previews_url(mut self, previews_url: impl Into<String>) -> Self {
        self.config.previews_url = previews_url.into();
        self
    }

    pub fn cli_path(mut self, cli_path: impl Into<PathBuf>) -> Self {
        self.config.cli_path = cli_path.into();
        self
    }

    pub fn max_cache_size(mut self, max_cache_size: usize) -> Self {
        self.config.max_cache_size = max_cache_size;
        self
    }

    /// Called once per successful call with the winning transport
    pub fn analytics_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(&TransportEvent) + Send + Sync + 'static,
    {
        self.analytics = Some(Arc::new(callback));
        self
    }

    /// Use an existing HTTP client instead of building one
    pub fn http_client(mut self, http: reqwest::Client) -> Self {
        self.http = Some(http);
        self
    }

    pub fn build(self) -> Result<Client> {
        for (name, value) in [
            ("api_url", &self.config.api_url),
            ("previews_url", &self.config.previews_url),
            ("share_url", &self.config.share_url),
        ] {
            url::Url::parse(value).map_err(|e| Error::Config(format!("{} {:?}: {}", name, value, e)))?;
        }

        let http = match self.http {
            Some(http) => http,
            None => ApiTransport::http_client()
                .map_err(|e| Error::Config(format!("failed to create HTTP client: {}", e)))?,
        };

        let dispatcher = Dispatcher::new(
            self.config.transports.clone(),
            ResponseCache::new(self.config.max_cache_size),
            self.analytics,
        );

        Ok(Client {
            inner: Arc::new(ClientInner {
                config: self.config,
                credential: self.credential,
                http,
                dispatcher,
            }),
        })
    }
}
