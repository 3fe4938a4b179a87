//! Layer previews
//!
//! Binary downloads from the previews service. Only the API serves them.

use crate::client::Client;
use crate::descriptor::LayerDescriptor;
use crate::dispatch::{Operation, RequestOptions};
use crate::error::Result;
use crate::transport::Progress;

pub struct Previews<'a> {
    client: &'a Client,
    options: RequestOptions,
}

impl<'a> Previews<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self {
            client,
            options: RequestOptions::default(),
        }
    }

    pub fn with_options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }

    /// PNG bytes of a layer preview
    ///
    /// `progress` receives cumulative bytes and the advertised total as
    /// chunks arrive.
    pub async fn raw(&self, descriptor: &LayerDescriptor, progress: Option<Progress<'_>>) -> Result<Vec<u8>> {
        let session = self.client.session().await?;
        let session = &session;
        let descriptor = self
            .client
            .resolve_descriptor_in(descriptor.clone(), &self.options, session)
            .await?;
        let path = format!(
            "/projects/{}/commits/{}/files/{}/layers/{}",
            descriptor.project_id, descriptor.sha, descriptor.file_id, descriptor.layer_id
        );
        let path = path.as_str();

        let op = Operation::new("previews.raw")
            .api(move || async move { session.api.download(path, progress).await })
            .options(self.options.clone());

        self.client.dispatch(op).await
    }
}
