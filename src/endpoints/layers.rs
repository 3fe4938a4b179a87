//! Layers

use super::{api_data, api_list, cli_list, decode, CliArgs, Enveloped};
use crate::client::Client;
use crate::descriptor::{FileDescriptor, LayerDescriptor};
use crate::dispatch::{Operation, RequestOptions};
use crate::error::Result;
use crate::models::{Layer, LayerData};
use crate::transport::ApiRequest;

pub struct Layers<'a> {
    client: &'a Client,
    options: RequestOptions,
}

impl<'a> Layers<'a> {
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

    /// Layers of a file, optionally within one page
    pub async fn list(&self, descriptor: &FileDescriptor, page_id: Option<&str>) -> Result<Enveloped<Vec<Layer>>> {
        let session = self.client.session().await?;
        let session = &session;
        let descriptor = self
            .client
            .resolve_descriptor_in(descriptor.clone(), &self.options, session)
            .await?;
        let project_id = descriptor.project_id.as_str();
        let branch_id = descriptor.branch_id.as_str();
        let file_id = descriptor.file_id.as_str();
        let sha = descriptor.sha.as_str();

        let op = Operation::new("layers.list")
            .api(move || async move {
                let path = format!(
                    "/projects/{}/branches/{}/files/{}/layers",
                    project_id, branch_id, file_id
                );
                let request = ApiRequest::get(path)
                    .query("sha", sha)
                    .query_opt("pageId", page_id);
                api_list(session.api.request(request).await?)
            })
            .cli(move || async move {
                let args = CliArgs::new(&["layers", project_id, branch_id, file_id])
                    .flag("--sha", sha)
                    .flag_opt("--page-id", page_id)
                    .into_vec();
                cli_list(session.cli.run(&args).await?, "layers")
            })
            .options(self.options.clone());

        self.client.dispatch(op).await
    }

    pub async fn info(&self, descriptor: &LayerDescriptor) -> Result<Layer> {
        let latest = descriptor.sha.is_latest();
        let session = self.client.session().await?;
        let session = &session;
        let descriptor = self
            .client
            .resolve_descriptor_in(descriptor.clone(), &self.options, session)
            .await?;
        let project_id = descriptor.project_id.as_str();
        let branch_id = descriptor.branch_id.as_str();
        let file_id = descriptor.file_id.as_str();
        let layer_id = descriptor.layer_id.as_str();
        let sha = descriptor.sha.as_str();

        let op = Operation::new("layers.info")
            .api(move || async move {
                let path = format!(
                    "/projects/{}/branches/{}/files/{}/layers/{}",
                    project_id, branch_id, file_id, layer_id
                );
                api_data(session.api.request(ApiRequest::get(path).query("sha", sha)).await?)
            })
            .cli(move || async move {
                let args = CliArgs::new(&["layer", "meta", project_id, branch_id, file_id, layer_id])
                    .flag("--sha", sha)
                    .into_vec();
                decode(session.cli.run(&args).await?)
            })
            .cache_key(format!("layer:{}:{}:{}:{}", project_id, file_id, layer_id, sha))
            .options(self.options.clone().disable_cache_if(latest));

        self.client.dispatch(op).await
    }

    /// Rendered layer tree with resolved symbols and styles
    pub async fn data(&self, descriptor: &LayerDescriptor) -> Result<LayerData> {
        let latest = descriptor.sha.is_latest();
        let session = self.client.session().await?;
        let session = &session;
        let descriptor = self
            .client
            .resolve_descriptor_in(descriptor.clone(), &self.options, session)
            .await?;
        let project_id = descriptor.project_id.as_str();
        let branch_id = descriptor.branch_id.as_str();
        let file_id = descriptor.file_id.as_str();
        let layer_id = descriptor.layer_id.as_str();
        let sha = descriptor.sha.as_str();

        let op = Operation::new("layers.data")
            .api(move || async move {
                let path = format!(
                    "/projects/{}/commits/{}/files/{}/layers/{}/data",
                    project_id, sha, file_id, layer_id
                );
                api_data(session.api.request(ApiRequest::get(path)).await?)
            })
            .cli(move || async move {
                let args = CliArgs::new(&["layer", "data", project_id, branch_id, file_id, layer_id])
                    .flag("--sha", sha)
                    .into_vec();
                decode(session.cli.run(&args).await?)
            })
            .cache_key(format!("layer-data:{}:{}:{}:{}", project_id, file_id, layer_id, sha))
            .options(self.options.clone().disable_cache_if(latest));

        self.client.dispatch(op).await
    }
}
