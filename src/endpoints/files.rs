//! Files

use super::{api_data, api_list, cli_list, decode, CliArgs, Enveloped};
use crate::client::Client;
use crate::descriptor::{CommitDescriptor, FileDescriptor};
use crate::dispatch::{Operation, RequestOptions};
use crate::error::Result;
use crate::models::File;
use crate::transport::ApiRequest;

pub struct Files<'a> {
    client: &'a Client,
    options: RequestOptions,
}

impl<'a> Files<'a> {
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

    /// Files of a branch at a commit
    pub async fn list(&self, descriptor: &CommitDescriptor) -> Result<Enveloped<Vec<File>>> {
        let session = self.client.session().await?;
        let session = &session;
        let descriptor = self
            .client
            .resolve_descriptor_in(descriptor.clone(), &self.options, session)
            .await?;
        let project_id = descriptor.project_id.as_str();
        let branch_id = descriptor.branch_id.as_str();
        let sha = descriptor.sha.as_str();

        let op = Operation::new("files.list")
            .api(move || async move {
                let path = format!("/projects/{}/branches/{}/files", project_id, branch_id);
                let request = ApiRequest::get(path).query("sha", sha);
                api_list(session.api.request(request).await?)
            })
            .cli(move || async move {
                let args = CliArgs::new(&["files", project_id, branch_id])
                    .flag("--sha", sha)
                    .into_vec();
                cli_list(session.cli.run(&args).await?, "files")
            })
            .options(self.options.clone());

        self.client.dispatch(op).await
    }

    pub async fn info(&self, descriptor: &FileDescriptor) -> Result<File> {
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
        let sha = descriptor.sha.as_str();

        let op = Operation::new("files.info")
            .api(move || async move {
                let path = format!("/projects/{}/branches/{}/files/{}", project_id, branch_id, file_id);
                api_data(session.api.request(ApiRequest::get(path).query("sha", sha)).await?)
            })
            .cli(move || async move {
                let args = CliArgs::new(&["file", "load", project_id, branch_id, file_id])
                    .flag("--sha", sha)
                    .into_vec();
                decode(session.cli.run(&args).await?)
            })
            .cache_key(format!("file:{}:{}:{}", project_id, file_id, sha))
            .options(self.options.clone().disable_cache_if(latest));

        self.client.dispatch(op).await
    }
}
