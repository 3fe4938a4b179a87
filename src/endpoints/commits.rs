//! Commits
//!
//! `commits.list` doubles as the revision lookup behind
//! [`Client::resolve_descriptor`].

use super::{api_data, api_list, cli_list, decode, CliArgs, Enveloped};
use crate::client::Client;
use crate::descriptor::{CommitDescriptor, CommitQuery};
use crate::dispatch::{Operation, RequestOptions};
use crate::error::Result;
use crate::models::Commit;
use crate::transport::{ApiRequest, Session};

pub struct Commits<'a> {
    client: &'a Client,
    options: RequestOptions,
}

impl<'a> Commits<'a> {
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

    /// Commits of a branch, newest first, optionally narrowed to a file or layer
    pub async fn list(&self, query: &CommitQuery) -> Result<Enveloped<Vec<Commit>>> {
        let session = self.client.session().await?;
        self.list_in(&session, query).await
    }

    /// [`Commits::list`] over an already open session
    pub(crate) async fn list_in(
        &self,
        session: &Session,
        query: &CommitQuery,
    ) -> Result<Enveloped<Vec<Commit>>> {
        let op = Operation::new("commits.list")
            .api(move || async move {
                let path = format!(
                    "/projects/{}/branches/{}/commits",
                    query.project_id, query.branch_id
                );
                let request = ApiRequest::get(path)
                    .query_opt("fileId", query.file_id.as_deref())
                    .query_opt("layerId", query.layer_id.as_deref())
                    .query_opt("limit", query.limit);
                api_list(session.api.request(request).await?)
            })
            .cli(move || async move {
                let args = CliArgs::new(&["commits", query.project_id.as_str(), query.branch_id.as_str()])
                    .flag_opt("--file-id", query.file_id.as_deref())
                    .flag_opt("--layer-id", query.layer_id.as_deref())
                    .flag_opt("--limit", query.limit)
                    .into_vec();
                cli_list(session.cli.run(&args).await?, "commits")
            })
            .options(self.options.clone());

        self.client.dispatch(op).await
    }

    /// A single commit; `latest` resolves to the branch head first
    pub async fn info(&self, descriptor: &CommitDescriptor) -> Result<Commit> {
        let latest = descriptor.sha.is_latest();
        let session = self.client.session().await?;
        let session = &session;
        let descriptor = self
            .client
            .resolve_descriptor_in(descriptor.clone(), &self.options, session)
            .await?;
        let project_id = descriptor.project_id.as_str();
        let sha = descriptor.sha.as_str();

        let op = Operation::new("commits.info")
            .api(move || async move {
                let path = format!("/projects/{}/commits/{}", project_id, sha);
                api_data(session.api.request(ApiRequest::get(path)).await?)
            })
            .cli(move || async move {
                let args = CliArgs::new(&["commit", project_id, sha]).into_vec();
                decode(session.cli.run(&args).await?)
            })
            .cache_key(format!("commit:{}:{}", project_id, sha))
            .options(self.options.clone().disable_cache_if(latest));

        self.client.dispatch(op).await
    }
}
