//! Branches

use super::{api_data, api_list, cli_list, decode, CliArgs, Enveloped};
use crate::client::Client;
use crate::descriptor::{BranchDescriptor, ProjectDescriptor};
use crate::dispatch::{Operation, RequestOptions};
use crate::error::Result;
use crate::models::Branch;
use crate::transport::ApiRequest;

pub struct Branches<'a> {
    client: &'a Client,
    options: RequestOptions,
}

impl<'a> Branches<'a> {
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

    /// Branches of a project; `filter` is `active`, `archived` or `mine`
    pub async fn list(&self, project: &ProjectDescriptor, filter: Option<&str>) -> Result<Enveloped<Vec<Branch>>> {
        let session = self.client.session().await?;
        let session = &session;
        let project_id = project.project_id.as_str();

        let op = Operation::new("branches.list")
            .api(move || async move {
                let request = ApiRequest::get(format!("/projects/{}/branches", project_id))
                    .query_opt("filter", filter);
                api_list(session.api.request(request).await?)
            })
            .cli(move || async move {
                let args = CliArgs::new(&["branches", project_id])
                    .flag_opt("--filter", filter)
                    .into_vec();
                cli_list(session.cli.run(&args).await?, "branches")
            })
            .options(self.options.clone());

        self.client.dispatch(op).await
    }

    pub async fn info(&self, descriptor: &BranchDescriptor) -> Result<Branch> {
        let session = self.client.session().await?;
        let session = &session;
        let project_id = descriptor.project_id.as_str();
        let branch_id = descriptor.branch_id.as_str();

        let op = Operation::new("branches.info")
            .api(move || async move {
                let path = format!("/projects/{}/branches/{}", project_id, branch_id);
                api_data(session.api.request(ApiRequest::get(path)).await?)
            })
            .cli(move || async move {
                let args = CliArgs::new(&["branch", "load", project_id, branch_id]).into_vec();
                decode(session.cli.run(&args).await?)
            })
            .cache_key(format!("branch:{}:{}", project_id, branch_id))
            .options(self.options.clone());

        self.client.dispatch(op).await
    }
}
