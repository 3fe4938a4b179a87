//! Projects

use super::{api_data, api_list, cli_list, decode, CliArgs, Enveloped};
use crate::client::Client;
use crate::descriptor::{OrganizationDescriptor, ProjectDescriptor};
use crate::dispatch::{Operation, RequestOptions};
use crate::error::Result;
use crate::models::Project;
use crate::transport::ApiRequest;

pub struct Projects<'a> {
    client: &'a Client,
    options: RequestOptions,
}

impl<'a> Projects<'a> {
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

    /// Projects visible to the credential, optionally within one organization
    pub async fn list(&self, organization: Option<&OrganizationDescriptor>) -> Result<Enveloped<Vec<Project>>> {
        let session = self.client.session().await?;
        let session = &session;
        let organization_id = organization.map(|o| o.organization_id.as_str());

        let op = Operation::new("projects.list")
            .api(move || async move {
                let request = ApiRequest::get("/projects").query_opt("organizationId", organization_id);
                api_list(session.api.request(request).await?)
            })
            .cli(move || async move {
                let args = CliArgs::new(&["projects"])
                    .flag_opt("--organization-id", organization_id)
                    .into_vec();
                cli_list(session.cli.run(&args).await?, "projects")
            })
            .options(self.options.clone());

        self.client.dispatch(op).await
    }

    pub async fn info(&self, descriptor: &ProjectDescriptor) -> Result<Project> {
        let session = self.client.session().await?;
        let session = &session;
        let project_id = descriptor.project_id.as_str();

        let op = Operation::new("projects.info")
            .api(move || async move {
                let path = format!("/projects/{}", project_id);
                api_data(session.api.request(ApiRequest::get(path)).await?)
            })
            .cli(move || async move {
                let args = CliArgs::new(&["project", "load", project_id]).into_vec();
                decode(session.cli.run(&args).await?)
            })
            .cache_key(format!("project:{}", project_id))
            .options(self.options.clone());

        self.client.dispatch(op).await
    }
}
