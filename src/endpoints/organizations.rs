//! Organizations

use super::{api_data, api_list, cli_list, decode, CliArgs, Enveloped};
use crate::client::Client;
use crate::descriptor::OrganizationDescriptor;
use crate::dispatch::{Operation, RequestOptions};
use crate::error::Result;
use crate::models::Organization;
use crate::transport::ApiRequest;

pub struct Organizations<'a> {
    client: &'a Client,
    options: RequestOptions,
}

impl<'a> Organizations<'a> {
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

    pub async fn list(&self) -> Result<Enveloped<Vec<Organization>>> {
        let session = self.client.session().await?;
        let session = &session;

        let op = Operation::new("organizations.list")
            .api(move || async move {
                api_list(session.api.request(ApiRequest::get("/organizations")).await?)
            })
            .cli(move || async move {
                let args = CliArgs::new(&["organizations"]).into_vec();
                cli_list(session.cli.run(&args).await?, "organizations")
            })
            .options(self.options.clone());

        self.client.dispatch(op).await
    }

    pub async fn info(&self, descriptor: &OrganizationDescriptor) -> Result<Organization> {
        let session = self.client.session().await?;
        let session = &session;
        let id = descriptor.organization_id.as_str();

        let op = Operation::new("organizations.info")
            .api(move || async move {
                let path = format!("/organizations/{}", id);
                api_data(session.api.request(ApiRequest::get(path)).await?)
            })
            .cli(move || async move {
                let args = CliArgs::new(&["organization", "load", id]).into_vec();
                decode(session.cli.run(&args).await?)
            })
            .cache_key(format!("organization:{}", id))
            .options(self.options.clone());

        self.client.dispatch(op).await
    }
}
