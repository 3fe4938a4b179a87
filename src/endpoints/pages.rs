//! Pages
//!
//! Only the API serves pages.

use super::{api_data, api_list, Enveloped};
use crate::client::Client;
use crate::descriptor::{FileDescriptor, PageDescriptor};
use crate::dispatch::{Operation, RequestOptions};
use crate::error::Result;
use crate::models::Page;
use crate::transport::ApiRequest;

pub struct Pages<'a> {
    client: &'a Client,
    options: RequestOptions,
}

impl<'a> Pages<'a> {
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

    pub async fn list(&self, descriptor: &FileDescriptor) -> Result<Enveloped<Vec<Page>>> {
        let session = self.client.session().await?;
        let session = &session;
        let descriptor = self
            .client
            .resolve_descriptor_in(descriptor.clone(), &self.options, session)
            .await?;
        let descriptor = &descriptor;

        let op = Operation::new("pages.list")
            .api(move || async move {
                let path = format!(
                    "/projects/{}/branches/{}/files/{}/pages",
                    descriptor.project_id, descriptor.branch_id, descriptor.file_id
                );
                let request = ApiRequest::get(path).query("sha", &descriptor.sha);
                api_list(session.api.request(request).await?)
            })
            .options(self.options.clone());

        self.client.dispatch(op).await
    }

    pub async fn info(&self, descriptor: &PageDescriptor) -> Result<Page> {
        let latest = descriptor.sha.is_latest();
        let session = self.client.session().await?;
        let session = &session;
        let descriptor = self
            .client
            .resolve_descriptor_in(descriptor.clone(), &self.options, session)
            .await?;
        let descriptor = &descriptor;

        let op = Operation::new("pages.info")
            .api(move || async move {
                let path = format!(
                    "/projects/{}/branches/{}/files/{}/pages/{}",
                    descriptor.project_id, descriptor.branch_id, descriptor.file_id, descriptor.page_id
                );
                let request = ApiRequest::get(path).query("sha", &descriptor.sha);
                api_data(session.api.request(request).await?)
            })
            .cache_key(format!(
                "page:{}:{}:{}:{}",
                descriptor.project_id, descriptor.file_id, descriptor.page_id, descriptor.sha
            ))
            .options(self.options.clone().disable_cache_if(latest));

        self.client.dispatch(op).await
    }
}
