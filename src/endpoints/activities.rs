//! Activities

use super::{api_page, page_window};
use crate::client::Client;
use crate::cursor::{Cursor, CursorState};
use crate::dispatch::{Operation, RequestOptions};
use crate::models::Activity;
use crate::transport::ApiRequest;

pub const DEFAULT_PAGE_SIZE: u64 = 50;

/// Scope of an activity feed; at least one id should be set
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivityQuery {
    pub organization_id: Option<String>,
    pub project_id: Option<String>,
    pub branch_id: Option<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

pub struct Activities<'a> {
    client: &'a Client,
    options: RequestOptions,
}

impl<'a> Activities<'a> {
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

    pub fn list(&self, query: ActivityQuery) -> Cursor<Vec<Activity>> {
        let client = self.client.clone();
        let options = self.options.clone().disable_cache();

        Cursor::new(move |state: Option<CursorState>| {
            let client = client.clone();
            let options = options.clone();
            let query = query.clone();

            async move {
                let (offset, limit) = page_window(
                    state,
                    query.offset.unwrap_or(0),
                    query.limit.unwrap_or(DEFAULT_PAGE_SIZE),
                );
                let request = ApiRequest::get("/activities")
                    .query_opt("organizationId", query.organization_id.as_deref())
                    .query_opt("projectId", query.project_id.as_deref())
                    .query_opt("branchId", query.branch_id.as_deref())
                    .query("limit", limit)
                    .query("offset", offset);

                let session = client.session().await?;
                let session = &session;

                let op = Operation::new("activities.list")
                    .api(move || async move { api_page(session.api.request(request).await?) })
                    .options(options);

                client.dispatch(op).await
            }
        })
    }
}
