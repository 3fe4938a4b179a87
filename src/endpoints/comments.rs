//! Comments
//!
//! Listing is paginated and never cached. Only the API serves comments.

use super::{api_data, api_page, page_window};
use crate::client::Client;
use crate::cursor::{Cursor, CursorState};
use crate::descriptor::BranchDescriptor;
use crate::dispatch::{Operation, RequestOptions};
use crate::error::Result;
use crate::models::{Comment, NewComment};
use crate::transport::ApiRequest;
use serde_json::json;

pub const DEFAULT_PAGE_SIZE: u64 = 25;

/// What to list comments for
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentQuery {
    pub project_id: String,
    pub branch_id: Option<String>,
    pub commit_sha: Option<String>,
    pub page_id: Option<String>,
    pub layer_id: Option<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl From<&BranchDescriptor> for CommentQuery {
    fn from(descriptor: &BranchDescriptor) -> Self {
        Self {
            project_id: descriptor.project_id.clone(),
            branch_id: Some(descriptor.branch_id.clone()),
            ..Self::default()
        }
    }
}

pub struct Comments<'a> {
    client: &'a Client,
    options: RequestOptions,
}

impl<'a> Comments<'a> {
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

    pub fn list(&self, query: CommentQuery) -> Cursor<Vec<Comment>> {
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
                let request = ApiRequest::get("/comments")
                    .query("projectId", &query.project_id)
                    .query_opt("branchId", query.branch_id.as_deref())
                    .query_opt("commitSha", query.commit_sha.as_deref())
                    .query_opt("pageId", query.page_id.as_deref())
                    .query_opt("layerId", query.layer_id.as_deref())
                    .query("limit", limit)
                    .query("offset", offset);

                let session = client.session().await?;
                let session = &session;

                let op = Operation::new("comments.list")
                    .api(move || async move { api_page(session.api.request(request).await?) })
                    .options(options);

                client.dispatch(op).await
            }
        })
    }

    pub async fn create(&self, branch: &BranchDescriptor, comment: &NewComment) -> Result<Comment> {
        let session = self.client.session().await?;
        let session = &session;

        let mut body = json!({
            "projectId": branch.project_id,
            "branchId": branch.branch_id,
            "body": comment.body,
        });
        if let Some(annotation) = &comment.annotation {
            body["annotation"] = annotation.clone();
        }

        let op = Operation::new("comments.create")
            .api(move || async move { api_data(session.api.request(ApiRequest::post("/comments", body)).await?) })
            .options(self.options.clone().disable_cache());

        self.client.dispatch(op).await
    }
}
