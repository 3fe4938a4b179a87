//! Request descriptors
//!
//! Descriptors identify a resource. Those pinned to a revision may carry
//! [`Revision::Latest`], which must be resolved to a concrete sha before a
//! call is dispatched.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;

pub const LATEST: &str = "latest";

/// A commit sha or the symbolic head of a branch
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Revision {
    #[default]
    Latest,
    Sha(String),
}

impl Revision {
    pub fn is_latest(&self) -> bool {
        matches!(self, Self::Latest)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Latest => LATEST,
            Self::Sha(sha) => sha,
        }
    }
}

impl From<String> for Revision {
    fn from(value: String) -> Self {
        if value == LATEST {
            Self::Latest
        } else {
            Self::Sha(value)
        }
    }
}

impl From<&str> for Revision {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<Revision> for String {
    fn from(value: Revision) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationDescriptor {
    pub organization_id: String,
}

impl OrganizationDescriptor {
    pub fn new(organization_id: impl Into<String>) -> Self {
        Self {
            organization_id: organization_id.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDescriptor {
    pub project_id: String,
}

impl ProjectDescriptor {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchDescriptor {
    pub project_id: String,
    pub branch_id: String,
}

impl BranchDescriptor {
    pub fn new(project_id: impl Into<String>, branch_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            branch_id: branch_id.into(),
        }
    }

    pub fn commit(&self, sha: impl Into<Revision>) -> CommitDescriptor {
        CommitDescriptor {
            project_id: self.project_id.clone(),
            branch_id: self.branch_id.clone(),
            sha: sha.into(),
        }
    }

    pub fn file(&self, file_id: impl Into<String>) -> FileDescriptor {
        FileDescriptor {
            project_id: self.project_id.clone(),
            branch_id: self.branch_id.clone(),
            file_id: file_id.into(),
            sha: Revision::Latest,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitDescriptor {
    pub project_id: String,
    pub branch_id: String,
    pub sha: Revision,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDescriptor {
    pub project_id: String,
    pub branch_id: String,
    pub file_id: String,
    pub sha: Revision,
}

impl FileDescriptor {
    /// Descriptor of a file at the head of its branch
    pub fn new(
        project_id: impl Into<String>,
        branch_id: impl Into<String>,
        file_id: impl Into<String>,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            branch_id: branch_id.into(),
            file_id: file_id.into(),
            sha: Revision::Latest,
        }
    }

    /// Pin to a revision
    pub fn at(mut self, sha: impl Into<Revision>) -> Self {
        self.sha = sha.into();
        self
    }

    pub fn page(&self, page_id: impl Into<String>) -> PageDescriptor {
        PageDescriptor {
            project_id: self.project_id.clone(),
            branch_id: self.branch_id.clone(),
            file_id: self.file_id.clone(),
            page_id: page_id.into(),
            sha: self.sha.clone(),
        }
    }

    pub fn branch(&self) -> BranchDescriptor {
        BranchDescriptor::new(&self.project_id, &self.branch_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageDescriptor {
    pub project_id: String,
    pub branch_id: String,
    pub file_id: String,
    pub page_id: String,
    pub sha: Revision,
}

impl PageDescriptor {
    pub fn layer(&self, layer_id: impl Into<String>) -> LayerDescriptor {
        LayerDescriptor {
            project_id: self.project_id.clone(),
            branch_id: self.branch_id.clone(),
            file_id: self.file_id.clone(),
            page_id: self.page_id.clone(),
            layer_id: layer_id.into(),
            sha: self.sha.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerDescriptor {
    pub project_id: String,
    pub branch_id: String,
    pub file_id: String,
    pub page_id: String,
    pub layer_id: String,
    pub sha: Revision,
}

impl LayerDescriptor {
    pub fn at(mut self, sha: impl Into<Revision>) -> Self {
        self.sha = sha.into();
        self
    }
}

/// Scope of a commit listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitQuery {
    pub project_id: String,
    pub branch_id: String,
    pub file_id: Option<String>,
    pub layer_id: Option<String>,
    pub limit: Option<u32>,
}

impl CommitQuery {
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}

impl From<&BranchDescriptor> for CommitQuery {
    fn from(descriptor: &BranchDescriptor) -> Self {
        Self {
            project_id: descriptor.project_id.clone(),
            branch_id: descriptor.branch_id.clone(),
            ..Self::default()
        }
    }
}

impl From<&FileDescriptor> for CommitQuery {
    fn from(descriptor: &FileDescriptor) -> Self {
        Self {
            project_id: descriptor.project_id.clone(),
            branch_id: descriptor.branch_id.clone(),
            file_id: Some(descriptor.file_id.clone()),
            ..Self::default()
        }
    }
}

impl From<&LayerDescriptor> for CommitQuery {
    fn from(descriptor: &LayerDescriptor) -> Self {
        Self {
            project_id: descriptor.project_id.clone(),
            branch_id: descriptor.branch_id.clone(),
            file_id: Some(descriptor.file_id.clone()),
            layer_id: Some(descriptor.layer_id.clone()),
            limit: None,
        }
    }
}

/// Descriptors pinned to a revision
pub trait Revisioned: Clone {
    fn revision(&self) -> &Revision;

    /// Copy of this descriptor pinned to `sha`
    fn with_sha(&self, sha: String) -> Self;

    /// Commits that can stand in for this descriptor's head
    fn commit_query(&self) -> CommitQuery;
}

impl Revisioned for CommitDescriptor {
    fn revision(&self) -> &Revision {
        &self.sha
    }

    fn with_sha(&self, sha: String) -> Self {
        Self {
            sha: Revision::Sha(sha),
            ..self.clone()
        }
    }

    fn commit_query(&self) -> CommitQuery {
        CommitQuery {
            project_id: self.project_id.clone(),
            branch_id: self.branch_id.clone(),
            ..CommitQuery::default()
        }
    }
}

impl Revisioned for FileDescriptor {
    fn revision(&self) -> &Revision {
        &self.sha
    }

    fn with_sha(&self, sha: String) -> Self {
        self.clone().at(sha)
    }

    fn commit_query(&self) -> CommitQuery {
        CommitQuery::from(self)
    }
}

impl Revisioned for PageDescriptor {
    fn revision(&self) -> &Revision {
        &self.sha
    }

    fn with_sha(&self, sha: String) -> Self {
        Self {
            sha: Revision::Sha(sha),
            ..self.clone()
        }
    }

    fn commit_query(&self) -> CommitQuery {
        CommitQuery {
            project_id: self.project_id.clone(),
            branch_id: self.branch_id.clone(),
            file_id: Some(self.file_id.clone()),
            ..CommitQuery::default()
        }
    }
}

impl Revisioned for LayerDescriptor {
    fn revision(&self) -> &Revision {
        &self.sha
    }

    fn with_sha(&self, sha: String) -> Self {
        self.clone().at(sha)
    }

    fn commit_query(&self) -> CommitQuery {
        CommitQuery::from(self)
    }
}

/// Pin `descriptor` to a concrete sha
///
/// Concrete descriptors come back unchanged without calling
/// `list_revisions`. Otherwise `list_revisions` is called once with a
/// limit-1 query and the first sha it returns is substituted. Nothing is
/// memoized here; resolve once and reuse the result for derived calls.
pub async fn resolve_with<D, F, Fut>(descriptor: D, list_revisions: F) -> Result<D>
where
    D: Revisioned,
    F: FnOnce(CommitQuery) -> Fut,
    Fut: Future<Output = Result<Vec<String>>>,
{
    if !descriptor.revision().is_latest() {
        return Ok(descriptor);
    }

    let query = descriptor.commit_query().limit(1);
    let project_id = query.project_id.clone();
    let branch_id = query.branch_id.clone();

    let revisions = list_revisions(query).await?;
    match revisions.into_iter().next() {
        Some(sha) => {
            tracing::debug!("Resolved latest on {}/{} to {}", project_id, branch_id, sha);
            Ok(descriptor.with_sha(sha))
        },
        None => Err(Error::RevisionResolutionFailed {
            project_id,
            branch_id,
        }),
    }
}
