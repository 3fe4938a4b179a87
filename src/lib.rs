//! Abstract SDK
//!
//! One API over two interchangeable backends: the Abstract HTTP API and the
//! local `abstract-cli` executable. Each call is dispatched to the
//! configured transports in order; the first success wins and, if all
//! fail, the per-transport errors come back together.
//!
//! # Module Structure
//!
//! - [`client`] - [`Client`] and its builder
//! - [`dispatch`] - operations, request options and the dispatcher
//! - [`transport`] - credentials, the API transport and the CLI transport
//! - [`cache`] - bounded response cache for single-entity reads
//! - [`cursor`] - chained pagination
//! - [`descriptor`] - resource descriptors and `latest` resolution
//! - [`endpoints`] - projects, branches, commits, files, layers, comments...
//!
//! # Example
//!
//! ```no_run
//! use abstract_sdk::{Client, ProjectDescriptor, TransportId};
//!
//! async fn example() -> abstract_sdk::Result<()> {
//!     let client = Client::builder()
//!         .access_token("token")
//!         .transports([TransportId::Cli, TransportId::Api])
//!         .build()?;
//!     let project = client.projects().info(&ProjectDescriptor::new("project-id")).await?;
//!     println!("{}", project.name);
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod client;
pub mod config;
pub mod cursor;
pub mod descriptor;
pub mod dispatch;
pub mod endpoints;
pub mod error;
pub mod models;
pub mod transport;

/// Version reported in the client identification header
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use cache::ResponseCache;
pub use client::{Client, ClientBuilder};
pub use config::Config;
pub use cursor::{Cursor, CursorPhase, CursorState, Page};
pub use descriptor::{
    BranchDescriptor, CommitDescriptor, CommitQuery, FileDescriptor, LayerDescriptor,
    OrganizationDescriptor, PageDescriptor, ProjectDescriptor, Revision, Revisioned,
};
pub use dispatch::{Operation, RequestOptions, TransportEvent};
pub use endpoints::{ActivityQuery, CommentQuery, Enveloped};
pub use error::{AggregatedFailure, Error, ErrorKind, Result, TransportError};
pub use transport::{Credential, ResolvedCredential, Session, ShareReference, TransportId};
