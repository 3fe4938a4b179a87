//! Resource endpoints
//!
//! Each endpoint names an operation, supplies an API call and/or a CLI call
//! for it, and picks a cache key for single-entity reads. Everything else is
//! the dispatcher's job.
//!
//! - [`organizations`], [`projects`], [`branches`], [`commits`]
//! - [`files`], [`pages`], [`layers`], [`previews`]
//! - [`comments`], [`activities`] - paginated through [`crate::Cursor`]

pub mod activities;
pub mod branches;
pub mod comments;
pub mod commits;
pub mod files;
pub mod layers;
pub mod organizations;
pub mod pages;
pub mod previews;
pub mod projects;

pub use activities::{ActivityQuery, Activities};
pub use branches::Branches;
pub use comments::{CommentQuery, Comments};
pub use commits::Commits;
pub use files::Files;
pub use layers::Layers;
pub use organizations::Organizations;
pub use pages::Pages;
pub use previews::Previews;
pub use projects::Projects;

use crate::cursor::{CursorState, Page};
use crate::error::TransportError;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::ops::Deref;

/// Decoded value alongside the raw response it came from
#[derive(Debug, Clone, PartialEq)]
pub struct Enveloped<T> {
    pub value: T,
    pub envelope: Value,
}

impl<T> Enveloped<T> {
    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T> Deref for Enveloped<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, TransportError> {
    serde_json::from_value(value).map_err(TransportError::decode)
}

/// Payload of an API `{data, meta}` envelope
fn api_data<T: DeserializeOwned>(response: Value) -> Result<T, TransportError> {
    match response {
        Value::Object(mut map) if map.contains_key("data") => {
            decode(map.remove("data").unwrap_or(Value::Null))
        },
        other => decode(other),
    }
}

fn api_list<T: DeserializeOwned>(response: Value) -> Result<Enveloped<Vec<T>>, TransportError> {
    let value = api_data(response.clone())?;
    Ok(Enveloped {
        value,
        envelope: response,
    })
}

/// CLI lists come back bare or as `{<key>: [...]}`
fn cli_list<T: DeserializeOwned>(response: Value, key: &str) -> Result<Enveloped<Vec<T>>, TransportError> {
    let items = match &response {
        Value::Array(_) => response.clone(),
        other => other.get(key).cloned().unwrap_or(Value::Array(Vec::new())),
    };
    Ok(Enveloped {
        value: decode(items)?,
        envelope: response,
    })
}

/// One page of an API list with `meta` pagination
fn api_page<T: DeserializeOwned>(response: Value) -> Result<Page<Vec<T>>, TransportError> {
    let state: CursorState = match response.get("meta") {
        Some(meta) => decode(meta.clone())?,
        None => CursorState::default(),
    };
    Ok(Page {
        data: api_data(response)?,
        state,
    })
}

/// Offset and limit for the fetch following `state`
fn page_window(state: Option<CursorState>, offset: u64, limit: u64) -> (u64, u64) {
    match state {
        Some(state) => (state.next_offset.unwrap_or(state.offset), state.limit.max(1)),
        None => (offset, limit),
    }
}

/// CLI argument vector builder
#[derive(Debug, Default)]
struct CliArgs(Vec<String>);

impl CliArgs {
    fn new(args: &[&str]) -> Self {
        Self(args.iter().map(|s| s.to_string()).collect())
    }

    fn flag(mut self, name: &str, value: impl ToString) -> Self {
        self.0.push(name.to_string());
        self.0.push(value.to_string());
        self
    }

    fn flag_opt<V: ToString>(self, name: &str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.flag(name, value),
            None => self,
        }
    }

    fn into_vec(self) -> Vec<String> {
        self.0
    }
}
