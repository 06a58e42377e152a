//! Client include parameters and the per-request context.
//!
//! Include paths are keyed by resource type, following the
//! `include[<type>]=<path>,<path>` query-parameter family:
//!
//! ```text
//! ?include[authors]=books,profile&include[books]=author
//! ```
//!
//! A plain `include=` parameter applies to the type of the requested
//! element (the top-level collection in the URL).

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::error::ParamsError;

const INCLUDE_KEY: &str = "include";

/// One requested relationship path, e.g. `books` or `books.author`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Inclusion {
    path: String,
}

impl Inclusion {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// The path split into its dot-separated segments.
    pub fn path_list(&self) -> Vec<&str> {
        self.path.split('.').collect()
    }
}

/// Requested include paths per resource type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct IncludeParams {
    params: BTreeMap<String, BTreeSet<Inclusion>>,
}

impl IncludeParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add include paths for a resource type (builder form).
    pub fn with<I, S>(mut self, resource_type: impl Into<String>, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.insert(resource_type, paths);
        self
    }

    pub fn insert<I, S>(&mut self, resource_type: impl Into<String>, paths: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entry = self.params.entry(resource_type.into()).or_default();
        for path in paths {
            entry.insert(Inclusion::new(path));
        }
    }

    /// Inclusions requested for a type, `None` when the type has no entry.
    pub fn get(&self, resource_type: &str) -> Option<&BTreeSet<Inclusion>> {
        self.params.get(resource_type)
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Parse include parameters from a URL query string.
    ///
    /// A bare `include=` parameter is assigned to `element_name`.
    /// Parameters other than `include` are ignored.
    ///
    /// # Errors
    ///
    /// Returns `ParamsError` for malformed `include[...]` keys, or for a bare
    /// `include` when no element name is known.
    pub fn parse(query: &str, element_name: Option<&str>) -> Result<Self, ParamsError> {
        let query = query.trim_start_matches('?');
        let mut params = IncludeParams::new();

        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            let Some(resource_type) = include_type(&key, element_name)? else {
                continue;
            };
            let paths = value
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(String::from)
                .collect::<Vec<_>>();
            params.insert(resource_type, paths);
        }

        Ok(params)
    }
}

/// Resource type addressed by a query key, `None` for unrelated keys.
fn include_type(key: &str, element_name: Option<&str>) -> Result<Option<String>, ParamsError> {
    let Some(rest) = key.strip_prefix(INCLUDE_KEY) else {
        return Ok(None);
    };

    if rest.is_empty() {
        return element_name
            .map(|name| Some(name.to_string()))
            .ok_or(ParamsError::MissingElementName);
    }

    let Some(bracketed) = rest.strip_prefix('[') else {
        // e.g. "includes" - some other parameter
        return Ok(None);
    };
    let Some(resource_type) = bracketed.strip_suffix(']') else {
        return Err(ParamsError::MalformedKey {
            key: key.to_string(),
        });
    };
    if resource_type.trim().is_empty() {
        return Err(ParamsError::EmptyResourceType {
            key: key.to_string(),
        });
    }
    Ok(Some(resource_type.trim().to_string()))
}

/// What the extractor needs to know about the current request.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub include: IncludeParams,
    /// Top-level element (resource type) the response was produced for.
    pub element_name: Option<String>,
}

impl RequestContext {
    pub fn new(include: IncludeParams) -> Self {
        Self {
            include,
            element_name: None,
        }
    }

    pub fn element_name(mut self, element_name: impl Into<String>) -> Self {
        self.element_name = Some(element_name.into());
        self
    }

    /// Whether the client asked for `field` directly under the top-level element.
    ///
    /// Only the first segment of each requested path is compared.
    pub fn is_top_level_field_included(&self, json_name: &str) -> bool {
        let Some(element_name) = self.element_name.as_deref() else {
            return false;
        };
        self.include.get(element_name).is_some_and(|inclusions| {
            inclusions
                .iter()
                .any(|inclusion| inclusion.path_list().first() == Some(&json_name))
        })
    }
}
