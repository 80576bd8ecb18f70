use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Where to fetch a remote snippet from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteSnippetConfig {
    pub name: String,
    pub url: String,
}

/// A fetched template fragment.
///
/// The content is shared, never copied, between the run-wide list and the
/// per-render lookup maps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteSnippet {
    pub name: String,
    pub url: String,
    pub content: Arc<str>,
}

/// Keys the snippet list by name. Later duplicates win.
pub fn index_snippets(snippets: &[RemoteSnippet]) -> HashMap<String, Arc<str>> {
    snippets
        .iter()
        .map(|snippet| (snippet.name.clone(), Arc::clone(&snippet.content)))
        .collect()
}
