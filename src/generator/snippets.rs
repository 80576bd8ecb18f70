use std::sync::Arc;

use futures::future::try_join_all;
use log::info;

use crate::error::{Error, Result};
use crate::models::{RemoteSnippet, RemoteSnippetConfig};
use crate::utils::http::{is_link, web_get_async};

async fn load_remote_snippet(config: &RemoteSnippetConfig) -> Result<RemoteSnippet> {
    let content = if is_link(&config.url) {
        web_get_async(&config.url, None)
            .await
            .map_err(|message| Error::Fetch {
                url: config.url.clone(),
                message,
            })?
    } else {
        tokio::fs::read_to_string(&config.url)
            .await
            .map_err(|e| Error::io(&config.url, e))?
    };
    Ok(RemoteSnippet {
        name: config.name.clone(),
        url: config.url.clone(),
        content: Arc::from(content),
    })
}

/// Fetch every snippet, concurrently, keeping the declared order.
pub async fn load_remote_snippets(configs: &[RemoteSnippetConfig]) -> Result<Vec<RemoteSnippet>> {
    if configs.is_empty() {
        return Ok(Vec::new());
    }
    let snippets = try_join_all(configs.iter().map(load_remote_snippet)).await?;
    info!("Loaded {} remote snippet(s)", snippets.len());
    Ok(snippets)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty() {
        assert!(load_remote_snippets(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_local_snippets_keep_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut configs = Vec::new();
        for name in ["b", "a"] {
            let path = dir.path().join(format!("{}.list", name));
            std::fs::write(&path, format!("DOMAIN,{}.com", name)).unwrap();
            configs.push(RemoteSnippetConfig {
                name: name.to_string(),
                url: path.to_string_lossy().into_owned(),
            });
        }
        let snippets = load_remote_snippets(&configs).await.unwrap();
        assert_eq!(snippets[0].name, "b");
        assert_eq!(&*snippets[1].content, "DOMAIN,a.com");
    }

    #[tokio::test]
    async fn test_missing_snippet_fails() {
        let configs = vec![RemoteSnippetConfig {
            name: "gone".to_string(),
            url: "/nonexistent/subgen/gone.list".to_string(),
        }];
        assert!(matches!(
            load_remote_snippets(&configs).await,
            Err(Error::Io { .. })
        ));
    }
}
