//! Local image persistence. Download failures are logged, never raised:
//! an article without a stored image is still a valid article.

use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

pub struct ImageStore {
    http: reqwest::Client,
    dir: PathBuf,
}

impl ImageStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(20))
            .build()
            .unwrap_or_default();
        Self {
            http,
            dir: dir.into(),
        }
    }

    /// Download `url` into the store directory. Returns the local path, or
    /// `None` on any failure.
    pub async fn fetch(&self, url: &str) -> Option<PathBuf> {
        let file_name = file_name_for(url)?;

        if let Err(err) = tokio::fs::create_dir_all(&self.dir).await {
            warn!(dir = %self.dir.display(), error = %err, "images.dir_create_failed");
            return None;
        }

        let path = self.dir.join(file_name);
        match self.download(url).await {
            Ok(bytes) => match tokio::fs::write(&path, &bytes).await {
                Ok(()) => {
                    debug!(url, path = %path.display(), bytes = bytes.len(), "images.stored");
                    Some(path)
                }
                Err(err) => {
                    warn!(url, error = %err, "images.write_failed");
                    None
                }
            },
            Err(err) => {
                warn!(url, error = %err, "images.download_failed");
                None
            }
        }
    }

    async fn download(&self, url: &str) -> reqwest::Result<Vec<u8>> {
        let body = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        Ok(body.to_vec())
    }
}

/// Derive a local file name from the URL path, dropping any query string.
fn file_name_for(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let name = parsed.path_segments()?.last()?.to_string();
    (!name.is_empty()).then_some(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_drops_query_strings() {
        assert_eq!(
            file_name_for("https://img.example.com/photos/portada.jpg?w=1200"),
            Some("portada.jpg".to_string())
        );
    }

    #[test]
    fn urls_without_a_file_segment_yield_none() {
        assert_eq!(file_name_for("https://img.example.com/"), None);
        assert_eq!(file_name_for("not a url"), None);
    }
}
