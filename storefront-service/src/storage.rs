use anyhow::{anyhow, Result};
use chrono::Utc;
use s3::bucket::Bucket;
use s3::creds::Credentials;
use s3::region::Region;
use tracing::info;
use uuid::Uuid;

use crate::config::Config;

const DEFAULT_FOLDER: &str = "products";

/// S3-compatible bucket that serves uploaded media from a public base URL.
pub struct ObjectStorage {
    bucket: Box<Bucket>,
    public_url: String,
}

impl ObjectStorage {
    pub fn from_config(config: &Config) -> Result<Self> {
        if config.storage_bucket.is_empty() {
            return Err(anyhow!("Storage bucket name cannot be empty"));
        }

        let region = Region::Custom {
            region: config.storage_region.clone(),
            endpoint: config.storage_endpoint.clone(),
        };

        let credentials = Credentials::new(
            Some(config.storage_access_key.as_str()),
            Some(config.storage_secret_key.as_str()),
            None, // security_token
            None, // session_token
            None, // expiration
        )?;

        let bucket = Bucket::new(&config.storage_bucket, region, credentials)?.with_path_style();

        Ok(Self {
            bucket,
            public_url: config.storage_public_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn bucket_name(&self) -> &str {
        &self.bucket.name
    }

    pub fn public_url_for(&self, key: &str) -> String {
        format!("{}/{}", self.public_url, key)
    }

    /// Maps a public URL back to its object key. URLs served from anywhere
    /// else are not ours to delete.
    pub fn key_from_url(&self, url: &str) -> Option<String> {
        let key = url.strip_prefix(&self.public_url)?.strip_prefix('/')?;
        let key = key.split(['?', '#']).next().unwrap_or_default();
        if key.is_empty() {
            None
        } else {
            Some(key.to_string())
        }
    }

    pub async fn put(&self, key: &str, data: &[u8], content_type: &str) -> Result<String> {
        let response = self
            .bucket
            .put_object_with_content_type(key, data, content_type)
            .await?;

        if response.status_code() == 200 {
            info!("Stored object: {}", key);
            Ok(self.public_url_for(key))
        } else {
            Err(anyhow!("Failed to store object: HTTP {}", response.status_code()))
        }
    }

    pub async fn delete(&self, key: &str) -> Result<()> {
        let response = self.bucket.delete_object(key).await?;

        match response.status_code() {
            200 | 204 => {
                info!("Deleted object: {}", key);
                Ok(())
            }
            code => Err(anyhow!("Failed to delete object: HTTP {}", code)),
        }
    }

    pub async fn check(&self) -> Result<bool> {
        self.bucket
            .exists()
            .await
            .map_err(|e| anyhow!("Failed to check bucket existence: {}", e))
    }
}

/// `<folder>/<millis>-<uuid>.webp`. Folder names outside `[a-z0-9_-]` fall
/// back to the default folder.
pub fn generate_image_key(folder: Option<&str>) -> String {
    let folder = folder
        .map(str::trim)
        .filter(|f| {
            !f.is_empty()
                && f.chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
        })
        .unwrap_or(DEFAULT_FOLDER);
    format!("{}/{}-{}.webp", folder, Utc::now().timestamp_millis(), Uuid::new_v4())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn storage() -> ObjectStorage {
        let config = Config::try_parse_from([
            "storefront-service",
            "--storage-access-key",
            "test-access",
            "--storage-secret-key",
            "test-secret",
            "--storage-public-url",
            "https://media.example.com/",
        ])
        .unwrap();
        ObjectStorage::from_config(&config).unwrap()
    }

    #[test]
    fn public_urls_map_back_to_keys() {
        let storage = storage();
        let url = storage.public_url_for("looks/1700000000000-abc.webp");
        assert_eq!(url, "https://media.example.com/looks/1700000000000-abc.webp");
        assert_eq!(storage.key_from_url(&url).as_deref(), Some("looks/1700000000000-abc.webp"));
        assert_eq!(
            storage.key_from_url("https://media.example.com/a.webp?v=2").as_deref(),
            Some("a.webp")
        );
    }

    #[test]
    fn foreign_urls_have_no_key() {
        let storage = storage();
        assert_eq!(storage.key_from_url("https://elsewhere.example.com/a.webp"), None);
        assert_eq!(storage.key_from_url("https://media.example.com/"), None);
        assert_eq!(storage.key_from_url("https://media.example.community/a.webp"), None);
    }

    #[test]
    fn image_keys_are_unique_and_foldered() {
        let a = generate_image_key(Some("looks"));
        let b = generate_image_key(Some("looks"));
        assert!(a.starts_with("looks/"));
        assert!(a.ends_with(".webp"));
        assert_ne!(a, b);

        assert!(generate_image_key(Some("../etc")).starts_with("products/"));
        assert!(generate_image_key(None).starts_with("products/"));
    }
}
