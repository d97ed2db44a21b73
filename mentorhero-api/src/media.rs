/// Profile image upload client
///
/// Registration and profile updates accept an optional image file. The
/// server never stores the bytes itself: they are forwarded to a
/// third-party image host's unsigned upload endpoint and only the hosted
/// URL is persisted. Deployments without the image host configured still
/// run; handlers reject image uploads with 503 in that case.
///
/// # Example
///
/// ```no_run
/// use mentorhero_api::media::ImageStore;
/// use bytes::Bytes;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = ImageStore::new(
///     "https://api.cloudinary.com/v1_1/demo/image/upload".to_string(),
///     "mentorhero_unsigned".to_string(),
/// );
///
/// let url = store.upload("avatar.png", Bytes::from_static(b"...")).await?;
/// println!("Hosted at {}", url);
/// # Ok(())
/// # }
/// ```

use bytes::Bytes;

/// Error type for image host operations
#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    /// The upload request could not be sent or the response not read
    #[error("image host unreachable: {0}")]
    Request(#[from] reqwest::Error),

    /// The image host answered with a non-success status
    #[error("image host rejected the upload with status {0}")]
    Rejected(reqwest::StatusCode),

    /// The image host response had no usable URL in it
    #[error("image host response did not contain a secure_url")]
    MalformedResponse,
}

/// Client for the third-party image host
#[derive(Debug, Clone)]
pub struct ImageStore {
    client: reqwest::Client,
    upload_url: String,
    upload_preset: String,
}

impl ImageStore {
    /// Creates a client for the given unsigned upload endpoint
    pub fn new(upload_url: String, upload_preset: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            upload_url,
            upload_preset,
        }
    }

    /// Uploads image bytes and returns the hosted HTTPS URL
    ///
    /// # Errors
    ///
    /// Fails when the host is unreachable, rejects the upload, or answers
    /// without a `secure_url` field.
    pub async fn upload(&self, file_name: &str, data: Bytes) -> Result<String, MediaError> {
        let part = reqwest::multipart::Part::bytes(data.to_vec())
            .file_name(file_name.to_string());

        let form = reqwest::multipart::Form::new()
            .text("upload_preset", self.upload_preset.clone())
            .part("file", part);

        let response = self
            .client
            .post(&self.upload_url)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(MediaError::Rejected(status));
        }

        let body: serde_json::Value = response.json().await?;

        body.get("secure_url")
            .and_then(|v| v.as_str())
            .map(|url| url.to_string())
            .ok_or(MediaError::MalformedResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_is_cloneable() {
        let store = ImageStore::new(
            "https://images.example.com/upload".to_string(),
            "preset".to_string(),
        );
        let clone = store.clone();
        assert_eq!(clone.upload_url, store.upload_url);
        assert_eq!(clone.upload_preset, store.upload_preset);
    }
}
