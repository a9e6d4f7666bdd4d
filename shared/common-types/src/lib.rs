//! Wire types shared by the photo listing function and its callers

use serde::{Deserialize, Serialize};

/// One photo in the listing response
///
/// `url` is a presigned `GetObject` URL and stops working once its expiry
/// window has elapsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoUrl {
    /// Object key of the photo in the bucket
    pub filename: String,
    /// Presigned retrieval URL
    pub url: String,
}

/// Frontend runtime configuration, written next to the website bundle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrontendConfig {
    /// Base URL of the HTTP API, with a trailing slash
    pub api_url: String,
}

impl FrontendConfig {
    /// Creates a config, appending the trailing slash the frontend expects
    #[must_use]
    pub fn new(api_url: &str) -> Self {
        let api_url = if api_url.ends_with('/') {
            api_url.to_string()
        } else {
            format!("{api_url}/")
        };
        Self { api_url }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_photo_url_wire_format() {
        let photo = PhotoUrl {
            filename: "mario.png".to_string(),
            url: "https://example.com/mario.png?X-Amz-Expires=86400".to_string(),
        };

        let json = serde_json::to_value(&photo).unwrap();
        assert_eq!(json["filename"], "mario.png");
        assert_eq!(
            json["url"],
            "https://example.com/mario.png?X-Amz-Expires=86400"
        );
    }

    #[test]
    fn test_frontend_config_trailing_slash() {
        let config = FrontendConfig::new("https://abc.execute-api.us-east-1.amazonaws.com");
        assert_eq!(
            config.api_url,
            "https://abc.execute-api.us-east-1.amazonaws.com/"
        );

        let config = FrontendConfig::new("https://abc.execute-api.us-east-1.amazonaws.com/");
        assert_eq!(
            config.api_url,
            "https://abc.execute-api.us-east-1.amazonaws.com/"
        );

        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"apiUrl\""));
    }
}
