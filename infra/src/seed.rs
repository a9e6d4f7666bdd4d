//! Seeding buckets from local directories
//!
//! Objects whose remote ETag already matches the local MD5 are skipped, so
//! seeding the same directory twice uploads nothing the second time.

use std::path::{Path, PathBuf};

use aws_sdk_s3::{
    error::{DisplayErrorContext, SdkError},
    operation::head_object::HeadObjectError,
    primitives::ByteStream,
    Client as S3Client,
};
use common_types::FrontendConfig;
use futures::{stream, StreamExt, TryStreamExt};
use mime::Mime;
use thiserror::Error;
use tracing::{debug, info};

/// Key of the frontend's runtime configuration in the website bucket
pub const FRONTEND_CONFIG_KEY: &str = "config.json";

const SEED_CONCURRENCY: usize = 8;

/// Errors raised while seeding a bucket
#[derive(Error, Debug)]
pub enum SeedError {
    /// The source directory does not exist
    #[error("Seed directory not found: {0}")]
    MissingDirectory(PathBuf),

    /// A local file could not be read
    #[error("Failed to read {path}: {source}")]
    Io {
        /// File or directory being read
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// A file name is not valid UTF-8 and cannot become an object key
    #[error("File name is not valid UTF-8: {0}")]
    InvalidFileName(PathBuf),

    /// The remote object could not be inspected
    #[error("Failed to inspect s3://{bucket}/{key}: {message}")]
    Head {
        /// Target bucket
        bucket: String,
        /// Object key
        key: String,
        /// SDK error description
        message: String,
    },

    /// The object could not be uploaded
    #[error("Failed to upload s3://{bucket}/{key}: {message}")]
    Upload {
        /// Target bucket
        bucket: String,
        /// Object key
        key: String,
        /// SDK error description
        message: String,
    },

    /// Generated content could not be serialized
    #[error("Failed to serialize config.json: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Where an asset's bytes come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetBody {
    /// A local file
    File(PathBuf),
    /// Bytes generated at seed time
    Inline(Vec<u8>),
}

/// One object to place in a bucket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    /// Object key, `/`-separated
    pub key: String,
    /// Object content
    pub body: AssetBody,
    /// Lowercase hex MD5 of the content
    pub md5_hex: String,
    /// Content type sent with the upload
    pub content_type: Mime,
}

impl Asset {
    /// An asset generated in memory
    #[must_use]
    pub fn inline(key: &str, bytes: Vec<u8>, content_type: Mime) -> Self {
        Self {
            key: key.to_string(),
            md5_hex: md5_hex(&bytes),
            body: AssetBody::Inline(bytes),
            content_type,
        }
    }
}

/// What seeding did with one asset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    /// Uploaded, because it was missing or different
    Uploaded,
    /// Left alone, the remote copy already matches
    Unchanged,
}

/// Counts of a seeding run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    /// Objects uploaded
    pub uploaded: usize,
    /// Objects already up to date
    pub unchanged: usize,
}

impl SeedReport {
    fn record(&mut self, outcome: SeedOutcome) {
        match outcome {
            SeedOutcome::Uploaded => self.uploaded += 1,
            SeedOutcome::Unchanged => self.unchanged += 1,
        }
    }
}

fn md5_hex(bytes: &[u8]) -> String {
    format!("{:x}", md5::compute(bytes))
}

/// Content type for a file, by extension
#[must_use]
pub fn content_type_for(path: &Path) -> Mime {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "html" | "htm" => mime::TEXT_HTML_UTF_8,
        "css" => mime::TEXT_CSS_UTF_8,
        "js" | "mjs" => mime::APPLICATION_JAVASCRIPT_UTF_8,
        "json" | "map" => mime::APPLICATION_JSON,
        "txt" => mime::TEXT_PLAIN_UTF_8,
        "png" => mime::IMAGE_PNG,
        "jpg" | "jpeg" => mime::IMAGE_JPEG,
        "gif" => mime::IMAGE_GIF,
        "svg" => mime::IMAGE_SVG,
        "bmp" => mime::IMAGE_BMP,
        "webp" => "image/webp".parse().unwrap_or(mime::APPLICATION_OCTET_STREAM),
        "ico" => "image/x-icon".parse().unwrap_or(mime::APPLICATION_OCTET_STREAM),
        "woff2" => "font/woff2".parse().unwrap_or(mime::APPLICATION_OCTET_STREAM),
        _ => mime::APPLICATION_OCTET_STREAM,
    }
}

/// Collects every file under `dir` as an asset keyed by its relative path
///
/// Hidden entries (leading `.`) and symlinks are skipped.
///
/// # Errors
///
/// Returns `SeedError::MissingDirectory` if `dir` is not a directory
/// Returns `SeedError::Io` if a file or directory cannot be read
/// Returns `SeedError::InvalidFileName` for a file name that is not UTF-8
pub fn collect_assets(dir: &Path) -> Result<Vec<Asset>, SeedError> {
    if !dir.is_dir() {
        return Err(SeedError::MissingDirectory(dir.to_path_buf()));
    }

    let mut assets = Vec::new();
    collect_into(dir, "", &mut assets)?;
    assets.sort_by(|a, b| a.key.cmp(&b.key));
    Ok(assets)
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> SeedError {
    let path = path.to_path_buf();
    move |source| SeedError::Io { path, source }
}

fn collect_into(dir: &Path, key_prefix: &str, assets: &mut Vec<Asset>) -> Result<(), SeedError> {
    for entry in std::fs::read_dir(dir).map_err(io_error(dir))? {
        let entry = entry.map_err(io_error(dir))?;
        let path = entry.path();

        let Some(name) = entry.file_name().to_str().map(ToString::to_string) else {
            return Err(SeedError::InvalidFileName(path));
        };
        // Hidden files such as `.gitkeep` or `.DS_Store` are never assets
        if name.starts_with('.') {
            debug!("skipping hidden file: {}", path.display());
            continue;
        }

        let file_type = entry.file_type().map_err(io_error(&path))?;
        let key = format!("{key_prefix}{name}");

        if file_type.is_symlink() {
            debug!("skipping symlink: {}", path.display());
        } else if file_type.is_dir() {
            collect_into(&path, &format!("{key}/"), assets)?;
        } else {
            let bytes = std::fs::read(&path).map_err(io_error(&path))?;
            assets.push(Asset {
                key,
                md5_hex: md5_hex(&bytes),
                content_type: content_type_for(&path),
                body: AssetBody::File(path),
            });
        }
    }

    Ok(())
}

/// The frontend's `config.json`, pointing it at the deployed API
///
/// # Errors
///
/// Returns `SeedError::Serialize` if the config cannot be rendered
pub fn frontend_config_asset(api_url: &str) -> Result<Asset, SeedError> {
    let bytes = serde_json::to_vec_pretty(&FrontendConfig::new(api_url))?;
    Ok(Asset::inline(
        FRONTEND_CONFIG_KEY,
        bytes,
        mime::APPLICATION_JSON,
    ))
}

/// Whether a remote object with `remote_etag` already holds the content
///
/// Single-part uploads have the quoted hex MD5 as ETag; multipart ETags
/// never match and are re-uploaded.
#[must_use]
pub fn is_unchanged(remote_etag: Option<&str>, local_md5_hex: &str) -> bool {
    remote_etag.is_some_and(|etag| etag.trim_matches('"').eq_ignore_ascii_case(local_md5_hex))
}

async fn remote_etag(client: &S3Client, bucket: &str, key: &str) -> Result<Option<String>, SeedError> {
    match client.head_object().bucket(bucket).key(key).send().await {
        Ok(output) => Ok(Some(output.e_tag().unwrap_or_default().to_string())),
        Err(SdkError::ServiceError(service_err))
            if matches!(service_err.err(), HeadObjectError::NotFound(_)) =>
        {
            Ok(None)
        }
        Err(e) => Err(SeedError::Head {
            bucket: bucket.to_string(),
            key: key.to_string(),
            message: DisplayErrorContext(&e).to_string(),
        }),
    }
}

async fn seed_asset(client: &S3Client, bucket: &str, asset: Asset) -> Result<SeedOutcome, SeedError> {
    let etag = remote_etag(client, bucket, &asset.key).await?;
    if is_unchanged(etag.as_deref(), &asset.md5_hex) {
        debug!("unchanged: {}", asset.key);
        return Ok(SeedOutcome::Unchanged);
    }

    let body = match asset.body {
        AssetBody::File(path) => ByteStream::from_path(&path)
            .await
            .map_err(|e| SeedError::Upload {
                bucket: bucket.to_string(),
                key: asset.key.clone(),
                message: e.to_string(),
            })?,
        AssetBody::Inline(bytes) => ByteStream::from(bytes),
    };

    client
        .put_object()
        .bucket(bucket)
        .key(&asset.key)
        .content_type(asset.content_type.as_ref())
        .body(body)
        .send()
        .await
        .map_err(|e| SeedError::Upload {
            bucket: bucket.to_string(),
            key: asset.key.clone(),
            message: DisplayErrorContext(&e).to_string(),
        })?;

    debug!("uploaded: {}", asset.key);
    Ok(SeedOutcome::Uploaded)
}

/// Uploads `assets` that are missing or changed in `bucket`
///
/// Uploads run concurrently with a bounded width; the first failure aborts
/// the run.
///
/// # Errors
///
/// Returns the first `SeedError` raised by any asset
pub async fn seed_assets(
    client: &S3Client,
    bucket: &str,
    assets: Vec<Asset>,
) -> Result<SeedReport, SeedError> {
    let report = stream::iter(assets)
        .map(|asset| seed_asset(client, bucket, asset))
        .buffer_unordered(SEED_CONCURRENCY)
        .try_fold(SeedReport::default(), |mut report, outcome| async move {
            report.record(outcome);
            Ok(report)
        })
        .await?;

    info!(
        bucket,
        uploaded = report.uploaded,
        unchanged = report.unchanged,
        "seeded bucket"
    );
    Ok(report)
}

/// Seeds `bucket` with the contents of `dir`
///
/// # Errors
///
/// Returns `SeedError` if the directory cannot be read or an upload fails
pub async fn seed_directory(
    client: &S3Client,
    bucket: &str,
    dir: &Path,
) -> Result<SeedReport, SeedError> {
    let assets = collect_assets(dir)?;
    seed_assets(client, bucket, assets).await
}

/// Assets for the website bucket: the frontend bundle plus its `config.json`
///
/// A `config.json` already in the bundle is replaced.
///
/// # Errors
///
/// Returns `SeedError` if the bundle cannot be read
pub fn website_assets(build_dir: &Path, api_url: &str) -> Result<Vec<Asset>, SeedError> {
    let mut assets: Vec<Asset> = collect_assets(build_dir)?
        .into_iter()
        .filter(|asset| asset.key != FRONTEND_CONFIG_KEY)
        .collect();
    assets.push(frontend_config_asset(api_url)?);
    Ok(assets)
}

/// Seeds the website bucket with the frontend bundle and its `config.json`
///
/// # Errors
///
/// Returns `SeedError` if the bundle cannot be read or an upload fails
pub async fn seed_website(
    client: &S3Client,
    bucket: &str,
    build_dir: &Path,
    api_url: &str,
) -> Result<SeedReport, SeedError> {
    let assets = website_assets(build_dir, api_url)?;
    seed_assets(client, bucket, assets).await
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_content_types() {
        assert_eq!(content_type_for(Path::new("index.html")), mime::TEXT_HTML_UTF_8);
        assert_eq!(content_type_for(Path::new("static/js/main.js")), mime::APPLICATION_JAVASCRIPT_UTF_8);
        assert_eq!(content_type_for(Path::new("mario.PNG")), mime::IMAGE_PNG);
        assert_eq!(content_type_for(Path::new("luigi.jpeg")), mime::IMAGE_JPEG);
        assert_eq!(content_type_for(Path::new("yoshi.webp")).essence_str(), "image/webp");
        assert_eq!(content_type_for(Path::new("LICENSE")), mime::APPLICATION_OCTET_STREAM);
    }

    #[test]
    fn test_is_unchanged() {
        let md5 = md5_hex(b"mario");

        assert!(is_unchanged(Some(format!("\"{md5}\"").as_str()), &md5));
        assert!(is_unchanged(Some(md5.to_uppercase().as_str()), &md5));
        assert!(!is_unchanged(None, &md5));
        assert!(!is_unchanged(Some("\"0123456789abcdef0123456789abcdef\""), &md5));
        // Multipart ETags carry a part count suffix
        assert!(!is_unchanged(Some(format!("\"{md5}-2\"").as_str()), &md5));
    }

    #[test]
    fn test_md5_hex() {
        assert_eq!(md5_hex(b""), "d41d8cd98f00b204e9800998ecf8427e");
    }

    #[test]
    fn test_collect_assets_uses_relative_keys() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("static/css")).unwrap();
        std::fs::write(dir.path().join("index.html"), "<html></html>").unwrap();
        std::fs::write(dir.path().join("static/css/main.css"), "body {}").unwrap();
        std::fs::write(dir.path().join("mario.png"), [0x89, b'P', b'N', b'G']).unwrap();

        let assets = collect_assets(dir.path()).unwrap();
        let keys: Vec<&str> = assets.iter().map(|a| a.key.as_str()).collect();

        assert_eq!(keys, vec!["index.html", "mario.png", "static/css/main.css"]);
        assert_eq!(assets[0].md5_hex, md5_hex(b"<html></html>"));
        assert_eq!(assets[2].content_type, mime::TEXT_CSS_UTF_8);
        assert_eq!(
            assets[1].body,
            AssetBody::File(dir.path().join("mario.png"))
        );
    }

    #[test]
    fn test_collect_assets_skips_hidden_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(".git")).unwrap();
        std::fs::write(dir.path().join(".gitkeep"), "").unwrap();
        std::fs::write(dir.path().join(".git/HEAD"), "ref: refs/heads/main").unwrap();
        std::fs::write(dir.path().join("mario.png"), [0x89, b'P', b'N', b'G']).unwrap();

        let assets = collect_assets(dir.path()).unwrap();
        let keys: Vec<&str> = assets.iter().map(|a| a.key.as_str()).collect();

        assert_eq!(keys, vec!["mario.png"]);
    }

    #[test]
    fn test_placeholder_only_directory_has_no_assets() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".gitkeep"), "").unwrap();

        assert!(collect_assets(dir.path()).unwrap().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_collect_assets_skips_symlink_cycles() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("album")).unwrap();
        std::fs::write(dir.path().join("album/luigi.png"), "luigi").unwrap();
        std::os::unix::fs::symlink(dir.path(), dir.path().join("album/loop")).unwrap();
        std::os::unix::fs::symlink(
            dir.path().join("album/luigi.png"),
            dir.path().join("luigi-link.png"),
        )
        .unwrap();

        let assets = collect_assets(dir.path()).unwrap();
        let keys: Vec<&str> = assets.iter().map(|a| a.key.as_str()).collect();

        assert_eq!(keys, vec!["album/luigi.png"]);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_collect_assets_rejects_non_utf8_names() {
        use std::{ffi::OsStr, os::unix::ffi::OsStrExt};

        let dir = tempfile::tempdir().unwrap();
        let name = OsStr::from_bytes(b"bowser\xff.png");
        std::fs::write(dir.path().join(name), "bowser").unwrap();

        let result = collect_assets(dir.path());

        assert!(matches!(result, Err(SeedError::InvalidFileName(_))));
    }

    #[test]
    fn test_collect_assets_missing_directory() {
        let result = collect_assets(Path::new("/nonexistent/photos"));
        assert!(matches!(result, Err(SeedError::MissingDirectory(_))));
    }

    #[test]
    fn test_website_assets_replace_bundled_config() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<html></html>").unwrap();
        std::fs::write(dir.path().join("config.json"), r#"{"apiUrl":"http://localhost:3000/"}"#).unwrap();

        let assets = website_assets(dir.path(), "https://api.example.com").unwrap();
        let configs: Vec<&Asset> = assets.iter().filter(|a| a.key == FRONTEND_CONFIG_KEY).collect();

        assert_eq!(assets.len(), 2);
        assert_eq!(configs.len(), 1);
        assert!(matches!(configs[0].body, AssetBody::Inline(_)));
    }

    #[test]
    fn test_frontend_config_asset() {
        let asset = frontend_config_asset("https://abc.execute-api.us-east-1.amazonaws.com").unwrap();

        assert_eq!(asset.key, "config.json");
        assert_eq!(asset.content_type, mime::APPLICATION_JSON);
        let AssetBody::Inline(bytes) = &asset.body else {
            panic!("expected inline body");
        };
        let config: FrontendConfig = serde_json::from_slice(bytes).unwrap();
        assert_eq!(config.api_url, "https://abc.execute-api.us-east-1.amazonaws.com/");
        assert_eq!(asset.md5_hex, md5_hex(bytes));
    }
}
