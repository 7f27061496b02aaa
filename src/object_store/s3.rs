use std::path::Path;

use async_trait::async_trait;
use aws_config::meta::region::RegionProviderChain;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::{DisplayErrorContext, SdkError};
use aws_sdk_s3::operation::get_object::GetObjectError;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use bytes::Bytes;

use super::{write_local_file, ObjectStore, ObjectStoreError};

const DEFAULT_REGION: &str = "us-east-1";

/// S3 object store backend, bound to one bucket.
///
/// Credentials come from the AWS default provider chain: environment
/// variables (including `AWS_SESSION_TOKEN`), shared profiles, web identity,
/// and ECS/EC2 instance roles.
pub struct S3Store {
    client: S3Client,
    bucket: String,
}

impl S3Store {
    pub fn new(client: S3Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    /// Build a client from the ambient AWS configuration.
    ///
    /// An explicit `region` wins over the provider chain. A custom `endpoint`
    /// (MinIO, LocalStack) switches to path-style addressing.
    pub async fn connect(bucket: &str, region: Option<&str>, endpoint: Option<&str>) -> Self {
        let region = RegionProviderChain::first_try(region.map(|r| Region::new(r.to_string())))
            .or_default_provider()
            .or_else(Region::new(DEFAULT_REGION));
        let shared = aws_config::defaults(BehaviorVersion::latest())
            .region(region)
            .load()
            .await;

        let mut builder = aws_sdk_s3::config::Builder::from(&shared);
        if let Some(endpoint) = endpoint {
            builder = builder
                .endpoint_url(endpoint.trim_end_matches('/'))
                .force_path_style(true);
        }

        Self::new(S3Client::from_conf(builder.build()), bucket)
    }

    async fn fetch(&self, key: &str) -> Result<Bytes, ObjectStoreError> {
        let resp = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| get_error(key, e))?;

        let data = resp
            .body
            .collect()
            .await
            .map_err(|e| ObjectStoreError::Backend(format!("S3 download failed: {e}")))?;
        Ok(data.into_bytes())
    }
}

/// Classify a failed `GetObject`.
///
/// A `NoSuchKey` code or a 404 means the object is absent. S3 answers 403
/// `AccessDenied` for a missing key when the caller lacks `s3:ListBucket`;
/// that is indistinguishable from a real denial and stays a backend error.
fn get_error(key: &str, err: SdkError<GetObjectError, HttpResponse>) -> ObjectStoreError {
    let no_such_key = err
        .as_service_error()
        .is_some_and(GetObjectError::is_no_such_key);
    let status = err.raw_response().map(|r| r.status().as_u16());
    if no_such_key || status == Some(404) {
        return ObjectStoreError::NotFound(key.to_string());
    }
    backend_error("S3 download failed", status, &err)
}

fn backend_error<E, R>(what: &str, status: Option<u16>, err: &SdkError<E, R>) -> ObjectStoreError
where
    E: std::error::Error + 'static,
    R: std::fmt::Debug,
{
    match status {
        Some(status) => {
            ObjectStoreError::Backend(format!("{what} ({status}): {}", DisplayErrorContext(err)))
        }
        None => ObjectStoreError::Backend(format!("{what}: {}", DisplayErrorContext(err))),
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn get(&self, key: &str) -> Result<Bytes, ObjectStoreError> {
        self.fetch(key).await
    }

    async fn put(&self, key: &str, data: Bytes) -> Result<(), ObjectStoreError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(data))
            .content_type("text/csv")
            .send()
            .await
            .map_err(|e| {
                let status = e.raw_response().map(|r| r.status().as_u16());
                backend_error("S3 upload failed", status, &e)
            })?;

        Ok(())
    }

    async fn copy_to_local(&self, key: &str, path: &Path) -> Result<(), ObjectStoreError> {
        let data = self.fetch(key).await?;
        write_local_file(path, &data).await
    }
}
