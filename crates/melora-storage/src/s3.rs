use crate::traits::{ByteStream, Storage, StorageError, StorageResult};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use futures::StreamExt;
use http::Method;
use melora_core::{BackendKind, SignedAccessGrant, StorageLocation};
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path;
use object_store::signer::Signer;
use object_store::Error as ObjectStoreError;
use object_store::{GetOptions, GetRange, ObjectStore, ObjectStoreExt, PutPayload};
use std::path::PathBuf;
use std::time::Duration;

/// S3 storage implementation
///
/// Works against AWS S3 and S3-compatible providers (MinIO, Spaces) via a
/// custom endpoint. When the store sits behind a proxy, `public_endpoint`
/// rewrites signed URLs from the internal endpoint to the public-facing one.
#[derive(Clone)]
pub struct S3Storage {
    store: AmazonS3,
    bucket: String,
    endpoint_url: Option<String>,
    public_endpoint_url: Option<String>,
}

impl S3Storage {
    pub async fn new(
        bucket: String,
        region: String,
        endpoint_url: Option<String>,
        public_endpoint_url: Option<String>,
    ) -> StorageResult<Self> {
        // Credentials come from the environment; region/bucket/endpoint are explicit.
        let mut builder = AmazonS3Builder::from_env()
            .with_region(region)
            .with_bucket_name(bucket.clone());

        if let Some(ref endpoint) = endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        Ok(S3Storage {
            store,
            bucket,
            endpoint_url,
            public_endpoint_url,
        })
    }

    fn object_path(location: &StorageLocation) -> Path {
        Path::from(location.key())
    }

    fn rewrite_url(&self, url: String) -> String {
        rewrite_public_url(
            self.endpoint_url.as_deref(),
            self.public_endpoint_url.as_deref(),
            url,
        )
    }
}

/// Rewrite an internal endpoint URL to the public-facing one, when both are
/// configured and the URL actually points at the internal endpoint.
fn rewrite_public_url(internal: Option<&str>, public: Option<&str>, url: String) -> String {
    match (internal, public) {
        (Some(internal), Some(public)) if url.contains(internal) => {
            url.replacen(internal, public, 1)
        }
        _ => url,
    }
}

#[async_trait]
impl Storage for S3Storage {
    fn backend_kind(&self) -> BackendKind {
        BackendKind::S3
    }

    fn location(&self, key: &str) -> StorageLocation {
        StorageLocation::Object {
            bucket: self.bucket.clone(),
            key: key.to_string(),
        }
    }

    fn local_path(&self, _location: &StorageLocation) -> Option<PathBuf> {
        None
    }

    async fn exists(&self, location: &StorageLocation) -> StorageResult<bool> {
        match self.store.head(&Self::object_path(location)).await {
            Ok(_) => Ok(true),
            Err(ObjectStoreError::NotFound { .. }) => Ok(false),
            Err(e) => Err(StorageError::BackendError(e.to_string())),
        }
    }

    async fn content_length(&self, location: &StorageLocation) -> StorageResult<u64> {
        match self.store.head(&Self::object_path(location)).await {
            Ok(meta) => Ok(meta.size),
            Err(ObjectStoreError::NotFound { .. }) => {
                Err(StorageError::NotFound(location.key().to_string()))
            }
            Err(e) => Err(StorageError::BackendError(e.to_string())),
        }
    }

    async fn write(&self, location: &StorageLocation, data: Bytes) -> StorageResult<()> {
        let size = data.len();
        let start = std::time::Instant::now();

        // A single S3 PUT is already atomic at the final key; readers see
        // either the old object or the complete new one.
        self.store
            .put(&Self::object_path(location), PutPayload::from(data))
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    key = %location.key(),
                    size_bytes = size,
                    "S3 write failed"
                );
                StorageError::WriteFailed(e.to_string())
            })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %location.key(),
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 write successful"
        );

        Ok(())
    }

    async fn download_stream(&self, location: &StorageLocation) -> StorageResult<ByteStream> {
        let result = self
            .store
            .get(&Self::object_path(location))
            .await
            .map_err(|e| match e {
                ObjectStoreError::NotFound { .. } => {
                    StorageError::NotFound(location.key().to_string())
                }
                other => StorageError::ReadFailed(other.to_string()),
            })?;

        let key = location.key().to_string();
        let stream = result.into_stream().map(move |res| {
            res.map_err(|e| {
                tracing::error!(key = %key, error = %e, "S3 stream read error");
                StorageError::ReadFailed(e.to_string())
            })
        });

        Ok(Box::pin(stream))
    }

    async fn read_range(
        &self,
        location: &StorageLocation,
        offset: u64,
        length: u64,
    ) -> StorageResult<ByteStream> {
        let options = GetOptions {
            range: Some(GetRange::Bounded(offset..offset + length)),
            ..Default::default()
        };

        let result = self
            .store
            .get_opts(&Self::object_path(location), options)
            .await
            .map_err(|e| match e {
                ObjectStoreError::NotFound { .. } => {
                    StorageError::NotFound(location.key().to_string())
                }
                other => StorageError::ReadFailed(other.to_string()),
            })?;

        let key = location.key().to_string();
        let stream = result.into_stream().map(move |res| {
            res.map_err(|e| {
                tracing::error!(key = %key, error = %e, "S3 ranged read error");
                StorageError::ReadFailed(e.to_string())
            })
        });

        Ok(Box::pin(stream))
    }

    async fn delete(&self, location: &StorageLocation) -> StorageResult<()> {
        match self.store.delete(&Self::object_path(location)).await {
            Ok(()) => {
                tracing::info!(bucket = %self.bucket, key = %location.key(), "S3 delete successful");
                Ok(())
            }
            // Idempotent: deleting an absent object is not an error.
            Err(ObjectStoreError::NotFound { .. }) => Ok(()),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    key = %location.key(),
                    "S3 delete failed"
                );
                Err(StorageError::DeleteFailed(e.to_string()))
            }
        }
    }

    async fn rename(
        &self,
        from: &StorageLocation,
        to: &StorageLocation,
    ) -> StorageResult<()> {
        let from_path = Self::object_path(from);
        let to_path = Self::object_path(to);

        // No native rename: copy, then delete the source. If the source
        // delete fails the copy is rolled back so the destination never
        // exists after a failed move.
        self.store
            .copy(&from_path, &to_path)
            .await
            .map_err(|e| match e {
                ObjectStoreError::NotFound { .. } => {
                    StorageError::NotFound(from.key().to_string())
                }
                other => StorageError::BackendError(other.to_string()),
            })?;

        if let Err(e) = self.store.delete(&from_path).await {
            let rollback = self.store.delete(&to_path).await;
            tracing::error!(
                error = %e,
                from_key = %from.key(),
                to_key = %to.key(),
                rollback_ok = rollback.is_ok(),
                "S3 rename failed after copy; destination rolled back"
            );
            return Err(StorageError::BackendError(format!(
                "failed to remove source after copy: {}",
                e
            )));
        }

        tracing::info!(
            from_key = %from.key(),
            to_key = %to.key(),
            "S3 rename successful"
        );

        Ok(())
    }

    async fn signed_url(
        &self,
        location: &StorageLocation,
        ttl: Duration,
    ) -> StorageResult<SignedAccessGrant> {
        let url = self
            .store
            .signed_url(Method::GET, &Self::object_path(location), ttl)
            .await
            .map_err(|e| StorageError::BackendError(e.to_string()))?
            .to_string();

        let expires_at = Utc::now()
            + chrono::Duration::from_std(ttl)
                .map_err(|e| StorageError::BackendError(e.to_string()))?;

        Ok(SignedAccessGrant {
            url: self.rewrite_url(url),
            expires_at,
        })
    }
}

/// Create the bucket if it does not exist yet. Invoked once at startup.
///
/// "Already exists" (in either flavor the API reports) counts as success;
/// any other failure propagates.
pub async fn ensure_bucket(
    bucket: &str,
    region: &str,
    endpoint_url: Option<&str>,
) -> StorageResult<()> {
    use aws_config::{BehaviorVersion, Region};

    let shared = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(region.to_string()))
        .load()
        .await;

    let mut builder = aws_sdk_s3::config::Builder::from(&shared);
    if let Some(endpoint) = endpoint_url {
        builder = builder.endpoint_url(endpoint).force_path_style(true);
    }
    let client = aws_sdk_s3::Client::from_conf(builder.build());

    let mut request = client.create_bucket().bucket(bucket);
    if region != "us-east-1" {
        use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration};
        request = request.create_bucket_configuration(
            CreateBucketConfiguration::builder()
                .location_constraint(BucketLocationConstraint::from(region))
                .build(),
        );
    }

    match request.send().await {
        Ok(_) => {
            tracing::info!(bucket = %bucket, "Created storage bucket");
            Ok(())
        }
        Err(e) => {
            let service_error = e.into_service_error();
            if service_error.is_bucket_already_owned_by_you()
                || service_error.is_bucket_already_exists()
            {
                tracing::debug!(bucket = %bucket, "Storage bucket already exists");
                Ok(())
            } else {
                Err(StorageError::BackendError(format!(
                    "failed to create bucket {}: {}",
                    bucket, service_error
                )))
            }
        }
    }
}
