//! [`ObjectBackend`] implementation on top of the AWS S3 SDK.
//!
//! Works with AWS S3 and S3-compatible stores (MinIO, R2, Ceph) through the
//! endpoint override and path-style addressing switches.

use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::operation::get_object::GetObjectOutput;
use aws_sdk_s3::primitives::ByteStream;
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::backend::{
    FetchError, FetchErrorKind, FetchFuture, FetchRequest, FetchResult, ObjectBackend, ObjectBody,
};
use crate::config::BackendConfig;
use crate::error::BackendInitError;

/// Provider name attached to the static credentials of every domain.
const CREDENTIALS_PROVIDER: &str = "bucketfront-config";

/// S3 client bound to one domain's bucket settings.
#[derive(Debug, Clone)]
pub struct S3Backend {
    client: aws_sdk_s3::Client,
}

impl S3Backend {
    /// Build a client from a domain's configuration.
    ///
    /// The configuration is validated first so that a broken domain aborts
    /// startup instead of failing every request later.
    pub fn new(domain: &str, config: &BackendConfig) -> Result<Self, BackendInitError> {
        validate(domain, config)?;

        let credentials = Credentials::new(
            config.access_key.clone(),
            config.secret_key.clone(),
            None,
            None,
            CREDENTIALS_PROVIDER,
        );

        let mut builder = aws_sdk_s3::config::Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials)
            .force_path_style(config.use_path_style);
        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint.clone());
        }

        debug!(
            domain,
            bucket = %config.bucket,
            region = %config.region,
            endpoint = ?config.endpoint,
            path_style = config.use_path_style,
            "built S3 client"
        );

        Ok(Self {
            client: aws_sdk_s3::Client::from_conf(builder.build()),
        })
    }
}

impl ObjectBackend for S3Backend {
    fn get_object(&self, request: FetchRequest) -> FetchFuture<'_> {
        Box::pin(async move {
            let output = self
                .client
                .get_object()
                .bucket(request.bucket)
                .key(request.key)
                .set_range(request.range)
                .send()
                .await
                .map_err(|err| {
                    FetchError::new(classify(&err), DisplayErrorContext(&err).to_string())
                })?;

            Ok(fetch_result(output))
        })
    }
}

/// Translate an SDK response into backend-neutral metadata and body.
fn fetch_result(output: GetObjectOutput) -> FetchResult {
    FetchResult {
        content_type: output.content_type().map(str::to_owned),
        content_length: output.content_length(),
        etag: output.e_tag().map(str::to_owned),
        last_modified: output
            .last_modified()
            .and_then(|t| DateTime::<Utc>::from_timestamp(t.secs(), t.subsec_nanos())),
        cache_control: output.cache_control().map(str::to_owned),
        content_range: output.content_range().map(str::to_owned),
        body: object_body(output.body),
    }
}

/// Check the fields the SDK would otherwise only reject at request time.
fn validate(domain: &str, config: &BackendConfig) -> Result<(), BackendInitError> {
    let missing = |field| BackendInitError::MissingField {
        domain: domain.to_owned(),
        field,
    };

    if config.bucket.trim().is_empty() {
        return Err(missing("bucket"));
    }
    if config.region.trim().is_empty() {
        return Err(missing("region"));
    }

    if let Some(endpoint) = &config.endpoint {
        let invalid = |reason: String| BackendInitError::InvalidEndpoint {
            domain: domain.to_owned(),
            endpoint: endpoint.clone(),
            reason,
        };

        let uri: http::Uri = endpoint.parse().map_err(|e| invalid(format!("{e}")))?;
        match uri.scheme_str() {
            Some("http" | "https") => {}
            Some(other) => return Err(invalid(format!("unsupported scheme `{other}`"))),
            None => return Err(invalid("missing scheme".to_owned())),
        }
        if uri.host().is_none_or(str::is_empty) {
            return Err(invalid("missing host".to_owned()));
        }
    }

    Ok(())
}

/// Classify an SDK failure for diagnostics.
fn classify<E, R>(err: &SdkError<E, R>) -> FetchErrorKind
where
    E: ProvideErrorMetadata,
{
    match err {
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) => FetchErrorKind::Network,
        SdkError::ServiceError(service) => kind_from_code(service.err().code()),
        _ => FetchErrorKind::Other,
    }
}

fn kind_from_code(code: Option<&str>) -> FetchErrorKind {
    match code {
        Some("NoSuchKey" | "NoSuchBucket" | "NotFound") => FetchErrorKind::NotFound,
        Some("AccessDenied" | "InvalidAccessKeyId" | "SignatureDoesNotMatch" | "Forbidden") => {
            FetchErrorKind::AccessDenied
        }
        Some("InvalidRange") => FetchErrorKind::InvalidRange,
        _ => FetchErrorKind::Other,
    }
}

/// Adapt the SDK byte stream to an [`ObjectBody`], chunk by chunk.
fn object_body(body: ByteStream) -> ObjectBody {
    Box::pin(futures::stream::unfold(body, |mut body| async move {
        let chunk = body.next().await?;
        Some((chunk.map_err(std::io::Error::other), body))
    }))
}
