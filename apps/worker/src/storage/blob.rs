#![allow(dead_code)]

//! Blob storage for report artifacts.
//!
//! Every write computes a sha256 of the bytes and stores it alongside the
//! object; `verify_integrity` re-reads the object, recomputes the hash, and
//! compares. A mismatch is an integrity failure, never a silent success.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use sha2::{Digest, Sha256};
use tracing::info;

use crate::errors::ReportError;

/// Object metadata recorded with every artifact write.
#[derive(Debug, Clone)]
pub struct BlobMetadata {
    pub report_type: String,
    pub job_id: String,
    pub resume_id: String,
    pub generated_by: String,
    pub mime_type: String,
    pub encoding: String,
}

impl BlobMetadata {
    fn pairs(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("report-type", &self.report_type),
            ("job-id", &self.job_id),
            ("resume-id", &self.resume_id),
            ("generated-by", &self.generated_by),
            ("encoding", &self.encoding),
        ]
    }
}

/// Hex-encoded sha256 digest of a byte slice.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Writes bytes and returns an opaque location id.
    async fn save(
        &self,
        bytes: &[u8],
        filename: &str,
        metadata: &BlobMetadata,
    ) -> Result<String, ReportError>;

    /// Reads the bytes stored at a location.
    async fn get(&self, location: &str) -> Result<Bytes, ReportError>;

    /// Re-reads the object and compares the recomputed hash against the hash
    /// stored at write time.
    async fn verify_integrity(&self, location: &str) -> Result<bool, ReportError>;
}

// ────────────────────────────────────────────────────────────────────────────
// S3 implementation
// ────────────────────────────────────────────────────────────────────────────

pub struct S3BlobStore {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3BlobStore {
    pub fn new(client: aws_sdk_s3::Client, bucket: String) -> Self {
        Self { client, bucket }
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn save(
        &self,
        bytes: &[u8],
        filename: &str,
        metadata: &BlobMetadata,
    ) -> Result<String, ReportError> {
        let key = format!(
            "reports/{}/{}/{}",
            metadata.job_id, metadata.resume_id, filename
        );
        let content_hash = sha256_hex(bytes);

        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(bytes.to_vec()))
            .content_type(&metadata.mime_type)
            .metadata("content-hash", &content_hash);
        for (name, value) in metadata.pairs() {
            request = request.metadata(name, value);
        }
        request
            .send()
            .await
            .map_err(|e| ReportError::Storage(format!("S3 upload failed: {e}")))?;

        info!("Uploaded report artifact to s3://{}/{}", self.bucket, key);
        Ok(key)
    }

    async fn get(&self, location: &str) -> Result<Bytes, ReportError> {
        let object = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(location)
            .send()
            .await
            .map_err(|e| ReportError::Storage(format!("S3 read failed: {e}")))?;
        let data = object
            .body
            .collect()
            .await
            .map_err(|e| ReportError::Storage(format!("S3 body read failed: {e}")))?;
        Ok(data.into_bytes())
    }

    async fn verify_integrity(&self, location: &str) -> Result<bool, ReportError> {
        let head = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(location)
            .send()
            .await
            .map_err(|e| ReportError::Storage(format!("S3 head failed: {e}")))?;
        let stored = head
            .metadata()
            .and_then(|m| m.get("content-hash").cloned());
        let Some(stored) = stored else {
            return Ok(false);
        };
        let bytes = self.get(location).await?;
        Ok(sha256_hex(&bytes) == stored)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// In-memory implementation (tests, local development)
// ────────────────────────────────────────────────────────────────────────────

struct StoredBlob {
    bytes: Vec<u8>,
    content_hash: String,
}

#[derive(Default)]
pub struct MemoryBlobStore {
    objects: Mutex<HashMap<String, StoredBlob>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flips a byte of a stored object. Integrity-check tests only.
    pub fn corrupt(&self, location: &str) {
        let mut objects = self.objects.lock().expect("blob lock poisoned");
        if let Some(blob) = objects.get_mut(location) {
            if let Some(byte) = blob.bytes.first_mut() {
                *byte ^= 0xff;
            }
        }
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn save(
        &self,
        bytes: &[u8],
        filename: &str,
        metadata: &BlobMetadata,
    ) -> Result<String, ReportError> {
        let key = format!(
            "reports/{}/{}/{}",
            metadata.job_id, metadata.resume_id, filename
        );
        let mut objects = self.objects.lock().expect("blob lock poisoned");
        objects.insert(
            key.clone(),
            StoredBlob {
                bytes: bytes.to_vec(),
                content_hash: sha256_hex(bytes),
            },
        );
        Ok(key)
    }

    async fn get(&self, location: &str) -> Result<Bytes, ReportError> {
        let objects = self.objects.lock().expect("blob lock poisoned");
        objects
            .get(location)
            .map(|blob| Bytes::from(blob.bytes.clone()))
            .ok_or_else(|| ReportError::Storage(format!("blob not found: {location}")))
    }

    async fn verify_integrity(&self, location: &str) -> Result<bool, ReportError> {
        let objects = self.objects.lock().expect("blob lock poisoned");
        let blob = objects
            .get(location)
            .ok_or_else(|| ReportError::Storage(format!("blob not found: {location}")))?;
        Ok(sha256_hex(&blob.bytes) == blob.content_hash)
    }
}
