// Durable storage seams: the blob store for report artifacts and the
// metadata store for report records. Both are traits so the pipeline can be
// exercised against in-memory implementations.

pub mod blob;
pub mod reports;

pub use blob::{BlobMetadata, BlobStore, MemoryBlobStore, S3BlobStore};
pub use reports::{
    AnalyticsFilter, CompletionPatch, MemoryReportStore, PgReportStore, ReportAnalytics,
    ReportStore,
};
