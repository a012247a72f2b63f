// Event Intake & Dedup Guard
// Implements: inbound event validation, at-most-one-concurrent-processing
// per dedup key, pipeline dispatch, and outbound event publication.

pub mod bus;
pub mod dedup;
pub mod intake;
pub mod messages;

pub use bus::{EventPublisher, OutboundEvent, RedisEventBus};
pub use dedup::DedupGuard;
pub use intake::EventIntake;
pub use messages::{
    MatchScored, ReportGenerated, ReportGenerationFailed, ReportGenerationRequested, ReportType,
};
