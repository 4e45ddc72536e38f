//! The remote `Client` interface (spec.md §4.F, §6): the authoritative
//! decision service and its fire-and-forget reporting sink. No
//! production implementation ships here — the transport is an adapter
//! concern (spec.md §1's "out of scope" list).

use async_trait::async_trait;
use portcullis_primitives::Decision;
use portcullis_rules::Rule;
use thiserror::Error;

use crate::request::{Context, RequestDetails};

#[derive(Debug, Error)]
#[error("remote decide failed: {0}")]
pub struct ClientError(pub String);

impl ClientError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Authoritative decision service plus fire-and-forget reporting
/// (spec.md §4.F). `decide` failure is recovered by the engine into a
/// fail-open ERROR decision; `report` failure is logged and never
/// surfaced (spec.md §7, §9).
#[async_trait]
pub trait Client: Send + Sync {
    async fn decide(
        &self,
        ctx: &Context,
        details: &RequestDetails,
        rules: &[Rule],
    ) -> Result<Decision, ClientError>;

    async fn report(
        &self,
        ctx: &Context,
        details: &RequestDetails,
        decision: &Decision,
        rules: &[Rule],
    );
}
