//! `RequestDetails` and `Context` (spec.md §3) plus the adapter contract
//! (spec.md §6) an HTTP framework integration must satisfy.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use portcullis_primitives::HeaderMap;

use crate::logger::Logger;

/// A value an adapter hands the engine for an unrecognized top-level
/// field; collected into `RequestDetails::extra` via stringification.
#[derive(Debug, Clone)]
pub enum ExtraValue {
    String(String),
    Number(f64),
    Bool(bool),
    Other,
}

impl ExtraValue {
    /// spec.md §3: numbers become decimal, booleans `"true"`/`"false"`,
    /// anything else the literal `"<unsupported value>"`.
    pub fn stringify(&self) -> String {
        match self {
            ExtraValue::String(s) => s.clone(),
            ExtraValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    n.to_string()
                }
            }
            ExtraValue::Bool(b) => b.to_string(),
            ExtraValue::Other => "<unsupported value>".to_string(),
        }
    }
}

/// Immutable snapshot built once at the start of `protect` (spec.md §3).
/// Frozen before any rule sees it — nothing here is mutable.
#[derive(Debug, Clone, Default)]
pub struct RequestDetails {
    pub ip: Option<String>,
    pub method: Option<String>,
    pub protocol: Option<String>,
    pub host: Option<String>,
    pub path: Option<String>,
    pub headers: HeaderMap,
    pub cookies: Option<String>,
    pub query: Option<String>,
    pub email: Option<String>,
    /// Every property supplied beyond the known set, stringified.
    pub extra: HashMap<String, String>,
}

#[derive(Debug, Clone, Default)]
pub struct RequestDetailsBuilder {
    details: RequestDetails,
}

impl RequestDetailsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ip(mut self, v: impl Into<String>) -> Self {
        self.details.ip = Some(v.into());
        self
    }

    pub fn method(mut self, v: impl Into<String>) -> Self {
        self.details.method = Some(v.into());
        self
    }

    pub fn protocol(mut self, v: impl Into<String>) -> Self {
        self.details.protocol = Some(v.into());
        self
    }

    pub fn host(mut self, v: impl Into<String>) -> Self {
        self.details.host = Some(v.into());
        self
    }

    pub fn path(mut self, v: impl Into<String>) -> Self {
        self.details.path = Some(v.into());
        self
    }

    pub fn headers(mut self, v: HeaderMap) -> Self {
        self.details.headers = v;
        self
    }

    pub fn cookies(mut self, v: impl Into<String>) -> Self {
        self.details.cookies = Some(v.into());
        self
    }

    pub fn query(mut self, v: impl Into<String>) -> Self {
        self.details.query = Some(v.into());
        self
    }

    pub fn email(mut self, v: impl Into<String>) -> Self {
        self.details.email = Some(v.into());
        self
    }

    pub fn extra(mut self, name: impl Into<String>, value: ExtraValue) -> Self {
        self.details.extra.insert(name.into(), value.stringify());
        self
    }

    pub fn build(self) -> RequestDetails {
        self.details
    }
}

/// Lazily yields the request body as text. Implemented by the adapter
/// because some platforms can only read the body stream once.
#[async_trait]
pub trait AdapterContext: Send + Sync {
    async fn get_body(&self) -> Option<String>;
}

/// An adapter that never has a body to offer (used when the engine is
/// wired up without one, or in tests that don't exercise SENSITIVE_INFO).
pub struct NoBody;

#[async_trait]
impl AdapterContext for NoBody {
    async fn get_body(&self) -> Option<String> {
        None
    }
}

/// Immutable, passed to every rule (spec.md §3). Built once per
/// `protect` call after the fingerprint is computed.
#[derive(Clone)]
pub struct Context {
    pub key: String,
    pub fingerprint: String,
    pub characteristics: Vec<String>,
    pub runtime: String,
    pub log: Arc<dyn Logger>,
    pub adapter: Arc<dyn AdapterContext>,
}

impl Context {
    pub async fn get_body(&self) -> Option<String> {
        self.adapter.get_body().await
    }
}
