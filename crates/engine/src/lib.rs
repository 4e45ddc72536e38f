//! The decision engine (spec.md component H): orchestrates the duration
//! parser, header map, block cache, rule primitives, and analyzer into
//! a single `protect` entry point, escalating to a remote `Client` when
//! local evaluation cannot decide.

mod client;
mod engine;
mod logger;
mod request;

pub use client::{Client, ClientError};
pub use engine::{Engine, EngineConfig};
pub use logger::Logger;
pub use request::{AdapterContext, Context, ExtraValue, NoBody, RequestDetails, RequestDetailsBuilder};

pub use portcullis_analyzer::{Analyzer, LocalAnalyzer};
