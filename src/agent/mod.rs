//! Multi-agent supervisor for the e-invoicing assistant.
//!
//! Routes each question to one or more specialist agents backed by remote
//! inference workflows, runs them, and merges their answers.
//!
//! # Architecture
//!
//! ```text
//! User query → Supervisor
//!   ├── Router (keyword rules, or supervisor workflow with rule fallback)
//!   ├── AgentExecutor
//!   │   └── single | parallel | sequential calls through the Escalator
//!   │       └── RetryingProvider → OpenArenaProvider
//!   └── Synthesizer (concatenation, or supervisor workflow with fallback)
//! ```

pub mod client;
pub mod config;
pub mod escalator;
pub mod executor;
pub mod message;
pub mod orchestrator;
pub mod prompt;
pub mod provider;
pub mod providers;
pub mod result;
pub mod roster;
pub mod router;
pub mod strategy;
pub mod synthesizer;

// Re-export key types
pub use client::{AgentClient, ClientCache, RetryingProvider, create_provider};
pub use config::{AgentConfig, ReportDeadlines, RoutingPolicy};
pub use escalator::{DeadlinePolicy, Escalator};
pub use executor::AgentExecutor;
pub use message::{
    ContextSection, Credentials, Inference, InferenceCall, PageContext, ReportContext,
};
pub use orchestrator::{Supervisor, SupervisorSettings};
pub use provider::InferenceProvider;
pub use result::{AgentResult, AgentResults, ChatAnswer, ChatMetadata};
pub use roster::{AgentDescriptor, Roster};
pub use router::route_by_rules;
pub use strategy::{Complexity, ExecutionStrategy, Mode};
