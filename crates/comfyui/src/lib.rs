//! ComfyUI integration for the Wan 2.2 generation worker.
//!
//! Provides the REST API client, the typed workflow (job graph)
//! builder for the two supported generation modes, model-weight
//! provisioning, backend subprocess supervision, and the submit/poll
//! job runner.

pub mod api;
pub mod provision;
pub mod runner;
pub mod server;
pub mod workflow;
