//! Wan 2.2 generation worker.
//!
//! Composes the core and ComfyUI crates into a request handler: ensure
//! model weights, ensure the backend is running, build the workflow
//! for the classified mode, run the job, and shape the response.  The
//! binary in `main.rs` feeds the handler from a line-delimited JSON
//! job stream supplied by the external dispatch framework.

pub mod config;
pub mod handler;
pub mod state;
