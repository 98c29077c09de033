//! labref-common — Shared error type and HTTP plumbing used across all labref crates.

pub mod error;
pub mod sandbox;

pub use error::{LabrefError, Result};
pub use sandbox::SandboxClient;
