//! Pushlink: cross-context messaging core for an embeddable web push SDK
//!
//! A host page talks to hidden proxy iframes, subscription popups and modal
//! prompts served from a service origin. This crate classifies which role a
//! browsing context plays, runs origin-checked request/reply channels between
//! them, forwards lifecycle events back to the host, and proxies storage and
//! permission calls across the boundary.

pub mod api_client;
pub mod cli;
pub mod collaborators;
pub mod config;
pub mod context;
pub mod environment;
pub mod error;
pub mod events;
pub mod frames;
pub mod logging;
pub mod messenger;
pub mod remote;
#[cfg(any(test, feature = "testing"))]
pub mod sim;
pub mod storage;
