//! Link Runtime - SDK loading, factory registry, and collaborator contracts
//!
//! This crate provides the low-level runtime infrastructure the session
//! manager builds on:
//!
//! - **Loader**: driving the host's script injection and observing completion
//! - **Vendor global**: the shared slot the executed script populates
//! - **Collaborator traits**: the vendor factory and session contracts
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐
//! │   link-rs    │  Session manager (reconciliation, ready/open/exit)
//! └──────┬───────┘
//!        │ consumes SdkHandle + VendorGlobal
//! ┌──────▼───────┐
//! │ link-runtime │  This crate
//! │  ┌────────┐  │
//! │  │ Loader │  │  Script injection, load-complete signal
//! │  └────────┘  │
//! │  ┌────────┐  │
//! │  │ Global │  │  VendorFactory slot
//! │  └────────┘  │
//! └──────────────┘
//! ```
//!
//! # Decoupling via VendorFactory
//!
//! The manager never touches the vendor SDK directly; it goes through the
//! [`VendorFactory`] and [`VendorSession`] traits. The host environment (or a
//! test) supplies the implementations, so nothing here requires a real
//! script-loading environment.

pub mod error;
pub mod loader;
pub mod vendor;

mod global;

pub use error::{Error, Result};
pub use global::VendorGlobal;
pub use loader::{LINK_SDK_STABLE_URL, LoadCallback, ScriptLoader, SdkHandle, load_sdk};
pub use vendor::{ExitCallback, SessionConfig, VendorFactory, VendorSession};
