//! Native client for the e-library REST API
//!
//! Covers highlights, reading progress, reading sessions and sign-in. The
//! client implements [`annotation_core::HighlightStore`], so a
//! [`annotation_core::ReaderSession`] can persist through it directly.

pub mod client;
pub mod config;
pub mod error;
pub mod session;

pub use client::{ApiClient, Credentials, LoginResponse, TokenPair};
pub use config::{ClientConfig, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
pub use error::{ClientError, Result};
pub use session::{SessionFile, SharedSession};
