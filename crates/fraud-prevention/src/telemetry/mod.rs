//! Structured logging setup.
//!
//! # Telemetry invariants
//!
//! - **No PII, key material or ciphertext** may appear in any span attribute
//!   or log field. Log slugs, counts and error kinds only.
//! - Log level is configurable via `PII_LOG_LEVEL` (default: `info`), and
//!   `RUST_LOG` overrides it.

pub mod init;

pub use init::init_tracing;
