//! Testing infrastructure for mrgate.
//!
//! - **Mocks**: an in-memory diff source with failure injection and a
//!   recording report sink
//! - **Fixtures**: canned merge requests and temporary projects (test-only)
//! - **Assertions**: finding-level assertions
//!
//! # Example
//!
//! ```rust,ignore
//! use mrgate::testing::{MockDiffSource, RecordingSink};
//!
//! let source = MockDiffSource::new()
//!     .with_title("feat: add login")
//!     .failing_file("lib/login_page.dart");
//! let sink = RecordingSink::failing();
//! ```

pub mod assertions;
#[cfg(test)]
pub mod fixtures;
pub mod mocks;

pub use assertions::*;
#[cfg(test)]
pub use fixtures::*;
pub use mocks::*;
