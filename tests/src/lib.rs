//! # DGT-Link Test Suite
//!
//! Unified test crate for the gateway protocol engine.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── flows.rs             # Command round trips over the mock transport
//!     └── e2e_choreography.rs  # Full session life cycles and load
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p dgt-link-tests
//!
//! # By category
//! cargo test -p dgt-link-tests integration::flows::
//! cargo test -p dgt-link-tests integration::e2e_choreography::
//! ```

#![allow(unused_variables)]
#![allow(unused_imports)]
#![allow(dead_code)]

pub mod integration;
