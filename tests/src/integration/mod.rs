//! Cross-module integration tests, driven end to end over `MockTransport`.

pub mod e2e_choreography;
pub mod flows;
