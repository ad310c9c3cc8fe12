//! This module defines traits for external dependencies (the cf CLI and the filesystem) to make them
//! easier to mock and substitute in tests or other environments. By abstracting external services
//! behind traits, components can be decoupled and dependency-injected, improving testability and maintainability.
pub mod fs;
pub mod platform;

pub use fs::*;
pub use platform::*;

#[cfg(test)]
pub mod mocks {
    pub use super::fs::mocks::*;
    pub use super::platform::mocks::*;
}
