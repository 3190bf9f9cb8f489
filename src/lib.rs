/// x11link - Dynamically loaded libX11 bindings
///
/// This library resolves a small slice of Xlib at runtime through the
/// platform's dynamic loader and exposes it as an immutable function
/// table, together with the shared utility layer such bindings need:
/// cross-platform library loading, version-string parsing, token tables
/// for debug display, and scratch memory for staging call arguments.

pub mod config;
pub mod error;
pub mod loader;
pub mod stack;
pub mod tokens;
pub mod version;
pub mod xlib;

pub use config::Config;
pub use error::{Error, Result};
pub use loader::{Platform, SharedLibrary};
pub use stack::MemoryStack;
pub use version::ApiVersion;
pub use xlib::Xlib;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
