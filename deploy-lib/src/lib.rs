pub mod config;
pub mod loader;
pub mod permissions;
pub mod registry;
pub mod session;
pub mod sync;
