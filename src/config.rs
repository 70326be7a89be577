//! Application configuration.
//!
//! Centralizes the constants used by the web shell. Addressing constants
//! live in `diskweb_core::config`.

/// Application name shown in the header.
pub const APP_NAME: &str = "diskweb";

/// Path the application is served under (`/` at the domain root).
pub const BASE_PATH: &str = "/";

/// Id of the element the app mounts into.
pub const MOUNT_ELEMENT_ID: &str = "app";
