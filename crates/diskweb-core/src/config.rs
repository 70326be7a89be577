//! Addressing configuration.
//!
//! Centralizes the constants shared by the codec, the route table and the
//! navigator.

// =============================================================================
// Route Literals
// =============================================================================

/// Literal segment of the login route.
pub const LOGIN_SEGMENT: &str = "login";

/// Literal segment of the disk list route.
pub const DISK_SEGMENT: &str = "disk";

/// Literal segment of the post-login landing route.
pub const LANDING_SEGMENT: &str = "loged";

/// Literal segment of the partition list route.
pub const PARTITIONS_SEGMENT: &str = "partitions";

/// Literal segment of the directory listing route.
pub const FILES_SEGMENT: &str = "FilesPage";

/// Literal segment of the file view route.
pub const VIEW_SEGMENT: &str = "view";

// =============================================================================
// Route Names
// =============================================================================

/// Names of the routes in the standard table.
pub mod routes {
    /// Bare `/`, the disk list reached right after sign-in.
    pub const ROOT: &str = "root";
    pub const LOGIN: &str = "login";
    /// Explicit `/disk` disk list.
    pub const DISK: &str = "disk";
    pub const LANDING: &str = "landing";
    pub const PARTITIONS: &str = "partitions";
    pub const FILES: &str = "files";
    pub const VIEW: &str = "view";
    /// Mount without a path, redirected to [`FILES`].
    pub const FILES_BARE: &str = "files-bare";
}

// =============================================================================
// Route Parameters
// =============================================================================

/// Parameter names bound by the standard route table.
pub mod params {
    /// Disk path on the partitions route.
    pub const DISK_PATH: &str = "diskPathEncoded";
    /// Mount identifier on the directory and file routes.
    pub const MOUNT_ID: &str = "mountId";
    /// Directory path inside a mount.
    pub const INTERNAL_PATH: &str = "internalPathEncoded";
    /// File path inside a mount.
    pub const FILE_PATH: &str = "filePathEncoded";
}

// =============================================================================
// Navigation
// =============================================================================

/// Root path of a mounted filesystem, substituted by the bare-mount redirect.
pub const ROOT_INTERNAL_PATH: &str = "/";

/// Upper bound on redirects followed for a single navigation.
pub const MAX_REDIRECTS: usize = 8;

// =============================================================================
// Codec
// =============================================================================

/// Punctuation that passes through the codec unescaped (besides ASCII
/// letters and digits).
pub const UNRESERVED_MARKS: &[u8] = b"-_.!~*'()";
