//! Centralized default constants for probdesk.
//!
//! Shared by the store, the backup subsystem, and the HTTP layer. Values that
//! are part of the on-disk or in-archive format must not change without a
//! migration path for existing backups.

// =============================================================================
// ATTACHMENTS
// =============================================================================

/// Delimiter joining stored filenames inside one attachment field.
pub const MULTI_FILE_DELIMITER: &str = "|||";

/// Shared inline-image pool directory under the uploads root.
pub const IMAGE_POOL_DIR: &str = "upload_images";

/// Fallback used when sanitizing leaves nothing of a filename.
pub const UNNAMED_FILE: &str = "unnamed_file";

/// Maximum stored filename length in bytes.
pub const MAX_FILENAME_LEN: usize = 255;

// =============================================================================
// BACKUP ARCHIVE
// =============================================================================

/// Archive entry holding the manifest payload.
pub const MANIFEST_ENTRY: &str = "data.json";

/// Archive directory prefix for attachment trees and the image pool.
pub const ARCHIVE_UPLOADS_PREFIX: &str = "uploads";

/// Manifest format version written by this build.
pub const MANIFEST_FORMAT_VERSION: u32 = 1;

/// Suggested filename prefix for downloaded backups.
pub const BACKUP_FILENAME_PREFIX: &str = "problems_backup";

// =============================================================================
// SERVER
// =============================================================================

/// Default bind host.
pub const SERVER_HOST: &str = "0.0.0.0";

/// Default bind port.
pub const SERVER_PORT: u16 = 3000;

/// Default uploads root for attachment trees.
pub const UPLOADS_ROOT: &str = "/var/lib/probdesk/uploads";

/// Default maximum accepted upload size (2 GiB).
pub const MAX_UPLOAD_BYTES: usize = 2 * 1024 * 1024 * 1024;
