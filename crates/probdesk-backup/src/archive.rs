//! Archive packing and unpacking (tar + gzip).
//!
//! Layout:
//!
//! ```text
//! data.json
//! uploads/{old_record_id}/{field}/{filename}
//! uploads/upload_images/{filename}
//! ```

use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Component, Path, PathBuf};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use tracing::{debug, trace};
use walkdir::WalkDir;

use probdesk_core::defaults::{ARCHIVE_UPLOADS_PREFIX, IMAGE_POOL_DIR, MANIFEST_ENTRY};

use crate::error::{BackupError, BackupResult};

/// Whether a directory name is a record identity in canonical form.
///
/// Leading zeros are rejected so that `0123` never aliases record 123.
pub fn is_record_dir_name(name: &str) -> bool {
    !name.is_empty()
        && name.bytes().all(|b| b.is_ascii_digit())
        && (name == "0" || !name.starts_with('0'))
        && name.parse::<i64>().is_ok()
}

/// Record directories directly under `root`, as `(identity, path)` sorted by identity.
///
/// A missing root yields an empty list. Symlinks are never followed.
pub fn record_dirs(root: &Path) -> io::Result<Vec<(i64, PathBuf)>> {
    let read_dir = match fs::read_dir(root) {
        Ok(rd) => rd,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut dirs = Vec::new();
    for entry in read_dir {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if is_record_dir_name(name) {
            if let Ok(id) = name.parse::<i64>() {
                dirs.push((id, entry.path()));
            }
        }
    }
    dirs.sort_by_key(|(id, _)| *id);
    Ok(dirs)
}

// =============================================================================
// BUILD
// =============================================================================

/// Pack the manifest plus every record directory and the image pool under
/// `uploads_root` into a gzip-compressed tar stream held in memory.
pub fn build_archive(manifest: &[u8], uploads_root: &Path) -> BackupResult<Vec<u8>> {
    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut tar = tar::Builder::new(encoder);

    add_bytes_to_archive(&mut tar, MANIFEST_ENTRY, manifest)?;

    let mut file_count = 0usize;
    let dirs = record_dirs(uploads_root).map_err(|e| {
        BackupError::Filesystem(format!("Cannot list {}: {}", uploads_root.display(), e))
    })?;
    for (id, path) in &dirs {
        let prefix = format!("{}/{}", ARCHIVE_UPLOADS_PREFIX, id);
        file_count += add_directory_to_archive(&mut tar, path, &prefix)?;
    }

    let pool = uploads_root.join(IMAGE_POOL_DIR);
    if is_real_dir(&pool) {
        let prefix = format!("{}/{}", ARCHIVE_UPLOADS_PREFIX, IMAGE_POOL_DIR);
        file_count += add_directory_to_archive(&mut tar, &pool, &prefix)?;
    }

    let encoder = tar
        .into_inner()
        .map_err(|e| BackupError::Internal(format!("Failed to finalize archive: {}", e)))?;
    let bytes = encoder
        .finish()
        .map_err(|e| BackupError::Internal(format!("Failed to compress archive: {}", e)))?;

    debug!(
        subsystem = "backup",
        component = "archive",
        op = "pack",
        record_dirs = dirs.len(),
        file_count,
        byte_len = bytes.len(),
        "Archive packed"
    );
    Ok(bytes)
}

fn is_real_dir(path: &Path) -> bool {
    fs::symlink_metadata(path)
        .map(|m| m.file_type().is_dir())
        .unwrap_or(false)
}

fn add_bytes_to_archive<W: Write>(
    tar: &mut tar::Builder<W>,
    name: &str,
    data: &[u8],
) -> BackupResult<()> {
    let mut header = tar::Header::new_gnu();
    header.set_size(data.len() as u64);
    header.set_mode(0o644);
    header.set_mtime(chrono::Utc::now().timestamp() as u64);
    header.set_cksum();
    tar.append_data(&mut header, name, data)
        .map_err(|e| BackupError::Internal(format!("Failed to add {}: {}", name, e)))
}

/// Add a directory subtree. Returns the number of regular files added.
fn add_directory_to_archive<W: Write>(
    tar: &mut tar::Builder<W>,
    dir: &Path,
    archive_prefix: &str,
) -> BackupResult<usize> {
    let mut files = 0;
    append_dir_entry(tar, archive_prefix)?;

    for entry in WalkDir::new(dir)
        .follow_links(false)
        .min_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| {
            BackupError::Filesystem(format!("Cannot walk {}: {}", dir.display(), e))
        })?;
        let Some(archive_path) = archive_name(archive_prefix, dir, entry.path()) else {
            continue;
        };

        let file_type = entry.file_type();
        if file_type.is_dir() {
            append_dir_entry(tar, &archive_path)?;
        } else if file_type.is_file() {
            append_file_entry(tar, entry.path(), &archive_path)?;
            files += 1;
        } else {
            trace!(
                subsystem = "backup",
                component = "archive",
                path = %entry.path().display(),
                "Skipping non-regular file"
            );
        }
    }
    Ok(files)
}

fn archive_name(prefix: &str, base: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(base).ok()?;
    let mut name = prefix.to_string();
    for component in rel.components() {
        match component {
            Component::Normal(part) => {
                name.push('/');
                name.push_str(part.to_str()?);
            }
            _ => return None,
        }
    }
    Some(name)
}

fn append_dir_entry<W: Write>(tar: &mut tar::Builder<W>, name: &str) -> BackupResult<()> {
    let mut header = tar::Header::new_gnu();
    header.set_entry_type(tar::EntryType::Directory);
    header.set_size(0);
    header.set_mode(0o755);
    header.set_mtime(chrono::Utc::now().timestamp() as u64);
    header.set_cksum();
    tar.append_data(&mut header, name, io::empty())
        .map_err(|e| BackupError::Internal(format!("Failed to add {}: {}", name, e)))
}

fn append_file_entry<W: Write>(
    tar: &mut tar::Builder<W>,
    path: &Path,
    name: &str,
) -> BackupResult<()> {
    let mut file = File::open(path)
        .map_err(|e| BackupError::Filesystem(format!("Cannot open {}: {}", path.display(), e)))?;
    let metadata = file
        .metadata()
        .map_err(|e| BackupError::Filesystem(format!("Cannot stat {}: {}", path.display(), e)))?;

    let mut header = tar::Header::new_gnu();
    header.set_size(metadata.len());
    header.set_mode(0o644);
    header.set_mtime(
        metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
            .map(|d| d.as_secs())
            .unwrap_or(0),
    );
    header.set_cksum();

    tar.append_data(&mut header, name, &mut file)
        .map_err(|e| BackupError::Filesystem(format!("Failed to archive {}: {}", name, e)))?;
    trace!(subsystem = "backup", component = "archive", entry = name, "Added file");
    Ok(())
}

// =============================================================================
// READ
// =============================================================================

/// An entry that cannot be materialized, e.g. a file where an earlier
/// entry put a directory. Only the in-archive path is reported.
fn unpack_conflict(rel: &Path, e: io::Error) -> BackupError {
    BackupError::MalformedArchive(format!("Cannot unpack {}: {}", rel.display(), e.kind()))
}

/// Unpack an archive into `scratch` and return the manifest bytes.
///
/// Every entry is validated before anything is written: absolute paths,
/// parent references, and entry types other than regular files and
/// directories fail the whole unpack. The manifest is kept in memory and
/// not written to `scratch`.
pub fn unpack_archive(bytes: &[u8], scratch: &Path) -> BackupResult<Vec<u8>> {
    let mut tar = tar::Archive::new(GzDecoder::new(bytes));
    let mut manifest: Option<Vec<u8>> = None;
    let mut file_count = 0usize;

    let entries = tar
        .entries()
        .map_err(|e| BackupError::MalformedArchive(format!("Cannot read entries: {}", e)))?;
    for entry in entries {
        let mut entry = entry
            .map_err(|e| BackupError::MalformedArchive(format!("Entry read failed: {}", e)))?;
        let path = entry
            .path()
            .map_err(|e| BackupError::MalformedArchive(format!("Invalid entry path: {}", e)))?
            .into_owned();
        let rel = safe_relative_path(&path)?;
        if rel.as_os_str().is_empty() {
            continue;
        }

        let entry_type = entry.header().entry_type();
        if entry_type == tar::EntryType::XGlobalHeader {
            continue;
        }

        if rel == Path::new(MANIFEST_ENTRY) {
            if !entry_type.is_file() {
                return Err(BackupError::MalformedArchive(format!(
                    "{} is not a regular file",
                    MANIFEST_ENTRY
                )));
            }
            let mut data = Vec::new();
            entry.read_to_end(&mut data).map_err(|e| {
                BackupError::MalformedArchive(format!("Cannot read {}: {}", MANIFEST_ENTRY, e))
            })?;
            manifest = Some(data);
            continue;
        }

        let dest = scratch.join(&rel);
        if entry_type.is_dir() {
            fs::create_dir_all(&dest).map_err(|e| unpack_conflict(&rel, e))?;
        } else if entry_type.is_file() {
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent).map_err(|e| unpack_conflict(&rel, e))?;
            }
            let mut output = File::create(&dest).map_err(|e| unpack_conflict(&rel, e))?;
            io::copy(&mut entry, &mut output).map_err(|e| {
                BackupError::MalformedArchive(format!("Extract of {} failed: {}", rel.display(), e))
            })?;
            file_count += 1;
        } else {
            return Err(BackupError::MalformedArchive(format!(
                "Unsupported entry type for {}",
                rel.display()
            )));
        }
    }

    let manifest = manifest.ok_or_else(|| {
        BackupError::MalformedArchive(format!("No {} in archive", MANIFEST_ENTRY))
    })?;

    debug!(
        subsystem = "backup",
        component = "archive",
        op = "unpack",
        file_count,
        byte_len = bytes.len(),
        "Archive unpacked"
    );
    Ok(manifest)
}

/// Normalize an entry path, rejecting anything that could leave the scratch root.
fn safe_relative_path(path: &Path) -> BackupResult<PathBuf> {
    let mut rel = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => rel.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(BackupError::MalformedArchive(format!(
                    "Unsafe path in archive: {}",
                    path.display()
                )));
            }
        }
    }
    Ok(rel)
}
