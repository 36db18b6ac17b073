//! Import: sealed blob → scratch tree → fresh records → relocated attachments.
//!
//! Record data is inserted with one `insert_bulk` call, so either every
//! manifest entry becomes a record or none does. Attachment relocation runs
//! only after that commit and is best-effort: a failing directory is logged,
//! counted as skipped, and the import carries on.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tempfile::TempDir;
use tracing::{debug, info, warn};
use uuid::Uuid;
use walkdir::WalkDir;

use probdesk_core::defaults::{ARCHIVE_UPLOADS_PREFIX, IMAGE_POOL_DIR, MULTI_FILE_DELIMITER};
use probdesk_core::{
    encode_file_list, is_safe_component, AttachmentField, CreateRecordRequest, RecordStore,
};
use probdesk_crypto::{open_blob, KeyDerivation, NONCE_LEN};

use crate::archive::{record_dirs, unpack_archive};
use crate::config::BackupConfig;
use crate::error::{BackupError, BackupResult};
use crate::manifest::Manifest;

/// Outcome of a successful import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    /// Records created.
    pub record_count: usize,
    /// Old → new identity pairs recorded.
    pub mapping_count: usize,
    /// Attachment directories copied under their new identity.
    pub attachment_dirs_relocated: usize,
    /// Attachment directories skipped (no mapping, or copy failed).
    pub attachment_dirs_skipped: usize,
    /// Files copied into the shared image pool.
    pub pool_files_copied: usize,
    pub warnings: Vec<String>,
}

/// New identity of an imported record plus the attachment groups its
/// manifest entry did not carry.
#[derive(Debug, Clone)]
struct Mapped {
    new_id: i64,
    absent_fields: Vec<AttachmentField>,
}

#[derive(Debug, Default)]
struct Relocation {
    relocated: usize,
    skipped: usize,
    pool_files: usize,
    warnings: Vec<String>,
    rebuilt: Vec<(i64, AttachmentField, String)>,
}

/// Restore a blob produced by [`crate::export`].
///
/// Passphrase and blob length are checked before any decryption. The
/// scratch directory is removed on every exit path, including when the
/// returned future is dropped part way.
pub async fn import(
    store: &dyn RecordStore,
    kdf: Arc<dyn KeyDerivation>,
    config: &BackupConfig,
    passphrase: &str,
    blob: Vec<u8>,
    acting_user: Option<i64>,
) -> BackupResult<ImportSummary> {
    if passphrase.is_empty() {
        return Err(BackupError::MissingCredential);
    }
    if blob.len() < NONCE_LEN {
        return Err(BackupError::MalformedArchive(format!(
            "backup is {} bytes, at least {} required",
            blob.len(),
            NONCE_LEN
        )));
    }
    let start = Instant::now();

    // Decrypt and unpack fully before the store is touched.
    let scratch_config = config.clone();
    let passphrase_owned = passphrase.to_string();
    let (scratch, manifest_bytes) =
        tokio::task::spawn_blocking(move || -> BackupResult<(TempDir, Vec<u8>)> {
            let archive = open_blob(kdf.as_ref(), &passphrase_owned, &blob)?;
            drop(blob);
            let scratch = scratch_config.scratch_dir().map_err(|e| {
                BackupError::Filesystem(format!("Cannot create scratch directory: {}", e))
            })?;
            let manifest = unpack_archive(&archive, scratch.path())?;
            Ok((scratch, manifest))
        })
        .await?
        .map_err(|e| {
            warn!(
                subsystem = "backup",
                component = "importer",
                op = "unpack",
                error = %e,
                "Import aborted before any records were written"
            );
            e
        })?;

    let manifest = Manifest::parse(&manifest_bytes)
        .map_err(|e| BackupError::MalformedArchive(format!("Invalid manifest: {}", e)))?;
    let mut warnings = manifest.compatibility_warnings();

    // Assign tokens and build inserts in manifest order.
    let mut claimed: HashSet<Uuid> = HashSet::with_capacity(manifest.items.len());
    let mut requests: Vec<CreateRecordRequest> = Vec::with_capacity(manifest.items.len());
    let mut origins: Vec<(Option<i64>, Vec<AttachmentField>)> =
        Vec::with_capacity(manifest.items.len());
    for entry in manifest.items {
        let token = assign_token(store, &claimed, entry.public_token).await?;
        claimed.insert(token);
        origins.push((entry.id, entry.absent_attachments()));
        requests.push(entry.into_request(token, acting_user));
    }

    let new_ids = store.insert_bulk(requests).await.map_err(|e| {
        warn!(
            subsystem = "backup",
            component = "importer",
            op = "insert",
            error = %e,
            "Record insert rejected; no records were imported"
        );
        BackupError::Storage(e)
    })?;
    if new_ids.len() != origins.len() {
        return Err(BackupError::Internal(format!(
            "store returned {} identities for {} records",
            new_ids.len(),
            origins.len()
        )));
    }

    let mut mapping: HashMap<i64, Mapped> = HashMap::new();
    for ((old_id, absent_fields), new_id) in origins.into_iter().zip(new_ids.iter().copied()) {
        let Some(old_id) = old_id else { continue };
        if mapping.contains_key(&old_id) {
            warnings.push(format!(
                "Duplicate identity {} in manifest; its attachments go to the first record only",
                old_id
            ));
            continue;
        }
        debug!(
            subsystem = "backup",
            component = "importer",
            old_id,
            new_id,
            "Mapped record identity"
        );
        mapping.insert(
            old_id,
            Mapped {
                new_id,
                absent_fields,
            },
        );
    }
    let mapping_count = mapping.len();

    // The closure owns the scratch guard so the tree outlives the copy.
    let relocate_config = config.clone();
    let mut relocation = tokio::task::spawn_blocking(move || {
        let report = relocate_attachments(scratch.path(), &relocate_config, &mapping);
        drop(scratch);
        report
    })
    .await?;

    for (id, field, encoded) in relocation.rebuilt.drain(..) {
        if let Err(e) = store.update_attachment_field(id, field, &encoded).await {
            warn!(
                subsystem = "backup",
                component = "importer",
                op = "rebuild_field",
                record_id = id,
                error = %e,
                "Failed to record attachment list"
            );
            relocation
                .warnings
                .push(format!("Record {}: could not record {} files: {}", id, field, e));
        }
    }
    warnings.append(&mut relocation.warnings);

    let summary = ImportSummary {
        record_count: new_ids.len(),
        mapping_count,
        attachment_dirs_relocated: relocation.relocated,
        attachment_dirs_skipped: relocation.skipped,
        pool_files_copied: relocation.pool_files,
        warnings,
    };

    info!(
        subsystem = "backup",
        component = "importer",
        op = "import",
        acting_user,
        record_count = summary.record_count,
        mapping_count = summary.mapping_count,
        attachment_dirs_relocated = summary.attachment_dirs_relocated,
        attachment_dirs_skipped = summary.attachment_dirs_skipped,
        duration_ms = start.elapsed().as_millis() as u64,
        "Backup imported"
    );
    Ok(summary)
}

/// Keep the archived token unless it is absent or already taken.
async fn assign_token(
    store: &dyn RecordStore,
    claimed: &HashSet<Uuid>,
    archived: Option<Uuid>,
) -> BackupResult<Uuid> {
    if let Some(token) = archived {
        if !claimed.contains(&token) && !store.token_exists(token).await? {
            return Ok(token);
        }
        debug!(
            subsystem = "backup",
            component = "importer",
            "Archived public token already in use, generating a new one"
        );
    }
    loop {
        let fresh = Uuid::new_v4();
        if !claimed.contains(&fresh) && !store.token_exists(fresh).await? {
            return Ok(fresh);
        }
    }
}

fn relocate_attachments(
    scratch: &Path,
    config: &BackupConfig,
    mapping: &HashMap<i64, Mapped>,
) -> Relocation {
    let mut report = Relocation::default();
    let unpacked = scratch.join(ARCHIVE_UPLOADS_PREFIX);

    let dirs = match record_dirs(&unpacked) {
        Ok(dirs) => dirs,
        Err(e) => {
            report
                .warnings
                .push(format!("Could not list archived attachments: {}", e));
            Vec::new()
        }
    };

    for (old_id, src) in dirs {
        let Some(mapped) = mapping.get(&old_id) else {
            warn!(
                subsystem = "backup",
                component = "importer",
                op = "relocate",
                old_id,
                "No record for archived attachment directory, skipping"
            );
            report.skipped += 1;
            report.warnings.push(format!(
                "Attachments for unknown record {} were skipped",
                old_id
            ));
            continue;
        };

        let dest = config.record_dir(mapped.new_id);
        match copy_tree(&src, &dest) {
            Ok(files) => {
                debug!(
                    subsystem = "backup",
                    component = "importer",
                    op = "relocate",
                    old_id,
                    new_id = mapped.new_id,
                    file_count = files,
                    "Relocated attachment directory"
                );
                report.relocated += 1;
                for field in &mapped.absent_fields {
                    let names = list_files(&src.join(field.dir_name()));
                    if !names.is_empty() {
                        report
                            .rebuilt
                            .push((mapped.new_id, *field, encode_file_list(&names)));
                    }
                }
            }
            Err(e) => {
                warn!(
                    subsystem = "backup",
                    component = "importer",
                    op = "relocate",
                    old_id,
                    new_id = mapped.new_id,
                    error = %e,
                    "Attachment copy failed, skipping"
                );
                report.skipped += 1;
                report.warnings.push(format!(
                    "Attachments of record {} (was {}) could not be copied: {}",
                    mapped.new_id, old_id, e
                ));
            }
        }
    }

    let pool = unpacked.join(IMAGE_POOL_DIR);
    if pool.is_dir() {
        match copy_tree(&pool, &config.image_pool()) {
            Ok(files) => report.pool_files = files,
            Err(e) => {
                warn!(
                    subsystem = "backup",
                    component = "importer",
                    op = "relocate_pool",
                    error = %e,
                    "Image pool copy failed"
                );
                report
                    .warnings
                    .push(format!("Inline images could not be copied: {}", e));
            }
        }
    }

    report
}

/// Recursively copy regular files and directories from `src` into `dest`.
/// Returns the number of files copied.
fn copy_tree(src: &Path, dest: &Path) -> std::io::Result<usize> {
    fs::create_dir_all(dest)?;
    let mut files = 0;
    for entry in WalkDir::new(src).follow_links(false).min_depth(1) {
        let entry = entry.map_err(std::io::Error::from)?;
        let Ok(rel) = entry.path().strip_prefix(src) else {
            continue;
        };
        let target = dest.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else if entry.file_type().is_file() {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
            files += 1;
        }
    }
    Ok(files)
}

/// Regular file names directly inside `dir`, sorted. Missing dir yields none.
fn list_files(dir: &Path) -> Vec<String> {
    let Ok(read_dir) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut names: Vec<String> = read_dir
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
        .filter_map(|e| e.file_name().to_str().map(str::to_string))
        .filter(|name| is_safe_component(name) && !name.contains(MULTI_FILE_DELIMITER))
        .collect();
    names.sort();
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(path: &Path, contents: &[u8]) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_copy_tree_preserves_structure() {
        let src = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        write(&src.path().join("root_cause/a.txt"), b"a");
        write(&src.path().join("others/deep/b.txt"), b"b");

        let copied = copy_tree(src.path(), &dest.path().join("9")).unwrap();

        assert_eq!(copied, 2);
        assert_eq!(fs::read(dest.path().join("9/root_cause/a.txt")).unwrap(), b"a");
        assert_eq!(fs::read(dest.path().join("9/others/deep/b.txt")).unwrap(), b"b");
    }

    #[test]
    fn test_list_files_sorted() {
        let dir = TempDir::new().unwrap();
        write(&dir.path().join("b.txt"), b"");
        write(&dir.path().join("a.txt"), b"");
        fs::create_dir(dir.path().join("sub")).unwrap();

        assert_eq!(list_files(dir.path()), vec!["a.txt", "b.txt"]);
        assert!(list_files(&dir.path().join("missing")).is_empty());
    }

    #[test]
    fn test_relocate_skips_unmapped_and_rebuilds_absent_fields() {
        let scratch = TempDir::new().unwrap();
        let uploads = TempDir::new().unwrap();
        write(&scratch.path().join("uploads/5/solutions/z.txt"), b"z");
        write(&scratch.path().join("uploads/5/solutions/y.txt"), b"y");
        write(&scratch.path().join("uploads/6/others/orphan.txt"), b"o");
        write(&scratch.path().join("uploads/upload_images/p.png"), b"p");

        let mut mapping = HashMap::new();
        mapping.insert(
            5,
            Mapped {
                new_id: 50,
                absent_fields: vec![AttachmentField::Solutions, AttachmentField::Others],
            },
        );
        let config = BackupConfig::new(uploads.path());
        let report = relocate_attachments(scratch.path(), &config, &mapping);

        assert_eq!(report.relocated, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.pool_files, 1);
        assert_eq!(
            report.rebuilt,
            vec![(50, AttachmentField::Solutions, "y.txt|||z.txt".to_string())]
        );
        assert!(uploads.path().join("50/solutions/z.txt").is_file());
        assert!(!uploads.path().join("6").exists());
        assert!(uploads.path().join("upload_images/p.png").is_file());
    }
}
