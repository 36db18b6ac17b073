//! Manifest payload stored as `data.json` inside a backup archive.
//!
//! Entries are field-named JSON objects. Every field except `title` may be
//! absent and is defaulted on read, so archives written by older builds (or
//! by the original bare-array export) stay importable.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use probdesk_core::defaults::MANIFEST_FORMAT_VERSION;
use probdesk_core::{AttachmentField, CreateRecordRequest, EditorType, Record};

/// Version of the application writing manifests.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Snapshot of one record at export time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Identity in the exporting store; only used to relocate attachments.
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub key_words: String,
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description_editor: EditorType,
    #[serde(default, deserialize_with = "null_as_default")]
    pub root_cause: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub root_cause_editor: EditorType,
    #[serde(default, deserialize_with = "null_as_default")]
    pub solutions: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub solutions_editor: EditorType,
    #[serde(default, deserialize_with = "null_as_default")]
    pub others: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub others_editor: EditorType,
    /// Encoded attachment lists. `None` means the field was absent from the
    /// manifest, not that the group is empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_cause_files: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solutions_files: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub others_files: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub uploaded_images: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_public: bool,
    /// Advisory; replaced on import if it collides.
    #[serde(default, deserialize_with = "lenient_token")]
    pub public_token: Option<Uuid>,
    #[serde(default, alias = "create_time", deserialize_with = "lenient_datetime")]
    pub created_at_utc: Option<DateTime<Utc>>,
    #[serde(default, alias = "update_time", deserialize_with = "lenient_datetime")]
    pub updated_at_utc: Option<DateTime<Utc>>,
}

impl ManifestEntry {
    pub fn from_record(record: &Record) -> Self {
        Self {
            id: Some(record.id),
            key_words: record.key_words.clone(),
            title: record.title.clone(),
            description: record.description.clone(),
            description_editor: record.description_editor,
            root_cause: record.root_cause.clone(),
            root_cause_editor: record.root_cause_editor,
            solutions: record.solutions.clone(),
            solutions_editor: record.solutions_editor,
            others: record.others.clone(),
            others_editor: record.others_editor,
            root_cause_files: Some(record.root_cause_files.clone()),
            solutions_files: Some(record.solutions_files.clone()),
            others_files: Some(record.others_files.clone()),
            uploaded_images: record.uploaded_images.clone(),
            is_public: record.is_public,
            public_token: Some(record.public_token),
            created_at_utc: Some(record.created_at_utc),
            updated_at_utc: Some(record.updated_at_utc),
        }
    }

    /// Encoded list for one attachment group, if the manifest carried it.
    pub fn attachment(&self, field: AttachmentField) -> Option<&str> {
        match field {
            AttachmentField::RootCause => self.root_cause_files.as_deref(),
            AttachmentField::Solutions => self.solutions_files.as_deref(),
            AttachmentField::Others => self.others_files.as_deref(),
        }
    }

    /// Attachment groups missing from this entry.
    pub fn absent_attachments(&self) -> Vec<AttachmentField> {
        AttachmentField::ALL
            .into_iter()
            .filter(|f| self.attachment(*f).is_none())
            .collect()
    }

    /// Build the insert request for this entry.
    ///
    /// Absent attachment groups start empty; the importer fills them from
    /// the archive's files afterwards.
    pub fn into_request(self, public_token: Uuid, created_by: Option<i64>) -> CreateRecordRequest {
        CreateRecordRequest {
            key_words: self.key_words,
            title: self.title,
            description: self.description,
            description_editor: self.description_editor,
            root_cause: self.root_cause,
            root_cause_editor: self.root_cause_editor,
            solutions: self.solutions,
            solutions_editor: self.solutions_editor,
            others: self.others,
            others_editor: self.others_editor,
            root_cause_files: self.root_cause_files.unwrap_or_default(),
            solutions_files: self.solutions_files.unwrap_or_default(),
            others_files: self.others_files.unwrap_or_default(),
            uploaded_images: self.uploaded_images,
            is_public: self.is_public,
            public_token,
            created_by,
            created_at_utc: self.created_at_utc,
        }
    }
}

/// Full manifest document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default = "legacy_format_version")]
    pub format_version: u32,
    #[serde(default)]
    pub app_version: Option<String>,
    #[serde(default, deserialize_with = "lenient_datetime")]
    pub exported_at: Option<DateTime<Utc>>,
    pub items: Vec<ManifestEntry>,
}

fn legacy_format_version() -> u32 {
    MANIFEST_FORMAT_VERSION
}

impl Manifest {
    /// Snapshot the given records, in order.
    pub fn from_records(records: &[Record]) -> Self {
        Self {
            format_version: MANIFEST_FORMAT_VERSION,
            app_version: Some(APP_VERSION.to_string()),
            exported_at: Some(Utc::now()),
            items: records.iter().map(ManifestEntry::from_record).collect(),
        }
    }

    pub fn to_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec_pretty(self)
    }

    /// Parse a manifest document or a bare array of entries.
    pub fn parse(bytes: &[u8]) -> serde_json::Result<Self> {
        let value: serde_json::Value = serde_json::from_slice(bytes)?;
        if value.is_array() {
            let items: Vec<ManifestEntry> = serde_json::from_value(value)?;
            return Ok(Self {
                format_version: MANIFEST_FORMAT_VERSION,
                app_version: None,
                exported_at: None,
                items,
            });
        }
        serde_json::from_value(value)
    }

    /// Human-readable notes about version differences with this build.
    pub fn compatibility_warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        match &self.app_version {
            Some(v) if v != APP_VERSION => warnings.push(format!(
                "Version mismatch: backup created with v{}, importing with v{}",
                v, APP_VERSION
            )),
            Some(_) => {}
            None => warnings.push(
                "Backup created by an older version (no version info in manifest)".to_string(),
            ),
        }
        if self.format_version > MANIFEST_FORMAT_VERSION {
            warnings.push(format!(
                "Manifest format {} is newer than supported format {}; unknown fields were ignored",
                self.format_version, MANIFEST_FORMAT_VERSION
            ));
        }
        warnings
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn lenient_token<'de, D>(deserializer: D) -> Result<Option<Uuid>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|s| Uuid::parse_str(s.trim()).ok()))
}

fn lenient_datetime<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_timestamp))
}

// RFC 3339 first, then naive timestamps (taken as UTC).
fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_record() -> Record {
        let mut req = CreateRecordRequest::titled("A");
        req.root_cause_files = "a.txt|||b.txt".to_string();
        req.root_cause_editor = EditorType::Markdown;
        req.uploaded_images = vec!["pic.png".to_string()];
        req.is_public = true;
        req.into_record(17, Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap())
    }

    #[test]
    fn test_manifest_roundtrip_keeps_fields() {
        let record = sample_record();
        let manifest = Manifest::from_records(std::slice::from_ref(&record));
        let parsed = Manifest::parse(&manifest.to_bytes().unwrap()).unwrap();

        assert_eq!(parsed.format_version, MANIFEST_FORMAT_VERSION);
        assert_eq!(parsed.items.len(), 1);
        let entry = &parsed.items[0];
        assert_eq!(entry.id, Some(17));
        assert_eq!(entry.title, "A");
        assert_eq!(entry.root_cause_files.as_deref(), Some("a.txt|||b.txt"));
        assert_eq!(entry.root_cause_editor, EditorType::Markdown);
        assert_eq!(entry.public_token, Some(record.public_token));
        assert_eq!(entry.created_at_utc, Some(record.created_at_utc));
        assert!(parsed.compatibility_warnings().is_empty());
    }

    #[test]
    fn test_manifest_uses_field_names() {
        let manifest = Manifest::from_records(&[sample_record()]);
        let value: serde_json::Value = serde_json::from_slice(&manifest.to_bytes().unwrap()).unwrap();
        let item = &value["items"][0];

        assert_eq!(item["title"], "A");
        assert_eq!(item["root_cause_files"], "a.txt|||b.txt");
        assert_eq!(item["is_public"], true);
        assert_eq!(item["uploaded_images"][0], "pic.png");
    }

    #[test]
    fn test_bare_array_with_missing_fields_is_defaulted() {
        let json = br#"[{"id": 3, "title": "Old", "description": null, "create_time": "2021-05-06T07:08:09"}]"#;
        let manifest = Manifest::parse(json).unwrap();

        let entry = &manifest.items[0];
        assert_eq!(entry.id, Some(3));
        assert_eq!(entry.description, "");
        assert_eq!(entry.description_editor, EditorType::Plain);
        assert!(!entry.is_public);
        assert!(entry.public_token.is_none());
        assert_eq!(entry.absent_attachments(), AttachmentField::ALL.to_vec());
        assert_eq!(
            entry.created_at_utc,
            Some(Utc.with_ymd_and_hms(2021, 5, 6, 7, 8, 9).unwrap())
        );
        assert_eq!(manifest.compatibility_warnings().len(), 1);
    }

    #[test]
    fn test_invalid_token_treated_as_absent() {
        let json = br#"{"items": [{"title": "T", "public_token": "not-a-uuid"}]}"#;
        let manifest = Manifest::parse(json).unwrap();
        assert!(manifest.items[0].public_token.is_none());
    }

    #[test]
    fn test_empty_attachment_is_not_absent() {
        let json = br#"{"items": [{"title": "T", "others_files": ""}]}"#;
        let entry = &Manifest::parse(json).unwrap().items[0];
        assert_eq!(
            entry.absent_attachments(),
            vec![AttachmentField::RootCause, AttachmentField::Solutions]
        );
    }

    #[test]
    fn test_missing_title_rejected() {
        assert!(Manifest::parse(br#"[{"id": 1}]"#).is_err());
        assert!(Manifest::parse(b"not json").is_err());
    }

    #[test]
    fn test_version_mismatch_warns() {
        let mut manifest = Manifest::from_records(&[]);
        manifest.app_version = Some("0.0.1".to_string());
        manifest.format_version = MANIFEST_FORMAT_VERSION + 1;

        let warnings = manifest.compatibility_warnings();
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("v0.0.1"));
    }

    #[test]
    fn test_into_request_uses_given_owner_and_token() {
        let entry = ManifestEntry::from_record(&sample_record());
        let token = Uuid::new_v4();
        let req = entry.into_request(token, Some(5));

        assert_eq!(req.public_token, token);
        assert_eq!(req.created_by, Some(5));
        assert_eq!(req.root_cause_files, "a.txt|||b.txt");
        assert!(req.created_at_utc.is_some());
    }
}
