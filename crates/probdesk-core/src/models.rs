//! Record data model.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;
use crate::multifile::decode_file_list;

// =============================================================================
// EDITOR MODE
// =============================================================================

/// Editor mode a rich text field was written with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditorType {
    #[default]
    Plain,
    Markdown,
}

impl EditorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EditorType::Plain => "plain",
            EditorType::Markdown => "markdown",
        }
    }
}

impl fmt::Display for EditorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EditorType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "plain" => Ok(EditorType::Plain),
            "markdown" => Ok(EditorType::Markdown),
            other => Err(Error::InvalidInput(format!("Unknown editor type: {}", other))),
        }
    }
}

// =============================================================================
// ATTACHMENT FIELDS
// =============================================================================

/// A named attachment group on a record.
///
/// Files of a group live on disk under `{record_id}/{dir_name}/{filename}`
/// and are listed in the record's encoded column for that group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttachmentField {
    RootCause,
    Solutions,
    Others,
}

impl AttachmentField {
    /// Every attachment group, in display order.
    pub const ALL: [AttachmentField; 3] = [
        AttachmentField::RootCause,
        AttachmentField::Solutions,
        AttachmentField::Others,
    ];

    /// Directory name under a record's attachment directory.
    pub fn dir_name(&self) -> &'static str {
        match self {
            AttachmentField::RootCause => "root_cause",
            AttachmentField::Solutions => "solutions",
            AttachmentField::Others => "others",
        }
    }

    /// Column holding the encoded filename list.
    pub fn column(&self) -> &'static str {
        match self {
            AttachmentField::RootCause => "root_cause_files",
            AttachmentField::Solutions => "solutions_files",
            AttachmentField::Others => "others_files",
        }
    }

    /// Resolve a field from its on-disk directory name.
    pub fn from_dir_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.dir_name() == name)
    }
}

impl fmt::Display for AttachmentField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

// =============================================================================
// RECORD
// =============================================================================

/// A problem record as held by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: i64,
    pub key_words: String,
    pub title: String,
    pub description: String,
    pub description_editor: EditorType,
    pub root_cause: String,
    pub root_cause_editor: EditorType,
    pub solutions: String,
    pub solutions_editor: EditorType,
    pub others: String,
    pub others_editor: EditorType,
    /// Encoded filename lists (see [`crate::multifile`]).
    pub root_cause_files: String,
    pub solutions_files: String,
    pub others_files: String,
    /// Inline-image pool references.
    pub uploaded_images: Vec<String>,
    pub is_public: bool,
    /// Token for unauthenticated direct links. Unique across the store.
    pub public_token: Uuid,
    pub created_by: Option<i64>,
    pub created_at_utc: DateTime<Utc>,
    pub updated_at_utc: DateTime<Utc>,
}

impl Record {
    /// Encoded filename list for an attachment group.
    pub fn attachment(&self, field: AttachmentField) -> &str {
        match field {
            AttachmentField::RootCause => &self.root_cause_files,
            AttachmentField::Solutions => &self.solutions_files,
            AttachmentField::Others => &self.others_files,
        }
    }

    /// Decoded filenames of an attachment group, in display order.
    pub fn attachment_files(&self, field: AttachmentField) -> Vec<String> {
        decode_file_list(self.attachment(field))
    }

    pub(crate) fn attachment_mut(&mut self, field: AttachmentField) -> &mut String {
        match field {
            AttachmentField::RootCause => &mut self.root_cause_files,
            AttachmentField::Solutions => &mut self.solutions_files,
            AttachmentField::Others => &mut self.others_files,
        }
    }

    /// Overwrite one encoded attachment column, leaving every other field alone.
    pub fn set_attachment(&mut self, field: AttachmentField, encoded: impl Into<String>) {
        *self.attachment_mut(field) = encoded.into();
    }
}

/// Request for creating a new record.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateRecordRequest {
    pub key_words: String,
    pub title: String,
    pub description: String,
    pub description_editor: EditorType,
    pub root_cause: String,
    pub root_cause_editor: EditorType,
    pub solutions: String,
    pub solutions_editor: EditorType,
    pub others: String,
    pub others_editor: EditorType,
    pub root_cause_files: String,
    pub solutions_files: String,
    pub others_files: String,
    pub uploaded_images: Vec<String>,
    pub is_public: bool,
    pub public_token: Uuid,
    pub created_by: Option<i64>,
    /// Preserved creation time; `None` means "now".
    pub created_at_utc: Option<DateTime<Utc>>,
}

impl CreateRecordRequest {
    /// A request with the given title and every other field defaulted.
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            key_words: String::new(),
            title: title.into(),
            description: String::new(),
            description_editor: EditorType::default(),
            root_cause: String::new(),
            root_cause_editor: EditorType::default(),
            solutions: String::new(),
            solutions_editor: EditorType::default(),
            others: String::new(),
            others_editor: EditorType::default(),
            root_cause_files: String::new(),
            solutions_files: String::new(),
            others_files: String::new(),
            uploaded_images: Vec::new(),
            is_public: false,
            public_token: Uuid::new_v4(),
            created_by: None,
            created_at_utc: None,
        }
    }

    /// Materialize the stored record once the store has assigned an identity.
    pub fn into_record(self, id: i64, now: DateTime<Utc>) -> Record {
        Record {
            id,
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
            root_cause_files: self.root_cause_files,
            solutions_files: self.solutions_files,
            others_files: self.others_files,
            uploaded_images: self.uploaded_images,
            is_public: self.is_public,
            public_token: self.public_token,
            created_by: self.created_by,
            created_at_utc: self.created_at_utc.unwrap_or(now),
            updated_at_utc: now,
        }
    }
}
