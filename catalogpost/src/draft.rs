use std::fmt;
use std::path::Path;
use std::str::FromStr;

use thiserror::Error;

/// Binary photo selected by the operator, held in memory until it is uploaded.
#[derive(Clone, PartialEq, Eq)]
pub struct Photo {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Skip the raw bytes, they can be several megabytes
impl fmt::Debug for Photo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Photo")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

#[derive(Error, Debug)]
pub enum PhotoError {
    #[error("Error reading photo {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("Photo file is empty: {0}")]
    Empty(String),
}

impl Photo {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Photo {
        let file_name = file_name.into();
        Photo {
            content_type: guess_content_type(&file_name).to_string(),
            file_name,
            bytes,
        }
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Photo, PhotoError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await.map_err(|e| PhotoError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        if bytes.is_empty() {
            return Err(PhotoError::Empty(path.display().to_string()));
        }

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "photo".to_string());

        Ok(Photo::new(file_name, bytes))
    }
}

fn guess_content_type(file_name: &str) -> &'static str {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}

/// In-progress item as edited by the operator
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DraftItem {
    pub name: String,
    pub notes: String,
    pub price_thousands: String,
    pub photo: Option<Photo>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftField {
    Name,
    Notes,
    PriceThousands,
    Photo,
}

impl FromStr for DraftField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "name" => Ok(DraftField::Name),
            "notes" => Ok(DraftField::Notes),
            "price" | "price_thousands" => Ok(DraftField::PriceThousands),
            "photo" => Ok(DraftField::Photo),
            other => Err(format!("Unknown field: {}", other)),
        }
    }
}

impl fmt::Display for DraftField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DraftField::Name => "name",
            DraftField::Notes => "notes",
            DraftField::PriceThousands => "price",
            DraftField::Photo => "photo",
        };
        write!(f, "{}", name)
    }
}

/// A single field replacement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftEdit {
    Name(String),
    Notes(String),
    PriceThousands(String),
    Photo(Option<Photo>),
}

impl DraftEdit {
    pub fn field(&self) -> DraftField {
        match self {
            DraftEdit::Name(_) => DraftField::Name,
            DraftEdit::Notes(_) => DraftField::Notes,
            DraftEdit::PriceThousands(_) => DraftField::PriceThousands,
            DraftEdit::Photo(_) => DraftField::Photo,
        }
    }

    /// Edit that puts the field back to its baseline value
    pub fn cleared(field: DraftField) -> DraftEdit {
        match field {
            DraftField::Name => DraftEdit::Name(String::new()),
            DraftField::Notes => DraftEdit::Notes(String::new()),
            DraftField::PriceThousands => DraftEdit::PriceThousands(String::new()),
            DraftField::Photo => DraftEdit::Photo(None),
        }
    }
}

/// Holder of the draft. Performs no validation.
#[derive(Debug, Default)]
pub struct DraftStore {
    draft: DraftItem,
}

impl DraftStore {
    pub fn new() -> Self {
        DraftStore::default()
    }

    pub fn with_draft(draft: DraftItem) -> Self {
        DraftStore { draft }
    }

    pub fn draft(&self) -> &DraftItem {
        &self.draft
    }

    pub fn snapshot(&self) -> DraftItem {
        self.draft.clone()
    }

    pub fn set_field(&mut self, edit: DraftEdit) {
        match edit {
            DraftEdit::Name(name) => self.draft.name = name,
            DraftEdit::Notes(notes) => self.draft.notes = notes,
            DraftEdit::PriceThousands(price) => self.draft.price_thousands = price,
            DraftEdit::Photo(photo) => self.draft.photo = photo,
        }
    }

    pub fn reset(&mut self) {
        self.draft = DraftItem::default();
    }

    pub fn is_baseline(&self) -> bool {
        self.draft == DraftItem::default()
    }
}
