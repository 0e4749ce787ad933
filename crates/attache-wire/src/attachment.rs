//! Attachment handling and the upload allow-list

use crate::error::{Error, Result};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

/// Media types the agent service accepts for analysis.
pub const ALLOWED_MEDIA_TYPES: [&str; 4] = [
    "application/pdf",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "application/vnd.ms-excel",
    "text/csv",
];

/// A candidate file for inclusion in a turn.
#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    pub filename: String,
    pub media_type: String,
    pub data: Vec<u8>,
}

impl Attachment {
    pub fn new(
        filename: impl Into<String>,
        media_type: impl Into<String>,
        data: Vec<u8>,
    ) -> Self {
        Self {
            filename: filename.into(),
            media_type: media_type.into(),
            data,
        }
    }

    /// Check the declared media type against the allow-list.
    ///
    /// Rejection happens before any network call; the error's display text
    /// is the user-facing reason.
    pub fn validate(&self) -> Result<()> {
        if is_allowed_media_type(&self.media_type) {
            Ok(())
        } else {
            Err(Error::UnsupportedAttachment {
                media_type: self.media_type.clone(),
            })
        }
    }

    /// Render the file as a `data:` URL for inline preview.
    pub fn to_data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            essence(&self.media_type),
            STANDARD.encode(&self.data)
        )
    }
}

/// Media-type comparison ignores parameters and ASCII case.
pub fn is_allowed_media_type(media_type: &str) -> bool {
    let essence = essence(media_type);
    ALLOWED_MEDIA_TYPES
        .iter()
        .any(|allowed| essence.eq_ignore_ascii_case(allowed))
}

fn essence(media_type: &str) -> &str {
    media_type.split(';').next().unwrap_or(media_type).trim()
}
