/// Tag fields exchanged with a tag editor
use serde::{Deserialize, Serialize};

/// Common ID3-style tag fields
///
/// Every field is optional; an editor writes back only what is `Some`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagFields {
    /// Track title
    pub title: Option<String>,
    /// Performing artist
    pub artist: Option<String>,
    /// Album name
    pub album: Option<String>,
    /// Release year
    pub year: Option<u32>,
    /// Genre name
    pub genre: Option<String>,
    /// Free-form comment
    pub comment: Option<String>,
}

impl TagFields {
    /// Whether no field is set
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
