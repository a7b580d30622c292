use serde::Deserialize;

/// One search result. Immutable once received; `id` is the identity key.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TrackDescriptor {
    #[serde(rename = "videoId")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub thumbnail: String,
}

impl TrackDescriptor {
    /// `Artist - Title`, or just the title when the artist is blank.
    pub fn display(&self) -> String {
        let artist = self.artist.trim();
        if artist.is_empty() {
            self.title.clone()
        } else {
            format!("{} - {}", artist, self.title)
        }
    }
}

/// Raw audio payload as served by the stream endpoint.
#[derive(Debug, Clone)]
pub struct AudioBytes {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}
