use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::info;

use super::model::{AudioBytes, TrackDescriptor};

const MAX_NAME_ATTEMPTS: u32 = 999;

/// Pick a file extension from the stream's `Content-Type`.
pub fn extension_for(content_type: Option<&str>) -> &'static str {
    let mime = content_type
        .and_then(|ct| ct.split(';').next())
        .map(|s| s.trim().to_ascii_lowercase())
        .unwrap_or_default();
    match mime.as_str() {
        "audio/mp4" | "audio/m4a" | "audio/x-m4a" | "audio/aac" => "m4a",
        "audio/webm" => "webm",
        "audio/ogg" | "audio/opus" => "ogg",
        "audio/wav" | "audio/x-wav" | "audio/wave" => "wav",
        "audio/flac" | "audio/x-flac" => "flac",
        _ => "mp3",
    }
}

/// `Artist - Title` made safe to use as a single path component.
pub fn download_file_stem(track: &TrackDescriptor) -> String {
    let stem: String = track
        .display()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let stem = stem.trim().trim_matches('.').trim();
    if stem.is_empty() {
        track.id.clone()
    } else {
        stem.to_string()
    }
}

/// Write a fetched payload into `dir`, creating it if needed. An existing
/// file is never replaced; the name gets a ` (n)` suffix instead.
pub fn save_download(dir: &Path, track: &TrackDescriptor, audio: &AudioBytes) -> io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let ext = extension_for(audio.content_type.as_deref());
    let stem = download_file_stem(track);
    let mut attempt = 0u32;
    loop {
        let name = match attempt {
            0 => format!("{stem}.{ext}"),
            n => format!("{stem} ({n}).{ext}"),
        };
        let path = dir.join(name);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                file.write_all(&audio.bytes)?;
                info!(path = %path.display(), bytes = audio.bytes.len(), "download saved");
                return Ok(path);
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists && attempt < MAX_NAME_ATTEMPTS => {
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
