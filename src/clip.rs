//! Clip finalization: concatenate frozen buffer slices into one clip.

use crate::buffer::MediaSlice;
use crate::errors::FinalizeError;
use std::time::{SystemTime, UNIX_EPOCH};

/// A finished capture handed to the caller. The bytes are the recorder's
/// chunks concatenated in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clip {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub suggested_filename: String,
}

/// Concatenate the retained slices into a single clip.
///
/// Pure over its input: finalizing the same frozen slices twice yields
/// equivalent clips (only the suggested filename's timestamp differs).
pub fn finalize(slices: &[MediaSlice], mime_type: &str) -> Result<Clip, FinalizeError> {
    if slices.is_empty() {
        return Err(FinalizeError::EmptyBuffer);
    }
    let total: usize = slices.iter().map(|s| s.bytes.len()).sum();
    let mut bytes = Vec::with_capacity(total);
    for slice in slices {
        bytes.extend_from_slice(&slice.bytes);
    }
    Ok(Clip {
        bytes,
        mime_type: mime_type.to_string(),
        suggested_filename: suggested_filename(mime_type),
    })
}

fn suggested_filename(mime_type: &str) -> String {
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    format!("swing-{stamp}.{}", extension_for(mime_type))
}

fn extension_for(mime_type: &str) -> &'static str {
    let essence = mime_type.split(';').next().unwrap_or(mime_type).trim();
    match essence {
        "video/webm" => "webm",
        "video/mp4" => "mp4",
        "audio/wav" | "audio/wave" => "wav",
        "audio/pcm" => "pcm",
        _ => "bin",
    }
}
