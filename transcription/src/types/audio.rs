//! Audio inputs and encodings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::Error;

/// Audio handed to a batch transcription.
///
/// Only [`AudioInput::Url`] is accepted by the batch adapters; the other forms
/// are rejected with an `INVALID_INPUT` failure.
#[derive(Debug)]
pub enum AudioInput {
    /// Publicly reachable (or pre-signed) URL of the media file.
    Url(String),
    /// Raw file contents.
    Bytes {
        data: Vec<u8>,
        filename: Option<String>,
    },
    /// Chunks produced incrementally by the caller.
    Stream(mpsc::Receiver<Vec<u8>>),
}

impl AudioInput {
    pub fn url(url: impl Into<String>) -> Self {
        AudioInput::Url(url.into())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            AudioInput::Url(_) => "url",
            AudioInput::Bytes { .. } => "bytes",
            AudioInput::Stream(_) => "stream",
        }
    }

    /// The URL, or an `InvalidInput` error naming the unsupported form.
    pub fn into_url(self) -> Result<String, Error> {
        match self {
            AudioInput::Url(url) => Ok(url),
            other => Err(Error::InvalidInput(format!(
                "audio input of type `{}` is not supported, provide a URL",
                other.kind()
            ))),
        }
    }
}

/// Audio sample encodings accepted by the streaming endpoints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioEncoding {
    /// 16-bit signed little-endian PCM.
    #[default]
    Linear16,
    Mulaw,
    Alaw,
    Flac,
    Opus,
    Mp3,
}

impl AudioEncoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            AudioEncoding::Linear16 => "linear16",
            AudioEncoding::Mulaw => "mulaw",
            AudioEncoding::Alaw => "alaw",
            AudioEncoding::Flac => "flac",
            AudioEncoding::Opus => "opus",
            AudioEncoding::Mp3 => "mp3",
        }
    }

    /// AssemblyAI realtime `encoding` query value, if the encoding is accepted.
    pub fn assemblyai_name(&self) -> Option<&'static str> {
        match self {
            AudioEncoding::Linear16 => Some("pcm_s16le"),
            AudioEncoding::Mulaw => Some("pcm_mulaw"),
            AudioEncoding::Alaw => Some("pcm_alaw"),
            _ => None,
        }
    }

    /// Gladia live `encoding` value, if the encoding is accepted.
    pub fn gladia_name(&self) -> Option<&'static str> {
        match self {
            AudioEncoding::Linear16 => Some("wav/pcm"),
            AudioEncoding::Mulaw => Some("wav/mulaw"),
            AudioEncoding::Alaw => Some("wav/alaw"),
            _ => None,
        }
    }

    /// Deepgram accepts every encoding under its own name.
    pub fn deepgram_name(&self) -> &'static str {
        self.as_str()
    }
}

impl fmt::Display for AudioEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AudioEncoding {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "linear16" | "pcm" | "pcm16" | "pcm_s16le" | "wav/pcm" => Ok(AudioEncoding::Linear16),
            "mulaw" | "ulaw" | "pcm_mulaw" | "wav/mulaw" => Ok(AudioEncoding::Mulaw),
            "alaw" | "pcm_alaw" | "wav/alaw" => Ok(AudioEncoding::Alaw),
            "flac" => Ok(AudioEncoding::Flac),
            "opus" => Ok(AudioEncoding::Opus),
            "mp3" => Ok(AudioEncoding::Mp3),
            other => Err(Error::Configuration(format!("unknown audio encoding: {other}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_url_input_passes_through() {
        let url = AudioInput::url("https://example.com/a.mp3").into_url().unwrap();
        assert_eq!(url, "https://example.com/a.mp3");
    }

    #[test]
    fn test_bytes_input_is_invalid() {
        let err = AudioInput::Bytes {
            data: vec![1, 2, 3],
            filename: None,
        }
        .into_url()
        .unwrap_err();

        assert_eq!(err.code(), ErrorCode::InvalidInput);
        assert!(err.to_string().contains("bytes"));
    }

    #[test]
    fn test_stream_input_is_invalid() {
        let (_tx, rx) = mpsc::channel(1);
        assert!(AudioInput::Stream(rx).into_url().is_err());
    }

    #[test]
    fn test_vendor_encoding_names() {
        assert_eq!(AudioEncoding::Linear16.assemblyai_name(), Some("pcm_s16le"));
        assert_eq!(AudioEncoding::Flac.assemblyai_name(), None);
        assert_eq!(AudioEncoding::Mulaw.gladia_name(), Some("wav/mulaw"));
        assert_eq!(AudioEncoding::Opus.deepgram_name(), "opus");
    }

    #[test]
    fn test_encoding_from_str() {
        assert_eq!("PCM".parse::<AudioEncoding>().unwrap(), AudioEncoding::Linear16);
        assert_eq!("wav/alaw".parse::<AudioEncoding>().unwrap(), AudioEncoding::Alaw);
        assert!("mp4".parse::<AudioEncoding>().is_err());
    }
}
