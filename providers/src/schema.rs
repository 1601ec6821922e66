//! Parameter validation run by `api_wrapper` before a vendor call.

use transcription::types::TranscribeOptions;
use transcription::{Schema, ValidationIssue};
use url::Url;

/// Parameters of a batch submission.
#[derive(Debug, Clone)]
pub struct TranscribeRequest {
    pub audio_url: String,
    pub options: TranscribeOptions,
}

impl TranscribeRequest {
    pub fn new(audio_url: impl Into<String>, options: &TranscribeOptions) -> Self {
        Self {
            audio_url: audio_url.into(),
            options: options.clone(),
        }
    }
}

pub struct TranscribeRequestSchema;

impl Schema<TranscribeRequest> for TranscribeRequestSchema {
    fn validate(&self, params: &TranscribeRequest) -> Result<(), Vec<ValidationIssue>> {
        let mut issues = Vec::new();

        if let Err(err) = Url::parse(&params.audio_url) {
            issues.push(ValidationIssue::new(
                "audio_url",
                format!("must be an absolute URL ({err})"),
            ));
        }

        let options = &params.options;
        if let Some(language) = &options.language {
            if language.trim().is_empty() {
                issues.push(ValidationIssue::new(
                    "options.language",
                    "must not be empty",
                ));
            }
        }
        if options.speakers_expected == Some(0) {
            issues.push(ValidationIssue::new(
                "options.speakers_expected",
                "must be at least 1",
            ));
        }
        for (index, term) in options.custom_vocabulary.iter().enumerate() {
            if term.trim().is_empty() {
                issues.push(ValidationIssue::new(
                    format!("options.custom_vocabulary.{index}"),
                    "must not be blank",
                ));
            }
        }
        if let Some(webhook_url) = &options.webhook_url {
            if let Err(err) = Url::parse(webhook_url) {
                issues.push(ValidationIssue::new(
                    "options.webhook_url",
                    format!("must be an absolute URL ({err})"),
                ));
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(issues)
        }
    }
}

/// Vendor job identifiers end up in URL paths.
pub struct TranscriptIdSchema;

impl Schema<String> for TranscriptIdSchema {
    fn validate(&self, id: &String) -> Result<(), Vec<ValidationIssue>> {
        if id.trim().is_empty() {
            Err(vec![ValidationIssue::new("transcript_id", "must not be empty")])
        } else if id.contains(['/', '?', '#']) || id.contains(char::is_whitespace) {
            Err(vec![ValidationIssue::new(
                "transcript_id",
                "must not contain '/', '?', '#' or whitespace",
            )])
        } else {
            Ok(())
        }
    }
}

pub(crate) fn transcribe_schema() -> &'static dyn Schema<TranscribeRequest> {
    &TranscribeRequestSchema
}

pub(crate) fn transcript_id_schema() -> &'static dyn Schema<String> {
    &TranscriptIdSchema
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(url: &str, options: TranscribeOptions) -> TranscribeRequest {
        TranscribeRequest::new(url, &options)
    }

    #[test]
    fn test_valid_request() {
        let options = TranscribeOptions {
            language: Some("en".to_string()),
            speakers_expected: Some(2),
            custom_vocabulary: vec!["Gladia".to_string()],
            webhook_url: Some("https://hooks.example.com/stt".to_string()),
            ..Default::default()
        };
        assert!(TranscribeRequestSchema
            .validate(&request("https://cdn.example.com/call.mp3", options))
            .is_ok());
    }

    #[test]
    fn test_collects_every_issue() {
        let options = TranscribeOptions {
            speakers_expected: Some(0),
            custom_vocabulary: vec!["ok".to_string(), "  ".to_string()],
            webhook_url: Some("hooks".to_string()),
            ..Default::default()
        };
        let issues = TranscribeRequestSchema
            .validate(&request("call.mp3", options))
            .unwrap_err();

        let paths: Vec<_> = issues.iter().map(|issue| issue.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "audio_url",
                "options.speakers_expected",
                "options.custom_vocabulary.1",
                "options.webhook_url"
            ]
        );
    }

    #[test]
    fn test_transcript_id_rules() {
        assert!(TranscriptIdSchema.validate(&"5551722-f677".to_string()).is_ok());
        assert!(TranscriptIdSchema.validate(&" ".to_string()).is_err());
        assert!(TranscriptIdSchema.validate(&"../admin".to_string()).is_err());
    }
}
