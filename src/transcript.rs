//! YouTube caption tracks in the `json3` format.

use crate::error::{KelimeError, Result};
use crate::llm::{CompletionClient, ExplainMode, ExplainRequest};
use crate::settings::Settings;
use serde::{Deserialize, Serialize};
use tracing::debug;

const SERVICE: &str = "captions";

/// Maximum characters of joined transcript text sent for translation.
pub const MAX_TRANSLATE_CHARS: usize = 6000;

/// One timed caption line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub start_seconds: f64,
    pub duration_seconds: f64,
    pub text: String,
}

/// Transcript with its Turkish translation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranslatedTranscript {
    pub segments: Vec<TranscriptSegment>,
    pub translation: String,
}

#[derive(Debug, Deserialize)]
struct Json3Body {
    events: Option<Vec<Json3Event>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Json3Event {
    #[serde(default)]
    t_start_ms: u64,
    #[serde(default)]
    d_duration_ms: u64,
    #[serde(default)]
    segs: Vec<Json3Seg>,
}

#[derive(Debug, Deserialize)]
struct Json3Seg {
    #[serde(default)]
    utf8: String,
}

/// Parse a `fmt=json3` caption body into segments.
///
/// Events without text (window setup, line-break appends) are skipped.
/// A body without an `events` array, or without any text, is a parse error.
pub fn parse_json3(body: &str) -> Result<Vec<TranscriptSegment>> {
    let parsed: Json3Body =
        serde_json::from_str(body).map_err(|e| KelimeError::Parse(format!("json3 caption: {e}")))?;
    let events = parsed
        .events
        .ok_or_else(|| KelimeError::Parse("json3 caption has no events".to_owned()))?;

    let segments: Vec<TranscriptSegment> = events
        .into_iter()
        .filter_map(|event| {
            let raw: String = event.segs.iter().map(|s| s.utf8.as_str()).collect();
            let text = raw.split_whitespace().collect::<Vec<_>>().join(" ");
            (!text.is_empty()).then(|| TranscriptSegment {
                start_seconds: event.t_start_ms as f64 / 1000.0,
                duration_seconds: event.d_duration_ms as f64 / 1000.0,
                text,
            })
        })
        .collect();

    if segments.is_empty() {
        return Err(KelimeError::Parse("caption track is empty".to_owned()));
    }
    Ok(segments)
}

/// Segment text joined with spaces, cut to `max_chars`.
#[must_use]
pub fn joined_text(segments: &[TranscriptSegment], max_chars: usize) -> String {
    let joined = segments
        .iter()
        .map(|s| s.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    if joined.chars().count() <= max_chars {
        return joined;
    }
    joined.chars().take(max_chars).collect()
}

/// `track_url` with `fmt=json3`, replacing any existing `fmt`.
pub fn json3_url(track_url: &str) -> Result<reqwest::Url> {
    let mut url = reqwest::Url::parse(track_url)
        .map_err(|e| KelimeError::Validation(format!("invalid caption URL: {e}")))?;
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != "fmt")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    url.query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair("fmt", "json3");
    Ok(url)
}

/// Fetches caption tracks over HTTP.
#[derive(Debug, Clone)]
pub struct TranscriptClient {
    settings: Settings,
    client: reqwest::Client,
}

impl TranscriptClient {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            client: reqwest::Client::new(),
        }
    }

    /// Download and parse a caption track.
    pub async fn fetch(&self, track_url: &str) -> Result<Vec<TranscriptSegment>> {
        let url = json3_url(track_url)?;
        debug!(host = url.host_str().unwrap_or_default(), "fetching caption track");

        let response = self
            .client
            .get(url)
            .timeout(self.settings.current().http.timeout())
            .send()
            .await
            .map_err(|e| KelimeError::upstream(SERVICE, format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(KelimeError::upstream(
                SERVICE,
                format!("HTTP {}", status.as_u16()),
            ));
        }
        let body = response
            .text()
            .await
            .map_err(|e| KelimeError::upstream(SERVICE, format!("read body: {e}")))?;
        parse_json3(&body)
    }

    /// Fetch a track and translate its text with `llm`.
    pub async fn fetch_and_translate(
        &self,
        track_url: &str,
        llm: &dyn CompletionClient,
    ) -> Result<TranslatedTranscript> {
        let segments = self.fetch(track_url).await?;
        let request = ExplainRequest {
            selected_text: joined_text(&segments, MAX_TRANSLATE_CHARS),
            context: String::new(),
            mode: ExplainMode::Translate,
        };
        let translation = llm.explain(&request).await?;
        Ok(TranslatedTranscript {
            segments,
            translation,
        })
    }
}
