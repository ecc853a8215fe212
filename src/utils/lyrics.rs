use anyhow::{Result, anyhow};
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::artwork::transport::REQUEST_TIMEOUT;

const TRUNCATION_NOTE: &str = "\n\n... [Lyrics truncated]";

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct LyricLine {
    pub line: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Lyrics {
    #[serde(default)]
    pub source_name: Option<String>,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub lines: Vec<LyricLine>,
}

impl Lyrics {
    /// Plain text if the provider sent it, else the synced lines joined.
    pub fn body(&self) -> String {
        match self.text.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => text.to_string(),
            _ => self
                .lines
                .iter()
                .map(|line| line.line.as_str())
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

/// Where a Lavalink node with the lyrics plugin serves lyrics from.
pub enum LyricsTarget<'a> {
    Playing { session_id: &'a str, guild_id: &'a str },
    Track { encoded: &'a str },
}

impl LyricsTarget<'_> {
    fn url(&self, address: &str) -> String {
        match self {
            LyricsTarget::Playing {
                session_id,
                guild_id,
            } => format!(
                "{}/v4/sessions/{}/players/{}/track/lyrics",
                address, session_id, guild_id
            ),
            LyricsTarget::Track { .. } => format!("{}/v4/lyrics", address),
        }
    }

    fn query(&self) -> Vec<(&str, &str)> {
        let mut query = vec![("skipTrackSource", "false")];
        if let LyricsTarget::Track { encoded } = self {
            query.push(("track", *encoded));
        }
        query
    }
}

/// `Ok(None)` when the node has no lyrics for the track.
pub async fn get_lyrics(
    client: &Client,
    address: &str,
    token: &str,
    target: LyricsTarget<'_>,
) -> Result<Option<Lyrics>> {
    let url = target.url(address);
    tracing::debug!("Fetching lyrics from: {}", url);
    let response = client
        .get(&url)
        .query(&target.query())
        .header("Authorization", token)
        .timeout(REQUEST_TIMEOUT)
        .send()
        .await?;

    let status = response.status();
    if status == StatusCode::NO_CONTENT || status == StatusCode::NOT_FOUND {
        return Ok(None);
    }
    if !status.is_success() {
        let error_text = response.text().await?;
        tracing::error!(%status, body = %error_text, "Failed to fetch lyrics");
        return Err(anyhow!("Failed to fetch lyrics. Status: {}", status));
    }

    let response_text = response
        .text()
        .await
        .map_err(|e| anyhow!("Failed to get lyrics response text: {}", e))?;
    parse_lyrics(&response_text)
}

fn parse_lyrics(body: &str) -> Result<Option<Lyrics>> {
    let lyrics: Lyrics = serde_json::from_str(body)
        .map_err(|e| anyhow!("Failed to parse lyrics response: {}", e))?;
    Ok((!lyrics.body().trim().is_empty()).then_some(lyrics))
}

/// Squashes blank-line runs and cuts the text to fit an embed description.
pub fn fit_lyrics(text: &str, max_chars: usize) -> String {
    let mut tidy = String::with_capacity(text.len());
    let mut blank_run = 0;
    for line in text.trim().lines().map(str::trim_end) {
        if line.trim().is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        tidy.push_str(line);
        tidy.push('\n');
    }
    let tidy = tidy.trim_end();

    if tidy.chars().count() <= max_chars {
        return tidy.to_string();
    }
    let keep = max_chars.saturating_sub(TRUNCATION_NOTE.chars().count());
    let mut cut: String = tidy.chars().take(keep).collect();
    cut.push_str(TRUNCATION_NOTE);
    cut
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synced_lines_are_joined_when_no_plain_text() {
        let lyrics = parse_lyrics(
            r#"{"sourceName":"youtube","provider":"Musixmatch","text":null,
                "lines":[{"timestamp":0,"line":"first"},{"timestamp":900,"line":"second"}]}"#,
        )
        .unwrap()
        .unwrap();

        assert_eq!(lyrics.body(), "first\nsecond");
        assert_eq!(lyrics.provider.as_deref(), Some("Musixmatch"));
    }

    #[test]
    fn plain_text_wins_over_lines() {
        let lyrics = parse_lyrics(r#"{"text":"  whole song  ","lines":[{"line":"x"}]}"#)
            .unwrap()
            .unwrap();
        assert_eq!(lyrics.body(), "whole song");
    }

    #[test]
    fn empty_lyrics_count_as_missing() {
        assert!(parse_lyrics(r#"{"text":"","lines":[]}"#).unwrap().is_none());
        assert!(parse_lyrics("not json").is_err());
    }

    #[test]
    fn player_and_track_targets_use_their_endpoints() {
        let playing = LyricsTarget::Playing {
            session_id: "abc",
            guild_id: "42",
        };
        assert_eq!(
            playing.url("http://node:2333"),
            "http://node:2333/v4/sessions/abc/players/42/track/lyrics"
        );
        assert_eq!(playing.query(), vec![("skipTrackSource", "false")]);

        let track = LyricsTarget::Track { encoded: "QAAA+/=" };
        assert_eq!(track.url("http://node:2333"), "http://node:2333/v4/lyrics");
        assert_eq!(
            track.query(),
            vec![("skipTrackSource", "false"), ("track", "QAAA+/=")]
        );
    }

    #[test]
    fn fitting_collapses_blank_runs() {
        assert_eq!(fit_lyrics("a\n\n\n\nb\n\n", 100), "a\n\nb");
    }

    #[test]
    fn fitting_truncates_long_lyrics_with_a_note() {
        let long = "la ".repeat(2000);
        let fitted = fit_lyrics(&long, 4000);
        assert_eq!(fitted.chars().count(), 4000);
        assert!(fitted.ends_with("... [Lyrics truncated]"));
    }
}
