use std::collections::BTreeSet;
use std::process::{Command, Stdio};

use crate::config::OutputFormat;
use crate::foundation::error::{LectioError, LectioResult};

/// Encoder names listed by `ffmpeg -encoders`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EncoderCaps {
    names: BTreeSet<String>,
}

impl EncoderCaps {
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse the table printed by `ffmpeg -hide_banner -encoders`.
    ///
    /// Rows follow a ` ------` separator and read `<flags> <name> <description>`; the legend above
    /// the separator is skipped.
    pub fn parse(listing: &str) -> Self {
        let mut names = BTreeSet::new();
        let mut in_table = false;
        for line in listing.lines() {
            let trimmed = line.trim();
            if !in_table {
                in_table = trimmed.starts_with("---");
                continue;
            }
            let mut cols = trimmed.split_whitespace();
            let (Some(flags), Some(name)) = (cols.next(), cols.next()) else {
                continue;
            };
            if flags.len() == 6 && matches!(flags.as_bytes()[0], b'V' | b'A' | b'S') {
                names.insert(name.to_string());
            }
        }
        Self { names }
    }

    pub fn supports(&self, encoder: &str) -> bool {
        self.names.contains(encoder)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// First format in preference order whose codecs are all available.
    pub fn pick<'a>(&self, preferences: &'a [OutputFormat]) -> Option<&'a OutputFormat> {
        preferences
            .iter()
            .find(|f| self.supports(&f.video_codec) && self.supports(&f.audio_codec))
    }
}

/// Ask the local `ffmpeg` which encoders it was built with.
pub fn query_encoders() -> LectioResult<EncoderCaps> {
    let output = Command::new("ffmpeg")
        .args(["-hide_banner", "-encoders"])
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .map_err(|e| {
            LectioError::encode(format!(
                "failed to query ffmpeg encoders (is it installed and on PATH?): {e}"
            ))
        })?;
    if !output.status.success() {
        return Err(LectioError::encode(format!(
            "ffmpeg -encoders exited with status {}",
            output.status
        )));
    }
    Ok(EncoderCaps::parse(&String::from_utf8_lossy(&output.stdout)))
}

/// Pick the best-available output format, querying `ffmpeg` once.
#[tracing::instrument(skip(preferences), fields(candidates = preferences.len()))]
pub fn negotiate_format(preferences: &[OutputFormat]) -> LectioResult<OutputFormat> {
    let caps = query_encoders()?;
    let picked = caps.pick(preferences).cloned().ok_or_else(|| {
        LectioError::encode(format!(
            "none of {} preferred codec/container combinations is supported by ffmpeg",
            preferences.len()
        ))
    })?;
    tracing::debug!(
        container = picked.container.extension(),
        video = %picked.video_codec,
        audio = %picked.audio_codec,
        "negotiated output format"
    );
    Ok(picked)
}

#[cfg(test)]
#[path = "../../tests/unit/encode/negotiate.rs"]
mod tests;
