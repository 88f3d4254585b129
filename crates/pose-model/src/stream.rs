//! JSONL landmark streams used for replaying recorded pose output.
//!
//! One [`LandmarkFrame`] per line. Lines starting with `#` are comments;
//! the first one may carry a [`LandmarkStreamHeader`] as JSON.

use serde::{Deserialize, Serialize};

use crate::landmark::LandmarkFrame;

/// Metadata written at the top of a landmark stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandmarkStreamHeader {
    /// Schema version for forward compatibility.
    pub schema_version: String,

    /// Name of the estimator or tool that produced the stream.
    #[serde(default)]
    pub source: Option<String>,

    /// Nominal frame rate of the stream.
    #[serde(default)]
    pub fps: Option<u32>,
}

impl Default for LandmarkStreamHeader {
    fn default() -> Self {
        Self {
            schema_version: "1.0".to_string(),
            source: None,
            fps: None,
        }
    }
}

/// Parse frames from JSONL content, skipping blank and `#` lines.
pub fn parse_frames(jsonl: &str) -> Result<Vec<LandmarkFrame>, serde_json::Error> {
    jsonl
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(serde_json::from_str)
        .collect()
}

/// Parse the header from the first comment line, if it holds one.
pub fn parse_header(jsonl: &str) -> Option<LandmarkStreamHeader> {
    let first = jsonl.lines().map(str::trim).find(|l| !l.is_empty())?;
    let body = first.strip_prefix('#')?.trim();
    serde_json::from_str(body).ok()
}

/// Serialize frames to JSONL, preceded by an optional header comment.
pub fn serialize_frames(
    header: Option<&LandmarkStreamHeader>,
    frames: &[LandmarkFrame],
) -> Result<String, serde_json::Error> {
    let mut output = String::new();
    if let Some(header) = header {
        output.push_str("# ");
        output.push_str(&serde_json::to_string(header)?);
        output.push('\n');
    }
    for frame in frames {
        output.push_str(&serde_json::to_string(frame)?);
        output.push('\n');
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmark::{LandmarkPoint, LEFT_HIP};

    #[test]
    fn test_parse_skips_header_and_blank_lines() {
        let jsonl = "# {\"schema_version\":\"1.0\",\"fps\":30}\n\n{\"t\":0,\"landmarks\":[]}\n";
        let frames = parse_frames(jsonl).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].timestamp_ns(), Some(0));
    }

    #[test]
    fn test_parse_header() {
        let jsonl = "# {\"schema_version\":\"1.0\",\"source\":\"mediapipe\",\"fps\":30}\n";
        let header = parse_header(jsonl).unwrap();
        assert_eq!(header.fps, Some(30));
        assert_eq!(header.source.as_deref(), Some("mediapipe"));
    }

    #[test]
    fn test_missing_header() {
        assert!(parse_header("{\"landmarks\":[]}\n").is_none());
        assert!(parse_header("# just a comment\n").is_none());
    }

    #[test]
    fn test_serialize_then_parse_keeps_frames() {
        let frames = vec![
            LandmarkFrame::empty().with_timestamp(0),
            LandmarkFrame::empty()
                .with_timestamp(33_333_333)
                .with_point(LEFT_HIP, LandmarkPoint::new(0.4, 0.5, 0.9))
                .unwrap(),
        ];
        let header = LandmarkStreamHeader {
            fps: Some(30),
            ..Default::default()
        };

        let jsonl = serialize_frames(Some(&header), &frames).unwrap();
        assert!(jsonl.starts_with("# {"));
        assert_eq!(parse_header(&jsonl), Some(header));
        assert_eq!(parse_frames(&jsonl).unwrap(), frames);
    }

    #[test]
    fn test_parse_reports_bad_line() {
        assert!(parse_frames("{\"landmarks\":[]}\nnot json\n").is_err());
    }
}
