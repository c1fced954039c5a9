//! SRT cue reader.
//!
//! A SubRip file is a sequence of cues:
//!
//! ```text
//! 1
//! 00:00:01,000 --> 00:00:02,000
//! First line
//! Second line
//!
//! 2
//! ...
//! ```
//!
//! Parsing runs a three-state machine over raw lines (index → timestamp →
//! content) so oddities like blank lines between cues and a trailing cue
//! without a terminating blank line behave the way the consumer editor's own
//! importer does.

use crate::error::{DraftError, Result};
use crate::time::{srt_timestamp, Timerange};

/// One subtitle cue: where it sits on the timeline and what it says.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SrtCue {
    pub range: Timerange,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReadState {
    Index,
    Timestamp,
    Content,
}

/// Parse SRT `content` into cues, shifting every cue by `time_offset`
/// microseconds. A malformed index or timestamp line aborts the whole parse.
pub fn parse_srt(content: &str, time_offset: i64) -> Result<Vec<SrtCue>> {
    // Files written by Windows tools often carry a BOM and CRLF endings.
    let content = content.trim_start_matches('\u{feff}').replace("\r\n", "\n");

    let mut cues = Vec::new();
    let mut state = ReadState::Index;
    let mut text = String::new();
    let mut range = Timerange::new(0, 0);

    for (number, raw_line) in content.lines().enumerate() {
        let line_number = number + 1;
        let line = raw_line.trim();
        match state {
            ReadState::Index => {
                if line.is_empty() {
                    continue;
                }
                if !line.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(DraftError::SrtParse {
                        line: line_number,
                        message: format!("expected a cue number, got '{line}'"),
                    });
                }
                state = ReadState::Timestamp;
            }
            ReadState::Timestamp => {
                let (start_str, end_str) =
                    line.split_once(" --> ")
                        .ok_or_else(|| DraftError::SrtParse {
                            line: line_number,
                            message: format!("expected 'start --> end', got '{line}'"),
                        })?;
                let start = srt_timestamp(start_str).map_err(|_| DraftError::SrtParse {
                    line: line_number,
                    message: format!("bad timestamp '{start_str}'"),
                })?;
                let end = srt_timestamp(end_str).map_err(|_| DraftError::SrtParse {
                    line: line_number,
                    message: format!("bad timestamp '{end_str}'"),
                })?;
                range = Timerange::new(start + time_offset, end - start);
                state = ReadState::Content;
            }
            ReadState::Content => {
                if line.is_empty() {
                    cues.push(SrtCue {
                        range,
                        text: std::mem::take(&mut text).trim().to_string(),
                    });
                    state = ReadState::Index;
                } else {
                    text.push_str(line);
                    text.push('\n');
                }
            }
        }
    }

    // Trailing cue without a terminating blank line.
    if !text.is_empty() {
        cues.push(SrtCue {
            range,
            text: text.trim().to_string(),
        });
    }

    Ok(cues)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASIC: &str = "1\n00:00:01,000 --> 00:00:02,000\nHello\n\n2\n00:00:03,000 --> 00:00:04,500\nWorld\n";

    #[test]
    fn parses_two_cues() {
        let cues = parse_srt(BASIC, 0).unwrap();
        assert_eq!(cues.len(), 2);
        assert_eq!(cues[0].range, Timerange::new(1_000_000, 1_000_000));
        assert_eq!(cues[0].text, "Hello");
        assert_eq!(cues[1].range, Timerange::new(3_000_000, 1_500_000));
        assert_eq!(cues[1].text, "World");
    }

    #[test]
    fn applies_time_offset() {
        let cues = parse_srt(BASIC, 500_000).unwrap();
        assert_eq!(cues[0].range.start, 1_500_000);
        // Offset shifts, never stretches.
        assert_eq!(cues[0].range.duration, 1_000_000);
    }

    #[test]
    fn joins_multiline_text_and_flushes_trailing_cue() {
        let content = "1\n00:00:00,000 --> 00:00:01,000\nline one\nline two";
        let cues = parse_srt(content, 0).unwrap();
        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].text, "line one\nline two");
    }

    #[test]
    fn skips_blank_lines_between_cues() {
        let content = "\n\n1\n00:00:00,000 --> 00:00:01,000\nx\n\n\n\n2\n00:00:02,000 --> 00:00:03,000\ny\n";
        let cues = parse_srt(content, 0).unwrap();
        assert_eq!(cues.len(), 2);
    }

    #[test]
    fn strips_bom_and_crlf() {
        let content = "\u{feff}1\r\n00:00:01,000 --> 00:00:02,000\r\nHello\r\n\r\n";
        let cues = parse_srt(content, 0).unwrap();
        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].text, "Hello");
    }

    #[test]
    fn non_numeric_index_aborts_with_line_number() {
        let content = "1\n00:00:01,000 --> 00:00:02,000\nHello\n\nnot-a-number\n";
        let err = parse_srt(content, 0).unwrap_err();
        match err {
            DraftError::SrtParse { line, .. } => assert_eq!(line, 5),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn malformed_timestamp_aborts() {
        let content = "1\n00:00:01,000 -> 00:00:02,000\nHello\n";
        assert!(parse_srt(content, 0).is_err());
    }
}
