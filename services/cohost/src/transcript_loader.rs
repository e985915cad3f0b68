use anyhow::{Context, Result};
use cohost_core::segment::TranscriptSegment;
use std::fs;
use std::path::Path;

/// Reads a JSON-lines transcript, one `TranscriptSegment` per line.
pub fn load_segments(path: &Path) -> Result<Vec<TranscriptSegment>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read transcript file: {}", path.display()))?;
    parse_segments(&content)
        .with_context(|| format!("Invalid transcript file: {}", path.display()))
}

/// Blank lines are skipped. Segments must be in chronological order.
pub fn parse_segments(content: &str) -> Result<Vec<TranscriptSegment>> {
    let mut segments: Vec<TranscriptSegment> = Vec::new();

    for (idx, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let segment: TranscriptSegment = serde_json::from_str(line)
            .with_context(|| format!("Line {} is not a transcript segment", idx + 1))?;

        if let Some(previous) = segments.last() {
            anyhow::ensure!(
                segment.timestamp >= previous.timestamp,
                "Line {} goes back in time ({} < {})",
                idx + 1,
                segment.timestamp,
                previous.timestamp
            );
        }
        segments.push(segment);
    }

    Ok(segments)
}
