//! Run output
//!
//! The run summary is printed to stdout as a single JSON object, after the
//! log lines of the run.

use std::io::{self, Write};

use crate::ingest::IngestSummary;

use super::errors::CliResult;

/// Write the run summary to stdout
pub fn write_summary(summary: &IngestSummary) -> CliResult<()> {
    let mut stdout = io::stdout();
    write_summary_to(&mut stdout, summary)
}

fn write_summary_to<W: Write>(out: &mut W, summary: &IngestSummary) -> CliResult<()> {
    let response = serde_json::json!({
        "status": "ok",
        "summary": summary,
        "key_sets_match": summary.key_sets_match(),
    });

    serde_json::to_writer(&mut *out, &response)?;
    writeln!(out)?;
    out.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::IngestMetrics;
    use uuid::Uuid;

    #[test]
    fn test_summary_is_one_json_line() {
        let summary = IngestSummary {
            run_id: Uuid::nil(),
            records: 2,
            labels_written: 2,
            images_written: 1,
            images_skipped: 1,
            label_commits: 1,
            image_commits: 1,
            metrics: IngestMetrics::new().snapshot(),
        };

        let mut buf = Vec::new();
        write_summary_to(&mut buf, &summary).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.lines().count(), 1);

        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed["status"], "ok");
        assert_eq!(parsed["summary"]["images_skipped"], 1);
        assert_eq!(parsed["key_sets_match"], false);
    }
}
