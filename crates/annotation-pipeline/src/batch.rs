use annotation_core::{AnnotationResult, RawResult, ResponseParser};
use std::io::Write;

use crate::sink::RecordSink;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchStats {
    /// Raw results consumed.
    pub results: usize,
    /// Raw results without a usable completion.
    pub skipped: usize,
    /// Records appended to the sink.
    pub records: usize,
}

/// Parse every raw result in consumption order and append the records.
///
/// Parse problems never stop the batch; only sink I/O errors are returned.
pub fn write_records<W: Write>(
    results: &[RawResult],
    parser: &ResponseParser<'_>,
    sink: &mut RecordSink<W>,
) -> AnnotationResult<BatchStats> {
    let mut stats = BatchStats::default();

    for raw in results {
        stats.results += 1;
        if raw.completion_text().is_err() {
            stats.skipped += 1;
        }
        for record in parser.parse_result(raw) {
            sink.append(&record)?;
            stats.records += 1;
        }
    }

    sink.flush()?;
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use annotation_core::{DirectoryEntry, DirectoryIndex, FailureMarker, Message};
    use serde_json::json;

    fn message(id: i64) -> Message {
        Message {
            message_id: id,
            channel_id: 9,
            issuer_id: None,
            text: String::new(),
        }
    }

    fn completed(id: i64, content: &str) -> RawResult {
        RawResult::completed(message(id), json!({"choices": [{"message": {"content": content}}]}))
    }

    #[test]
    fn test_write_records_mixed_batch() {
        let index = DirectoryIndex::build(&[DirectoryEntry::new(7, ["ABC"]), DirectoryEntry::new(8, ["Delta"])]);
        let parser = ResponseParser::new(&index);
        let results = vec![
            completed(1, "#ABC (Alpha): рост Оценка: 4\n#DLT (Delta): \"спад\" Оценка: 2"),
            RawResult::failed(message(2), FailureMarker::new("timeout", None)),
            completed(3, "garbage"),
            RawResult::completed(message(4), json!({"error": "quota"})),
            completed(5, "#ABC: ok Оценка: 5"),
        ];

        let mut sink = RecordSink::new(Vec::new()).unwrap();
        let stats = write_records(&results, &parser, &mut sink).unwrap();
        assert_eq!(
            stats,
            BatchStats {
                results: 5,
                skipped: 2,
                records: 3
            }
        );

        let out = String::from_utf8(sink.finish().unwrap()).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[1], r##""9","1","7","4","#ABC (Alpha): рост Оценка: 4""##);
        assert_eq!(lines[2], r##""9","1","8","2","#DLT (Delta): ""спад"" Оценка: 2""##);
        assert_eq!(lines[3], r##""9","5","7","5","#ABC: ok Оценка: 5""##);
    }

    #[test]
    fn test_all_failures_give_header_only() {
        let index = DirectoryIndex::build(&[DirectoryEntry::new(7, ["ABC"])]);
        let parser = ResponseParser::new(&index);
        let results: Vec<_> = (0..3)
            .map(|i| RawResult::failed(message(i), FailureMarker::new("Failed to process message", None)))
            .collect();

        let mut sink = RecordSink::new(Vec::new()).unwrap();
        let stats = write_records(&results, &parser, &mut sink).unwrap();
        assert_eq!(stats.records, 0);
        assert_eq!(stats.skipped, 3);

        let out = String::from_utf8(sink.finish().unwrap()).unwrap();
        assert_eq!(out.lines().count(), 1);
    }
}
