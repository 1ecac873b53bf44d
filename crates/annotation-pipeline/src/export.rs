//! Grouped per-message export of the sink contents.

use annotation_core::{AnnotationResult, IssuerId, MessageId, ParsedRecord, SentimentScore};
use serde::Serialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

/// `[issuer_id, sentiment_score]` pairs for one message.
pub type MessageScores = Vec<(IssuerId, SentimentScore)>;

/// Group records by message, in first-appearance order of each message id.
pub fn group_by_message(records: &[ParsedRecord]) -> Vec<MessageScores> {
    let mut positions: HashMap<MessageId, usize> = HashMap::new();
    let mut groups: Vec<MessageScores> = Vec::new();

    for record in records {
        let pos = *positions.entry(record.message_id).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[pos].push((record.issuer_id, record.sentiment_score));
    }
    groups
}

pub fn read_records_from<R: Read>(reader: R) -> AnnotationResult<Vec<ParsedRecord>> {
    let mut reader = csv::Reader::from_reader(reader);
    let records = reader.deserialize().collect::<Result<Vec<ParsedRecord>, _>>()?;
    Ok(records)
}

/// Read a sink file back into records.
pub fn read_records(path: impl AsRef<Path>) -> AnnotationResult<Vec<ParsedRecord>> {
    read_records_from(File::open(path)?)
}

/// Pretty JSON with one-space indentation; non-ASCII text is kept as is.
pub fn write_grouped_json<W: Write>(writer: W, groups: &[MessageScores]) -> AnnotationResult<()> {
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b" ");
    let mut serializer = serde_json::Serializer::with_formatter(writer, formatter);
    groups.serialize(&mut serializer)?;
    Ok(())
}

pub fn save_grouped_json(path: impl AsRef<Path>, groups: &[MessageScores]) -> AnnotationResult<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_grouped_json(&mut writer, groups)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::RecordSink;

    fn record(message_id: i64, issuer_id: i64, score: i64) -> ParsedRecord {
        ParsedRecord {
            channel_id: 1,
            message_id,
            issuer_id,
            sentiment_score: SentimentScore::try_from(score).unwrap(),
            processed_text: format!("#T{}: x Оценка: {}", issuer_id, score),
        }
    }

    #[test]
    fn test_group_by_message_keeps_first_appearance() {
        let records = vec![record(20, 1, 3), record(10, 2, 4), record(20, 3, 1)];
        let groups = group_by_message(&records);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].len(), 2);
        assert_eq!(groups[0][1].0, 3);
        assert_eq!(groups[1][0].0, 2);
    }

    #[test]
    fn test_sink_output_reads_back() {
        let records = vec![record(1, 7, 3), record(2, 8, 0)];
        let mut sink = RecordSink::new(Vec::new()).unwrap();
        for r in &records {
            sink.append(r).unwrap();
        }
        let bytes = sink.finish().unwrap();

        let read = read_records_from(bytes.as_slice()).unwrap();
        assert_eq!(read, records);
    }

    #[test]
    fn test_grouped_json_shape() {
        let groups = group_by_message(&[record(1, 7, 3), record(1, 8, 5), record(2, 9, 0)]);
        let mut out = Vec::new();
        write_grouped_json(&mut out, &groups).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value, serde_json::json!([[[7, 3], [8, 5]], [[9, 0]]]));
    }

    #[test]
    fn test_save_grouped_json_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scores.json");
        save_grouped_json(&path, &group_by_message(&[record(1, 7, 3)])).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("[\n [\n  [\n   7,"));
    }
}
