use annotation_core::{AnnotationResult, ParsedRecord};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Flush after this many accepted records.
pub const FLUSH_INTERVAL: usize = 100;

pub const COLUMNS: [&str; 5] = [
    "channel_id",
    "message_id",
    "issuer_id",
    "sentiment_score",
    "processed_text",
];

/// Append-only CSV stream of parsed records.
///
/// The header is written once, unquoted. Every record field is
/// double-quoted with embedded quotes doubled.
pub struct RecordSink<W: Write> {
    writer: csv::Writer<W>,
    accepted: usize,
}

impl RecordSink<BufWriter<File>> {
    pub fn create(path: impl AsRef<Path>) -> AnnotationResult<Self> {
        let file = File::create(path)?;
        Self::new(BufWriter::new(file))
    }
}

impl<W: Write> RecordSink<W> {
    pub fn new(mut inner: W) -> AnnotationResult<Self> {
        writeln!(inner, "{}", COLUMNS.join(","))?;
        let writer = csv::WriterBuilder::new()
            .has_headers(false)
            .quote_style(csv::QuoteStyle::Always)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(inner);
        Ok(Self {
            writer,
            accepted: 0,
        })
    }

    pub fn append(&mut self, record: &ParsedRecord) -> AnnotationResult<()> {
        self.writer.serialize(record)?;
        self.accepted += 1;
        if self.accepted % FLUSH_INTERVAL == 0 {
            self.writer.flush()?;
        }
        Ok(())
    }

    pub fn accepted(&self) -> usize {
        self.accepted
    }

    pub fn flush(&mut self) -> AnnotationResult<()> {
        self.writer.flush()?;
        Ok(())
    }

    /// Final flush; returns the underlying writer.
    pub fn finish(self) -> AnnotationResult<W> {
        self.writer
            .into_inner()
            .map_err(|e| e.into_error().into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use annotation_core::SentimentScore;
    use std::io;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn record(message_id: i64, text: &str) -> ParsedRecord {
        ParsedRecord {
            channel_id: 5,
            message_id,
            issuer_id: 7,
            sentiment_score: SentimentScore::try_from(3).unwrap(),
            processed_text: text.to_string(),
        }
    }

    /// Counts flushes that reach the underlying writer.
    struct CountingWriter {
        buf: Vec<u8>,
        flushes: Arc<AtomicUsize>,
    }

    impl Write for CountingWriter {
        fn write(&mut self, data: &[u8]) -> io::Result<usize> {
            self.buf.extend_from_slice(data);
            Ok(data.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            self.flushes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn test_header_only_when_empty() {
        let sink = RecordSink::new(Vec::new()).unwrap();
        let out = String::from_utf8(sink.finish().unwrap()).unwrap();
        assert_eq!(out, "channel_id,message_id,issuer_id,sentiment_score,processed_text\n");
    }

    #[test]
    fn test_fields_quoted_and_quotes_doubled() {
        let mut sink = RecordSink::new(Vec::new()).unwrap();
        sink.append(&record(1, r#"#ABC ("Alpha"): note Оценка: 3"#)).unwrap();
        let out = String::from_utf8(sink.finish().unwrap()).unwrap();

        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1], r##""5","1","7","3","#ABC (""Alpha""): note Оценка: 3""##);
    }

    #[test]
    fn test_flushes_every_interval() {
        let flushes = Arc::new(AtomicUsize::new(0));
        let writer = CountingWriter {
            buf: Vec::new(),
            flushes: Arc::clone(&flushes),
        };
        let mut sink = RecordSink::new(writer).unwrap();

        for i in 0..(FLUSH_INTERVAL * 2 + 50) as i64 {
            sink.append(&record(i, "x")).unwrap();
        }
        assert_eq!(flushes.load(Ordering::SeqCst), 2);
        assert_eq!(sink.accepted(), FLUSH_INTERVAL * 2 + 50);

        let writer = sink.finish().unwrap();
        assert_eq!(flushes.load(Ordering::SeqCst), 3);
        let text = String::from_utf8(writer.buf).unwrap();
        assert_eq!(text.lines().count(), FLUSH_INTERVAL * 2 + 50 + 1);
    }

    #[test]
    fn test_create_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let mut sink = RecordSink::create(&path).unwrap();
        sink.append(&record(1, "line")).unwrap();
        sink.finish().unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.ends_with("\"5\",\"1\",\"7\",\"3\",\"line\"\n"));
    }
}
