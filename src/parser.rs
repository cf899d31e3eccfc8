//! Streaming reader for `svn log --xml` output.
//!
//! [`LogEntryStream`] pulls XML events one at a time from a buffered reader
//! and yields a [`LogEntry`] as soon as the closing `</logentry>` tag is read.
//! The event buffer is cleared after every event and only the entry under
//! construction is held, so resident memory stays flat no matter how many
//! entries the log contains.

use crate::error::{AnalyzerError, Result};
use crate::models::{EntryDate, LogEntry};
use crate::timestamp_parser::TimestampParser;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind};
use std::path::Path;
use tracing::{debug, trace};

const ENTRY_TAG: &[u8] = b"logentry";
const DATE_TAG: &[u8] = b"date";
const PATH_TAG: &[u8] = b"path";

/// Default read buffer for log files.
pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

// Trait for consumers that are fed entries one by one
pub trait EntryProcessor {
    type Output;

    /// Returning an error aborts the stream.
    fn process_entry(&mut self, entry: LogEntry) -> Result<()>;
    fn finalize(self) -> Result<Self::Output>;
}

/// Open `path` and wrap it in a [`LogEntryStream`].
pub fn open_log(path: &Path, buffer_size: usize) -> Result<LogEntryStream<BufReader<File>>> {
    let file = File::open(path).map_err(|source| match source.kind() {
        ErrorKind::NotFound => AnalyzerError::InputNotFound {
            path: path.to_path_buf(),
        },
        _ => AnalyzerError::InputUnreadable {
            path: path.to_path_buf(),
            source,
        },
    })?;

    let metadata = file.metadata().map_err(|source| AnalyzerError::InputUnreadable {
        path: path.to_path_buf(),
        source,
    })?;
    if metadata.is_dir() {
        return Err(AnalyzerError::InputUnreadable {
            path: path.to_path_buf(),
            source: std::io::Error::new(ErrorKind::Other, "is a directory"),
        });
    }

    debug!(path = %path.display(), size_bytes = metadata.len(), "Opened log file");
    Ok(LogEntryStream::new(BufReader::with_capacity(buffer_size, file)))
}

/// Stream every entry of the log at `path` into `processor`.
pub fn process_log_file<P: EntryProcessor>(
    path: &Path,
    buffer_size: usize,
    processor: P,
) -> Result<P::Output> {
    let stream = open_log(path, buffer_size)?;
    process_entries(stream, processor)
}

/// Drive `processor` over an already-constructed entry source.
pub fn process_entries<I, P>(entries: I, mut processor: P) -> Result<P::Output>
where
    I: IntoIterator<Item = Result<LogEntry>>,
    P: EntryProcessor,
{
    for entry in entries {
        processor.process_entry(entry?)?;
    }
    processor.finalize()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Date,
    Path,
}

/// The `logentry` element currently being read.
#[derive(Debug)]
struct PartialEntry {
    depth: usize,
    revision: Option<u64>,
    date_text: Option<String>,
    paths: Vec<String>,
    // Field being captured, with the depth of its element.
    field: Option<(Field, usize, String)>,
}

impl PartialEntry {
    fn new(start: &BytesStart<'_>, depth: usize) -> Self {
        Self {
            depth,
            revision: revision_of(start),
            date_text: None,
            paths: Vec::new(),
            field: None,
        }
    }

    fn field_for(&self, name: &[u8], depth: usize) -> Option<Field> {
        if self.field.is_some() {
            return None;
        }
        match name {
            DATE_TAG if depth == self.depth + 1 && self.date_text.is_none() => Some(Field::Date),
            PATH_TAG => Some(Field::Path),
            _ => None,
        }
    }

    fn store(&mut self, field: Field, text: String) {
        match field {
            Field::Date => self.date_text = Some(text),
            Field::Path => self.paths.push(text),
        }
    }

    fn finish(self) -> LogEntry {
        let date = match self.date_text {
            None => EntryDate::Missing,
            Some(text) if text.trim().is_empty() => EntryDate::Missing,
            Some(text) => match TimestampParser::parse(&text) {
                Ok(dt) => EntryDate::Valid(dt),
                Err(_) => EntryDate::Invalid(text),
            },
        };

        LogEntry {
            revision: self.revision,
            date,
            paths: self.paths,
        }
    }
}

fn revision_of(start: &BytesStart<'_>) -> Option<u64> {
    let attr = start.try_get_attribute("revision").ok().flatten()?;
    attr.unescape_value().ok()?.trim().parse().ok()
}

/// Where the reader is relative to the document element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RootState {
    NotSeen,
    Open,
    Closed,
}

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

fn parse_error<R>(reader: &Reader<R>, message: String) -> AnalyzerError {
    AnalyzerError::Parse {
        position: reader.buffer_position() as u64,
        message,
    }
}

fn junk_after_root<R>(reader: &Reader<R>) -> AnalyzerError {
    parse_error(reader, "junk after document element".to_string())
}

/// Lazy, forward-only sequence of [`LogEntry`] values read from XML.
///
/// Any syntax error is fatal: the stream yields one `Err` and then ends.
pub struct LogEntryStream<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    depth: usize,
    root: RootState,
    // Markup other than the root was read (declaration, comment, ...).
    saw_markup: bool,
    entry: Option<PartialEntry>,
    finished: bool,
    high_water: usize,
    entries_yielded: u64,
}

impl<R: BufRead> LogEntryStream<R> {
    pub fn new(source: R) -> Self {
        let mut reader = Reader::from_reader(source);
        reader.config_mut().check_end_names = true;

        Self {
            reader,
            buf: Vec::new(),
            depth: 0,
            root: RootState::NotSeen,
            saw_markup: false,
            entry: None,
            finished: false,
            high_water: 0,
            entries_yielded: 0,
        }
    }

    /// Largest number of bytes the event buffer held for a single event.
    pub fn buffer_high_water(&self) -> usize {
        self.high_water
    }

    pub fn entries_yielded(&self) -> u64 {
        self.entries_yielded
    }

    fn next_entry(&mut self) -> Result<Option<LogEntry>> {
        loop {
            // Record the previous event's size before the buffer is reused.
            self.high_water = self.high_water.max(self.buf.len());
            self.buf.clear();
            let event = match self.reader.read_event_into(&mut self.buf) {
                Ok(event) => event,
                Err(quick_xml::Error::Io(err)) => {
                    return Err(AnalyzerError::Io(std::io::Error::new(err.kind(), err.to_string())))
                }
                Err(err) => return Err(parse_error(&self.reader, err.to_string())),
            };

            match event {
                Event::Start(start) => {
                    if self.depth == 0 && self.root == RootState::Closed {
                        return Err(junk_after_root(&self.reader));
                    }
                    self.root = RootState::Open;
                    self.depth += 1;
                    let depth = self.depth;
                    match self.entry.as_mut() {
                        None if start.local_name().as_ref() == ENTRY_TAG => {
                            self.entry = Some(PartialEntry::new(&start, depth));
                        }
                        Some(entry) => {
                            if let Some(field) = entry.field_for(start.local_name().as_ref(), depth) {
                                entry.field = Some((field, depth, String::new()));
                            }
                        }
                        None => {}
                    }
                }
                Event::Empty(start) => {
                    if self.depth == 0 {
                        if self.root == RootState::Closed {
                            return Err(junk_after_root(&self.reader));
                        }
                        self.root = RootState::Closed;
                    }
                    let depth = self.depth + 1;
                    match self.entry.as_mut() {
                        None if start.local_name().as_ref() == ENTRY_TAG => {
                            let entry = PartialEntry::new(&start, depth).finish();
                            return Ok(Some(entry));
                        }
                        Some(entry) => {
                            if let Some(field) = entry.field_for(start.local_name().as_ref(), depth) {
                                entry.store(field, String::new());
                            }
                        }
                        None => {}
                    }
                }
                Event::Text(text) => {
                    if self.depth == 0 {
                        let raw: &[u8] = &text;
                        let bytes = raw.strip_prefix(UTF8_BOM).unwrap_or(raw);
                        if !bytes.iter().all(u8::is_ascii_whitespace) {
                            let message = "text outside the document element".to_string();
                            return Err(parse_error(&self.reader, message));
                        }
                        continue;
                    }
                    if let Some((_, _, captured)) =
                        self.entry.as_mut().and_then(|e| e.field.as_mut())
                    {
                        let unescaped = text.unescape().map_err(|err| err.to_string());
                        match unescaped {
                            Ok(value) => captured.push_str(&value),
                            Err(message) => return Err(parse_error(&self.reader, message)),
                        }
                    }
                }
                Event::CData(cdata) => {
                    if self.depth == 0 {
                        let message = "CDATA outside the document element".to_string();
                        return Err(parse_error(&self.reader, message));
                    }
                    if let Some((_, _, captured)) =
                        self.entry.as_mut().and_then(|e| e.field.as_mut())
                    {
                        match cdata.decode().map_err(|err| err.to_string()) {
                            Ok(value) => captured.push_str(&value),
                            Err(message) => return Err(parse_error(&self.reader, message)),
                        }
                    }
                }
                Event::End(_) => {
                    let depth = self.depth;
                    self.depth = self.depth.saturating_sub(1);
                    if self.depth == 0 {
                        self.root = RootState::Closed;
                    }

                    let Some(entry) = self.entry.as_mut() else {
                        continue;
                    };
                    if entry.field.as_ref().is_some_and(|(_, d, _)| *d == depth) {
                        if let Some((field, _, text)) = entry.field.take() {
                            entry.store(field, text);
                        }
                    }
                    if entry.depth == depth {
                        if let Some(done) = self.entry.take() {
                            return Ok(Some(done.finish()));
                        }
                    }
                }
                Event::Eof => {
                    if self.depth > 0 {
                        return Err(parse_error(&self.reader, format!(
                            "unexpected end of input with {} unclosed element(s)",
                            self.depth
                        )));
                    }
                    // Blank input is an empty log; anything else needs a root.
                    if self.root == RootState::NotSeen && self.saw_markup {
                        return Err(parse_error(&self.reader, "no element found".to_string()));
                    }
                    return Ok(None);
                }
                _ => self.saw_markup = true,
            }
        }
    }
}

impl<R: BufRead> Iterator for LogEntryStream<R> {
    type Item = Result<LogEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match self.next_entry() {
            Ok(Some(entry)) => {
                self.entries_yielded += 1;
                trace!(revision = ?entry.revision, paths = entry.paths.len(), "Yielding log entry");
                Some(Ok(entry))
            }
            Ok(None) => {
                self.finished = true;
                debug!(
                    entries = self.entries_yielded,
                    buffer_high_water = self.high_water,
                    "Reached end of log"
                );
                None
            }
            Err(err) => {
                self.finished = true;
                Some(Err(err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn stream(xml: &str) -> LogEntryStream<Cursor<Vec<u8>>> {
        LogEntryStream::new(Cursor::new(xml.as_bytes().to_vec()))
    }

    fn collect(xml: &str) -> Result<Vec<LogEntry>> {
        stream(xml).collect()
    }

    #[test]
    fn test_reads_entries_in_order() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<log>
<logentry revision="2">
<author>alice</author>
<date>2024-01-15T10:30:00.000000Z</date>
<paths>
<path action="M" kind="file">/trunk/a.py</path>
<path action="A" kind="file">/trunk/b.py</path>
</paths>
<msg>first</msg>
</logentry>
<logentry revision="1">
<date>2024-01-14T09:00:00.000000Z</date>
<paths><path action="D">/trunk/c.py</path></paths>
</logentry>
</log>"#;

        let entries = collect(xml).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].revision, Some(2));
        assert_eq!(entries[0].paths, vec!["/trunk/a.py", "/trunk/b.py"]);
        assert_eq!(
            entries[0].date.valid().map(|d| d.to_rfc3339()),
            Some("2024-01-15T10:30:00+00:00".to_string())
        );
        assert_eq!(entries[1].paths, vec!["/trunk/c.py"]);
    }

    #[test]
    fn test_missing_and_invalid_dates() {
        let xml = r#"<log>
<logentry revision="1"><paths><path>/a</path></paths></logentry>
<logentry revision="2"><date></date><paths><path>/b</path></paths></logentry>
<logentry revision="3"><date>yesterday</date><paths><path>/c</path></paths></logentry>
</log>"#;

        let entries = collect(xml).unwrap();
        assert_eq!(entries[0].date, EntryDate::Missing);
        assert_eq!(entries[1].date, EntryDate::Missing);
        assert_eq!(entries[2].date, EntryDate::Invalid("yesterday".to_string()));
        assert_eq!(entries[2].paths, vec!["/c"]);
    }

    #[test]
    fn test_empty_elements() {
        let xml = r#"<log><logentry revision="7"/><logentry><date/><paths><path/></paths></logentry></log>"#;

        let entries = collect(xml).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].revision, Some(7));
        assert!(entries[0].paths.is_empty());
        assert_eq!(entries[1].date, EntryDate::Missing);
        assert_eq!(entries[1].paths, vec![String::new()]);
    }

    #[test]
    fn test_entities_are_unescaped() {
        let xml = r#"<log><logentry><paths><path>/trunk/R&amp;D/notes.txt</path><path><![CDATA[/trunk/x<y>.c]]></path></paths></logentry></log>"#;

        let entries = collect(xml).unwrap();
        assert_eq!(entries[0].paths, vec!["/trunk/R&D/notes.txt", "/trunk/x<y>.c"]);
    }

    #[test]
    fn test_only_direct_date_child_is_used() {
        let xml = r#"<log><logentry><meta><date>2000-01-01</date></meta><date>2024-05-01T00:00:00Z</date></logentry></log>"#;

        let entries = collect(xml).unwrap();
        assert_eq!(
            entries[0].date.valid().map(|d| d.to_rfc3339()),
            Some("2024-05-01T00:00:00+00:00".to_string())
        );
    }

    #[test]
    fn test_empty_log() {
        assert!(collect("<?xml version=\"1.0\"?><log></log>").unwrap().is_empty());
        assert!(collect("<log/>").unwrap().is_empty());
        assert!(collect("").unwrap().is_empty());
    }

    #[test]
    fn test_blank_input_is_empty_log() {
        assert!(collect("  \n\t\n").unwrap().is_empty());
        assert!(collect("\u{feff}<log/>\n").unwrap().is_empty());
        assert!(collect("<!-- svn log --xml -->\n<log></log>\n").unwrap().is_empty());
    }

    #[test]
    fn test_input_without_root_is_fatal() {
        for input in [
            "this is not xml",
            r#"{"log": [{"revision": 1}]}"#,
            "<?xml version=\"1.0\"?>",
            "<?xml version=\"1.0\"?>\n<!-- nothing here -->\n",
        ] {
            let err = collect(input).unwrap_err();
            assert!(matches!(err, AnalyzerError::Parse { .. }), "{input:?} gave {err:?}");
        }
    }

    #[test]
    fn test_content_after_root_is_fatal() {
        for input in [
            "<log></log>garbage",
            "<log/><![CDATA[x]]>",
            "<log></log><log></log>",
            "<log/><log/>",
        ] {
            let err = collect(input).unwrap_err();
            assert!(matches!(err, AnalyzerError::Parse { .. }), "{input:?} gave {err:?}");
        }
    }

    #[test]
    fn test_second_root_fails_after_first_entries() {
        let mut entries = stream(
            "<log><logentry><paths><path>/a</path></paths></logentry></log>\n\
             <log><logentry><paths><path>/b</path></paths></logentry></log>",
        );
        assert_eq!(entries.next().unwrap().unwrap().paths, vec!["/a"]);
        assert!(matches!(entries.next(), Some(Err(AnalyzerError::Parse { .. }))));
        assert!(entries.next().is_none());
    }

    #[test]
    fn test_invalid_utf8_in_cdata_is_fatal() {
        let xml = b"<log><logentry><paths><path><![CDATA[/trunk/\xff.c]]></path></paths></logentry></log>";
        let err = LogEntryStream::new(Cursor::new(xml.to_vec()))
            .collect::<Result<Vec<_>>>()
            .unwrap_err();
        assert!(matches!(err, AnalyzerError::Parse { .. }), "unexpected error: {err:?}");
    }

    #[test]
    fn test_mismatched_tag_is_fatal() {
        let xml = "<log><logentry><date>2024-01-01</date></paths></logentry></log>";
        let err = collect(xml).unwrap_err();
        assert!(matches!(err, AnalyzerError::Parse { .. }));
    }

    #[test]
    fn test_truncated_input_is_fatal() {
        let xml = "<log><logentry><paths><path>/a</path>";
        let err = collect(xml).unwrap_err();
        assert!(matches!(err, AnalyzerError::Parse { .. }), "unexpected error: {err:?}");
    }

    #[test]
    fn test_stream_ends_after_error() {
        let mut entries = stream("<log><logentry></oops></log>");
        assert!(matches!(entries.next(), Some(Err(_))));
        assert!(entries.next().is_none());
    }

    #[test]
    fn test_entries_before_error_are_yielded_lazily() {
        let mut entries = stream("<log><logentry><paths><path>/a</path></paths></logentry><logentry></bad>");
        let first = entries.next().unwrap().unwrap();
        assert_eq!(first.paths, vec!["/a"]);
        assert!(entries.next().unwrap().is_err());
    }

    #[test]
    fn test_buffer_does_not_grow_with_entry_count() {
        fn log_with(n: usize) -> String {
            let mut xml = String::from("<log>");
            for i in 0..n {
                xml.push_str(&format!(
                    "<logentry revision=\"{i}\"><date>2024-01-01T00:00:00Z</date><paths><path>/trunk/f{}.rs</path></paths></logentry>",
                    i % 10
                ));
            }
            xml.push_str("</log>");
            xml
        }

        let mut small = stream(&log_with(10));
        assert_eq!(small.by_ref().count(), 10);

        let mut large = stream(&log_with(10_000));
        assert_eq!(large.by_ref().count(), 10_000);

        assert_eq!(large.entries_yielded(), 10_000);
        assert!(large.buffer_high_water() <= small.buffer_high_water() + 8);
    }

    struct PathCollector(Vec<String>);

    impl EntryProcessor for PathCollector {
        type Output = Vec<String>;

        fn process_entry(&mut self, entry: LogEntry) -> Result<()> {
            self.0.extend(entry.paths);
            Ok(())
        }

        fn finalize(self) -> Result<Self::Output> {
            Ok(self.0)
        }
    }

    #[test]
    fn test_process_entries_drives_processor() {
        let xml = "<log><logentry><paths><path>/a</path></paths></logentry><logentry><paths><path>/b</path></paths></logentry></log>";
        let paths = process_entries(stream(xml), PathCollector(Vec::new())).unwrap();
        assert_eq!(paths, vec!["/a", "/b"]);
    }

    #[test]
    fn test_open_missing_file() {
        let result = open_log(Path::new("/definitely/not/here.xml"), DEFAULT_BUFFER_SIZE);
        assert!(matches!(result, Err(AnalyzerError::InputNotFound { .. })));
    }
}
