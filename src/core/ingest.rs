//! Streaming ingestion of a ports document.
//!
//! The source is one JSON object whose keys are port IDs. Entries are decoded
//! one at a time through a serde [`Visitor`], so memory stays proportional to
//! a single record no matter how large the document is.
//!
//! Failures fall into three classes:
//!
//! * the source cannot be opened, or does not start with an object, or an
//!   entry is not structurally a JSON object: the run stops;
//! * an entry is well-formed JSON but its `name` or `coordinates` are unusable:
//!   a warning is logged and the entry is skipped;
//! * the repository rejects a write: the run stops, naming the port.
//!
//! Records written before a fatal error stay written.

use crate::core::extract::FieldMap;
use crate::domain::model::{Coordinate, Port, PortDraft};
use crate::domain::ports::PortRepository;
use crate::utils::error::{PortError, Result};
use serde::de::{self, Deserializer as _, MapAccess, Visitor};
use serde_json::{Map, Value};
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Outcome of a completed run.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct IngestReport {
    pub written: u64,
    pub skipped: u64,
    pub elapsed: Duration,
}

impl IngestReport {
    pub fn ports_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.written as f64 / secs
        } else {
            0.0
        }
    }
}

/// Feeds one ports document into a repository.
///
/// Runs on the calling thread; callers on an async runtime should move it to
/// a blocking task.
pub struct PortIngestor {
    repository: Arc<dyn PortRepository>,
    cancel: CancellationToken,
}

impl PortIngestor {
    pub fn new(repository: Arc<dyn PortRepository>, cancel: CancellationToken) -> Self {
        Self { repository, cancel }
    }

    pub fn ingest_path(&self, path: &Path) -> Result<IngestReport> {
        let file = File::open(path).map_err(|source| PortError::SourceUnavailable {
            path: path.display().to_string(),
            source,
        })?;
        tracing::info!(path = %path.display(), "ingesting ports");
        self.ingest_reader(file)
    }

    pub fn ingest_reader<R: Read>(&self, reader: R) -> Result<IngestReport> {
        let started_at = Instant::now();
        let mut run = Run {
            repository: self.repository.as_ref(),
            cancel: &self.cancel,
            opened: false,
            position: None,
            abort: None,
            written: 0,
            skipped: 0,
        };

        let mut de = serde_json::Deserializer::from_reader(BufReader::new(reader));
        let decoded = (&mut de).deserialize_map(EntryVisitor { run: &mut run });

        if let Err(source) = decoded {
            if let Some(err) = run.abort.take() {
                if !err.is_cancelled() {
                    tracing::error!(error = %err, written = run.written, "ingestion aborted");
                }
                return Err(err);
            }
            let err = if run.opened {
                PortError::MalformedRecord {
                    after: run.position.take(),
                    source,
                }
            } else {
                PortError::MalformedStart { source }
            };
            tracing::error!(error = %err, written = run.written, "ingestion aborted");
            return Err(err);
        }

        let report = IngestReport {
            written: run.written,
            skipped: run.skipped,
            elapsed: started_at.elapsed(),
        };
        tracing::info!(
            written = report.written,
            skipped = report.skipped,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "ingestion finished"
        );
        Ok(report)
    }
}

/// Mutable state of one run, threaded through the visitor.
struct Run<'a> {
    repository: &'a dyn PortRepository,
    cancel: &'a CancellationToken,
    /// Set once the opening `{` has been consumed.
    opened: bool,
    /// Key of the entry being decoded, or the last one read.
    position: Option<String>,
    /// Typed failure that serde can only carry as a string.
    abort: Option<PortError>,
    written: u64,
    skipped: u64,
}

impl Run<'_> {
    fn fail<E: de::Error>(&mut self, err: PortError) -> E {
        let message = err.to_string();
        self.abort = Some(err);
        E::custom(message)
    }

    fn skip(&mut self, id: &str, field: &str, reason: &dyn fmt::Display) {
        self.skipped += 1;
        tracing::warn!(port_id = %id, field, reason = %reason, "skipping port");
    }

    fn accept(&mut self, id: String, fields: Option<Map<String, Value>>) -> Result<()> {
        // `null` decodes like an empty object and is skipped for its missing name.
        let fields = FieldMap::new(fields.unwrap_or_default());

        let name = match fields.require_string("name") {
            Ok(name) => name,
            Err(issue) => {
                self.skip(&id, "name", &issue);
                return Ok(());
            }
        };

        let city = fields.string_or("city", "");
        let country = fields.string_or("country", "");
        let province = fields.string_or("province", "");
        let timezone = fields.string_or("timezone", "");
        let code = fields.string_or("code", "");

        let (longitude, latitude) = match fields.number_pair("coordinates") {
            Ok(pair) => pair,
            Err(issue) => {
                self.skip(&id, "coordinates", &issue);
                return Ok(());
            }
        };
        if let Err(err) = Coordinate::new(longitude, latitude) {
            self.skip(&id, "coordinates", &err);
            return Ok(());
        }

        let draft = PortDraft {
            id: id.clone(),
            name,
            city,
            country,
            coordinates: vec![longitude, latitude],
            province,
            timezone,
            unlocs: Some(fields.string_list("unlocs")),
            code,
        };
        let port = match Port::new(draft) {
            Ok(port) => port,
            Err(err) => {
                self.skip(&id, "record", &err);
                return Ok(());
            }
        };

        match self.repository.save_port(self.cancel, port) {
            Ok(()) => {
                self.written += 1;
                tracing::debug!(port_id = %id, "port saved");
                Ok(())
            }
            Err(PortError::Cancelled) => Err(PortError::Cancelled),
            Err(source) => Err(PortError::StoreFailure {
                id,
                source: Box::new(source),
            }),
        }
    }
}

struct EntryVisitor<'r, 'a> {
    run: &'r mut Run<'a>,
}

impl<'de> Visitor<'de> for EntryVisitor<'_, '_> {
    type Value = ();

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a JSON object keyed by port ID")
    }

    fn visit_map<A>(self, mut entries: A) -> std::result::Result<(), A::Error>
    where
        A: MapAccess<'de>,
    {
        let run = self.run;
        run.opened = true;

        loop {
            // End of input wins over a late cancellation.
            let Some(id) = entries.next_key::<String>()? else {
                return Ok(());
            };
            if run.cancel.is_cancelled() {
                return Err(run.fail(PortError::Cancelled));
            }
            run.position = Some(id.clone());

            let fields = entries.next_value::<Option<Map<String, Value>>>()?;
            if let Err(err) = run.accept(id, fields) {
                return Err(run.fail(err));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryPortRepository;
    use crate::domain::model::RepositoryStats;

    fn ingest(repo: &Arc<InMemoryPortRepository>, doc: &str) -> Result<IngestReport> {
        let ingestor = PortIngestor::new(repo.clone(), CancellationToken::new());
        ingestor.ingest_reader(doc.as_bytes())
    }

    #[test]
    fn test_ingest_valid_document() {
        let repo = Arc::new(InMemoryPortRepository::new());
        let report = ingest(
            &repo,
            r#"{
                "AEAJM": {
                    "name": "Ajman",
                    "city": "Ajman",
                    "country": "United Arab Emirates",
                    "coordinates": [55.5136433, 25.4052165],
                    "province": "Ajman",
                    "timezone": "Asia/Dubai",
                    "unlocs": ["AEAJM"],
                    "code": "52000"
                },
                "AEAUH": {"name": "Abu Dhabi", "coordinates": [54.37, 24.47]}
            }"#,
        )
        .unwrap();

        assert_eq!(report.written, 2);
        assert_eq!(report.skipped, 0);

        let cancel = CancellationToken::new();
        let ajman = repo.get_port(&cancel, "AEAJM").unwrap().unwrap();
        assert_eq!(ajman.timezone, "Asia/Dubai");
        assert_eq!(ajman.unlocs, vec!["AEAJM".to_string()]);
        assert_eq!(ajman.code, "52000");
        let abu_dhabi = repo.get_port(&cancel, "AEAUH").unwrap().unwrap();
        assert_eq!(abu_dhabi.city, "");
        assert!(abu_dhabi.unlocs.is_empty());
    }

    #[test]
    fn test_semantically_invalid_entries_are_skipped() {
        let repo = Arc::new(InMemoryPortRepository::new());
        let report = ingest(
            &repo,
            r#"{
                "NONAME": {"coordinates": [1, 2]},
                "NUMNAME": {"name": 7, "coordinates": [1, 2]},
                "TEXTCOORDS": {"name": "a", "coordinates": "not-an-array"},
                "SHORT": {"name": "b", "coordinates": [1]},
                "STRCOORDS": {"name": "c", "coordinates": ["1", "2"]},
                "FAREAST": {"name": "d", "coordinates": [181, 0]},
                "FARNORTH": {"name": "e", "coordinates": [0, 91]},
                "": {"name": "no id", "coordinates": [0, 0]},
                "NULL": null,
                "VALID1": {"name": "Valid Port", "coordinates": [55.5136433, 25.4052165]}
            }"#,
        )
        .unwrap();

        assert_eq!(report.written, 1);
        assert_eq!(report.skipped, 9);
        let cancel = CancellationToken::new();
        assert!(repo.get_port(&cancel, "FAREAST").unwrap().is_none());
        assert!(repo.get_port(&cancel, "VALID1").unwrap().is_some());
        assert_eq!(repo.statistics().total_ports, 1);
    }

    #[test]
    fn test_unlocs_keep_only_strings() {
        let repo = Arc::new(InMemoryPortRepository::new());
        ingest(
            &repo,
            r#"{"A": {"name": "X", "coordinates": [1, 2], "unlocs": ["A1", 2, "A2", {}]},
                "B": {"name": "Y", "coordinates": [1, 2], "unlocs": "A1"}}"#,
        )
        .unwrap();

        let cancel = CancellationToken::new();
        let a = repo.get_port(&cancel, "A").unwrap().unwrap();
        assert_eq!(a.unlocs, vec!["A1".to_string(), "A2".to_string()]);
        let b = repo.get_port(&cancel, "B").unwrap().unwrap();
        assert!(b.unlocs.is_empty());
    }

    #[test]
    fn test_non_object_entry_aborts_run() {
        let repo = Arc::new(InMemoryPortRepository::new());
        let err = ingest(
            &repo,
            r#"{
                "FIRST": {"name": "First", "coordinates": [1, 2]},
                "BROKEN": "not an object",
                "AFTER": {"name": "After", "coordinates": [1, 2]}
            }"#,
        )
        .unwrap_err();

        match err {
            PortError::MalformedRecord { after, .. } => assert_eq!(after.as_deref(), Some("BROKEN")),
            other => panic!("expected MalformedRecord, got {:?}", other),
        }
        let cancel = CancellationToken::new();
        assert!(repo.get_port(&cancel, "FIRST").unwrap().is_some());
        assert!(repo.get_port(&cancel, "AFTER").unwrap().is_none());
    }

    #[test]
    fn test_truncated_document_keeps_earlier_records() {
        let repo = Arc::new(InMemoryPortRepository::new());
        let err = ingest(
            &repo,
            r#"{"AEAJM": {"name": "Ajman", "coordinates": [55.5136433, 25.4052165]}, "AEAUH": {"#,
        )
        .unwrap_err();

        assert!(matches!(err, PortError::MalformedRecord { .. }));
        assert!(err.to_string().contains("failed to decode port data"));
        assert_eq!(repo.statistics().total_ports, 1);
    }

    #[test]
    fn test_bad_start() {
        for doc in ["", "   ", "[]", "\"ports\"", "42"] {
            let repo = Arc::new(InMemoryPortRepository::new());
            let err = ingest(&repo, doc).unwrap_err();
            assert!(
                matches!(err, PortError::MalformedStart { .. }),
                "{doc:?} gave {err:?}"
            );
            assert_eq!(repo.statistics(), RepositoryStats::default());
        }
    }

    #[test]
    fn test_empty_object_succeeds() {
        let repo = Arc::new(InMemoryPortRepository::new());
        let report = ingest(&repo, "{}").unwrap();
        assert_eq!((report.written, report.skipped), (0, 0));
    }

    #[test]
    fn test_cancelled_before_first_record() {
        let repo = Arc::new(InMemoryPortRepository::new());
        let cancel = CancellationToken::new();
        cancel.cancel();
        let ingestor = PortIngestor::new(repo.clone(), cancel);

        let err = ingestor
            .ingest_reader(r#"{"A": {"name": "X", "coordinates": [1, 2]}}"#.as_bytes())
            .unwrap_err();
        assert!(matches!(err, PortError::Cancelled));
        assert_eq!(repo.statistics().total_updates, 0);
    }

    #[test]
    fn test_cancelled_empty_object_succeeds() {
        let repo = Arc::new(InMemoryPortRepository::new());
        let cancel = CancellationToken::new();
        cancel.cancel();
        let ingestor = PortIngestor::new(repo, cancel);

        let report = ingestor.ingest_reader("{}".as_bytes()).unwrap();
        assert_eq!(report.written, 0);
    }

    /// Cancels the shared token once a given number of writes has landed.
    struct CancelAfter {
        inner: InMemoryPortRepository,
        cancel: CancellationToken,
        limit: u64,
    }

    impl PortRepository for CancelAfter {
        fn save_port(&self, cancel: &CancellationToken, port: Port) -> Result<()> {
            self.inner.save_port(cancel, port)?;
            if self.inner.statistics().total_updates >= self.limit {
                self.cancel.cancel();
            }
            Ok(())
        }

        fn get_port(&self, cancel: &CancellationToken, id: &str) -> Result<Option<Port>> {
            self.inner.get_port(cancel, id)
        }

        fn statistics(&self) -> RepositoryStats {
            self.inner.statistics()
        }

        fn close(&self, cancel: &CancellationToken) -> Result<()> {
            self.inner.close(cancel)
        }
    }

    #[test]
    fn test_cancelled_mid_run_keeps_written_records() {
        let cancel = CancellationToken::new();
        let repo = Arc::new(CancelAfter {
            inner: InMemoryPortRepository::new(),
            cancel: cancel.clone(),
            limit: 2,
        });
        let ingestor = PortIngestor::new(repo.clone(), cancel);

        let err = ingestor
            .ingest_reader(
                r#"{"A": {"name": "A", "coordinates": [1, 2]},
                    "B": {"name": "B", "coordinates": [1, 2]},
                    "C": {"name": "C", "coordinates": [1, 2]}}"#
                    .as_bytes(),
            )
            .unwrap_err();

        assert!(err.is_cancelled());
        assert_eq!(repo.statistics().total_ports, 2);
    }

    #[test]
    fn test_cancel_after_last_record_completes() {
        let cancel = CancellationToken::new();
        let repo = Arc::new(CancelAfter {
            inner: InMemoryPortRepository::new(),
            cancel: cancel.clone(),
            limit: 1,
        });
        let ingestor = PortIngestor::new(repo.clone(), cancel.clone());

        let report = ingestor
            .ingest_reader(r#"{"A": {"name": "X", "coordinates": [1, 2]}}"#.as_bytes())
            .unwrap();

        assert!(cancel.is_cancelled());
        assert_eq!(report.written, 1);
        assert_eq!(repo.statistics().total_ports, 1);
    }

    struct FailingRepository;

    impl PortRepository for FailingRepository {
        fn save_port(&self, _cancel: &CancellationToken, _port: Port) -> Result<()> {
            Err(PortError::Storage {
                message: "mock save error".to_string(),
            })
        }

        fn get_port(&self, _cancel: &CancellationToken, _id: &str) -> Result<Option<Port>> {
            Ok(None)
        }

        fn statistics(&self) -> RepositoryStats {
            RepositoryStats::default()
        }

        fn close(&self, _cancel: &CancellationToken) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_store_failure_aborts_with_port_id() {
        let ingestor = PortIngestor::new(Arc::new(FailingRepository), CancellationToken::new());
        let err = ingestor
            .ingest_reader(
                r#"{"SKIPPED": {"coordinates": [1, 2]}, "AEAJM": {"name": "Ajman", "coordinates": [1, 2]}}"#
                    .as_bytes(),
            )
            .unwrap_err();

        match &err {
            PortError::StoreFailure { id, source } => {
                assert_eq!(id, "AEAJM");
                assert!(source.to_string().contains("mock save error"));
            }
            other => panic!("expected StoreFailure, got {:?}", other),
        }
        assert!(err.to_string().contains("failed to save port AEAJM"));
    }

    #[test]
    fn test_missing_source() {
        let repo = Arc::new(InMemoryPortRepository::new());
        let ingestor = PortIngestor::new(repo, CancellationToken::new());
        let err = ingestor
            .ingest_path(Path::new("definitely/not/here/ports.json"))
            .unwrap_err();
        assert!(matches!(err, PortError::SourceUnavailable { .. }));
    }

    #[test]
    fn test_ports_per_second() {
        let report = IngestReport {
            written: 10,
            skipped: 0,
            elapsed: Duration::from_secs(2),
        };
        assert_eq!(report.ports_per_second(), 5.0);
        assert_eq!(IngestReport::default().ports_per_second(), 0.0);
    }
}
