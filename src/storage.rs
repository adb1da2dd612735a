//! Per-store adapter translating between [`LogRecord`] and the wire format.

use crate::api::{GetLogsRequest, SlsApi};
use crate::error::SlsError;
use crate::proto::{Log, LogGroup};
use crate::record::{LogRecord, RemoteRecord};
use compact_str::CompactString;
use std::sync::Arc;

/// Batch-level labels applied to a whole write call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteOptions {
    topic: Option<CompactString>,
    source: Option<CompactString>,
}

impl WriteOptions {
    /// No labels.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the batch topic label.
    pub fn with_topic(mut self, topic: impl Into<CompactString>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    /// Set the batch source label.
    pub fn with_source(mut self, source: impl Into<CompactString>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// The topic label, if set.
    pub fn topic(&self) -> Option<&str> {
        self.topic.as_deref()
    }

    /// The source label, if set.
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }
}

/// Additional options for [`Storage::find`] and [`Storage::get_logs`].
///
/// Pagination across large results is the caller's concern: repeat the call
/// with a moving [`offset`](FindOptions::with_offset).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindOptions {
    topic: Option<CompactString>,
    line: Option<u32>,
    offset: Option<u32>,
}

impl FindOptions {
    /// No options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict the query to one topic.
    pub fn with_topic(mut self, topic: impl Into<CompactString>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    /// Limit the number of returned rows.
    pub fn with_line(mut self, line: u32) -> Self {
        self.line = Some(line);
        self
    }

    /// Skip the first `offset` rows.
    pub fn with_offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }

    /// The topic filter, if set.
    pub fn topic(&self) -> Option<&str> {
        self.topic.as_deref()
    }

    /// The row limit, if set.
    pub fn line(&self) -> Option<u32> {
        self.line
    }

    /// The row offset, if set.
    pub fn offset(&self) -> Option<u32> {
        self.offset
    }
}

/// A query window bound, normalized to epoch seconds before transmission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryTime(i64);

impl QueryTime {
    /// The bound in epoch seconds.
    pub fn epoch_seconds(self) -> i64 {
        self.0
    }
}

impl From<i64> for QueryTime {
    fn from(epoch_seconds: i64) -> Self {
        QueryTime(epoch_seconds)
    }
}

impl From<jiff::Timestamp> for QueryTime {
    fn from(timestamp: jiff::Timestamp) -> Self {
        QueryTime(timestamp.as_second())
    }
}

impl From<jiff::Zoned> for QueryTime {
    fn from(zoned: jiff::Zoned) -> Self {
        QueryTime(zoned.timestamp().as_second())
    }
}

impl From<&jiff::Zoned> for QueryTime {
    fn from(zoned: &jiff::Zoned) -> Self {
        QueryTime(zoned.timestamp().as_second())
    }
}

/// A handle to one (project, log store) pair.
///
/// Stateless beyond the two identifiers; all handles created from the same
/// client share its connection. Obtained from
/// [`SlsClient::get_storage`](crate::SlsClient::get_storage) or
/// [`SlsClient::list_storages_in_project`](crate::SlsClient::list_storages_in_project).
#[derive(Clone)]
pub struct Storage {
    api: Arc<dyn SlsApi>,
    project: String,
    name: String,
}

impl Storage {
    pub(crate) fn new(api: Arc<dyn SlsApi>, project: String, name: String) -> Self {
        Storage { api, project, name }
    }

    /// The project this store belongs to.
    pub fn project(&self) -> &str {
        &self.project
    }

    /// The log store name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Write a single record. Equivalent to [`put_logs`](Storage::put_logs)
    /// with a one-element batch.
    pub async fn put_log(
        &self,
        record: &LogRecord,
        options: &WriteOptions,
    ) -> Result<(), SlsError> {
        self.put_logs(std::slice::from_ref(record), options).await
    }

    /// Write a batch of records in one remote call.
    ///
    /// The whole batch is carried by a single request; there is no
    /// client-side batching, retry or partial success.
    pub async fn put_logs(
        &self,
        records: &[LogRecord],
        options: &WriteOptions,
    ) -> Result<(), SlsError> {
        let now = jiff::Timestamp::now().as_second();
        let logs = records
            .iter()
            .map(|record| map_record(record, now))
            .collect();
        let mut group = LogGroup::new(logs);
        if let Some(topic) = options.topic() {
            group = group.with_topic(topic);
        }
        if let Some(source) = options.source() {
            group = group.with_source(source);
        }
        self.api.put_log_group(&self.project, &self.name, group).await
    }

    /// Run a log query over `[from, to]`, returning raw rows in the order the
    /// service returns them.
    ///
    /// An empty `query` string is omitted from the request entirely.
    pub async fn find(
        &self,
        from: impl Into<QueryTime>,
        to: impl Into<QueryTime>,
        query: &str,
        options: &FindOptions,
    ) -> Result<Vec<RemoteRecord>, SlsError> {
        let request = GetLogsRequest {
            project: CompactString::from(self.project.as_str()),
            logstore: CompactString::from(self.name.as_str()),
            from: from.into().epoch_seconds(),
            to: to.into().epoch_seconds(),
            query: (!query.is_empty()).then(|| CompactString::from(query)),
            topic: options.topic().map(CompactString::from),
            line: options.line(),
            offset: options.offset(),
        };
        self.api.get_logs(request).await
    }

    /// Fetch records over `[from, to]` with no query, demapping the reserved
    /// `__topic__`/`__source__`/`__time__` fields back into [`LogRecord`]
    /// members.
    pub async fn get_logs(
        &self,
        from: impl Into<QueryTime>,
        to: impl Into<QueryTime>,
        options: &FindOptions,
    ) -> Result<Vec<LogRecord>, SlsError> {
        let rows = self.find(from, to, "", options).await?;
        Ok(rows
            .into_iter()
            .map(RemoteRecord::into_log_record)
            .collect())
    }
}

fn map_record(record: &LogRecord, now: i64) -> Log {
    let mut log = Log::new(record.time().unwrap_or(now) as u32);
    if let Some(topic) = record.topic() {
        log.push("topic", topic);
    }
    if let Some(source) = record.source() {
        log.push("source", source);
    }
    for (key, value) in record.fields() {
        if let Some(value) = value.coerce() {
            log.push(key, value);
        }
    }
    log
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::FakeApi;
    use crate::record::{FieldValue, SOURCE_FIELD, TIME_FIELD, TOPIC_FIELD};

    fn storage(api: Arc<FakeApi>) -> Storage {
        Storage::new(api, "proj".to_owned(), "store".to_owned())
    }

    #[tokio::test]
    async fn missing_time_defaults_to_now() {
        let api = Arc::new(FakeApi::default());
        let before = jiff::Timestamp::now().as_second();
        storage(api.clone())
            .put_log(&LogRecord::new().with("msg", "hi"), &WriteOptions::new())
            .await
            .unwrap();
        let after = jiff::Timestamp::now().as_second();

        let puts = api.puts.lock().unwrap();
        let time = i64::from(puts[0].2.logs()[0].time());
        assert!(time >= before && time <= after);
    }

    #[tokio::test]
    async fn timestamp_truncates_to_seconds() {
        let api = Arc::new(FakeApi::default());
        let ts = jiff::Timestamp::new(1700000000, 987_654_321).unwrap();
        storage(api.clone())
            .put_log(&LogRecord::new().with_timestamp(ts), &WriteOptions::new())
            .await
            .unwrap();

        let puts = api.puts.lock().unwrap();
        assert_eq!(puts[0].2.logs()[0].time(), 1700000000);
    }

    #[tokio::test]
    async fn fields_are_stringified_and_null_skipped() {
        let api = Arc::new(FakeApi::default());
        let record = LogRecord::new()
            .with("count", 42i64)
            .with("enabled", true)
            .with("msg", "hi")
            .with("ratio", 1.5f64)
            .with("skipped", FieldValue::Null);
        storage(api.clone())
            .put_log(&record, &WriteOptions::new())
            .await
            .unwrap();

        let puts = api.puts.lock().unwrap();
        let contents: Vec<(&str, &str)> = puts[0].2.logs()[0]
            .contents()
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        assert_eq!(
            contents,
            vec![
                ("count", "42"),
                ("enabled", "true"),
                ("msg", "hi"),
                ("ratio", "1.5"),
            ]
        );
    }

    #[tokio::test]
    async fn batch_labels_and_identifiers_pass_through() {
        let api = Arc::new(FakeApi::default());
        storage(api.clone())
            .put_logs(
                &[LogRecord::new().with("a", "1"), LogRecord::new().with("b", "2")],
                &WriteOptions::new().with_topic("T").with_source("S"),
            )
            .await
            .unwrap();

        let puts = api.puts.lock().unwrap();
        let (project, logstore, group) = &puts[0];
        assert_eq!(project, "proj");
        assert_eq!(logstore, "store");
        assert_eq!(group.topic(), Some("T"));
        assert_eq!(group.source(), Some("S"));
        assert_eq!(group.logs().len(), 2);
    }

    #[tokio::test]
    async fn put_log_is_single_element_put_logs() {
        let api = Arc::new(FakeApi::default());
        let handle = storage(api.clone());
        let record = LogRecord::new().with_time(1700000000).with("msg", "hi");
        let options = WriteOptions::new().with_topic("T");

        handle.put_log(&record, &options).await.unwrap();
        handle
            .put_logs(std::slice::from_ref(&record), &options)
            .await
            .unwrap();

        let puts = api.puts.lock().unwrap();
        assert_eq!(puts.len(), 2);
        assert_eq!(puts[0], puts[1]);
        assert_eq!(puts[0].2.logs().len(), 1);
    }

    #[tokio::test]
    async fn empty_query_is_omitted() {
        let api = Arc::new(FakeApi::default());
        let handle = storage(api.clone());

        handle.find(0i64, 10i64, "", &FindOptions::new()).await.unwrap();
        handle
            .find(0i64, 10i64, "level: error", &FindOptions::new())
            .await
            .unwrap();

        let queries = api.queries.lock().unwrap();
        assert_eq!(queries[0].query, None);
        assert_eq!(queries[1].query.as_deref(), Some("level: error"));
    }

    #[tokio::test]
    async fn window_bounds_normalize_to_epoch_seconds() {
        let api = Arc::new(FakeApi::default());
        let from = jiff::Timestamp::new(1700000000, 400_000_000).unwrap();
        storage(api.clone())
            .find(from, 1700000600i64, "", &FindOptions::new())
            .await
            .unwrap();

        let queries = api.queries.lock().unwrap();
        assert_eq!(queries[0].from, 1700000000);
        assert_eq!(queries[0].to, 1700000600);
    }

    #[tokio::test]
    async fn finder_options_are_merged() {
        let api = Arc::new(FakeApi::default());
        storage(api.clone())
            .find(
                0i64,
                10i64,
                "q",
                &FindOptions::new().with_topic("T").with_line(100).with_offset(200),
            )
            .await
            .unwrap();

        let queries = api.queries.lock().unwrap();
        assert_eq!(queries[0].topic.as_deref(), Some("T"));
        assert_eq!(queries[0].line, Some(100));
        assert_eq!(queries[0].offset, Some(200));
    }

    #[tokio::test]
    async fn get_logs_round_trips_a_written_record() {
        // Write one record, echo the captured group back as a raw row, and
        // expect the demapped record to match what was written.
        let write_api = Arc::new(FakeApi::default());
        storage(write_api.clone())
            .put_log(
                &LogRecord::new().with_time(1700000000).with("msg", "hello"),
                &WriteOptions::new().with_topic("T").with_source("S"),
            )
            .await
            .unwrap();

        let puts = write_api.puts.lock().unwrap();
        let group = &puts[0].2;
        let log = &group.logs()[0];
        let mut row = RemoteRecord::new()
            .with(TOPIC_FIELD, group.topic().unwrap())
            .with(SOURCE_FIELD, group.source().unwrap())
            .with(TIME_FIELD, log.time().to_string());
        for (key, value) in log.contents() {
            row.insert(key.as_str(), value.as_str());
        }

        let read_api = Arc::new(FakeApi::with_rows(vec![row]));
        let records = storage(read_api.clone())
            .get_logs(1699999000i64, 1700001000i64, &FindOptions::new())
            .await
            .unwrap();

        assert_eq!(
            records,
            vec![
                LogRecord::new()
                    .with_time(1700000000)
                    .with_topic("T")
                    .with_source("S")
                    .with("msg", "hello")
            ]
        );
        // get_logs itself sends no query string.
        assert_eq!(read_api.queries.lock().unwrap()[0].query, None);
    }
}
