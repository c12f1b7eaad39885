//! Shared test utilities used across toolkit crates.

pub mod tracing {
    //! Recording layer for capturing emitted events in tests.
    use std::collections::HashMap;
    use std::fmt;
    use std::sync::{Arc, Mutex, PoisonError};

    use tracing::field::{Field, Visit};
    use tracing::{Event, Level, Subscriber};
    use tracing_subscriber::Layer;
    use tracing_subscriber::layer::Context;

    /// Layer that records every event it sees so tests can assert on log
    /// output without parsing formatted text.
    #[derive(Clone, Default)]
    pub struct RecordingLayer {
        events: Arc<Mutex<Vec<EventRecord>>>,
    }

    impl RecordingLayer {
        /// Returns a snapshot of the recorded events in emission order.
        ///
        /// # Examples
        /// ```
        /// use toolkit_test_support::tracing::RecordingLayer;
        ///
        /// let layer = RecordingLayer::default();
        /// assert!(layer.events().is_empty());
        /// ```
        #[must_use]
        pub fn events(&self) -> Vec<EventRecord> {
            self.events
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        }

        /// Returns the `message` field of every event recorded at `level`.
        #[must_use]
        pub fn messages_at(&self, level: Level) -> Vec<String> {
            self.events()
                .into_iter()
                .filter(|event| event.level == level)
                .filter_map(|event| event.fields.get("message").cloned())
                .collect()
        }
    }

    /// Snapshot of an emitted event.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct EventRecord {
        /// Level the event was emitted at.
        pub level: Level,
        /// Event target, usually the emitting module path.
        pub target: String,
        /// Structured fields, including the formatted `message`.
        pub fields: HashMap<String, String>,
    }

    impl<S: Subscriber> Layer<S> for RecordingLayer {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            let mut fields = HashMap::new();
            event.record(&mut FieldRecorder {
                fields: &mut fields,
            });
            self.events
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(EventRecord {
                    level: *event.metadata().level(),
                    target: event.metadata().target().to_owned(),
                    fields,
                });
        }
    }

    struct FieldRecorder<'a> {
        fields: &'a mut HashMap<String, String>,
    }

    impl Visit for FieldRecorder<'_> {
        fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
            self.fields
                .insert(field.name().to_owned(), format!("{value:?}"));
        }

        fn record_str(&mut self, field: &Field, value: &str) {
            self.fields
                .insert(field.name().to_owned(), value.to_owned());
        }

        fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
            self.fields
                .insert(field.name().to_owned(), value.to_string());
        }

        fn record_bool(&mut self, field: &Field, value: bool) {
            self.fields
                .insert(field.name().to_owned(), value.to_string());
        }

        fn record_u64(&mut self, field: &Field, value: u64) {
            self.fields
                .insert(field.name().to_owned(), value.to_string());
        }

        fn record_i64(&mut self, field: &Field, value: i64) {
            self.fields
                .insert(field.name().to_owned(), value.to_string());
        }
    }

}

pub mod fixtures {
    //! Builders for execution logs in the pipeline runner's format.

    const LOG_SUFFIX: &str = " (check log file(s) for error message)";

    /// Assembles an execution log line by line.
    ///
    /// # Examples
    /// ```
    /// use toolkit_test_support::fixtures::ExecutionLog;
    ///
    /// let log = ExecutionLog::new()
    ///     .failed_rule("align", Some("logs/align.log"))
    ///     .build();
    /// assert!(log.contains("Error in rule align:"));
    /// assert!(log.contains("    log: logs/align.log (check log file(s) for error message)"));
    /// ```
    #[derive(Debug, Clone, Default)]
    pub struct ExecutionLog {
        lines: Vec<String>,
    }

    impl ExecutionLog {
        /// Starts an empty log.
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Appends a free-form progress line.
        #[must_use]
        pub fn line(mut self, text: &str) -> Self {
            self.lines.push(text.to_owned());
            self
        }

        /// Appends a successful job block.
        #[must_use]
        pub fn finished_job(self, rule: &str, jobid: u32) -> Self {
            self.line(&format!("rule {rule}:"))
                .line(&format!("    jobid: {jobid}"))
                .line(&format!("Finished job {jobid}."))
        }

        /// Appends a failed rule block, with a `log:` line when `log` is set.
        #[must_use]
        pub fn failed_rule(self, rule: &str, log: Option<&str>) -> Self {
            let block = self
                .line(&format!("Error in rule {rule}:"))
                .line("    jobid: 0")
                .line(&format!("    output: out/{rule}.txt"));
            match log {
                Some(path) => block
                    .line(&format!("    log: {path}{LOG_SUFFIX}"))
                    .line("    shell:")
                    .line("        exit 1"),
                None => block.line("    shell:").line("        exit 1"),
            }
        }

        /// Renders the log with a trailing newline.
        #[must_use]
        pub fn build(&self) -> String {
            let mut text = self.lines.join("\n");
            text.push('\n');
            text
        }
    }

}
