//! Observability for external calls. Every search, enrichment, scoring,
//! and context-retrieval call reports a [`CallTrace`] to the configured
//! sink. Sinks are purely informational — they never influence control
//! flow or results.

use std::sync::Mutex;
use std::time::{Duration, Instant};

/// One external call, as observed from the pipeline's side.
#[derive(Debug, Clone)]
pub struct CallTrace {
    pub operation: &'static str,
    pub duration: Duration,
    pub token_count: u32,
    pub success: bool,
    pub error: Option<String>,
}

/// Started when a call begins; consumed into a [`CallTrace`] when it ends.
pub struct TraceTimer {
    operation: &'static str,
    started: Instant,
}

impl TraceTimer {
    pub fn start(operation: &'static str) -> Self {
        Self {
            operation,
            started: Instant::now(),
        }
    }

    pub fn success(self, token_count: u32) -> CallTrace {
        CallTrace {
            operation: self.operation,
            duration: self.started.elapsed(),
            token_count,
            success: true,
            error: None,
        }
    }

    pub fn failure(self, error: impl Into<String>) -> CallTrace {
        CallTrace {
            operation: self.operation,
            duration: self.started.elapsed(),
            token_count: 0,
            success: false,
            error: Some(error.into()),
        }
    }
}

pub trait TraceSink: Send + Sync {
    fn record(&self, trace: CallTrace);
}

/// Discards everything.
pub struct NoopTraceSink;

impl TraceSink for NoopTraceSink {
    fn record(&self, _trace: CallTrace) {}
}

/// Emits each trace as a structured tracing event.
pub struct LogTraceSink;

impl TraceSink for LogTraceSink {
    fn record(&self, trace: CallTrace) {
        if trace.success {
            tracing::debug!(
                operation = trace.operation,
                duration_ms = trace.duration.as_millis() as u64,
                tokens = trace.token_count,
                "external call completed"
            );
        } else {
            tracing::warn!(
                operation = trace.operation,
                duration_ms = trace.duration.as_millis() as u64,
                error = trace.error.as_deref().unwrap_or("unknown"),
                "external call failed"
            );
        }
    }
}

/// Keeps every trace in memory. Used by tests to assert call accounting.
#[derive(Default)]
pub struct CollectingTraceSink {
    traces: Mutex<Vec<CallTrace>>,
}

impl CollectingTraceSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn traces(&self) -> Vec<CallTrace> {
        self.traces.lock().expect("trace sink poisoned").clone()
    }

    pub fn count_for(&self, operation: &str) -> usize {
        self.traces()
            .iter()
            .filter(|t| t.operation == operation)
            .count()
    }
}

impl TraceSink for CollectingTraceSink {
    fn record(&self, trace: CallTrace) {
        self.traces.lock().expect("trace sink poisoned").push(trace);
    }
}
