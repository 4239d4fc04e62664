//! Build a [`TaskObservation`] from loosely-typed fields.
//!
//! Observers often hand over everything as strings (`"task_id_num": "42"`).
//! Numbers are parsed leniently: anything that does not fit becomes zero and
//! a warning is logged. Building never fails.

use crate::proto::TaskObservation;
use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};
use tracing::warn;
use uuid::Uuid;

/// Loosely-typed observation input, keyed by proto field name.
pub type ObservationFields = Map<String, Value>;

#[derive(Debug, Clone, Default)]
pub struct ObservationBuilder {
    fields: ObservationFields,
}

impl ObservationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fields(fields: ObservationFields) -> Self {
        Self { fields }
    }

    /// Set one field. Later calls overwrite earlier ones.
    pub fn field(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }

    /// Produce the observation, applying defaults for missing fields.
    pub fn build(&self) -> TaskObservation {
        let event_id = match self.fields.get("event_id") {
            Some(v) if !v.is_null() => text(v),
            _ => Uuid::new_v4().to_string(),
        };
        let timestamp_iso = match self.fields.get("timestamp_iso") {
            Some(v) if !v.is_null() => text(v),
            _ => Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
        };

        TaskObservation {
            event_id,
            event_type: self.string("event_type"),
            timestamp_iso,
            pipeline_name: self.string("pipeline_name"),
            process_name: self.string("process_name"),
            task_id_num: self.int32("task_id_num"),
            task_hash: self.string("task_hash"),
            task_name: self.string("task_name"),
            native_id: self.string("native_id"),
            status: self.string("status"),
            exit_code: self.int32("exit_code"),
            duration_ms: self.int64("duration_ms"),
            peak_rss_bytes: self.int64("peak_rss_bytes"),
            cpu_time_seconds: self.float("cpu_time_seconds"),
            error_message: self.string("error_message"),
            work_dir: self.string("work_dir"),
            container_id: self.string("container_id"),
            container_engine: self.string("container_engine"),
            script_id: self.string("script_id"),
            script_hash: self.string("script_hash"),
        }
    }

    fn string(&self, name: &str) -> String {
        self.fields.get(name).map(text).unwrap_or_default()
    }

    fn int64(&self, name: &str) -> i64 {
        let Some(value) = self.fields.get(name) else {
            return 0;
        };
        let parsed = match value {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(whole_number)),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            Value::Null => return 0,
            _ => None,
        };
        parsed.unwrap_or_else(|| {
            warn!(field = name, %value, "could not convert to integer, using 0");
            0
        })
    }

    fn int32(&self, name: &str) -> i32 {
        let wide = self.int64(name);
        i32::try_from(wide).unwrap_or_else(|_| {
            warn!(field = name, value = wide, "integer out of range, using 0");
            0
        })
    }

    fn float(&self, name: &str) -> f64 {
        let Some(value) = self.fields.get(name) else {
            return 0.0;
        };
        let parsed = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            Value::Null => return 0.0,
            _ => None,
        };
        match parsed {
            Some(f) if f.is_finite() => f,
            _ => {
                warn!(field = name, %value, "could not convert to float, using 0");
                0.0
            }
        }
    }
}

/// Accept floats like `42.0` that carry an integer value.
fn whole_number(f: f64) -> Option<i64> {
    // i64::MAX is not exactly representable; the upper bound is exclusive
    let in_range = f >= i64::MIN as f64 && f < i64::MAX as f64;
    (f.fract() == 0.0 && in_range).then_some(f as i64)
}

fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
