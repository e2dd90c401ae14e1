//! Builders for outcome records in the shape the worker writes them.

#![allow(dead_code)]

use serde_json::{json, Map, Value};

pub struct OutcomeBuilder {
    record: Map<String, Value>,
}

impl OutcomeBuilder {
    pub fn new(job_id: &str) -> Self {
        let mut record = Map::new();
        record.insert("job_id".to_string(), json!(job_id));
        record.insert(
            "recipient".to_string(),
            json!({"name": "Clinic A", "number": "4912345"}),
        );
        Self { record }
    }

    pub fn status(mut self, status: &str) -> Self {
        self.record.insert("status".to_string(), json!(status));
        self
    }

    pub fn times(mut self, started_at: &str, end_time: &str) -> Self {
        self.record.insert("started_at".to_string(), json!(started_at));
        self.record.insert("end_time".to_string(), json!(end_time));
        self
    }

    pub fn cancel_handled(mut self, handled_at: &str) -> Self {
        self.record.insert(
            "cancel".to_string(),
            json!({"requested": true, "requested_at": handled_at, "handled_at": handled_at}),
        );
        self
    }

    pub fn result(mut self, result: Value) -> Self {
        self.record.insert("result".to_string(), result);
        self
    }

    pub fn build(self) -> Value {
        Value::Object(self.record)
    }
}
