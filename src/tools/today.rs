//! Clock tool - tells the engine today's date

use super::{Tool, ToolFailure};
use crate::llm::ToolPayload;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::{json, Value};

/// Returns the local calendar date as `YYYY-MM-DD`
pub struct TodayTool {
    clock: fn() -> NaiveDate,
}

impl TodayTool {
    pub fn with_clock(clock: fn() -> NaiveDate) -> Self {
        Self { clock }
    }
}

impl Default for TodayTool {
    fn default() -> Self {
        Self::with_clock(|| chrono::Local::now().date_naive())
    }
}

#[async_trait]
impl Tool for TodayTool {
    fn name(&self) -> &'static str {
        "get_today_date"
    }

    fn description(&self) -> String {
        "Returns today's date.".to_string()
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {},
            "required": []
        })
    }

    async fn run(&self, _input: Value) -> Result<ToolPayload, ToolFailure> {
        let today = (self.clock)();
        let mut payload = ToolPayload::new();
        payload.insert(
            "today".to_string(),
            Value::String(today.format("%Y-%m-%d").to_string()),
        );
        Ok(payload)
    }
}
