//! Step-by-step record of a scenario run
//!
//! A [`ScenarioReport`] is what a reporting layer attaches to the test result:
//! each step the scenario took, with the time it completed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

/// One completed step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub at: DateTime<Utc>,
    pub description: String,
}

/// Report of a single scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioReport {
    pub scenario: String,

    /// Name of the application driver the scenario ran against
    pub driver: String,

    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub steps: Vec<Step>,
}

impl ScenarioReport {
    pub fn new(scenario: impl Into<String>, driver: impl Into<String>) -> Self {
        let scenario = scenario.into();
        let driver = driver.into();
        info!(scenario = %scenario, driver = %driver, "Scenario started");

        Self {
            scenario,
            driver,
            started_at: Utc::now(),
            finished_at: None,
            steps: Vec::new(),
        }
    }

    /// Records a completed step and logs it
    pub fn step(&mut self, description: impl Into<String>) {
        let description = description.into();
        info!(scenario = %self.scenario, step = self.steps.len() + 1, "{}", description);

        self.steps.push(Step {
            at: Utc::now(),
            description,
        });
    }

    /// Marks the scenario finished
    pub fn finish(mut self) -> Self {
        let finished_at = Utc::now();
        info!(
            scenario = %self.scenario,
            steps = self.steps.len(),
            duration_ms = (finished_at - self.started_at).num_milliseconds(),
            "Scenario finished"
        );
        self.finished_at = Some(finished_at);
        self
    }

    pub fn is_finished(&self) -> bool {
        self.finished_at.is_some()
    }

    /// Pretty-printed JSON for attaching to a test report
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
