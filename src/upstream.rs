//! Upstream lookups - the lounge and flight schedule data sources.
//!
//! The tools only see the [`Upstream`] trait. [`FixtureUpstream`] answers
//! from data in the config file and backs the `serve` command and tests.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::Result;

/// Parameters of a flight schedule lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleQuery {
    pub session_id: String,
    /// `A` for arrival, `D` for departure
    pub direction: String,
    /// `YYYYMMDD`
    pub travel_date: String,
    pub airport_id: String,
    pub flight_id: String,
}

/// Backing data source for the lounge tools
#[async_trait]
pub trait Upstream: Send + Sync {
    /// Lounge names available to a booking session
    async fn get_lounge(&self, session_id: &str) -> Result<Vec<String>>;

    /// Human-readable schedule for a flight
    async fn get_schedule(&self, query: &ScheduleQuery) -> Result<String>;
}

/// A known flight in the fixture data
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightFixture {
    pub flight_id: String,
    pub direction: String,
    pub travel_date: String,
    pub airport_id: String,
    pub schedule: String,
}

/// Canned upstream data, keyed the way the real lookups are
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpstreamFixtures {
    /// Lounge names per session id
    #[serde(default)]
    pub lounges: HashMap<String, Vec<String>>,

    #[serde(default)]
    pub flights: Vec<FlightFixture>,
}

/// Upstream answering from [`UpstreamFixtures`]
#[derive(Debug, Clone, Default)]
pub struct FixtureUpstream {
    fixtures: UpstreamFixtures,
}

impl FixtureUpstream {
    pub fn new(fixtures: UpstreamFixtures) -> Self {
        Self { fixtures }
    }
}

#[async_trait]
impl Upstream for FixtureUpstream {
    async fn get_lounge(&self, session_id: &str) -> Result<Vec<String>> {
        self.fixtures
            .lounges
            .get(session_id)
            .cloned()
            .ok_or_else(|| Error::Upstream(format!("No lounges found for session {session_id}")))
    }

    async fn get_schedule(&self, query: &ScheduleQuery) -> Result<String> {
        if !self.fixtures.lounges.contains_key(&query.session_id) {
            return Err(Error::Upstream(format!(
                "Unknown session {}",
                query.session_id
            )));
        }

        self.fixtures
            .flights
            .iter()
            .find(|f| {
                f.flight_id.eq_ignore_ascii_case(&query.flight_id)
                    && f.direction == query.direction
                    && f.travel_date == query.travel_date
                    && f.airport_id == query.airport_id
            })
            .map(|f| f.schedule.clone())
            .ok_or_else(|| {
                Error::Upstream(format!(
                    "No schedule for flight {} on {}",
                    query.flight_id, query.travel_date
                ))
            })
    }
}
