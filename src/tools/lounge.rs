//! Lounge booking tools - lounge names and flight data for a session

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::error::Error;
use crate::upstream::{ScheduleQuery, Upstream};
use crate::Result;

use super::schema::{FieldSpec, InputSchema};
use super::{str_arg, Tool};

const SESSION_ID_DESCRIPTION: &str = "Id of the scheduled session";

fn upstream_error(err: Error) -> Error {
    match err {
        Error::Upstream(_) => err,
        other => Error::Upstream(other.to_string()),
    }
}

/// List the lounges that can be booked in a session
pub struct GetLoungeTool {
    upstream: Arc<dyn Upstream>,
    schema: InputSchema,
}

impl GetLoungeTool {
    pub fn new(upstream: Arc<dyn Upstream>) -> Self {
        Self {
            upstream,
            schema: InputSchema::new(vec![FieldSpec::string("sessionId", SESSION_ID_DESCRIPTION)]),
        }
    }
}

#[async_trait]
impl Tool for GetLoungeTool {
    fn name(&self) -> &str { "get_lounge" }
    fn description(&self) -> &str { "Provides you the lounge names to be selected" }
    fn input_schema(&self) -> &InputSchema { &self.schema }

    async fn execute(&self, params: Value) -> Result<String> {
        let session_id = str_arg(&params, "sessionId")?;

        let lounges = self
            .upstream
            .get_lounge(session_id)
            .await
            .map_err(upstream_error)?;
        debug!(session_id, count = lounges.len(), "Fetched lounges");

        Ok(format!("Please Choose the lounge from {}", lounges.join(",")))
    }
}

/// Look up flight information for a lounge booking
pub struct GetFlightDataTool {
    upstream: Arc<dyn Upstream>,
    schema: InputSchema,
}

impl GetFlightDataTool {
    pub fn new(upstream: Arc<dyn Upstream>) -> Result<Self> {
        let schema = InputSchema::new(vec![
            FieldSpec::string("sessionId", SESSION_ID_DESCRIPTION),
            FieldSpec::string(
                "direction",
                "whether the lounge is getting booked for arrival(A) for departure(D)",
            )
            .one_of(&["A", "D"]),
            FieldSpec::string(
                "travelDate",
                "Date for the lounge to get booked provided by the user (YYYYMMDD format)",
            )
            .matching(r"^\d{8}$")?,
            FieldSpec::string("airportId", "The Airport where the lounge is getting booked")
                .one_of(&["NMIA", "SIA"]),
            FieldSpec::string(
                "flightId",
                "Flight Id(Flight Code and Flight Number) provided by the user",
            ),
        ]);

        Ok(Self { upstream, schema })
    }
}

#[async_trait]
impl Tool for GetFlightDataTool {
    fn name(&self) -> &str { "get_flight_data" }
    fn description(&self) -> &str { "Provides Flight information from flight id" }
    fn input_schema(&self) -> &InputSchema { &self.schema }

    async fn execute(&self, params: Value) -> Result<String> {
        let query = ScheduleQuery {
            session_id: str_arg(&params, "sessionId")?.to_string(),
            direction: str_arg(&params, "direction")?.to_string(),
            travel_date: str_arg(&params, "travelDate")?.to_string(),
            airport_id: str_arg(&params, "airportId")?.to_string(),
            flight_id: str_arg(&params, "flightId")?.to_string(),
        };

        let schedule = self
            .upstream
            .get_schedule(&query)
            .await
            .map_err(upstream_error)?;

        Ok(format!("Your Flight is {schedule}"))
    }
}
