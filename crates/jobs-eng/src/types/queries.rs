//! Query parameter types for API endpoints.

use serde::Deserialize;
use utoipa::IntoParams;

/// Deploy-status feed query parameters.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DeployStatusFeedQuery {
    /// Epoch millis; only events displayed after this instant are returned.
    #[serde(rename = "lastTime")]
    pub last_time: Option<String>,
}

impl DeployStatusFeedQuery {
    /// The raw `lastTime` value, treating an empty value as missing.
    pub fn last_time(&self) -> Option<&str> {
        self.last_time.as_deref().filter(|s| !s.is_empty())
    }
}
