use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use time::OffsetDateTime;
use uuid::Uuid;

/// Named collections held by the document store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    BuildShUsages,
    SwaggerPyUsages,
    GiudicoDeployStatus,
}

impl Collection {
    pub const ALL: [Collection; 3] = [
        Collection::BuildShUsages,
        Collection::SwaggerPyUsages,
        Collection::GiudicoDeployStatus,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Collection::BuildShUsages => "build-sh-usages",
            Collection::SwaggerPyUsages => "swagger-py-usages",
            Collection::GiudicoDeployStatus => "giudico-deploy-status",
        }
    }
}

/// A document as persisted: the submitted body plus the storage identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: Uuid,
    pub body: Value,
    pub inserted_at: OffsetDateTime,
}

/// One row of a group-by-author count.
///
/// `author` is whatever JSON value the documents carried under `author`
/// (`null` when the field is missing).
#[derive(Debug, Clone, PartialEq)]
pub struct AuthorCount {
    pub author: Value,
    pub count: i64,
}

impl AuthorCount {
    pub fn new(author: impl Into<Value>, count: i64) -> Self {
        Self {
            author: author.into(),
            count,
        }
    }

    /// The key this author is listed under in merged results.
    pub fn author_key(&self) -> String {
        match &self.author {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// Epoch-millisecond timestamp as submitted by deploy jobs.
///
/// Jobs send either a JSON number or a numeric string; fractional millis
/// are truncated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct EpochMillis(pub i64);

impl<'de> Deserialize<'de> for EpochMillis {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        crate::format::millis_from_value(&value)
            .map(EpochMillis)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid epoch millis: {value}")))
    }
}

/// A deployment outcome reported for one resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployStatusEvent {
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub status: String,
    pub resource: String,
    pub timestamp: EpochMillis,
    /// Any other fields the job submitted.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
