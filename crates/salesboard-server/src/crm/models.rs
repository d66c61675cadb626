//! Wire shapes of the CRM v3 REST API.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// One page of any list endpoint. Records stay raw until the caller decodes
/// them one by one.
#[derive(Debug, Deserialize)]
pub struct PageEnvelope {
    #[serde(default)]
    pub results: Vec<Value>,
    #[serde(default)]
    pub paging: Option<Paging>,
}

#[derive(Debug, Deserialize)]
pub struct Paging {
    #[serde(default)]
    pub next: Option<NextPage>,
}

#[derive(Debug, Deserialize)]
pub struct NextPage {
    #[serde(default, deserialize_with = "lenient_string")]
    pub after: Option<String>,
}

impl PageEnvelope {
    /// Cursor for the following page, if the CRM reported one.
    pub fn next_after(&self) -> Option<String> {
        self.paging
            .as_ref()
            .and_then(|p| p.next.as_ref())
            .and_then(|n| n.after.clone())
            .filter(|after| !after.is_empty())
    }
}

/// Entry of `/crm/v3/owners`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerRecord {
    #[serde(deserialize_with = "required_id")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub first_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub last_name: Option<String>,
}

impl OwnerRecord {
    /// First and last name joined by a space, trimmed.
    pub fn display_name(&self) -> String {
        format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or(""),
            self.last_name.as_deref().unwrap_or("")
        )
        .trim()
        .to_string()
    }
}

/// Generic CRM object (`/crm/v3/objects/...`) with its requested properties.
#[derive(Debug, Clone, Deserialize)]
pub struct CrmObject<P> {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(default)]
    pub properties: P,
}

pub const DEAL_PROPERTIES: &[&str] = &["amount", "hubspot_owner_id", "dealstage", "closedate"];

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DealProperties {
    #[serde(default, deserialize_with = "lenient_string")]
    pub amount: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub hubspot_owner_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub dealstage: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub closedate: Option<String>,
}

pub const GOAL_TARGET_PROPERTIES: &[&str] = &[
    "hs_goal_name",
    "hs_target_amount",
    "hs_start_datetime",
    "hs_end_datetime",
    "hs_created_by_user_id",
];

pub const GOAL_NAME_PROPERTIES: &[&str] = &["hs_goal_name"];

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GoalTargetProperties {
    #[serde(default, deserialize_with = "lenient_string")]
    pub hs_goal_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub hs_target_amount: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub hs_start_datetime: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub hs_end_datetime: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub hs_created_by_user_id: Option<String>,
}

pub type DealObject = CrmObject<DealProperties>;
pub type GoalTargetObject = CrmObject<GoalTargetProperties>;

/// Properties arrive as strings, but numbers and booleans show up too.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

fn required_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    lenient_string(deserializer)?
        .filter(|id| !id.is_empty())
        .ok_or_else(|| serde::de::Error::custom("owner id must be a string or number"))
}
