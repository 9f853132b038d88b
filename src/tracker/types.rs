use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Kind of tracked client event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisitType {
    Launch,
    Auth,
    Browse,
    Order,
}

impl VisitType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Launch => "launch",
            Self::Auth => "auth",
            Self::Browse => "browse",
            Self::Order => "order",
        }
    }
}

impl std::str::FromStr for VisitType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "launch" => Ok(Self::Launch),
            "auth" => Ok(Self::Auth),
            "browse" => Ok(Self::Browse),
            "order" => Ok(Self::Order),
            other => Err(format!(
                "unknown visit type '{}' (expected launch, auth, browse or order)",
                other
            )),
        }
    }
}

/// Entry parameters captured once at launch.
#[derive(Debug, Clone, Default)]
pub struct LaunchContext {
    /// Entry scene identifier; attribution is only read when a scene is present.
    pub scene: Option<String>,
    /// Launch query; `promotionCode` and `referrerUserId` are recognised.
    pub query: HashMap<String, String>,
    /// Entry page path.
    pub path: Option<String>,
}

/// Identity supplied when the user authorises.
#[derive(Debug, Clone, Default)]
pub struct UserAuth {
    pub user_info: Value,
    pub open_id: Option<String>,
    pub user_id: Option<i64>,
}

/// Reply from the visit endpoint.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub visit_id: Option<i64>,
    #[serde(default)]
    pub promotion_code: Option<String>,
    #[serde(default)]
    pub is_new_user: Option<bool>,
}

/// Everything the tracker currently knows.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub session_id: String,
    pub promotion_code: Option<String>,
    pub referrer_user_id: Option<String>,
    pub scene: Option<String>,
    pub user_info: Option<Value>,
    pub open_id: Option<String>,
    pub user_id: Option<i64>,
}
