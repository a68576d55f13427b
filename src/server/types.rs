use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ActuatorHealth {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ActuatorInfo {
    pub name: &'static str,
    pub version: &'static str,
    pub model_version: String,
}
