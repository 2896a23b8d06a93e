use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::geometry::PitchPos;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum DrawingTool {
    #[default]
    Select,
    Arrow,
    Zone,
    Pen,
    Line,
    Text,
}

/// One annotation shape on the pitch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Drawing {
    pub id: String,
    pub tool: DrawingTool,
    pub color: String,
    pub points: Vec<PitchPos>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}
