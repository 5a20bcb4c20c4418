//! Tool Parameters
//!
//! Strongly-typed arguments for each registered tool, keyed by tool name.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ToolError;

pub const ACADEMIC_SEARCH: &str = "academic_search";
pub const WEB_SEARCH: &str = "web_search";
pub const CALCULATOR: &str = "calculator";

/// Default number of search results
pub const DEFAULT_LIMIT: usize = 5;
/// Upper bound on requested search results
pub const MAX_LIMIT: usize = 20;

/// Arguments shared by both search tools
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchParams {
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl SearchParams {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            limit: None,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Requested limit, defaulted and clamped to `1..=MAX_LIMIT`
    pub fn effective_limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculatorParams {
    pub expression: String,
}

/// Parameters of a tool call, one variant per tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tool", content = "parameters", rename_all = "snake_case")]
pub enum ToolParameters {
    AcademicSearch(SearchParams),
    WebSearch(SearchParams),
    Calculator(CalculatorParams),
}

impl ToolParameters {
    /// Build typed parameters from a tool name and a loosely-typed JSON value.
    pub fn from_call(tool: &str, parameters: Value) -> Result<Self, ToolError> {
        let invalid = |e: serde_json::Error| ToolError::invalid_parameters(tool, e.to_string());
        let params = match tool {
            ACADEMIC_SEARCH => {
                ToolParameters::AcademicSearch(serde_json::from_value(parameters).map_err(invalid)?)
            }
            WEB_SEARCH => {
                ToolParameters::WebSearch(serde_json::from_value(parameters).map_err(invalid)?)
            }
            CALCULATOR => {
                ToolParameters::Calculator(serde_json::from_value(parameters).map_err(invalid)?)
            }
            other => return Err(ToolError::UnknownTool(other.to_string())),
        };
        params.validate()?;
        Ok(params)
    }

    /// Name of the tool these parameters are for
    pub fn tool_name(&self) -> &'static str {
        match self {
            ToolParameters::AcademicSearch(_) => ACADEMIC_SEARCH,
            ToolParameters::WebSearch(_) => WEB_SEARCH,
            ToolParameters::Calculator(_) => CALCULATOR,
        }
    }

    /// Reject empty required fields
    pub fn validate(&self) -> Result<(), ToolError> {
        match self {
            ToolParameters::AcademicSearch(p) | ToolParameters::WebSearch(p) => {
                if p.query.trim().is_empty() {
                    return Err(ToolError::invalid_parameters(
                        self.tool_name(),
                        "Query parameter is required",
                    ));
                }
            }
            ToolParameters::Calculator(p) => {
                if p.expression.trim().is_empty() {
                    return Err(ToolError::invalid_parameters(
                        self.tool_name(),
                        "Expression parameter is required",
                    ));
                }
            }
        }
        Ok(())
    }

    /// Parameters as a plain JSON object
    pub fn to_value(&self) -> Value {
        let value = match self {
            ToolParameters::AcademicSearch(p) | ToolParameters::WebSearch(p) => {
                serde_json::to_value(p)
            }
            ToolParameters::Calculator(p) => serde_json::to_value(p),
        };
        value.unwrap_or(Value::Null)
    }
}
