use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use strum::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScenarioId(pub u32);

impl fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Mutually exclusive operating regime that parameterizes synthesis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ScenarioType {
    NormalOperation,
    GridFault,
    TurbineFailure,
    Storm,
    Custom,
}

/// Free-form scenario parameters.
///
/// Values are JSON, so numbers may arrive either as numbers or as numeric
/// strings depending on who created the scenario.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScenarioParameters(Map<String, Value>);

impl ScenarioParameters {
    pub fn new() -> Self {
        Self(Map::new())
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Numeric lookup. Non-numeric values are treated as absent.
    pub fn get_f64(&self, key: &str) -> Option<f64> {
        match self.0.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn get_u32(&self, key: &str) -> Option<u32> {
        match self.0.get(key)? {
            Value::Number(n) => n.as_u64().and_then(|v| u32::try_from(v).ok()),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl From<Map<String, Value>> for ScenarioParameters {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub id: ScenarioId,
    pub name: String,
    pub description: String,
    pub scenario_type: ScenarioType,
    /// At most one scenario is active system-wide
    pub active: bool,
    pub parameters: ScenarioParameters,
}

impl Scenario {
    pub fn new(id: u32, name: impl Into<String>, scenario_type: ScenarioType) -> Self {
        Self {
            id: ScenarioId(id),
            name: name.into(),
            description: String::new(),
            scenario_type,
            active: false,
            parameters: ScenarioParameters::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_parameters(mut self, parameters: ScenarioParameters) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn activated(mut self) -> Self {
        self.active = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_numeric_parameters_accept_numbers_and_strings() {
        let params = ScenarioParameters::new()
            .with("wind_speed", 20.0)
            .with("voltage", "0.45")
            .with("turbine_id", 3)
            .with("label", json!({"nested": true}));

        assert_eq!(params.get_f64("wind_speed"), Some(20.0));
        assert_eq!(params.get_f64("voltage"), Some(0.45));
        assert_eq!(params.get_u32("turbine_id"), Some(3));
        assert_eq!(params.get_f64("label"), None);
        assert_eq!(params.get_f64("missing"), None);
    }

    #[test]
    fn test_scenario_type_round_trips_snake_case() {
        assert_eq!(ScenarioType::GridFault.to_string(), "grid_fault");
        assert_eq!(
            "normal_operation".parse::<ScenarioType>().unwrap(),
            ScenarioType::NormalOperation
        );
        let encoded = serde_json::to_string(&ScenarioType::TurbineFailure).unwrap();
        assert_eq!(encoded, "\"turbine_failure\"");
    }

    #[test]
    fn test_parameters_deserialize_from_plain_object() {
        let params: ScenarioParameters =
            serde_json::from_value(json!({"voltage": 0.7, "duration": 0.2})).unwrap();
        assert_eq!(params.get_f64("duration"), Some(0.2));
    }
}
