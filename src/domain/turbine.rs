use serde::{Deserialize, Serialize};
use std::fmt;
use strum::{Display, EnumString};

/// Identity of a turbine as assigned by the persistence layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TurbineId(pub u32);

impl fmt::Display for TurbineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Turbine operating status
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum TurbineStatus {
    #[default]
    Operational,
    Maintenance,
    Fault,
    Offline,
}

impl TurbineStatus {
    pub fn is_operational(&self) -> bool {
        matches!(self, TurbineStatus::Operational)
    }
}

/// Read-only snapshot of a turbine as owned by the persistence layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turbine {
    pub id: TurbineId,
    pub name: String,
    /// Nominal (rated) electrical power in W
    pub nominal_power_w: f64,
    pub hub_height_m: f64,
    pub rotor_diameter_m: f64,
    pub status: TurbineStatus,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl Turbine {
    pub fn new(id: u32, name: impl Into<String>, nominal_power_w: f64) -> Self {
        Self {
            id: TurbineId(id),
            name: name.into(),
            nominal_power_w,
            hub_height_m: 135.0,
            rotor_diameter_m: 101.0,
            status: TurbineStatus::Operational,
            latitude: None,
            longitude: None,
        }
    }

    pub fn with_status(mut self, status: TurbineStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_location(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parsing() {
        assert_eq!(
            "operational".parse::<TurbineStatus>().unwrap(),
            TurbineStatus::Operational
        );
        assert_eq!(
            "Maintenance".parse::<TurbineStatus>().unwrap(),
            TurbineStatus::Maintenance
        );
        assert!("broken".parse::<TurbineStatus>().is_err());
        assert_eq!(TurbineStatus::Offline.to_string(), "offline");
    }

    #[test]
    fn test_only_operational_is_operational() {
        assert!(TurbineStatus::Operational.is_operational());
        assert!(!TurbineStatus::Maintenance.is_operational());
        assert!(!TurbineStatus::Fault.is_operational());
        assert!(!TurbineStatus::Offline.is_operational());
    }
}
