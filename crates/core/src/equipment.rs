use serde::{Deserialize, Serialize};

/// Kinds of plant equipment the pipeline knows how to simulate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EquipmentType {
    Centrifuge,
    Analyzer,
    Robot,
    Storage,
    Conveyor,
}

impl EquipmentType {
    pub const ALL: [EquipmentType; 5] = [
        EquipmentType::Centrifuge,
        EquipmentType::Analyzer,
        EquipmentType::Robot,
        EquipmentType::Storage,
        EquipmentType::Conveyor,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EquipmentType::Centrifuge => "centrifuge",
            EquipmentType::Analyzer => "analyzer",
            EquipmentType::Robot => "robot",
            EquipmentType::Storage => "storage",
            EquipmentType::Conveyor => "conveyor",
        }
    }
}

impl std::fmt::Display for EquipmentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EquipmentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "centrifuge" => Ok(EquipmentType::Centrifuge),
            "analyzer" => Ok(EquipmentType::Analyzer),
            "robot" => Ok(EquipmentType::Robot),
            "storage" => Ok(EquipmentType::Storage),
            "conveyor" => Ok(EquipmentType::Conveyor),
            other => Err(format!("unknown equipment type: {other}")),
        }
    }
}

/// A piece of equipment registered with the simulation.
///
/// Created and owned by the persistence collaborator; the pipeline only
/// reads the id and type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Equipment {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: EquipmentType,
}

impl Equipment {
    pub fn new(id: impl Into<String>, kind: EquipmentType) -> Self {
        Self {
            id: id.into(),
            kind,
        }
    }
}

/// Notification delivery channels supported by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    WhatsApp,
    Email,
    Webhook,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::WhatsApp => "whatsapp",
            Channel::Email => "email",
            Channel::Webhook => "webhook",
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Channel string that no adapter handles.
///
/// Surfaced while validating a workflow graph, before any tick runs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported channel: {0}")]
pub struct UnknownChannel(pub String);

impl std::str::FromStr for Channel {
    type Err = UnknownChannel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "whatsapp" => Ok(Channel::WhatsApp),
            "email" => Ok(Channel::Email),
            "webhook" => Ok(Channel::Webhook),
            other => Err(UnknownChannel(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equipment_type_roundtrip() {
        for kind in EquipmentType::ALL {
            let parsed: EquipmentType = kind.as_str().parse().unwrap();
            assert_eq!(parsed, kind);
        }
    }

    #[test]
    fn equipment_type_serde_lowercase() {
        let json = serde_json::to_string(&EquipmentType::Centrifuge).unwrap();
        assert_eq!(json, "\"centrifuge\"");
    }

    #[test]
    fn channel_parse_known() {
        assert_eq!("whatsapp".parse::<Channel>().unwrap(), Channel::WhatsApp);
        assert_eq!("email".parse::<Channel>().unwrap(), Channel::Email);
        assert_eq!("webhook".parse::<Channel>().unwrap(), Channel::Webhook);
    }

    #[test]
    fn channel_parse_unknown() {
        let err = "sms".parse::<Channel>().unwrap_err();
        assert_eq!(err.to_string(), "unsupported channel: sms");
    }
}
