use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::{Channel, ChannelControl, Fixture, FixtureCategory, MalformedRigError, Rig};

/// On-disk rig description. Channels are keyed by logical control name so a
/// rig file stays readable next to the fixture manuals it was written from.
#[derive(Debug, Deserialize)]
struct RigFile {
    name: String,
    fixtures: Vec<FixtureEntry>,
}

#[derive(Debug, Deserialize)]
struct FixtureEntry {
    id: String,
    name: String,
    category: FixtureCategory,
    channels: BTreeMap<String, u16>,
}

impl Rig {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, MalformedRigError> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| MalformedRigError::Read(e.to_string()))?;
        Self::from_json_str(&content)
    }

    pub fn from_json_str(content: &str) -> Result<Self, MalformedRigError> {
        let file: RigFile =
            serde_json::from_str(content).map_err(|e| MalformedRigError::Parse(e.to_string()))?;

        let fixtures = file
            .fixtures
            .into_iter()
            .map(|entry| {
                let channels = entry
                    .channels
                    .iter()
                    .map(|(control, &index)| Channel {
                        control: ChannelControl::parse(control),
                        index,
                    })
                    .collect();
                Fixture::new(&entry.id, &entry.name, entry.category, channels)
            })
            .collect();

        Rig::new(&file.name, fixtures)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RIG_JSON: &str = r#"{
        "name": "Club Rig",
        "fixtures": [
            {
                "id": "wash-1",
                "name": "Left Wash",
                "category": "wash",
                "channels": {"dimmer": 0, "red": 1, "green": 2, "blue": 3}
            },
            {
                "id": "spot-1",
                "name": "Center Spot",
                "category": "spot",
                "channels": {"pan": 0, "tilt": 1, "dimmer": 2, "red": 3, "green": 4, "blue": 5}
            },
            {
                "id": "fx-1",
                "name": "Superfly",
                "category": "special",
                "channels": {"dimmer": 0, "strobe": 1, "program": 2, "speed": 3}
            }
        ]
    }"#;

    #[test]
    fn loads_rig_from_json() {
        let rig = Rig::from_json_str(RIG_JSON).unwrap();
        assert_eq!(rig.name(), "Club Rig");
        assert_eq!(rig.len(), 3);
        assert_eq!(rig.category_count(FixtureCategory::Wash), 1);
        let spot = rig.in_category(FixtureCategory::Spot).next().unwrap();
        assert_eq!(spot.channel(&ChannelControl::Tilt), Some(1));
    }

    #[test]
    fn rejects_invalid_json() {
        let err = Rig::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, MalformedRigError::Parse(_)));
    }

    #[test]
    fn rejects_wash_missing_required_channels() {
        let json = r#"{
            "name": "Broken",
            "fixtures": [
                {"id": "w", "name": "W", "category": "wash", "channels": {"pan": 0}}
            ]
        }"#;
        let err = Rig::from_json_str(json).unwrap_err();
        assert!(matches!(err, MalformedRigError::MissingChannel { .. }));
    }

    #[test]
    fn loads_rig_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rig.json");
        fs::write(&path, RIG_JSON).unwrap();
        let rig = Rig::from_json_file(&path).unwrap();
        assert_eq!(rig.len(), 3);
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = Rig::from_json_file("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, MalformedRigError::Read(_)));
    }

    #[test]
    fn unknown_channel_names_are_preserved() {
        let json = r#"{
            "name": "Odd",
            "fixtures": [
                {"id": "s", "name": "Smoke", "category": "special",
                 "channels": {"smoke": 0, "dimmer": 1}}
            ]
        }"#;
        let rig = Rig::from_json_str(json).unwrap();
        let fx = rig.fixtures().first().unwrap();
        assert!(fx.has_channel(&ChannelControl::Other("smoke".to_string())));
    }
}
