use std::collections::HashMap;

use crate::{channel_map, Channel, ChannelControl, Fixture, FixtureCategory};

/// A named channel layout a fixture can be patched from.
#[derive(Clone, Debug)]
pub struct FixtureProfile {
    pub id: String,
    pub category: FixtureCategory,
    pub manufacturer: String,
    pub model: String,
    pub channel_layout: Vec<Channel>,
}

impl std::fmt::Display for FixtureProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.manufacturer, self.model)
    }
}

#[derive(Default)]
pub struct ProfileLibrary {
    pub profiles: HashMap<String, FixtureProfile>,
}

impl ProfileLibrary {
    pub fn new() -> Self {
        let mut profiles = HashMap::new();

        // Define all fixture profiles. Note in the future we'll load these from disk.
        profiles.insert(
            "generic-rgbw-wash-par".to_string(),
            FixtureProfile {
                id: "generic-rgbw-wash-par".to_string(),
                category: FixtureCategory::Wash,
                manufacturer: "Generic".to_string(),
                model: "LED Flat PAR RGBW".to_string(),
                channel_layout: channel_map![
                    (ChannelControl::Dimmer, 0),
                    (ChannelControl::Red, 1),
                    (ChannelControl::Green, 2),
                    (ChannelControl::Blue, 3),
                    (ChannelControl::White, 4),
                    (ChannelControl::Strobe, 5),
                    (ChannelControl::Program, 6),
                    (ChannelControl::Speed, 7),
                ],
            },
        );

        profiles.insert(
            "compact-led-spot".to_string(),
            FixtureProfile {
                id: "compact-led-spot".to_string(),
                category: FixtureCategory::Spot,
                manufacturer: "Generic".to_string(),
                model: "Compact LED Spot 60W".to_string(),
                channel_layout: channel_map![
                    (ChannelControl::Pan, 0),
                    (ChannelControl::Tilt, 1),
                    (ChannelControl::Dimmer, 2),
                    (ChannelControl::Red, 3),
                    (ChannelControl::Green, 4),
                    (ChannelControl::Blue, 5),
                    (ChannelControl::Strobe, 6),
                    (ChannelControl::Speed, 7),
                ],
            },
        );

        profiles.insert(
            "superfly-fx".to_string(),
            FixtureProfile {
                id: "superfly-fx".to_string(),
                category: FixtureCategory::Special,
                manufacturer: "Generic".to_string(),
                model: "Superfly Derby/Strobe FX".to_string(),
                channel_layout: channel_map![
                    (ChannelControl::Dimmer, 0),
                    (ChannelControl::Strobe, 1),
                    // 0-50: off, 51-150: derby, 151-255: auto program
                    (ChannelControl::Program, 2),
                    (ChannelControl::Speed, 3),
                    (ChannelControl::Red, 4),
                    (ChannelControl::Green, 5),
                    (ChannelControl::Blue, 6),
                ],
            },
        );

        ProfileLibrary { profiles }
    }

    pub fn get(&self, profile_id: &str) -> Option<&FixtureProfile> {
        self.profiles.get(profile_id)
    }

    /// Patch a fixture from a profile. Returns `None` for an unknown profile id.
    pub fn patch(&self, profile_id: &str, fixture_id: &str, name: &str) -> Option<Fixture> {
        self.profiles.get(profile_id).map(|profile| {
            Fixture::new(
                fixture_id,
                name,
                profile.category,
                profile.channel_layout.clone(),
            )
        })
    }
}
