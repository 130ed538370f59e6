use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub use profile_library::{FixtureProfile, ProfileLibrary};

mod profile_library;
mod rig_file;

/// Functional role of a fixture within the rig.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixtureCategory {
    /// Primary wash light, carries the base look.
    Wash,
    /// Accent/spot fixture for hits and highlights.
    Spot,
    /// Effect fixture (strobes, derby/flower units, lasers).
    Special,
}

impl std::fmt::Display for FixtureCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FixtureCategory::Wash => write!(f, "Wash"),
            FixtureCategory::Spot => write!(f, "Spot"),
            FixtureCategory::Special => write!(f, "Special"),
        }
    }
}

/// Logical control a DMX channel drives.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelControl {
    Dimmer,
    Red,
    Green,
    Blue,
    White,
    Strobe,
    Pan,
    Tilt,
    Speed,
    Program,
    Other(String),
}

impl ChannelControl {
    /// Parse a control name as it appears in rig files. Unknown names are
    /// preserved as `Other` so a rig can carry channels the mapper ignores.
    pub fn parse(name: &str) -> Self {
        match name {
            "dimmer" => ChannelControl::Dimmer,
            "red" => ChannelControl::Red,
            "green" => ChannelControl::Green,
            "blue" => ChannelControl::Blue,
            "white" => ChannelControl::White,
            "strobe" => ChannelControl::Strobe,
            "pan" => ChannelControl::Pan,
            "tilt" => ChannelControl::Tilt,
            "speed" => ChannelControl::Speed,
            "program" => ChannelControl::Program,
            other => ChannelControl::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for ChannelControl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChannelControl::Dimmer => write!(f, "dimmer"),
            ChannelControl::Red => write!(f, "red"),
            ChannelControl::Green => write!(f, "green"),
            ChannelControl::Blue => write!(f, "blue"),
            ChannelControl::White => write!(f, "white"),
            ChannelControl::Strobe => write!(f, "strobe"),
            ChannelControl::Pan => write!(f, "pan"),
            ChannelControl::Tilt => write!(f, "tilt"),
            ChannelControl::Speed => write!(f, "speed"),
            ChannelControl::Program => write!(f, "program"),
            ChannelControl::Other(s) => write!(f, "{}", s),
        }
    }
}

/// One addressable channel of a fixture.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub control: ChannelControl,
    pub index: u16,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Fixture {
    pub id: String,
    pub name: String,
    pub category: FixtureCategory,
    pub channels: Vec<Channel>,
}

impl Fixture {
    pub fn new(id: &str, name: &str, category: FixtureCategory, channels: Vec<Channel>) -> Self {
        Fixture {
            id: id.to_string(),
            name: name.to_string(),
            category,
            channels,
        }
    }

    /// Look up the channel index for a logical control, if the fixture has one.
    pub fn channel(&self, control: &ChannelControl) -> Option<u16> {
        self.channels
            .iter()
            .find(|c| c.control == *control)
            .map(|c| c.index)
    }

    pub fn has_channel(&self, control: &ChannelControl) -> bool {
        self.channel(control).is_some()
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }
}

/// Errors raised while assembling or loading a rig. All of them are fatal:
/// a rig the mapper cannot address is unusable.
#[derive(Debug, thiserror::Error)]
pub enum MalformedRigError {
    #[error("duplicate fixture id '{0}'")]
    DuplicateFixture(String),
    #[error("fixture '{0}' has an empty channel map")]
    EmptyChannelMap(String),
    #[error("fixture '{fixture}' is missing a required '{control}' channel")]
    MissingChannel { fixture: String, control: String },
    #[error("failed to read rig file: {0}")]
    Read(String),
    #[error("failed to parse rig file: {0}")]
    Parse(String),
}

/// The full set of controllable fixtures, indexed by category. Immutable
/// once constructed.
#[derive(Clone, Debug)]
pub struct Rig {
    name: String,
    fixtures: Vec<Fixture>,
    by_category: HashMap<FixtureCategory, Vec<usize>>,
}

impl Rig {
    pub fn new(name: &str, fixtures: Vec<Fixture>) -> Result<Self, MalformedRigError> {
        let mut seen = std::collections::HashSet::new();
        for fixture in &fixtures {
            if !seen.insert(fixture.id.as_str()) {
                return Err(MalformedRigError::DuplicateFixture(fixture.id.clone()));
            }
            if fixture.channels.is_empty() {
                return Err(MalformedRigError::EmptyChannelMap(fixture.id.clone()));
            }
            // A wash carries the base look; without dimmer + color the
            // mapper cannot drive it.
            if fixture.category == FixtureCategory::Wash {
                if !fixture.has_channel(&ChannelControl::Dimmer) {
                    return Err(MalformedRigError::MissingChannel {
                        fixture: fixture.id.clone(),
                        control: ChannelControl::Dimmer.to_string(),
                    });
                }
                let has_color = [
                    ChannelControl::Red,
                    ChannelControl::Green,
                    ChannelControl::Blue,
                    ChannelControl::White,
                ]
                .iter()
                .any(|c| fixture.has_channel(c));
                if !has_color {
                    return Err(MalformedRigError::MissingChannel {
                        fixture: fixture.id.clone(),
                        control: ChannelControl::Red.to_string(),
                    });
                }
            }
        }

        let mut by_category: HashMap<FixtureCategory, Vec<usize>> = HashMap::new();
        for (idx, fixture) in fixtures.iter().enumerate() {
            by_category.entry(fixture.category).or_default().push(idx);
        }

        Ok(Rig {
            name: name.to_string(),
            fixtures,
            by_category,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fixtures(&self) -> &[Fixture] {
        &self.fixtures
    }

    pub fn in_category(&self, category: FixtureCategory) -> impl Iterator<Item = &Fixture> {
        self.by_category
            .get(&category)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
            .iter()
            .map(move |&idx| &self.fixtures[idx])
    }

    pub fn category_count(&self, category: FixtureCategory) -> usize {
        self.by_category.get(&category).map_or(0, |v| v.len())
    }

    pub fn len(&self) -> usize {
        self.fixtures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fixtures.is_empty()
    }
}

#[macro_export]
macro_rules! channel_map {
    ($(($control:expr, $index:expr)),* $(,)?) => {
        vec![
            $(
                $crate::Channel {
                    control: $control,
                    index: $index,
                },
            )*
        ]
    };
}
