use std::collections::BTreeMap;

use prism_rig::{ChannelControl, Fixture, FixtureCategory, Rig};
use serde::{Deserialize, Serialize};

use super::palette::color_at;
use crate::scene::{Focus, Motion, Palette, SemanticScene, StrobeRate};
use crate::settings::ResolveSettings;

/// Wash dimmers never drop below this while a wash look is active.
const WASH_DIMMER_FLOOR: u8 = 30;
const STROBE_SOFT_RATE: u8 = 128;
const STROBE_HARD_RATE: u8 = 220;
const CENTER_POSITION: u8 = 128;

/// Channel values for one fixture, keyed by channel index. BTreeMap keeps
/// serialization order stable.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureState {
    pub fixture_id: String,
    pub channels: BTreeMap<u16, u8>,
}

/// A semantic scene paired with the concrete channel values it maps to on
/// a given rig. The unit handed to the output sink.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResolvedScene {
    pub scene: SemanticScene,
    pub states: Vec<FixtureState>,
}

/// Translate one semantic scene into per-fixture channel values. Pure:
/// identical (scene, rig, settings) always yields identical output. Every
/// fixture receives a state; inactive fixtures get explicit off values
/// rather than being omitted.
pub fn map_scene(scene: &SemanticScene, rig: &Rig, settings: &ResolveSettings) -> ResolvedScene {
    let mut states = Vec::with_capacity(rig.len());

    for category in [
        FixtureCategory::Wash,
        FixtureCategory::Spot,
        FixtureCategory::Special,
    ] {
        for (position, fixture) in rig.in_category(category).enumerate() {
            let channels = match category {
                FixtureCategory::Wash => wash_channels(scene, fixture, position),
                FixtureCategory::Spot => spot_channels(scene, fixture, position),
                FixtureCategory::Special => {
                    special_channels(scene, fixture, settings.special_min_energy)
                }
            };
            states.push(FixtureState {
                fixture_id: fixture.id.clone(),
                channels,
            });
        }
    }

    // Sink write order should follow rig order, not category order.
    states.sort_by_key(|state| {
        rig.fixtures()
            .iter()
            .position(|f| f.id == state.fixture_id)
            .unwrap_or(usize::MAX)
    });

    ResolvedScene {
        scene: scene.clone(),
        states,
    }
}

fn wash_channels(scene: &SemanticScene, fixture: &Fixture, position: usize) -> BTreeMap<u16, u8> {
    let mut channels = BTreeMap::new();

    // The base look goes fully dark only when the scene deliberately moves
    // all attention away from the washes.
    let dimmer = if scene.energy == 1 && scene.focus != Focus::Wash {
        0
    } else {
        energy_level(scene.energy).max(WASH_DIMMER_FLOOR)
    };
    set(&mut channels, fixture, &ChannelControl::Dimmer, dimmer);

    let (r, g, b) = color_at(scene.palette, position);
    set(&mut channels, fixture, &ChannelControl::Red, r);
    set(&mut channels, fixture, &ChannelControl::Green, g);
    set(&mut channels, fixture, &ChannelControl::Blue, b);
    set(
        &mut channels,
        fixture,
        &ChannelControl::White,
        if scene.palette == Palette::Neutral { 255 } else { 0 },
    );

    set(
        &mut channels,
        fixture,
        &ChannelControl::Speed,
        motion_speed(scene.motion),
    );
    set(
        &mut channels,
        fixture,
        &ChannelControl::Strobe,
        strobe_rate(scene.strobe),
    );

    channels
}

fn spot_channels(scene: &SemanticScene, fixture: &Fixture, position: usize) -> BTreeMap<u16, u8> {
    let mut channels = BTreeMap::new();
    let active = matches!(scene.focus, Focus::Accents | Focus::Mixed);

    if active {
        set(
            &mut channels,
            fixture,
            &ChannelControl::Dimmer,
            energy_level(scene.energy),
        );
        let (r, g, b) = color_at(scene.palette, position);
        set(&mut channels, fixture, &ChannelControl::Red, r);
        set(&mut channels, fixture, &ChannelControl::Green, g);
        set(&mut channels, fixture, &ChannelControl::Blue, b);
        set(&mut channels, fixture, &ChannelControl::White, 0);
        set(&mut channels, fixture, &ChannelControl::Pan, CENTER_POSITION);
        set(
            &mut channels,
            fixture,
            &ChannelControl::Tilt,
            CENTER_POSITION,
        );
        set(
            &mut channels,
            fixture,
            &ChannelControl::Speed,
            motion_speed(scene.motion),
        );
        set(
            &mut channels,
            fixture,
            &ChannelControl::Strobe,
            strobe_rate(scene.strobe),
        );
    } else {
        // Off, not omitted: the sink sees a value for every channel.
        for channel in &fixture.channels {
            channels.insert(channel.index, 0);
        }
    }

    channels
}

fn special_channels(
    scene: &SemanticScene,
    fixture: &Fixture,
    special_min_energy: u8,
) -> BTreeMap<u16, u8> {
    let mut channels = BTreeMap::new();
    let enabled = scene.energy >= special_min_energy;

    if enabled {
        set(&mut channels, fixture, &ChannelControl::Dimmer, 255);
        set(
            &mut channels,
            fixture,
            &ChannelControl::Program,
            program_for(scene.motion),
        );
        let mut speed = motion_speed(scene.motion);
        if scene.strobe != StrobeRate::None {
            speed = speed.max(200);
        }
        set(&mut channels, fixture, &ChannelControl::Speed, speed);
        set(
            &mut channels,
            fixture,
            &ChannelControl::Strobe,
            strobe_rate(scene.strobe),
        );
        let (r, g, b) = color_at(scene.palette, 0);
        set(&mut channels, fixture, &ChannelControl::Red, r);
        set(&mut channels, fixture, &ChannelControl::Green, g);
        set(&mut channels, fixture, &ChannelControl::Blue, b);
    } else {
        for channel in &fixture.channels {
            channels.insert(channel.index, 0);
        }
    }

    channels
}

/// Write a control value if the fixture exposes that control; fixtures
/// without the channel are skipped for it.
fn set(channels: &mut BTreeMap<u16, u8>, fixture: &Fixture, control: &ChannelControl, value: u8) {
    if let Some(index) = fixture.channel(control) {
        channels.insert(index, value);
    }
}

fn energy_level(energy: u8) -> u8 {
    ((energy as u16 * 255) / 5).min(255) as u8
}

fn motion_speed(motion: Motion) -> u8 {
    match motion {
        Motion::Static => 0,
        Motion::Slow => 64,
        Motion::Medium => 128,
        Motion::Fast => 210,
    }
}

fn program_for(motion: Motion) -> u8 {
    // 0-50: off, 51-150: derby, 151-255: auto program.
    match motion {
        Motion::Static | Motion::Slow => 80,
        Motion::Medium => 120,
        Motion::Fast => 200,
    }
}

fn strobe_rate(strobe: StrobeRate) -> u8 {
    match strobe {
        StrobeRate::None => 0,
        StrobeRate::Soft => STROBE_SOFT_RATE,
        StrobeRate::Hard => STROBE_HARD_RATE,
    }
}
