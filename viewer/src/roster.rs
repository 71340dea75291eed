//! Creature roster
//!
//! Name → spec lookup. A built-in table is always available; `assets/roster.ron`
//! adds to it (entries with an existing id replace the built-in one).

use bevy::prelude::*;
use bestiary::spec::{HitboxScale, LodFloor, NodeStrobe};
use bestiary::{BaseShape, CreatureSpec, CreatureSpecDoc, SpecError, SpikeStyle, StrobeMode, Waveform};
use ron::extensions::Extensions;
use std::path::{Path, PathBuf};

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum RosterError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse roster: {0}")]
    Ron(#[from] ron::error::SpannedError),

    #[error("roster entry #{index}: {source}")]
    Spec {
        index: usize,
        #[source]
        source: SpecError,
    },
}

// =============================================================================
// ROSTER
// =============================================================================

/// Where the roster document lives.
#[derive(Resource, Debug, Clone)]
pub struct RosterPath(pub PathBuf);

#[derive(Resource, Debug, Clone, Default)]
pub struct Roster {
    entries: Vec<CreatureSpec>,
}

impl Roster {
    /// Parse a RON list of creature documents. `Some(..)` wrappers are optional.
    pub fn from_ron(text: &str) -> Result<Self, RosterError> {
        let docs: Vec<CreatureSpecDoc> = ron::Options::default()
            .with_default_extension(Extensions::IMPLICIT_SOME)
            .from_str(text)?;

        let entries = docs
            .into_iter()
            .enumerate()
            .map(|(index, doc)| {
                CreatureSpec::try_from(doc).map_err(|source| RosterError::Spec { index, source })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { entries })
    }

    pub fn load(path: &Path) -> Result<Self, RosterError> {
        let text = std::fs::read_to_string(path).map_err(|source| RosterError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_ron(&text)
    }

    /// Add `other`'s entries, replacing any with the same id.
    pub fn merge(&mut self, other: Roster) {
        for spec in other.entries {
            match self.position(&spec.id) {
                Some(i) => self.entries[i] = spec,
                None => self.entries.push(spec),
            }
        }
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.entries.iter().position(|s| s.id.eq_ignore_ascii_case(id))
    }

    /// Case-insensitive lookup by id.
    pub fn get(&self, id: &str) -> Option<&CreatureSpec> {
        self.position(id.trim()).map(|i| &self.entries[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &CreatureSpec> {
        self.entries.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut CreatureSpec> {
        self.entries.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Species that ship with the viewer.
    pub fn builtin() -> Self {
        let mut urchin = CreatureSpec::new("urchin", 7);
        urchin.spikes.count = 42;
        urchin.spikes.pulse = true;
        urchin.palette.base = Color::srgb(0.25, 0.12, 0.35);

        let mut jelly = CreatureSpec::new("lantern-jelly", 311);
        jelly.body.shape = BaseShape::Capsule;
        jelly.body.height = 2.6;
        jelly.body.scale_y = 1.2;
        jelly.spikes.count = 18;
        jelly.spikes.style = SpikeStyle::Tentacle;
        jelly.spikes.length = 0.9;
        jelly.spikes.radius = 0.08;
        jelly.node_count = 10;
        jelly.arc_count = 6;
        jelly.palette.base = Color::srgb(0.15, 0.35, 0.45);
        jelly.palette.emissive = Color::srgb(0.4, 1.0, 0.8);
        jelly.animation.roll = 0.3;
        jelly.animation.strobe = Some(NodeStrobe {
            mode: StrobeMode::Alternating,
            color_a: Color::srgb(0.2, 1.0, 0.7),
            color_b: Color::srgb(1.0, 0.3, 0.8),
            speed: 3.0,
        });

        let mut mite = CreatureSpec::new("prism-mite", 90210);
        mite.body.shape = BaseShape::TriPrism;
        mite.body.radius = 0.8;
        mite.body.height = 1.2;
        mite.spikes.count = 30;
        mite.spikes.style = SpikeStyle::Block;
        mite.spikes.length = 0.35;
        mite.node_count = 4;
        mite.arc_count = 2;
        mite.palette.base = Color::srgb(0.55, 0.45, 0.20);
        mite.palette.spike = Color::srgb(0.30, 0.25, 0.10);
        mite.animation.hitbox = Some(HitboxScale {
            waveform: Waveform::Square,
            speed: 0.8,
            min: 0.9,
            max: 1.15,
        });

        let mut burr = CreatureSpec::new("ico-burr", 4242);
        burr.body.shape = BaseShape::Icosahedron;
        burr.body.detail = 0;
        burr.spikes.count = 64;
        burr.spikes.style = SpikeStyle::Inverted;
        burr.spikes.length = 0.5;
        burr.node_count = 12;
        burr.arc_count = 8;
        burr.quality = bestiary::Quality::Med;
        burr.lod = Some(LodFloor {
            min_spike_count: 40,
            min_detail: 0,
        });
        burr.animation.hitbox = Some(HitboxScale {
            waveform: Waveform::Noise,
            speed: 0.6,
            min: 0.85,
            max: 1.2,
        });

        let mut shell = CreatureSpec::new("disk-shell", 77);
        shell.body.shape = BaseShape::HexPrism;
        shell.body.height = 0.9;
        shell.body.scale_x = 1.3;
        shell.spikes.count = 36;
        shell.spikes.style = SpikeStyle::Disk;
        shell.spikes.radius = 0.15;
        shell.node_count = 0;
        shell.arc_count = 0;
        shell.animation.spin = -0.25;

        Self {
            entries: vec![urchin, jelly, mite, burr, shell],
        }
    }
}

// =============================================================================
// PLUGIN
// =============================================================================

pub struct RosterPlugin;

impl Plugin for RosterPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(PreStartup, load_roster);
    }
}

/// Built-in table plus whatever the roster file adds. A missing or broken file
/// leaves the built-in table alone.
fn load_roster(mut commands: Commands, path: Option<Res<RosterPath>>) {
    let mut roster = Roster::builtin();

    match path {
        Some(path) if path.0.exists() => match Roster::load(&path.0) {
            Ok(extra) => {
                info!("Loaded {} creatures from {}", extra.len(), path.0.display());
                roster.merge(extra);
            }
            Err(e) => warn!("Ignoring roster file: {e}"),
        },
        Some(path) => warn!("No roster file at {}, using built-in creatures", path.0.display()),
        None => {}
    }

    info!("Roster ready: {} creatures", roster.len());
    commands.insert_resource(roster);
}
