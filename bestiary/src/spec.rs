//! Declarative creature specification.
//!
//! `CreatureSpecDoc` is the loose, serializable document (every field optional, enum
//! values as strings, counts as signed integers). `CreatureSpec` is the typed,
//! sanitized model the rest of the crate consumes. Converting a document into a spec
//! normalizes everything it can and only fails on identity fields (`id`, `seed`).
//!
//! Field names on the wire are camelCase so JSON and RON documents share a schema.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::SpecError;

// =============================================================================
// LIMITS & DEFAULTS
// =============================================================================

/// Smallest extent any radius/length/scale is clamped to.
pub const MIN_EXTENT: f32 = 1e-3;

/// Highest geometry detail level.
pub const MAX_DETAIL: u8 = 2;

/// Upper bound for any instance count.
pub const MAX_INSTANCES: u32 = 2048;

/// Breathing amplitude cap (keeps the body scale positive).
pub const MAX_BREATHE: f32 = 0.9;

/// Radius used when a document's radius is not a finite number.
pub const DEFAULT_RADIUS: f32 = 1.0;

/// Spike length used when a document's length is not a finite number.
pub const DEFAULT_SPIKE_LENGTH: f32 = 0.6;

// =============================================================================
// ENUMERATIONS
// =============================================================================

/// Enumerations that appear by name in documents.
///
/// Unknown names fall back to `Default::default()`.
pub trait Named: Sized + Copy + Default + 'static {
    const ALL: &'static [Self];

    fn name(self) -> &'static str;

    fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|v| v.name().eq_ignore_ascii_case(name))
    }
}

/// Body primitive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BaseShape {
    Icosahedron,
    #[default]
    Sphere,
    TriPrism,
    HexPrism,
    Cylinder,
    Capsule,
}

impl Named for BaseShape {
    const ALL: &'static [Self] = &[
        Self::Icosahedron,
        Self::Sphere,
        Self::TriPrism,
        Self::HexPrism,
        Self::Cylinder,
        Self::Capsule,
    ];

    fn name(self) -> &'static str {
        match self {
            Self::Icosahedron => "icosahedron",
            Self::Sphere => "sphere",
            Self::TriPrism => "triPrism",
            Self::HexPrism => "hexPrism",
            Self::Cylinder => "cylinder",
            Self::Capsule => "capsule",
        }
    }
}

/// Ornament shape and placement rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SpikeStyle {
    #[default]
    Cone,
    /// Cone pointing into the body, sunk below the surface.
    Inverted,
    Disk,
    Block,
    Tentacle,
}

impl Named for SpikeStyle {
    const ALL: &'static [Self] = &[
        Self::Cone,
        Self::Inverted,
        Self::Disk,
        Self::Block,
        Self::Tentacle,
    ];

    fn name(self) -> &'static str {
        match self {
            Self::Cone => "cone",
            Self::Inverted => "inverted",
            Self::Disk => "disk",
            Self::Block => "block",
            Self::Tentacle => "tentacle",
        }
    }
}

/// LOD tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Quality {
    Low,
    Med,
    #[default]
    High,
}

impl Named for Quality {
    const ALL: &'static [Self] = &[Self::Low, Self::Med, Self::High];

    fn name(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Med => "med",
            Self::High => "high",
        }
    }
}

/// Hitbox scale waveform.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Waveform {
    #[default]
    Sine,
    Square,
    Noise,
}

impl Named for Waveform {
    const ALL: &'static [Self] = &[Self::Sine, Self::Square, Self::Noise];

    fn name(self) -> &'static str {
        match self {
            Self::Sine => "sine",
            Self::Square => "square",
            Self::Noise => "noise",
        }
    }
}

/// Node color strobe mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StrobeMode {
    #[default]
    Unified,
    Alternating,
}

impl Named for StrobeMode {
    const ALL: &'static [Self] = &[Self::Unified, Self::Alternating];

    fn name(self) -> &'static str {
        match self {
            Self::Unified => "unified",
            Self::Alternating => "alternating",
        }
    }
}

// =============================================================================
// TYPED SPEC
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodySpec {
    pub shape: BaseShape,
    pub radius: f32,
    /// Used by prisms, cylinders and capsules.
    pub height: f32,
    pub scale_x: f32,
    pub scale_y: f32,
    /// 0..=2
    pub detail: u8,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpikeSpec {
    pub count: u32,
    pub length: f32,
    pub radius: f32,
    pub style: SpikeStyle,
    /// Added to every ornament's base distance before band clamping.
    pub base_shift: f32,
    pub pulse: bool,
    /// Pulse amplitude as a fraction of `length`.
    pub pulse_intensity: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    pub base: Color,
    pub spike: Color,
    pub node: Color,
    pub arc: Color,
    pub emissive: Color,
    pub emissive_intensity: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Surface {
    pub metalness: f32,
    pub roughness: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Surfaces {
    pub body: Surface,
    pub spike: Surface,
    pub node: Surface,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitboxScale {
    pub waveform: Waveform,
    /// Cycles per second.
    pub speed: f32,
    pub min: f32,
    pub max: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeStrobe {
    pub mode: StrobeMode,
    pub color_a: Color,
    pub color_b: Color,
    pub speed: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationSpec {
    /// Yaw rate, radians per second.
    pub spin: f32,
    /// Roll rate, radians per second.
    pub roll: f32,
    pub breathe: f32,
    pub flicker_speed: f32,
    pub hitbox: Option<HitboxScale>,
    pub strobe: Option<NodeStrobe>,
}

/// Minimum silhouette kept regardless of LOD tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LodFloor {
    pub min_spike_count: u32,
    pub min_detail: u8,
}

/// Sanitized creature specification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CreatureSpecDoc", into = "CreatureSpecDoc")]
pub struct CreatureSpec {
    pub id: String,
    pub seed: u32,
    pub body: BodySpec,
    pub spikes: SpikeSpec,
    pub node_count: u32,
    pub arc_count: u32,
    pub palette: Palette,
    pub surfaces: Surfaces,
    pub animation: AnimationSpec,
    pub quality: Quality,
    pub lod: Option<LodFloor>,
}

impl CreatureSpec {
    /// A spec with every non-identity field at its default.
    pub fn new(id: impl Into<String>, seed: u32) -> Self {
        Self {
            id: id.into(),
            seed,
            body: BodySpec {
                shape: BaseShape::Sphere,
                radius: DEFAULT_RADIUS,
                height: 2.0,
                scale_x: 1.0,
                scale_y: 1.0,
                detail: 1,
            },
            spikes: SpikeSpec {
                count: 24,
                length: DEFAULT_SPIKE_LENGTH,
                radius: 0.12,
                style: SpikeStyle::Cone,
                base_shift: 0.0,
                pulse: false,
                pulse_intensity: 0.15,
            },
            node_count: 6,
            arc_count: 3,
            palette: Palette {
                base: Color::srgb(0.30, 0.22, 0.40),
                spike: Color::srgb(0.85, 0.80, 0.70),
                node: Color::srgb(0.30, 0.90, 1.00),
                arc: Color::srgb(0.55, 0.85, 1.00),
                emissive: Color::srgb(0.20, 0.70, 1.00),
                emissive_intensity: 2.0,
            },
            surfaces: Surfaces {
                body: Surface { metalness: 0.1, roughness: 0.7 },
                spike: Surface { metalness: 0.3, roughness: 0.4 },
                node: Surface { metalness: 0.0, roughness: 0.3 },
            },
            animation: AnimationSpec {
                spin: 0.4,
                roll: 0.0,
                breathe: 0.04,
                flicker_speed: 3.0,
                hitbox: None,
                strobe: None,
            },
            quality: Quality::High,
            lod: None,
        }
    }

    /// Clamp every numeric field into its valid range, logging each repair.
    ///
    /// Returns the document names of the repaired fields.
    pub fn normalize(&mut self) -> Vec<&'static str> {
        let Self {
            id,
            body,
            spikes,
            node_count,
            arc_count,
            palette,
            surfaces,
            animation,
            lod,
            ..
        } = self;
        let mut n = Normalizer {
            id: id.as_str(),
            fields: Vec::new(),
        };

        body.radius = n.positive("radius", body.radius, DEFAULT_RADIUS);
        body.height = n.positive("height", body.height, body.radius * 2.0);
        body.scale_x = n.positive("scaleX", body.scale_x, 1.0);
        body.scale_y = n.positive("scaleY", body.scale_y, 1.0);
        body.detail = n.detail("detail", body.detail);

        spikes.count = n.cap("spikeCount", spikes.count);
        spikes.length = n.non_negative("spikeLength", spikes.length, DEFAULT_SPIKE_LENGTH);
        spikes.radius = n.positive("spikeRadius", spikes.radius, 0.12);
        spikes.base_shift = n.finite("spikeBaseShift", spikes.base_shift, 0.0);
        spikes.pulse_intensity = n.non_negative("pulseIntensity", spikes.pulse_intensity, 0.0);

        *node_count = n.cap("nodeCount", *node_count);
        *arc_count = n.cap("arcCount", *arc_count);
        if *arc_count > 0 && *node_count < 2 {
            warn!(
                "creature '{}': arcCount {} needs at least 2 nodes (have {}), dropping arcs",
                n.id, arc_count, node_count
            );
            *arc_count = 0;
            n.fields.push("arcCount");
        }

        palette.emissive_intensity =
            n.non_negative("emissiveIntensity", palette.emissive_intensity, 1.0);

        for (metalness, roughness, surface) in [
            ("baseMetalness", "baseRoughness", &mut surfaces.body),
            ("spikeMetalness", "spikeRoughness", &mut surfaces.spike),
            ("nodeMetalness", "nodeRoughness", &mut surfaces.node),
        ] {
            surface.metalness = n.unit(metalness, surface.metalness, 0.0);
            surface.roughness = n.unit(roughness, surface.roughness, 0.5);
        }

        animation.spin = n.finite("spinSpeed", animation.spin, 0.0);
        animation.roll = n.finite("rollSpeed", animation.roll, 0.0);
        animation.breathe = n
            .non_negative("breathe", animation.breathe, 0.0)
            .min(MAX_BREATHE);
        animation.flicker_speed = n.finite("flickerSpeed", animation.flicker_speed, 0.0);

        if let Some(hitbox) = animation.hitbox.as_mut() {
            hitbox.speed = n.non_negative("hitboxScale.speed", hitbox.speed, 1.0);
            hitbox.min = n.positive("hitboxScale.min", hitbox.min, 1.0);
            hitbox.max = n.positive("hitboxScale.max", hitbox.max, 1.0);
            if hitbox.min > hitbox.max {
                warn!(
                    "creature '{}': hitboxScale min {} > max {}, swapping",
                    n.id, hitbox.min, hitbox.max
                );
                std::mem::swap(&mut hitbox.min, &mut hitbox.max);
                n.fields.push("hitboxScale");
            }
        }

        if let Some(strobe) = animation.strobe.as_mut() {
            strobe.speed = n.finite("nodeStrobe.speed", strobe.speed, 0.0);
        }

        if let Some(floor) = lod.as_mut() {
            floor.min_spike_count = n.cap("lod.minSpikeCount", floor.min_spike_count);
            floor.min_detail = n.detail("lod.minDetail", floor.min_detail);
        }

        n.fields
    }
}

/// Field repairs for one creature. Every repair is logged once.
struct Normalizer<'a> {
    id: &'a str,
    fields: Vec<&'static str>,
}

impl Normalizer<'_> {
    fn repaired<T: std::fmt::Display>(&mut self, field: &'static str, from: T, to: f32) -> f32 {
        warn!("creature '{}': {} = {} is invalid, using {}", self.id, field, from, to);
        self.fields.push(field);
        to
    }

    fn finite(&mut self, field: &'static str, value: f32, fallback: f32) -> f32 {
        if value.is_finite() {
            value
        } else {
            self.repaired(field, value, fallback)
        }
    }

    fn positive(&mut self, field: &'static str, value: f32, fallback: f32) -> f32 {
        if !value.is_finite() {
            self.repaired(field, value, fallback.max(MIN_EXTENT))
        } else if value < MIN_EXTENT {
            self.repaired(field, value, MIN_EXTENT)
        } else {
            value
        }
    }

    fn non_negative(&mut self, field: &'static str, value: f32, fallback: f32) -> f32 {
        if !value.is_finite() {
            self.repaired(field, value, fallback)
        } else if value < 0.0 {
            self.repaired(field, value, 0.0)
        } else {
            value
        }
    }

    fn unit(&mut self, field: &'static str, value: f32, fallback: f32) -> f32 {
        if !value.is_finite() {
            self.repaired(field, value, fallback)
        } else if !(0.0..=1.0).contains(&value) {
            self.repaired(field, value, value.clamp(0.0, 1.0))
        } else {
            value
        }
    }

    fn detail(&mut self, field: &'static str, value: u8) -> u8 {
        if value > MAX_DETAIL {
            warn!("creature '{}': {} = {} capped to {}", self.id, field, value, MAX_DETAIL);
            self.fields.push(field);
            MAX_DETAIL
        } else {
            value
        }
    }

    fn cap(&mut self, field: &'static str, value: u32) -> u32 {
        if value > MAX_INSTANCES {
            warn!("creature '{}': {} = {} capped to {}", self.id, field, value, MAX_INSTANCES);
            self.fields.push(field);
            MAX_INSTANCES
        } else {
            value
        }
    }
}

// =============================================================================
// DOCUMENT FORM
// =============================================================================

/// Seed as written in a document: integer or (finite) float.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SeedValue {
    Int(i64),
    Float(f64),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HitboxScaleDoc {
    pub waveform: Option<String>,
    pub speed: Option<f32>,
    pub min: Option<f32>,
    pub max: Option<f32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NodeStrobeDoc {
    pub mode: Option<String>,
    pub color_a: Option<String>,
    pub color_b: Option<String>,
    pub speed: Option<f32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LodFloorDoc {
    pub min_spike_count: Option<i64>,
    pub min_detail: Option<i64>,
}

/// Serializable creature document. Colors are `#rrggbb` hex strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreatureSpecDoc {
    pub id: Option<String>,
    pub seed: Option<SeedValue>,

    pub base_shape: Option<String>,
    pub radius: Option<f32>,
    pub height: Option<f32>,
    pub scale_x: Option<f32>,
    pub scale_y: Option<f32>,
    pub detail: Option<i64>,

    pub spike_count: Option<i64>,
    pub spike_length: Option<f32>,
    pub spike_radius: Option<f32>,
    pub spike_style: Option<String>,
    pub spike_base_shift: Option<f32>,
    pub spike_pulse: Option<bool>,
    pub pulse_intensity: Option<f32>,

    pub node_count: Option<i64>,
    pub arc_count: Option<i64>,

    pub base_color: Option<String>,
    pub spike_color: Option<String>,
    pub node_color: Option<String>,
    pub arc_color: Option<String>,
    pub emissive_color: Option<String>,
    pub emissive_intensity: Option<f32>,

    pub base_metalness: Option<f32>,
    pub base_roughness: Option<f32>,
    pub spike_metalness: Option<f32>,
    pub spike_roughness: Option<f32>,
    pub node_metalness: Option<f32>,
    pub node_roughness: Option<f32>,

    pub spin_speed: Option<f32>,
    pub roll_speed: Option<f32>,
    pub breathe: Option<f32>,
    pub flicker_speed: Option<f32>,
    pub hitbox_scale: Option<HitboxScaleDoc>,
    pub node_strobe: Option<NodeStrobeDoc>,

    pub quality: Option<String>,
    pub lod: Option<LodFloorDoc>,
}

/// Reads loose document values, logging every fallback.
struct DocReader<'a> {
    id: &'a str,
}

impl DocReader<'_> {
    fn choice<T: Named>(&self, field: &str, value: Option<&str>, current: T) -> T {
        match value {
            None => current,
            Some(name) => T::from_name(name).unwrap_or_else(|| {
                let fallback = T::default();
                warn!(
                    "creature '{}': unknown {} '{}', using '{}'",
                    self.id,
                    field,
                    name,
                    fallback.name()
                );
                fallback
            }),
        }
    }

    fn color(&self, field: &str, value: Option<&str>, current: Color) -> Color {
        match value {
            None => current,
            Some(hex) => match Srgba::hex(hex.trim()) {
                Ok(srgba) => Color::from(srgba),
                Err(e) => {
                    warn!("creature '{}': {} '{}' is not a color ({e}), keeping default", self.id, field, hex);
                    current
                }
            },
        }
    }

    fn count(&self, field: &str, value: Option<i64>, current: u32) -> u32 {
        match value {
            None => current,
            Some(v) if v < 0 => {
                warn!("creature '{}': {} = {} is negative, using 0", self.id, field, v);
                0
            }
            Some(v) => u32::try_from(v).unwrap_or(u32::MAX),
        }
    }

    fn detail(&self, field: &str, value: Option<i64>, current: u8) -> u8 {
        let count = self.count(field, value, u32::from(current));
        u8::try_from(count).unwrap_or(u8::MAX)
    }
}

fn apply<T>(slot: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *slot = v;
    }
}

fn hex(color: Color) -> Option<String> {
    Some(color.to_srgba().to_hex())
}

impl TryFrom<CreatureSpecDoc> for CreatureSpec {
    type Error = SpecError;

    fn try_from(doc: CreatureSpecDoc) -> Result<Self, Self::Error> {
        let id = doc
            .id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or(SpecError::MissingField("id"))?
            .to_string();

        let seed = match doc.seed {
            None => return Err(SpecError::MissingField("seed")),
            Some(SeedValue::Int(v)) => v as u32,
            Some(SeedValue::Float(v)) if v.is_finite() => v as i64 as u32,
            Some(SeedValue::Float(_)) => return Err(SpecError::NonFiniteSeed { id }),
        };

        let mut spec = CreatureSpec::new(id.clone(), seed);
        let r = DocReader { id: &id };

        let body = &mut spec.body;
        body.shape = r.choice("baseShape", doc.base_shape.as_deref(), body.shape);
        apply(&mut body.radius, doc.radius);
        apply(&mut body.height, doc.height);
        apply(&mut body.scale_x, doc.scale_x);
        apply(&mut body.scale_y, doc.scale_y);
        body.detail = r.detail("detail", doc.detail, body.detail);

        let spikes = &mut spec.spikes;
        spikes.count = r.count("spikeCount", doc.spike_count, spikes.count);
        apply(&mut spikes.length, doc.spike_length);
        apply(&mut spikes.radius, doc.spike_radius);
        spikes.style = r.choice("spikeStyle", doc.spike_style.as_deref(), spikes.style);
        apply(&mut spikes.base_shift, doc.spike_base_shift);
        apply(&mut spikes.pulse, doc.spike_pulse);
        apply(&mut spikes.pulse_intensity, doc.pulse_intensity);

        spec.node_count = r.count("nodeCount", doc.node_count, spec.node_count);
        spec.arc_count = r.count("arcCount", doc.arc_count, spec.arc_count);

        let palette = &mut spec.palette;
        palette.base = r.color("baseColor", doc.base_color.as_deref(), palette.base);
        palette.spike = r.color("spikeColor", doc.spike_color.as_deref(), palette.spike);
        palette.node = r.color("nodeColor", doc.node_color.as_deref(), palette.node);
        palette.arc = r.color("arcColor", doc.arc_color.as_deref(), palette.arc);
        palette.emissive = r.color("emissiveColor", doc.emissive_color.as_deref(), palette.emissive);
        apply(&mut palette.emissive_intensity, doc.emissive_intensity);

        let surfaces = &mut spec.surfaces;
        apply(&mut surfaces.body.metalness, doc.base_metalness);
        apply(&mut surfaces.body.roughness, doc.base_roughness);
        apply(&mut surfaces.spike.metalness, doc.spike_metalness);
        apply(&mut surfaces.spike.roughness, doc.spike_roughness);
        apply(&mut surfaces.node.metalness, doc.node_metalness);
        apply(&mut surfaces.node.roughness, doc.node_roughness);

        let animation = &mut spec.animation;
        apply(&mut animation.spin, doc.spin_speed);
        apply(&mut animation.roll, doc.roll_speed);
        apply(&mut animation.breathe, doc.breathe);
        apply(&mut animation.flicker_speed, doc.flicker_speed);

        animation.hitbox = doc.hitbox_scale.map(|h| HitboxScale {
            waveform: r.choice("hitboxScale.waveform", h.waveform.as_deref(), Waveform::Sine),
            speed: h.speed.unwrap_or(1.0),
            min: h.min.unwrap_or(0.9),
            max: h.max.unwrap_or(1.1),
        });

        let node_color = spec.palette.node;
        animation.strobe = doc.node_strobe.map(|s| NodeStrobe {
            mode: r.choice("nodeStrobe.mode", s.mode.as_deref(), StrobeMode::Unified),
            color_a: r.color("nodeStrobe.colorA", s.color_a.as_deref(), node_color),
            color_b: r.color("nodeStrobe.colorB", s.color_b.as_deref(), Color::WHITE),
            speed: s.speed.unwrap_or(2.0),
        });

        spec.quality = r.choice("quality", doc.quality.as_deref(), spec.quality);
        spec.lod = doc.lod.map(|l| LodFloor {
            min_spike_count: r.count("lod.minSpikeCount", l.min_spike_count, 0),
            min_detail: r.detail("lod.minDetail", l.min_detail, 0),
        });

        spec.normalize();
        Ok(spec)
    }
}

impl From<CreatureSpec> for CreatureSpecDoc {
    fn from(spec: CreatureSpec) -> Self {
        let CreatureSpec {
            id,
            seed,
            body,
            spikes,
            node_count,
            arc_count,
            palette,
            surfaces,
            animation,
            quality,
            lod,
        } = spec;

        Self {
            id: Some(id),
            seed: Some(SeedValue::Int(i64::from(seed))),
            base_shape: Some(body.shape.name().to_string()),
            radius: Some(body.radius),
            height: Some(body.height),
            scale_x: Some(body.scale_x),
            scale_y: Some(body.scale_y),
            detail: Some(i64::from(body.detail)),
            spike_count: Some(i64::from(spikes.count)),
            spike_length: Some(spikes.length),
            spike_radius: Some(spikes.radius),
            spike_style: Some(spikes.style.name().to_string()),
            spike_base_shift: Some(spikes.base_shift),
            spike_pulse: Some(spikes.pulse),
            pulse_intensity: Some(spikes.pulse_intensity),
            node_count: Some(i64::from(node_count)),
            arc_count: Some(i64::from(arc_count)),
            base_color: hex(palette.base),
            spike_color: hex(palette.spike),
            node_color: hex(palette.node),
            arc_color: hex(palette.arc),
            emissive_color: hex(palette.emissive),
            emissive_intensity: Some(palette.emissive_intensity),
            base_metalness: Some(surfaces.body.metalness),
            base_roughness: Some(surfaces.body.roughness),
            spike_metalness: Some(surfaces.spike.metalness),
            spike_roughness: Some(surfaces.spike.roughness),
            node_metalness: Some(surfaces.node.metalness),
            node_roughness: Some(surfaces.node.roughness),
            spin_speed: Some(animation.spin),
            roll_speed: Some(animation.roll),
            breathe: Some(animation.breathe),
            flicker_speed: Some(animation.flicker_speed),
            hitbox_scale: animation.hitbox.map(|h| HitboxScaleDoc {
                waveform: Some(h.waveform.name().to_string()),
                speed: Some(h.speed),
                min: Some(h.min),
                max: Some(h.max),
            }),
            node_strobe: animation.strobe.map(|s| NodeStrobeDoc {
                mode: Some(s.mode.name().to_string()),
                color_a: hex(s.color_a),
                color_b: hex(s.color_b),
                speed: Some(s.speed),
            }),
            quality: Some(quality.name().to_string()),
            lod: lod.map(|l| LodFloorDoc {
                min_spike_count: Some(i64::from(l.min_spike_count)),
                min_detail: Some(i64::from(l.min_detail)),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: &str, seed: i64) -> CreatureSpecDoc {
        CreatureSpecDoc {
            id: Some(id.to_string()),
            seed: Some(SeedValue::Int(seed)),
            ..default()
        }
    }

    #[test]
    fn test_missing_seed_is_a_hard_error() {
        let d = CreatureSpecDoc {
            id: Some("urchin".into()),
            ..default()
        };
        assert_eq!(CreatureSpec::try_from(d), Err(SpecError::MissingField("seed")));
    }

    #[test]
    fn test_missing_or_blank_id_is_a_hard_error() {
        let mut d = doc("   ", 3);
        assert_eq!(CreatureSpec::try_from(d.clone()), Err(SpecError::MissingField("id")));
        d.id = None;
        assert_eq!(CreatureSpec::try_from(d), Err(SpecError::MissingField("id")));
    }

    #[test]
    fn test_non_finite_seed_is_rejected() {
        let mut d = doc("urchin", 0);
        d.seed = Some(SeedValue::Float(f64::NAN));
        assert!(matches!(
            CreatureSpec::try_from(d),
            Err(SpecError::NonFiniteSeed { .. })
        ));
    }

    #[test]
    fn test_negative_counts_become_zero() {
        let mut d = doc("urchin", 1);
        d.spike_count = Some(-4);
        d.node_count = Some(-1);
        d.arc_count = Some(-9);
        let spec = CreatureSpec::try_from(d).unwrap();
        assert_eq!(spec.spikes.count, 0);
        assert_eq!(spec.node_count, 0);
        assert_eq!(spec.arc_count, 0);
    }

    #[test]
    fn test_unknown_names_fall_back_to_defaults() {
        let mut d = doc("urchin", 1);
        d.spike_style = Some("feathers".into());
        d.base_shape = Some("dodecahedron".into());
        d.quality = Some("ultra".into());
        let spec = CreatureSpec::try_from(d).unwrap();
        assert_eq!(spec.spikes.style, SpikeStyle::Cone);
        assert_eq!(spec.body.shape, BaseShape::Sphere);
        assert_eq!(spec.quality, Quality::High);
    }

    #[test]
    fn test_names_are_case_insensitive() {
        assert_eq!(BaseShape::from_name("TRIPRISM"), Some(BaseShape::TriPrism));
        assert_eq!(SpikeStyle::from_name(" tentacle "), Some(SpikeStyle::Tentacle));
    }

    #[test]
    fn test_non_finite_radius_is_replaced() {
        let mut d = doc("urchin", 1);
        d.radius = Some(f32::NAN);
        d.spike_length = Some(-2.0);
        let spec = CreatureSpec::try_from(d).unwrap();
        assert_eq!(spec.body.radius, DEFAULT_RADIUS);
        assert_eq!(spec.spikes.length, 0.0);
    }

    #[test]
    fn test_zero_radius_clamped_to_epsilon() {
        let mut spec = CreatureSpec::new("urchin", 1);
        spec.body.radius = 0.0;
        spec.normalize();
        assert_eq!(spec.body.radius, MIN_EXTENT);
    }

    #[test]
    fn test_arcs_need_two_nodes() {
        let mut spec = CreatureSpec::new("urchin", 1);
        spec.node_count = 1;
        spec.arc_count = 4;
        spec.normalize();
        assert_eq!(spec.arc_count, 0);
    }

    #[test]
    fn test_bad_color_keeps_default() {
        let mut d = doc("urchin", 1);
        d.base_color = Some("not-a-color".into());
        d.spike_color = Some("#ff0000".into());
        let spec = CreatureSpec::try_from(d).unwrap();
        assert_eq!(spec.palette.base, CreatureSpec::new("x", 0).palette.base);
        assert_eq!(spec.palette.spike, Color::from(Srgba::rgb(1.0, 0.0, 0.0)));
    }

    #[test]
    fn test_hitbox_bounds_are_ordered() {
        let mut d = doc("urchin", 1);
        d.hitbox_scale = Some(HitboxScaleDoc {
            waveform: Some("square".into()),
            speed: Some(2.0),
            min: Some(1.3),
            max: Some(0.8),
        });
        let spec = CreatureSpec::try_from(d).unwrap();
        let hitbox = spec.animation.hitbox.unwrap();
        assert_eq!(hitbox.waveform, Waveform::Square);
        assert!(hitbox.min <= hitbox.max);
    }

    #[test]
    fn test_document_round_trip_preserves_spec() {
        let mut spec = CreatureSpec::new("urchin", 42);
        spec.spikes.style = SpikeStyle::Tentacle;
        spec.lod = Some(LodFloor {
            min_spike_count: 20,
            min_detail: 1,
        });
        let back = CreatureSpec::try_from(CreatureSpecDoc::from(spec.clone())).unwrap();
        assert_eq!(back.seed, 42);
        assert_eq!(back.spikes.style, SpikeStyle::Tentacle);
        assert_eq!(back.lod, spec.lod);
        assert_eq!(back.body, spec.body);
    }

    #[test]
    fn test_surface_repairs_name_their_fields() {
        let mut d = doc("urchin", 1);
        d.base_roughness = Some(f32::NAN);
        d.spike_metalness = Some(3.0);
        let spec = CreatureSpec::try_from(d).unwrap();
        assert_eq!(spec.surfaces.body.roughness, 0.5);
        assert_eq!(spec.surfaces.spike.metalness, 1.0);

        let mut raw = CreatureSpec::new("urchin", 1);
        raw.surfaces.body.roughness = f32::NAN;
        raw.surfaces.spike.metalness = 3.0;
        raw.surfaces.node.metalness = -1.0;
        assert_eq!(
            raw.normalize(),
            vec!["baseRoughness", "spikeMetalness", "nodeMetalness"]
        );
    }

    #[test]
    fn test_clean_spec_needs_no_repairs() {
        let mut spec = CreatureSpec::new("urchin", 1);
        assert!(spec.normalize().is_empty());
    }
}
