//! Procedural creature generation.
//!
//! A `CreatureSpec` (seed plus shape, ornament, color and animation parameters) is
//! rewritten for a quality tier by `lod::adjust`, then assembled into a `Creature`
//! whose meshes and materials are shared through a `ResourcePool`. Hosts call
//! `Creature::update` once per frame and copy its transforms into their scene.

pub mod animation;
pub mod assembler;
pub mod error;
pub mod lod;
pub mod placement;
pub mod pool;
pub mod rng;
pub mod spec;

pub use assembler::{assemble, ArcBatch, ArcDescriptor, BodyInstance, Creature, InstanceBatch, Motion};
pub use error::SpecError;
pub use placement::{OrnamentDescriptor, OrnamentLayout};
pub use pool::{GeometryDescriptor, MaterialDescriptor, PoolStats, ResourceKey, ResourcePool};
pub use rng::CreatureRng;
pub use spec::{
    BaseShape, CreatureSpec, CreatureSpecDoc, Named, NodeStrobe, Quality, SpikeStyle, StrobeMode,
    Waveform,
};

use bevy::prelude::*;

/// Registers the shared `ResourcePool`.
pub struct BestiaryPlugin;

impl Plugin for BestiaryPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ResourcePool>();
    }
}

/// LOD-adjust `spec` and assemble it.
pub fn build_creature(
    spec: &CreatureSpec,
    quality_override: Option<Quality>,
    pool: &mut ResourcePool,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
) -> Creature {
    let adjusted = lod::adjust(spec, quality_override);
    assemble(&adjusted, pool, meshes, materials)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::LodFloor;

    fn build(spec: &CreatureSpec, quality: Option<Quality>, pool: &mut ResourcePool) -> Creature {
        let mut meshes = Assets::<Mesh>::default();
        let mut materials = Assets::<StandardMaterial>::default();
        build_creature(spec, quality, pool, &mut meshes, &mut materials)
    }

    fn urchin(spikes: u32, quality: Quality) -> CreatureSpec {
        let mut spec = CreatureSpec::new("urchin", 7);
        spec.spikes.count = spikes;
        spec.quality = quality;
        spec
    }

    #[test]
    fn test_high_quality_keeps_every_spike() {
        let mut pool = ResourcePool::new();
        let spec = urchin(42, Quality::High);
        let creature = build(&spec, None, &mut pool);
        assert_eq!(creature.ornaments().len(), 42);
        assert_eq!(creature.spec().body.detail, spec.body.detail);
    }

    #[test]
    fn test_low_quality_drops_to_29() {
        let mut pool = ResourcePool::new();
        let creature = build(&urchin(42, Quality::Low), None, &mut pool);
        assert_eq!(creature.ornaments().len(), 29);
    }

    #[test]
    fn test_floor_wins_over_low_tier() {
        let mut pool = ResourcePool::new();
        let mut spec = urchin(5, Quality::Low);
        spec.lod = Some(LodFloor {
            min_spike_count: 20,
            min_detail: 0,
        });
        let creature = build(&spec, None, &mut pool);
        assert_eq!(creature.ornaments().len(), 20);
    }

    #[test]
    fn test_override_beats_spec_quality() {
        let mut pool = ResourcePool::new();
        let creature = build(&urchin(42, Quality::High), Some(Quality::Med), &mut pool);
        assert_eq!(creature.ornaments().len(), 35);
        assert_eq!(creature.spec().quality, Quality::Med);
    }

    #[test]
    fn test_pipeline_is_deterministic() {
        let mut pool = ResourcePool::new();
        let spec = urchin(60, Quality::High);
        let a = build(&spec, None, &mut pool);
        let b = build(&spec, None, &mut pool);
        assert_eq!(a.ornaments().transforms, b.ornaments().transforms);
        assert_eq!(a.nodes().transforms, b.nodes().transforms);
        assert_eq!(a.arcs().arcs, b.arcs().arcs);
        assert_eq!(a.body().mesh.id(), b.body().mesh.id());
    }

    #[test]
    fn test_plugin_registers_pool() {
        let mut app = App::new();
        app.add_plugins(BestiaryPlugin);
        assert!(app.world().get_resource::<ResourcePool>().is_some());
    }
}
