//! Creature entities
//!
//! Each roster creature becomes a root entity carrying its `Creature` component,
//! with one child per body, ornament, node and arc. The core only hands out
//! transforms and colors; the systems here copy them into the scene every frame.

use bevy::mesh::PrimitiveTopology;
use bevy::prelude::*;
use bestiary::{build_creature, Creature, CreatureSpec, ResourcePool, StrobeMode};

use crate::input::{RebuildRequested, ViewerSettings};
use crate::roster::Roster;

// =============================================================================
// COMPONENTS
// =============================================================================

/// Root of one creature.
#[derive(Component, Debug, Clone)]
pub struct CreatureRoot {
    /// Grid position of the creature.
    pub anchor: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartKind {
    Body,
    Ornament,
    Node,
    Arc,
}

/// A visual piece of a creature. `index` points into the owner's matching batch.
#[derive(Component, Debug, Clone, Copy)]
pub struct CreaturePart {
    pub owner: Entity,
    pub kind: PartKind,
    pub index: usize,
}

/// Assets a creature owns outright (never pooled, since they change per frame).
#[derive(Component, Debug, Default)]
pub struct OwnedCreatureAssets {
    /// One material per strobe phase slot.
    pub node_materials: Vec<Handle<StandardMaterial>>,
    pub arc_meshes: Vec<Handle<Mesh>>,
    pub arc_materials: Vec<Handle<StandardMaterial>>,
}

pub struct CreaturesPlugin;

impl Plugin for CreaturesPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, spawn_roster_creatures);
        app.add_systems(
            Update,
            (
                rebuild_creatures,
                animate_creatures,
                (sync_creature_roots, sync_creature_parts, sync_creature_materials),
                debug_draw_creature_bands,
            )
                .chain(),
        );
    }
}

// =============================================================================
// SPAWNING
// =============================================================================

fn grid_position(slot: usize, settings: &ViewerSettings) -> Vec3 {
    let columns = settings.columns.max(1);
    let col = (slot % columns) as f32;
    let row = (slot / columns) as f32;
    let width = (columns - 1) as f32 * settings.spacing;
    Vec3::new(col * settings.spacing - width * 0.5, 0.0, row * settings.spacing)
}

fn arc_mesh(points: &[Vec3]) -> Mesh {
    Mesh::new(PrimitiveTopology::LineStrip, default())
        .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, points.to_vec())
}

/// Clone a pooled material so one creature can animate it alone.
fn own_material(
    materials: &mut Assets<StandardMaterial>,
    pooled: &Handle<StandardMaterial>,
) -> Handle<StandardMaterial> {
    let material = materials.get(pooled).cloned().unwrap_or_default();
    materials.add(material)
}

fn spawn_creature(
    commands: &mut Commands,
    spec: &CreatureSpec,
    anchor: Vec3,
    settings: &ViewerSettings,
    pool: &mut ResourcePool,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
) {
    let creature = build_creature(spec, settings.quality, pool, meshes, materials);

    let slots = match creature.spec().animation.strobe {
        Some(strobe) if strobe.mode == StrobeMode::Alternating => 2,
        _ => 1,
    };
    let mut owned = OwnedCreatureAssets {
        node_materials: (0..slots)
            .map(|_| own_material(materials, &creature.nodes().material))
            .collect(),
        ..default()
    };
    for arc in &creature.arcs().arcs {
        owned.arc_meshes.push(meshes.add(arc_mesh(&arc.points)));
        owned.arc_materials.push(own_material(materials, &creature.arcs().material));
    }

    let root = commands
        .spawn((
            Name::new(format!("creature:{}", spec.id)),
            CreatureRoot { anchor },
            Transform::from_translation(anchor),
            Visibility::default(),
        ))
        .id();

    commands.entity(root).with_children(|parent| {
        let body = creature.body();
        parent.spawn((
            CreaturePart { owner: root, kind: PartKind::Body, index: 0 },
            Mesh3d(body.mesh.clone()),
            MeshMaterial3d(body.material.clone()),
            body.transform,
        ));

        let ornaments = creature.ornaments();
        for (index, transform) in ornaments.transforms.iter().enumerate() {
            parent.spawn((
                CreaturePart { owner: root, kind: PartKind::Ornament, index },
                Mesh3d(ornaments.mesh.clone()),
                MeshMaterial3d(ornaments.material.clone()),
                *transform,
            ));
        }

        let nodes = creature.nodes();
        for (index, transform) in nodes.transforms.iter().enumerate() {
            let material = owned.node_materials[index % owned.node_materials.len()].clone();
            parent.spawn((
                CreaturePart { owner: root, kind: PartKind::Node, index },
                Mesh3d(nodes.mesh.clone()),
                MeshMaterial3d(material),
                *transform,
            ));
        }

        for (index, (mesh, material)) in owned.arc_meshes.iter().zip(&owned.arc_materials).enumerate() {
            parent.spawn((
                CreaturePart { owner: root, kind: PartKind::Arc, index },
                Mesh3d(mesh.clone()),
                MeshMaterial3d(material.clone()),
                Transform::default(),
            ));
        }
    });

    info!(
        "Spawned '{}' ({:?}): {} ornaments, {} nodes, {} arcs",
        spec.id,
        creature.spec().quality,
        creature.ornaments().len(),
        creature.nodes().len(),
        creature.arcs().arcs.len()
    );
    commands.entity(root).insert((creature, owned));
}

fn spawn_all(
    commands: &mut Commands,
    roster: &Roster,
    settings: &ViewerSettings,
    pool: &mut ResourcePool,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
) {
    let specs: Vec<&CreatureSpec> = if settings.only.is_empty() {
        roster.iter().collect()
    } else {
        settings
            .only
            .iter()
            .filter_map(|id| {
                let spec = roster.get(id);
                if spec.is_none() {
                    warn!("Unknown creature '{id}'");
                }
                spec
            })
            .collect()
    };

    for (slot, spec) in specs.into_iter().enumerate() {
        let anchor = grid_position(slot, settings);
        spawn_creature(commands, spec, anchor, settings, pool, meshes, materials);
    }
    let stats = pool.stats();
    info!(
        "Pool: {} meshes, {} materials ({} hits, {} misses)",
        stats.geometries, stats.materials, stats.hits, stats.misses
    );
}

pub fn spawn_roster_creatures(
    mut commands: Commands,
    roster: Option<Res<Roster>>,
    settings: Res<ViewerSettings>,
    mut pool: ResMut<ResourcePool>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let Some(roster) = roster else {
        warn!("No roster available, nothing to spawn");
        return;
    };
    spawn_all(&mut commands, &roster, &settings, &mut pool, &mut meshes, &mut materials);
}

/// Tear down and respawn every creature after a quality or seed change.
/// Owned assets are freed with their handles; pooled ones stay.
pub fn rebuild_creatures(
    mut commands: Commands,
    mut rebuild: ResMut<RebuildRequested>,
    roots: Query<Entity, With<CreatureRoot>>,
    roster: Option<Res<Roster>>,
    settings: Res<ViewerSettings>,
    mut pool: ResMut<ResourcePool>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    if !rebuild.0 {
        return;
    }
    rebuild.0 = false;

    for entity in roots.iter() {
        commands.entity(entity).despawn();
    }
    if let Some(roster) = roster {
        spawn_all(&mut commands, &roster, &settings, &mut pool, &mut meshes, &mut materials);
    }
}

// =============================================================================
// PER-FRAME
// =============================================================================

pub fn animate_creatures(time: Res<Time>, mut creatures: Query<&mut Creature>) {
    let t = time.elapsed_secs();
    let dt = time.delta_secs();
    for mut creature in creatures.iter_mut() {
        creature.update(t, Some(dt));
    }
}

pub fn sync_creature_roots(mut roots: Query<(&Creature, &CreatureRoot, &mut Transform)>) {
    for (creature, root, mut transform) in roots.iter_mut() {
        *transform = creature.root_transform().with_translation(root.anchor);
    }
}

/// Only ornaments move relative to the root (nodes and the body are static).
pub fn sync_creature_parts(
    creatures: Query<&Creature>,
    mut parts: Query<(&CreaturePart, &mut Transform), Without<CreatureRoot>>,
) {
    for (part, mut transform) in parts.iter_mut() {
        if part.kind != PartKind::Ornament {
            continue;
        }
        let Ok(creature) = creatures.get(part.owner) else { continue };
        if let Some(current) = creature.ornaments().transforms.get(part.index) {
            *transform = *current;
        }
    }
}

/// Node strobe/flicker, arc polylines and arc opacity.
pub fn sync_creature_materials(
    creatures: Query<(&Creature, &OwnedCreatureAssets)>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    for (creature, owned) in creatures.iter() {
        let emissive = creature.node_emissive();
        for (slot, handle) in owned.node_materials.iter().enumerate() {
            let Some(color) = creature.node_colors().get(slot) else { continue };
            if let Some(material) = materials.get_mut(handle) {
                material.base_color = *color;
                material.emissive = emissive;
            }
        }

        for (i, arc) in creature.arcs().arcs.iter().enumerate() {
            if let Some(mesh) = owned.arc_meshes.get(i).and_then(|h| meshes.get_mut(h)) {
                mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, arc.points.clone());
            }
            if let Some(material) = owned.arc_materials.get(i).and_then(|h| materials.get_mut(h)) {
                material.base_color.set_alpha(arc.opacity);
            }
        }
    }
}

// =============================================================================
// DEBUG (F3)
// =============================================================================

/// Inner/outer ornament band of every creature.
pub fn debug_draw_creature_bands(
    mut gizmos: Gizmos,
    settings: Res<ViewerSettings>,
    creatures: Query<(&Creature, &Transform), With<CreatureRoot>>,
) {
    if !settings.debug_bands {
        return;
    }

    for (creature, transform) in creatures.iter() {
        let (inner, outer) = creature.distance_band();
        let center = Isometry3d::new(transform.translation, transform.rotation);
        let scale = transform.scale.x;
        gizmos.sphere(center, inner * scale, Color::srgba(1.0, 0.3, 0.2, 0.6));
        gizmos.sphere(center, outer * scale, Color::srgba(0.2, 0.8, 1.0, 0.4));
        gizmos.sphere(center, creature.hitbox_radius() * scale, Color::srgba(1.0, 0.9, 0.2, 0.8));
    }
}
