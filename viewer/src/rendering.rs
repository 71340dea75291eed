//! Rendering setup
//!
//! Camera and lights for the creature grid.

use bevy::core_pipeline::tonemapping::Tonemapping;
use bevy::light::light_consts::lux;
use bevy::post_process::bloom::Bloom;
use bevy::prelude::*;

/// One-time rendering setup.
pub fn setup_rendering(mut commands: Commands) {
    commands.insert_resource(ClearColor(Color::srgb(0.02, 0.02, 0.04)));
    commands.insert_resource(AmbientLight {
        color: Color::srgb(0.55, 0.6, 0.75),
        brightness: 250.0,
        ..default()
    });

    commands.spawn((
        Camera3d::default(),
        // Emissive nodes and arcs rely on bloom to read as glowing.
        Tonemapping::AcesFitted,
        Bloom {
            intensity: 0.25,
            ..Bloom::NATURAL
        },
        Transform::from_xyz(0.0, 14.0, 22.0).looking_at(Vec3::new(0.0, 0.0, 2.0), Vec3::Y),
    ));

    commands.spawn((
        DirectionalLight {
            illuminance: lux::OVERCAST_DAY,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(6.0, 12.0, 8.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    info!("Viewer rendering initialized");
}
