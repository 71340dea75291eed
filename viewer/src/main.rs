//! Bestiary Viewer - spawns every roster creature in a grid and animates it
//!
//! Usage: `viewer [creature-id ...]` (no ids shows the whole roster).
//! Keys: 1/2/3 force quality, 0 clears the override, R re-rolls seeds, F3 band gizmos.

mod creatures;
mod input;
mod rendering;
mod roster;

use bevy::asset::AssetPlugin;
use bevy::prelude::*;
use bevy::window::WindowResolution;
use bestiary::BestiaryPlugin;
use std::path::PathBuf;

/// Get the asset path - for bundled macOS apps, use path relative to executable
fn get_asset_path() -> String {
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            let bundled_assets = exe_dir.join("assets");
            if bundled_assets.exists() {
                info!("Using bundled assets at: {:?}", bundled_assets);
                return bundled_assets.to_string_lossy().to_string();
            }
        }
    }
    // Fall back to default "assets" folder (for development)
    "assets".to_string()
}

fn main() {
    let asset_path = get_asset_path();
    let roster_path = PathBuf::from(&asset_path).join("roster.ron");

    let mut app = App::new();

    app.add_plugins(
        DefaultPlugins
            .set(WindowPlugin {
                primary_window: Some(Window {
                    title: "Bestiary Viewer".to_string(),
                    resolution: WindowResolution::new(1280, 720),
                    ..default()
                }),
                ..default()
            })
            .set(AssetPlugin {
                file_path: asset_path,
                ..default()
            }),
    );

    // Shared mesh/material pool
    app.add_plugins(BestiaryPlugin);

    // Name -> spec lookup (built-in table + assets/roster.ron)
    app.insert_resource(roster::RosterPath(roster_path));
    app.add_plugins(roster::RosterPlugin);

    // Keyboard controls and viewer settings
    app.add_plugins(input::ViewerInputPlugin);
    app.insert_resource(input::ViewerSettings {
        only: std::env::args().skip(1).collect(),
        ..default()
    });

    // Spawning, per-frame animation and scene sync
    app.add_plugins(creatures::CreaturesPlugin);

    app.add_systems(Startup, rendering::setup_rendering);

    app.run();
}
