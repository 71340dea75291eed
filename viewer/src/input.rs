//! Viewer keyboard controls
//!
//! `1`/`2`/`3` force low/med/high quality, `0` goes back to each creature's own tier,
//! `R` re-rolls every seed, `F3` toggles distance-band gizmos.

use bevy::prelude::*;
use bestiary::Quality;

use crate::roster::Roster;

// =============================================================================
// RESOURCES
// =============================================================================

/// Viewer-wide settings (adjustable with keys)
#[derive(Resource, Debug, Clone)]
pub struct ViewerSettings {
    /// Quality forced on every creature, `None` = use each spec's own tier.
    pub quality: Option<Quality>,
    /// Draw distance bands with gizmos.
    pub debug_bands: bool,
    /// Distance between creatures in the grid.
    pub spacing: f32,
    /// Creatures per grid row.
    pub columns: usize,
    /// Roster ids to show (from the command line). Empty shows the whole roster.
    pub only: Vec<String>,
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            quality: None,
            debug_bands: false,
            spacing: 6.0,
            columns: 4,
            only: Vec::new(),
        }
    }
}

/// Set when the creature grid has to be torn down and rebuilt.
#[derive(Resource, Debug, Default)]
pub struct RebuildRequested(pub bool);

pub struct ViewerInputPlugin;

impl Plugin for ViewerInputPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ViewerSettings>();
        app.init_resource::<RebuildRequested>();
        app.add_systems(Update, (select_quality, randomize_seeds, toggle_debug_bands));
    }
}

// =============================================================================
// SYSTEMS
// =============================================================================

fn quality_for_key(keyboard: &ButtonInput<KeyCode>) -> Option<Option<Quality>> {
    if keyboard.just_pressed(KeyCode::Digit1) {
        Some(Some(Quality::Low))
    } else if keyboard.just_pressed(KeyCode::Digit2) {
        Some(Some(Quality::Med))
    } else if keyboard.just_pressed(KeyCode::Digit3) {
        Some(Some(Quality::High))
    } else if keyboard.just_pressed(KeyCode::Digit0) {
        Some(None)
    } else {
        None
    }
}

pub fn select_quality(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut settings: ResMut<ViewerSettings>,
    mut rebuild: ResMut<RebuildRequested>,
) {
    let Some(quality) = quality_for_key(&keyboard) else {
        return;
    };
    if settings.quality != quality {
        settings.quality = quality;
        rebuild.0 = true;
        match quality {
            Some(q) => info!("Quality override: {q:?}"),
            None => info!("Quality override cleared"),
        }
    }
}

/// Randomizer: every creature keeps its shape and colors but gets a fresh seed.
pub fn randomize_seeds(
    keyboard: Res<ButtonInput<KeyCode>>,
    roster: Option<ResMut<Roster>>,
    mut rebuild: ResMut<RebuildRequested>,
) {
    if !keyboard.just_pressed(KeyCode::KeyR) {
        return;
    }
    let Some(mut roster) = roster else { return };
    for spec in roster.iter_mut() {
        spec.seed = rand::random();
    }
    rebuild.0 = true;
    info!("Re-rolled seeds for {} creatures", roster.len());
}

/// Toggle band gizmos with F3
pub fn toggle_debug_bands(keyboard: Res<ButtonInput<KeyCode>>, mut settings: ResMut<ViewerSettings>) {
    if keyboard.just_pressed(KeyCode::F3) {
        settings.debug_bands = !settings.debug_bands;
        info!("Band debug: {}", if settings.debug_bands { "ON" } else { "OFF" });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> App {
        let mut app = App::new();
        app.init_resource::<ButtonInput<KeyCode>>();
        app.add_plugins(ViewerInputPlugin);
        app.insert_resource(Roster::builtin());
        app
    }

    fn press(app: &mut App, key: KeyCode) {
        let mut input = app.world_mut().resource_mut::<ButtonInput<KeyCode>>();
        input.release_all();
        input.clear();
        input.press(key);
        app.update();
    }

    #[test]
    fn test_quality_keys() {
        let mut app = app();
        press(&mut app, KeyCode::Digit1);
        assert_eq!(app.world().resource::<ViewerSettings>().quality, Some(Quality::Low));
        assert!(app.world().resource::<RebuildRequested>().0);

        press(&mut app, KeyCode::Digit0);
        assert_eq!(app.world().resource::<ViewerSettings>().quality, None);
    }

    #[test]
    fn test_f3_toggles_bands() {
        let mut app = app();
        press(&mut app, KeyCode::F3);
        assert!(app.world().resource::<ViewerSettings>().debug_bands);
        press(&mut app, KeyCode::F3);
        assert!(!app.world().resource::<ViewerSettings>().debug_bands);
    }

    #[test]
    fn test_randomize_changes_seeds() {
        let mut app = app();
        let before: Vec<u32> = app.world().resource::<Roster>().iter().map(|s| s.seed).collect();
        press(&mut app, KeyCode::KeyR);
        let after: Vec<u32> = app.world().resource::<Roster>().iter().map(|s| s.seed).collect();
        assert_eq!(before.len(), after.len());
        assert_ne!(before, after);
        assert!(app.world().resource::<RebuildRequested>().0);
    }
}
