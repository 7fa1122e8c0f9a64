//! Minimal status readout: camera mode and speed multiplier. The real page UI
//! lives outside the core; this is the display side of the camera-mode text
//! the core exposes.

use bevy::prelude::*;

use crate::gameplay::state::{RaceState, SpeedMultiplier};
use crate::rendering::camera::CameraFollow;

#[derive(Component)]
struct StatusText;

pub struct HudPlugin;

impl Plugin for HudPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, setup_hud)
            .add_systems(Update, refresh_hud);
    }
}

fn setup_hud(mut commands: Commands) {
    commands.spawn((
        Text::new("press space to start"),
        TextFont {
            font_size: 16.0,
            ..default()
        },
        TextColor(Color::srgba(1.0, 1.0, 1.0, 0.8)),
        Node {
            position_type: PositionType::Absolute,
            top: Val::Px(8.0),
            left: Val::Px(8.0),
            ..default()
        },
        StatusText,
    ));
}

fn refresh_hud(
    race: Res<RaceState>,
    speed: Res<SpeedMultiplier>,
    follow: Res<CameraFollow>,
    mut texts: Query<&mut Text, With<StatusText>>,
) {
    if !race.is_changed() && !speed.is_changed() && !follow.is_changed() {
        return;
    }
    let Ok(mut text) = texts.single_mut() else { return };
    if !race.started {
        text.0 = "press space to start".into();
    } else {
        text.0 = format!("camera: {}  speed: {:.1}x", follow.mode.label(), speed.0);
    }
}
