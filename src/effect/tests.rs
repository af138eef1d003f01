// SPDX-License-Identifier: MPL-2.0

use rand::SeedableRng;
use rand::rngs::StdRng;
use slideshow_saver_config::{
    Canvas, Config, GridSwitchConfig, Mode, RecycleConfig, StarWarsConfig, TableDropConfig,
};

use super::*;
use crate::animation::EffectKind;
use crate::asset::AssetRef;
use crate::surface::recording::{Command, RecordingSurface};

fn context() -> EffectContext {
    EffectContext::new(
        Canvas::default(),
        RecycleConfig {
            wait_ms: 5,
            speedup: 4,
        },
    )
}

fn asset(id: &str) -> ReadyAsset {
    ReadyAsset::unchanged(AssetRef::new(id))
}

#[test]
fn recycle_mode_overrides_and_restores() {
    let context = context();
    assert_eq!(context.pacing(1000), Duration::from_millis(1000));
    assert_eq!(context.effect_ms(800), 800);

    {
        let _outer = RecycleMode::enter(&context);
        assert!(context.is_recycling());
        assert_eq!(context.pacing(1000), Duration::from_millis(5));
        assert_eq!(context.effect_ms(800), 200);

        {
            let _inner = RecycleMode::enter(&context);
        }
        assert!(context.is_recycling(), "inner guard must restore the outer burst");
    }

    assert!(!context.is_recycling());
    assert_eq!(context.pacing(1000), Duration::from_millis(1000));
}

#[test]
fn recycle_mode_restored_on_unwind() {
    let context = context();
    let shared = context.clone();
    let result = std::panic::catch_unwind(move || {
        let _burst = RecycleMode::enter(&shared);
        panic!("burst interrupted");
    });

    assert!(result.is_err());
    assert!(!context.is_recycling());
}

#[test]
fn redraw_cadence() {
    let redraw = Redraw {
        renders: 4,
        every: 2,
    };
    assert!(!redraw.is_due(0));
    assert!(!redraw.is_due(7));
    assert!(redraw.is_due(8));

    let no_slots = Redraw {
        renders: 0,
        every: 2,
    };
    let never = Redraw {
        renders: 4,
        every: 0,
    };
    for renders in [0, 1, 100, usize::MAX] {
        assert!(!no_slots.is_due(renders));
        assert!(!never.is_due(renders));
    }
}

#[test]
fn slot_ring_cycles() {
    let mut ring = SlotRing::default();
    assert_eq!(ring.advance(), None);

    let mut ring = SlotRing::new(vec![SlotId(1), SlotId(2)]);
    let drawn: Vec<_> = (0..5).filter_map(|_| ring.advance()).collect();
    assert_eq!(drawn, [SlotId(1), SlotId(2), SlotId(1), SlotId(2), SlotId(1)]);
}

#[test]
fn random_mode_is_resolved_once() {
    let mut rng = StdRng::seed_from_u64(17);
    for _ in 0..50 {
        let mode = resolve_mode(Mode::Random, &mut rng);
        assert_ne!(mode, Mode::Random);
    }
    assert_eq!(resolve_mode(Mode::GridSwitch, &mut rng), Mode::GridSwitch);

    let effect = build(Mode::Random, &Config::default(), &mut rng);
    assert!(Mode::CONCRETE.contains(&effect.mode()));
}

#[test]
fn random_mode_builds_every_concrete_mode() {
    let config = Config::default();
    let mut rng = StdRng::seed_from_u64(23);
    let mut built = std::collections::HashSet::new();
    for _ in 0..200 {
        built.insert(build(Mode::Random, &config, &mut rng).mode());
    }
    assert_eq!(built.len(), Mode::CONCRETE.len());
}

#[test]
fn registry_builds_every_mode() {
    let mut rng = StdRng::seed_from_u64(0);
    for mode in Mode::CONCRETE {
        let effect = build(mode, &Config::default(), &mut rng);
        assert_eq!(effect.mode(), mode);
        assert!(effect.slots().is_empty(), "slots are created at setup");
    }
}

#[test]
fn table_drop_command_sequence() {
    let mut surface = RecordingSurface::default();
    let context = context();
    let mut effect = TableDrop::new(&TableDropConfig::default(), StdRng::seed_from_u64(1));
    effect.setup(&mut surface, &context);
    assert_eq!(effect.slots().len(), 20);
    assert_eq!(effect.background(), "table.jpg");

    surface.clear();
    effect.render(&mut surface, &context, &asset("/p/a.jpg"));
    let commands = surface.commands();
    let slot = effect.slots()[0];

    assert_eq!(commands[0], Command::Visible(slot, false));
    assert_eq!(commands[1], Command::Image(slot, String::new()));
    assert_eq!(commands[2], Command::Restack(slot));
    assert_eq!(commands[3], Command::Image(slot, "/p/a.jpg".into()));
    assert!(matches!(commands[4], Command::Position(s, _, _) if s == slot));
    let Command::Size(_, width, height) = commands[5] else {
        panic!("expected size, got {:?}", commands[5]);
    };
    assert!((500..=700).contains(&width));
    assert!((height - width * 9 / 16).abs() <= 1);
    assert_eq!(commands[7], Command::Visible(slot, true));

    let Command::Animation(_, animations) = &commands[6] else {
        panic!("expected animations, got {:?}", commands[6]);
    };
    let kinds: Vec<_> = animations.iter().map(|a| a.effect.kind).collect();
    assert_eq!(kinds, [EffectKind::Fade, EffectKind::Rotate, EffectKind::Zoom]);
    assert_eq!(animations[0].effect.duration_ms, 200);
    let crate::animation::Value::Scalar(drop_height) = animations[2].effect.start else {
        panic!("zoom start must be scalar");
    };
    assert!((400.0..=800.0).contains(&drop_height));
    assert_eq!(animations[2].effect.duration_ms, drop_height as u64 * 3 / 2);
}

#[test]
fn table_drop_stays_on_canvas() {
    let mut surface = RecordingSurface::default();
    let context = context();
    let mut effect = TableDrop::new(&TableDropConfig::default(), StdRng::seed_from_u64(2));
    effect.setup(&mut surface, &context);

    for i in 0..100 {
        effect.render(&mut surface, &context, &asset(&format!("{i}.jpg")));
    }

    let commands = surface.commands();
    for pair in commands.windows(2) {
        if let [Command::Position(_, x, y), Command::Size(_, w, h)] = pair {
            assert!(*x >= 0 && x + w <= 1280);
            assert!(*y >= 0 && y + h <= 720);
        }
    }
}

#[test]
fn star_wars_is_continuous() {
    let mut surface = RecordingSurface::default();
    let context = context();
    let mut effect = StarWars::new(&StarWarsConfig::default());
    assert!(effect.continuous());
    effect.setup(&mut surface, &context);
    effect.render(&mut surface, &context, &asset("a.jpg"));

    let slot = effect.slots()[0];
    let animations = surface.animations_of(slot);
    assert_eq!(
        animations[0].to_string(),
        "conditional: effect=rotatex start=0 end=50 time=0 center=auto condition=true"
    );
    assert_eq!(
        animations[1].effect.to_string(),
        "effect=slide start=0,1100 end=0,-1100 time=10400 tween=linear center=auto"
    );
    assert!(surface.commands().contains(&Command::Position(slot, 0, 510)));
}

#[test]
fn random_zoom_centers_on_screen() {
    let mut surface = RecordingSurface::default();
    let context = context();
    let mut effect = RandomZoomIn::new(
        &slideshow_saver_config::RandomZoomConfig::default(),
        StdRng::seed_from_u64(8),
    );
    effect.setup(&mut surface, &context);
    effect.render(&mut surface, &context, &asset("a.jpg"));

    let zoom = &surface.animations_of(effect.slots()[0])[0].effect;
    assert_eq!(zoom.kind, EffectKind::Zoom);
    assert_eq!(zoom.duration_ms, 5000);
    let Some(crate::animation::Center::Point(x, y)) = zoom.center else {
        panic!("zoom needs an explicit center");
    };
    assert!((0.0..=1280.0).contains(&x) && (0.0..=720.0).contains(&y));
}

#[test]
fn grid_switch_fills_then_cross_fades() {
    let config = GridSwitchConfig {
        rows_columns: 2,
        effect_ms: 0,
        ..GridSwitchConfig::default()
    };
    let mut surface = RecordingSurface::default();
    let context = context();
    let mut effect = GridSwitch::new(&config, StdRng::seed_from_u64(3));
    effect.setup(&mut surface, &context);
    assert_eq!(effect.fast_image_count(), 4);

    let positions: Vec<_> = surface
        .commands()
        .into_iter()
        .filter_map(|command| match command {
            Command::Position(_, x, y) => Some((x, y)),
            _ => None,
        })
        .collect();
    assert_eq!(positions, [(0, 0), (640, 0), (0, 360), (640, 360)]);

    // priming: fade in only
    {
        let _burst = RecycleMode::enter(&context);
        surface.clear();
        effect.render(&mut surface, &context, &asset("a.jpg"));
        let fades: Vec<_> = surface
            .commands()
            .into_iter()
            .filter_map(|command| match command {
                Command::Animation(_, animations) => Some(animations[0].effect.to_string()),
                _ => None,
            })
            .collect();
        assert_eq!(fades, ["effect=fade start=0 end=100 time=0"]);
    }

    // steady: fade out, swap, fade in
    surface.clear();
    effect.render(&mut surface, &context, &asset("b.jpg"));
    let commands = surface.commands();
    assert_eq!(commands.len(), 3);
    assert!(matches!(&commands[1], Command::Image(_, content) if content == "b.jpg"));
}

#[test]
fn grid_redraw_fades_every_cell() {
    let config = GridSwitchConfig {
        rows_columns: 3,
        effect_ms: 0,
        redraw_every: 2,
        ..GridSwitchConfig::default()
    };
    let mut surface = RecordingSurface::default();
    let context = context();
    let mut effect = GridSwitch::new(&config, StdRng::seed_from_u64(4));
    effect.setup(&mut surface, &context);
    surface.clear();

    effect.begin_redraw(&mut surface, &context);
    assert_eq!(surface.commands().len(), 9);
    assert_eq!(
        effect.redraw(),
        Some(Redraw {
            renders: 9,
            every: 2
        })
    );
}

#[test]
fn teardown_removes_slots_once_set_up() {
    let mut surface = RecordingSurface::default();
    let context = context();
    let mut effect = StarWars::new(&StarWarsConfig::default());

    effect.teardown(&mut surface);
    assert!(surface.commands().is_empty());

    effect.setup(&mut surface, &context);
    effect.teardown(&mut surface);
    assert!(surface.live_slots().is_empty());
}
