//! Headless run of a small scene: an animated coin, a particle fountain and
//! a timer component that spawns and destroys entities through the command
//! buffer. Prints the game events and draw counts of each frame.
//!
//! ```sh
//! RUST_LOG=debug cargo run -p sprig-engine --example headless_demo
//! ```

use anyhow::Context;
use sprig_engine::animator::{ANIMATION_ENDED, ANIMATION_FRAME_EVENT};
use sprig_engine::content::ContentLoader;
use sprig_engine::prelude::*;

/// Spawns a short-lived spark every `interval` seconds and destroys itself
/// after `limit` spawns.
struct SparkTimer {
    interval: f32,
    elapsed: f32,
    spawned: u32,
    limit: u32,
}

impl Component for SparkTimer {
    fn update(&mut self, ctx: &mut ComponentContext<'_>) {
        self.elapsed += ctx.delta();
        if self.elapsed < self.interval {
            return;
        }
        self.elapsed = 0.0;
        self.spawned += 1;
        let at = ctx.transform.position + Vec2::new(self.spawned as f32 * 4.0, 0.0);
        ctx.commands
            .spawn(EntityBuilder::new(format!("spark-{}", self.spawned)).at(at).with_tag("spark"));
        ctx.emit("spark", vec![self.spawned.to_string()]);
        if self.spawned >= self.limit {
            ctx.destroy_entity();
        }
    }
}

fn main() -> Result<(), anyhow::Error> {
    let config = EngineConfig::from_json_str(
        r#"{ "headless": true, "fixed_dt": 0.05, "rng_seed": 2024, "log_filter": "sprig_engine=info,warn" }"#,
    )
    .context("demo config")?;
    sprig_engine::logging::init(&config.log_filter);

    let mut content = ContentRegistry::new();
    content.register_texture("coin", Vec2::new(64.0, 16.0))?;
    content.register_texture("spark", Vec2::new(2.0, 2.0))?;
    let coin_texture = content.load_texture("coin")?;
    let spark_texture = content.load_texture("spark")?;

    let sheet = SpriteSheet {
        frames: (0..4)
            .map(|i| SheetFrame {
                source: Rect::new(i as f32 * 16.0, 0.0, 16.0, 16.0),
                duration_ms: 100,
            })
            .collect(),
        tags: vec![FrameTag {
            name: "spin".to_owned(),
            from: 0,
            to: 3,
            direction: AnimationDirection::PingPong,
        }],
    };
    let mut spin = sheet.animation("spin", true)?;
    spin.add_frame_event("shine", 3)?;
    let mut animator = SpriteAnimator::new(coin_texture.handle).with_animation("spin", spin)?;
    animator.play("spin")?;

    let mut engine = Engine::new(config)?;
    let fountain = ParticleEmitter::new(
        ParticleConfig {
            texture: spark_texture.handle,
            rate: 20.0,
            ..Default::default()
        },
        engine.next_seed(),
    )?;

    let scene = engine.scene_mut();
    scene.spawn(
        EntityBuilder::new("coin")
            .at(Vec2::new(100.0, 80.0))
            .with_layer_depth(0.5)
            .with_component(animator),
    )?;
    scene.spawn(
        EntityBuilder::new("fountain")
            .at(Vec2::new(160.0, 120.0))
            .with_component(fountain),
    )?;
    scene.spawn(EntityBuilder::new("spawner").with_component(SparkTimer {
        interval: 0.2,
        elapsed: 0.0,
        spawned: 0,
        limit: 3,
    }))?;

    engine.console_mut().register("sparks", "count spark entities", |_| {
        Ok("sparks are counted by the demo loop".to_owned())
    })?;

    let mut queue = DrawQueue::new();
    for _ in 0..20 {
        engine.run_frames(1);
        let frame = engine.frame_count();

        for event in engine.scene_mut().drain_events() {
            match event.event_type.as_str() {
                ANIMATION_ENDED | ANIMATION_FRAME_EVENT | "spark" => {
                    println!("frame {frame:>2}: {} {:?} from {}", event.event_type, event.details, event.entity);
                }
                _ => {}
            }
        }

        queue.clear();
        engine.draw(&mut queue);
        let diagnostics = engine.diagnostics();
        println!(
            "frame {frame:>2}: {} entities, {} sparks, {} draw requests, {} commands applied",
            diagnostics.entity_count,
            engine.scene().find_by_tag("spark").count(),
            queue.len(),
            diagnostics.commands.success_count,
        );
    }

    println!("{}", engine.console_mut().execute("help")?);
    Ok(())
}
