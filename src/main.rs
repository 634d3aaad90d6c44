use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use ec_worldgen_city::CityGenerator;
use ec_worldgen_core::ChunkGenerator;

mod assets;
mod camera;
mod config;
mod panic;
mod world;

use self::camera::FlightPath;
use self::config::Config;
use self::world::{ArenaScene, StreamingController};

/// Flies the viewpoint along its path and streams the city around it.
fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| config::CONFIG_PATH.to_owned());
    let config = Config::load(&config_path)?;

    // The pool must be fully loaded before the first update.
    let prototypes = assets::load_prototypes(&config.prototypes)?;

    let seed = config.seed.unwrap_or_else(ec_rng::entropy);
    let generator = Arc::new(CityGenerator::new(seed, prototypes, config.layout.clone()));

    let mut info = String::new();
    generator.debug_info(&mut info);
    ec_log::info!("{info}");

    let mut controller =
        StreamingController::<ArenaScene>::new(config.streaming.clone(), generator);
    let mut scene = ArenaScene::new();
    let mut path = FlightPath::new(&config.flight);
    let dt = 1.0 / config.tick_rate;

    let mut total = Duration::ZERO;
    let mut slowest = Duration::ZERO;

    for tick in 0..config.ticks {
        let viewpoint = if tick == 0 {
            path.position()
        } else {
            path.advance(dt)
        };

        let start = quanta::Instant::now();
        let changes = controller.update(viewpoint, &mut scene)?;
        let elapsed = start.elapsed();
        total += elapsed;
        slowest = slowest.max(elapsed);

        if !changes.is_empty() {
            ec_log::trace!(
                "tick {tick}: {changes:?} around {:?}, {} nodes, {} elements, took {elapsed:?}",
                controller.center(),
                scene.node_count(),
                scene.element_count(),
            );
        }

        profiling::finish_frame!();
    }

    let stats = controller.stats();
    ec_log::info!(
        "{} ticks in {total:?} (slowest {slowest:?})",
        config.ticks
    );
    ec_log::info!(
        "generated {}, prefetched {}, restored {}, cached {} in {} flushes, evicted {}",
        stats.generated,
        stats.prefetched,
        stats.restored,
        stats.cached,
        stats.flushes,
        stats.evicted,
    );
    ec_log::info!(
        "{} chunks attached ({} elements), {} pending, {}/{} cached",
        controller.visibility().len(),
        scene.element_count(),
        controller.visibility().pending_len(),
        controller.cache().len(),
        controller.cache().capacity(),
    );
    if let Some(prefetcher) = controller.prefetcher() {
        ec_log::info!(
            "{} chunks prefetched ahead, {} still generating",
            prefetcher.ready_len(),
            prefetcher.requested_len(),
        );
    }

    Ok(())
}

fn main() -> ExitCode {
    ec_log::init_from_env();
    panic::install_custom_panic_hook();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            ec_log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}
