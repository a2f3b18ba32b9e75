//! Pachinko entry point
//!
//! Handles platform-specific initialization and plays one headless demo
//! round: draw maluses, buy credits if budget mode is on, drop the balls and
//! report the result.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

use pachinko::consts::{FIELD_WIDTH, SIM_DT};
use pachinko::fx::{FxCommand, Presentation};
use pachinko::game::{GamePhase, GameSummary, TickInput};
use pachinko::{GameConfig, Services, platform};

/// Balls dropped in a round without budget mode
const DEMO_BALLS: u32 = 10;
/// Ticks between launches
const LAUNCH_INTERVAL: u32 = 90;
/// Hard stop for a demo round (about five minutes of game time)
const MAX_TICKS: u32 = 60 * 60 * 5;

/// Writes presentation commands to the log instead of a screen
struct LogPresentation;

impl Presentation for LogPresentation {
    fn dispatch(&mut self, command: FxCommand) {
        match command {
            FxCommand::Banner { text_key, detail } => log::info!("[banner] {} {}", text_key, detail),
            FxCommand::PlaySound { key, volume } => log::debug!("[sound] {} @ {:.2}", key, volume),
            other => log::trace!("[fx] {:?}", other),
        }
    }
}

/// Play one round to the end
fn play_demo_round(services: &Services, seed: u64) -> GameSummary {
    let mut game = services.new_game(GameConfig {
        seed,
        ..GameConfig::default()
    });
    let malus = game.start_with_random_maluses();
    for entry in malus.selected_maluses() {
        log::info!("Malus: {} (+{}%)", entry.id, entry.bonus_percent);
    }

    let mut to_launch = DEMO_BALLS;
    if let Some(ledger) = game.budget() {
        let bet = ledger.currency_balance() / 2;
        match game.place_bet(bet) {
            Ok(credits) => to_launch = credits,
            Err(e) => log::warn!("Bet refused: {}", e),
        }
    }

    let mut launched = 0;
    for tick in 0..MAX_TICKS {
        let mut input = TickInput::default();
        if launched < to_launch && tick % LAUNCH_INTERVAL == 0 {
            let x = 100.0 + (launched as f32 * 137.0) % (FIELD_WIDTH - 200.0);
            input.cursor_x = Some(x);
            input.launch = true;
            launched += 1;
        }
        game.tick(&input, SIM_DT);

        if game.phase() == GamePhase::GameOver {
            break;
        }
        if launched == to_launch && game.active_balls() == 0 {
            break;
        }
        if tick % 600 == 0 && game.recover_stuck_balls() > 0 {
            log::warn!("Recovered stuck ball(s)");
        }
    }

    game.finish()
}

fn report(services: &Services, summary: &GameSummary) {
    match services.submit_score(summary) {
        Some(rank) => log::info!("New high score, rank #{}", rank),
        None => log::info!("No high score this time"),
    }
    match serde_json::to_string_pretty(summary) {
        Ok(json) => log::info!("Round summary:\n{}", json),
        Err(e) => log::warn!("Could not format summary: {}", e),
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    console_error_panic_hook::set_once();
    if let Err(e) = console_log::init_with_level(log::Level::Info) {
        web_sys::console::warn_1(&format!("Logger init failed: {}", e).into());
    }

    log::info!("Pachinko starting...");
    let seed = platform::now_ms() as u64;
    let services = Services::new(
        platform::default_store(),
        Box::new(LogPresentation),
        seed,
        platform::today(),
    );
    let summary = play_demo_round(&services, seed);
    report(&services, &summary);
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Pachinko (native) starting...");

    let seed = std::env::var("PACHINKO_SEED")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| platform::now_ms() as u64);
    log::info!("Seed {}", seed);

    let services = Services::new(
        platform::default_store(),
        Box::new(LogPresentation),
        seed,
        platform::today(),
    );
    let summary = play_demo_round(&services, seed);
    report(&services, &summary);

    let stats = services.persistence.get_stats();
    println!(
        "Score {} (best combo {}, {} ball(s), x{:.2}) | lifetime: {} game(s), best {}",
        summary.score,
        summary.max_combo,
        summary.balls_launched,
        summary.malus_multiplier,
        stats.games_played,
        stats.best_score
    );
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
