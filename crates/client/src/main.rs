mod bot;
mod relay;

use anyhow::Result;
use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use rumble::{MatchConfig, MatchCoordinator, Presence, RoundPhase};

use bot::Bot;
use relay::LoopbackHub;

#[derive(Parser)]
#[command(name = "client")]
#[command(about = "Headless rumble client driver: runs a full match over a loopback relay")]
struct Args {
    #[arg(short, long, default_value_t = 3, help = "Number of clients (2-4)")]
    players: usize,

    #[arg(short, long, default_value_t = 3, help = "Rounds to play before exiting")]
    rounds: u32,

    #[arg(short, long, default_value_t = 60)]
    tick_rate: u32,

    #[arg(short, long, default_value_t = 7)]
    seed: u64,
}

struct Client {
    presence: Presence,
    coordinator: MatchCoordinator,
    bot: Bot,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    anyhow::ensure!(
        (2..=4).contains(&args.players),
        "player count must be between 2 and 4"
    );
    anyhow::ensure!(args.tick_rate > 0, "tick rate must be positive");

    let presences: Vec<Presence> = (1..=args.players)
        .map(|i| Presence::new(format!("session-{i}"), format!("player-{i}")))
        .collect();

    let mut hub = LoopbackHub::new();
    let mut handles = Vec::new();
    let mut clients = Vec::new();

    for (i, presence) in presences.iter().enumerate() {
        let config = MatchConfig {
            seed: args.seed.wrapping_add(i as u64),
            ..Default::default()
        };
        let mut coordinator = MatchCoordinator::new(config);
        coordinator.set_display_name(&presence.username);

        handles.push(hub.register(presence.clone(), coordinator.inbound_queue()));
        coordinator.handle_match_joined("loopback-match", presence.clone(), &presences);

        clients.push(Client {
            presence: presence.clone(),
            coordinator,
            bot: Bot::new(args.seed.wrapping_add(1000 + i as u64)),
        });
    }

    log::info!(
        "match started: {} players at {} Hz, playing {} rounds",
        args.players,
        args.tick_rate,
        args.rounds
    );

    let dt = 1.0 / args.tick_rate as f32;
    // On average one hit lands somewhere every two seconds.
    let hit_chance = (dt as f64 * 0.5).min(1.0);
    let mut combat_rng = StdRng::seed_from_u64(args.seed.wrapping_mul(31));

    let mut rounds_completed = 0;
    let mut last_banner: Option<String> = None;
    let max_ticks = args.rounds as u64 * 120 * args.tick_rate as u64;

    for tick in 0..max_ticks {
        if rounds_completed >= args.rounds {
            break;
        }

        for client in &mut clients {
            let input = client.bot.next_input(dt);
            client.coordinator.set_local_input(input);
        }

        // Stand-in for the combat simulation: at most one player catches a
        // projectile per tick. The hit lands on the victim's own client,
        // the only place local health is authoritative.
        if combat_rng.gen_bool(hit_chance) {
            let victim = combat_rng.gen_range(0..clients.len());
            let client = &mut clients[victim];
            if client.coordinator.phase() == RoundPhase::InRound
                && client.coordinator.roster().live_count() > 1
            {
                if let Some(entity) = client.coordinator.local_entity_mut() {
                    if !entity.is_dying() {
                        entity.take_damage(1);
                    }
                }
            }
        }

        for client in &mut clients {
            client.coordinator.tick(dt);
            let outbound = client.coordinator.drain_outbound();
            hub.broadcast(&client.presence, &outbound);
        }

        // Watch the first client's banner to count finished rounds.
        let banner = clients[0].coordinator.winner_banner().map(String::from);
        if banner.is_some() && banner != last_banner {
            rounds_completed += 1;
            log::info!(
                "round {rounds_completed} done at tick {tick}: {}",
                banner.as_deref().unwrap_or_default()
            );
        }
        last_banner = banner;
    }

    if rounds_completed < args.rounds {
        log::warn!("stopping after {rounds_completed} rounds (tick limit reached)");
    }

    for client in &mut clients {
        let dropped = client.coordinator.inbound_queue().dropped();
        if dropped > 0 {
            log::warn!("{} shed {dropped} inbound messages", client.presence.session_id);
        }
        client.coordinator.quit_match();
    }

    drop(hub);
    for handle in handles {
        let _ = handle.join();
    }

    log::info!("match finished: {rounds_completed} rounds played");
    Ok(())
}
