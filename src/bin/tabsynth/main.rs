//! tabsynth - offline sequence player
//!
//! Run with: cargo run -- <sequence.json> [engine-config.json]

mod player;

use color_eyre::eyre::{eyre, WrapErr};
use player::Player;
use tabsynth::EngineConfig;

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let sequence_path = args
        .next()
        .ok_or_else(|| eyre!("usage: tabsynth <sequence.json> [engine-config.json]"))?;

    let config = match args.next() {
        Some(path) => {
            let json = std::fs::read_to_string(&path)
                .wrap_err_with(|| format!("failed to read config {path}"))?;
            EngineConfig::from_json(&json).wrap_err_with(|| format!("invalid config {path}"))?
        }
        None => EngineConfig::default(),
    };

    let sequence = std::fs::read_to_string(&sequence_path)
        .wrap_err_with(|| format!("failed to read sequence {sequence_path}"))?;

    Player::new(config).sequence(sequence).run()
}
