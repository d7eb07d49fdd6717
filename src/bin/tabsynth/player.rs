//! Player - drives the engine against the offline host

use color_eyre::eyre::{Result as EyreResult, WrapErr};

use tabsynth::{
    engine::{AudioEngine, OfflineHost, RenderStats},
    EngineConfig, MAX_BLOCK_SIZE,
};

/// Plays one sequence file start to finish, as fast as it renders
pub struct Player {
    config: EngineConfig,
    sequence: String,
}

impl Player {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            sequence: String::new(),
        }
    }

    /// Set the interchange JSON to play
    pub fn sequence(mut self, json: String) -> Self {
        self.sequence = json;
        self
    }

    pub fn run(self) -> EyreResult<()> {
        let sample_rate = self.config.sample_rate;
        let mut engine = AudioEngine::new(self.config);
        engine
            .initialize(&mut OfflineHost::new(sample_rate))
            .wrap_err("failed to open offline host")?;
        engine
            .load_sequence(&self.sequence)
            .wrap_err("failed to load sequence")?;

        let song = engine.sequence();
        println!("=== tabsynth ===");
        println!("BPM: {}", song.tempo.bpm());
        println!("Notes: {}", song.notes().len());
        println!("Length: {:.2}s", song.length_secs());
        println!("Sample rate: {} Hz", sample_rate);
        println!();

        // One poll per poll interval of rendered audio
        let poll_frames = (engine.config().poll_interval().as_secs_f64() * sample_rate as f64)
            .round()
            .max(1.0) as usize;
        let mut block = vec![0.0f32; MAX_BLOCK_SIZE];
        let mut stats = RenderStats::default();

        engine.start_playback().wrap_err("failed to start playback")?;
        engine.poll();
        let mut last_bar = 0;
        while engine.transport().is_playing() {
            let mut remaining = poll_frames;
            while remaining > 0 {
                let frames = remaining.min(MAX_BLOCK_SIZE);
                engine.render(&mut block[..frames]);
                stats.accumulate(&block[..frames]);
                remaining -= frames;
            }
            engine.poll();

            if let Some(position) = engine.frame() {
                if position.bar != last_bar {
                    last_bar = position.bar;
                    println!("  bar {} ({:.2}s)", position.bar, position.seconds);
                }
            }
        }

        // Let release tails finish
        let tail_end = engine.now() + 1.0;
        while engine.now() < tail_end && engine.live_voice_count() > 0 {
            engine.render(&mut block[..poll_frames.min(MAX_BLOCK_SIZE)]);
            stats.accumulate(&block[..poll_frames.min(MAX_BLOCK_SIZE)]);
            engine.poll();
        }
        engine.shutdown();

        println!();
        println!(
            "Rendered {} frames ({:.2}s)",
            stats.frames,
            stats.frames as f64 / sample_rate as f64
        );
        println!("Peak: {:.3}  RMS: {:.3}", stats.peak, stats.rms);
        Ok(())
    }
}
