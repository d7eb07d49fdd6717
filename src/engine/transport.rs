/// Where the transport is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportState {
    #[default]
    Stopped,
    /// Song time follows the audio clock. Recording only exists here.
    Playing { recording: bool },
    /// Song time moves only when stepped, one beat at a time.
    Stepping { beat: u64 },
}

/// Play/record/step state and the clock-to-song-time binding.
///
/// While playing, `song_time = now - anchor`. While stopped, the song time is
/// the cue point, which is where the next `start` begins.
#[derive(Debug, Clone, Default)]
pub struct Transport {
    state: TransportState,
    anchor: f64,
    cue: f64,
}

impl Transport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start playing from the cue point. Returns the new anchor.
    pub fn start(&mut self, now: f64) -> f64 {
        self.anchor = now - self.cue;
        self.state = TransportState::Playing { recording: false };
        self.anchor
    }

    /// Stop and rewind to song time zero.
    pub fn stop(&mut self) {
        self.state = TransportState::Stopped;
        self.cue = 0.0;
    }

    pub fn song_time(&self, now: f64) -> f64 {
        match self.state {
            TransportState::Playing { .. } => (now - self.anchor).max(0.0),
            _ => self.cue,
        }
    }

    /// Make clock time `now` correspond to `song_time`.
    pub fn rebind(&mut self, now: f64, song_time: f64) {
        let song_time = song_time.max(0.0);
        match self.state {
            TransportState::Playing { .. } => self.anchor = now - song_time,
            _ => self.cue = song_time,
        }
    }

    /// Set the recording flag. Refused unless playing.
    pub fn set_recording(&mut self, recording: bool) -> bool {
        match &mut self.state {
            TransportState::Playing { recording: flag } => {
                *flag = recording;
                true
            }
            _ => !recording,
        }
    }

    pub fn enter_step(&mut self, beat: u64) {
        self.state = TransportState::Stepping { beat };
    }

    /// Move one beat on. Returns the beat that was current before the step.
    pub fn advance_step(&mut self) -> Option<u64> {
        match &mut self.state {
            TransportState::Stepping { beat } => {
                let current = *beat;
                *beat += 1;
                Some(current)
            }
            _ => None,
        }
    }

    /// Leave step mode, cueing at `song_time`.
    pub fn exit_step(&mut self, song_time: f64) {
        if self.is_stepping() {
            self.state = TransportState::Stopped;
            self.cue = song_time.max(0.0);
        }
    }

    pub fn is_playing(&self) -> bool {
        matches!(self.state, TransportState::Playing { .. })
    }

    pub fn is_recording(&self) -> bool {
        matches!(self.state, TransportState::Playing { recording: true })
    }

    pub fn is_stepping(&self) -> bool {
        matches!(self.state, TransportState::Stepping { .. })
    }

    pub fn anchor(&self) -> f64 {
        self.anchor
    }

    pub fn state(&self) -> TransportState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn play_stop_rewinds() {
        let mut transport = Transport::new();
        transport.start(2.0);
        assert!(transport.is_playing());
        assert!((transport.song_time(3.5) - 1.5).abs() < 1e-12);

        transport.stop();
        assert_eq!(transport.song_time(10.0), 0.0);
        assert_eq!(transport.state(), TransportState::Stopped);
    }

    #[test]
    fn rebind_while_playing_moves_anchor() {
        let mut transport = Transport::new();
        transport.start(1.0);
        transport.rebind(4.0, 10.0);
        assert_eq!(transport.anchor(), -6.0);
        assert!((transport.song_time(4.5) - 10.5).abs() < 1e-12);
    }

    #[test]
    fn rebind_while_stopped_sets_cue() {
        let mut transport = Transport::new();
        transport.rebind(4.0, 3.0);
        assert_eq!(transport.song_time(100.0), 3.0);
        transport.start(10.0);
        assert_eq!(transport.anchor(), 7.0);
    }

    #[test]
    fn recording_requires_playback() {
        let mut transport = Transport::new();
        assert!(!transport.set_recording(true));
        assert!(!transport.is_recording());

        transport.start(0.0);
        assert!(transport.set_recording(true));
        assert!(transport.is_recording());
        transport.stop();
        assert!(!transport.is_recording());
    }

    #[test]
    fn step_mode_counts_beats() {
        let mut transport = Transport::new();
        assert_eq!(transport.advance_step(), None);

        transport.enter_step(2);
        assert_eq!(transport.advance_step(), Some(2));
        assert_eq!(transport.advance_step(), Some(3));
        assert_eq!(transport.state(), TransportState::Stepping { beat: 4 });

        transport.exit_step(2.0);
        assert_eq!(transport.song_time(0.0), 2.0);
    }
}
