use std::collections::{BTreeSet, HashMap};

use crate::sequencing::note::NoteId;
use crate::sequencing::pitch::BoardPosition;
use crate::synth::voice::VoiceHandle;

/// What a keyed voice is sounding for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VoiceKey {
    /// A key held down on the board.
    Board(BoardPosition),
    /// A recorded note started by the scheduler.
    Note(NoteId),
    /// A metronome click, by voice id.
    Click(u64),
}

/// Every live voice, plus which key each keyed voice belongs to.
///
/// Live key presses and scheduled notes both register here, so `drain`
/// (the panic path) sees every voice no matter who started it.
#[derive(Debug, Default)]
pub struct VoiceRegistry {
    live: BTreeSet<VoiceHandle>,
    keys: HashMap<VoiceKey, VoiceHandle>,
}

impl VoiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track `handle`, optionally under `key`.
    ///
    /// Returns the handle previously under `key`; the caller should stop it.
    pub fn register(&mut self, handle: VoiceHandle, key: Option<VoiceKey>) -> Option<VoiceHandle> {
        self.live.insert(handle);
        key.and_then(|k| self.keys.insert(k, handle))
            .filter(|&previous| previous != handle)
    }

    pub fn handle_for(&self, key: VoiceKey) -> Option<VoiceHandle> {
        self.keys.get(&key).copied()
    }

    /// Detach the voice from `key`. It stays live until unregistered.
    pub fn release_key(&mut self, key: VoiceKey) -> Option<VoiceHandle> {
        self.keys.remove(&key)
    }

    /// Forget a disposed voice.
    pub fn unregister(&mut self, handle: VoiceHandle) {
        self.live.remove(&handle);
        self.keys.retain(|_, h| *h != handle);
    }

    /// Keys currently holding a voice that match `filter`.
    pub fn keys_where(&self, filter: impl Fn(&VoiceKey) -> bool) -> Vec<(VoiceKey, VoiceHandle)> {
        self.keys
            .iter()
            .filter(|(k, _)| filter(k))
            .map(|(k, h)| (*k, *h))
            .collect()
    }

    /// Empty the registry, returning every live handle.
    pub fn drain(&mut self) -> Vec<VoiceHandle> {
        self.keys.clear();
        std::mem::take(&mut self.live).into_iter().collect()
    }

    pub fn contains(&self, handle: VoiceHandle) -> bool {
        self.live.contains(&handle)
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }
}
