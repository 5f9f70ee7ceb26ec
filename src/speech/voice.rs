//! Synthesis voice selection.

/// A synthesis voice reported by the playback engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceInfo {
    /// Engine-specific voice identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// BCP-47 language tag, e.g. `en-US`.
    pub lang: String,
    /// Whether the engine flags this voice as female.
    pub female: bool,
}

/// Known high-quality voice names, in preference order.
const PREFERRED_NAMES: &[&str] = &[
    "Google UK English Female",
    "Google US English",
    "Samantha",
    "Karen",
    "Moira",
    "Tessa",
];

/// Pick the best available voice.
///
/// Preference order: first match against the ranked known-good names, then
/// any English voice flagged female, then any English voice, then whatever
/// the engine lists first.
#[must_use]
pub fn choose_voice(voices: &[VoiceInfo]) -> Option<&VoiceInfo> {
    for name in PREFERRED_NAMES {
        if let Some(v) = voices.iter().find(|v| v.name == *name) {
            return Some(v);
        }
    }
    voices
        .iter()
        .find(|v| is_english(v) && v.female)
        .or_else(|| voices.iter().find(|v| is_english(v)))
        .or_else(|| voices.first())
}

fn is_english(voice: &VoiceInfo) -> bool {
    voice.lang.starts_with("en")
}

/// The chosen voice plus the currently known voice list.
///
/// Engines may report their voices asynchronously after startup, so the
/// list is re-published on every change. A heuristic choice is re-derived
/// on each publish; an explicit user choice sticks for the session as long
/// as that voice remains available.
#[derive(Debug, Default)]
pub struct VoiceSelection {
    available: Vec<VoiceInfo>,
    chosen: Option<String>,
    user_pinned: bool,
}

impl VoiceSelection {
    /// Replace the available voice list.
    ///
    /// Re-runs the selection heuristic unless the user's pinned voice is
    /// still present in the new list.
    pub fn publish(&mut self, voices: Vec<VoiceInfo>) {
        self.available = voices;
        let pinned_still_available = self.user_pinned
            && self
                .chosen
                .as_ref()
                .is_some_and(|id| self.available.iter().any(|v| &v.id == id));
        if !pinned_still_available {
            self.user_pinned = false;
            self.chosen = choose_voice(&self.available).map(|v| v.id.clone());
        }
    }

    /// Pin a voice by id. Returns `false` if the id is unknown.
    pub fn select(&mut self, id: &str) -> bool {
        if self.available.iter().any(|v| v.id == id) {
            self.chosen = Some(id.to_owned());
            self.user_pinned = true;
            true
        } else {
            false
        }
    }

    /// The currently chosen voice id, if any.
    #[must_use]
    pub fn chosen(&self) -> Option<&str> {
        self.chosen.as_deref()
    }

    /// The currently known voice list.
    #[must_use]
    pub fn available(&self) -> &[VoiceInfo] {
        &self.available
    }
}
