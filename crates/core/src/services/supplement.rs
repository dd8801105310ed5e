//! Origin-tagged supplementary view state.

/// Who asked for a supplementary fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOrigin {
    /// Explicit user action on the open screen.
    Foreground,
    /// Speculative prefetch, or a response that outlived its trigger.
    Background,
}

/// Slot for a locally computed artifact riding alongside a live view.
///
/// Live snapshots refresh records and never touch this slot. A foreground
/// result always installs and pins the slot; a background result installs
/// only while the slot is unpinned, so a straggling prefetch can never
/// overwrite what the user explicitly asked for.
#[derive(Debug, Clone)]
pub struct Supplement<T> {
    value: Option<T>,
    foreground_owned: bool,
}

impl<T> Supplement<T> {
    /// An unpinned, empty slot.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            value: None,
            foreground_owned: false,
        }
    }

    /// Current artifact, if any.
    #[must_use]
    pub const fn get(&self) -> Option<&T> {
        self.value.as_ref()
    }

    /// Whether a foreground result currently pins the slot.
    #[must_use]
    pub const fn is_foreground_owned(&self) -> bool {
        self.foreground_owned
    }

    /// Install a fetched artifact. Returns whether it was accepted.
    pub fn apply(&mut self, value: T, origin: FetchOrigin) -> bool {
        match origin {
            FetchOrigin::Foreground => {
                self.value = Some(value);
                self.foreground_owned = true;
                true
            }
            FetchOrigin::Background => {
                if self.foreground_owned {
                    return false;
                }
                self.value = Some(value);
                true
            }
        }
    }

    /// Clear the slot and its pin.
    pub fn invalidate(&mut self) {
        self.value = None;
        self.foreground_owned = false;
    }
}

impl<T> Default for Supplement<T> {
    fn default() -> Self {
        Self::empty()
    }
}
