use crate::language::Direction;
use crate::theme::ThemeMode;
use std::sync::{Arc, Mutex, MutexGuard};

/// Fired after the interface language flips
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageChanged {
    pub language: String,
    pub direction: Direction,
    pub is_rtl: bool,
}

/// Fired after the color theme flips
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeChanged {
    pub theme: ThemeMode,
    pub previous: ThemeMode,
    pub follows_system: bool,
}

type Listener<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// Typed subscriptions for the two page-level events.
///
/// Dispatch is synchronous: emit returns only after every listener has run,
/// so callers can rely on side effects being visible right away. Listeners
/// registered first fire first.
#[derive(Default)]
pub struct EventBus {
    language: Mutex<Vec<Listener<LanguageChanged>>>,
    theme: Mutex<Vec<Listener<ThemeChanged>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_language_changed<F>(&self, listener: F)
    where
        F: Fn(&LanguageChanged) + Send + Sync + 'static,
    {
        lock(&self.language).push(Arc::new(listener));
    }

    pub fn on_theme_changed<F>(&self, listener: F)
    where
        F: Fn(&ThemeChanged) + Send + Sync + 'static,
    {
        lock(&self.theme).push(Arc::new(listener));
    }

    pub fn emit_language_changed(&self, event: &LanguageChanged) {
        // Snapshot first so a listener that subscribes more listeners
        // doesn't deadlock us
        let listeners: Vec<_> = lock(&self.language).clone();
        for listener in listeners {
            listener(event);
        }
    }

    pub fn emit_theme_changed(&self, event: &ThemeChanged) {
        let listeners: Vec<_> = lock(&self.theme).clone();
        for listener in listeners {
            listener(event);
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}
