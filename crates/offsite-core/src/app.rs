use crate::config::Config;
use crate::events::EventBus;
use crate::language::{LanguageController, LanguageInfo, LanguageSettings};
use crate::prefs::PreferenceStore;
use crate::theme::{ThemeController, ThemeMode};
use std::sync::Arc;
use tracing::{error, info};

/// The page-side application: one object owning the preference store, the
/// event bus and both controllers, handed around explicitly instead of
/// living in globals.
pub struct App {
    config: Config,
    prefs: PreferenceStore,
    bus: Arc<EventBus>,
    language: LanguageController,
    theme: ThemeController,
}

impl App {
    /// Bring the page layer up with persisted preferences. A preference
    /// store that fails to load degrades to an in-memory one; losing saved
    /// settings beats not starting.
    pub fn init(config: Config, system_theme: ThemeMode, system_locale: Option<&str>) -> Self {
        let prefs = match PreferenceStore::load() {
            Ok(prefs) => prefs,
            Err(e) => {
                error!("Could not load preferences, starting fresh: {}", e);
                PreferenceStore::new()
            }
        };
        Self::with_prefs(config, prefs, system_theme, system_locale)
    }

    /// Same as init, but with a caller-supplied preference store
    pub fn with_prefs(
        config: Config,
        prefs: PreferenceStore,
        system_theme: ThemeMode,
        system_locale: Option<&str>,
    ) -> Self {
        let bus = Arc::new(EventBus::new());

        let mut language = LanguageController::load(LanguageSettings::default(), &prefs);
        language.detect_system_locale(system_locale, &prefs);
        let theme = ThemeController::load(&prefs, system_theme);

        info!(
            "Page layer up: language {}, theme {}",
            language.current(),
            theme.current().as_str()
        );

        Self {
            config,
            prefs,
            bus,
            language,
            theme,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    pub fn prefs(&self) -> &PreferenceStore {
        &self.prefs
    }

    pub fn language(&self) -> &LanguageController {
        &self.language
    }

    pub fn theme(&self) -> &ThemeController {
        &self.theme
    }

    pub fn language_info(&self) -> LanguageInfo {
        self.language.info()
    }

    pub fn toggle_language(&mut self) {
        self.language.toggle(&mut self.prefs, &self.bus);
    }

    pub fn switch_language(&mut self, language: &str) {
        self.language.switch_to(language, &mut self.prefs, &self.bus);
    }

    pub fn toggle_theme(&mut self) {
        self.theme.toggle(&mut self.prefs, &self.bus);
    }

    pub fn switch_theme(&mut self, theme: ThemeMode) {
        self.theme.switch_to(theme, &mut self.prefs, &self.bus);
    }

    pub fn set_follow_system_theme(&mut self, follow: bool) {
        self.theme.set_follow_system(follow, &mut self.prefs, &self.bus);
    }

    pub fn system_theme_changed(&mut self, preference: ThemeMode) {
        self.theme
            .system_preference_changed(preference, &mut self.prefs, &self.bus);
    }
}
