use crate::events::{EventBus, LanguageChanged};
use crate::prefs::{PreferenceStore, DIRECTION_KEY, LANGUAGE_KEY};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Text direction of the interface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Rtl,
    Ltr,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Rtl => "rtl",
            Direction::Ltr => "ltr",
        }
    }
}

/// Which languages exist and how each behaves
#[derive(Debug, Clone)]
pub struct LanguageSettings {
    pub supported: Vec<String>,
    pub default_language: String,
    /// Languages written right to left
    pub rtl_languages: Vec<String>,
    /// Font stack per language code
    pub fonts: HashMap<String, String>,
}

impl Default for LanguageSettings {
    fn default() -> Self {
        let mut fonts = HashMap::new();
        fonts.insert(
            "ar".to_string(),
            "Cairo, Segoe UI, Tahoma, Geneva, Verdana, sans-serif".to_string(),
        );
        fonts.insert(
            "en".to_string(),
            "Inter, Segoe UI, Tahoma, Geneva, Verdana, sans-serif".to_string(),
        );

        Self {
            supported: vec!["ar".to_string(), "en".to_string()],
            default_language: "ar".to_string(),
            rtl_languages: vec!["ar".to_string(), "fa".to_string(), "he".to_string()],
            fonts,
        }
    }
}

/// Everything the page needs to render one language
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageInfo {
    pub code: String,
    pub name: String,
    pub direction: Direction,
    pub is_rtl: bool,
    pub font_family: String,
}

/// Owns the current interface language and the switch between them.
///
/// Arabic is the default; a saved preference wins over it, and the system
/// locale only counts for first-time visitors.
#[derive(Debug, Clone)]
pub struct LanguageController {
    settings: LanguageSettings,
    current: String,
}

impl LanguageController {
    /// Start from the saved preference when there is a valid one, the
    /// default language otherwise
    pub fn load(settings: LanguageSettings, prefs: &PreferenceStore) -> Self {
        let current = match prefs.get(LANGUAGE_KEY) {
            Some(saved) if settings.supported.iter().any(|l| l == saved) => saved.to_string(),
            Some(saved) => {
                debug!("Ignoring unsupported saved language {:?}", saved);
                settings.default_language.clone()
            }
            None => settings.default_language.clone(),
        };

        Self { settings, current }
    }

    /// Let the system locale pick the language, but only when the visitor
    /// never chose one themselves. Nothing is saved and no event fires;
    /// detection is a starting point, not a decision.
    pub fn detect_system_locale(&mut self, locale: Option<&str>, prefs: &PreferenceStore) {
        if prefs.get(LANGUAGE_KEY).is_some() {
            return;
        }

        let locale = match locale {
            Some(locale) => locale,
            None => return,
        };

        // "ar_SA.UTF-8" and "en-US" both reduce to their primary subtag
        let primary = locale
            .split(|c: char| c == '_' || c == '-' || c == '.')
            .next()
            .unwrap_or(locale)
            .to_lowercase();

        if self.settings.supported.iter().any(|l| *l == primary) {
            debug!("System locale {:?} selects language {}", locale, primary);
            self.current = primary;
        }
    }

    pub fn current(&self) -> &str {
        &self.current
    }

    pub fn direction(&self) -> Direction {
        self.direction_of(&self.current)
    }

    pub fn direction_of(&self, language: &str) -> Direction {
        if self.settings.rtl_languages.iter().any(|l| l == language) {
            Direction::Rtl
        } else {
            Direction::Ltr
        }
    }

    pub fn is_rtl(&self) -> bool {
        self.direction() == Direction::Rtl
    }

    /// Flip between Arabic and English
    pub fn toggle(&mut self, prefs: &mut PreferenceStore, bus: &EventBus) {
        let next = if self.current == "ar" { "en" } else { "ar" };
        self.switch_to(next, prefs, bus);
    }

    /// Switch to a language, persist the choice, and tell everyone.
    /// Unsupported codes are refused, switching to the current language
    /// does nothing.
    pub fn switch_to(&mut self, language: &str, prefs: &mut PreferenceStore, bus: &EventBus) {
        if !self.settings.supported.iter().any(|l| l == language) {
            warn!("Refusing to switch to unsupported language {:?}", language);
            return;
        }
        if self.current == language {
            return;
        }

        self.current = language.to_string();
        let direction = self.direction();

        prefs.set(LANGUAGE_KEY, language);
        prefs.set(DIRECTION_KEY, direction.as_str());

        bus.emit_language_changed(&LanguageChanged {
            language: language.to_string(),
            direction,
            is_rtl: direction == Direction::Rtl,
        });
        info!("Language switched to {}", language);
    }

    pub fn info(&self) -> LanguageInfo {
        let direction = self.direction();
        LanguageInfo {
            code: self.current.clone(),
            name: match self.current.as_str() {
                "ar" => "العربية".to_string(),
                "en" => "English".to_string(),
                other => other.to_string(),
            },
            direction,
            is_rtl: direction == Direction::Rtl,
            font_family: self
                .settings
                .fonts
                .get(&self.current)
                .cloned()
                .unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn fresh() -> LanguageController {
        LanguageController::load(LanguageSettings::default(), &PreferenceStore::new())
    }

    fn temp_path(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("offsite-lang-{}-{}.json", tag, std::process::id()))
    }

    #[test]
    fn test_arabic_is_the_default() {
        let controller = fresh();
        assert_eq!(controller.current(), "ar");
        assert_eq!(controller.direction(), Direction::Rtl);
        assert!(controller.is_rtl());
    }

    #[test]
    fn test_toggle_flips_between_the_two_languages() {
        let mut controller = fresh();
        let mut prefs = PreferenceStore::new();
        let bus = EventBus::new();

        controller.toggle(&mut prefs, &bus);
        assert_eq!(controller.current(), "en");
        assert_eq!(controller.direction(), Direction::Ltr);

        controller.toggle(&mut prefs, &bus);
        assert_eq!(controller.current(), "ar");
    }

    #[test]
    fn test_switch_persists_language_and_direction() {
        let mut controller = fresh();
        let mut prefs = PreferenceStore::new();
        controller.switch_to("en", &mut prefs, &EventBus::new());

        assert_eq!(prefs.get(LANGUAGE_KEY), Some("en"));
        assert_eq!(prefs.get(DIRECTION_KEY), Some("ltr"));
    }

    #[test]
    fn test_switch_emits_a_language_changed_event() {
        let mut controller = fresh();
        let mut prefs = PreferenceStore::new();
        let bus = EventBus::new();

        let seen = std::sync::Arc::new(std::sync::Mutex::new(None));
        let sink = std::sync::Arc::clone(&seen);
        bus.on_language_changed(move |event| {
            *sink.lock().unwrap() = Some(event.clone());
        });

        controller.switch_to("en", &mut prefs, &bus);

        let event = seen.lock().unwrap().clone().unwrap();
        assert_eq!(event.language, "en");
        assert_eq!(event.direction, Direction::Ltr);
        assert!(!event.is_rtl);
    }

    #[test]
    fn test_switching_to_the_current_language_is_silent() {
        let mut controller = fresh();
        let mut prefs = PreferenceStore::new();
        let bus = EventBus::new();

        let fired = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let counter = std::sync::Arc::clone(&fired);
        bus.on_language_changed(move |_| {
            counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        });

        controller.switch_to("ar", &mut prefs, &bus);
        assert_eq!(fired.load(std::sync::atomic::Ordering::SeqCst), 0);
        assert_eq!(prefs.get(LANGUAGE_KEY), None);
    }

    #[test]
    fn test_unsupported_language_is_refused() {
        let mut controller = fresh();
        let mut prefs = PreferenceStore::new();
        controller.switch_to("fr", &mut prefs, &EventBus::new());
        assert_eq!(controller.current(), "ar");
        assert_eq!(prefs.get(LANGUAGE_KEY), None);
    }

    #[test]
    fn test_saved_preference_survives_a_reload() {
        let path = temp_path("reload");
        let _ = std::fs::remove_file(&path);

        let mut prefs = PreferenceStore::load_from(&path).unwrap();
        let mut controller =
            LanguageController::load(LanguageSettings::default(), &prefs);
        controller.switch_to("en", &mut prefs, &EventBus::new());

        // Fresh load, same file: the choice sticks
        let prefs = PreferenceStore::load_from(&path).unwrap();
        let controller = LanguageController::load(LanguageSettings::default(), &prefs);
        assert_eq!(controller.current(), "en");

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_system_locale_counts_only_without_a_saved_choice() {
        let prefs = PreferenceStore::new();
        let mut controller = LanguageController::load(LanguageSettings::default(), &prefs);
        controller.detect_system_locale(Some("en_US.UTF-8"), &prefs);
        assert_eq!(controller.current(), "en");

        let mut prefs = PreferenceStore::new();
        prefs.set(LANGUAGE_KEY, "ar");
        let mut controller = LanguageController::load(LanguageSettings::default(), &prefs);
        controller.detect_system_locale(Some("en_US.UTF-8"), &prefs);
        assert_eq!(controller.current(), "ar", "explicit choice beats the locale");
    }

    #[test]
    fn test_unknown_locale_changes_nothing() {
        let prefs = PreferenceStore::new();
        let mut controller = LanguageController::load(LanguageSettings::default(), &prefs);
        controller.detect_system_locale(Some("fr-FR"), &prefs);
        assert_eq!(controller.current(), "ar");
    }

    #[test]
    fn test_info_carries_the_font_stack() {
        let controller = fresh();
        let info = controller.info();
        assert_eq!(info.code, "ar");
        assert_eq!(info.name, "العربية");
        assert!(info.font_family.starts_with("Cairo"));
        assert!(info.is_rtl);
    }
}
