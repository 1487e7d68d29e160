use crate::events::{EventBus, ThemeChanged};
use crate::prefs::{PreferenceStore, FOLLOW_SYSTEM_KEY, THEME_KEY};
use serde::{Deserialize, Serialize};
use tracing::info;

/// The two color schemes the site ships
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    #[default]
    Light,
    Dark,
}

impl ThemeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThemeMode::Light => "light",
            ThemeMode::Dark => "dark",
        }
    }

    /// Parse a stored preference. Anything but the two known names is None.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "light" => Some(ThemeMode::Light),
            "dark" => Some(ThemeMode::Dark),
            _ => None,
        }
    }

    pub fn flipped(&self) -> Self {
        match self {
            ThemeMode::Light => ThemeMode::Dark,
            ThemeMode::Dark => ThemeMode::Light,
        }
    }

    /// Browser chrome color for this scheme
    pub fn meta_color(&self) -> &'static str {
        match self {
            ThemeMode::Light => "#ffffff",
            ThemeMode::Dark => "#0f172a",
        }
    }
}

/// Owns the current theme and the follow-the-system flag.
///
/// An explicit choice always breaks the link to the system preference;
/// opting back in re-syncs immediately.
#[derive(Debug, Clone)]
pub struct ThemeController {
    current: ThemeMode,
    system_preference: ThemeMode,
    follow_system: bool,
}

impl ThemeController {
    /// Resolve the starting theme: follow the system when that was chosen,
    /// otherwise a valid saved theme, otherwise light
    pub fn load(prefs: &PreferenceStore, system_preference: ThemeMode) -> Self {
        let follow_system = prefs.get(FOLLOW_SYSTEM_KEY) == Some("true");
        let current = if follow_system {
            system_preference
        } else {
            prefs
                .get(THEME_KEY)
                .and_then(ThemeMode::parse)
                .unwrap_or_default()
        };

        Self {
            current,
            system_preference,
            follow_system,
        }
    }

    pub fn current(&self) -> ThemeMode {
        self.current
    }

    pub fn follows_system(&self) -> bool {
        self.follow_system
    }

    /// Flip light and dark by hand, which always detaches from the system
    pub fn toggle(&mut self, prefs: &mut PreferenceStore, bus: &EventBus) {
        self.follow_system = false;
        self.switch_to(self.current.flipped(), prefs, bus);
    }

    /// Apply a theme, persist it, and announce the change. Re-applying the
    /// current theme does nothing.
    pub fn switch_to(&mut self, theme: ThemeMode, prefs: &mut PreferenceStore, bus: &EventBus) {
        if self.current == theme {
            return;
        }

        let previous = self.current;
        self.current = theme;

        prefs.set(THEME_KEY, theme.as_str());
        prefs.set(
            FOLLOW_SYSTEM_KEY,
            if self.follow_system { "true" } else { "false" },
        );

        bus.emit_theme_changed(&ThemeChanged {
            theme,
            previous,
            follows_system: self.follow_system,
        });
        info!("Theme switched to {}", theme.as_str());
    }

    /// The system scheme changed. Only matters while we're following it.
    pub fn system_preference_changed(
        &mut self,
        preference: ThemeMode,
        prefs: &mut PreferenceStore,
        bus: &EventBus,
    ) {
        self.system_preference = preference;
        if self.follow_system {
            self.switch_to(preference, prefs, bus);
        }
    }

    /// Turn following the system on or off. Opting in adopts the system
    /// scheme right away.
    pub fn set_follow_system(
        &mut self,
        follow: bool,
        prefs: &mut PreferenceStore,
        bus: &EventBus,
    ) {
        self.follow_system = follow;
        if follow {
            self.switch_to(self.system_preference, prefs, bus);
        }
        prefs.set(FOLLOW_SYSTEM_KEY, if follow { "true" } else { "false" });
    }

    /// Back to the defaults: light theme, no system link, nothing saved
    pub fn reset(&mut self, prefs: &mut PreferenceStore, bus: &EventBus) {
        self.current = ThemeMode::default();
        self.follow_system = false;
        prefs.remove(THEME_KEY);
        prefs.remove(FOLLOW_SYSTEM_KEY);

        bus.emit_theme_changed(&ThemeChanged {
            theme: self.current,
            previous: self.current.flipped(),
            follows_system: false,
        });
    }
}

/// Black or white, whichever reads better on the given background.
/// Unparsable colors get black, same as an unknown background.
pub fn contrast_color(hex: &str) -> &'static str {
    match parse_hex(hex) {
        Some((r, g, b)) => {
            let brightness = (r as u32 * 299 + g as u32 * 587 + b as u32 * 114) / 1000;
            if brightness > 128 {
                "#000000"
            } else {
                "#ffffff"
            }
        }
        None => "#000000",
    }
}

/// Parse "#rrggbb" (leading '#' optional) into its channels
pub fn parse_hex(hex: &str) -> Option<(u8, u8, u8)> {
    let hex = hex.strip_prefix('#').unwrap_or(hex);
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some((r, g, b))
}
