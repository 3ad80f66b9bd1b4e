use caretsync_core::DisplayMetrics;
use caretsync_ui::{EditActions, FieldCapabilities, FieldId};
use serde::{Deserialize, Serialize};

use crate::keyboard::{Autocapitalization, ContentValidation, KeyboardKind, LineMode, ShowRequest};

/// Custom per-character filter, sent to the keyboard as JSON.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterValidator {
    /// Characters accepted; empty accepts everything.
    #[serde(default)]
    pub allowed: String,
    /// Fold accepted letters to upper case.
    #[serde(default)]
    pub uppercase: bool,
}

impl CharacterValidator {
    /// The character to insert for `ch`, or `None` to reject it.
    pub fn validate(&self, ch: char) -> Option<char> {
        if !self.allowed.is_empty() && !self.allowed.contains(ch) {
            return None;
        }
        if self.uppercase {
            ch.to_uppercase().next()
        } else {
            Some(ch)
        }
    }

    pub fn to_spec(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_spec(spec: &str) -> serde_json::Result<Self> {
        serde_json::from_str(spec)
    }
}

/// Per-field settings.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldConfig {
    pub keyboard: KeyboardKind,
    pub validation: ContentValidation,
    pub line_mode: LineMode,
    pub autocapitalization: Autocapitalization,
    pub autocorrect: bool,
    /// Password-style field.
    pub secure: bool,
    /// Selectable and copyable, never edited, never raises the keyboard.
    pub read_only: bool,
    pub emojis_allowed: bool,
    /// `0` means unlimited.
    pub character_limit: usize,
    pub validator: Option<CharacterValidator>,
    /// Field that receives focus on the keyboard's "next" key.
    pub next_field: Option<FieldId>,
    pub menu_enabled: bool,
    pub menu_actions: EditActions,
    pub handles_enabled: bool,
    /// Used for touch-target sizing when the display DPI is unknown.
    pub font_size: f32,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            keyboard: KeyboardKind::Default,
            validation: ContentValidation::None,
            line_mode: LineMode::SingleLine,
            autocapitalization: Autocapitalization::None,
            autocorrect: true,
            secure: false,
            read_only: false,
            emojis_allowed: true,
            character_limit: 0,
            validator: None,
            next_field: None,
            menu_enabled: true,
            menu_actions: EditActions::all(),
            handles_enabled: true,
            font_size: 16.0,
        }
    }
}

impl FieldConfig {
    pub fn capabilities(&self) -> FieldCapabilities {
        FieldCapabilities {
            read_only: self.read_only,
            secure: self.secure,
            allowed: self.menu_actions,
        }
    }

    pub fn is_multiline(&self) -> bool {
        self.line_mode != LineMode::SingleLine
    }

    /// Builds the keyboard request for editing `text` in this field.
    pub fn show_request(&self, text: &str) -> ShowRequest {
        let validator_spec = match (&self.validator, self.validation) {
            (Some(validator), ContentValidation::Custom) => match validator.to_spec() {
                Ok(spec) => Some(spec),
                Err(e) => {
                    log::warn!("failed to encode character validator: {e}");
                    None
                }
            },
            _ => None,
        };
        ShowRequest {
            text: text.to_owned(),
            kind: self.keyboard,
            validation: self.validation,
            line_mode: self.line_mode,
            autocapitalization: self.autocapitalization,
            autocorrect: self.autocorrect,
            secure: self.secure,
            emojis_allowed: self.emojis_allowed,
            has_next: self.next_field.is_some(),
            character_limit: self.character_limit,
            validator_spec,
        }
    }
}

/// Settings shared by every field the bridge drives.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BridgeOptions {
    /// Physical display, for thumb-sized handles. `None` falls back to the
    /// field's font size.
    pub display: Option<DisplayMetrics>,
    /// Extra scale applied to handle size.
    pub handle_scale: f32,
    /// Action bar height in touch targets; platforms differ slightly.
    pub menu_height_ratio: f32,
}

impl Default for BridgeOptions {
    fn default() -> Self {
        Self {
            display: None,
            handle_scale: 1.0,
            menu_height_ratio: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validator_filters_and_folds() {
        let validator = CharacterValidator {
            allowed: "abcABC".into(),
            uppercase: true,
        };
        assert_eq!(validator.validate('b'), Some('B'));
        assert_eq!(validator.validate('z'), None);
        assert_eq!(CharacterValidator::default().validate('z'), Some('z'));
    }

    #[test]
    fn validator_spec_is_json() {
        let validator = CharacterValidator {
            allowed: "0123456789".into(),
            uppercase: false,
        };
        let spec = validator.to_spec().unwrap();
        assert_eq!(spec, r#"{"allowed":"0123456789","uppercase":false}"#);
        assert_eq!(CharacterValidator::from_spec(r#"{"allowed":"xy"}"#).unwrap().allowed, "xy");
    }

    #[test]
    fn show_request_carries_field_settings() {
        let config = FieldConfig {
            secure: true,
            character_limit: 8,
            next_field: Some(FieldId(9)),
            validation: ContentValidation::Custom,
            validator: Some(CharacterValidator::default()),
            ..FieldConfig::default()
        };
        let request = config.show_request("pw");
        assert_eq!(request.text, "pw");
        assert!(request.secure);
        assert!(request.has_next);
        assert_eq!(request.character_limit, 8);
        assert!(request.validator_spec.is_some());

        let plain = FieldConfig::default().show_request("");
        assert_eq!(plain.validator_spec, None);
    }

    #[test]
    fn capabilities_follow_config() {
        let config = FieldConfig {
            read_only: true,
            menu_actions: EditActions::COPY,
            ..FieldConfig::default()
        };
        let caps = config.capabilities();
        assert!(caps.read_only);
        assert_eq!(caps.allowed, EditActions::COPY);
    }
}
