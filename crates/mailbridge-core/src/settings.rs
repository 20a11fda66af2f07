//! Persisted email-generation settings
//!
//! One JSON document on disk, read on every request. A missing or corrupt
//! document always yields the defaults; partial updates merge field by
//! field, reject unknown keys without writing, and rewrite the whole
//! document through a temp-file rename.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;

use crate::provider::Provider;

/// Reply/compose language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    Ar,
    Fr,
}

/// Overall tone of generated email text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Formal,
    Informal,
    Friendly,
    Polite,
    Technical,
}

/// Writing style of generated email text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WritingStyle {
    ClearAndConcise,
    Detailed,
    Persuasive,
}

/// User-tunable email generation preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EmailSettings {
    pub language: Language,
    pub tone: Tone,
    pub writing_style: WritingStyle,
    pub sender_name: String,
    pub organization_name: String,
    pub include_signature: bool,
    /// Signature template; `{{sender_name}}` and `{{organization_name}}`
    /// are substituted at render time
    pub signature: String,
    /// Greeting template; `{{recipient_name}}` is substituted at render time
    pub preferred_greeting: String,
    pub auto_adjust_tone: bool,
    pub include_thread_context: bool,
    pub character_limit: u32,
    pub prompt_prefix: String,
    pub default_provider: Provider,
}

impl Default for EmailSettings {
    fn default() -> Self {
        Self {
            language: Language::En,
            tone: Tone::Formal,
            writing_style: WritingStyle::ClearAndConcise,
            sender_name: "Astro".to_string(),
            organization_name: "Kalima Tech".to_string(),
            include_signature: true,
            signature: "Best regards,\n{{sender_name}}\n{{organization_name}}".to_string(),
            preferred_greeting: "Dear {{recipient_name}},".to_string(),
            auto_adjust_tone: true,
            include_thread_context: true,
            character_limit: 1000,
            prompt_prefix: "You are an AI email assistant for {{organization_name}}. \
                            Keep messages professional, polite, and to the point."
                .to_string(),
            default_provider: Provider::Google,
        }
    }
}

impl EmailSettings {
    /// Render the signature template with the stored identity fields
    pub fn render_signature(&self) -> String {
        self.substitute(&self.signature, None)
    }

    /// Render the greeting template for a recipient
    pub fn render_greeting(&self, recipient_name: &str) -> String {
        self.substitute(&self.preferred_greeting, Some(recipient_name))
    }

    fn substitute(&self, template: &str, recipient_name: Option<&str>) -> String {
        let mut rendered = template
            .replace("{{sender_name}}", &self.sender_name)
            .replace("{{organization_name}}", &self.organization_name);
        if let Some(recipient) = recipient_name {
            rendered = rendered.replace("{{recipient_name}}", recipient);
        }
        rendered
    }
}

/// Errors from partial settings updates
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The update names a field outside the settings schema; nothing was
    /// written
    #[error("unknown settings field: {0}")]
    UnknownField(String),

    /// The merged document failed validation; nothing was written
    #[error("invalid settings value: {0}")]
    Invalid(String),

    #[error("failed to persist settings: {0}")]
    Io(#[from] std::io::Error),
}

/// Loads and rewrites the settings document at a fixed path
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the persisted settings; a missing, unreadable, or invalid
    /// document yields the defaults and never an error.
    pub fn load(&self) -> EmailSettings {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(_) => return EmailSettings::default(),
        };
        match serde_json::from_str(&raw) {
            Ok(settings) => settings,
            Err(err) => {
                warn!("settings document at {:?} is invalid ({err}), using defaults", self.path);
                EmailSettings::default()
            }
        }
    }

    /// Merge the given fields into the current settings and persist the
    /// result. Unknown keys and invalid values are rejected before any
    /// write happens; the stored document is replaced atomically.
    pub fn update(&self, partial: &Map<String, Value>) -> Result<EmailSettings, SettingsError> {
        let current = self.load();
        let mut doc = match serde_json::to_value(&current) {
            Ok(Value::Object(map)) => map,
            _ => return Err(SettingsError::Invalid("settings did not serialize to an object".into())),
        };

        for (key, value) in partial {
            if !doc.contains_key(key) {
                return Err(SettingsError::UnknownField(key.clone()));
            }
            doc.insert(key.clone(), value.clone());
        }

        let merged: EmailSettings = serde_json::from_value(Value::Object(doc))
            .map_err(|err| SettingsError::Invalid(err.to_string()))?;

        self.persist(&merged)?;
        Ok(merged)
    }

    fn persist(&self, settings: &EmailSettings) -> Result<(), SettingsError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(settings)
            .map_err(|err| SettingsError::Invalid(err.to_string()))?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store_in(dir: &tempfile::TempDir) -> SettingsStore {
        SettingsStore::new(dir.path().join("settings.json"))
    }

    fn partial(pairs: &[(&str, Value)]) -> Map<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn load_on_missing_file_returns_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = store_in(&dir).load();
        assert_eq!(settings, EmailSettings::default());
    }

    #[test]
    fn load_on_corrupt_file_returns_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        fs::write(store.path(), "{not json").unwrap();
        assert_eq!(store.load(), EmailSettings::default());

        fs::write(store.path(), r#"{"tone": "grumpy"}"#).unwrap();
        assert_eq!(store.load(), EmailSettings::default());
    }

    #[test]
    fn update_changes_only_named_fields() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let updated = store
            .update(&partial(&[("tone", json!("friendly"))]))
            .unwrap();
        assert_eq!(updated.tone, Tone::Friendly);
        assert_eq!(updated.sender_name, "Astro");
        assert_eq!(updated.character_limit, 1000);

        // the change survives a reload
        let reloaded = store.load();
        assert_eq!(reloaded.tone, Tone::Friendly);
        assert_eq!(reloaded.language, Language::En);
    }

    #[test]
    fn unknown_field_is_rejected_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store
            .update(&partial(&[("tone", json!("polite"))]))
            .unwrap();

        let err = store
            .update(&partial(&[("bogus", json!(1))]))
            .unwrap_err();
        assert!(matches!(err, SettingsError::UnknownField(ref k) if k == "bogus"));
        assert_eq!(store.load().tone, Tone::Polite);
    }

    #[test]
    fn invalid_value_is_rejected_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let err = store
            .update(&partial(&[("tone", json!("grumpy"))]))
            .unwrap_err();
        assert!(matches!(err, SettingsError::Invalid(_)));
        assert_eq!(store.load(), EmailSettings::default());
    }

    #[test]
    fn update_accepts_provider_switch() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let updated = store
            .update(&partial(&[("default_provider", json!("outlook"))]))
            .unwrap();
        assert_eq!(updated.default_provider, Provider::Outlook);
    }

    #[test]
    fn templates_render_with_placeholders() {
        let settings = EmailSettings::default();
        assert_eq!(
            settings.render_signature(),
            "Best regards,\nAstro\nKalima Tech"
        );
        assert_eq!(settings.render_greeting("Sam"), "Dear Sam,");
    }
}
