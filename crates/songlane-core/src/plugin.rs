use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SongError;

const ID_SEPARATOR: &str = " // ";
const INSTANCE_ID_LEN: usize = 10;

/// The four parts of a plugin type identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginIdentity {
    pub manufacturer: String,
    pub format: String,
    pub name: String,
    pub version: String,
}

impl PluginIdentity {
    #[must_use]
    pub fn encode(&self) -> String {
        [
            self.manufacturer.as_str(),
            self.format.as_str(),
            self.name.as_str(),
            self.version.as_str(),
        ]
        .join(ID_SEPARATOR)
    }

    #[must_use]
    pub fn encode_versionless(&self) -> String {
        [self.manufacturer.as_str(), self.format.as_str(), self.name.as_str()].join(ID_SEPARATOR)
    }
}

/// Parses `"manufacturer // format // name // version"`.
pub fn decode_plugin_id(tf_id: &str) -> Result<PluginIdentity, SongError> {
    let parts: Vec<&str> = tf_id.split(ID_SEPARATOR).collect();
    match parts.as_slice() {
        [manufacturer, format, name, version, ..] => Ok(PluginIdentity {
            manufacturer: (*manufacturer).to_string(),
            format: (*format).to_string(),
            name: (*name).to_string(),
            version: (*version).to_string(),
        }),
        _ => Err(SongError::MalformedIdentifier(tf_id.to_string())),
    }
}

#[must_use]
pub fn plugin_id(manufacturer: &str, format: &str, name: &str, version: &str) -> String {
    [manufacturer, format, name, version].join(ID_SEPARATOR)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AudioPlugin {
    tf_id: String,
    instance_id: String,
    #[serde(default = "default_enabled")]
    enabled: bool,
    /// Opaque plugin state blob, base64 in the host's encoding.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    state: Option<String>,
}

fn default_enabled() -> bool {
    true
}

impl AudioPlugin {
    /// Creates an enabled instance of the plugin type `tf_id`.
    pub fn new(tf_id: &str) -> Result<Self, SongError> {
        let identity = decode_plugin_id(tf_id)?;
        let instance_id: String = Uuid::new_v4()
            .simple()
            .to_string()
            .chars()
            .take(INSTANCE_ID_LEN)
            .collect();
        Ok(Self {
            tf_id: identity.encode(),
            instance_id,
            enabled: true,
            state: None,
        })
    }

    #[must_use]
    pub fn tf_id(&self) -> &str {
        &self.tf_id
    }

    #[must_use]
    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    #[must_use]
    pub fn state(&self) -> Option<&str> {
        self.state.as_deref()
    }

    pub fn set_state(&mut self, state: Option<String>) {
        self.state = state;
    }

    pub fn identity(&self) -> Result<PluginIdentity, SongError> {
        decode_plugin_id(&self.tf_id)
    }

    #[must_use]
    pub fn matches(&self, tf_id: &str) -> bool {
        self.tf_id == tf_id
    }

    /// Same manufacturer, format and name. Malformed ids never match.
    #[must_use]
    pub fn matches_ignoring_version(&self, tf_id: &str) -> bool {
        match (self.identity(), decode_plugin_id(tf_id)) {
            (Ok(ours), Ok(theirs)) => ours.encode_versionless() == theirs.encode_versionless(),
            _ => false,
        }
    }
}
