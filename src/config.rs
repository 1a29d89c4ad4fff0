//! Core configuration
//!
//! Everything the core needs that is not a collaborator: which alias to
//! manage, what to sign as a probe, what the prompt says, and whether a
//! software-only key is acceptable.

use crate::error::{BiosealResult, ConfigError};
use crate::model::{KeyAlias, PromptInfo, SecurityTier};

/// Configuration shared by the custodian, gate and coordinator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    /// Alias of the installation's signing key
    pub alias: KeyAlias,
    /// Fixed payload signed to exercise the key after authentication
    pub probe_payload: Vec<u8>,
    /// Text of the biometric prompt
    pub prompt: PromptInfo,
    /// Accept a key without hardware isolation when no hardware tier works
    pub allow_software_fallback: bool,
}

impl CoreConfig {
    pub const DEFAULT_PROBE_PAYLOAD: &'static [u8] = b"bioseal biometric probe";

    pub fn with_alias(mut self, alias: &str) -> BiosealResult<Self> {
        self.alias = KeyAlias::new(alias)?;
        Ok(self)
    }

    pub fn with_probe_payload(mut self, payload: impl Into<Vec<u8>>) -> BiosealResult<Self> {
        let payload = payload.into();
        if payload.is_empty() {
            return Err(ConfigError::EmptyProbePayload.into());
        }
        self.probe_payload = payload;
        Ok(self)
    }

    pub fn with_prompt(mut self, prompt: PromptInfo) -> Self {
        self.prompt = prompt;
        self
    }

    pub fn with_software_fallback(mut self, allow: bool) -> Self {
        self.allow_software_fallback = allow;
        self
    }

    /// Security tiers to attempt at creation, strongest first
    pub fn tier_preference(&self) -> Vec<SecurityTier> {
        let mut tiers = SecurityTier::HARDWARE_PREFERENCE.to_vec();
        if self.allow_software_fallback {
            tiers.push(SecurityTier::SoftwareFallback);
        }
        tiers
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            alias: KeyAlias::default(),
            probe_payload: Self::DEFAULT_PROBE_PAYLOAD.to_vec(),
            prompt: PromptInfo::default(),
            allow_software_fallback: false,
        }
    }
}
