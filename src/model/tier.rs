use std::fmt;

/// Security level at which a key lives, strongest first
///
/// The derived ordering follows declaration order, so
/// `HardwareSecurityModule < TrustedExecutionEnvironment < SoftwareFallback`
/// reads as "stronger than".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SecurityTier {
    /// Dedicated secure element (StrongBox class hardware)
    HardwareSecurityModule,
    /// Isolated execution environment on the main processor
    TrustedExecutionEnvironment,
    /// Keys held by the OS without hardware isolation
    SoftwareFallback,
}

impl SecurityTier {
    /// Tiers the custodian attempts by default, in order
    pub const HARDWARE_PREFERENCE: [SecurityTier; 2] = [
        SecurityTier::HardwareSecurityModule,
        SecurityTier::TrustedExecutionEnvironment,
    ];

    pub fn is_hardware(self) -> bool {
        !matches!(self, SecurityTier::SoftwareFallback)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SecurityTier::HardwareSecurityModule => "HARDWARE_SECURITY_MODULE",
            SecurityTier::TrustedExecutionEnvironment => "TRUSTED_EXECUTION_ENVIRONMENT",
            SecurityTier::SoftwareFallback => "SOFTWARE_FALLBACK",
        }
    }
}

impl fmt::Display for SecurityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
