//! Application Configuration
//!
//! Configuration for the Auth application layer.

/// Deployment environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Production,
    Test,
}

/// Fixed secret/code pair accepted unconditionally under test
/// configuration, distinct from the real cryptographic path.
#[derive(Debug, Clone)]
pub struct TotpBypass {
    /// Base32 secret provisioned to enrollments in the test environment
    pub secret: String,
    /// Code accepted for that secret
    pub code: String,
}

/// Well-known test secret (valid base32) and code
pub const TEST_TOTP_SECRET: &str = "JBSWY3DPEHPK3PXPJBSWY3DPEHPK3PXP";
pub const TEST_TOTP_CODE: &str = "123456";

/// External authorization provider endpoints
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Client-credentials endpoint
    pub client_url: String,
    /// Authorization-code endpoint
    pub authorize_url: String,
    /// Token-exchange endpoint
    pub token_url: String,
    /// Bearer-token introspection endpoint
    pub introspect_url: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            client_url: "http://localhost:9000/oauth/client".to_string(),
            authorize_url: "http://localhost:9000/oauth/authorize".to_string(),
            token_url: "http://localhost:9000/oauth/token".to_string(),
            introspect_url: "http://localhost:9000/oauth/introspect".to_string(),
        }
    }
}

/// Auth application configuration
#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
    /// Deployment environment
    pub environment: Environment,
    /// External authorization provider endpoints
    pub provider: ProviderConfig,
    /// Test-only TOTP bypass pair
    pub totp_bypass: Option<TotpBypass>,
}

impl AuthConfig {
    /// Config for the test environment: hard deletes and the fixed
    /// TOTP pair are enabled.
    pub fn test() -> Self {
        Self {
            environment: Environment::Test,
            totp_bypass: Some(TotpBypass {
                secret: TEST_TOTP_SECRET.to_string(),
                code: TEST_TOTP_CODE.to_string(),
            }),
            ..Default::default()
        }
    }

    /// Whether removals physically delete rows
    pub fn hard_delete_enabled(&self) -> bool {
        matches!(self.environment, Environment::Test)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_production() {
        let config = AuthConfig::default();
        assert_eq!(config.environment, Environment::Production);
        assert!(config.totp_bypass.is_none());
        assert!(!config.hard_delete_enabled());
    }

    #[test]
    fn test_test_config() {
        let config = AuthConfig::test();
        assert!(config.hard_delete_enabled());
        let bypass = config.totp_bypass.unwrap();
        assert_eq!(bypass.secret, TEST_TOTP_SECRET);
        assert_eq!(bypass.code, TEST_TOTP_CODE);
    }
}
