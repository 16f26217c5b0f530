//! Password strength policy.

use catalog_config::PasswordPolicyConfig;

const MAX_LENGTH: usize = 128;

/// Checks passwords against the configured strength rules.
#[derive(Debug, Clone)]
pub struct PasswordPolicy {
    config: PasswordPolicyConfig,
}

impl PasswordPolicy {
    #[must_use]
    pub const fn new(config: PasswordPolicyConfig) -> Self {
        Self { config }
    }

    /// Returns one message per violated rule.
    pub fn check(&self, password: &str) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        let length = password.chars().count();

        if length < self.config.min_length {
            errors.push(format!(
                "Password must be at least {} characters long",
                self.config.min_length
            ));
        }
        if length > MAX_LENGTH {
            errors.push(format!("Password must be at most {MAX_LENGTH} characters long"));
        }
        if self.config.require_uppercase && !password.chars().any(char::is_uppercase) {
            errors.push("Password must contain at least one uppercase letter".to_string());
        }
        if self.config.require_lowercase && !password.chars().any(char::is_lowercase) {
            errors.push("Password must contain at least one lowercase letter".to_string());
        }
        if self.config.require_digit && !password.chars().any(|c| c.is_ascii_digit()) {
            errors.push("Password must contain at least one digit".to_string());
        }
        if self.config.require_special && !password.chars().any(|c| !c.is_alphanumeric() && !c.is_whitespace()) {
            errors.push("Password must contain at least one special character".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self::new(PasswordPolicyConfig::default())
    }
}
