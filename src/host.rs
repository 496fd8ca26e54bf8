/// Host-provided credential capability. The application only asks whether
/// a usable credential exists and reads it; selection happens through the
/// key dialog, which hands the result to the studio client.
pub trait CredentialHost: Send + Sync {
    fn credential(&self) -> Option<String>;

    fn has_credential(&self) -> bool {
        self.credential().is_some()
    }
}

/// Reads the credential from the process environment.
pub struct EnvCredentialHost {
    var: &'static str,
}

impl EnvCredentialHost {
    pub const DEFAULT_VAR: &'static str = "GEMINI_API_KEY";

    pub fn new() -> Self {
        Self {
            var: Self::DEFAULT_VAR,
        }
    }
}

impl Default for EnvCredentialHost {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialHost for EnvCredentialHost {
    fn credential(&self) -> Option<String> {
        match std::env::var(self.var) {
            Ok(value) if !value.trim().is_empty() => Some(value),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_environment_value_counts_as_missing() {
        let host = EnvCredentialHost {
            var: "MAISON_TEST_BLANK_KEY",
        };
        std::env::set_var("MAISON_TEST_BLANK_KEY", "   ");
        assert!(!host.has_credential());
        std::env::remove_var("MAISON_TEST_BLANK_KEY");
    }

    #[test]
    fn present_environment_value_is_returned() {
        let host = EnvCredentialHost {
            var: "MAISON_TEST_SET_KEY",
        };
        std::env::set_var("MAISON_TEST_SET_KEY", "abc123");
        assert_eq!(host.credential().as_deref(), Some("abc123"));
        std::env::remove_var("MAISON_TEST_SET_KEY");
    }
}
