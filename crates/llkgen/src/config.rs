#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};

/// Configuration for grammar construction
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct GrammarConfig {
    /// Longest arm description `alt_name` will embed before falling back to
    /// the bare arm number
    pub alt_name_max_len: usize,

    /// Report an error branch that is followed by further arms
    pub warn_error_branch_position: bool,

    /// Maximum lookahead (k) for rules that do not set their own
    pub default_k: usize,

    /// Treat rules whose name starts with an upper-case letter as token rules
    pub token_rule_prefix_upper: bool,
}

impl Default for GrammarConfig {
    fn default() -> Self {
        Self {
            alt_name_max_len: 40,
            warn_error_branch_position: true,
            default_k: 2,
            token_rule_prefix_upper: true,
        }
    }
}

impl GrammarConfig {
    #[must_use]
    pub const fn with_alt_name_max_len(mut self, len: usize) -> Self {
        self.alt_name_max_len = len;
        self
    }

    #[must_use]
    pub const fn with_warn_error_branch_position(mut self, warn: bool) -> Self {
        self.warn_error_branch_position = warn;
        self
    }

    #[must_use]
    pub const fn with_default_k(mut self, k: usize) -> Self {
        self.default_k = k;
        self
    }

    #[must_use]
    pub const fn with_token_rule_prefix_upper(mut self, enabled: bool) -> Self {
        self.token_rule_prefix_upper = enabled;
        self
    }
}
