//! Normalised finding record

use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder rendered for fields a tool did not provide
pub const UNKNOWN: &str = "unknown";

/// One issue extracted from a result file
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Finding {
    pub tool: String,
    pub rule_id: Option<String>,
    pub level: Option<String>,
    pub message: String,
    pub path: Option<String>,
    pub line: Option<u64>,
}

impl Finding {
    pub fn level_or_unknown(&self) -> &str {
        self.level.as_deref().unwrap_or(UNKNOWN)
    }

    pub fn rule_or_unknown(&self) -> &str {
        self.rule_id.as_deref().unwrap_or(UNKNOWN)
    }

    pub fn path_or_unknown(&self) -> &str {
        self.path.as_deref().unwrap_or(UNKNOWN)
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] Rule {}: {} At {} , Line ",
            self.level_or_unknown(),
            self.rule_or_unknown(),
            self.message,
            self.path_or_unknown()
        )?;
        match self.line {
            Some(line) => write!(f, "{}", line),
            None => f.write_str(UNKNOWN),
        }
    }
}
