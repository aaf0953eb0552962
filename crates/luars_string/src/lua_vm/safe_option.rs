use super::lua_limits::{FORMAT_LONG_STRING, MAX_STRING_SIZE, MAXCCALLS_PATTERN};

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct StringLibOption {
    /// Recursion budget of one pattern match attempt. Running out raises
    /// "pattern too complex".
    pub max_match_depth: usize,
    /// Largest string `rep` may build
    pub max_string_size: usize,
    pub long_string_threshold: usize,
}

impl Default for StringLibOption {
    fn default() -> Self {
        Self {
            max_match_depth: MAXCCALLS_PATTERN,
            max_string_size: MAX_STRING_SIZE,
            long_string_threshold: FORMAT_LONG_STRING,
        }
    }
}
