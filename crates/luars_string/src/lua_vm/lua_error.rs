/// Error raised by a string library call.
///
/// Every variant is fatal to the call that produced it: no partial result is
/// returned and nothing is retried. `Display` yields the exact message text
/// scripts see, so callers can key off it.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LuaError {
    /// Argument at `position` of `function` has the wrong type or value
    #[error("bad argument #{position} to '{function}' ({message})")]
    ArgumentType {
        function: &'static str,
        position: usize,
        message: String,
    },
    /// Malformed pattern: bad bracket class, dangling '%', missing operands
    #[error("{0}")]
    PatternSyntax(String),
    /// Capture overflow, unclosed capture read, invalid capture index
    #[error("{0}")]
    Capture(String),
    /// Matcher recursion budget exhausted
    #[error("pattern too complex")]
    ComplexityLimit,
    /// Bad format directive or replacement template
    #[error("{0}")]
    FormatSyntax(String),
    /// Pack/unpack failure: stream exhaustion, oversized length prefix
    #[error("{0}")]
    Codec(String),
    /// Error raised by host code (replacement callbacks), passed through as-is
    #[error("{0}")]
    Runtime(String),
}

impl LuaError {
    #[inline]
    pub fn arg_error(function: &'static str, position: usize, message: impl Into<String>) -> Self {
        LuaError::ArgumentType {
            function,
            position,
            message: message.into(),
        }
    }

    #[inline]
    pub fn runtime(message: impl Into<String>) -> Self {
        LuaError::Runtime(message.into())
    }
}

pub type LuaResult<T> = Result<T, LuaError>;
