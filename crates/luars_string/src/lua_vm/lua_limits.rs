//! Centralized limits for the string library.
//!
//! Mirrors the constants of Lua's `lstrlib.c` / `luaconf.h`.

// ===== Pattern Matching =====

/// Maximum number of captures in a single pattern.
/// Matches Lua's LUA_MAXCAPTURES.
pub const LUA_MAXCAPTURES: usize = 32;

/// Default recursion budget of the pattern matcher.
/// Matches Lua's MAXCCALLS.
pub const MAXCCALLS_PATTERN: usize = 200;

/// Bytes that make a pattern "special". A pattern without any of them is
/// searched as a plain substring.
pub const SPECIALS: &[u8] = b"^$*+?.([%-";

// ===== String Library =====

/// Maximum string size (1 GB).
pub const MAX_STRING_SIZE: usize = 1 << 30;

/// `%s` arguments at least this long are appended untouched when no precision
/// is given.
pub const FORMAT_LONG_STRING: usize = 100;

/// Allowed format flags, in the order C lists them.
pub const FORMAT_FLAGS: &[u8] = b"-+ #0";

/// Maximum number of flags in one format directive.
pub const MAX_FORMAT_FLAGS: usize = 5;

// ===== Pack =====

/// Default size in bytes of the length prefix of an `s` pack option.
pub const DEFAULT_PACK_PREFIX: usize = 4;

/// Largest length prefix an `s` pack option accepts.
pub const MAX_PACK_PREFIX: usize = 16;

/// Widest integer a pack length prefix can carry.
pub const MAX_PACK_INT_SIZE: usize = 8;
