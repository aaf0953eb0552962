// Lua pattern matching, byte-oriented and zero-AST
//
// Modeled after C Lua's lstrlib.c. Operates on `&[u8]`; every byte is a
// "character" and classification is ASCII-only.
//
// 1. No parse phase, the pattern is interpreted directly during matching
// 2. Fixed-size capture array (32 slots), no heap allocation while matching
// 3. Recursion is bounded by a configurable budget

mod class;
mod engine;

pub use class::{match_class, single_match};
pub use engine::{
    CaptureResults, CaptureValue, GMatch, GMatchState, MatchInfo, MatchState, Replacement, find,
    gsub, is_plain_pattern, normalize_init, str_match,
};
