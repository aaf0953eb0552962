// Character classes for Lua patterns
// %a, %c, %d, %g, %l, %p, %s, %u, %w, %x, %z and their upper-case complements,
// plus [set] matching. Byte-oriented: only ASCII bytes belong to a class.

use crate::lua_vm::{LuaError, LuaResult};

pub const L_ESC: u8 = b'%';

const MASK_ALPHA: u8 = 0x01;
const MASK_LOWERCASE: u8 = 0x02;
const MASK_UPPERCASE: u8 = 0x04;
const MASK_DIGIT: u8 = 0x08;
const MASK_PUNCT: u8 = 0x10;
const MASK_SPACE: u8 = 0x20;
const MASK_CONTROL: u8 = 0x40;
const MASK_HEXDIGIT: u8 = 0x80;

/// One class bitmask per byte value, built at compile time.
pub static CHAR_TABLE: [u8; 256] = build_char_table();

const fn build_char_table() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 128 {
        let c = i as u8;
        let mut mask = 0u8;
        if c.is_ascii_digit() {
            mask |= MASK_DIGIT | MASK_HEXDIGIT;
        }
        if c.is_ascii_lowercase() {
            mask |= MASK_LOWERCASE | MASK_ALPHA;
        }
        if c.is_ascii_uppercase() {
            mask |= MASK_UPPERCASE | MASK_ALPHA;
        }
        if matches!(c, b'a'..=b'f' | b'A'..=b'F') {
            mask |= MASK_HEXDIGIT;
        }
        if c.is_ascii_punctuation() {
            mask |= MASK_PUNCT;
        }
        if c < b' ' || c == 0x7f {
            mask |= MASK_CONTROL;
        }
        if matches!(c, b' ' | b'\t' | b'\n' | 0x0b | 0x0c | b'\r') {
            mask |= MASK_SPACE;
        }
        table[i] = mask;
        i += 1;
    }
    table
}

/// Check if byte `c` matches the class letter `cl` (`a`, `D`, ...).
/// Upper-case letters select the complement; any other byte matches itself.
#[inline(always)]
pub fn match_class(c: u8, cl: u8) -> bool {
    let data = CHAR_TABLE[c as usize];
    let res = match cl.to_ascii_lowercase() {
        b'a' => data & MASK_ALPHA != 0,
        b'c' => data & MASK_CONTROL != 0,
        b'd' => data & MASK_DIGIT != 0,
        b'g' => data & (MASK_ALPHA | MASK_DIGIT | MASK_PUNCT) != 0,
        b'l' => data & MASK_LOWERCASE != 0,
        b'p' => data & MASK_PUNCT != 0,
        b's' => data & MASK_SPACE != 0,
        b'u' => data & MASK_UPPERCASE != 0,
        b'w' => data & (MASK_ALPHA | MASK_DIGIT) != 0,
        b'x' => data & MASK_HEXDIGIT != 0,
        b'z' => c == 0,
        _ => return cl == c,
    };
    if cl.is_ascii_lowercase() { res } else { !res }
}

/// Return the pattern index just past the single item at `pat[pp]`
/// (past `[set]`, `%x` or a plain byte). Repetition suffixes are not consumed.
pub fn class_end(pat: &[u8], pp: usize) -> LuaResult<usize> {
    let mut p = pp + 1;
    match pat[pp] {
        L_ESC => {
            if p >= pat.len() {
                return Err(LuaError::PatternSyntax(
                    "malformed pattern (ends with '%')".to_string(),
                ));
            }
            Ok(p + 1)
        }
        b'[' => {
            if p < pat.len() && pat[p] == b'^' {
                p += 1;
            }
            // the first member is taken as-is, so "[]]" and "[^]]" hold a literal ']'
            loop {
                if p >= pat.len() {
                    return Err(LuaError::PatternSyntax(
                        "malformed pattern (missing ']')".to_string(),
                    ));
                }
                let c = pat[p];
                p += 1;
                if c == L_ESC && p < pat.len() {
                    p += 1;
                }
                if p < pat.len() && pat[p] == b']' {
                    return Ok(p + 1);
                }
            }
        }
        _ => Ok(p),
    }
}

/// Match byte `c` against the set `pat[pp..=ec]`, where `pat[pp]` is `[` and
/// `pat[ec]` is the closing `]`.
pub fn match_bracket_class(c: u8, pat: &[u8], mut pp: usize, ec: usize) -> bool {
    let mut sig = true;
    if pat[pp + 1] == b'^' {
        sig = false;
        pp += 1;
    }
    pp += 1;
    while pp < ec {
        if pat[pp] == L_ESC {
            pp += 1;
            if pp < ec && match_class(c, pat[pp]) {
                return sig;
            }
        } else if pp + 2 < ec && pat[pp + 1] == b'-' {
            if pat[pp] <= c && c <= pat[pp + 2] {
                return sig;
            }
            pp += 2;
        } else if pat[pp] == c {
            return sig;
        }
        pp += 1;
    }
    !sig
}

/// Match byte `c` against the single item `pat[pp..ep]`.
#[inline]
pub fn single_match(c: u8, pat: &[u8], pp: usize, ep: usize) -> bool {
    match pat[pp] {
        b'.' => true,
        L_ESC => match_class(c, pat[pp + 1]),
        b'[' => match_bracket_class(c, pat, pp, ep - 1),
        lit => lit == c,
    }
}
