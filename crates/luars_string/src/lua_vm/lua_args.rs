//! Argument checking for library entries, in the manner of `luaL_check*`.
//!
//! Positions are 1-based, as scripts see them.

use super::{LuaError, LuaResult};
use crate::lua_value::LuaValue;
use std::borrow::Cow;

/// Integer conversion of a value, Lua style: integers as-is, floats with an
/// exact integer value, numeric strings. The `Err` carries the reason used
/// in the argument error.
pub fn value_to_integer(v: &LuaValue) -> Result<i64, &'static str> {
    match v {
        LuaValue::Integer(i) => Ok(*i),
        LuaValue::Number(f) => float_to_integer(*f).ok_or("number has no integer representation"),
        LuaValue::String(s) => match str_to_number(s) {
            Some(LuaValue::Integer(i)) => Ok(i),
            Some(LuaValue::Number(f)) => {
                float_to_integer(f).ok_or("number has no integer representation")
            }
            _ => Err("number expected"),
        },
        _ => Err("number expected"),
    }
}

pub fn value_to_number(v: &LuaValue) -> Option<f64> {
    match v {
        LuaValue::Integer(i) => Some(*i as f64),
        LuaValue::Number(f) => Some(*f),
        LuaValue::String(s) => str_to_number(s).and_then(|n| n.as_number()),
        _ => None,
    }
}

#[inline]
fn float_to_integer(f: f64) -> Option<i64> {
    if f.fract() == 0.0 && f >= -(2f64.powi(63)) && f < 2f64.powi(63) {
        Some(f as i64)
    } else {
        None
    }
}

/// Parse a numeric string the way the host's lexer would: decimal or hex
/// integers, decimal floats, surrounding whitespace allowed.
pub fn str_to_number(s: &[u8]) -> Option<LuaValue> {
    let text = std::str::from_utf8(s).ok()?.trim();
    if text.is_empty() {
        return None;
    }
    let (neg, body) = match text.as_bytes()[0] {
        b'-' => (true, &text[1..]),
        b'+' => (false, &text[1..]),
        _ => (false, text),
    };
    if let Some(hex) = body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
        if hex.is_empty() || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        // hex integers wrap around, as in Lua
        let v = hex
            .bytes()
            .fold(0u64, |acc, b| acc.wrapping_mul(16).wrapping_add((b as char).to_digit(16).unwrap_or(0) as u64));
        let v = v as i64;
        return Some(LuaValue::Integer(if neg { v.wrapping_neg() } else { v }));
    }
    if let Ok(i) = text.parse::<i64>() {
        return Some(LuaValue::Integer(i));
    }
    if body.bytes().all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-')) {
        return text.parse::<f64>().ok().map(LuaValue::Number);
    }
    None
}

/// Value consumed by a data directive of `format` or `pack`.
/// `values[index]` is argument #`index + 2` of the call (the template is #1).
pub fn data_arg<'v>(function: &'static str, values: &'v [LuaValue], index: usize) -> LuaResult<&'v LuaValue> {
    values
        .get(index)
        .ok_or_else(|| LuaError::arg_error(function, index + 2, "no value"))
}

/// Integer coercion of a data directive value, with `luaL_checkinteger` messages
pub fn data_integer(function: &'static str, position: usize, value: &LuaValue) -> LuaResult<i64> {
    value_to_integer(value).map_err(|msg| {
        if msg == "number expected" {
            LuaError::arg_error(function, position, format!("number expected, got {}", value.type_name()))
        } else {
            LuaError::arg_error(function, position, msg)
        }
    })
}

pub fn data_number(function: &'static str, position: usize, value: &LuaValue) -> LuaResult<f64> {
    value_to_number(value).ok_or_else(|| {
        LuaError::arg_error(function, position, format!("number expected, got {}", value.type_name()))
    })
}

/// String coercion of a data directive value; numbers are converted
pub fn data_string(function: &'static str, position: usize, value: &LuaValue) -> LuaResult<Vec<u8>> {
    match value {
        LuaValue::String(_) | LuaValue::Integer(_) | LuaValue::Number(_) => {
            Ok(value.to_lua_string().unwrap_or_default())
        }
        _ => Err(LuaError::arg_error(
            function,
            position,
            format!("string expected, got {}", value.type_name()),
        )),
    }
}

/// Positional view over the arguments of one library call.
#[derive(Clone, Copy)]
pub struct LuaArgs<'a> {
    function: &'static str,
    args: &'a [LuaValue],
}

impl<'a> LuaArgs<'a> {
    pub fn new(function: &'static str, args: &'a [LuaValue]) -> Self {
        Self { function, args }
    }

    /// Argument at 1-based `pos`, `None` when absent.
    #[inline]
    pub fn get(&self, pos: usize) -> Option<&'a LuaValue> {
        pos.checked_sub(1).and_then(|i| self.args.get(i))
    }

    /// Argument at `pos` treating `nil` as absent.
    #[inline]
    fn get_non_nil(&self, pos: usize) -> Option<&'a LuaValue> {
        self.get(pos).filter(|v| !v.is_nil())
    }

    pub fn arg_error(&self, pos: usize, message: impl Into<String>) -> LuaError {
        LuaError::arg_error(self.function, pos, message)
    }

    pub fn type_error(&self, pos: usize, expected: &str) -> LuaError {
        let got = match self.get(pos) {
            Some(v) => v.type_name(),
            None => "no value",
        };
        self.arg_error(pos, format!("{} expected, got {}", expected, got))
    }

    /// String argument; numbers are converted.
    pub fn check_string(&self, pos: usize) -> LuaResult<Cow<'a, [u8]>> {
        match self.get(pos) {
            Some(LuaValue::String(s)) => Ok(Cow::Borrowed(&s[..])),
            Some(v @ (LuaValue::Integer(_) | LuaValue::Number(_))) => {
                Ok(Cow::Owned(v.to_lua_string().unwrap_or_default()))
            }
            _ => Err(self.type_error(pos, "string")),
        }
    }

    pub fn opt_string(&self, pos: usize, default: &'a [u8]) -> LuaResult<Cow<'a, [u8]>> {
        match self.get_non_nil(pos) {
            Some(_) => self.check_string(pos),
            None => Ok(Cow::Borrowed(default)),
        }
    }

    pub fn check_integer(&self, pos: usize) -> LuaResult<i64> {
        let Some(v) = self.get(pos) else {
            return Err(self.type_error(pos, "number"));
        };
        value_to_integer(v).map_err(|msg| {
            if msg == "number expected" {
                self.type_error(pos, "number")
            } else {
                self.arg_error(pos, msg)
            }
        })
    }

    pub fn opt_integer(&self, pos: usize, default: i64) -> LuaResult<i64> {
        match self.get_non_nil(pos) {
            Some(_) => self.check_integer(pos),
            None => Ok(default),
        }
    }

    /// Truthiness of an optional argument; absent counts as `false`.
    #[inline]
    pub fn to_boolean(&self, pos: usize) -> bool {
        self.get(pos).is_some_and(|v| v.is_truthy())
    }
}
