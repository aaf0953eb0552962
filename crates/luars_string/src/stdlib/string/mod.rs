// String library
// Implements: byte, char, find, format, gfind, gmatch, gsub, len, lower,
// match, pack, packsize, rep, reverse, sub, unpack, upper
pub mod pack;
pub mod pattern;
pub mod string_format;

use crate::lib_registry::{LibraryModule, StringLib};
use crate::lua_value::LuaValue;
use crate::lua_vm::lua_args::LuaArgs;
use crate::lua_vm::{LuaError, LuaResult};
use pattern::{GMatchState, MatchInfo, Replacement};
use std::cell::RefCell;
use std::rc::Rc;

pub use string_format::lua_number_to_str;

pub fn create_string_lib() -> LibraryModule {
    crate::lib_module!("string", {
        "byte" => string_byte,
        "char" => string_char,
        "find" => string_find,
        "format" => string_format,
        "gfind" => string_gfind,
        "gmatch" => string_gmatch,
        "gsub" => string_gsub,
        "len" => string_len,
        "lower" => string_lower,
        "match" => string_match,
        "pack" => string_pack,
        "packsize" => string_packsize,
        "rep" => string_rep,
        "reverse" => string_reverse,
        "sub" => string_sub,
        "unpack" => string_unpack,
        "upper" => string_upper,
    })
}

/// Relative string position: negative counts from the end, clamped at 0
#[inline]
fn posrelat(pos: i64, len: usize) -> i64 {
    let len = len as i64;
    if pos >= 0 {
        pos
    } else if pos.unsigned_abs() > len as u64 {
        0
    } else {
        len + pos + 1
    }
}

/// Clamp a 1-based inclusive `[i, j]` range to the string, as 0-based `start..end`
#[inline]
fn byte_range(len: usize, i: i64, j: i64) -> Option<(usize, usize)> {
    let start = posrelat(i, len).max(1);
    let end = posrelat(j, len).min(len as i64);
    (start <= end).then(|| ((start - 1) as usize, end as usize))
}

/// string.byte(s [, i [, j]]) - Return byte values
fn string_byte(_lib: &StringLib, args: &[LuaValue]) -> LuaResult<Vec<LuaValue>> {
    let a = LuaArgs::new("byte", args);
    let s = a.check_string(1)?;
    let i = a.opt_integer(2, 1)?;
    let j = a.opt_integer(3, i)?;

    Ok(match byte_range(s.len(), i, j) {
        Some((start, end)) => s[start..end]
            .iter()
            .map(|&b| LuaValue::integer(b as i64))
            .collect(),
        None => Vec::new(),
    })
}

/// string.char(...) - Convert bytes to string
fn string_char(_lib: &StringLib, args: &[LuaValue]) -> LuaResult<Vec<LuaValue>> {
    let a = LuaArgs::new("char", args);
    let mut bytes = Vec::with_capacity(args.len());
    for pos in 1..=args.len() {
        let byte = a.check_integer(pos)?;
        let byte = u8::try_from(byte).map_err(|_| a.arg_error(pos, "value out of range"))?;
        bytes.push(byte);
    }
    Ok(vec![LuaValue::string(bytes)])
}

/// string.len(s) - Return string length in bytes
fn string_len(_lib: &StringLib, args: &[LuaValue]) -> LuaResult<Vec<LuaValue>> {
    let s = LuaArgs::new("len", args).check_string(1)?;
    Ok(vec![LuaValue::integer(s.len() as i64)])
}

/// string.lower(s) - ASCII lower case, other bytes unchanged
fn string_lower(_lib: &StringLib, args: &[LuaValue]) -> LuaResult<Vec<LuaValue>> {
    let s = LuaArgs::new("lower", args).check_string(1)?;
    Ok(vec![LuaValue::string(s.to_ascii_lowercase())])
}

/// string.upper(s) - ASCII upper case, other bytes unchanged
fn string_upper(_lib: &StringLib, args: &[LuaValue]) -> LuaResult<Vec<LuaValue>> {
    let s = LuaArgs::new("upper", args).check_string(1)?;
    Ok(vec![LuaValue::string(s.to_ascii_uppercase())])
}

/// string.rep(s, n [, sep]) - Repeat string n times, separated by sep
fn string_rep(lib: &StringLib, args: &[LuaValue]) -> LuaResult<Vec<LuaValue>> {
    let a = LuaArgs::new("rep", args);
    let s = a.check_string(1)?;
    let n = a.check_integer(2)?;
    let sep = a.opt_string(3, b"")?;

    if n <= 0 || (s.is_empty() && sep.is_empty()) {
        return Ok(vec![LuaValue::string(b"")]);
    }
    let n = n as u64;
    let total = (s.len() as u64)
        .checked_mul(n)
        .and_then(|t| t.checked_add((sep.len() as u64).checked_mul(n - 1)?))
        .filter(|&t| t <= lib.option().max_string_size as u64)
        .ok_or_else(|| LuaError::runtime("resulting string too large"))?;

    let mut result = Vec::with_capacity(total as usize);
    for k in 0..n {
        if k > 0 {
            result.extend_from_slice(&sep);
        }
        result.extend_from_slice(&s);
    }
    Ok(vec![LuaValue::string(result)])
}

/// string.reverse(s) - Reverse the bytes of s
fn string_reverse(_lib: &StringLib, args: &[LuaValue]) -> LuaResult<Vec<LuaValue>> {
    let s = LuaArgs::new("reverse", args).check_string(1)?;
    let mut bytes = s.into_owned();
    bytes.reverse();
    Ok(vec![LuaValue::string(bytes)])
}

/// string.sub(s, i [, j]) - Substring, 1-based inclusive, negative from the end
fn string_sub(_lib: &StringLib, args: &[LuaValue]) -> LuaResult<Vec<LuaValue>> {
    let a = LuaArgs::new("sub", args);
    let s = a.check_string(1)?;
    let i = a.opt_integer(2, 1)?;
    let j = a.opt_integer(3, -1)?;

    let sub = match byte_range(s.len(), i, j) {
        Some((start, end)) => &s[start..end],
        None => &[][..],
    };
    Ok(vec![LuaValue::string(sub)])
}

/// `start, end` (1-based, inclusive) followed by the captures
fn positions_and_captures(src: &[u8], m: &MatchInfo) -> Vec<LuaValue> {
    let mut results = Vec::with_capacity(2 + m.captures.len());
    results.push(LuaValue::integer(m.start as i64 + 1));
    results.push(LuaValue::integer(m.end as i64));
    results.extend(m.captures.iter().map(|c| c.to_value(src)));
    results
}

/// string.find(s, pattern [, init [, plain]])
fn string_find(lib: &StringLib, args: &[LuaValue]) -> LuaResult<Vec<LuaValue>> {
    let a = LuaArgs::new("find", args);
    let s = a.check_string(1)?;
    let pat = a.check_string(2)?;
    let init = pattern::normalize_init(a.opt_integer(3, 1)?, s.len());
    let plain = a.to_boolean(4);

    match pattern::find(&s, &pat, init, plain, lib.option().max_match_depth)? {
        Some(m) => Ok(positions_and_captures(&s, &m)),
        None => Ok(vec![LuaValue::nil()]),
    }
}

/// string.match(s, pattern [, init])
fn string_match(lib: &StringLib, args: &[LuaValue]) -> LuaResult<Vec<LuaValue>> {
    let a = LuaArgs::new("match", args);
    let s = a.check_string(1)?;
    let pat = a.check_string(2)?;
    let init = pattern::normalize_init(a.opt_integer(3, 1)?, s.len());

    match pattern::str_match(&s, &pat, init, lib.option().max_match_depth)? {
        Some(m) => Ok(m.captures.to_values(&s)),
        None => Ok(vec![LuaValue::nil()]),
    }
}

/// Iterator function over the matches of `pat` in `src`. Each call yields
/// the next match; nil once the subject is exhausted.
fn match_iterator(lib: &StringLib, args: &[LuaValue], function: &'static str, positions: bool) -> LuaResult<Vec<LuaValue>> {
    let a = LuaArgs::new(function, args);
    let src: Rc<[u8]> = Rc::from(&*a.check_string(1)?);
    let pat: Rc<[u8]> = Rc::from(&*a.check_string(2)?);
    let init = pattern::normalize_init(a.opt_integer(3, 1)?, src.len());
    let max_depth = lib.option().max_match_depth;
    let state = RefCell::new(GMatchState::new(init, positions));

    let iter = LuaValue::function(move |_args: &[LuaValue]| {
        let next = state.borrow_mut().next_match(&src, &pat, max_depth)?;
        Ok(match next {
            Some(m) if positions => positions_and_captures(&src, &m),
            Some(m) => m.captures.to_values(&src),
            None => vec![LuaValue::nil()],
        })
    });
    Ok(vec![iter])
}

/// string.gmatch(s, pattern [, init]) - Returns an iterator function
fn string_gmatch(lib: &StringLib, args: &[LuaValue]) -> LuaResult<Vec<LuaValue>> {
    match_iterator(lib, args, "gmatch", false)
}

/// string.gfind(s, pattern [, init]) - Like gmatch, yielding `start, end, captures...`
fn string_gfind(lib: &StringLib, args: &[LuaValue]) -> LuaResult<Vec<LuaValue>> {
    match_iterator(lib, args, "gfind", true)
}

/// string.gsub(s, pattern, repl [, n])
fn string_gsub(lib: &StringLib, args: &[LuaValue]) -> LuaResult<Vec<LuaValue>> {
    let a = LuaArgs::new("gsub", args);
    let s = a.check_string(1)?;
    let pat = a.check_string(2)?;
    let max_n = a.opt_integer(4, s.len() as i64 + 1)?;
    let max = Some(usize::try_from(max_n).unwrap_or(0));
    let max_depth = lib.option().max_match_depth;

    let (result, count) = match a.get(3) {
        Some(v @ (LuaValue::String(_) | LuaValue::Integer(_) | LuaValue::Number(_))) => {
            let template = v.to_lua_string().unwrap_or_default();
            pattern::gsub(&s, &pat, &Replacement::Template(&template), max, max_depth)?
        }
        Some(LuaValue::Table(t)) => {
            let table = t.borrow();
            pattern::gsub(&s, &pat, &Replacement::Table(&table), max, max_depth)?
        }
        Some(LuaValue::Function(f)) => {
            pattern::gsub(&s, &pat, &Replacement::Function(&**f), max, max_depth)?
        }
        _ => return Err(a.type_error(3, "string/function/table")),
    };
    Ok(vec![
        LuaValue::string(result),
        LuaValue::integer(count as i64),
    ])
}

/// string.format(formatstring, ...)
fn string_format(lib: &StringLib, args: &[LuaValue]) -> LuaResult<Vec<LuaValue>> {
    let fmt = LuaArgs::new("format", args).check_string(1)?;
    let values = args.get(1..).unwrap_or_default();
    let out = string_format::format(&fmt, values, lib.option(), lib.number_formatter())?;
    Ok(vec![LuaValue::string(out)])
}

/// string.pack(fmt, v1, v2, ...)
fn string_pack(lib: &StringLib, args: &[LuaValue]) -> LuaResult<Vec<LuaValue>> {
    let fmt = LuaArgs::new("pack", args).check_string(1)?;
    let values = args.get(1..).unwrap_or_default();
    let out = pack::pack(&fmt, values, lib.text_codec())?;
    Ok(vec![LuaValue::string(out)])
}

/// string.unpack(fmt, s [, init]) - values followed by the next position
fn string_unpack(lib: &StringLib, args: &[LuaValue]) -> LuaResult<Vec<LuaValue>> {
    let a = LuaArgs::new("unpack", args);
    let fmt = a.check_string(1)?;
    let data = a.check_string(2)?;
    let init = a.opt_integer(3, 1)?;
    let (mut values, next) = pack::unpack(&fmt, &data, init, lib.text_codec())?;
    values.push(LuaValue::integer(next as i64));
    Ok(values)
}

/// string.packsize(fmt)
fn string_packsize(_lib: &StringLib, args: &[LuaValue]) -> LuaResult<Vec<LuaValue>> {
    let fmt = LuaArgs::new("packsize", args).check_string(1)?;
    Ok(vec![LuaValue::integer(pack::packsize(&fmt)? as i64)])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_posrelat() {
        assert_eq!(posrelat(3, 5), 3);
        assert_eq!(posrelat(-1, 5), 5);
        assert_eq!(posrelat(-5, 5), 1);
        assert_eq!(posrelat(-6, 5), 0);
    }

    #[test]
    fn test_byte_range() {
        assert_eq!(byte_range(5, 2, 4), Some((1, 4)));
        assert_eq!(byte_range(5, -3, -1), Some((2, 5)));
        assert_eq!(byte_range(5, 0, 10), Some((0, 5)));
        assert_eq!(byte_range(5, 4, 2), None);
        assert_eq!(byte_range(0, 1, -1), None);
    }
}
