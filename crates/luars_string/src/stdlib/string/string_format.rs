// string.format: printf-style directive parser and renderer
//
// Bytes in, bytes out. Each directive is scanned with an explicit cursor into
// a `FormatSpec`, then rendered by conversion kind. Float conversions go
// through the `NumberFormatter` hook so hosts can substitute their own.

use crate::lua_value::LuaValue;
use crate::lua_vm::lua_args::{data_arg, data_integer, data_number};
use crate::lua_vm::lua_limits::{FORMAT_FLAGS, MAX_FORMAT_FLAGS};
use crate::lua_vm::{LuaError, LuaResult, StringLibOption};

const L_ESC: u8 = b'%';

/// One parsed `%` directive
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FormatSpec {
    pub left_adjust: bool,
    pub zero_pad: bool,
    pub explicit_plus: bool,
    pub space: bool,
    pub alternate: bool,
    pub width: Option<usize>,
    pub precision: Option<usize>,
    pub conversion: u8,
}

impl FormatSpec {
    /// Scan the directive starting right after its `%`.
    /// Returns the spec and the offset just past the conversion byte.
    pub fn parse(fmt: &[u8], start: usize) -> LuaResult<(FormatSpec, usize)> {
        let mut spec = FormatSpec::default();
        let mut p = start;

        while p < fmt.len() && FORMAT_FLAGS.contains(&fmt[p]) {
            match fmt[p] {
                b'-' => spec.left_adjust = true,
                b'+' => spec.explicit_plus = true,
                b' ' => spec.space = true,
                b'#' => spec.alternate = true,
                _ => spec.zero_pad = true,
            }
            p += 1;
        }
        if p - start > MAX_FORMAT_FLAGS {
            return Err(LuaError::FormatSyntax(
                "invalid format (repeated flags)".to_string(),
            ));
        }

        spec.width = scan_two_digits(fmt, &mut p);
        if fmt.get(p) == Some(&b'.') {
            p += 1;
            // a bare '.' means precision 0
            spec.precision = Some(scan_two_digits(fmt, &mut p).unwrap_or(0));
        }
        if fmt.get(p).is_some_and(u8::is_ascii_digit) {
            return Err(LuaError::FormatSyntax(
                "invalid format (width or precision too long)".to_string(),
            ));
        }

        let Some(&conversion) = fmt.get(p) else {
            return Err(LuaError::FormatSyntax(format!(
                "invalid conversion '%{}' to 'format'",
                String::from_utf8_lossy(&fmt[start..])
            )));
        };
        spec.zero_pad &= !spec.left_adjust; // '-' overrides '0'
        spec.conversion = conversion;
        Ok((spec, p + 1))
    }

    /// Write `body` padded with spaces up to the field width
    fn pad_spaces(&self, out: &mut Vec<u8>, body: &[u8]) {
        let fill = self.width.unwrap_or(0).saturating_sub(body.len());
        if !self.left_adjust {
            out.resize(out.len() + fill, b' ');
        }
        out.extend_from_slice(body);
        if self.left_adjust {
            out.resize(out.len() + fill, b' ');
        }
    }
}

#[inline]
fn scan_two_digits(fmt: &[u8], p: &mut usize) -> Option<usize> {
    let mut value = None;
    for _ in 0..2 {
        match fmt.get(*p) {
            Some(&d) if d.is_ascii_digit() => {
                value = Some(value.unwrap_or(0) * 10 + (d - b'0') as usize);
                *p += 1;
            }
            _ => break,
        }
    }
    value
}

/// Renders the float conversions `e E f g G`.
///
/// The library ships [`CFloatFormatter`]; a host with its own number
/// printing can install another through `StringLib::with_number_formatter`.
pub trait NumberFormatter {
    fn format_float(&self, spec: &FormatSpec, value: f64, out: &mut Vec<u8>);
}

/// C `printf` float rendering: default precision 6, exponents of at least two
/// digits, `%g` trailing-zero trimming unless `#`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CFloatFormatter;

impl NumberFormatter for CFloatFormatter {
    fn format_float(&self, spec: &FormatSpec, value: f64, out: &mut Vec<u8>) {
        let upper = spec.conversion.is_ascii_uppercase();
        let mut body = Vec::with_capacity(24);
        if value.is_sign_negative() {
            body.push(b'-');
        } else if spec.explicit_plus {
            body.push(b'+');
        } else if spec.space {
            body.push(b' ');
        }
        let sign_len = body.len();

        if !value.is_finite() {
            let text: &[u8] = match (value.is_nan(), upper) {
                (true, false) => b"nan",
                (true, true) => b"NAN",
                (false, false) => b"inf",
                (false, true) => b"INF",
            };
            body.extend_from_slice(text);
            spec.pad_spaces(out, &body);
            return;
        }

        let digits = render_finite(spec, value.abs());
        if upper {
            body.extend(digits.bytes().map(|b| b.to_ascii_uppercase()));
        } else {
            body.extend_from_slice(digits.as_bytes());
        }

        let width = spec.width.unwrap_or(0);
        if spec.zero_pad && width > body.len() {
            let zeros = width - body.len();
            out.extend_from_slice(&body[..sign_len]);
            out.resize(out.len() + zeros, b'0');
            out.extend_from_slice(&body[sign_len..]);
        } else {
            spec.pad_spaces(out, &body);
        }
    }
}

/// Digits of a non-negative finite value (no sign)
fn render_finite(spec: &FormatSpec, value: f64) -> String {
    let precision = spec.precision.unwrap_or(6);
    match spec.conversion.to_ascii_lowercase() {
        b'e' => {
            let mut s = exp_notation(value, precision);
            if spec.alternate && precision == 0 {
                insert_point_before_exponent(&mut s);
            }
            s
        }
        b'f' => {
            let mut s = format!("{:.*}", precision, value);
            if spec.alternate && precision == 0 {
                s.push('.');
            }
            s
        }
        _ => {
            let p = precision.max(1);
            // exponent the value has once rounded to p significant digits
            let probe = exp_notation(value, p - 1);
            let exp = probe
                .rsplit('e')
                .next()
                .and_then(|e| e.parse::<i32>().ok())
                .unwrap_or(0);
            let mut s = if exp < -4 || exp >= p as i32 {
                probe
            } else {
                format!("{:.*}", (p as i32 - 1 - exp) as usize, value)
            };
            if !spec.alternate {
                trim_fraction_zeros(&mut s);
            } else if !s.contains('.') {
                insert_point_before_exponent(&mut s);
            }
            s
        }
    }
}

/// `d.ddde+XX` form, C style exponent
fn exp_notation(value: f64, precision: usize) -> String {
    let raw = format!("{:.*e}", precision, value);
    let (mantissa, exp) = raw.split_once('e').unwrap_or((&raw, "0"));
    let exp: i32 = exp.parse().unwrap_or(0);
    let sign = if exp < 0 { '-' } else { '+' };
    format!("{}e{}{:02}", mantissa, sign, exp.unsigned_abs())
}

fn insert_point_before_exponent(s: &mut String) {
    match s.find('e') {
        Some(pos) => s.insert(pos, '.'),
        None => s.push('.'),
    }
}

/// Drop trailing zeros of the fraction (and a dangling point)
fn trim_fraction_zeros(s: &mut String) {
    let exp_at = s.find('e').unwrap_or(s.len());
    let (mantissa, exponent) = s.split_at(exp_at);
    if !mantissa.contains('.') {
        return;
    }
    let trimmed = mantissa.trim_end_matches('0').trim_end_matches('.');
    *s = format!("{}{}", trimmed, exponent);
}

/// Host rendering of a float: `%.14g`, plus `.0` when the result would
/// otherwise read as an integer.
pub fn lua_number_to_str(n: f64) -> String {
    let spec = FormatSpec {
        precision: Some(14),
        conversion: b'g',
        ..FormatSpec::default()
    };
    let mut out = Vec::with_capacity(24);
    CFloatFormatter.format_float(&spec, n, &mut out);
    if out.iter().all(|&b| b.is_ascii_digit() || b == b'-') {
        out.extend_from_slice(b".0");
    }
    String::from_utf8(out).unwrap_or_default()
}

/// Integer conversions `d i o u x X`
fn format_integer(spec: &FormatSpec, value: i64, out: &mut Vec<u8>) {
    let signed = matches!(spec.conversion, b'd' | b'i');
    let bits = value as u64;
    let digits = if value == 0 && spec.precision == Some(0) {
        String::new()
    } else {
        match spec.conversion {
            b'o' => format!("{:o}", bits),
            b'x' => format!("{:x}", bits),
            b'X' => format!("{:X}", bits),
            b'u' => itoa::Buffer::new().format(bits).to_string(),
            _ => itoa::Buffer::new().format(value.unsigned_abs()).to_string(),
        }
    };

    let sign: &[u8] = if signed && value < 0 {
        b"-"
    } else if signed && spec.explicit_plus {
        b"+"
    } else if signed && spec.space {
        b" "
    } else {
        b""
    };
    let prefix: &[u8] = match spec.conversion {
        b'x' if spec.alternate && value != 0 => b"0x",
        b'X' if spec.alternate && value != 0 => b"0X",
        _ => b"",
    };

    let ndigits = digits.len();
    let width = spec.width.unwrap_or(0);
    let mut nzeros = match spec.precision {
        Some(p) if p > ndigits => p - ndigits,
        None if spec.zero_pad && width > sign.len() + prefix.len() + ndigits => {
            width - sign.len() - prefix.len() - ndigits
        }
        _ => 0,
    };
    if spec.conversion == b'o' && spec.alternate && nzeros == 0 && !digits.starts_with('0') {
        nzeros = 1;
    }
    let body_len = sign.len() + prefix.len() + nzeros + ndigits;
    let nspaces = width.saturating_sub(body_len);

    if !spec.left_adjust {
        out.resize(out.len() + nspaces, b' ');
    }
    out.extend_from_slice(sign);
    out.extend_from_slice(prefix);
    out.resize(out.len() + nzeros, b'0');
    out.extend_from_slice(digits.as_bytes());
    if spec.left_adjust {
        out.resize(out.len() + nspaces, b' ');
    }
}

/// `%q`: a string literal the host lexer reads back to the same bytes
pub fn add_quoted(out: &mut Vec<u8>, s: &[u8]) {
    out.push(b'"');
    for (i, &c) in s.iter().enumerate() {
        match c {
            b'"' | b'\\' | b'\n' => {
                out.push(b'\\');
                out.push(c);
            }
            _ if c <= 0x1f || c == 0x7f => {
                out.push(b'\\');
                if s.get(i + 1).is_some_and(u8::is_ascii_digit) {
                    // keep the escape from swallowing the next digit
                    out.extend_from_slice(format!("{:03}", c).as_bytes());
                } else {
                    out.extend_from_slice(itoa::Buffer::new().format(c).as_bytes());
                }
            }
            _ => out.push(c),
        }
    }
    out.push(b'"');
}

/// `%s`: long strings without precision pass through untouched; otherwise
/// the text stops at the first zero byte, then precision and width apply.
fn format_string(spec: &FormatSpec, s: &[u8], long_threshold: usize, out: &mut Vec<u8>) {
    if spec.precision.is_none() && s.len() >= long_threshold {
        out.extend_from_slice(s);
        return;
    }
    let mut body = match s.iter().position(|&b| b == 0) {
        Some(nul) => &s[..nul],
        None => s,
    };
    if let Some(p) = spec.precision {
        body = &body[..p.min(body.len())];
    }
    spec.pad_spaces(out, body);
}

/// Render `fmt` against `values`. `values[0]` is argument #2 of the call.
pub fn format(
    fmt: &[u8],
    values: &[LuaValue],
    option: &StringLibOption,
    formatter: &dyn NumberFormatter,
) -> LuaResult<Vec<u8>> {
    let mut out = Vec::with_capacity(fmt.len() + fmt.len() / 2);
    let mut arg = 0usize;
    let mut i = 0usize;

    while i < fmt.len() {
        let c = fmt[i];
        i += 1;
        if c != L_ESC {
            out.push(c);
            continue;
        }
        if fmt.get(i) == Some(&L_ESC) {
            out.push(L_ESC);
            i += 1;
            continue;
        }

        let (spec, next) = FormatSpec::parse(fmt, i)?;
        i = next;
        let position = arg + 2;
        if !b"cdiouxXeEfgGqs".contains(&spec.conversion) {
            return Err(LuaError::FormatSyntax(format!(
                "invalid option '%{}' to 'format'",
                spec.conversion as char
            )));
        }
        let value = data_arg("format", values, arg)?;
        arg += 1;

        match spec.conversion {
            b'c' => {
                let byte = data_integer("format", position, value)? as u8;
                spec.pad_spaces(&mut out, &[byte]);
            }
            b'd' | b'i' | b'o' | b'u' | b'x' | b'X' => {
                format_integer(&spec, data_integer("format", position, value)?, &mut out);
            }
            b'q' => add_quoted(&mut out, &value.to_display_bytes()),
            b's' => format_string(
                &spec,
                &value.to_display_bytes(),
                option.long_string_threshold,
                &mut out,
            ),
            _ => {
                let n = data_number("format", position, value)?;
                formatter.format_float(&spec, n, &mut out);
            }
        }
    }
    Ok(out)
}
