// String pack/unpack functions
// Implements: string.pack, string.unpack, string.packsize
//
// Directive language:
// - < / >: little / big endian from here on (default big)
// - b/B: signed/unsigned byte (1 byte)
// - h/H: signed/unsigned short (2 bytes)
// - i: signed int, I/T: unsigned int (4 bytes)
// - l/L/j/J: signed/unsigned long (8 bytes)
// - f: float (4 bytes), d/n: double (8 bytes)
// - x: one padding byte
// - cN: fixed-length string of N bytes
// - sN: string preceded by an N-byte length (N in 1..=16, defaults to 4)
// - u: host text through a `TextCodec`
// Spaces are ignored.

use crate::lua_value::LuaValue;
use crate::lua_vm::lua_args::{data_arg, data_integer, data_number, data_string};
use crate::lua_vm::lua_limits::{
    DEFAULT_PACK_PREFIX, MAX_PACK_INT_SIZE, MAX_PACK_PREFIX, MAX_STRING_SIZE,
};
use crate::lua_vm::{LuaError, LuaResult};

/// Encoding of the `u` directive. No codec is installed by default.
pub trait TextCodec {
    /// Append the encoded form of `text`
    fn encode(&self, text: &[u8], out: &mut Vec<u8>) -> LuaResult<()>;
    /// Decode one text from the front of `data`; returns it with the number
    /// of bytes consumed.
    fn decode(&self, data: &[u8]) -> LuaResult<(Vec<u8>, usize)>;
}

/// Text preceded by a 2-byte big-endian length
#[derive(Debug, Clone, Copy, Default)]
pub struct LengthPrefixedText;

impl TextCodec for LengthPrefixedText {
    fn encode(&self, text: &[u8], out: &mut Vec<u8>) -> LuaResult<()> {
        let len = u16::try_from(text.len())
            .map_err(|_| LuaError::Codec("string too long for format option 'u'".to_string()))?;
        out.extend_from_slice(&len.to_be_bytes());
        out.extend_from_slice(text);
        Ok(())
    }

    fn decode(&self, data: &[u8]) -> LuaResult<(Vec<u8>, usize)> {
        let [hi, lo, rest @ ..] = data else {
            return Err(too_short());
        };
        let len = u16::from_be_bytes([*hi, *lo]) as usize;
        if rest.len() < len {
            return Err(too_short());
        }
        Ok((rest[..len].to_vec(), 2 + len))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PackItem {
    Int { size: usize, signed: bool },
    Float,
    Double,
    Padding,
    Fixed(usize),
    Prefixed(usize),
    Text,
}

/// Cursor over a directive string; tracks the endianness mode
struct FormatReader<'a> {
    fmt: &'a [u8],
    pos: usize,
    little: bool,
}

impl<'a> FormatReader<'a> {
    fn new(fmt: &'a [u8]) -> Self {
        Self {
            fmt,
            pos: 0,
            little: false,
        }
    }

    fn read_size(&mut self) -> Option<usize> {
        let start = self.pos;
        let mut n = 0usize;
        while let Some(&d) = self.fmt.get(self.pos)
            && d.is_ascii_digit()
        {
            n = n.saturating_mul(10).saturating_add((d - b'0') as usize);
            self.pos += 1;
        }
        (self.pos > start).then_some(n)
    }

    /// Next data item, with the byte order in effect for it
    fn next_item(&mut self) -> LuaResult<Option<(PackItem, bool)>> {
        while let Some(&c) = self.fmt.get(self.pos) {
            self.pos += 1;
            let item = match c {
                b' ' => continue,
                b'<' => {
                    self.little = true;
                    continue;
                }
                b'>' => {
                    self.little = false;
                    continue;
                }
                b'b' => PackItem::Int { size: 1, signed: true },
                b'B' => PackItem::Int { size: 1, signed: false },
                b'h' => PackItem::Int { size: 2, signed: true },
                b'H' => PackItem::Int { size: 2, signed: false },
                b'i' => PackItem::Int { size: 4, signed: true },
                b'I' | b'T' => PackItem::Int { size: 4, signed: false },
                b'l' | b'j' => PackItem::Int { size: 8, signed: true },
                b'L' | b'J' => PackItem::Int { size: 8, signed: false },
                b'f' => PackItem::Float,
                b'd' | b'n' => PackItem::Double,
                b'x' => PackItem::Padding,
                b'c' => {
                    let start = self.pos;
                    match self.read_size() {
                        Some(n) if n <= MAX_STRING_SIZE => PackItem::Fixed(n),
                        Some(_) => {
                            return Err(LuaError::Codec(format!(
                                "size ({}) of format option 'c' out of limits [0,{}]",
                                String::from_utf8_lossy(&self.fmt[start..self.pos]),
                                MAX_STRING_SIZE
                            )));
                        }
                        None => {
                            return Err(LuaError::Codec(
                                "missing size for format option 'c'".to_string(),
                            ));
                        }
                    }
                }
                b's' => {
                    let start = self.pos;
                    match self.read_size() {
                        None => PackItem::Prefixed(DEFAULT_PACK_PREFIX),
                        Some(n) if (1..=MAX_PACK_PREFIX).contains(&n) => PackItem::Prefixed(n),
                        Some(_) => {
                            return Err(LuaError::Codec(format!(
                                "integral size ({}) out of limits [1,{}]",
                                String::from_utf8_lossy(&self.fmt[start..self.pos]),
                                MAX_PACK_PREFIX
                            )));
                        }
                    }
                }
                b'u' => PackItem::Text,
                other => {
                    return Err(LuaError::Codec(format!(
                        "invalid format option '{}'",
                        other as char
                    )));
                }
            };
            return Ok(Some((item, self.little)));
        }
        Ok(None)
    }
}

#[inline]
fn too_short() -> LuaError {
    LuaError::Codec("data string too short".to_string())
}

/// Next `n` bytes of `data`, advancing `pos`
#[inline]
fn take<'d>(data: &'d [u8], pos: &mut usize, n: usize) -> LuaResult<&'d [u8]> {
    let end = pos
        .checked_add(n)
        .filter(|&end| end <= data.len())
        .ok_or_else(too_short)?;
    let bytes = &data[*pos..end];
    *pos = end;
    Ok(bytes)
}

#[inline]
fn no_codec() -> LuaError {
    LuaError::Codec("format option 'u' requires a text codec".to_string())
}

/// Low `size` bytes of `v` in the requested order. Prefix sizes above 8
/// are zero-filled.
fn write_uint(out: &mut Vec<u8>, v: u64, size: usize, little: bool) {
    let start = out.len();
    out.extend((0..size).map(|i| if i < MAX_PACK_INT_SIZE { (v >> (8 * i)) as u8 } else { 0 }));
    if !little {
        out[start..].reverse();
    }
}

/// Read `size` bytes as an unsigned value; bytes past the eighth must be zero.
fn read_uint(bytes: &[u8], little: bool) -> Option<u64> {
    let mut v = 0u64;
    for i in 0..bytes.len() {
        let b = if little { bytes[i] } else { bytes[bytes.len() - 1 - i] };
        if i < MAX_PACK_INT_SIZE {
            v |= (b as u64) << (8 * i);
        } else if b != 0 {
            return None;
        }
    }
    Some(v)
}

#[inline]
fn sign_extend(v: u64, size: usize) -> i64 {
    let shift = 64 - 8 * size as u32;
    ((v << shift) as i64) >> shift
}

/// Encode `values` per `fmt`. `values[0]` is argument #2 of the call.
pub fn pack(fmt: &[u8], values: &[LuaValue], codec: Option<&dyn TextCodec>) -> LuaResult<Vec<u8>> {
    let mut reader = FormatReader::new(fmt);
    let mut out = Vec::new();
    let mut arg = 0usize;

    while let Some((item, little)) = reader.next_item()? {
        if item == PackItem::Padding {
            out.push(0);
            continue;
        }
        let value = data_arg("pack", values, arg)?;
        let position = arg + 2;
        arg += 1;

        match item {
            PackItem::Int { size, .. } => {
                let v = data_integer("pack", position, value)?;
                write_uint(&mut out, v as u64, size, little);
            }
            PackItem::Float => {
                let v = data_number("pack", position, value)? as f32;
                write_uint(&mut out, v.to_bits() as u64, 4, little);
            }
            PackItem::Double => {
                let v = data_number("pack", position, value)?;
                write_uint(&mut out, v.to_bits(), 8, little);
            }
            PackItem::Fixed(n) => {
                let s = data_string("pack", position, value)?;
                if s.len() > n {
                    return Err(LuaError::arg_error("pack", position, "string longer than given size"));
                }
                out.extend_from_slice(&s);
                out.resize(out.len() + (n - s.len()), 0);
            }
            PackItem::Prefixed(n) => {
                let s = data_string("pack", position, value)?;
                if n < MAX_PACK_INT_SIZE && (s.len() as u64) >> (8 * n) != 0 {
                    return Err(LuaError::arg_error(
                        "pack",
                        position,
                        "string length does not fit in given size",
                    ));
                }
                write_uint(&mut out, s.len() as u64, n, little);
                out.extend_from_slice(&s);
            }
            PackItem::Text => {
                let s = data_string("pack", position, value)?;
                let codec = codec.ok_or_else(no_codec)?;
                codec.encode(&s, &mut out).inspect_err(|e| {
                    log::debug!("pack: text codec rejected argument #{}: {}", position, e)
                })?;
            }
            PackItem::Padding => {}
        }
    }
    log::trace!("pack: {} values into {} bytes", arg, out.len());
    Ok(out)
}

/// Decode `data` per `fmt` starting at the 1-based, possibly negative `init`.
/// Returns the values and the 1-based offset just past the last byte read.
pub fn unpack(
    fmt: &[u8],
    data: &[u8],
    init: i64,
    codec: Option<&dyn TextCodec>,
) -> LuaResult<(Vec<LuaValue>, usize)> {
    let mut pos = if init > 0 {
        usize::try_from(init - 1).unwrap_or(usize::MAX)
    } else if init < 0 {
        data.len().saturating_sub(init.unsigned_abs() as usize)
    } else {
        0
    };
    if pos > data.len() {
        return Err(LuaError::arg_error("unpack", 3, "initial position out of string"));
    }

    let mut reader = FormatReader::new(fmt);
    let mut values = Vec::new();

    while let Some((item, little)) = reader.next_item()? {
        match item {
            PackItem::Int { size, signed } => {
                let v = read_uint(take(data, &mut pos, size)?, little).unwrap_or(0);
                let v = if signed { sign_extend(v, size) } else { v as i64 };
                values.push(LuaValue::integer(v));
            }
            PackItem::Float => {
                let v = read_uint(take(data, &mut pos, 4)?, little).unwrap_or(0);
                values.push(LuaValue::number(f32::from_bits(v as u32) as f64));
            }
            PackItem::Double => {
                let v = read_uint(take(data, &mut pos, 8)?, little).unwrap_or(0);
                values.push(LuaValue::number(f64::from_bits(v)));
            }
            PackItem::Padding => {
                take(data, &mut pos, 1)?;
            }
            PackItem::Fixed(n) => values.push(LuaValue::string(take(data, &mut pos, n)?)),
            PackItem::Prefixed(n) => {
                let len = read_uint(take(data, &mut pos, n)?, little)
                    .and_then(|len| usize::try_from(len).ok())
                    .filter(|&len| len <= data.len() - pos)
                    .ok_or_else(|| {
                        LuaError::Codec("string length does not fit in given size".to_string())
                    })?;
                values.push(LuaValue::string(take(data, &mut pos, len)?));
            }
            PackItem::Text => {
                let codec = codec.ok_or_else(no_codec)?;
                let (text, used) = codec.decode(&data[pos..]).inspect_err(|e| {
                    log::debug!("unpack: text codec failed at offset {}: {}", pos + 1, e)
                })?;
                pos += used;
                values.push(LuaValue::string(text));
            }
        }
    }
    log::trace!("unpack: {} values, next offset {}", values.len(), pos + 1);
    Ok((values, pos + 1))
}

/// Byte size of a fixed-size format
pub fn packsize(fmt: &[u8]) -> LuaResult<usize> {
    let mut reader = FormatReader::new(fmt);
    let mut total = 0usize;
    while let Some((item, _)) = reader.next_item()? {
        let size = match item {
            PackItem::Int { size, .. } => size,
            PackItem::Float => 4,
            PackItem::Double => 8,
            PackItem::Padding => 1,
            PackItem::Fixed(n) => n,
            PackItem::Prefixed(_) | PackItem::Text => {
                return Err(LuaError::Codec(
                    "variable-length format in 'packsize'".to_string(),
                ));
            }
        };
        total = total
            .checked_add(size)
            .ok_or_else(|| LuaError::arg_error("packsize", 1, "format result too large"))?;
    }
    Ok(total)
}
