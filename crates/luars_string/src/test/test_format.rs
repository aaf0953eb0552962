// Tests for string.format
use super::{call, int, s};
use crate::{FormatSpec, LuaValue, NumberFormatter, StringLib};

fn fmt(args: &[LuaValue]) -> LuaValue {
    call("format", args).unwrap().remove(0)
}

fn fmt_err(args: &[LuaValue]) -> String {
    call("format", args).unwrap_err().to_string()
}

#[test]
fn test_format_integers() {
    assert_eq!(fmt(&[s("%5d"), int(3)]), s("    3"));
    assert_eq!(fmt(&[s("%-5d|"), int(3)]), s("3    |"));
    assert_eq!(fmt(&[s("%05d"), int(-42)]), s("-0042"));
    assert_eq!(fmt(&[s("%+d"), int(5)]), s("+5"));
    assert_eq!(fmt(&[s("% d"), int(5)]), s(" 5"));
    assert_eq!(fmt(&[s("%.3d"), int(7)]), s("007"));
    assert_eq!(fmt(&[s("%.0d"), int(0)]), s(""));
    assert_eq!(fmt(&[s("%i"), int(i64::MIN)]), s("-9223372036854775808"));
    assert_eq!(fmt(&[s("%d"), LuaValue::number(3.0)]), s("3"));
    assert_eq!(fmt(&[s("%d"), s("10")]), s("10"));
}

#[test]
fn test_format_unsigned_radix() {
    assert_eq!(fmt(&[s("%x"), int(255)]), s("ff"));
    assert_eq!(fmt(&[s("%X"), int(255)]), s("FF"));
    assert_eq!(fmt(&[s("%#x"), int(255)]), s("0xff"));
    assert_eq!(fmt(&[s("%#X"), int(0)]), s("0"));
    assert_eq!(fmt(&[s("%o"), int(8)]), s("10"));
    assert_eq!(fmt(&[s("%#o"), int(8)]), s("010"));
    assert_eq!(fmt(&[s("%x"), int(-1)]), s("ffffffffffffffff"));
    assert_eq!(fmt(&[s("%u"), int(-1)]), s("18446744073709551615"));
    assert_eq!(fmt(&[s("%08.4x"), int(255)]), s("    00ff"));
}

#[test]
fn test_format_floats() {
    assert_eq!(fmt(&[s("%5.2f"), LuaValue::number(3.14159)]), s(" 3.14"));
    assert_eq!(fmt(&[s("%f"), int(1)]), s("1.000000"));
    assert_eq!(fmt(&[s("%e"), LuaValue::number(0.5)]), s("5.000000e-01"));
    assert_eq!(fmt(&[s("%g"), LuaValue::number(0.1)]), s("0.1"));
    assert_eq!(fmt(&[s("%.3g"), LuaValue::number(1234.5)]), s("1.23e+03"));
    assert_eq!(fmt(&[s("%G"), LuaValue::number(1e-10)]), s("1E-10"));
    assert_eq!(fmt(&[s("%.1f"), s("2.25")]), s("2.2"));
}

#[test]
fn test_format_strings() {
    assert_eq!(fmt(&[s("%s"), s("hi")]), s("hi"));
    assert_eq!(fmt(&[s("%s"), int(42)]), s("42"));
    assert_eq!(fmt(&[s("%s"), LuaValue::number(1.0)]), s("1.0"));
    assert_eq!(fmt(&[s("%s|%s"), LuaValue::nil(), LuaValue::boolean(true)]), s("nil|true"));
    assert_eq!(fmt(&[s("%10s|"), s("hi")]), s("        hi|"));
    assert_eq!(fmt(&[s("%-4s|"), s("hi")]), s("hi  |"));
    assert_eq!(fmt(&[s("%.2s"), s("hello")]), s("he"));
    assert_eq!(fmt(&[s("[%s]"), s("a\0b")]), s("[a]"));

    // long strings without precision pass through untouched
    let long = format!("{}\0tail", "x".repeat(120));
    assert_eq!(fmt(&[s("%s"), s(&long)]), s(&long));
}

#[test]
fn test_format_quoted_and_char() {
    assert_eq!(
        fmt(&[s("%q"), s("he said \"hi\"\n")]),
        s("\"he said \\\"hi\\\"\\\n\"")
    );
    assert_eq!(fmt(&[s("%q"), s("\x01a\x012")]), s("\"\\1a\\0012\""));
    assert_eq!(fmt(&[s("%q"), int(7)]), s("\"7\""));
    assert_eq!(fmt(&[s("%c%c"), int(72), int(105)]), s("Hi"));
    assert_eq!(fmt(&[s("%3c"), int(65)]), s("  A"));
}

#[test]
fn test_format_passthrough() {
    assert_eq!(fmt(&[s("100%%")]), s("100%"));
    assert_eq!(fmt(&[s("a\nb")]), s("a\nb"));
    assert_eq!(fmt(&[int(12)]), s("12"));
    assert_eq!(fmt(&[s("%-+ #0d"), int(1)]), s("+1"));
    assert_eq!(fmt(&[s("%d and %s"), int(1), s("two")]), s("1 and two"));
}

#[test]
fn test_format_errors() {
    assert_eq!(fmt_err(&[s("%d")]), "bad argument #2 to 'format' (no value)");
    assert_eq!(fmt_err(&[s("%d %d"), int(1)]), "bad argument #3 to 'format' (no value)");
    assert_eq!(fmt_err(&[s("%y"), int(1)]), "invalid option '%y' to 'format'");
    assert_eq!(
        fmt_err(&[s("%123d"), int(1)]),
        "invalid format (width or precision too long)"
    );
    assert_eq!(fmt_err(&[s("%------d"), int(1)]), "invalid format (repeated flags)");
    assert_eq!(fmt_err(&[s("abc%")]), "invalid conversion '%' to 'format'");
    assert_eq!(fmt_err(&[s("%5")]), "invalid conversion '%5' to 'format'");
    assert_eq!(
        fmt_err(&[s("%d"), LuaValue::number(3.5)]),
        "bad argument #2 to 'format' (number has no integer representation)"
    );
    assert_eq!(
        fmt_err(&[s("%f"), s("abc")]),
        "bad argument #2 to 'format' (number expected, got string)"
    );
}

struct Bracketed;

impl NumberFormatter for Bracketed {
    fn format_float(&self, spec: &FormatSpec, value: f64, out: &mut Vec<u8>) {
        out.extend_from_slice(format!("<{}:{}>", spec.conversion as char, value).as_bytes());
    }
}

#[test]
fn test_number_formatter_hook() {
    let lib = StringLib::default().with_number_formatter(Bracketed);
    let r = lib.call("format", &[s("%f %d"), LuaValue::number(1.5), int(2)]).unwrap();
    assert_eq!(r, vec![s("<f:1.5> 2")]);
}
