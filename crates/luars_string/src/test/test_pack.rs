// Tests for string.pack, string.unpack and string.packsize
use super::{call, int, s};
use crate::{LengthPrefixedText, LuaValue, StringLib};

fn bytes(b: &[u8]) -> LuaValue {
    LuaValue::string(b)
}

fn pack(args: &[LuaValue]) -> LuaValue {
    call("pack", args).unwrap().remove(0)
}

fn err(name: &str, args: &[LuaValue]) -> String {
    call(name, args).unwrap_err().to_string()
}

#[test]
fn test_pack_endianness() {
    assert_eq!(pack(&[s(">i"), int(1)]), bytes(&[0, 0, 0, 1]));
    assert_eq!(pack(&[s("<i"), int(1)]), bytes(&[1, 0, 0, 0]));
    // the mode persists until switched back
    assert_eq!(pack(&[s("<h h >h"), int(1), int(2), int(3)]), bytes(&[1, 0, 2, 0, 0, 3]));
    // big endian by default
    assert_eq!(pack(&[s("H"), int(0x0102)]), bytes(&[1, 2]));
}

#[test]
fn test_pack_unpack_integers() {
    let data = pack(&[s("<ihb"), int(-2), int(-3), int(-4)]);
    assert_eq!(
        call("unpack", &[s("<ihb"), data]).unwrap(),
        vec![int(-2), int(-3), int(-4), int(8)]
    );

    let data = pack(&[s(">j J"), int(i64::MIN), int(-1)]);
    assert_eq!(
        call("unpack", &[s(">j J"), data]).unwrap(),
        vec![int(i64::MIN), int(-1), int(17)]
    );
}

#[test]
fn test_unsigned_widening() {
    let data = pack(&[s("B H I T"), int(-1), int(-1), int(-1), int(7)]);
    assert_eq!(
        call("unpack", &[s("B H I T"), data]).unwrap(),
        vec![int(255), int(65535), int(4294967295), int(7), int(12)]
    );
}

#[test]
fn test_pack_floats() {
    let data = pack(&[s("<f>d n"), LuaValue::number(1.5), LuaValue::number(0.1), int(2)]);
    assert_eq!(
        call("unpack", &[s("<f>d n"), data]).unwrap(),
        vec![
            LuaValue::number(1.5),
            LuaValue::number(0.1),
            LuaValue::number(2.0),
            int(21)
        ]
    );
}

#[test]
fn test_pack_strings() {
    assert_eq!(pack(&[s("c5"), s("ab")]), bytes(b"ab\0\0\0"));
    assert_eq!(pack(&[s("s1"), s("hi")]), bytes(&[2, b'h', b'i']));
    assert_eq!(pack(&[s(">s"), s("hi")]), bytes(&[0, 0, 0, 2, b'h', b'i']));
    assert_eq!(pack(&[s("<s2"), int(42)]), bytes(&[2, 0, b'4', b'2']));

    let data = pack(&[s("c3 s1 s"), s("abc"), s("de"), s("")]);
    assert_eq!(
        call("unpack", &[s("c3 s1 s"), data]).unwrap(),
        vec![s("abc"), s("de"), s(""), int(11)]
    );

    // prefixes wider than eight bytes are zero-extended
    let data = pack(&[s("<s10"), s("x")]);
    assert_eq!(data, bytes(&[1, 0, 0, 0, 0, 0, 0, 0, 0, 0, b'x']));
    assert_eq!(call("unpack", &[s("<s10"), data]).unwrap(), vec![s("x"), int(12)]);
}

#[test]
fn test_padding() {
    let data = pack(&[s("BxB"), int(1), int(2)]);
    assert_eq!(data, bytes(&[1, 0, 2]));
    assert_eq!(call("unpack", &[s("BxB"), data]).unwrap(), vec![int(1), int(2), int(4)]);
}

#[test]
fn test_unpack_init() {
    let data = bytes(&[1, 2]);
    assert_eq!(call("unpack", &[s("B"), data.clone(), int(2)]).unwrap(), vec![int(2), int(3)]);
    assert_eq!(call("unpack", &[s("B"), data.clone(), int(-1)]).unwrap(), vec![int(2), int(3)]);
    assert_eq!(
        err("unpack", &[s("B"), data.clone(), int(4)]),
        "bad argument #3 to 'unpack' (initial position out of string)"
    );
    assert_eq!(err("unpack", &[s("B"), data, int(3)]), "data string too short");
}

#[test]
fn test_pack_errors() {
    assert!(err("pack", &[s("c1"), s("ab")]).contains("string longer than given size"));
    assert_eq!(err("pack", &[s("c"), s("a")]), "missing size for format option 'c'");
    assert!(err("pack", &[s("s1"), s(&"x".repeat(300))]).contains("string length does not fit in given size"));
    assert_eq!(err("pack", &[s("q"), int(1)]), "invalid format option 'q'");
    assert_eq!(err("pack", &[s("ii"), int(1)]), "bad argument #3 to 'pack' (no value)");
    assert_eq!(
        err("pack", &[s("i"), s("x")]),
        "bad argument #2 to 'pack' (number expected, got string)"
    );
    assert_eq!(
        err("pack", &[s("i"), LuaValue::number(1.5)]),
        "bad argument #2 to 'pack' (number has no integer representation)"
    );
}

#[test]
fn test_pack_size_limits() {
    assert_eq!(
        err("pack", &[s("s99999999999999999999999"), s("a")]),
        "integral size (99999999999999999999999) out of limits [1,16]"
    );
    assert_eq!(err("pack", &[s("s0"), s("ab")]), "integral size (0) out of limits [1,16]");
    assert_eq!(err("unpack", &[s("s17"), s("")]), "integral size (17) out of limits [1,16]");
    assert_eq!(
        err("pack", &[s("c99999999999999999999999"), s("a")]),
        "size (99999999999999999999999) of format option 'c' out of limits [0,1073741824]"
    );
    assert!(err("packsize", &[s("c2000000000")]).contains("out of limits"));

    assert_eq!(pack(&[s("s16"), s("")]), bytes(&[0; 16]));
    assert_eq!(pack(&[s("c0"), s("")]), bytes(b""));
}

#[test]
fn test_unpack_errors() {
    assert_eq!(err("unpack", &[s("i"), s("ab")]), "data string too short");
    assert_eq!(
        err("unpack", &[s("s1"), bytes(&[5, b'a'])]),
        "string length does not fit in given size"
    );
    assert_eq!(err("unpack", &[s("c3"), s("ab")]), "data string too short");
}

#[test]
fn test_packsize() {
    assert_eq!(call("packsize", &[s("ihbxc3")]).unwrap(), vec![int(11)]);
    assert_eq!(call("packsize", &[s("<d >j f")]).unwrap(), vec![int(20)]);
    assert_eq!(call("packsize", &[s("")]).unwrap(), vec![int(0)]);
    assert_eq!(err("packsize", &[s("is")]), "variable-length format in 'packsize'");
    assert_eq!(err("packsize", &[s("u")]), "variable-length format in 'packsize'");
}

#[test]
fn test_text_codec_hook() {
    assert_eq!(err("pack", &[s("u"), s("hi")]), "format option 'u' requires a text codec");
    assert_eq!(err("unpack", &[s("u"), s("hi")]), "format option 'u' requires a text codec");

    let lib = StringLib::default().with_text_codec(LengthPrefixedText);
    let data = lib.call("pack", &[s("u B"), s("héllo"), int(9)]).unwrap().remove(0);
    assert_eq!(
        lib.call("unpack", &[s("u B"), data]).unwrap(),
        vec![s("héllo"), int(9), int(10)]
    );
}
