// Tests for find, match, gmatch and gfind through the library entries
use super::{call, int, s};
use crate::{LuaValue, StringLib, StringLibOption};

fn next(iter: &LuaValue) -> Vec<LuaValue> {
    match iter {
        LuaValue::Function(f) => f(&[]).unwrap(),
        other => panic!("expected an iterator, got {:?}", other),
    }
}

fn err(name: &str, args: &[LuaValue]) -> String {
    call(name, args).unwrap_err().to_string()
}

#[test]
fn test_find_basic() {
    assert_eq!(call("find", &[s("hello world"), s("wor")]).unwrap(), vec![int(7), int(9)]);
    assert_eq!(call("find", &[s("hello"), s("l+")]).unwrap(), vec![int(3), int(4)]);
    assert_eq!(call("find", &[s("hello"), s("xyz")]).unwrap(), vec![LuaValue::nil()]);
    assert_eq!(
        call("find", &[s("hello"), s("(h)(e)")]).unwrap(),
        vec![int(1), int(2), s("h"), s("e")]
    );
}

#[test]
fn test_find_plain_and_init() {
    assert_eq!(
        call("find", &[s("a.b"), s("."), int(1), LuaValue::boolean(true)]).unwrap(),
        vec![int(2), int(2)]
    );
    assert_eq!(call("find", &[s("hello"), s("l"), int(-2)]).unwrap(), vec![int(4), int(4)]);
    // init past the end clamps to the end
    assert_eq!(call("find", &[s("abc"), s(""), int(10)]).unwrap(), vec![int(4), int(3)]);
    assert_eq!(call("find", &[s("hello"), s("^l")]).unwrap(), vec![LuaValue::nil()]);
    assert_eq!(call("find", &[s("hello"), s("^l"), int(3)]).unwrap(), vec![int(3), int(3)]);
}

#[test]
fn test_match_captures() {
    assert_eq!(
        call("match", &[s("key = value"), s("(%w+)%s*=%s*(%w+)")]).unwrap(),
        vec![s("key"), s("value")]
    );
    assert_eq!(call("match", &[s("hello 123"), s("%d+")]).unwrap(), vec![s("123")]);
    assert_eq!(call("match", &[s("hello"), s("()ll()")]).unwrap(), vec![int(3), int(5)]);
    assert_eq!(call("match", &[s("  trim  "), s("^%s*(.-)%s*$")]).unwrap(), vec![s("trim")]);
    assert_eq!(call("match", &[s("2024-01-15"), s("(%d+)-(%d+)-(%d+)")]).unwrap().len(), 3);
}

#[test]
fn test_match_classes_and_sets() {
    assert_eq!(call("match", &[s("abc123"), s("%a+")]).unwrap(), vec![s("abc")]);
    assert_eq!(call("match", &[s("abc123"), s("[%d]+")]).unwrap(), vec![s("123")]);
    assert_eq!(call("match", &[s("x]y"), s("[]]")]).unwrap(), vec![s("]")]);
    assert_eq!(call("match", &[s("hello"), s("[^hel]")]).unwrap(), vec![s("o")]);
    assert_eq!(call("match", &[s("a-z"), s("[a%-]+")]).unwrap(), vec![s("a-")]);
    assert_eq!(call("match", &[s("CamelCase"), s("%u%l+$")]).unwrap(), vec![s("Case")]);
}

#[test]
fn test_greedy_and_lazy() {
    assert_eq!(call("match", &[s("<a><b>"), s("<.*>")]).unwrap(), vec![s("<a><b>")]);
    assert_eq!(call("match", &[s("<a><b>"), s("<.->")]).unwrap(), vec![s("<a>")]);
}

#[test]
fn test_balance() {
    assert_eq!(call("match", &[s("(a(b)c)"), s("%b()")]).unwrap(), vec![s("(a(b)c)")]);
    assert_eq!(call("match", &[s("(()"), s("^%b()")]).unwrap(), vec![LuaValue::nil()]);
}

#[test]
fn test_back_reference() {
    assert_eq!(
        call("match", &[s("say 'hi' now"), s("(['\"])(.-)%1")]).unwrap(),
        vec![s("'"), s("hi")]
    );
}

#[test]
fn test_pattern_errors() {
    assert_eq!(err("match", &[s("a"), s("[a")]), "malformed pattern (missing ']')");
    assert_eq!(err("match", &[s("a"), s("%")]), "malformed pattern (ends with '%')");
    assert_eq!(
        err("match", &[s("a"), s("%b")]),
        "malformed pattern (missing arguments to '%b')"
    );
    assert_eq!(err("match", &[s("a"), s("%fx")]), "missing '[' after '%f' in pattern");
    assert_eq!(err("match", &[s("a"), s("%1")]), "invalid capture index %1");
    assert_eq!(err("match", &[s("a"), s("a)")]), "invalid pattern capture");
    assert_eq!(err("match", &[s("a"), s("(a")]), "unfinished capture");
    assert_eq!(
        err("find", &[LuaValue::nil(), s("x")]),
        "bad argument #1 to 'find' (string expected, got nil)"
    );
    assert_eq!(err("find", &[s("x")]), "bad argument #2 to 'find' (string expected, got no value)");
}

#[test]
fn test_recursion_budget_is_configurable() {
    let src = s(&"a".repeat(300));
    let pat = s(&"a?".repeat(300));
    assert_eq!(err("match", &[src.clone(), pat.clone()]), "pattern too complex");

    let lib = StringLib::new(StringLibOption {
        max_match_depth: 1000,
        ..StringLibOption::default()
    });
    assert!(lib.call("match", &[src, pat]).is_ok());
}

#[test]
fn test_gmatch_words() {
    let iter = call("gmatch", &[s("hello world from Lua"), s("%a+")]).unwrap().remove(0);
    let mut words = Vec::new();
    loop {
        let r = next(&iter);
        if r[0].is_nil() {
            break;
        }
        words.push(r[0].clone());
    }
    assert_eq!(words, vec![s("hello"), s("world"), s("from"), s("Lua")]);
    // exhausted iterators keep yielding nil
    assert_eq!(next(&iter), vec![LuaValue::nil()]);
}

#[test]
fn test_gmatch_pairs_and_init() {
    let iter = call("gmatch", &[s("from=world, to=Lua"), s("(%w+)=(%w+)")]).unwrap().remove(0);
    assert_eq!(next(&iter), vec![s("from"), s("world")]);
    assert_eq!(next(&iter), vec![s("to"), s("Lua")]);
    assert_eq!(next(&iter), vec![LuaValue::nil()]);

    let iter = call("gmatch", &[s("abc abc"), s("abc"), int(2)]).unwrap().remove(0);
    assert_eq!(next(&iter), vec![s("abc")]);
    assert_eq!(next(&iter), vec![LuaValue::nil()]);
}

#[test]
fn test_gmatch_frontier() {
    let iter = call("gmatch", &[s("THE (quick) fox"), s("%f[%a]%a+")]).unwrap().remove(0);
    assert_eq!(next(&iter), vec![s("THE")]);
    assert_eq!(next(&iter), vec![s("quick")]);
    assert_eq!(next(&iter), vec![s("fox")]);
}

#[test]
fn test_gfind_positions() {
    let iter = call("gfind", &[s("ab ab"), s("ab")]).unwrap().remove(0);
    assert_eq!(next(&iter), vec![int(1), int(2)]);
    assert_eq!(next(&iter), vec![int(4), int(5)]);
    assert_eq!(next(&iter), vec![LuaValue::nil()]);

    let iter = call("gfind", &[s("k=v"), s("(%w)=(%w)")]).unwrap().remove(0);
    assert_eq!(next(&iter), vec![int(1), int(3), s("k"), s("v")]);
}
