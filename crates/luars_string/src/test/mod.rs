// Test module organization
pub mod test_format;
pub mod test_pack;
pub mod test_pattern;

use crate::{LuaValue, StringLib};

/// Route `log` output through the test harness
pub(crate) fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Call `name` on a default library
pub(crate) fn call(name: &str, args: &[LuaValue]) -> crate::LuaResult<Vec<LuaValue>> {
    init_logger();
    StringLib::default().call(name, args)
}

pub(crate) fn s(text: &str) -> LuaValue {
    LuaValue::string(text)
}

pub(crate) fn int(i: i64) -> LuaValue {
    LuaValue::integer(i)
}
