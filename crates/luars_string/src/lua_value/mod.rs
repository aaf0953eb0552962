// Minimal host value model seen by the string library.
// The real runtime owns values, tables and calls; this is the boundary shape
// the library needs to marshal arguments and results.
mod lua_table;
mod lua_value;

use crate::lua_vm::LuaResult;
use std::rc::Rc;

pub use lua_table::LuaTable;
pub use lua_value::LuaValue;

/// Host callable, used as a `gsub` replacement and as the `gmatch` iterator.
/// Errors it raises propagate unchanged to the caller.
pub type LuaFunction = Rc<dyn Fn(&[LuaValue]) -> LuaResult<Vec<LuaValue>>>;
