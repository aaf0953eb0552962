// Lua string library
// Pattern matching, gsub, format and binary pack/unpack over byte strings,
// callable through a typed Rust API or by name with host values.

#[cfg(test)]
mod test;

pub mod lib_registry;
pub mod lua_value;
pub mod lua_vm;
pub mod stdlib;

pub use lib_registry::{LibFunction, LibraryModule, StringLib};
pub use lua_value::{LuaFunction, LuaTable, LuaValue};
pub use lua_vm::{LuaError, LuaResult, StringLibOption};
pub use stdlib::string::pack::{LengthPrefixedText, TextCodec};
pub use stdlib::string::string_format::{CFloatFormatter, FormatSpec, NumberFormatter};
