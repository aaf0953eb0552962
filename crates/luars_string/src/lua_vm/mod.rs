// Error type, limits and options shared by every string library entry
pub mod lua_args;
mod lua_error;
pub mod lua_limits;
mod safe_option;

pub use lua_error::{LuaError, LuaResult};
pub use safe_option::StringLibOption;
