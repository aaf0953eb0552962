// Library registration for the string library
// Entries are plain Rust functions keyed by their script-visible name; the
// host binds them into its own function table.

use crate::lua_value::LuaValue;
use crate::lua_vm::{LuaError, LuaResult, StringLibOption};
use crate::stdlib::string::create_string_lib;
use crate::stdlib::string::pack::TextCodec;
use crate::stdlib::string::string_format::{CFloatFormatter, NumberFormatter};

/// Host calling convention: arguments in, results out
pub type LibFunction = fn(&StringLib, &[LuaValue]) -> LuaResult<Vec<LuaValue>>;

/// A library module containing named functions
pub struct LibraryModule {
    pub name: &'static str,
    pub entries: Vec<(&'static str, LibFunction)>,
}

impl LibraryModule {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            entries: Vec::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<LibFunction> {
        self.entries
            .iter()
            .find(|(entry, _)| *entry == name)
            .map(|&(_, func)| func)
    }
}

/// Builder for creating library modules
#[macro_export]
macro_rules! lib_module {
    ($name:expr, {
        $($item_name:expr => $item:expr),* $(,)?
    }) => {{
        let mut module = $crate::lib_registry::LibraryModule::new($name);
        $(
            module.entries.push(($item_name, $item as $crate::lib_registry::LibFunction));
        )*
        module
    }};
}

/// The string library as a host sees it: options, hooks and the entry table.
pub struct StringLib {
    option: StringLibOption,
    number_formatter: Box<dyn NumberFormatter>,
    text_codec: Option<Box<dyn TextCodec>>,
    module: LibraryModule,
}

impl Default for StringLib {
    fn default() -> Self {
        Self::new(StringLibOption::default())
    }
}

impl StringLib {
    pub fn new(option: StringLibOption) -> Self {
        Self {
            option,
            number_formatter: Box::new(CFloatFormatter),
            text_codec: None,
            module: create_string_lib(),
        }
    }

    /// Install the codec used by the `u` pack directive
    pub fn with_text_codec(mut self, codec: impl TextCodec + 'static) -> Self {
        self.text_codec = Some(Box::new(codec));
        self
    }

    /// Replace the renderer of `%e %f %g` conversions
    pub fn with_number_formatter(mut self, formatter: impl NumberFormatter + 'static) -> Self {
        self.number_formatter = Box::new(formatter);
        self
    }

    #[inline]
    pub fn option(&self) -> &StringLibOption {
        &self.option
    }

    #[inline]
    pub fn number_formatter(&self) -> &dyn NumberFormatter {
        self.number_formatter.as_ref()
    }

    #[inline]
    pub fn text_codec(&self) -> Option<&dyn TextCodec> {
        self.text_codec.as_deref()
    }

    pub fn module(&self) -> &LibraryModule {
        &self.module
    }

    /// Call the entry registered as `name`
    pub fn call(&self, name: &str, args: &[LuaValue]) -> LuaResult<Vec<LuaValue>> {
        let Some(func) = self.module.get(name) else {
            log::debug!("string library has no entry '{}'", name);
            return Err(LuaError::runtime(format!(
                "attempt to call a nil value (field '{}')",
                name
            )));
        };
        func(self, args)
    }
}
