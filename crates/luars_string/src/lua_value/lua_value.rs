use super::{LuaFunction, LuaTable};
use crate::stdlib::string::lua_number_to_str;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// A host value crossing the string library boundary.
///
/// Strings are raw byte sequences and may contain embedded zeros.
#[derive(Clone, Default)]
pub enum LuaValue {
    #[default]
    Nil,
    Boolean(bool),
    Integer(i64),
    Number(f64),
    String(Rc<[u8]>),
    Table(Rc<RefCell<LuaTable>>),
    Function(LuaFunction),
}

impl LuaValue {
    // ============ Constructors ============

    #[inline(always)]
    pub fn nil() -> Self {
        LuaValue::Nil
    }

    #[inline(always)]
    pub fn boolean(b: bool) -> Self {
        LuaValue::Boolean(b)
    }

    #[inline(always)]
    pub fn integer(i: i64) -> Self {
        LuaValue::Integer(i)
    }

    #[inline(always)]
    pub fn number(n: f64) -> Self {
        LuaValue::Number(n)
    }

    #[inline]
    pub fn string(s: impl AsRef<[u8]>) -> Self {
        LuaValue::String(Rc::from(s.as_ref()))
    }

    pub fn table(table: LuaTable) -> Self {
        LuaValue::Table(Rc::new(RefCell::new(table)))
    }

    pub fn function<F>(f: F) -> Self
    where
        F: Fn(&[LuaValue]) -> crate::lua_vm::LuaResult<Vec<LuaValue>> + 'static,
    {
        LuaValue::Function(Rc::new(f))
    }

    // ============ Type tests ============

    #[inline(always)]
    pub fn is_nil(&self) -> bool {
        matches!(self, LuaValue::Nil)
    }

    #[inline(always)]
    pub fn is_falsy(&self) -> bool {
        matches!(self, LuaValue::Nil | LuaValue::Boolean(false))
    }

    #[inline(always)]
    pub fn is_truthy(&self) -> bool {
        !self.is_falsy()
    }

    #[inline(always)]
    pub fn is_string(&self) -> bool {
        matches!(self, LuaValue::String(_))
    }

    #[inline(always)]
    pub fn is_number(&self) -> bool {
        matches!(self, LuaValue::Integer(_) | LuaValue::Number(_))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            LuaValue::Nil => "nil",
            LuaValue::Boolean(_) => "boolean",
            LuaValue::Integer(_) | LuaValue::Number(_) => "number",
            LuaValue::String(_) => "string",
            LuaValue::Table(_) => "table",
            LuaValue::Function(_) => "function",
        }
    }

    // ============ Accessors ============

    #[inline]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            LuaValue::String(s) => Some(&s[..]),
            _ => None,
        }
    }

    #[inline]
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            LuaValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    #[inline]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            LuaValue::Number(n) => Some(*n),
            LuaValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    // ============ Conversions ============

    /// String coercion: strings as-is, numbers through the host number
    /// formatter, anything else `None`.
    pub fn to_lua_string(&self) -> Option<Vec<u8>> {
        match self {
            LuaValue::String(s) => Some(s.to_vec()),
            LuaValue::Integer(i) => Some(itoa::Buffer::new().format(*i).as_bytes().to_vec()),
            LuaValue::Number(n) => Some(lua_number_to_str(*n).into_bytes()),
            _ => None,
        }
    }

    /// `tostring`-like rendering of any value.
    pub fn to_display_bytes(&self) -> Vec<u8> {
        if let Some(s) = self.to_lua_string() {
            return s;
        }
        match self {
            LuaValue::Nil => b"nil".to_vec(),
            LuaValue::Boolean(true) => b"true".to_vec(),
            LuaValue::Boolean(false) => b"false".to_vec(),
            LuaValue::Table(t) => format!("table: {:p}", Rc::as_ptr(t)).into_bytes(),
            LuaValue::Function(f) => format!("function: {:p}", Rc::as_ptr(f) as *const u8).into_bytes(),
            _ => Vec::new(),
        }
    }
}

impl PartialEq for LuaValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (LuaValue::Nil, LuaValue::Nil) => true,
            (LuaValue::Boolean(a), LuaValue::Boolean(b)) => a == b,
            (LuaValue::Integer(a), LuaValue::Integer(b)) => a == b,
            (LuaValue::Number(a), LuaValue::Number(b)) => a == b,
            (LuaValue::Integer(i), LuaValue::Number(n)) | (LuaValue::Number(n), LuaValue::Integer(i)) => {
                *i as f64 == *n && n.fract() == 0.0
            }
            (LuaValue::String(a), LuaValue::String(b)) => a == b,
            (LuaValue::Table(a), LuaValue::Table(b)) => Rc::ptr_eq(a, b),
            (LuaValue::Function(a), LuaValue::Function(b)) => {
                std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
            }
            _ => false,
        }
    }
}

impl fmt::Debug for LuaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LuaValue::Nil => write!(f, "nil"),
            LuaValue::Boolean(b) => write!(f, "{}", b),
            LuaValue::Integer(i) => write!(f, "{}", i),
            LuaValue::Number(n) => write!(f, "{}", lua_number_to_str(*n)),
            LuaValue::String(s) => write!(f, "{:?}", String::from_utf8_lossy(s)),
            LuaValue::Table(t) => write!(f, "table: {:p}", Rc::as_ptr(t)),
            LuaValue::Function(func) => write!(f, "function: {:p}", Rc::as_ptr(func) as *const u8),
        }
    }
}

impl From<bool> for LuaValue {
    fn from(b: bool) -> Self {
        LuaValue::Boolean(b)
    }
}

impl From<i64> for LuaValue {
    fn from(i: i64) -> Self {
        LuaValue::Integer(i)
    }
}

impl From<f64> for LuaValue {
    fn from(n: f64) -> Self {
        LuaValue::Number(n)
    }
}

impl From<&str> for LuaValue {
    fn from(s: &str) -> Self {
        LuaValue::string(s)
    }
}

impl From<String> for LuaValue {
    fn from(s: String) -> Self {
        LuaValue::string(s)
    }
}

impl From<&[u8]> for LuaValue {
    fn from(s: &[u8]) -> Self {
        LuaValue::string(s)
    }
}

impl From<Vec<u8>> for LuaValue {
    fn from(s: Vec<u8>) -> Self {
        LuaValue::String(Rc::from(s))
    }
}

impl From<LuaTable> for LuaValue {
    fn from(t: LuaTable) -> Self {
        LuaValue::table(t)
    }
}
