use super::LuaValue;
use crate::lua_vm::{LuaError, LuaResult};
use ahash::AHashMap;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum TableKey {
    Boolean(bool),
    Integer(i64),
    Float(u64),
    String(Rc<[u8]>),
    Object(usize),
}

impl TableKey {
    /// Float keys with an exact integer value are stored as integers, as Lua does.
    fn from_value(key: &LuaValue) -> Option<TableKey> {
        match key {
            LuaValue::Nil => None,
            LuaValue::Boolean(b) => Some(TableKey::Boolean(*b)),
            LuaValue::Integer(i) => Some(TableKey::Integer(*i)),
            LuaValue::Number(n) => {
                if n.is_nan() {
                    None
                } else if n.fract() == 0.0 && *n >= -(2f64.powi(63)) && *n < 2f64.powi(63) {
                    Some(TableKey::Integer(*n as i64))
                } else {
                    Some(TableKey::Float(n.to_bits()))
                }
            }
            LuaValue::String(s) => Some(TableKey::String(s.clone())),
            LuaValue::Table(t) => Some(TableKey::Object(Rc::as_ptr(t) as *const u8 as usize)),
            LuaValue::Function(f) => Some(TableKey::Object(Rc::as_ptr(f) as *const u8 as usize)),
        }
    }
}

/// Associative table used for `gsub` lookups.
#[derive(Debug, Default)]
pub struct LuaTable {
    hash: AHashMap<TableKey, LuaValue>,
}

impl LuaTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw get. Missing keys, `nil` and NaN read as `nil`.
    pub fn get(&self, key: &LuaValue) -> LuaValue {
        TableKey::from_value(key)
            .and_then(|k| self.hash.get(&k).cloned())
            .unwrap_or(LuaValue::Nil)
    }

    /// Raw set. Assigning `nil` removes the entry.
    pub fn set(&mut self, key: LuaValue, value: LuaValue) -> LuaResult<()> {
        let Some(k) = TableKey::from_value(&key) else {
            return Err(LuaError::runtime(if key.is_nil() {
                "table index is nil"
            } else {
                "table index is NaN"
            }));
        };
        if value.is_nil() {
            self.hash.remove(&k);
        } else {
            self.hash.insert(k, value);
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.hash.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hash.is_empty()
    }
}

impl<K: Into<LuaValue>, V: Into<LuaValue>> FromIterator<(K, V)> for LuaTable {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut table = LuaTable::new();
        for (k, v) in iter {
            // nil/NaN keys cannot be stored; skip them like a constructor would fail
            let _ = table.set(k.into(), v.into());
        }
        table
    }
}
