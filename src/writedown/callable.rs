//! # Callables
//!
//! Handlers, fallbacks and filters are passed around as [`Callable`]s so that callers can
//! hand over whatever they have at hand: a closure, a method bound to the
//! [`WriteDownApi`] namespace, or just the method's name. Names are only looked up when
//! the callable is applied (see [`WriteDownApi::apply`]), so a name can refer to a method
//! registered after the callable was built.
//!
//! Arguments and results travel as [`Value`]s.

use crate::api::WriteDownApi;
use crate::error::{Result, WriteDownError};
use crate::model::CmdResult;
use std::fmt;
use std::rc::Rc;

/// Dynamic value passed to and returned from callables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Value {
    #[default]
    Nil,
    Bool(bool),
    Int(i64),
    Text(String),
    Reply(CmdResult),
}

impl Value {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Integer view of the value, parsing text when needed (`"41"` → `41`).
    pub fn to_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            Value::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// `Nil` and `false` are falsy, everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }

    pub fn into_reply(self) -> Option<CmdResult> {
        match self {
            Value::Reply(reply) => Some(reply),
            _ => None,
        }
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Nil
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<CmdResult> for Value {
    fn from(reply: CmdResult) -> Self {
        Value::Reply(reply)
    }
}

/// Signature of a method on the default receiver.
pub type MethodFn = fn(&WriteDownApi, &[Value]) -> Result<Value>;

/// Signature of an inline callable.
pub type InlineFn = dyn Fn(&[Value]) -> Result<Value>;

/// A method bound to the default receiver.
#[derive(Clone, Copy)]
pub struct Method {
    pub name: &'static str,
    pub func: MethodFn,
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Method({})", self.name)
    }
}

/// Anything that can be applied to a list of [`Value`]s.
#[derive(Clone)]
pub enum Callable {
    Inline(Rc<InlineFn>),
    Method(Method),
    Symbol(&'static str),
    Name(String),
}

impl Callable {
    pub fn inline<F>(f: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value> + 'static,
    {
        Callable::Inline(Rc::new(f))
    }

    /// The method name this callable refers to, if it refers to one.
    pub fn name(&self) -> Option<&str> {
        match self {
            Callable::Inline(_) => None,
            Callable::Method(m) => Some(m.name),
            Callable::Symbol(name) => Some(name),
            Callable::Name(name) => Some(name),
        }
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Callable::Inline(_) => write!(f, "Inline(<closure>)"),
            Callable::Method(m) => write!(f, "{:?}", m),
            Callable::Symbol(name) => write!(f, "Symbol(:{})", name),
            Callable::Name(name) => write!(f, "Name({:?})", name),
        }
    }
}

impl From<Method> for Callable {
    fn from(method: Method) -> Self {
        Callable::Method(method)
    }
}

impl From<String> for Callable {
    fn from(name: String) -> Self {
        Callable::Name(name)
    }
}

/// Callables written in configuration files are method names.
impl TryFrom<&serde_json::Value> for Callable {
    type Error = WriteDownError;

    fn try_from(value: &serde_json::Value) -> Result<Self> {
        match value {
            serde_json::Value::String(name) if !name.trim().is_empty() => {
                Ok(Callable::Name(name.trim().to_string()))
            }
            other => Err(WriteDownError::InvalidCallableKind(other.to_string())),
        }
    }
}

/// Something that can apply callables: the default receiver.
pub trait Dispatch {
    fn apply(&self, f: &Callable, args: &[Value]) -> Result<Value>;
}
