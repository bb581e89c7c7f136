//! Host runtime domain: values, deferreds and the event loop.
//!
//! Models the single-threaded runtime that calls into the OCR layer:
//! its value system, promise-like deferred completions, and the
//! background-work queue (see `env`). Everything here is `!Send`; host
//! values only ever live on the host thread.

mod deferred;
mod env;

pub use deferred::{create_promise, Deferred, Promise, PromiseState};
pub use env::{Env, WorkFailed, WorkTicket};

use std::cell::{Ref, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// Fields of a host record.
pub type HostObject = BTreeMap<String, HostValue>;

/// A value as seen by the host runtime.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum HostValue {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Buffer(HostBuffer),
    Array(Vec<HostValue>),
    Object(HostObject),
}

impl HostValue {
    pub fn object<K, I>(fields: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, HostValue)>,
    {
        HostValue::Object(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// `typeof` as the host reports it. Arrays and buffers are objects.
    pub fn type_of(&self) -> &'static str {
        match self {
            HostValue::Undefined => "undefined",
            HostValue::Null => "object",
            HostValue::Bool(_) => "boolean",
            HostValue::Number(_) => "number",
            HostValue::String(_) => "string",
            HostValue::Buffer(_) | HostValue::Array(_) | HostValue::Object(_) => "object",
        }
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, HostValue::Undefined | HostValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            HostValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            HostValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[HostValue]> {
        match self {
            HostValue::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_buffer(&self) -> Option<&HostBuffer> {
        match self {
            HostValue::Buffer(buffer) => Some(buffer),
            _ => None,
        }
    }

    /// Named property lookup. Only records carry properties.
    pub fn get(&self, key: &str) -> Option<&HostValue> {
        match self {
            HostValue::Object(fields) => fields.get(key),
            _ => None,
        }
    }
}

impl From<&str> for HostValue {
    fn from(value: &str) -> Self {
        HostValue::String(value.to_string())
    }
}

impl From<f64> for HostValue {
    fn from(value: f64) -> Self {
        HostValue::Number(value)
    }
}

impl From<HostBuffer> for HostValue {
    fn from(value: HostBuffer) -> Self {
        HostValue::Buffer(value)
    }
}

/// Byte memory owned by the host. Shared by reference: the host may
/// rewrite or reclaim it at any time after an entry point returns.
#[derive(Clone, Default, PartialEq)]
pub struct HostBuffer(Rc<RefCell<Vec<u8>>>);

impl HostBuffer {
    pub fn from_vec(bytes: Vec<u8>) -> Self {
        Self(Rc::new(RefCell::new(bytes)))
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn bytes(&self) -> Ref<'_, [u8]> {
        Ref::map(self.0.borrow(), |v| v.as_slice())
    }

    /// Replace the contents, as the host does when it recycles memory.
    pub fn overwrite(&self, bytes: &[u8]) {
        let mut inner = self.0.borrow_mut();
        inner.clear();
        inner.extend_from_slice(bytes);
    }
}

impl fmt::Debug for HostBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HostBuffer({} bytes)", self.len())
    }
}

impl From<Vec<u8>> for HostBuffer {
    fn from(bytes: Vec<u8>) -> Self {
        Self::from_vec(bytes)
    }
}

/// Error constructor used on the host side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Error,
    TypeError,
}

/// An error value thrown synchronously or carried by a rejected promise.
#[derive(Debug, Clone, PartialEq)]
pub struct HostError {
    pub class: ErrorClass,
    pub message: String,
}

impl HostError {
    pub fn new(class: ErrorClass, message: impl Into<String>) -> Self {
        Self {
            class,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Error, message)
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::TypeError, message)
    }
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.class {
            ErrorClass::Error => write!(f, "Error: {}", self.message),
            ErrorClass::TypeError => write!(f, "TypeError: {}", self.message),
        }
    }
}

impl std::error::Error for HostError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typeof_matches_host_semantics() {
        assert_eq!(HostValue::Null.type_of(), "object");
        assert_eq!(HostValue::Array(vec![]).type_of(), "object");
        assert_eq!(HostValue::from(HostBuffer::default()).type_of(), "object");
        assert_eq!(HostValue::from("a").type_of(), "string");
        assert_eq!(HostValue::Undefined.type_of(), "undefined");
    }

    #[test]
    fn get_only_reads_records() {
        let record = HostValue::object([("languages", HostValue::from("fr-FR"))]);
        assert_eq!(record.get("languages").and_then(|v| v.as_str()), Some("fr-FR"));
        assert!(HostValue::from("languages").get("languages").is_none());
    }

    #[test]
    fn buffers_share_host_memory() {
        let buffer = HostBuffer::from_vec(vec![1, 2, 3]);
        let alias = buffer.clone();
        alias.overwrite(&[9]);
        assert_eq!(&*buffer.bytes(), &[9]);
        assert_eq!(format!("{:?}", buffer), "HostBuffer(1 bytes)");
    }
}
