use super::Args;

use std::ops::Deref;
use std::str::FromStr;

use serde_json::Value;
use smallvec::SmallVec;

/// Values captured from a matched path, in pattern order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Captures {
    buf: SmallVec<[(Box<str>, String); 8]>,
}

impl Captures {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.buf
            .iter()
            .find_map(|(k, v)| if name == &**k { Some(v.as_str()) } else { None })
    }

    pub fn parse<T: FromStr>(&self, name: &str) -> Option<Result<T, T::Err>> {
        self.get(name).map(T::from_str)
    }

    /// Captures as string arguments.
    pub fn to_args(&self) -> Args {
        self.buf
            .iter()
            .map(|(k, v)| (k.to_string(), Value::String(v.clone())))
            .collect()
    }
}

impl Deref for Captures {
    type Target = [(Box<str>, String)];
    fn deref(&self) -> &Self::Target {
        &*self.buf
    }
}

impl Captures {
    pub(super) fn new() -> Self {
        Self {
            buf: SmallVec::new(),
        }
    }

    pub(super) fn push(&mut self, name: &str, value: &str) {
        self.buf.push((name.into(), value.to_owned()));
    }
}
