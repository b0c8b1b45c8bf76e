use crate::router::Args;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Value,
    DateTime,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub required: bool,
    pub default: Option<Value>,
    pub kind: ParamKind,
}

/// Declared parameters of a controller action.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamSchema {
    params: Vec<Param>,
}

impl ParamSchema {
    pub fn new() -> Self {
        Self { params: Vec::new() }
    }

    pub fn required(self, name: impl Into<String>) -> Self {
        self.param(Param {
            name: name.into(),
            required: true,
            default: None,
            kind: ParamKind::Value,
        })
    }

    pub fn optional(self, name: impl Into<String>, default: impl Into<Value>) -> Self {
        self.param(Param {
            name: name.into(),
            required: false,
            default: Some(default.into()),
            kind: ParamKind::Value,
        })
    }

    pub fn datetime(self, name: impl Into<String>, required: bool) -> Self {
        self.param(Param {
            name: name.into(),
            required,
            default: None,
            kind: ParamKind::DateTime,
        })
    }

    pub fn param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Param> {
        self.params.iter()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Value(Value),
    DateTime(NaiveDateTime),
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BindError {
    #[error("missing required parameter {0:?}")]
    Missing(String),
    #[error("parameter {name:?} is not a date/time: {value}")]
    DateTime { name: String, value: String },
}

/// Arguments resolved against a [`ParamSchema`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundArgs {
    values: Vec<(String, Arg)>,
    all: Args,
}

impl BoundArgs {
    pub fn get(&self, name: &str) -> Option<&Arg> {
        self.values
            .iter()
            .find_map(|(n, a)| if n == name { Some(a) } else { None })
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        match self.get(name)? {
            Arg::Value(v) => Some(v),
            Arg::DateTime(_) => None,
        }
    }

    pub fn str(&self, name: &str) -> Option<&str> {
        self.value(name)?.as_str()
    }

    pub fn i64(&self, name: &str) -> Option<i64> {
        match self.value(name)? {
            Value::String(s) => s.parse().ok(),
            v => v.as_i64(),
        }
    }

    pub fn datetime(&self, name: &str) -> Option<NaiveDateTime> {
        match self.get(name)? {
            Arg::DateTime(dt) => Some(*dt),
            Arg::Value(_) => None,
        }
    }

    /// The full merged argument map, declared or not.
    pub fn args(&self) -> &Args {
        &self.all
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arg)> + '_ {
        self.values.iter().map(|(n, a)| (n.as_str(), a))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

pub struct ArgumentBinder;

impl ArgumentBinder {
    pub fn bind(schema: &ParamSchema, args: &Args) -> Result<BoundArgs, BindError> {
        let mut values = Vec::with_capacity(schema.len());

        for param in schema.iter() {
            let raw = match args.get(&param.name).filter(|v| !v.is_null()) {
                Some(v) => v.clone(),
                None if param.required => return Err(BindError::Missing(param.name.clone())),
                None => param.default.clone().unwrap_or(Value::Null),
            };

            let arg = match param.kind {
                ParamKind::DateTime if !raw.is_null() => {
                    let dt = parse_datetime(&raw).ok_or_else(|| BindError::DateTime {
                        name: param.name.clone(),
                        value: raw.to_string(),
                    })?;
                    Arg::DateTime(dt)
                }
                _ => Arg::Value(raw),
            };
            values.push((param.name.clone(), arg));
        }

        Ok(BoundArgs {
            values,
            all: args.clone(),
        })
    }
}

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

fn parse_datetime(value: &Value) -> Option<NaiveDateTime> {
    let s = match value {
        Value::Number(n) => {
            return DateTime::<Utc>::from_timestamp(n.as_i64()?, 0).map(|dt| dt.naive_utc());
        }
        Value::String(s) => s.trim(),
        _ => return None,
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return d.and_hms_opt(0, 0, 0);
    }
    s.parse::<i64>()
        .ok()
        .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0))
        .map(|dt| dt.naive_utc())
}
