use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use regex::Regex;
use serde_json::Value;

/// Validator for a query/post parameter.
#[derive(Debug, Clone)]
pub enum InputType {
    String,
    Int,
    Float,
    Bool,
    Date,
    Pattern(Regex),
}

impl InputType {
    /// Turns a raw parameter into its typed value, `None` when it is invalid.
    pub fn parse(&self, raw: &str) -> Option<Value> {
        match self {
            Self::String => Some(Value::String(raw.to_owned())),
            Self::Int => raw.trim().parse::<i64>().ok().map(Value::from),
            Self::Float => raw
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map(Value::from),
            Self::Bool => match raw.trim() {
                "1" | "true" | "on" | "yes" => Some(Value::Bool(true)),
                "0" | "false" | "off" | "no" | "" => Some(Value::Bool(false)),
                _ => None,
            },
            Self::Date => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                .ok()
                .map(|d| Value::String(d.to_string())),
            Self::Pattern(re) if re.is_match(raw) => Some(Value::String(raw.to_owned())),
            Self::Pattern(_) => None,
        }
    }

    /// A validator accepting values fully matched by `re`.
    pub fn pattern(re: &str) -> Result<Self, regex::Error> {
        Regex::new(&format!("^(?:{})$", re)).map(Self::Pattern)
    }
}

impl FromStr for InputType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "string" | "str" => Ok(Self::String),
            "int" | "integer" => Ok(Self::Int),
            "float" | "number" => Ok(Self::Float),
            "bool" | "boolean" => Ok(Self::Bool),
            "date" => Ok(Self::Date),
            _ => match s.strip_prefix("regex:") {
                Some(re) => Self::pattern(re).map_err(|e| e.to_string()),
                None => Err(format!("unknown input type: {:?}", s)),
            },
        }
    }
}

impl fmt::Display for InputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => f.write_str("string"),
            Self::Int => f.write_str("int"),
            Self::Float => f.write_str("float"),
            Self::Bool => f.write_str("bool"),
            Self::Date => f.write_str("date"),
            Self::Pattern(re) => write!(f, "regex:{}", re.as_str()),
        }
    }
}

/// An expected query/post parameter.
#[derive(Debug, Clone)]
pub struct UserInputSpec {
    pub name: String,
    pub kind: InputType,
    pub mandatory: bool,
}

impl UserInputSpec {
    pub fn new(name: impl Into<String>, kind: InputType, mandatory: bool) -> Self {
        Self {
            name: name.into(),
            kind,
            mandatory,
        }
    }

    pub fn mandatory(name: impl Into<String>, kind: InputType) -> Self {
        Self::new(name, kind, true)
    }

    pub fn optional(name: impl Into<String>, kind: InputType) -> Self {
        Self::new(name, kind, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn validators() {
        assert_eq!(InputType::Int.parse("12"), Some(json!(12)));
        assert_eq!(InputType::Int.parse("x"), None);
        assert_eq!(InputType::Float.parse("1.5"), Some(json!(1.5)));
        assert_eq!(InputType::Float.parse("inf"), None);
        assert_eq!(InputType::Bool.parse("on"), Some(json!(true)));
        assert_eq!(InputType::Bool.parse("maybe"), None);
        assert_eq!(InputType::Date.parse("2024-02-29"), Some(json!("2024-02-29")));
        assert_eq!(InputType::Date.parse("2023-02-29"), None);

        let re: InputType = "regex:[a-z]+".parse().unwrap();
        assert_eq!(re.parse("abc"), Some(json!("abc")));
        assert_eq!(re.parse("abc1"), None);
        assert!("uuid".parse::<InputType>().is_err());
    }
}
