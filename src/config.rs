//! Route tables loaded from JSON or TOML.
//!
//! ```json
//! {
//!   "locales": ["en", "fr"],
//!   "translations": { "about": { "en": "about", "fr": "apropos" } },
//!   "routes": [
//!     "GET /{{T:about}} >>> Pages::about",
//!     { "name": "user", "match": "/user/{{C:<id>\\d+}}", "handler": ["User", "show"] },
//!     { "name": 404, "handler": "Errors::missing" }
//!   ]
//! }
//! ```

use crate::handler::HandlerRef;
use crate::pattern::{Locales, TranslationTable};
use crate::route::{
    InputType, RouteDefinition, RouteEntry, RouteGroup, RouteOptions, RouteSettings,
    UserInputSpec,
};
use crate::router::{Args, Router, RouterError};

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use http::{Method, StatusCode};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read route source: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid json route source: {0}")]
    Json(#[from] serde_json::Error),
    #[cfg(feature = "toml")]
    #[error("invalid toml route source: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid route entry: {0}")]
    Invalid(String),
    #[error(transparent)]
    Router(#[from] RouterError),
}

/// A whole route table with its locales.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RouteSource {
    pub locales: Vec<String>,
    pub translations: TranslationTable,
    pub routes: Vec<RouteSpec>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RouteSpec {
    /// `"[METHOD ]pattern >>> handler"`
    Line(String),
    Table(RouteTable),
}

/// A route, or a group when `routes` is present.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RouteTable {
    pub name: Option<NameSpec>,
    #[serde(rename = "match")]
    pub pattern: Option<String>,
    pub method: Option<String>,
    pub handler: Option<HandlerSpec>,
    pub inputs: Vec<InputSpec>,
    pub args: Args,
    pub options: BTreeMap<String, Value>,
    pub response_code: Option<u16>,
    pub routes: Option<Vec<RouteSpec>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum NameSpec {
    Status(u16),
    Text(String),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum HandlerSpec {
    /// `"Class::method"` or `"Class"`
    Target(String),
    /// `["Class", "method"]`
    Pair(String, String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct InputSpec {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub mandatory: bool,
}

impl RouteSource {
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(s)?)
    }

    #[cfg(feature = "toml")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Reads a file, TOML when the extension says so and JSON otherwise.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            #[cfg(feature = "toml")]
            Some("toml") => Self::from_toml_str(&content),
            _ => Self::from_json_str(&content),
        }
    }

    pub fn locales(&self) -> Locales {
        Locales::new(self.locales.iter().cloned()).with_translations(self.translations.clone())
    }

    pub fn entries(&self) -> Result<Vec<RouteEntry>, ConfigError> {
        self.routes.iter().map(RouteSpec::to_entry).collect()
    }

    pub fn into_router(self) -> Result<Router, ConfigError> {
        let entries = self.entries()?;
        let mut router = Router::with_locales(self.locales());
        router.try_insert_all(entries)?;
        Ok(router)
    }
}

impl RouteSpec {
    pub fn to_entry(&self) -> Result<RouteEntry, ConfigError> {
        match self {
            Self::Line(line) => Ok(RouteEntry::Line(line.clone())),
            Self::Table(table) => table.to_entry(),
        }
    }
}

impl RouteTable {
    pub fn to_entry(&self) -> Result<RouteEntry, ConfigError> {
        let settings = self.settings()?;

        if let Some(ref children) = self.routes {
            let mut group = match self.name {
                Some(NameSpec::Text(ref name)) => RouteGroup::new(name.as_str()),
                Some(NameSpec::Status(code)) => {
                    return Err(ConfigError::Invalid(format!(
                        "group cannot be named after status {}",
                        code
                    )))
                }
                None => RouteGroup::anonymous(),
            };
            if let Some(ref pattern) = self.pattern {
                group = group.matching(pattern.as_str());
            }
            group.settings = settings;
            for child in children {
                group.push(child.to_entry()?);
            }
            return Ok(group.into());
        }

        let mut route = match self.name {
            Some(NameSpec::Status(code)) => RouteDefinition::error(status(code)?),
            Some(NameSpec::Text(ref name)) => {
                RouteDefinition::new(self.pattern.clone().unwrap_or_default()).name(name.as_str())
            }
            None => match self.pattern {
                Some(ref pattern) => RouteDefinition::new(pattern.as_str()),
                None => return Err(ConfigError::Invalid("route without name or match".into())),
            },
        };
        route.settings = settings;
        Ok(route.into())
    }

    fn settings(&self) -> Result<RouteSettings, ConfigError> {
        let method = match self.method {
            Some(ref m) => Some(
                Method::from_bytes(m.to_ascii_uppercase().as_bytes())
                    .map_err(|_| ConfigError::Invalid(format!("invalid method {:?}", m)))?,
            ),
            None => None,
        };

        let handler = self.handler.as_ref().map(|h| match h {
            HandlerSpec::Target(s) => HandlerRef::parse(s),
            HandlerSpec::Pair(class, method) => HandlerRef::from((class.as_str(), method.as_str())),
        });

        let inputs = self
            .inputs
            .iter()
            .map(|i| {
                let kind = i
                    .kind
                    .parse::<InputType>()
                    .map_err(|e| ConfigError::Invalid(format!("input {:?}: {}", i.name, e)))?;
                Ok(UserInputSpec::new(i.name.as_str(), kind, i.mandatory))
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        let response_code = self.response_code.map(status).transpose()?;

        Ok(RouteSettings {
            method,
            handler,
            inputs,
            args: self.args.clone(),
            conditions: Vec::new(),
            options: RouteOptions::from_map(self.options.clone())?,
            response_code,
        })
    }
}

fn status(code: u16) -> Result<StatusCode, ConfigError> {
    StatusCode::from_u16(code).map_err(|_| ConfigError::Invalid(format!("invalid status {}", code)))
}
