use super::{Args, Router, RouterError};

use crate::pattern::{value_text, PatternCompiler, PatternError};

use std::fmt;

use http::{Method, Uri};
use url::form_urlencoded;

/// A generated URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Link {
    scheme: Option<String>,
    host: Option<String>,
    path: String,
    query: Option<String>,
    fragment: Option<String>,
}

impl Link {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = Some(scheme.into());
        self
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn with_fragment(mut self, fragment: impl Into<String>) -> Self {
        self.fragment = Some(fragment.into());
        self
    }

    pub fn scheme(&self) -> Option<&str> {
        self.scheme.as_deref()
    }

    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn fragment(&self) -> Option<&str> {
        self.fragment.as_deref()
    }

    /// Drops the fragment, which `Uri` cannot hold.
    pub fn to_uri(&self) -> Result<Uri, http::Error> {
        let mut builder = Uri::builder();
        if let Some(ref host) = self.host {
            builder = builder
                .scheme(self.scheme.as_deref().unwrap_or("http"))
                .authority(host.as_str());
        }
        let path_and_query = match self.query {
            Some(ref q) => format!("{}?{}", self.path, q),
            None => self.path.clone(),
        };
        builder.path_and_query(path_and_query.as_str()).build()
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref host) = self.host {
            write!(f, "{}://{}", self.scheme.as_deref().unwrap_or("http"), host)?;
        }
        f.write_str(&self.path)?;
        if let Some(ref q) = self.query {
            write!(f, "?{}", q)?;
        }
        if let Some(ref frag) = self.fragment {
            write!(f, "#{}", frag)?;
        }
        Ok(())
    }
}

// Body-submitting verbs usually carry their inputs in the request body.
fn submits_body(method: Option<&Method>) -> bool {
    matches!(method, Some(m) if *m == Method::POST || *m == Method::PUT || *m == Method::DELETE)
}

impl Router {
    /// Builds the URL of a named route for `locale`.
    ///
    /// Values not consumed by placeholders go to the query string when the
    /// route declares them as inputs.
    pub fn url_for(&self, name: &str, data: &Args, locale: &str) -> Result<Link, RouterError> {
        let route = self
            .route(name)
            .ok_or_else(|| RouterError::UnknownRoute(name.to_owned()))?;

        let path = PatternCompiler::new(&self.locales)
            .generate(route.pattern(), data, locale, route.urlize())
            .map_err(|e| match e {
                PatternError::MissingValue(n) => RouterError::MissingValue {
                    route: name.to_owned(),
                    name: n,
                },
                source => RouterError::Pattern {
                    pattern: route.pattern().to_owned(),
                    source,
                },
            })?;

        let consumed: Vec<&str> = route.compiled().names().collect();
        let mut query = form_urlencoded::Serializer::new(String::new());
        let mut has_query = false;

        for input in route.inputs() {
            if consumed.contains(&input.name.as_str()) {
                continue;
            }
            match data.get(&input.name).and_then(value_text) {
                Some(v) => {
                    query.append_pair(&input.name, &v);
                    has_query = true;
                }
                None if input.mandatory && !submits_body(route.method()) => {
                    return Err(RouterError::MissingValue {
                        route: name.to_owned(),
                        name: input.name.clone(),
                    });
                }
                None => {}
            }
        }

        let mut link = Link::new(path);
        if has_query {
            link = link.with_query(query.finish());
        }
        Ok(link)
    }
}
