//! The `{{KIND:value}}` placeholder language.
//!
//! A pattern is compiled forward into an unanchored regex body used for
//! matching, or reverse into the literal path for a set of values. Literal
//! text between tokens is regex source in forward mode and is emitted as-is in
//! reverse mode.

mod locale;
mod slug;
mod token;

pub use self::locale::{Locales, TranslationTable};
pub use self::slug::urlize;
pub use self::token::Kind;

use self::token::{Piece, Token};
use crate::router::Args;

use serde_json::Value;

const DEFAULT_BODY: &str = "[^/]+";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatternError {
    #[error("unknown placeholder kind: {0:?}")]
    UnknownKind(String),
    #[error("unterminated placeholder: {0:?}")]
    Unterminated(String),
    #[error("placeholder requires a <name>: {0:?}")]
    MissingName(String),
    #[error("invalid placeholder name: {0:?}")]
    InvalidName(String),
    #[error("patterns are anchored by the router, remove `^`/`$`")]
    Anchored,
    #[error("locale placeholder used but no locale is available")]
    NoLocales,
    #[error("missing value for placeholder {0:?}")]
    MissingValue(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    pub kind: Kind,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledPattern {
    source: String,
    placeholders: Vec<Placeholder>,
}

impl CompiledPattern {
    /// The unanchored regex body.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn placeholders(&self) -> &[Placeholder] {
        &self.placeholders
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.placeholders.iter().filter_map(|p| p.name.as_deref())
    }

    /// Names whose values show up in a match.
    pub fn capture_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.placeholders
            .iter()
            .filter(|p| p.kind != Kind::Silent)
            .filter_map(|p| p.name.as_deref())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PatternCompiler<'a> {
    locales: &'a Locales,
}

impl<'a> PatternCompiler<'a> {
    pub fn new(locales: &'a Locales) -> Self {
        Self { locales }
    }

    pub fn compile(&self, pattern: &str) -> Result<CompiledPattern, PatternError> {
        if is_anchored(pattern) {
            return Err(PatternError::Anchored);
        }

        let mut source = String::with_capacity(pattern.len() * 2);
        let mut placeholders = Vec::new();

        for piece in token::split(pattern)? {
            let t = match piece {
                Piece::Literal(lit) => {
                    source.push_str(lit);
                    continue;
                }
                Piece::Token(t) => t,
            };
            self.compile_token(&t, &mut source)?;
            placeholders.push(Placeholder {
                kind: t.kind,
                name: t.name.map(ToOwned::to_owned),
            });
        }

        Ok(CompiledPattern {
            source,
            placeholders,
        })
    }

    fn compile_token(&self, t: &Token<'_>, out: &mut String) -> Result<(), PatternError> {
        let body = if t.body.is_empty() { DEFAULT_BODY } else { t.body };
        match t.kind {
            Kind::Capture => {
                out.push_str(t.prefix);
                push_group(out, t.name, body);
            }
            Kind::Optional => {
                out.push_str("(?:");
                out.push_str(t.prefix);
                push_group(out, t.name, body);
                out.push_str(")?");
            }
            Kind::Silent => {
                out.push_str(t.prefix);
                push_group(out, None, body);
            }
            Kind::Translated => {
                let table = self.locales.translations();
                let mut words: Vec<&str> = Vec::new();
                for key in t.body.split('|') {
                    for w in table.words(key) {
                        if !words.contains(&w) {
                            words.push(w);
                        }
                    }
                }
                out.push_str(t.prefix);
                push_group(out, t.name, &alternation(&words));
            }
            Kind::Locale => {
                let codes: Vec<&str> = self.locales.available().iter().map(String::as_str).collect();
                if codes.is_empty() {
                    return Err(PatternError::NoLocales);
                }
                out.push_str(t.prefix);
                push_group(out, t.name, &alternation(&codes));
            }
        }
        Ok(())
    }

    /// Renders `pattern` with concrete values.
    ///
    /// `urlize` applies slug normalization to C/O/S values.
    pub fn generate(
        &self,
        pattern: &str,
        data: &Args,
        locale: &str,
        urlize: bool,
    ) -> Result<String, PatternError> {
        let mut out = String::with_capacity(pattern.len());

        for piece in token::split(pattern)? {
            let t = match piece {
                Piece::Literal(lit) => {
                    out.push_str(lit);
                    continue;
                }
                Piece::Token(t) => t,
            };
            match t.kind {
                Kind::Capture | Kind::Silent | Kind::Optional => {
                    // name presence is checked by the tokenizer
                    let name = t.name.unwrap_or_default();
                    // a value that normalizes to nothing counts as absent
                    let value = data
                        .get(name)
                        .and_then(value_text)
                        .map(|v| if urlize { slug::urlize(&v) } else { v })
                        .filter(|v| !v.is_empty());
                    let value = match value {
                        Some(v) => v,
                        None if t.kind == Kind::Optional => continue,
                        None => return Err(PatternError::MissingValue(name.to_owned())),
                    };
                    out.push_str(t.prefix);
                    out.push_str(&value);
                }
                Kind::Translated => {
                    out.push_str(t.prefix);
                    let mut keys = t.body.split('|');
                    match (keys.next(), keys.next()) {
                        (Some(key), None) => {
                            let word = self.locales.translations().translate(key, locale);
                            out.push_str(word.unwrap_or(key));
                        }
                        _ => {
                            let value = t
                                .name
                                .and_then(|n| data.get(n))
                                .and_then(value_text)
                                .ok_or_else(|| {
                                    PatternError::MissingValue(t.name.unwrap_or(t.body).to_owned())
                                })?;
                            out.push_str(&value);
                        }
                    }
                }
                Kind::Locale => {
                    out.push_str(t.prefix);
                    out.push_str(locale);
                }
            }
        }

        Ok(out)
    }
}

/// Text form of a JSON value as it appears in a URL. `null` has none.
pub(crate) fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn push_group(out: &mut String, name: Option<&str>, body: &str) {
    match name {
        Some(name) => {
            out.push_str("(?P<");
            out.push_str(name);
            out.push('>');
        }
        None => out.push_str("(?:"),
    }
    out.push_str(body);
    out.push(')');
}

fn alternation(words: &[&str]) -> String {
    let escaped: Vec<String> = words.iter().map(|w| regex::escape(w)).collect();
    escaped.join("|")
}

pub(crate) fn is_anchored(pattern: &str) -> bool {
    if pattern.starts_with('^') {
        return true;
    }
    match pattern.strip_suffix('$') {
        Some(rest) => {
            let slashes = rest.chars().rev().take_while(|&c| c == '\\').count();
            slashes % 2 == 0
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn locales() -> Locales {
        let mut table = TranslationTable::new();
        table
            .insert("about", "en", "about")
            .insert("about", "fr", "apropos")
            .insert("news", "en", "news")
            .insert("news", "fr", "actualites");
        Locales::new(vec!["en", "fr"]).with_translations(table)
    }

    fn args(v: Value) -> Args {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn forward_captures() {
        let locales = locales();
        let c = PatternCompiler::new(&locales);

        let p = c.compile("/user/{{C:<id>[0-9]+}}").unwrap();
        assert_eq!(p.source(), "/user/(?P<id>[0-9]+)");

        let p = c.compile("/list{{O:/page-<page>}}").unwrap();
        assert_eq!(p.source(), "/list(?:/page-(?P<page>[^/]+))?");

        let p = c.compile("/{{S:<slug>[a-z-]+}}/x").unwrap();
        assert_eq!(p.source(), "/(?:[a-z-]+)/x");
        assert_eq!(p.names().collect::<Vec<_>>(), vec!["slug"]);
        assert_eq!(p.capture_names().count(), 0);
    }

    #[test]
    fn forward_locale_and_translation() {
        let locales = locales();
        let c = PatternCompiler::new(&locales);

        let p = c.compile("/{{L:<lang>}}/{{T:about}}").unwrap();
        assert_eq!(p.source(), "/(?P<lang>en|fr)/(?:about|apropos)");

        let p = c.compile("/{{T:<section>about|news}}").unwrap();
        assert_eq!(
            p.source(),
            "/(?P<section>about|apropos|news|actualites)"
        );

        let empty = Locales::default();
        assert_eq!(
            PatternCompiler::new(&empty).compile("/{{L:}}"),
            Err(PatternError::NoLocales)
        );
    }

    #[test]
    fn compile_is_deterministic() {
        let locales = locales();
        let c = PatternCompiler::new(&locales);
        let pattern = "/{{L:}}/{{T:<s>about|news}}/{{C:<id>}}{{O:.<fmt>json|xml}}";
        assert_eq!(c.compile(pattern).unwrap(), c.compile(pattern).unwrap());
    }

    #[test]
    fn anchors_are_rejected() {
        let locales = Locales::default();
        let c = PatternCompiler::new(&locales);
        assert_eq!(c.compile("^/a"), Err(PatternError::Anchored));
        assert_eq!(c.compile("/a$"), Err(PatternError::Anchored));
        assert!(c.compile("/price\\$").is_ok());
    }

    #[test]
    fn reverse_values() {
        let locales = locales();
        let c = PatternCompiler::new(&locales);

        let data = args(json!({ "id": 42, "title": "Hello World" }));
        assert_eq!(
            c.generate("/user/{{C:<id>[0-9]+}}/{{C:<title>}}", &data, "en", true)
                .unwrap(),
            "/user/42/hello-world"
        );
        assert_eq!(
            c.generate("/user/{{C:<title>}}", &data, "en", false).unwrap(),
            "/user/Hello World"
        );
        assert_eq!(
            c.generate("/list{{O:/page-<page>}}", &data, "en", true).unwrap(),
            "/list"
        );
        assert_eq!(
            c.generate("/x/{{C:<missing>}}", &data, "en", true),
            Err(PatternError::MissingValue("missing".to_owned()))
        );
        assert_eq!(
            c.generate("/x/{{S:<missing>}}", &data, "en", true),
            Err(PatternError::MissingValue("missing".to_owned()))
        );
    }

    #[test]
    fn empty_slugs_count_as_absent() {
        let locales = locales();
        let c = PatternCompiler::new(&locales);

        let data = args(json!({ "cat": "books", "page": "!!" }));
        let pattern = "/list/{{C:<cat>}}{{O:/page-<page>[a-z0-9-]+}}";
        assert_eq!(c.generate(pattern, &data, "en", true).unwrap(), "/list/books");
        assert_eq!(
            c.generate(pattern, &data, "en", false).unwrap(),
            "/list/books/page-!!"
        );

        let data = args(json!({ "cat": "?" }));
        assert_eq!(
            c.generate(pattern, &data, "en", true),
            Err(PatternError::MissingValue("cat".to_owned()))
        );
    }

    #[test]
    fn reverse_locale_and_translation() {
        let locales = locales();
        let c = PatternCompiler::new(&locales);
        let empty = Args::new();

        assert_eq!(
            c.generate("/{{L:}}/{{T:about}}", &empty, "fr", true).unwrap(),
            "/fr/apropos"
        );
        assert_eq!(
            c.generate("/{{T:contact}}", &empty, "fr", true).unwrap(),
            "/contact"
        );

        let multi = "/{{T:<section>about|news}}";
        assert_eq!(
            c.generate(multi, &empty, "fr", true),
            Err(PatternError::MissingValue("section".to_owned()))
        );
        let data = args(json!({ "section": "actualites" }));
        assert_eq!(c.generate(multi, &data, "fr", true).unwrap(), "/actualites");
    }
}
