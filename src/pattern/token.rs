use super::PatternError;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Translated,
    Locale,
    Capture,
    Optional,
    Silent,
}

impl Kind {
    fn parse(s: &str) -> Result<Self, PatternError> {
        match s {
            "T" => Ok(Self::Translated),
            "L" => Ok(Self::Locale),
            "C" => Ok(Self::Capture),
            "O" => Ok(Self::Optional),
            "S" => Ok(Self::Silent),
            _ => Err(PatternError::UnknownKind(s.to_owned())),
        }
    }

    fn needs_name(self) -> bool {
        matches!(self, Self::Capture | Self::Optional | Self::Silent)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Token<'p> {
    pub kind: Kind,
    pub prefix: &'p str,
    pub name: Option<&'p str>,
    pub body: &'p str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Piece<'p> {
    Literal(&'p str),
    Token(Token<'p>),
}

pub(crate) fn split(pattern: &str) -> Result<Vec<Piece<'_>>, PatternError> {
    let mut pieces = Vec::new();
    let mut rest = pattern;

    while let Some(start) = rest.find(OPEN) {
        if start > 0 {
            pieces.push(Piece::Literal(&rest[..start]));
        }
        let inner = &rest[start + OPEN.len()..];
        let end = find_close(inner).ok_or_else(|| PatternError::Unterminated(rest[start..].to_owned()))?;
        pieces.push(Piece::Token(parse_token(&inner[..end])?));
        rest = &inner[end + CLOSE.len()..];
    }
    if !rest.is_empty() {
        pieces.push(Piece::Literal(rest));
    }
    Ok(pieces)
}

// Braces inside a token body (regex repetitions like `{2}`) must balance
// before `}}` closes the token.
fn find_close(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    let mut depth: usize = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 1,
            b'{' => depth += 1,
            b'}' if depth > 0 => depth -= 1,
            b'}' if bytes.get(i + 1) == Some(&b'}') => return Some(i),
            _ => {}
        }
        i += 1;
    }
    None
}

fn parse_token(raw: &str) -> Result<Token<'_>, PatternError> {
    let colon = raw
        .find(':')
        .ok_or_else(|| PatternError::UnknownKind(raw.to_owned()))?;
    let kind = Kind::parse(&raw[..colon])?;
    let value = &raw[colon + 1..];

    let (prefix, name, body) = match value.find('<') {
        Some(lt) => {
            let close = value[lt..]
                .find('>')
                .ok_or_else(|| PatternError::InvalidName(value.to_owned()))?;
            let name = &value[lt + 1..lt + close];
            if !is_identifier(name) {
                return Err(PatternError::InvalidName(name.to_owned()));
            }
            (&value[..lt], Some(name), &value[lt + close + 1..])
        }
        None => ("", None, value),
    };

    if kind.needs_name() && name.is_none() {
        return Err(PatternError::MissingName(raw.to_owned()));
    }

    Ok(Token {
        kind,
        prefix,
        name,
        body,
    })
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
