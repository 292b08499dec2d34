//! The line format: a compact, delimiter-based text encoding.
//!
//! Messages render as `{`-wrapped, `-`-delimited positional fields in
//! linearized declaration order; nested messages nest braces. At the string
//! boundary the outer braces of the top-level message are dropped. Strings
//! percent-encode the nine structural characters, booleans are `1`/`0`, and
//! the empty token stands for null. Lists, sets and maps have no line
//! representation.

use super::{enum_token, narrow_i16, narrow_i32, parse_enum_token};
use crate::descriptors::{TypeHandle, TypeKind, TypeRegistry, resolve_subtype};
use crate::error::FormatError;
use crate::value::Value;

/// Structural characters and their escapes, in priority order: `%` first so
/// decoding never resurrects a structural character.
const ENCODING: [(char, &str); 9] = [
    ('%', "%25"),
    ('.', "%2E"),
    ('-', "%2D"),
    ('/', "%2F"),
    ('[', "%5B"),
    (']', "%5D"),
    ('{', "%7B"),
    ('|', "%7C"),
    ('}', "%7D"),
];

/// Serializes a typed value into its line-format string. Top-level messages
/// drop the outer braces.
pub fn serialize(
    registry: &TypeRegistry,
    ty: TypeHandle,
    value: &Value,
) -> Result<String, FormatError> {
    match registry.kind(ty) {
        TypeKind::Message | TypeKind::Exception => {
            if value.is_null() {
                return Ok(String::new());
            }
            serialize_message_fields(registry, value)
        }
        _ => serialize_token(registry, ty, value),
    }
}

/// Parses a line-format string into a typed value. Top-level messages are
/// read without outer braces.
pub fn parse(registry: &TypeRegistry, ty: TypeHandle, input: &str) -> Result<Value, FormatError> {
    match registry.kind(ty) {
        TypeKind::Message | TypeKind::Exception => {
            if input.is_empty() {
                return Ok(Value::Null);
            }
            let tokens = tokenize(input)?;
            parse_message(registry, ty, &tokens)
        }
        _ => parse_text(registry, ty, input),
    }
}

fn serialize_token(
    registry: &TypeRegistry,
    ty: TypeHandle,
    value: &Value,
) -> Result<String, FormatError> {
    if value.is_null() {
        return Ok(String::new());
    }

    match registry.kind(ty) {
        TypeKind::Bool => match value {
            Value::Bool(true) => Ok("1".to_string()),
            Value::Bool(false) => Ok("0".to_string()),
            other => Err(FormatError::mismatch("bool", other)),
        },
        TypeKind::Int16 => match value {
            Value::I16(v) => Ok(v.to_string()),
            other => Err(FormatError::mismatch("int16", other)),
        },
        TypeKind::Int32 => match value {
            Value::I32(v) => Ok(v.to_string()),
            other => Err(FormatError::mismatch("int32", other)),
        },
        TypeKind::Int64 => match value {
            Value::I64(v) => Ok(v.to_string()),
            other => Err(FormatError::mismatch("int64", other)),
        },
        TypeKind::Float => match value {
            Value::F32(v) => Ok(v.to_string()),
            other => Err(FormatError::mismatch("float", other)),
        },
        TypeKind::Double => match value {
            Value::F64(v) => Ok(v.to_string()),
            other => Err(FormatError::mismatch("double", other)),
        },
        TypeKind::String => match value {
            Value::String(v) => Ok(percent_encode(v)),
            other => Err(FormatError::mismatch("string", other)),
        },
        TypeKind::Enum => enum_token(registry, ty, value),
        TypeKind::Message | TypeKind::Exception => {
            let inner = serialize_message_fields(registry, value)?;
            Ok(format!("{{{inner}}}"))
        }
        TypeKind::Void => Ok(String::new()),
        kind => Err(FormatError::Unsupported {
            kind,
            format: "line",
        }),
    }
}

fn serialize_message_fields(registry: &TypeRegistry, value: &Value) -> Result<String, FormatError> {
    let Value::Message(message) = value else {
        return Err(FormatError::mismatch("message", value));
    };

    let concrete = message.descriptor();
    let node = registry.node(concrete);
    let descriptor = node
        .as_message()
        .ok_or_else(|| FormatError::mismatch("message", value))?;

    let mut tokens = Vec::new();
    for field in descriptor.fields(registry) {
        let field_value = if field.is_set(message.as_ref()) {
            field.get(message.as_ref()).unwrap_or(Value::Null)
        } else {
            Value::Null
        };
        tokens.push(serialize_token(
            registry,
            registry.resolve(field.ty()),
            &field_value,
        )?);
    }

    Ok(tokens.join("-"))
}

fn parse_message(
    registry: &TypeRegistry,
    ty: TypeHandle,
    tokens: &[Token],
) -> Result<Value, FormatError> {
    let concrete = resolve_subtype(registry, ty, |descriptor, field| {
        let position = descriptor
            .fields(registry)
            .iter()
            .position(|f| f.name() == field.name());
        match position.and_then(|p| tokens.get(p)) {
            Some(Token::Text(text)) if text.is_empty() => Ok(None),
            Some(Token::Text(text)) => Ok(Some(text.clone())),
            Some(Token::Group(_)) => Err(FormatError::malformed(
                "discriminator token must be a plain value".to_string(),
            )),
            None => Ok(None),
        }
    })?;

    let node = registry.node(concrete);
    let descriptor = node
        .as_message()
        .ok_or_else(|| FormatError::mismatch("message", &Value::Null))?;

    let mut instance = descriptor.new_instance();
    for (position, field) in descriptor.fields(registry).iter().enumerate() {
        let Some(token) = tokens.get(position) else {
            break;
        };
        let parsed = parse_field_token(registry, registry.resolve(field.ty()), token)?;
        if parsed.is_null() || field.is_discriminator() {
            continue;
        }
        field.set(instance.as_mut(), parsed);
    }

    Ok(Value::Message(instance))
}

fn parse_field_token(
    registry: &TypeRegistry,
    ty: TypeHandle,
    token: &Token,
) -> Result<Value, FormatError> {
    match token {
        Token::Group(children) => match registry.kind(ty) {
            TypeKind::Message | TypeKind::Exception => parse_message(registry, ty, children),
            kind => Err(FormatError::malformed(format!(
                "unexpected nested message for a {kind:?} field"
            ))),
        },
        Token::Text(text) => parse_text(registry, ty, text),
    }
}

fn parse_text(registry: &TypeRegistry, ty: TypeHandle, text: &str) -> Result<Value, FormatError> {
    if text.is_empty() {
        return Ok(Value::Null);
    }

    match registry.kind(ty) {
        TypeKind::Bool => match text {
            "1" => Ok(Value::Bool(true)),
            "0" => Ok(Value::Bool(false)),
            other => Err(FormatError::malformed(format!(
                "failed to parse a boolean from '{other}'"
            ))),
        },
        TypeKind::Int16 => {
            let wide = parse_number::<i64>(text, "int16")?;
            Ok(Value::I16(narrow_i16(wide)?))
        }
        TypeKind::Int32 => {
            let wide = parse_number::<i64>(text, "int32")?;
            Ok(Value::I32(narrow_i32(wide)?))
        }
        TypeKind::Int64 => Ok(Value::I64(parse_number::<i64>(text, "int64")?)),
        TypeKind::Float => Ok(Value::F32(parse_number::<f32>(text, "float")?)),
        TypeKind::Double => Ok(Value::F64(parse_number::<f64>(text, "double")?)),
        TypeKind::String => Ok(Value::String(percent_decode(text))),
        TypeKind::Enum => parse_enum_token(registry, ty, text),
        TypeKind::Message | TypeKind::Exception => Err(FormatError::malformed(format!(
            "expected a braced message, got '{text}'"
        ))),
        TypeKind::Void => Ok(Value::Null),
        kind => Err(FormatError::Unsupported {
            kind,
            format: "line",
        }),
    }
}

fn parse_number<T: std::str::FromStr>(text: &str, target: &str) -> Result<T, FormatError> {
    text.parse::<T>()
        .map_err(|_| FormatError::malformed(format!("failed to parse {target} from '{text}'")))
}

#[derive(Debug, PartialEq)]
enum Token {
    Text(String),
    Group(Vec<Token>),
}

/// Splits a top-level message body into positional tokens, building nested
/// sibling lists through a stack.
///
/// A single `-`-separated field may open several messages (`"{{{"`) and
/// close several (`"3}}"`) at once: leading braces each push the current
/// sibling list, trailing braces each pop it, and the remainder in between
/// is the field's own token.
fn tokenize(input: &str) -> Result<Vec<Token>, FormatError> {
    let mut stack: Vec<Vec<Token>> = Vec::new();
    let mut current: Vec<Token> = Vec::new();

    for field in input.split('-') {
        let mut rest = field;

        let mut opens = 0;
        while let Some(stripped) = rest.strip_prefix('{') {
            opens += 1;
            rest = stripped;
        }

        let mut closes = 0;
        while let Some(stripped) = rest.strip_suffix('}') {
            closes += 1;
            rest = stripped;
        }

        for _ in 0..opens {
            stack.push(std::mem::take(&mut current));
        }

        current.push(Token::Text(rest.to_string()));

        for _ in 0..closes {
            let child = std::mem::take(&mut current);
            current = stack.pop().ok_or_else(|| {
                FormatError::malformed(format!("unbalanced braces in \"{input}\""))
            })?;
            current.push(Token::Group(child));
        }
    }

    if !stack.is_empty() {
        return Err(FormatError::malformed(format!(
            "unbalanced braces in \"{input}\""
        )));
    }

    Ok(current)
}

fn percent_encode(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match ENCODING.iter().find(|(plain, _)| *plain == c) {
            Some((_, escaped)) => out.push_str(escaped),
            None => out.push(c),
        }
    }
    out
}

fn percent_decode(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(position) = rest.find('%') {
        out.push_str(&rest[..position]);
        let candidate = &rest[position..];
        match ENCODING
            .iter()
            .find(|(_, escaped)| candidate.starts_with(*escaped))
        {
            Some((plain, escaped)) => {
                out.push(*plain);
                rest = &candidate[escaped.len()..];
            }
            None => {
                // Unknown escape sequences pass through untouched.
                out.push('%');
                rest = &candidate[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(tokens: &[Token]) -> Vec<String> {
        tokens
            .iter()
            .map(|t| match t {
                Token::Text(s) => s.clone(),
                Token::Group(_) => "<group>".to_string(),
            })
            .collect()
    }

    #[test]
    fn tokenize_flat() {
        let tokens = tokenize("1-2-3").unwrap();
        assert_eq!(texts(&tokens), ["1", "2", "3"]);
    }

    #[test]
    fn tokenize_nested_sibling() {
        let tokens = tokenize("1-{2-3}-4").unwrap();
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0], Token::Text("1".to_string()));
        assert_eq!(
            tokens[1],
            Token::Group(vec![
                Token::Text("2".to_string()),
                Token::Text("3".to_string())
            ])
        );
        assert_eq!(tokens[2], Token::Text("4".to_string()));
    }

    #[test]
    fn tokenize_multiple_opens_and_closes() {
        let tokens = tokenize("{{3}}").unwrap();
        assert_eq!(
            tokens,
            vec![Token::Group(vec![Token::Group(vec![Token::Text(
                "3".to_string()
            )])])]
        );
    }

    #[test]
    fn tokenize_rejects_unbalanced() {
        assert!(tokenize("{1").is_err());
        assert!(tokenize("1}").is_err());
        assert!(tokenize("{1-{2}").is_err());
    }

    #[test]
    fn percent_round_trip() {
        let original = "10%-20.5/{a|b}[c]";
        let encoded = percent_encode(original);
        assert_eq!(encoded, "10%25%2D20%2E5%2F%7Ba%7Cb%7D%5Bc%5D");
        assert_eq!(percent_decode(&encoded), original);
    }

    #[test]
    fn percent_decode_is_single_pass() {
        // "%252E" decodes to "%2E", not ".".
        assert_eq!(percent_decode("%252E"), "%2E");
    }

    #[test]
    fn scalar_tokens() {
        let registry = TypeRegistry::new();
        assert_eq!(
            serialize(&registry, TypeRegistry::BOOL, &Value::Bool(true)).unwrap(),
            "1"
        );
        assert_eq!(
            parse(&registry, TypeRegistry::BOOL, "0").unwrap(),
            Value::Bool(false)
        );
        assert_eq!(
            parse(&registry, TypeRegistry::INT16, "").unwrap(),
            Value::Null
        );
        assert!(parse(&registry, TypeRegistry::INT16, "70000").is_err());
        assert!(parse(&registry, TypeRegistry::BOOL, "true").is_err());
    }
}
