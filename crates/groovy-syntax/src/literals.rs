use crate::lexer::{is_ident_continue, is_ident_start};
use crate::raw::ConstantValue;
use crate::syntax_kind::SyntaxKind;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct LiteralError {
    pub message: String,
}

fn err(message: impl Into<String>) -> LiteralError {
    LiteralError {
        message: message.into(),
    }
}

/// Evaluate a numeric literal token, optionally prefixed with `-`. Unsuffixed
/// integers widen to `Long` and then `BigInteger` when they do not fit.
pub fn parse_number(kind: SyntaxKind, text: &str) -> Result<ConstantValue, LiteralError> {
    let cleaned: String = text.chars().filter(|c| *c != '_').collect();
    let (negative, unsigned) = match cleaned.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, cleaned.as_str()),
    };
    // Hex digits include `b`, `d` and `f`, so those never count as suffixes there.
    let suffixes = if is_radix_literal(unsigned, 16) {
        "lLiIgG"
    } else {
        "lLiIgGfFdD"
    };
    let suffixed = unsigned.chars().last().is_some_and(|c| suffixes.contains(c));
    let digits = if suffixed {
        &unsigned[..unsigned.len() - 1]
    } else {
        unsigned
    };
    let sign = if negative { "-" } else { "" };

    match kind {
        SyntaxKind::IntLiteral => {
            let value = parse_integer(digits, negative)?;
            if suffixed {
                return i32::try_from(value)
                    .map(ConstantValue::Integer)
                    .map_err(|_| err(format!("integer literal out of range: {text}")));
            }
            Ok(match i32::try_from(value) {
                Ok(int) => ConstantValue::Integer(int),
                Err(_) => match i64::try_from(value) {
                    Ok(long) => ConstantValue::Long(long),
                    Err(_) => ConstantValue::BigInteger(value.to_string()),
                },
            })
        }
        SyntaxKind::LongLiteral => {
            let value = parse_integer(digits, negative)?;
            i64::try_from(value)
                .map(ConstantValue::Long)
                .map_err(|_| err(format!("long literal out of range: {text}")))
        }
        SyntaxKind::BigIntegerLiteral => Ok(ConstantValue::BigInteger(
            parse_integer(digits, negative)?.to_string(),
        )),
        SyntaxKind::FloatLiteral => format!("{sign}{digits}")
            .parse::<f32>()
            .map(ConstantValue::Float)
            .map_err(|_| err(format!("malformed float literal: {text}"))),
        SyntaxKind::DoubleLiteral => format!("{sign}{digits}")
            .parse::<f64>()
            .map(ConstantValue::Double)
            .map_err(|_| err(format!("malformed double literal: {text}"))),
        SyntaxKind::BigDecimalLiteral => {
            if digits.parse::<f64>().is_err() {
                return Err(err(format!("malformed decimal literal: {text}")));
            }
            Ok(ConstantValue::BigDecimal(format!("{sign}{digits}")))
        }
        _ => Err(err(format!("not a number literal: {kind:?}"))),
    }
}

fn is_radix_literal(text: &str, radix: u32) -> bool {
    let prefix = match radix {
        16 => ["0x", "0X"],
        _ => ["0b", "0B"],
    };
    prefix.iter().any(|p| text.starts_with(p))
}

fn parse_integer(digits: &str, negative: bool) -> Result<i128, LiteralError> {
    let (radix, body) = if is_radix_literal(digits, 16) {
        (16, &digits[2..])
    } else if is_radix_literal(digits, 2) {
        (2, &digits[2..])
    } else if digits.len() > 1 && digits.starts_with('0') {
        (8, &digits[1..])
    } else {
        (10, digits)
    };
    let magnitude = u128::from_str_radix(body, radix)
        .ok()
        .and_then(|value| i128::try_from(value).ok())
        .ok_or_else(|| err(format!("malformed integer literal: {digits}")))?;
    Ok(if negative { -magnitude } else { magnitude })
}

/// Strip the quotes from a string literal token and process escapes.
pub fn unescape_string(text: &str) -> Result<String, LiteralError> {
    let body = strip_quotes(text).ok_or_else(|| err("malformed string literal"))?;
    unescape(body)
}

pub(crate) fn strip_quotes(text: &str) -> Option<&str> {
    for delimiter in ["'''", "\"\"\"", "'", "\""] {
        if text.len() >= delimiter.len() * 2
            && text.starts_with(delimiter)
            && text.ends_with(delimiter)
        {
            return Some(&text[delimiter.len()..text.len() - delimiter.len()]);
        }
    }
    None
}

pub fn unescape(body: &str) -> Result<String, LiteralError> {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        let Some(escaped) = chars.next() else {
            return Err(err("dangling escape at end of string"));
        };
        match escaped {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            's' => out.push(' '),
            '0' => out.push('\0'),
            '\\' | '\'' | '"' | '$' => out.push(escaped),
            '\n' => {}
            'u' => {
                let hex: String = chars.by_ref().take(4).collect();
                let code = u32::from_str_radix(&hex, 16)
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or_else(|| err(format!("invalid unicode escape: \\u{hex}")))?;
                out.push(code);
            }
            other => return Err(err(format!("invalid escape sequence: \\{other}"))),
        }
    }
    Ok(out)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GStringPart {
    Text(String),
    /// Interpolated source; `offset` is the byte offset of `source` inside the
    /// literal's body.
    Value { source: String, offset: usize },
}

/// Split the body of an interpolated string into literal text and `$`
/// expressions. Literal text is left escaped; the caller unescapes it.
pub fn split_gstring(body: &str) -> Vec<GStringPart> {
    let mut parts = Vec::new();
    let mut text = String::new();
    let bytes = body.as_bytes();
    let mut idx = 0;
    while idx < body.len() {
        let Some(ch) = body[idx..].chars().next() else {
            break;
        };
        if ch == '\\' {
            text.push(ch);
            if let Some(next) = body[idx + 1..].chars().next() {
                text.push(next);
                idx += 1 + next.len_utf8();
            } else {
                idx += 1;
            }
            continue;
        }
        if ch == '$' && bytes.get(idx + 1) == Some(&b'{') {
            let start = idx + 2;
            let end = matching_brace(body, start).unwrap_or(body.len());
            parts.push(GStringPart::Text(std::mem::take(&mut text)));
            parts.push(GStringPart::Value {
                source: body[start..end].to_string(),
                offset: start,
            });
            idx = (end + 1).min(body.len());
            continue;
        }
        if ch == '$' && body[idx + 1..].chars().next().is_some_and(|c| c != '$' && is_ident_start(c)) {
            let start = idx + 1;
            let mut end = start;
            loop {
                while let Some(c) = body[end..].chars().next().filter(|c| is_ident_continue(*c)) {
                    end += c.len_utf8();
                }
                // `$a.b` continues the path only if an identifier follows the dot.
                if bytes.get(end) == Some(&b'.')
                    && body[end + 1..].chars().next().is_some_and(is_ident_start)
                {
                    end += 1;
                    continue;
                }
                break;
            }
            parts.push(GStringPart::Text(std::mem::take(&mut text)));
            parts.push(GStringPart::Value {
                source: body[start..end].to_string(),
                offset: start,
            });
            idx = end;
            continue;
        }
        text.push(ch);
        idx += ch.len_utf8();
    }
    parts.push(GStringPart::Text(text));
    parts
}

fn matching_brace(body: &str, start: usize) -> Option<usize> {
    let mut depth = 1u32;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (offset, ch) in body[start..].char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == q {
                quote = None;
            }
            continue;
        }
        match ch {
            '\'' | '"' => quote = Some(ch),
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(start + offset);
                }
            }
            _ => {}
        }
    }
    None
}
