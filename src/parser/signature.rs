//! Signature parser.
//!
//! Accepts the PDoc call forms:
//!
//! - `recv.name(a, b) -> Type`: static member
//! - `recv#name(a, b)`: instance member
//! - `new Name([a][, b])`: constructor; `[...]` groups mark optional parameters
//! - `name(buf, callback(error, result))`: callback parameters with arguments
//!
//! [`Signature`]'s `Display` writes the signature back out. Bracket layouts
//! other than the canonical `[a][, b]` (e.g. `a, [b]` or `[a, b]`) are kept on
//! the parameters, so parse then print is the identity modulo whitespace.

use crate::error::SignatureError;
use crate::model::{Brackets, DocEntity, EntityKind, MemberScope, ParamSpec, TypeRef};
use std::fmt;

/// Structured call descriptor of one signature line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub kind: EntityKind,
    /// Owning path before the last `.` or `#`
    pub receiver: Option<String>,
    pub scope: MemberScope,
    pub name: String,
    pub parameters: Vec<ParamSpec>,
    pub returns: Option<TypeRef>,
}

impl Signature {
    /// Rebuild the descriptor of a callable entity.
    pub fn of(entity: &DocEntity) -> Option<Signature> {
        if !entity.is_callable() {
            return None;
        }
        let receiver = match entity.kind {
            // `Class.new` belongs to `Class`, whose own receiver is the prefix
            EntityKind::Constructor => entity
                .parent
                .as_deref()
                .and_then(|class| class.rsplit_once(['.', '#']))
                .map(|(recv, _)| recv.to_string()),
            _ => entity.parent.clone(),
        };
        Some(Signature {
            kind: entity.kind,
            receiver,
            scope: entity.scope,
            name: entity.name.clone(),
            parameters: entity.parameters.clone(),
            returns: entity.returns.clone(),
        })
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.kind == EntityKind::Constructor {
            f.write_str("new ")?;
        }
        if let Some(ref receiver) = self.receiver {
            write!(f, "{}{}", receiver, self.scope.separator())?;
        }
        write!(f, "{}(", self.name)?;
        write_params(f, &self.parameters)?;
        f.write_str(")")?;
        if let Some(ref returns) = self.returns {
            write!(f, " -> {}", returns)?;
        }
        Ok(())
    }
}

fn write_params(f: &mut fmt::Formatter<'_>, params: &[ParamSpec]) -> fmt::Result {
    for (i, param) in params.iter().enumerate() {
        let first = i == 0;
        let layout = param
            .brackets
            .unwrap_or_else(|| Brackets::canonical(param.optional, first));
        if !first && !layout.comma_inside {
            f.write_str(", ")?;
        }
        f.write_str(&"[".repeat(layout.open))?;
        if !first && layout.comma_inside {
            f.write_str(", ")?;
        }
        write_param(f, param)?;
        f.write_str(&"]".repeat(layout.close))?;
    }
    Ok(())
}

fn write_param(f: &mut fmt::Formatter<'_>, param: &ParamSpec) -> fmt::Result {
    f.write_str(&param.name)?;
    if !param.arguments.is_empty() {
        f.write_str("(")?;
        write_params(f, &param.arguments)?;
        f.write_str(")")?;
    }
    Ok(())
}

/// Parse one signature line.
pub fn parse(line: &str) -> Result<Signature, SignatureError> {
    let text = line.trim();

    let (kind, head_start) = match text.strip_prefix("new") {
        Some(rest) if rest.starts_with(char::is_whitespace) => {
            (EntityKind::Constructor, text.len() - rest.trim_start().len())
        }
        _ => (EntityKind::Method, 0),
    };

    let open = match text.find('(') {
        Some(open) => open,
        None => return Err(SignatureError::MissingArguments),
    };
    if let Some(close) = text[..open].find(')') {
        return Err(SignatureError::UnmatchedClose {
            column: column(text, close),
        });
    }

    let head = text[head_start..open].trim();
    let (receiver, scope, name) = match head.rfind(['.', '#']) {
        Some(i) => {
            let scope = if head[i..].starts_with('#') {
                MemberScope::Instance
            } else {
                MemberScope::Static
            };
            let receiver = &head[..i];
            if receiver.is_empty() {
                return Err(SignatureError::MissingName);
            }
            (Some(receiver.to_string()), scope, &head[i + 1..])
        }
        None => (None, MemberScope::Static, head),
    };
    if name.is_empty() {
        return Err(SignatureError::MissingName);
    }

    let close = matching_paren(text, open).ok_or(SignatureError::UnclosedParen)?;
    let parameters = ParamScanner::new(&text[open + 1..close], open + 1).list()?;

    let rest = &text[close + 1..];
    if let Some(stray) = rest.find(')') {
        return Err(SignatureError::UnmatchedClose {
            column: column(text, close + 1 + stray),
        });
    }
    let rest = rest.trim();
    let returns = if rest.is_empty() {
        None
    } else if let Some(ty) = rest.strip_prefix("->") {
        let ty = ty.trim();
        if ty.is_empty() {
            return Err(SignatureError::MissingReturnType);
        }
        Some(TypeRef::new(ty))
    } else {
        return Err(SignatureError::TrailingText {
            text: rest.to_string(),
        });
    };

    Ok(Signature {
        kind,
        receiver,
        scope,
        name: name.to_string(),
        parameters,
        returns,
    })
}

/// 1-based column of a byte offset.
fn column(text: &str, byte: usize) -> usize {
    text[..byte].chars().count() + 1
}

/// Index of the `)` closing the `(` at `open`.
fn matching_paren(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in text[open..].char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Recursive-descent scanner over a parameter list.
struct ParamScanner<'a> {
    src: &'a str,
    pos: usize,
    /// Byte offset of `src` within the full signature, for error columns
    base: usize,
}

impl<'a> ParamScanner<'a> {
    fn new(src: &'a str, base: usize) -> Self {
        ParamScanner { src, pos: 0, base }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    /// 1-based byte column within the full signature.
    fn column(&self) -> usize {
        self.base + self.pos + 1
    }

    /// Parse a comma-separated list. Parameters inside `[...]` are optional.
    fn list(&mut self) -> Result<Vec<ParamSpec>, SignatureError> {
        let mut params: Vec<ParamSpec> = Vec::new();
        let mut layouts: Vec<Brackets> = Vec::new();
        let mut depth = 0usize;
        // brackets and comma seen since the previous parameter
        let mut pending = Brackets::default();
        let mut comma = false;
        loop {
            self.skip_whitespace();
            match self.peek() {
                None if depth > 0 => return Err(SignatureError::UnclosedBracket),
                None => break,
                Some(',') => {
                    if pending.open > 0 {
                        pending.comma_inside = true;
                    }
                    comma = true;
                    self.bump();
                }
                Some('[') => {
                    depth += 1;
                    pending.open += 1;
                    self.bump();
                }
                Some(']') if depth > 0 => {
                    // `[]` holds no parameter
                    let Some(last) = layouts.last_mut().filter(|_| pending.open == 0) else {
                        return Err(SignatureError::MissingName);
                    };
                    last.close += 1;
                    depth -= 1;
                    self.bump();
                }
                Some(']') => {
                    return Err(SignatureError::UnmatchedBracket {
                        column: self.column(),
                    })
                }
                Some(')') => {
                    return Err(SignatureError::UnmatchedClose {
                        column: self.column(),
                    })
                }
                Some(_) => {
                    if !params.is_empty() && !comma {
                        return Err(SignatureError::MissingComma {
                            column: self.column(),
                        });
                    }
                    params.push(self.param(depth > 0)?);
                    layouts.push(std::mem::take(&mut pending));
                    comma = false;
                }
            }
        }

        for (i, (param, layout)) in params.iter_mut().zip(layouts).enumerate() {
            let layout = Brackets {
                comma_inside: layout.comma_inside && i > 0,
                ..layout
            };
            if layout != Brackets::canonical(param.optional, i == 0) {
                param.brackets = Some(layout);
            }
        }
        Ok(params)
    }

    fn param(&mut self, optional: bool) -> Result<ParamSpec, SignatureError> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if matches!(c, ',' | '[' | ']' | '(' | ')') {
                break;
            }
            self.bump();
        }
        let name = self.src[start..self.pos].trim();
        if name.is_empty() {
            return Err(SignatureError::MissingName);
        }

        let mut arguments = Vec::new();
        if self.peek() == Some('(') {
            let open = self.pos;
            let close = matching_paren(self.src, open).ok_or(SignatureError::UnclosedParen)?;
            arguments = ParamScanner::new(&self.src[open + 1..close], self.base + open + 1).list()?;
            self.pos = close + 1;
        }

        Ok(ParamSpec {
            name: name.to_string(),
            optional,
            arguments,
            ..Default::default()
        })
    }
}
