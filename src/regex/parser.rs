//! Recursive-descent parser for the regex surface syntax.
//!
//! Grammar, in precedence order (loosest first):
//!
//! ```text
//! expression    = logical_or;
//! logical_or    = logical_and, {'|', logical_and};
//! logical_and   = complement, {'&', complement};
//! complement    = ['!'], concatenation;
//! concatenation = {quantification};
//! quantification= element, [quantifier];
//! quantifier    = '?' | '*' | '+' | '{', number, [',', [number]], '}';
//! element       = '(', logical_or, ')' | '.' | class | quoted
//!               | '{', name, '}'                  (interpolation)
//!               | CHARACTER - metachars;
//! class         = '[', ['^'], [']' | '-'], {range}, ['-'], ']';
//! ```
//!
//! A brace group is a quantifier when its first character is a decimal
//! digit and an interpolation reference otherwise. Escapes cover the
//! control shorthands, the named classes `\d \h \s \v \w` (and their
//! complements), Unicode properties `\p`/`\P`, and octal/hex/Unicode
//! code point escapes. Property lookup goes through the injected
//! [`PropertyProvider`].

use std::iter::Peekable;
use std::str::CharIndices;

use crate::codeset::{CodePointSet, CODESPACE_END};
use crate::error::{Result, ScanError};
use crate::regex::ast::Ast;
use crate::regex::unicode::{self, PropertyProvider};

const METACHARACTERS: &[char] = &[
    '\\', '.', '[', '|', '&', '!', '(', ')', '?', '*', '+', '{',
];

/// Parse a pattern into a surface [`Ast`].
pub fn parse(pattern: &str, props: &dyn PropertyProvider) -> Result<Ast> {
    let mut parser = Parser::new(pattern, props);
    let ast = parser.parse_alt()?;
    match parser.peek() {
        None => Ok(ast),
        Some(c) => Err(parser.error(&format!("'{}' unexpected", c))),
    }
}

struct Parser<'a> {
    chars: Peekable<CharIndices<'a>>,
    input: &'a str,
    props: &'a dyn PropertyProvider,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str, props: &'a dyn PropertyProvider) -> Self {
        Self {
            chars: input.char_indices().peekable(),
            input,
            props,
            pos: 0,
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    /// The character after the next one, without consuming anything.
    fn peek2(&self) -> Option<char> {
        self.chars.clone().nth(1).map(|(_, c)| c)
    }

    fn next(&mut self) -> Option<char> {
        self.chars.next().map(|(i, c)| {
            self.pos = i + c.len_utf8();
            c
        })
    }

    /// Byte offset of the next unconsumed character.
    fn cursor(&mut self) -> usize {
        self.chars.peek().map_or(self.input.len(), |&(i, _)| i)
    }

    fn error(&self, message: &str) -> ScanError {
        ScanError::Syntax {
            message: message.to_string(),
            position: self.pos,
        }
    }

    fn expect(&mut self, wanted: char) -> Result<()> {
        match self.next() {
            Some(c) if c == wanted => Ok(()),
            _ => Err(self.error(&format!("'{}' expected", wanted))),
        }
    }

    fn read_while<F>(&mut self, pred: F, max: Option<usize>) -> String
    where
        F: Fn(char) -> bool,
    {
        let mut out = String::new();
        while let Some(c) = self.peek() {
            if !pred(c) || max.is_some_and(|m| out.len() >= m) {
                break;
            }
            self.next();
            out.push(c);
        }
        out
    }

    fn parse_alt(&mut self) -> Result<Ast> {
        let mut expr = self.parse_and()?;
        while self.peek() == Some('|') {
            self.next();
            let right = self.parse_and()?;
            expr = Ast::alt(expr, right);
        }
        Ok(expr)
    }

    fn parse_and(&mut self) -> Result<Ast> {
        let mut expr = self.parse_complement()?;
        while self.peek() == Some('&') {
            self.next();
            let right = self.parse_complement()?;
            expr = Ast::and(expr, right);
        }
        Ok(expr)
    }

    fn parse_complement(&mut self) -> Result<Ast> {
        if self.peek() == Some('!') {
            self.next();
            let inner = self.parse_concat()?;
            Ok(Ast::not(inner))
        } else {
            self.parse_concat()
        }
    }

    fn parse_concat(&mut self) -> Result<Ast> {
        let mut parts: Vec<Ast> = Vec::new();
        loop {
            match self.peek() {
                None | Some('|') | Some('&') | Some(')') => break,
                _ => {}
            }
            let before = self.cursor();
            let part = self.parse_quantified()?;
            if self.cursor() == before {
                // an element we do not own, e.g. a stray '!'
                break;
            }
            parts.push(part);
        }
        let mut rev = parts.into_iter().rev();
        Ok(match rev.next() {
            None => Ast::Epsilon,
            Some(last) => rev.fold(last, |acc, p| Ast::concat(p, acc)),
        })
    }

    fn parse_quantified(&mut self) -> Result<Ast> {
        let atom = self.parse_atom()?;
        match self.peek() {
            Some('?') => {
                self.next();
                Ok(Ast::opt(atom))
            }
            Some('*') => {
                self.next();
                Ok(Ast::star(atom))
            }
            Some('+') => {
                self.next();
                Ok(Ast::plus(atom))
            }
            Some('{') if self.peek2().is_some_and(|c| c.is_ascii_digit()) => {
                self.next();
                let (min, max) = self.parse_count()?;
                Ok(Ast::repeat(atom, min, max))
            }
            _ => Ok(atom),
        }
    }

    /// `{n}`, `{n,}` or `{n,m}`; the open brace is already consumed.
    fn parse_count(&mut self) -> Result<(u32, Option<u32>)> {
        let min = self.parse_number()?;
        match self.next() {
            Some(',') => {
                if self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    let max = self.parse_number()?;
                    if max < min {
                        return Err(self.error("maximum count must be >= minimum count"));
                    }
                    self.expect('}')?;
                    Ok((min, Some(max)))
                } else {
                    self.expect('}')?;
                    Ok((min, None))
                }
            }
            Some('}') => Ok((min, Some(min))),
            _ => Err(self.error("'}' expected")),
        }
    }

    fn parse_number(&mut self) -> Result<u32> {
        let digits = self.read_while(|c| c.is_ascii_digit(), None);
        if digits.is_empty() {
            return Err(self.error("decimal digit expected"));
        }
        digits
            .parse::<u32>()
            .map_err(|_| self.error("count too large"))
    }

    fn parse_atom(&mut self) -> Result<Ast> {
        match self.peek() {
            None => Ok(Ast::Epsilon),
            Some('(') => {
                self.next();
                let inner = self.parse_alt()?;
                self.expect(')')?;
                Ok(inner)
            }
            Some('.') => {
                self.next();
                Ok(Ast::Chars(CodePointSet::full()))
            }
            Some('[') => {
                self.next();
                self.parse_class()
            }
            Some('\\') => {
                self.next();
                let set = self.parse_quote()?;
                Ok(Ast::Chars(set))
            }
            Some('{') if !self.peek2().is_some_and(|c| c.is_ascii_digit()) => {
                self.next();
                self.parse_reference()
            }
            Some(c) if !METACHARACTERS.contains(&c) => {
                self.next();
                Ok(Ast::Chars(CodePointSet::single(c as u32)?))
            }
            // metacharacter owned by an outer level; consume nothing
            _ => Ok(Ast::Epsilon),
        }
    }

    /// `{name}` interpolation; the open brace is already consumed.
    fn parse_reference(&mut self) -> Result<Ast> {
        let name = self.read_while(|c| c != '}', None);
        self.expect('}')?;
        if name.is_empty() {
            return Err(self.error("interpolation name expected"));
        }
        Ok(Ast::Ref(name))
    }

    /// `[...]` character class; the open bracket is already consumed.
    fn parse_class(&mut self) -> Result<Ast> {
        let mut negated = false;
        if self.peek() == Some('^') {
            self.next();
            negated = true;
        }

        let mut members: Vec<CodePointSet> = Vec::new();
        // a leading ']' or '-' is a literal member
        if let Some(c @ (']' | '-')) = self.peek() {
            self.next();
            members.push(CodePointSet::single(c as u32)?);
        }

        loop {
            match self.peek() {
                None => return Err(self.error("']' expected")),
                Some(']') => {
                    self.next();
                    break;
                }
                Some('-') => {
                    // a trailing '-' is a literal, anything else is malformed
                    self.next();
                    if self.peek() == Some(']') {
                        self.next();
                        members.push(CodePointSet::single('-' as u32)?);
                        break;
                    }
                    return Err(self.error("bad range"));
                }
                Some(_) => members.push(self.parse_class_range()?),
            }
        }

        let mut set = members
            .into_iter()
            .fold(CodePointSet::empty(), |acc, m| acc.union(&m));
        if negated {
            set = set.complement();
        }
        Ok(Ast::Chars(set))
    }

    fn parse_class_range(&mut self) -> Result<CodePointSet> {
        let first = self.parse_class_member()?;
        let range_follows = self.peek() == Some('-')
            && !matches!(self.peek2(), None | Some('-') | Some(']'));
        if !range_follows {
            return Ok(first);
        }
        self.next(); // '-'
        let last = self.parse_class_member()?;
        if first.len() != 1 {
            return Err(self.error("start of range must be a single character"));
        }
        if last.len() != 1 {
            return Err(self.error("end of range must be a single character"));
        }
        let lo = first.first().unwrap_or(0);
        let hi = last.first().unwrap_or(0);
        CodePointSet::of_range(lo, hi + 1)
    }

    fn parse_class_member(&mut self) -> Result<CodePointSet> {
        match self.next() {
            Some('\\') => self.parse_quote(),
            Some(c) => CodePointSet::single(c as u32),
            None => Err(self.error("']' expected")),
        }
    }

    /// Escape sequence; the backslash is already consumed.
    fn parse_quote(&mut self) -> Result<CodePointSet> {
        let c = match self.next() {
            Some(c) => c,
            None => return Err(self.error("character expected after '\\'")),
        };
        match c {
            'a' => CodePointSet::single(0x07),
            'b' => CodePointSet::single(0x08),
            'e' => CodePointSet::single(0x1b),
            'f' => CodePointSet::single(0x0c),
            'n' => CodePointSet::single(0x0a),
            'r' => CodePointSet::single(0x0d),
            't' => CodePointSet::single(0x09),
            'd' => unicode::digit(self.props),
            'D' => Ok(unicode::digit(self.props)?.complement()),
            'h' => Ok(unicode::horizontal_space()),
            'H' => Ok(unicode::horizontal_space().complement()),
            's' => unicode::space(self.props),
            'S' => Ok(unicode::space(self.props)?.complement()),
            'v' => Ok(unicode::vertical_space()),
            'V' => Ok(unicode::vertical_space().complement()),
            'w' => unicode::word(self.props),
            'W' => Ok(unicode::word(self.props)?.complement()),
            'p' => self.parse_property(false),
            'P' => self.parse_property(true),
            '0'..='7' => {
                let mut digits = c.to_string();
                digits.push_str(&self.read_while(|c| ('0'..='7').contains(&c), Some(2)));
                let cp = u32::from_str_radix(&digits, 8)
                    .map_err(|_| self.error("bad octal escape"))?;
                self.codepoint(cp, &format!("\\{}", digits))
            }
            'o' => {
                self.expect('{')?;
                let digits = self.read_while(|c| ('0'..='7').contains(&c), None);
                if digits.is_empty() {
                    return Err(self.error("octal digit expected"));
                }
                self.expect('}')?;
                let cp = u32::from_str_radix(&digits, 8)
                    .map_err(|_| self.error("bad octal escape"))?;
                self.codepoint(cp, &format!("\\o{{{}}}", digits))
            }
            'x' => {
                let digits = if self.peek() == Some('{') {
                    self.next();
                    let digits = self.read_while(|c| c.is_ascii_hexdigit(), None);
                    if digits.is_empty() {
                        return Err(self.error("hex digit expected"));
                    }
                    self.expect('}')?;
                    digits
                } else {
                    let digits = self.read_while(|c| c.is_ascii_hexdigit(), Some(2));
                    if digits.len() != 2 {
                        return Err(self.error("exactly 2 hex digits expected"));
                    }
                    digits
                };
                let cp = u32::from_str_radix(&digits, 16)
                    .map_err(|_| self.error("bad hex escape"))?;
                self.codepoint(cp, &format!("\\x{{{}}}", digits))
            }
            'u' => {
                let digits = self.read_while(|c| c.is_ascii_hexdigit(), Some(4));
                if digits.len() != 4 {
                    return Err(self.error("exactly 4 hex digits expected"));
                }
                let cp = u32::from_str_radix(&digits, 16)
                    .map_err(|_| self.error("bad unicode escape"))?;
                self.codepoint(cp, &format!("\\u{}", digits))
            }
            'U' => {
                let digits = self.read_while(|c| c.is_ascii_hexdigit(), Some(8));
                if digits.len() != 8 {
                    return Err(self.error("exactly 8 hex digits expected"));
                }
                let cp = u32::from_str_radix(&digits, 16)
                    .map_err(|_| self.error("bad unicode escape"))?;
                self.codepoint(cp, &format!("\\U{}", digits))
            }
            other => CodePointSet::single(other as u32),
        }
    }

    /// `\p`/`\P`: either a single-character name or `{Name}`.
    fn parse_property(&mut self, negated: bool) -> Result<CodePointSet> {
        let name = match self.next() {
            Some('{') => {
                let name = self.read_while(|c| c != '}', None);
                self.expect('}')?;
                name
            }
            Some(c) => c.to_string(),
            None => return Err(self.error("property name expected")),
        };
        if name.is_empty() {
            return Err(self.error("property name expected"));
        }
        let set = self
            .props
            .property(&name)
            .ok_or(ScanError::UnknownProperty(name))?;
        Ok(if negated { set.complement() } else { set })
    }

    fn codepoint(&self, cp: u32, repr: &str) -> Result<CodePointSet> {
        if cp >= CODESPACE_END {
            return Err(self.error(&format!("{}: code point out of range", repr)));
        }
        CodePointSet::single(cp)
    }
}
