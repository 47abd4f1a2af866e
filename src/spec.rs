//! Token specifications: the INI-style surface and its resolution.
//!
//! A spec file holds one `[section]` per scanner. Every entry is
//! `name = pattern`; names starting with `_` are fragments, usable only
//! through `{name}` interpolation, while the rest are tokens whose
//! declaration order fixes their priority (earliest wins ties).
//!
//! Interpolation is resolved on the parsed trees, not on the pattern
//! text: after a cycle check, every `Ref` node is substituted by the
//! interned expression of the name it points at, memoised per name so
//! shared fragments stay shared in the pool.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::error::{Result, ScanError};
use crate::regex::{self, Ast, ExprId, ExprPool, PropertyProvider};

/// One `[section]` of a spec file: named tokens in priority order plus
/// the fragments they may interpolate.
#[derive(Debug, Clone)]
pub struct TokenSpec {
    pub name: String,
    tokens: Vec<(String, Ast)>,
    fragments: HashMap<String, Ast>,
}

/// A spec lowered into the pool: token names in priority order and the
/// combined root expression (the alternation of all tagged tokens).
#[derive(Debug)]
pub struct ResolvedTokens {
    pub names: Vec<String>,
    pub root: ExprId,
}

impl TokenSpec {
    /// Token names in declaration order.
    pub fn token_names(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(|(name, _)| name.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Check interpolations, intern every definition, and build the
    /// tagged root expression.
    pub fn resolve(&self, pool: &mut ExprPool) -> Result<ResolvedTokens> {
        let mut entries: HashMap<&str, &Ast> = HashMap::new();
        for (name, ast) in &self.tokens {
            entries.insert(name, ast);
        }
        for (name, ast) in &self.fragments {
            entries.insert(name, ast);
        }

        // cycle check over every declared name, yielding a substitution
        // order in which dependencies precede their users
        let mut colors: HashMap<&str, Color> = HashMap::new();
        let mut order: Vec<&str> = Vec::new();
        let mut names: Vec<&str> = entries.keys().copied().collect();
        names.sort_unstable();
        for name in names {
            visit(name, &entries, &mut colors, &mut order)?;
        }

        let mut resolved: HashMap<&str, ExprId> = HashMap::new();
        for name in order {
            let expr = regex::lower(pool, entries[name], &mut |r| {
                resolved.get(r).copied()
            })?;
            resolved.insert(name, expr);
        }

        let mut tags = Vec::with_capacity(self.tokens.len());
        let mut token_names = Vec::with_capacity(self.tokens.len());
        for (id, (name, _)) in self.tokens.iter().enumerate() {
            let expr = resolved[name.as_str()];
            if expr == pool.empty() {
                warn!(section = %self.name, token = %name, "token matches nothing");
            }
            tags.push(pool.tag(id, expr)?);
            token_names.push(name.clone());
        }
        let root = pool.alt(tags)?;
        debug!(
            section = %self.name,
            tokens = token_names.len(),
            "token spec resolved"
        );
        Ok(ResolvedTokens {
            names: token_names,
            root,
        })
    }
}

#[derive(Copy, Clone, PartialEq)]
enum Color {
    Grey,
    Black,
}

fn visit<'a>(
    name: &'a str,
    entries: &HashMap<&'a str, &'a Ast>,
    colors: &mut HashMap<&'a str, Color>,
    order: &mut Vec<&'a str>,
) -> Result<()> {
    match colors.get(name) {
        Some(Color::Black) => return Ok(()),
        Some(Color::Grey) => return Err(ScanError::CyclicFragment(name.to_string())),
        None => {}
    }
    colors.insert(name, Color::Grey);
    let ast = entries
        .get(name)
        .ok_or_else(|| ScanError::UndefinedReference(name.to_string()))?;
    let mut refs = Vec::new();
    collect_refs(ast, &mut refs);
    for r in refs {
        let r = entries
            .get_key_value(r.as_str())
            .map(|(&k, _)| k)
            .ok_or_else(|| ScanError::UndefinedReference(r.clone()))?;
        visit(r, entries, colors, order)?;
    }
    colors.insert(name, Color::Black);
    order.push(name);
    Ok(())
}

fn collect_refs(ast: &Ast, out: &mut Vec<String>) {
    match ast {
        Ast::Epsilon | Ast::Chars(_) => {}
        Ast::Concat(a, b) | Ast::Alt(a, b) | Ast::And(a, b) => {
            collect_refs(a, out);
            collect_refs(b, out);
        }
        Ast::Not(a) | Ast::Star(a) => collect_refs(a, out),
        Ast::Ref(name) => out.push(name.clone()),
    }
}

/// Parse spec text into its sections. Patterns are parsed eagerly, so
/// syntax errors surface at load time with the offending entry intact.
pub fn parse_spec(text: &str, props: &dyn PropertyProvider) -> Result<Vec<TokenSpec>> {
    let mut specs: Vec<TokenSpec> = Vec::new();
    let mut current: Option<RawSection> = None;

    for (lineno, raw_line) in text.lines().enumerate() {
        let line = raw_line.trim_end();
        let trimmed = line.trim_start();
        if trimmed.is_empty() || trimmed.starts_with(';') || trimmed.starts_with('#') {
            continue;
        }

        if line.starts_with(char::is_whitespace) {
            // continuation of the previous entry; joined without the break
            let section = current.as_mut().and_then(|s| s.entries.last_mut());
            match section {
                Some((_, value)) => value.push_str(trimmed),
                None => return Err(config_error(lineno, "continuation without an entry")),
            }
            continue;
        }

        if let Some(name) = line.strip_prefix('[') {
            let name = name
                .strip_suffix(']')
                .ok_or_else(|| config_error(lineno, "']' expected"))?
                .trim();
            if name.is_empty() {
                return Err(config_error(lineno, "section name expected"));
            }
            if let Some(done) = current.take() {
                specs.push(done.build(props)?);
            }
            current = Some(RawSection {
                name: name.to_string(),
                entries: Vec::new(),
            });
            continue;
        }

        let (key, value) = line
            .split_once('=')
            .ok_or_else(|| config_error(lineno, "'=' expected"))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(config_error(lineno, "entry name expected"));
        }
        let section = current
            .as_mut()
            .ok_or_else(|| config_error(lineno, "entry outside any section"))?;
        if section.entries.iter().any(|(k, _)| k == key) {
            return Err(config_error(lineno, &format!("duplicate entry '{}'", key)));
        }
        section
            .entries
            .push((key.to_string(), value.trim().to_string()));
    }

    if let Some(done) = current.take() {
        specs.push(done.build(props)?);
    }
    Ok(specs)
}

fn config_error(lineno: usize, message: &str) -> ScanError {
    ScanError::Config(format!("line {}: {}", lineno + 1, message))
}

struct RawSection {
    name: String,
    entries: Vec<(String, String)>,
}

impl RawSection {
    fn build(self, props: &dyn PropertyProvider) -> Result<TokenSpec> {
        let mut tokens = Vec::new();
        let mut fragments = HashMap::new();
        for (key, value) in self.entries {
            let ast = regex::parse(&value, props)?;
            if key.starts_with('_') {
                fragments.insert(key, ast);
            } else {
                tokens.push((key, ast));
            }
        }
        Ok(TokenSpec {
            name: self.name,
            tokens,
            fragments,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regex::UnicodeTables;

    fn load(text: &str) -> Vec<TokenSpec> {
        parse_spec(text, &UnicodeTables).unwrap()
    }

    #[test]
    fn test_sections_and_priorities() {
        let specs = load(
            "; a scanner\n\
             [lexer]\n\
             kw = if\n\
             id = [a-z]+\n\
             _digit = [0-9]\n\
             num = {_digit}+\n",
        );
        assert_eq!(specs.len(), 1);
        let spec = &specs[0];
        assert_eq!(spec.name, "lexer");
        assert_eq!(
            spec.token_names().collect::<Vec<_>>(),
            vec!["kw", "id", "num"]
        );
    }

    #[test]
    fn test_continuation_lines() {
        let specs = load("[s]\nlong = a|\n  b\n");
        let mut pool = ExprPool::new();
        let resolved = specs[0].resolve(&mut pool).unwrap();
        let mut matcher = |input: &str| {
            let root = resolved.root;
            pool.matches(root, input).unwrap()
        };
        assert!(matcher("a"));
        assert!(matcher("b"));
        assert!(!matcher("c"));
    }

    #[test]
    fn test_fragment_interpolation() {
        let specs = load(
            "[s]\n\
             _letter = [a-z]\n\
             _digit = [0-9]\n\
             ident = {_letter}({_letter}|{_digit})*\n",
        );
        let mut pool = ExprPool::new();
        let resolved = specs[0].resolve(&mut pool).unwrap();
        assert_eq!(resolved.names, vec!["ident"]);
        assert!(pool.matches(resolved.root, "ab12").unwrap());
        assert!(!pool.matches(resolved.root, "1ab").unwrap());
    }

    #[test]
    fn test_token_may_reference_token() {
        let specs = load(
            "[s]\n\
             word = [a-z]+\n\
             quoted = '{word}'\n",
        );
        let mut pool = ExprPool::new();
        let resolved = specs[0].resolve(&mut pool).unwrap();
        assert!(pool.matches(resolved.root, "'abc'").unwrap());
    }

    #[test]
    fn test_interpolation_cycle() {
        let specs = load(
            "[s]\n\
             _a = {_b}\n\
             _b = {_a}\n\
             t = x\n",
        );
        let mut pool = ExprPool::new();
        assert!(matches!(
            specs[0].resolve(&mut pool),
            Err(ScanError::CyclicFragment(_))
        ));
    }

    #[test]
    fn test_self_cycle() {
        let specs = load("[s]\n_a = {_a}\nt = x\n");
        let mut pool = ExprPool::new();
        assert!(matches!(
            specs[0].resolve(&mut pool),
            Err(ScanError::CyclicFragment(name)) if name == "_a"
        ));
    }

    #[test]
    fn test_undefined_reference() {
        let specs = load("[s]\nt = {_nope}\n");
        let mut pool = ExprPool::new();
        assert!(matches!(
            specs[0].resolve(&mut pool),
            Err(ScanError::UndefinedReference(name)) if name == "_nope"
        ));
    }

    #[test]
    fn test_empty_language_token_is_not_fatal() {
        // a & b is unsatisfiable; the token resolves to the empty language
        let specs = load("[s]\nweird = a&b\nok = x\n");
        let mut pool = ExprPool::new();
        let resolved = specs[0].resolve(&mut pool).unwrap();
        assert_eq!(resolved.names, vec!["weird", "ok"]);
        assert!(pool.matches(resolved.root, "x").unwrap());
        assert!(!pool.matches(resolved.root, "a").unwrap());
    }

    #[test]
    fn test_loader_errors() {
        assert!(matches!(
            parse_spec("stray = a\n", &UnicodeTables),
            Err(ScanError::Config(_))
        ));
        assert!(matches!(
            parse_spec("[s]\nt = a\nt = b\n", &UnicodeTables),
            Err(ScanError::Config(_))
        ));
        assert!(matches!(
            parse_spec("[s\nt = a\n", &UnicodeTables),
            Err(ScanError::Config(_))
        ));
        assert!(matches!(
            parse_spec("[s]\nnot an entry\n", &UnicodeTables),
            Err(ScanError::Config(_))
        ));
    }

    #[test]
    fn test_multiple_sections() {
        let specs = load("[one]\na = x\n[two]\nb = y\n");
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].name, "one");
        assert_eq!(specs[1].name, "two");
    }
}
