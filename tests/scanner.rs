//! End-to-end tests: spec text in, token streams out.

use scangen::emit::{DotTarget, JsonTarget, RustTarget, Target};
use scangen::regex::{ExprPool, UnicodeTables};
use scangen::spec::parse_spec;
use scangen::{dfa, Dfa, ScanError};

fn compile(spec_text: &str) -> Dfa {
    let sections = parse_spec(spec_text, &UnicodeTables).expect("spec should parse");
    let mut pool = ExprPool::new();
    let resolved = sections[0].resolve(&mut pool).expect("spec should resolve");
    dfa::build(&mut pool, &resolved).expect("dfa should build")
}

fn scan(dfa: &Dfa, input: &str) -> Result<Vec<(String, String)>, ScanError> {
    dfa.scan(input.chars())
        .map(|item| {
            item.map(|(token, lexeme)| (dfa.tokens()[token].clone(), lexeme))
        })
        .collect()
}

fn ok(dfa: &Dfa, input: &str) -> Vec<(String, String)> {
    scan(dfa, input).expect("input should scan")
}

fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
    items
        .iter()
        .map(|&(t, l)| (t.to_string(), l.to_string()))
        .collect()
}

#[test]
fn scans_a_c_like_token_stream() {
    let dfa = compile(
        "; tokens for a toy expression language\n\
         [expr]\n\
         _digit = [0-9]\n\
         let = let\n\
         id = [a-z][a-z0-9]*\n\
         num = {_digit}+\n\
         eq = =\n\
         plus = \\+\n\
         ws = \\h+\n",
    );
    assert_eq!(
        ok(&dfa, "let x1 = 2 + 40"),
        pairs(&[
            ("let", "let"),
            ("ws", " "),
            ("id", "x1"),
            ("ws", " "),
            ("eq", "="),
            ("ws", " "),
            ("num", "2"),
            ("ws", " "),
            ("plus", "+"),
            ("ws", " "),
            ("num", "40"),
        ])
    );
}

#[test]
fn maximal_munch_prefers_the_longer_token() {
    let dfa = compile("[s]\na = x|y\nb = xy\n");
    assert_eq!(ok(&dfa, "xy"), pairs(&[("b", "xy")]));
    assert_eq!(ok(&dfa, "x"), pairs(&[("a", "x")]));
    assert_eq!(ok(&dfa, "xyx"), pairs(&[("b", "xy"), ("a", "x")]));
}

#[test]
fn unmatched_input_reports_position_and_codepoint() {
    let dfa = compile("[s]\na = x|y\nb = xy\n");
    match scan(&dfa, "xz") {
        Err(ScanError::UnmatchedInput { position, codepoint }) => {
            assert_eq!(position, 1);
            assert_eq!(codepoint, 'z');
        }
        other => panic!("expected UnmatchedInput, got {:?}", other),
    }
}

#[test]
fn priority_follows_declaration_order() {
    let dfa = compile("[s]\nkw = if\nid = [a-z]+\n");
    assert_eq!(ok(&dfa, "ifx"), pairs(&[("id", "ifx")]));
    assert_eq!(ok(&dfa, "if"), pairs(&[("kw", "if")]));
}

#[test]
fn complement_matches_everything_but_the_operand() {
    let dfa = compile("[s]\n_num = [0-9]+\nneg = !{_num}\n");
    assert_eq!(ok(&dfa, "abc"), pairs(&[("neg", "abc")]));
    assert!(matches!(
        scan(&dfa, "12"),
        Err(ScanError::UnmatchedInput { position: 0, .. })
    ));
}

#[test]
fn fragments_interpolate_across_definitions() {
    let dfa = compile(
        "[s]\n\
         _hex = [0-9a-fA-F]\n\
         _byte = {_hex}{_hex}\n\
         color = #{_byte}{_byte}{_byte}\n\
         ws = \\h+\n",
    );
    assert_eq!(
        ok(&dfa, "#ff00a8 #000000"),
        pairs(&[("color", "#ff00a8"), ("ws", " "), ("color", "#000000")])
    );
    assert!(scan(&dfa, "#ff00").is_err());
}

#[test]
fn fragment_cycles_are_rejected_before_construction() {
    let sections = parse_spec("[s]\n_a = {_b}\n_b = {_a}\nt = x\n", &UnicodeTables).unwrap();
    let mut pool = ExprPool::new();
    assert!(matches!(
        sections[0].resolve(&mut pool),
        Err(ScanError::CyclicFragment(_))
    ));
}

#[test]
fn counted_repetition_bounds_are_honoured() {
    let dfa = compile("[s]\ntriple = a{3}\nrest = a\n");
    assert_eq!(ok(&dfa, "aaa"), pairs(&[("triple", "aaa")]));
    assert_eq!(ok(&dfa, "aaaa"), pairs(&[("triple", "aaa"), ("rest", "a")]));
    assert_eq!(
        ok(&dfa, "aaaaaa"),
        pairs(&[("triple", "aaa"), ("triple", "aaa")])
    );
}

#[test]
fn scanning_is_unicode_clean() {
    let dfa = compile("[s]\ngreek = [\\x{370}-\\x{3ff}]+\nascii = [a-z]+\nws = \\h+\n");
    assert_eq!(
        ok(&dfa, "αβγ abc"),
        pairs(&[("greek", "αβγ"), ("ws", " "), ("ascii", "abc")])
    );
}

#[test]
fn every_section_compiles_independently() {
    let sections = parse_spec(
        "[numbers]\nnum = [0-9]+\n[words]\nword = [a-z]+\n",
        &UnicodeTables,
    )
    .unwrap();
    assert_eq!(sections.len(), 2);
    for section in &sections {
        let mut pool = ExprPool::new();
        let resolved = section.resolve(&mut pool).unwrap();
        let dfa = dfa::build(&mut pool, &resolved).unwrap();
        assert!(!dfa.states().is_empty());
    }
}

#[test]
fn saved_automaton_scans_identically() {
    let dfa = compile("[s]\nkw = if|else\nid = [a-z]+\nws = \\h+\n");
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("s.dfa");
    dfa.save(&path).unwrap();
    let loaded = Dfa::load(&path).unwrap();
    let input = "if iffy else elsewhere";
    assert_eq!(ok(&dfa, input), ok(&loaded, input));
}

#[test]
fn emitters_render_every_section() {
    let dfa = compile("[s]\nkw = if\nid = [a-z]+\n");
    for target in [
        &mut DotTarget as &mut dyn Target,
        &mut RustTarget,
        &mut JsonTarget::new(),
    ] {
        let mut out = Vec::new();
        target.emit_header(&mut out).unwrap();
        target.emit_automaton(&mut out, "s", &dfa).unwrap();
        target.emit_trailer(&mut out).unwrap();
        assert!(!out.is_empty());
    }
}
