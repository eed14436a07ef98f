//! Integration tests for the forking engine
//!
//! Tests conditional blocks, else chains, loops, break/continue guard
//! chains, and integer comparisons before linking.

use forkpack_foundation::{Error, ErrorKind, FunctionPath};
use forkpack_language::commands::summon_marker;
use forkpack_language::{CompileOptions, Namespace};

const CARRIER: &str = "@e[name=demo.VARS,limit=1]";

fn compiled(source: &str) -> Namespace {
    let mut ns = Namespace::new(CompileOptions::new("demo"));
    ns.add_source("", source).unwrap();
    ns.compile().unwrap();
    ns
}

fn compile_error(source: &str) -> Error {
    let mut ns = Namespace::new(CompileOptions::new("demo"));
    ns.add_source("", source).unwrap();
    ns.compile().unwrap_err()
}

fn commands(ns: &Namespace, path: &str) -> Vec<String> {
    ns.function(&FunctionPath::parse(path))
        .unwrap()
        .commands
        .clone()
}

fn score(objective: &str, range: &str) -> String {
    format!("entity @e[name=demo.VARS,scores={{{objective}={range}}}]")
}

// =============================================================================
// Execute Blocks
// =============================================================================

#[test]
fn execute_block_forks_its_body() {
    let ns = compiled("as @a at @s:\n    say hi\n    say there");
    assert_eq!(commands(&ns, "main"), vec!["execute as @a at @s run !f{main.e0}"]);
    assert_eq!(commands(&ns, "main.e0"), vec!["say hi", "say there"]);
}

#[test]
fn nested_blocks_nest_paths() {
    let ns = compiled("as @a:\n    if entity @s[tag=x]:\n        say deep");
    assert_eq!(
        commands(&ns, "main.e0"),
        vec!["execute if entity @s[tag=x] run !f{main.e0.e0}"]
    );
    assert_eq!(commands(&ns, "main.e0.e0"), vec!["say deep"]);
}

#[test]
fn else_chain_shares_one_marker() {
    let ns = compiled(
        "x = 1\nif x == 1:\n    say one\nelse if x == 2:\n    say two\nelse:\n    say other",
    );
    let summon = format!(
        "execute unless entity @e[tag=main.e0.ELSE] run {}",
        summon_marker("main.e0.ELSE")
    );
    assert_eq!(
        commands(&ns, "main"),
        vec![
            format!("scoreboard players set {CARRIER} main.x.0 1"),
            "kill @e[tag=main.e0.ELSE]".to_string(),
            format!("execute if {} run !f{{main.e0}}", score("main.x.0", "1")),
            format!(
                "execute unless entity @e[tag=main.e0.ELSE] if {} run !f{{main.e1}}",
                score("main.x.0", "2")
            ),
            "execute unless entity @e[tag=main.e0.ELSE] run !f{main.e2}".to_string(),
            "kill @e[tag=main.e0.ELSE]".to_string(),
        ]
    );
    assert_eq!(commands(&ns, "main.e0"), vec![summon.clone(), "say one".into()]);
    assert_eq!(commands(&ns, "main.e1"), vec![summon, "say two".into()]);
    assert_eq!(commands(&ns, "main.e2"), vec!["say other"]);
}

#[test]
fn plain_dispatch_has_no_chain_marker() {
    let ns = compiled("as @a:\n    say a\nsay b");
    assert_eq!(
        commands(&ns, "main"),
        vec!["execute as @a run !f{main.e0}", "say b"]
    );
}

#[test]
fn breaking_branch_cannot_leak_the_chain_marker() {
    let ns = compiled(
        "x = 0\nwhile x < 3:\n    x += 1\n    if x == 2:\n        break\n    else:\n        say no\n    say after",
    );
    let chain = "main.w0.e0.ELSE";
    // cleared on the unguarded path of every pass, before the branch can summon it
    assert_eq!(
        commands(&ns, "main.w0"),
        vec![
            format!("scoreboard players add {CARRIER} main.x.0 1"),
            format!("kill @e[tag={chain}]"),
            format!("execute if {} run !f{{main.w0.e0}}", score("main.x.0", "2")),
            "execute unless entity @e[tag=main.w0.BREAK] run !f{main.w0.b1}".to_string(),
        ]
    );
    assert_eq!(
        commands(&ns, "main.w0.e0"),
        vec![
            format!("execute unless entity @e[tag={chain}] run {}", summon_marker(chain)),
            summon_marker("main.w0.BREAK"),
        ]
    );
    assert_eq!(
        commands(&ns, "main.w0.b1"),
        vec![
            format!("execute unless entity @e[tag={chain}] run !f{{main.w0.b1.e0}}"),
            format!("kill @e[tag={chain}]"),
            "say after".to_string(),
            format!("execute if {} run !f{{main.w0}}", score("main.x.0", "..2")),
        ]
    );
}

#[test]
fn continuing_branch_cannot_leak_the_chain_marker() {
    let ns = compiled("repeat 2:\n    if entity @p:\n        continue\n    else:\n        say no");
    let chain = "main.r0.e0.ELSE";
    assert_eq!(
        commands(&ns, "main.r0"),
        vec![
            "kill @e[tag=main.r0.CONTINUE]".to_string(),
            format!("kill @e[tag={chain}]"),
            "execute if entity @p run !f{main.r0.e0}".to_string(),
            "execute unless entity @e[tag=main.r0.CONTINUE] run !f{main.r0.b1}".to_string(),
        ]
    );
    assert_eq!(
        commands(&ns, "main.r0.b1"),
        vec![
            format!("execute unless entity @e[tag={chain}] run !f{{main.r0.b1.e0}}"),
            format!("kill @e[tag={chain}]"),
        ]
    );
}

#[test]
fn else_needs_a_preceding_block() {
    let err = compile_error("else:\n    say x");
    assert_eq!(err.kind, ErrorKind::ElseWithoutDispatch);
    assert_eq!(err.line(), Some(1));

    let err = compile_error("as @a:\n    say a\nsay b\nelse:\n    say c");
    assert_eq!(err.kind, ErrorKind::ElseWithoutDispatch);
    assert_eq!(err.line(), Some(4));
}

// =============================================================================
// Comparisons
// =============================================================================

#[test]
fn literal_on_the_left_flips_the_range() {
    let ns = compiled("a = 1\nif 3 > a:\n    say small");
    assert_eq!(
        commands(&ns, "main")[1],
        format!("execute if {} run !f{{main.e0}}", score("main.a.0", "..2"))
    );
}

#[test]
fn variable_comparison_uses_a_scratch_slot() {
    let ns = compiled("a = 1\nb = 2\nif a < b:\n    say less");
    let op = |target: &str, op: &str, source: &str| {
        format!("scoreboard players operation {CARRIER} {target} {op} {CARRIER} {source}")
    };
    assert_eq!(
        commands(&ns, "main")[2..],
        [
            op("main.a.TEST.2", "=", "main.a.0"),
            op("main.a.TEST.2", "-=", "main.b.1"),
            format!("execute if {} run !f{{main.e0}}", score("main.a.TEST.2", "..-1")),
        ]
    );
    assert!(ns.ints().contains("main.a.TEST"));
}

#[test]
fn comparison_errors() {
    assert_eq!(
        compile_error("if 1 < 2:\n    say never").kind,
        ErrorKind::ConstantComparison
    );
    assert_eq!(
        compile_error("x = 1\nas x > 0:\n    say").kind,
        ErrorKind::ComparisonWithoutConditional
    );
    assert_eq!(
        compile_error("x = 1\nif x > @p:\n    say").kind,
        ErrorKind::InvalidComparisonOperand("@p".into())
    );
    assert_eq!(
        compile_error("while ghost < 3:\n    say").kind,
        ErrorKind::InvalidComparisonOperand("ghost".into())
    );
}

// =============================================================================
// Loops
// =============================================================================

#[test]
fn repeat_calls_its_body_n_times() {
    let ns = compiled("repeat 3:\n    say hi");
    assert_eq!(commands(&ns, "main"), vec!["!f{main.r0}"; 3]);
    assert_eq!(commands(&ns, "main.r0"), vec!["say hi"]);
}

#[test]
fn repeat_count_must_be_a_number() {
    assert_eq!(
        compile_error("repeat many:\n    say hi").kind,
        ErrorKind::InvalidNumber("many".into())
    );
}

#[test]
fn repeat_with_break_guards_every_call() {
    let ns = compiled("repeat 2:\n    say a\n    break\n    say never");
    let call = "execute unless entity @e[tag=main.r0.BREAK] run !f{main.r0}";
    assert_eq!(
        commands(&ns, "main"),
        vec![call, call, "kill @e[tag=main.r0.BREAK]"]
    );
    assert_eq!(
        commands(&ns, "main.r0"),
        vec!["say a".to_string(), summon_marker("main.r0.BREAK")]
    );
}

#[test]
fn repeat_with_continue_clears_its_marker() {
    let ns = compiled("repeat 2:\n    continue");
    assert_eq!(
        commands(&ns, "main"),
        vec!["!f{main.r0}", "!f{main.r0}", "kill @e[tag=main.r0.CONTINUE]"]
    );
    assert_eq!(
        commands(&ns, "main.r0"),
        vec![
            "kill @e[tag=main.r0.CONTINUE]".to_string(),
            summon_marker("main.r0.CONTINUE"),
        ]
    );
}

#[test]
fn while_loop_calls_itself_from_its_tail() {
    let ns = compiled("x = 0\nwhilenot x >= 3:\n    x++");
    let call = format!("execute unless {} run !f{{main.w0}}", score("main.x.0", "3.."));
    assert_eq!(
        commands(&ns, "main"),
        vec![
            format!("scoreboard players set {CARRIER} main.x.0 0"),
            call.clone(),
        ]
    );
    assert_eq!(
        commands(&ns, "main.w0"),
        vec![format!("scoreboard players add {CARRIER} main.x.0 1"), call]
    );
}

#[test]
fn while_needs_a_condition() {
    assert_eq!(
        compile_error("while:\n    say").kind,
        ErrorKind::ExpectedExpression("while".into())
    );
}

#[test]
fn bare_loop_with_break() {
    let ns = compiled("loop:\n    say tick\n    break");
    assert_eq!(
        commands(&ns, "main"),
        vec!["!f{main.w0}", "kill @e[tag=main.w0.BREAK]"]
    );
    assert_eq!(
        commands(&ns, "main.w0"),
        vec![
            "say tick".to_string(),
            summon_marker("main.w0.BREAK"),
            "execute unless entity @e[tag=main.w0.BREAK] run !f{main.w0}".to_string(),
        ]
    );
}

#[test]
fn break_in_a_conditional_moves_the_rest_into_a_guard() {
    let ns = compiled(
        "x = 0\nwhile x < 3:\n    x += 1\n    if x == 2:\n        break\n    say loop",
    );
    let call = format!("execute if {} run !f{{main.w0}}", score("main.x.0", "..2"));
    assert_eq!(
        commands(&ns, "main"),
        vec![
            format!("scoreboard players set {CARRIER} main.x.0 0"),
            call.clone(),
            "kill @e[tag=main.w0.BREAK]".to_string(),
        ]
    );
    assert_eq!(
        commands(&ns, "main.w0"),
        vec![
            format!("scoreboard players add {CARRIER} main.x.0 1"),
            format!("execute if {} run !f{{main.w0.e0}}", score("main.x.0", "2")),
            "execute unless entity @e[tag=main.w0.BREAK] run !f{main.w0.b1}".to_string(),
        ]
    );
    assert_eq!(
        commands(&ns, "main.w0.e0"),
        vec![summon_marker("main.w0.BREAK")]
    );
    assert_eq!(commands(&ns, "main.w0.b1"), vec!["say loop".to_string(), call]);

    let w0 = ns.function(&FunctionPath::parse("main.w0")).unwrap();
    assert!(w0.has_break);
    assert_eq!(w0.continuation, Some(FunctionPath::parse("main.w0.b1")));
}

#[test]
fn guard_links_chain_as_siblings() {
    let ns = compiled(
        "x = 0\nwhile x < 3:\n    if x == 1:\n        break\n    say a\n    if x == 2:\n        break\n    say b",
    );
    assert_eq!(
        commands(&ns, "main.w0.b1")[..2],
        [
            "say a".to_string(),
            format!("execute if {} run !f{{main.w0.b1.e0}}", score("main.x.0", "2")),
        ]
    );
    assert_eq!(
        commands(&ns, "main.w0.b1")[2],
        "execute unless entity @e[tag=main.w0.BREAK] run !f{main.w0.b2}"
    );
    let b2 = commands(&ns, "main.w0.b2");
    assert_eq!(b2[0], "say b");
    assert_eq!(
        b2[1],
        format!("execute if {} run !f{{main.w0}}", score("main.x.0", "..2"))
    );
}

#[test]
fn continue_reenters_from_the_head() {
    let ns = compiled(
        "x = 0\nwhile x < 5:\n    x += 1\n    if x == 2:\n        continue\n    say x",
    );
    let call = format!("execute if {} run !f{{main.w0}}", score("main.x.0", "..4"));
    let w0 = commands(&ns, "main.w0");
    assert_eq!(w0[0], "kill @e[tag=main.w0.CONTINUE]");
    assert_eq!(
        w0[3],
        "execute unless entity @e[tag=main.w0.CONTINUE] run !f{main.w0.b1}"
    );
    assert_eq!(
        w0[4],
        format!(
            "execute if entity @e[tag=main.w0.CONTINUE] if {} run !f{{main.w0}}",
            score("main.x.0", "..4")
        )
    );
    assert_eq!(
        commands(&ns, "main.w0.b1"),
        vec![format!("say {CARRIER} main.x.0"), call]
    );
    assert_eq!(
        commands(&ns, "main").last().map(String::as_str),
        Some("kill @e[tag=main.w0.CONTINUE]")
    );
}

#[test]
fn escapes_outside_loops() {
    let err = compile_error("break");
    assert_eq!(err.kind, ErrorKind::BreakOutsideLoop);
    assert!(err.to_string().starts_with("Error at line 1"));

    let err = compile_error("as @a:\n    continue");
    assert_eq!(err.kind, ErrorKind::ContinueOutsideLoop);
    assert_eq!(err.line(), Some(2));
}

#[test]
fn functions_inside_loops_do_not_inherit_them() {
    let err = compile_error("loop:\n    def f:\n        break\n    f");
    assert_eq!(err.kind, ErrorKind::BreakOutsideLoop);
}
