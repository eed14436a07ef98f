//! Integration tests for the function compiler
//!
//! Tests statement lowering, variable kinds, scoping, and calls before
//! linking.

use forkpack_foundation::{Error, ErrorKind, FunctionPath, VariableKind};
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

fn set(objective: &str, value: i64) -> String {
    format!("scoreboard players set {CARRIER} {objective} {value}")
}

fn operation(target: &str, op: &str, source: &str) -> String {
    format!("scoreboard players operation {CARRIER} {target} {op} {CARRIER} {source}")
}

// =============================================================================
// Assignment
// =============================================================================

#[test]
fn assignment_infers_kinds() {
    let ns = compiled(
        "a = @e[type=cow]\nn = 3\nm = n\np#p = @a\nc = #i\ns = hello\ntellraw p s",
    );
    assert_eq!(
        commands(&ns, "main"),
        vec![
            "tag @e[type=cow] add main.a".to_string(),
            set("main.n.0", 3),
            operation("main.m.1", "=", "main.n.0"),
            "tag @a add main.p".to_string(),
            "tellraw @p[tag=main.p] hello".to_string(),
        ]
    );
    let ints: Vec<&str> = ns.ints().iter().map(String::as_str).collect();
    assert_eq!(ints, vec!["main.n", "main.m", "main.c"]);
    assert_eq!(ns.objective("main.c").unwrap(), "main.c.2");
}

#[test]
fn locals_other_than_integers_are_released() {
    let ns = compiled("a = @p\nn = 1\ns = text");
    assert_eq!(ns.kind_of("main.n"), Some(VariableKind::Integer));
    assert_eq!(ns.kind_of("main.a"), None);
    assert_eq!(ns.kind_of("main.s"), None);
}

#[test]
fn entity_reassignment_moves_the_tag() {
    let ns = compiled("a = @p\na = @r");
    assert_eq!(
        commands(&ns, "main"),
        vec![
            "tag @p add main.a",
            "tag @e[tag=main.a] remove main.a",
            "tag @r add main.a",
        ]
    );
}

#[test]
fn strings_cannot_be_reassigned() {
    let err = compile_error("s = hi\ns = bye");
    assert_eq!(err.kind, ErrorKind::StringReassignment("s".into()));
    assert_eq!(err.line(), Some(2));
}

#[test]
fn declared_kinds_are_enforced() {
    assert_eq!(
        compile_error("x#i = @p").kind,
        ErrorKind::TypeMismatch {
            expected: "integer or integer variable".into(),
            value: "@p".into()
        }
    );
    assert_eq!(
        compile_error("x#e = 5").kind,
        ErrorKind::TypeMismatch {
            expected: "entity".into(),
            value: "5".into()
        }
    );
    assert_eq!(
        compile_error("X = 1").kind,
        ErrorKind::InvalidVariableName("X".into())
    );
    assert_eq!(
        compile_error("x =").kind,
        ErrorKind::ExpectedExpression("=".into())
    );
}

#[test]
fn summon_assignment_tags_the_new_object() {
    let ns = compiled("z = summon zombie\nz2 = summon zombie ~ ~ ~ {NoAI:1b}\nkill z");
    assert_eq!(
        commands(&ns, "main"),
        vec![
            "summon zombie ~ ~ ~ {Tags:[\"main.z\"]}",
            "summon zombie ~ ~ ~ {NoAI:1b,Tags:[\"main.z2\"]}",
            "kill @e[tag=main.z]",
        ]
    );
}

// =============================================================================
// Augmented Assignment
// =============================================================================

#[test]
fn augmented_operators() {
    let ns = compiled(
        "x = 1\nx += 2\nx -= -3\nx *= 4\nx++\nx--\ny = 0\nx %= y\nx >< y\nx < y",
    );
    assert_eq!(
        commands(&ns, "main"),
        vec![
            set("main.x.0", 1),
            format!("scoreboard players add {CARRIER} main.x.0 2"),
            format!("scoreboard players add {CARRIER} main.x.0 3"),
            operation("main.x.0", "*=", "CONSTANT.0"),
            format!("scoreboard players add {CARRIER} main.x.0 1"),
            format!("scoreboard players remove {CARRIER} main.x.0 1"),
            set("main.y.2", 0),
            operation("main.x.0", "%=", "main.y.2"),
            operation("main.x.0", "><", "main.y.2"),
            operation("main.x.0", "<", "main.y.2"),
        ]
    );
}

#[test]
fn literal_constants_are_interned_once() {
    let ns = compiled("x = 1\nx *= 3\nx *= 3\nx /= 5");
    assert_eq!(ns.constants(), &[3, 5]);
    let main = commands(&ns, "main");
    assert_eq!(main[1], operation("main.x.0", "*=", "CONSTANT.0"));
    assert_eq!(main[2], main[1]);
    assert_eq!(main[3], operation("main.x.0", "/=", "CONSTANT.1"));
}

#[test]
fn swap_never_writes_a_shared_constant() {
    let err = compile_error("b = 1\nc = 2\nc *= 5\nb >< 5");
    assert_eq!(err.kind, ErrorKind::InvalidAugmentedOperand("5".into()));
    assert_eq!(err.line(), Some(4));
}

#[test]
fn min_and_max_read_literal_constants() {
    let ns = compiled("b = 1\nc = 2\nc *= 5\nb < 5\nb > 5\nb >< c");
    assert_eq!(ns.constants(), &[5]);
    let main = commands(&ns, "main");
    assert_eq!(main[2], operation("main.c.1", "*=", "CONSTANT.0"));
    assert_eq!(main[3], operation("main.b.0", "<", "CONSTANT.0"));
    assert_eq!(main[4], operation("main.b.0", ">", "CONSTANT.0"));
    assert_eq!(main[5], operation("main.b.0", "><", "main.c.1"));
}

#[test]
fn augmented_errors() {
    assert_eq!(
        compile_error("s = hi\ns += 1").kind,
        ErrorKind::InvalidAugmentedTarget("s".into())
    );
    assert_eq!(
        compile_error("x = 1\nx += @p").kind,
        ErrorKind::InvalidAugmentedOperand("@p".into())
    );
    assert_eq!(
        compile_error("x = 1\nx +=").kind,
        ErrorKind::ExpectedExpression("+=".into())
    );
    assert_eq!(
        compile_error("ghost++").kind,
        ErrorKind::InvalidAugmentedTarget("ghost".into())
    );
}

// =============================================================================
// Substitution
// =============================================================================

#[test]
fn clarifiers_shape_references() {
    let ns = compiled("p = @a\nn = 2\nsay p#1 p#p n n#t n#v");
    let main = commands(&ns, "main");
    assert_eq!(
        main[2],
        format!(
            "say @e[tag=main.p,limit=1] @p[tag=main.p] {CARRIER} main.n.0 \
             {{\"score\":{{\"name\":\"@e[name=demo.VARS]\",\"objective\":\"main.n.0\"}}}} n"
        )
    );
}

#[test]
fn unknown_clarifier() {
    assert_eq!(
        compile_error("n = 1\nsay n#q").kind,
        ErrorKind::UnknownClarifier("q".into())
    );
}

#[test]
fn selectors_narrow_in_place() {
    let ns = compiled("p = @a\nkill p[distance=..5]");
    assert_eq!(commands(&ns, "main")[1], "kill @e[tag=main.p,distance=..5]");
}

#[test]
fn unknown_words_pass_through() {
    let ns = compiled("say hello world");
    assert_eq!(commands(&ns, "main"), vec!["say hello world"]);
}

#[test]
fn forbidden_leading_words() {
    assert!(matches!(
        compile_error("function demo:thing").kind,
        ErrorKind::MalformedCommand(_)
    ));
}

// =============================================================================
// Scoping
// =============================================================================

#[test]
fn locals_are_invisible_to_siblings() {
    let ns = compiled("x = 1\nas @a:\n    y = 2\n    say x y\nas @p:\n    say y");
    assert_eq!(
        commands(&ns, "main.e0"),
        vec![
            set("main.e0.y.1", 2),
            format!("say {CARRIER} main.x.0 {CARRIER} main.e0.y.1"),
        ]
    );
    assert_eq!(commands(&ns, "main.e1"), vec!["say y"]);
}

#[test]
fn assignment_rebinds_enclosing_variables() {
    let ns = compiled("x = 1\nas @a:\n    x = 5");
    assert_eq!(commands(&ns, "main.e0"), vec![set("main.x.0", 5)]);
    assert_eq!(ns.ints().len(), 1);
}

// =============================================================================
// Functions and Calls
// =============================================================================

#[test]
fn call_binds_entity_and_integer_parameters() {
    let ns = compiled(
        "def hit who n#i=1:\n    tellraw who n#t\nx = 4\nhit @p x\nhit @a",
    );
    assert_eq!(
        commands(&ns, "main.hit"),
        vec![
            "tellraw @e[tag=main.hit.who] \
             {\"score\":{\"name\":\"@e[name=demo.VARS]\",\"objective\":\"main.hit.n.0\"}}"
        ]
    );
    assert_eq!(
        commands(&ns, "main"),
        vec![
            set("main.x.1", 4),
            "tag @p add main.hit.who".to_string(),
            operation("main.hit.n.0", "=", "main.x.1"),
            "!f{main.hit}".to_string(),
            "tag @e[tag=main.hit.who] remove main.hit.who".to_string(),
            "tag @a add main.hit.who".to_string(),
            set("main.hit.n.0", 1),
            "!f{main.hit}".to_string(),
            "tag @e[tag=main.hit.who] remove main.hit.who".to_string(),
        ]
    );
    assert!(ns.function(&FunctionPath::parse("main.hit")).unwrap().used);
}

#[test]
fn calls_may_precede_definitions() {
    let ns = compiled("greet\ndef greet:\n    say hi\n    say there");
    assert_eq!(commands(&ns, "main"), vec!["!f{main.greet}"]);
}

#[test]
fn subfunctions_are_selected_by_name() {
    let ns = compiled(
        "def tools:\n    def heal:\n        effect give @s instant_health\n    say tools\ntools heal",
    );
    assert_eq!(commands(&ns, "main"), vec!["!f{main.tools.heal}"]);
    assert_eq!(
        commands(&ns, "main.tools.heal"),
        vec!["effect give @s instant_health"]
    );
}

#[test]
fn unknown_subfunction() {
    let err = compile_error("def tools:\n    say tools\ntools nope");
    assert_eq!(
        err.kind,
        ErrorKind::UnknownSubfunction {
            function: "tools".into(),
            name: "nope".into()
        }
    );
    assert_eq!(err.line(), Some(3));
}

#[test]
fn missing_arguments() {
    let err = compile_error("def f a:\n    say a\nf");
    assert_eq!(err.kind, ErrorKind::NotEnoughParameters("f".into()));
}

#[test]
fn defaults_rule_out_subfunctions() {
    let err = compile_error("def f a=1:\n    def g:\n        say g\n    say f");
    assert_eq!(err.kind, ErrorKind::DefaultsWithSubfunctions);
    assert_eq!(err.line(), Some(2));
}

#[test]
fn direct_recursion_is_rejected() {
    let err = compile_error("def f:\n    say f\n    f");
    assert_eq!(err.kind, ErrorKind::Recursion("f".into()));
    assert_eq!(err.line(), Some(3));
}

#[test]
fn calling_an_enclosing_function_is_rejected() {
    let err = compile_error("def f:\n    def g:\n        f\n    g");
    assert_eq!(err.kind, ErrorKind::Recursion("f.g".into()));
    assert_eq!(err.line(), Some(3));
}

#[test]
fn duplicate_definitions() {
    let err = compile_error("def f:\n    say a\ndef f:\n    say b");
    assert_eq!(err.kind, ErrorKind::DuplicateFunction("f".into()));
    assert_eq!(err.line(), Some(3));
}

#[test]
fn string_parameters_defer_compilation() {
    let ns = compiled("def greet name#s:\n    say hello name\ngreet Alex");
    assert_eq!(commands(&ns, "main"), vec!["!f{main.greet}{Alex}"]);
    let greet = ns.function(&FunctionPath::parse("main.greet")).unwrap();
    assert!(greet.template.is_some());
    assert!(greet.commands.is_empty());
}

// =============================================================================
// Structure
// =============================================================================

#[test]
fn empty_block_is_a_syntax_error() {
    let err = compile_error("as @a:\nsay hi");
    assert_eq!(err.kind, ErrorKind::ExpectedContent);
    assert!(err.to_string().starts_with("Error after line 1"));
}

#[test]
fn stray_indentation_is_a_syntax_error() {
    let err = compile_error("say hi\n    say there");
    assert_eq!(err.kind, ErrorKind::IncorrectIndentation);
    assert_eq!(err.line(), Some(1));
}

#[test]
fn empty_source_compiles_to_nothing() {
    let ns = compiled("");
    assert!(commands(&ns, "main").is_empty());
}
