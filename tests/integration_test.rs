// ABOUTME: End-to-end tests running whole programs and checking their output

use ocrpi::error::Fault;
use ocrpi::eval::Interp;
use ocrpi::lexer::{lex, TokenKind};
use ocrpi::parser::parse;

/// Run a program through the full pipeline and return what it printed.
fn run(source: &str) -> String {
    let (output, result) = run_with_result(source);
    result.expect("program should run cleanly");
    output
}

fn run_fault(source: &str) -> Fault {
    let (_, result) = run_with_result(source);
    result.expect_err("program should fault")
}

fn run_with_result(source: &str) -> (String, Result<(), Fault>) {
    let parsed = parse(lex(source));
    assert!(
        parsed.errors.is_empty(),
        "unexpected parse errors: {:?}",
        parsed.errors
    );
    let mut buf = Vec::new();
    let result = {
        let mut interp = Interp::with_output(Box::new(&mut buf));
        interp.run(&parsed.program)
    };
    (
        String::from_utf8(buf).expect("program output should be utf-8"),
        result,
    )
}

// ===== The end-to-end scenarios =====

#[test]
fn test_hello_world() {
    assert_eq!(run("print(\"hello, world\")"), "hello, world\n");
}

#[test]
fn test_global_and_function_call() {
    let source = "global x = 3\n\
                  function add(a, b)\n\
                      return a + b\n\
                  endfunction\n\
                  print(add(x, 4))";
    assert_eq!(run(source), "7\n");
}

#[test]
fn test_for_loop_prints_three_lines() {
    let source = "for i = 0 to 3\n    print(i)\nnext i";
    assert_eq!(run(source), "0\n1\n2\n");
}

#[test]
fn test_swap_through_byref_parameters() {
    let source = "procedure swap(a:byRef, b:byRef)\n\
                      t = a\n\
                      a = b\n\
                      b = t\n\
                  endprocedure\n\
                  global x = 1\n\
                  global y = 2\n\
                  swap(x, y)\n\
                  print(x)\n\
                  print(y)";
    assert_eq!(run(source), "2\n1\n");
}

#[test]
fn test_typeof_nil() {
    assert_eq!(run("print(typeof(nil))"), "Nil\n");
}

#[test]
fn test_parse_error_recovers_and_blocks_evaluation() {
    // One broken statement, then a perfectly good function: panic-mode
    // recovery reports exactly one error, and a non-empty error list
    // means the program never runs.
    let source = "global x 3\n\
                  function add(a, b)\n\
                      return a + b\n\
                  endfunction\n\
                  print(add(1, 2))";
    let parsed = parse(lex(source));
    assert_eq!(parsed.errors.len(), 1);
}

// ===== Invariants =====

#[test]
fn test_lexing_always_ends_in_one_eof() {
    for source in ["", "x = 1", "\"open string", "function f()"] {
        let tokens = lex(source);
        assert_eq!(
            tokens.iter().filter(|t| t.kind == TokenKind::Eof).count(),
            1,
            "source {:?}",
            source
        );
        assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::Eof));
    }
}

#[test]
fn test_parsing_twice_yields_equal_asts() {
    let source = "global x = 3\n\
                  for i = 0 to x\n\
                      print(i * 2)\n\
                  next i";
    let first = parse(lex(source));
    let second = parse(lex(source));
    assert!(first.errors.is_empty());
    assert_eq!(first.program, second.program);
}

#[test]
fn test_caller_scope_survives_nested_calls() {
    let source = "function inner()\n\
                      return 1\n\
                  endfunction\n\
                  function outer()\n\
                      local = 5\n\
                      inner()\n\
                      return local\n\
                  endfunction\n\
                  x = 7\n\
                  print(outer())\n\
                  print(x)";
    assert_eq!(run(source), "5\n7\n");
}

#[test]
fn test_no_closures_over_the_call_site() {
    let source = "function leak()\n\
                      return secret\n\
                  endfunction\n\
                  function caller()\n\
                      secret = 42\n\
                      return leak()\n\
                  endfunction\n\
                  caller()";
    assert!(matches!(run_fault(source), Fault::UnknownVar(name) if name == "secret"));
}

// ===== Round trips =====

#[test]
fn test_bool_is_idempotent() {
    let source = "print(bool(bool(5)) == bool(5))\n\
                  print(bool(bool(\"\")) == bool(\"\"))\n\
                  print(bool(bool(nil)) == bool(nil))";
    assert_eq!(run(source), "true\ntrue\ntrue\n");
}

#[test]
fn test_int_string_round_trip() {
    let source = "print(int(string(42)) == 42)\n\
                  print(int(string(-7)) == -7)\n\
                  print(int(string(0)) == 0)";
    assert_eq!(run(source), "true\ntrue\ntrue\n");
}

// ===== Boundary behaviours =====

#[test]
fn test_empty_for_range_runs_zero_iterations() {
    assert_eq!(run("for i = 5 to 5\n    print(i)\nnext i"), "");
}

#[test]
fn test_do_until_true_runs_exactly_once() {
    assert_eq!(run("do\n    print(\"tick\")\nuntil true"), "tick\n");
}

#[test]
fn test_division_by_zero_is_a_fault() {
    assert!(matches!(run_fault("print(1 / 0)"), Fault::DivisionByZero));
}

// ===== Native library behaviour =====

#[test]
fn test_string_renders_canonically() {
    let source = "print(string(nil))\n\
                  print(string(true))\n\
                  print(string(2.5))\n\
                  array a[2]\n\
                  print(string(a))";
    assert_eq!(run(source), "nil\ntrue\n2.5\n[nil, nil]\n");
}

#[test]
fn test_typeof_names_every_common_variant() {
    let source = "print(typeof(1))\n\
                  print(typeof(1.5))\n\
                  print(typeof(\"s\"))\n\
                  print(typeof(true))\n\
                  array a[1]\n\
                  print(typeof(a))";
    assert_eq!(run(source), "Int\nFloat\nString\nBool\nArray\n");
}

#[test]
fn test_typeof_of_callables() {
    let source =
        "function f()\n    return 1\nendfunction\nprint(typeof(f))\nprint(typeof(print))";
    assert_eq!(run(source), "Function\nNativeProcedure\n");
}

#[test]
fn test_numeric_coercions() {
    let source = "print(int(\"42\"))\n\
                  print(int(3.9))\n\
                  print(int(nil))\n\
                  print(float(2))\n\
                  print(float(\"1.5\"))";
    assert_eq!(run(source), "42\n3\n0\n2\n1.5\n");
}

#[test]
fn test_unconvertible_string_faults() {
    assert!(matches!(
        run_fault("print(int(\"not a number\"))"),
        Fault::NativeConvert { name: "int", .. }
    ));
}

#[test]
fn test_coercing_an_array_faults() {
    assert!(matches!(
        run_fault("array a[1]\nprint(int(a))"),
        Fault::NativeType { name: "int", .. }
    ));
}

#[test]
fn test_print_with_no_args_prints_a_bare_newline() {
    assert_eq!(run("print()"), "\n");
}

// ===== Larger programs =====

#[test]
fn test_fizz_fragment() {
    let source = "for i = 1 to 8\n\
                      if i MOD 3 == 0 then\n\
                          print(\"fizz\")\n\
                      else\n\
                          print(i)\n\
                      endif\n\
                  next i";
    assert_eq!(run(source), "1\n2\nfizz\n4\n5\nfizz\n7\n");
}

#[test]
fn test_switch_drives_control_flow() {
    let source = "function describe(n)\n\
                      label = \"\"\n\
                      switch n MOD 2\n\
                      case 0:\n\
                          label = \"even\"\n\
                      default:\n\
                          label = \"odd\"\n\
                      endswitch\n\
                      return label\n\
                  endfunction\n\
                  print(describe(4))\n\
                  print(describe(7))";
    assert_eq!(run(source), "even\nodd\n");
}

#[test]
fn test_nested_function_declarations() {
    let source = "function outer()\n\
                      function helper(n)\n\
                          return n * 2\n\
                      endfunction\n\
                      return helper(21)\n\
                  endfunction\n\
                  print(outer())";
    assert_eq!(run(source), "42\n");
}

#[test]
fn test_while_loop_accumulates() {
    let source = "total = 0\n\
                  n = 1\n\
                  while n <= 4\n\
                      total += n\n\
                      n += 1\n\
                  endwhile\n\
                  print(total)";
    assert_eq!(run(source), "10\n");
}
