//! End-to-end tests: source text in, prints and notes out.

use symphonyc::{ErrorKind, compile, compile_and_run};

fn run(source: &str) -> (String, Vec<String>) {
    compile_and_run(source, None).unwrap()
}

fn run_err(source: &str) -> ErrorKind {
    compile_and_run(source, None).unwrap_err().kind
}

#[test]
fn test_iterative_factorial() {
    let (prints, notes) = run(
        "program p;
         int x;
         fun int fact(int n) {
             int r;
             r = 1;
             while (n > 0) {
                 r = r * n;
                 n = n - 1;
             }
             return r;
         }
         x = 5;
         print(fact(x));",
    );
    assert_eq!(prints, "120");
    assert!(notes.is_empty());
}

#[test]
fn test_recursive_factorial() {
    let (prints, _) = run(
        "program p;
         fun int f(int n) {
             if (n <= 1) {
                 return 1;
             }
             return n * f(n - 1);
         }
         print(f(5));",
    );
    assert_eq!(prints, "120");
}

#[test]
fn test_bubble_sort_through_an_array() {
    let (prints, _) = run(
        "program p;
         int a[3];
         int i, j, t;
         a[0] = 3;
         a[1] = 1;
         a[2] = 2;
         i = 0;
         while (i < 2) {
             j = 0;
             while (j < 2 - i) {
                 if (a[j + 1] < a[j]) {
                     t = a[j];
                     a[j] = a[j + 1];
                     a[j + 1] = t;
                 }
                 j = j + 1;
             }
             i = i + 1;
         }
         println(a[0]);
         println(a[1]);
         println(a[2]);",
    );
    assert_eq!(prints, "1\n2\n3\n");
}

#[test]
fn test_boolean_operators_evaluate_fully() {
    let (prints, _) = run(
        "program p;
         print(true or false);
         print(1 equals 1 and 2 equals 3);",
    );
    assert_eq!(prints, "truefalse");
}

#[test]
fn test_musical_loop() {
    let (prints, notes) = run(
        "program p;
         int n;
         n = 3;
         while (n > 0) {
             A();
             n = n - 1;
         }",
    );
    assert_eq!(prints, "");
    assert_eq!(notes, vec!["A", "A", "A"]);
}

#[test]
fn test_leftover_input_lines_are_an_arity_error() {
    let err = compile_and_run(
        "program p;
         str s;
         s = input();
         print(s);",
        Some("one\ntwo"),
    )
    .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Arity);
}

#[test]
fn test_division_by_zero() {
    assert_eq!(run_err("program p; print(1 / 0);"), ErrorKind::DivisionByZero);
}

#[test]
fn test_array_access_out_of_bounds() {
    assert_eq!(
        run_err("program p; int a[2]; a[2] = 1;"),
        ErrorKind::Index
    );
}

#[test]
fn test_assignment_type_mismatch() {
    assert_eq!(
        run_err("program p; int x; x = \"hi\";"),
        ErrorKind::Type
    );
}

#[test]
fn test_break_outside_a_loop() {
    assert_eq!(run_err("program p; break;"), ErrorKind::Misplaced);
}

#[test]
fn test_little_star() {
    let (_, notes) = run("program p; little_star();");
    assert_eq!(
        notes,
        vec!["C", "C", "G", "G", "A", "A", "G", "F", "F", "E", "E", "D", "D", "C"]
    );
}

#[test]
fn test_elseif_chain_picks_one_branch() {
    let source = |n: i64| {
        format!(
            "program p;
             int n;
             n = {};
             if (n equals 1) {{ print(\"one\"); }}
             elseif (n equals 2) {{ print(\"two\"); }}
             else {{ print(\"many\"); }}",
            n
        )
    };
    assert_eq!(run(&source(1)).0, "one");
    assert_eq!(run(&source(2)).0, "two");
    assert_eq!(run(&source(7)).0, "many");
}

#[test]
fn test_break_leaves_the_innermost_loop() {
    let (prints, _) = run(
        "program p;
         int n;
         n = 0;
         while (true) {
             n = n + 1;
             if (n equals 3) { break; }
         }
         print(n);",
    );
    assert_eq!(prints, "3");
}

#[test]
fn test_string_builtins() {
    let (prints, _) = run(
        "program p;
         str s;
         s = \"do\" + \"re\";
         print(length(s));
         print(get(s, 2));
         print(to_str(5) + \"!\");",
    );
    assert_eq!(prints, "4r5!");
}

#[test]
fn test_copy_replaces_the_destination() {
    let (prints, _) = run(
        "program p;
         str s, t;
         s = \"mi\";
         t = \"fa\";
         copy(t, s);
         print(t);",
    );
    assert_eq!(prints, "mi");
}

#[test]
fn test_math_builtins() {
    let (prints, _) = run(
        "program p;
         print(floor(sqrt(2.0)));
         print(ceil(1.5));",
    );
    assert_eq!(prints, "12");
}

#[test]
fn test_exponentiation_is_right_associative() {
    let (prints, _) = run("program p; print(2 ** 3 ** 2);");
    assert_eq!(prints, "512");
}

#[test]
fn test_self_update_statements() {
    let (prints, _) = run(
        "program p;
         int n;
         n = 5;
         ++n;
         --n;
         ++n;
         print(n);",
    );
    assert_eq!(prints, "6");
}

#[test]
fn test_uninitialized_read() {
    assert_eq!(
        run_err("program p; int x; print(x);"),
        ErrorKind::Uninitialized
    );
}

#[test]
fn test_locals_do_not_leak_into_the_caller() {
    let (prints, _) = run(
        "program p;
         int x;
         fun void shadow() {
             int x;
             x = 99;
         }
         x = 1;
         shadow();
         print(x);",
    );
    assert_eq!(prints, "1");
}

#[test]
fn test_runs_are_deterministic() {
    let source = "program p;
         int n;
         n = 4;
         while (n > 0) {
             println(n * n);
             C();
             n = n - 1;
         }";
    let first = run(source);
    let second = run(source);
    assert_eq!(first, second);
}

#[test]
fn test_quad_zero_reaches_main() {
    let program = compile(
        "program p;
         int x;
         fun int twice(int n) { return n + n; }
         x = twice(2);
         print(x);",
    )
    .unwrap();
    // Quad 0 jumps straight past every function body.
    let main = match &program.quads[0] {
        symphony_core::Quad::Goto { target: Some(target) } => *target,
        other => panic!("quad 0 must be a patched GOTO, got {:?}", other),
    };
    assert!(matches!(
        program.quads[main - 1],
        symphony_core::Quad::Endproc { .. }
    ));
    for function in program.functions.values() {
        assert!(function.starting_quad >= 1);
        assert!(function.starting_quad < main);
    }
}

#[test]
fn test_random_stays_in_the_unit_interval() {
    let (prints, _) = run(
        "program p;
         dec r;
         r = random();
         print(r >= 0.0 and r < 1.0);",
    );
    assert_eq!(prints, "true");
}

#[test]
fn test_input_feeds_lines_in_order() {
    let (prints, _) = compile_and_run(
        "program p;
         str a, b;
         a = input();
         b = input();
         println(a);
         println(b);",
        Some("la\nsi"),
    )
    .unwrap();
    assert_eq!(prints, "la\nsi\n");
}

#[test]
fn test_nested_calls_keep_their_own_arguments() {
    let (prints, _) = run(
        "program p;
         fun int double(int n) { return n + n; }
         fun int add(int a, int b) { return a + b; }
         print(add(1, double(3)));",
    );
    assert_eq!(prints, "7");
}

#[test]
fn test_chains_of_mixed_precedence() {
    let (prints, _) = run("program p; print(1 + 2 + 3 * 4);");
    assert_eq!(prints, "15");
    let (prints, _) = run("program p; print(10 - 2 - 3 - 1);");
    assert_eq!(prints, "4");
}

#[test]
fn test_arguments_arrive_left_to_right() {
    let (prints, _) = run(
        "program p;
         fun void pair(str a, str b) {
             print(a);
             print(b);
         }
         pair(\"do\", \"re\");",
    );
    assert_eq!(prints, "dore");
}

#[test]
fn test_array_elements_pass_through_calls() {
    let (prints, _) = run(
        "program p;
         int a[2];
         fun int twice(int n) { return n + n; }
         a[0] = 7;
         a[1] = twice(a[0]);
         print(a[1]);",
    );
    assert_eq!(prints, "14");
}

#[test]
fn test_mutual_use_of_globals_inside_functions() {
    let (prints, notes) = run(
        "program p;
         int count;
         fun void beep() {
             count = count + 1;
             G();
         }
         count = 0;
         beep();
         beep();
         print(count);",
    );
    assert_eq!(prints, "2");
    assert_eq!(notes, vec!["G", "G"]);
}
