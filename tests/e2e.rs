//! End-to-end translation scenarios, driven through the library entry
//! point against real files on disk rather than the in-process engine
//! helpers `src/engine.rs`'s unit tests use.

use std::fs;
use std::path::Path;

fn compile_to_string(dir: &Path, class_name: &str, source: &str) -> String {
    let in_path = dir.join(format!("{class_name}.jack"));
    fs::write(&in_path, source).unwrap();

    let outputs = jackc::compile_path(&in_path).expect("compilation should succeed");
    assert_eq!(outputs, vec![dir.join(format!("{class_name}.vm"))]);

    fs::read_to_string(&outputs[0]).unwrap()
}

#[test]
fn scenario_void_return() {
    let dir = tempfile::tempdir().unwrap();
    let vm = compile_to_string(
        dir.path(),
        "Main",
        "class Main { function void main() { return; } }",
    );
    assert_eq!(vm, "function Main.main 0\npush constant 0\nreturn\n");
}

#[test]
fn scenario_constructor_field_assignment() {
    let dir = tempfile::tempdir().unwrap();
    let vm = compile_to_string(
        dir.path(),
        "P",
        "class P { field int x; constructor P new(int v) { let x = v; return this; } }",
    );
    assert_eq!(
        vm,
        "function P.new 0\n\
         push constant 1\n\
         call Memory.alloc 1\n\
         pop pointer 0\n\
         push argument 0\n\
         pop this 0\n\
         push pointer 0\n\
         return\n"
    );
}

#[test]
fn scenario_method_array_read() {
    let dir = tempfile::tempdir().unwrap();
    let vm = compile_to_string(
        dir.path(),
        "C",
        "class C { method int get(int i) { var Array a; return a[i]; } }",
    );
    assert_eq!(
        vm,
        "function C.get 1\n\
         push argument 0\n\
         pop pointer 0\n\
         push local 0\n\
         push argument 1\n\
         add\n\
         pop pointer 1\n\
         push that 0\n\
         return\n"
    );
}

#[test]
fn scenario_do_discards_return_value() {
    let dir = tempfile::tempdir().unwrap();
    let vm = compile_to_string(
        dir.path(),
        "M",
        "class M { function void main() { do Output.printInt(1+2); return; } }",
    );
    assert_eq!(
        vm,
        "function M.main 0\n\
         push constant 1\n\
         push constant 2\n\
         add\n\
         call Output.printInt 1\n\
         pop temp 0\n\
         push constant 0\n\
         return\n"
    );
}

#[test]
fn scenario_while_loop_labels() {
    let dir = tempfile::tempdir().unwrap();
    let vm = compile_to_string(
        dir.path(),
        "L",
        "class L { function void f() { var int i; let i = 0; \
         while (i < 3) { let i = i + 1; } return; } }",
    );
    assert_eq!(
        vm,
        "function L.f 1\n\
         push constant 0\n\
         pop local 0\n\
         label WHILE_EXP0\n\
         push local 0\n\
         push constant 3\n\
         lt\n\
         not\n\
         if-goto WHILE_END0\n\
         push local 0\n\
         push constant 1\n\
         add\n\
         pop local 0\n\
         goto WHILE_EXP0\n\
         label WHILE_END0\n\
         push constant 0\n\
         return\n"
    );
}

#[test]
fn scenario_string_literal_appends_each_char() {
    let dir = tempfile::tempdir().unwrap();
    let vm = compile_to_string(
        dir.path(),
        "S",
        "class S { function void f() { do Output.printString(\"Hi\"); return; } }",
    );
    assert!(vm.contains("call String.new 1\n"));
    assert!(vm.contains("push constant 72\ncall String.appendChar 2\n"));
    assert!(vm.contains("push constant 105\ncall String.appendChar 2\n"));
}

#[test]
fn directory_with_multiple_classes_compiles_each_independently() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("A.jack"),
        "class A { function void f() { return; } }",
    )
    .unwrap();
    fs::write(
        dir.path().join("B.jack"),
        "class B { function void g() { return; } }",
    )
    .unwrap();

    let outputs = jackc::compile_path(dir.path()).expect("both files should compile");
    assert_eq!(outputs.len(), 2);
    assert!(dir.path().join("A.vm").exists());
    assert!(dir.path().join("B.vm").exists());
}

#[test]
fn lexical_error_on_unterminated_string_reports_the_failing_file() {
    let dir = tempfile::tempdir().unwrap();
    let in_path = dir.path().join("Bad.jack");
    fs::write(
        &in_path,
        "class Bad { function void f() { do Output.printString(\"oops; return; } }",
    )
    .unwrap();

    let err = jackc::compile_path(&in_path).unwrap_err();
    assert!(matches!(err, jackc::CompilerError::Lexical { .. }));
}
