use std::{env, fs};

use fnlang::ir::{Module, Type, Value, VerifierError};

#[test]
fn module_is_built_through_the_operation_set() {
    let mut module = Module::new("unit.fn");
    let print = module.declare_function("print", Type::Void, vec![Type::Ptr]);
    let main = module.define_function("main", Type::I32);
    let entry = module.add_block(main);

    let greeting = module.intern_string("hola");
    module.build_call(entry, print, vec![Value::Str(greeting)]);
    module.build_ret(entry, Some(Value::Int(0)));

    assert!(module.verify_function(main).is_ok());
    assert!(module.verify_function(print).is_ok());

    let text = module.to_string();
    assert!(text.contains("declare void @print(ptr)"), "{}", text);
    assert!(text.contains("define i32 @main() {"), "{}", text);
    assert!(text.contains("entry:"), "{}", text);
    assert!(text.contains("call void @print(ptr @.str.0)"), "{}", text);
    assert!(text.contains("ret i32 0"), "{}", text);
    assert!(text.contains("[5 x i8] c\"hola\\00\""), "{}", text);
}

#[test]
fn interned_strings_are_deduplicated() {
    let mut module = Module::new("unit.fn");
    let first = module.intern_string("x");
    let second = module.intern_string("x");
    let third = module.intern_string("y");

    assert_eq!(first, second);
    assert_ne!(first, third);
    assert_eq!(module.to_string().matches("= private unnamed_addr").count(), 2);
}

#[test]
fn non_printable_bytes_are_hex_escaped() {
    let mut module = Module::new("unit.fn");
    module.intern_string("a\tb");

    let text = module.to_string();
    assert!(text.contains("[4 x i8] c\"a\\09b\\00\""), "{}", text);
}

#[test]
fn verifier_rejects_function_without_blocks() {
    let mut module = Module::new("unit.fn");
    let main = module.define_function("main", Type::Void);

    assert!(matches!(
        module.verify_function(main),
        Err(VerifierError::Empty(_))
    ));
}

#[test]
fn verifier_rejects_block_without_terminator() {
    let mut module = Module::new("unit.fn");
    let main = module.define_function("main", Type::Void);
    module.add_block(main);

    assert!(matches!(
        module.verify_function(main),
        Err(VerifierError::NoTerminator(_, 0))
    ));
}

#[test]
fn verifier_rejects_return_type_mismatch() {
    let mut module = Module::new("unit.fn");
    let main = module.define_function("main", Type::I32);
    let entry = module.add_block(main);
    module.build_ret(entry, None);

    assert!(matches!(
        module.verify_function(main),
        Err(VerifierError::BadReturn(_, Type::I32))
    ));
}

#[test]
fn verifier_rejects_call_arity_mismatch() {
    let mut module = Module::new("unit.fn");
    let print = module.declare_function("print", Type::Void, vec![Type::Ptr]);
    let main = module.define_function("main", Type::Void);
    let entry = module.add_block(main);
    module.build_call(entry, print, Vec::new());
    module.build_ret(entry, None);

    assert!(matches!(
        module.verify_function(main),
        Err(VerifierError::BadCall(_, 0, 1))
    ));
}

#[test]
fn verifier_flags_duplicate_symbols() {
    let mut module = Module::new("unit.fn");
    module.define_function("main", Type::Void);
    let duplicate = module.define_function("main", Type::Void);
    let entry = module.add_block(duplicate);
    module.build_ret(entry, None);

    assert!(matches!(
        module.verify_function(duplicate),
        Err(VerifierError::DuplicateSymbol(_))
    ));
}

#[test]
fn write_to_file_emits_textual_ir() {
    let mut module = Module::new("unit.fn");
    let main = module.define_function("main", Type::Void);
    let entry = module.add_block(main);
    module.build_ret(entry, None);

    let path = env::temp_dir().join(format!("fnlang-ir-{}.ll", std::process::id()));
    module.write_to_file(&path).expect("write ok");

    let text = fs::read_to_string(&path).expect("read back");
    fs::remove_file(&path).ok();

    assert_eq!(text, module.to_string());
    assert!(text.contains("; ModuleID = 'unit.fn'"));
}
