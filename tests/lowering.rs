use fnlang::{
    ir::{Module, VerifierError},
    lex::Lexer,
    lowering::{self, ProgramError},
    parse, source,
};

fn lower(text: &str) -> Result<(Module, Vec<VerifierError>), ProgramError> {
    let (start, stream) = source::consume(text, "test.fn");
    let (ast, _) = parse::parse(Lexer::new(start, stream)).expect("parse ok");
    lowering::lower(ast, "test.fn")
}

/// Cuerpo textual de un `define`, desde su encabezado hasta `}`.
fn body_of<'a>(text: &'a str, header: &str) -> &'a str {
    let from = text.find(header).expect("function not found");
    let until = text[from..].find('}').expect("unterminated body");
    &text[from..from + until + 1]
}

#[test]
fn int_function_round_trip() {
    let source = "fn f() @ int { return 5; } fn main() @ void { return void; }";
    let (module, warnings) = lower(source).expect("lower ok");
    assert!(warnings.is_empty());

    let text = module.to_string();
    let body = body_of(&text, "define i32 @f()");
    assert!(body.contains("ret i32 5"), "{}", text);
    assert!(!body.contains("call"), "{}", text);
}

#[test]
fn println_in_a_void_function() {
    let source = r#"fn f() @ void { println("hi"); return void; }
                    fn main() @ void { return void; }"#;
    let (module, warnings) = lower(source).expect("lower ok");
    assert!(warnings.is_empty());

    let text = module.to_string();
    assert!(
        text.contains("@.str.0 = private unnamed_addr constant [3 x i8] c\"hi\\00\""),
        "{}",
        text
    );
    assert!(text.contains("declare void @println(ptr)"), "{}", text);

    let body = body_of(&text, "define void @f()");
    assert_eq!(body.matches("call").count(), 1, "{}", text);

    let call = body.find("call void @println(ptr @.str.0)").expect("call");
    let ret = body.find("ret void").expect("ret");
    assert!(call < ret, "{}", text);
}

#[test]
fn lowered_calls_mirror_statement_order() {
    let source = r#"fn main() @ void { print("a"); println("b"); print("c"); return void; }"#;
    let (module, _) = lower(source).expect("lower ok");
    let text = module.to_string();

    let first = text.find("call void @print(ptr @.str.0)").expect("a");
    let second = text.find("call void @println(ptr @.str.1)").expect("b");
    let third = text.find("call void @print(ptr @.str.2)").expect("c");

    assert!(first < second && second < third, "{}", text);
}

#[test]
fn missing_main_is_fatal() {
    let result = lower("fn helper() @ void { return void; }");
    assert!(matches!(result, Err(ProgramError::MissingMain)));
}

#[test]
fn duplicate_mains_lower_with_a_verifier_warning() {
    let source = "fn main() @ void { return void; } fn main() @ void { return void; }";
    let (module, warnings) = lower(source).expect("lower ok");

    let text = module.to_string();
    assert_eq!(text.matches("define void @main()").count(), 2, "{}", text);
    assert!(warnings
        .iter()
        .any(|warning| matches!(warning, VerifierError::DuplicateSymbol(name) if name == "main")));
}

#[test]
fn print_routine_is_declared_once_per_module() {
    let source = r#"fn f() @ void { println("x"); return void; }
                    fn main() @ void { println("y"); return void; }"#;
    let (module, _) = lower(source).expect("lower ok");
    let text = module.to_string();

    assert_eq!(text.matches("declare void @println(ptr)").count(), 1, "{}", text);
}

#[test]
fn equal_string_literals_are_interned_once() {
    let source = r#"fn main() @ void { print("x"); print("x"); return void; }"#;
    let (module, _) = lower(source).expect("lower ok");
    let text = module.to_string();

    assert_eq!(text.matches("= private unnamed_addr").count(), 1, "{}", text);
    assert_eq!(text.matches("call void @print(ptr @.str.0)").count(), 2, "{}", text);
}

#[test]
fn module_carries_the_unit_name() {
    let (module, _) = lower("fn main() @ void { return void; }").expect("lower ok");
    let text = module.to_string();

    assert!(text.contains("; ModuleID = 'test.fn'"), "{}", text);
    assert!(text.contains("source_filename = \"test.fn\""), "{}", text);
}

#[test]
fn lowered_functions_pass_verification() {
    let source = r#"fn main() @ int { println("hi"); return 0; }"#;
    let (module, warnings) = lower(source).expect("lower ok");
    assert!(warnings.is_empty());

    let main = module.lookup("main").expect("defined");
    assert!(module.verify_function(main).is_ok());

    let println_fn = module.lookup("println").expect("declared");
    assert!(module.verify_function(println_fn).is_ok());
    assert!(module.lookup("nope").is_none());
}
