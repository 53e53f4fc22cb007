use fnlang::{
    error::Diagnostics,
    lex::Lexer,
    parse::{self, Ast, ParserWarning, ReturnSpec, ReturnType, Statement},
    source::{self, Located},
};

fn parse(text: &str) -> Result<(Ast, Vec<Located<ParserWarning>>), Diagnostics> {
    let (start, stream) = source::consume(text, "test.fn");
    parse::parse(Lexer::new(start, stream))
}

#[test]
fn whitespace_only_program_has_no_functions() {
    let (ast, warnings) = parse(" \n\t ").expect("parse ok");
    assert!(ast.functions().is_empty());
    assert!(warnings.is_empty());
}

#[test]
fn int_function_round_trip() {
    let (ast, _) = parse("fn f() @ int { return 5; }").expect("parse ok");

    let function = &ast.functions()[0];
    assert_eq!(function.name.val().as_ref(), "f");
    assert_eq!(function.return_type, ReturnType::Int);
    assert!(function.body.is_empty());
    assert_eq!(*function.ret.val(), ReturnSpec::Int(5));
}

#[test]
fn statements_keep_source_order() {
    let source = r#"fn main() @ void { print("a"); println("b"); print("c"); return void; }"#;
    let (ast, _) = parse(source).expect("parse ok");

    let body: Vec<&Statement> = ast.functions()[0].body.iter().map(Located::val).collect();
    assert_eq!(
        body,
        vec![
            &Statement::Print(String::from("a")),
            &Statement::Println(String::from("b")),
            &Statement::Print(String::from("c")),
        ]
    );
}

#[test]
fn missing_semicolon_pinpoints_the_next_token() {
    let error = parse("fn f() @ int { return 5 }").unwrap_err().to_string();
    assert!(error.contains("Expected `;`, found `}` instead"), "{}", error);
    assert!(error.contains("test.fn:1:25"), "{}", error);
}

#[test]
fn invalid_return_type_pinpoints_the_spelling() {
    let error = parse("fn f() @ bool { return void; }")
        .unwrap_err()
        .to_string();

    assert!(error.contains("Unknown return type `bool`"), "{}", error);
    assert!(error.contains("test.fn:1:10"), "{}", error);
}

#[test]
fn return_type_must_be_an_identifier() {
    let error = parse("fn f() @ return { return void; }")
        .unwrap_err()
        .to_string();

    assert!(error.contains("Expected identifier"), "{}", error);
}

#[test]
fn duplicate_function_names_are_accepted() {
    let source = "fn main() @ void { return void; } fn main() @ void { return void; }";
    let (ast, warnings) = parse(source).expect("parse ok");

    assert_eq!(ast.functions().len(), 2);
    assert!(ast
        .functions()
        .iter()
        .all(|function| function.name.val().as_ref() == "main"));
    assert!(warnings.is_empty());
}

#[test]
fn void_function_must_return_the_void_identifier() {
    let error = parse("fn f() @ void { return 0; }").unwrap_err().to_string();
    assert!(
        error.contains("Invalid return value literal `0` for a function returning void"),
        "{}",
        error
    );
}

#[test]
fn int_function_must_return_an_integer_literal() {
    let error = parse("fn f() @ int { return void; }")
        .unwrap_err()
        .to_string();

    assert!(
        error.contains("Invalid return value identifier `void` for a function returning int"),
        "{}",
        error
    );
}

#[test]
fn int_function_requires_a_terminal_return() {
    let error = parse("fn f() @ int { }").unwrap_err().to_string();
    assert!(error.contains("has no `return`"), "{}", error);
}

#[test]
fn void_function_may_omit_the_terminal_return() {
    let (ast, _) = parse(r#"fn main() @ void { println("hi"); }"#).expect("parse ok");

    let function = &ast.functions()[0];
    assert_eq!(function.body.len(), 1);
    assert_eq!(*function.ret.val(), ReturnSpec::Void);
}

#[test]
fn stray_top_level_tokens_are_skipped_with_a_warning() {
    let (ast, warnings) = parse("; fn main() @ void { return void; } 5").expect("parse ok");

    assert_eq!(ast.functions().len(), 1);
    assert_eq!(warnings.len(), 2);
    assert!(matches!(warnings[0].val(), ParserWarning::StrayToken(_)));
}

#[test]
fn function_limit_is_enforced() {
    let source = "fn main() @ void { return void; } fn f() @ void { return void; }";
    let (start, stream) = source::consume(source, "test.fn");
    let error = parse::parse_with_limit(Lexer::new(start, stream), 1)
        .unwrap_err()
        .to_string();

    assert!(error.contains("Too many functions, the limit is 1"), "{}", error);
}

#[test]
fn end_of_input_inside_a_body_is_fatal() {
    let error = parse("fn f() @ void {").unwrap_err().to_string();
    assert!(error.contains("Expected `}`, input ended instead"), "{}", error);
}

#[test]
fn unknown_statement_keyword_is_fatal() {
    let error = parse("fn f() @ void { f(); }").unwrap_err().to_string();
    assert!(
        error.contains("Expected any of `print`, `println` or `return`, found identifier `f`"),
        "{}",
        error
    );
}

#[test]
fn print_requires_a_string_literal_argument() {
    let error = parse(r#"fn main() @ void { print(5); return void; }"#)
        .unwrap_err()
        .to_string();

    assert!(
        error.contains("Expected string literal, found literal `5`"),
        "{}",
        error
    );
}
