//! Análisis sintáctico.
//!
//! El parser es de descenso recursivo con un token de lookahead.
//! Solicita tokens al lexer bajo demanda y construye un nodo de
//! función por cada declaración `fn` de nivel superior. El primer
//! error sintáctico o léxico es fatal; no hay recuperación.

use std::fmt::{self, Display};
use thiserror::Error;

use crate::{
    error::Diagnostics,
    lex::{Identifier, Keyword, Lexer, LexerError, Token},
    source::{InputStream, Located, Location},
};

/// Cantidad máxima predeterminada de funciones por programa.
pub const DEFAULT_FUNCTION_LIMIT: usize = 100;

/// Programa completo en orden de declaración.
#[derive(Debug)]
pub struct Ast {
    functions: Vec<Function>,
}

impl Ast {
    /// Funciones en orden de declaración.
    pub fn functions(&self) -> &[Function] {
        &self.functions
    }

    /// Toma ownership de las funciones, en orden de declaración.
    pub fn into_functions(self) -> Vec<Function> {
        self.functions
    }

    /// Determina si existe al menos una función con este nombre.
    ///
    /// Los nombres no son únicos; esta consulta existe solamente
    /// para la verificación de presencia de `main`.
    pub fn contains(&self, name: &str) -> bool {
        self.functions
            .iter()
            .any(|function| function.name.val().as_ref() == name)
    }
}

/// Una declaración de función.
#[derive(Debug)]
pub struct Function {
    pub name: Located<Identifier>,
    pub return_type: ReturnType,
    pub body: Vec<Located<Statement>>,
    pub ret: Located<ReturnSpec>,
}

/// Tipo de retorno declarado tras el separador `@`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ReturnType {
    Int,
    Void,
}

impl Display for ReturnType {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReturnType::Int => fmt.write_str("int"),
            ReturnType::Void => fmt.write_str("void"),
        }
    }
}

/// Una sentencia en el cuerpo de una función.
#[derive(Debug, PartialEq, Eq)]
pub enum Statement {
    Print(String),
    Println(String),
}

/// El retorno terminal de una función.
///
/// No es una sentencia: termina la lista de sentencias. Por
/// construcción siempre es estructuralmente consistente con el
/// [`ReturnType`] declarado de su función.
#[derive(Debug, PartialEq, Eq)]
pub enum ReturnSpec {
    Int(i64),
    Void,
}

/// Error de análisis sintáctico.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ParserError {
    #[error("Expected {0}, found {1} instead")]
    UnexpectedToken(Token, Token),

    #[error("Expected {0}, input ended instead")]
    MissingToken(Token),

    #[error("Expected identifier")]
    ExpectedId,

    #[error("Expected string literal, found {0} instead")]
    ExpectedString(Token),

    #[error("Expected any of `print`, `println` or `return`, found {0} instead")]
    UnknownStatement(Token),

    #[error("Unknown return type `{0}`, expected `int` or `void`")]
    InvalidReturnType(Identifier),

    #[error("Invalid return value {0} for a function returning {1}")]
    InvalidReturnValue(Token, ReturnType),

    #[error("Function returns {0} but its body has no `return`")]
    MissingReturn(ReturnType),

    #[error("Too many functions, the limit is {0}")]
    FunctionLimit(usize),
}

/// Condición no fatal detectada durante el parsing.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ParserWarning {
    #[error("Stray {0} at top level, expected a function declaration")]
    StrayToken(Token),
}

pub fn parse<S: InputStream>(
    lexer: Lexer<S>,
) -> Result<(Ast, Vec<Located<ParserWarning>>), Diagnostics> {
    parse_with_limit(lexer, DEFAULT_FUNCTION_LIMIT)
}

pub fn parse_with_limit<S: InputStream>(
    lexer: Lexer<S>,
    limit: usize,
) -> Result<(Ast, Vec<Located<ParserWarning>>), Diagnostics> {
    let last_known = lexer.location();
    let mut parser = Parser {
        lexer,
        last_known,
        limit,
    };

    parser.program()
}

struct Parser<S: InputStream> {
    lexer: Lexer<S>,
    last_known: Location,
    limit: usize,
}

type Parse<T> = Result<T, Diagnostics>;

impl<S: InputStream> Parser<S> {
    fn program(&mut self) -> Parse<(Ast, Vec<Located<ParserWarning>>)> {
        let mut functions = Vec::new();
        let mut warnings = Vec::new();

        loop {
            let (location, token) = self.next()?.split();
            match token {
                Token::Eof => break,

                Token::Keyword(Keyword::Fn) => {
                    if functions.len() == self.limit {
                        return self.fail(ParserError::FunctionLimit(self.limit));
                    }

                    functions.push(self.function()?);
                }

                // Tokens sueltos de nivel superior no son un error:
                // se ignoran, dejando solamente una advertencia
                stray => warnings.push(Located::at(ParserWarning::StrayToken(stray), location)),
            }
        }

        Ok((Ast { functions }, warnings))
    }

    /// Parsea una declaración cuyo `fn` ya fue consumido.
    fn function(&mut self) -> Parse<Function> {
        let name = self.id()?;

        self.expect(Token::OpenParen)?;
        self.expect(Token::CloseParen)?;
        self.expect(Token::Separator)?;
        let return_type = self.return_type()?;

        self.expect(Token::OpenCurly)?;
        let mut body = Vec::new();

        let ret = loop {
            let (location, token) = self.next()?.split();
            match token {
                Token::Keyword(Keyword::Print) => {
                    let value = self.call_argument()?;
                    body.push(Located::at(Statement::Print(value), location));
                }

                Token::Keyword(Keyword::Println) => {
                    let value = self.call_argument()?;
                    body.push(Located::at(Statement::Println(value), location));
                }

                // `return` detiene la acumulación de sentencias; lo
                // único que puede seguir al punto y coma es `}`
                Token::Keyword(Keyword::Return) => {
                    let ret = self.return_value(return_type)?;
                    self.expect(Token::Semicolon)?;
                    self.expect(Token::CloseCurly)?;
                    break ret;
                }

                // Retorno implícito: válido solamente para `void`
                Token::CloseCurly => match return_type {
                    ReturnType::Void => break Located::at(ReturnSpec::Void, location),
                    ReturnType::Int => {
                        return self.fail(ParserError::MissingReturn(return_type))
                    }
                },

                Token::Eof => return self.fail(ParserError::MissingToken(Token::CloseCurly)),

                unknown => return self.fail(ParserError::UnknownStatement(unknown)),
            }
        };

        Ok(Function {
            name,
            return_type,
            body,
            ret,
        })
    }

    /// Parsea `( StrLiteral ) ;` tras `print`/`println`.
    fn call_argument(&mut self) -> Parse<String> {
        self.expect(Token::OpenParen)?;

        let (_, token) = self.next()?.split();
        let value = match token {
            Token::StrLiteral(value) => value,
            other => return self.fail(ParserError::ExpectedString(other)),
        };

        self.expect(Token::CloseParen)?;
        self.expect(Token::Semicolon)?;

        Ok(value)
    }

    fn return_type(&mut self) -> Parse<ReturnType> {
        let name = self.id()?;
        match name.val().as_ref() {
            "int" => Ok(ReturnType::Int),
            "void" => Ok(ReturnType::Void),
            _ => self.fail(ParserError::InvalidReturnType(name.into_inner())),
        }
    }

    /// Parsea el valor de un `return` según el tipo declarado.
    ///
    /// Un retorno `void` se escribe `return void;`, donde `void` es
    /// léxicamente un identificador; la palabra está reservada
    /// únicamente en la posición de anotación de tipo.
    fn return_value(&mut self, return_type: ReturnType) -> Parse<Located<ReturnSpec>> {
        let (location, token) = self.next()?.split();
        match (return_type, token) {
            (ReturnType::Int, Token::IntLiteral(value)) => {
                Ok(Located::at(ReturnSpec::Int(value), location))
            }

            (ReturnType::Void, Token::Id(id)) if id.as_ref() == "void" => {
                Ok(Located::at(ReturnSpec::Void, location))
            }

            (_, found) => self.fail(ParserError::InvalidReturnValue(found, return_type)),
        }
    }

    fn id(&mut self) -> Parse<Located<Identifier>> {
        let (location, token) = self.next()?.split();
        match token {
            Token::Id(id) => Ok(Located::at(id, location)),
            _ => self.fail(ParserError::ExpectedId),
        }
    }

    fn expect(&mut self, expected: Token) -> Parse<()> {
        let found = self.next()?.into_inner();
        if found == expected {
            Ok(())
        } else if let Token::Eof = found {
            self.fail(ParserError::MissingToken(expected))
        } else {
            self.fail(ParserError::UnexpectedToken(expected, found))
        }
    }

    fn next(&mut self) -> Result<Located<Token>, Located<LexerError>> {
        let token = self.lexer.next_token()?;
        self.last_known = token.location().clone();
        Ok(token)
    }

    fn fail<T>(&self, error: ParserError) -> Parse<T> {
        Err(Located::at(error, self.last_known.clone()).into())
    }
}
