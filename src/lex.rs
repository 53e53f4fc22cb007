//! Análisis léxico.
//!
//! # Tokenization
//! Esta es la primera fase del compilador. Descompone un [`InputStream`]
//! (flujo de caracteres) en unidades léxicas denominadas tokens. Los
//! espacios en blanco se descartan durante esta operación. Cada token
//! emitido está asociado a una ubicación en el código fuente original,
//! lo cual permite rastrear errores tanto en los tokens como en
//! constructos más elevados de fases posteriores.
//!
//! # Contenido de un token
//! Este lexer no produce lexemas para casos donde no son necesarios.
//! Puntuación y palabras clave se identifican por el hecho de lo que
//! son y no incluyen lexemas. Por su parte, los identificadores sí
//! incluyen su lexema original y los literales de cadena conservan su
//! contenido byte por byte, sin procesar secuencias de escape. Las
//! constantes enteras se resuelven a sus valores en vez de preservar
//! sus lexemas.
//!
//! # Reglas importantes del lenguaje
//! - Las palabras clave son exactamente `fn`, `print`, `println` y
//!   `return`; el lenguaje es case-sensitive.
//! - Los identificadores son corridas de letras ASCII, sin límite de
//!   longitud.
//! - `'@'` es un token separador reservado que marca la posición de
//!   una anotación de tipo de retorno.
//!
//! # Errores
//! Todo error léxico es fatal: no hay resincronización ni recolección
//! de múltiples errores. El primer error aborta la compilación entera.

use crate::source::{InputStream, Located, Location};
use std::{
    fmt::{self, Display},
    mem,
    rc::Rc,
    str::FromStr,
};

use thiserror::Error;

/// Error de escaneo.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum LexerError {
    /// Carácter desconocido o inesperado en el flujo de entrada.
    #[error("Unexpected character {0:?} in input stream")]
    BadChar(char),

    /// El flujo terminó dentro de un literal de cadena.
    #[error("Unterminated string literal")]
    UnterminatedString,

    /// Una constante entera se encuentra fuera de rango.
    #[error("Integer literal overflow, valid range is [0, {}]", i64::MAX)]
    IntOverflow,
}

/// Un identificador.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier(Rc<String>);

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for Identifier {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_ref().fmt(fmt)
    }
}

/// Objeto resultante del análisis léxico.
///
/// Un token contiene suficiente información para describir completamente
/// a una entidad léxica en el programa fuente.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Identificador.
    Id(Identifier),

    /// Palabra clave.
    Keyword(Keyword),

    /// Literal de entero.
    IntLiteral(i64),

    /// Literal de cadena, byte por byte y sin escapes.
    StrLiteral(String),

    /// `(`
    OpenParen,

    /// `)`
    CloseParen,

    /// `{`
    OpenCurly,

    /// `}`
    CloseCurly,

    /// `;`
    Semicolon,

    /// `@`, marcador de anotación de tipo de retorno.
    Separator,

    /// Fin de la entrada.
    Eof,
}

impl Display for Token {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Token::*;

        match self {
            Id(id) => write!(fmt, "identifier `{}`", id),
            Keyword(keyword) => write!(fmt, "keyword `{}`", keyword),
            IntLiteral(integer) => write!(fmt, "literal `{}`", integer),
            StrLiteral(string) => write!(fmt, "string literal \"{}\"", string),
            OpenParen => fmt.write_str("`(`"),
            CloseParen => fmt.write_str("`)`"),
            OpenCurly => fmt.write_str("`{`"),
            CloseCurly => fmt.write_str("`}`"),
            Semicolon => fmt.write_str("`;`"),
            Separator => fmt.write_str("`@`"),
            Eof => fmt.write_str("end of input"),
        }
    }
}

/// Una palabra clave.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Keyword {
    Fn,
    Print,
    Println,
    Return,
}

impl Display for Keyword {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Keyword::*;
        let string = match self {
            Fn => "fn",
            Print => "print",
            Println => "println",
            Return => "return",
        };

        fmt.write_str(string)
    }
}

impl FromStr for Keyword {
    type Err = ();

    fn from_str(string: &str) -> Result<Self, Self::Err> {
        use Keyword::*;

        const KEYWORDS: &[(&str, Keyword)] = &[
            ("fn", Fn),
            ("print", Print),
            ("println", Println),
            ("return", Return),
        ];

        KEYWORDS
            .iter()
            .find(|&&(name, _)| name == string)
            .map(|&(_, keyword)| keyword)
            .ok_or(())
    }
}

/// Máquina de estados para análisis léxico.
///
/// Un lexer puede encontrarse en uno de diversos estados. La
/// salida del lexer, así como su siguiente estado, se define
/// a partir de tanto su estado actual como el siguiente carácter
/// encontrado en el flujo de entrada.
pub struct Lexer<S: Iterator> {
    source: std::iter::Peekable<S>,
    state: State,
    start: Location,
    here: Location,
}

/// Posibles estados del lexer.
enum State {
    /// Estado que ocurre antes de encontrar el inicio de un token.
    Start,

    /// Estado de completitud; siempre emite el token incluido,
    /// sin consumir la entrada actual, y pasa a [`State::Start`].
    Complete(Token),

    /// Interior de un literal de cadena.
    Str(String),

    /// Constante entera.
    ///
    /// Este estado incluirá dígitos en el token mientras que
    /// el siguiente carácter sea un dígito.
    Integer(i64),

    /// Término que puede ser un identificador o una palabra clave.
    Word(String),
}

impl<S: InputStream> Lexer<S> {
    /// Crea un lexer en estado inicial a partir de un flujo.
    pub fn new(start: Location, source: S) -> Self {
        let here = start.clone();
        Lexer {
            source: source.peekable(),
            state: State::Start,
            start,
            here,
        }
    }

    /// Ubicación del siguiente carácter sin consumir.
    pub fn location(&self) -> Location {
        self.here.clone()
    }

    /// Construye el siguiente token.
    ///
    /// Una vez agotada la entrada, toda llamada posterior produce
    /// [`Token::Eof`] indefinidamente.
    pub fn next_token(&mut self) -> Result<Located<Token>, Located<LexerError>> {
        let result = self.lex();
        self.state = State::Start;
        result
    }

    /// Ejecuta la máquina de estados hasta emitir un token o fallar.
    fn lex(&mut self) -> Result<Located<Token>, Located<LexerError>> {
        use {State::*, Token::*};

        let token = loop {
            let next_char = self.source.peek().map(|(c, _)| *c);

            // La posición de origen se mueve junto a la posición
            // siguiente siempre que no se haya encontrado una
            // frontera de token
            if let Start = self.state {
                if let Some((_, location)) = self.source.peek() {
                    self.start = location.clone();
                }
            }

            // Switch table principal, determina cambios de estado
            // y de salida del lexer a partir de combinaciones del
            // estado actual y el siguiente carácter
            match (&mut self.state, next_char) {
                (Start, None) => return Ok(Located::at(Eof, self.here.clone())),

                // Tokens triviales
                (Start, Some('(')) => self.state = Complete(OpenParen),
                (Start, Some(')')) => self.state = Complete(CloseParen),
                (Start, Some('{')) => self.state = Complete(OpenCurly),
                (Start, Some('}')) => self.state = Complete(CloseCurly),
                (Start, Some(';')) => self.state = Complete(Semicolon),
                (Start, Some('@')) => self.state = Complete(Separator),

                // Literales de cadena
                (Start, Some('"')) => self.state = Str(String::new()),

                // Identificadores y palabras clave
                (Start, Some(c)) if c.is_ascii_alphabetic() => self.state = Word(c.to_string()),

                // Inicio de una constante numérica. No se consume
                // el dígito, ya que esta lógica ya está implementada
                // en el respectivo caso para un estado de constante
                // entera. Por tanto, la constante es inicialmente cero.
                (Start, Some(c)) if c.is_ascii_digit() => {
                    self.state = Integer(0);
                    continue;
                }

                // Espacios en blanco y caracteres inesperados
                (Start, Some(c)) if c.is_ascii_whitespace() => (),
                (Start, Some(c)) => break Err(LexerError::BadChar(c)),

                // Emisión retardada de tokens cualesquiera
                (Complete(value), _) => break Ok(mem::replace(value, Eof)),

                // Una cadena sin cerrar se reporta en la comilla de apertura
                (Str(_), None) => {
                    return Err(Located::at(
                        LexerError::UnterminatedString,
                        self.start.clone(),
                    ))
                }

                // La comilla de cierre forma parte del token y se consume
                (Str(string), Some('"')) => {
                    let string = mem::take(string);
                    self.state = Complete(StrLiteral(string));
                }

                // Sin secuencias de escape: cada carácter pasa tal cual
                (Str(string), Some(c)) => string.push(c),

                // Acumulación dígito por dígito de constantes enteras
                (Integer(accumulated), Some(digit)) if digit.is_ascii_digit() => {
                    let digit = digit.to_digit(10).map(i64::from).unwrap_or(0);

                    match accumulated
                        .checked_mul(10)
                        .and_then(|n| n.checked_add(digit))
                    {
                        Some(result) => *accumulated = result,
                        None => break Err(LexerError::IntOverflow),
                    }
                }

                // Si sigue algo que no es un dígito, la constante ha terminado
                (Integer(integer), _) => break Ok(IntLiteral(*integer)),

                // Extensión de términos
                (Word(word), Some(c)) if c.is_ascii_alphabetic() => word.push(c),

                // Si sigue algo que no puede formar parte del término, ha terminado
                (Word(word), _) => {
                    let word = mem::take(word);
                    match self::Keyword::from_str(&word) {
                        Ok(keyword) => break Ok(Keyword(keyword)),
                        Err(()) => break Ok(Id(Identifier(Rc::new(word)))),
                    }
                }
            }

            // Si no hubo `continue`, aquí se consume el carácter que
            // se observó con lookahead anteriormente
            if let Some((c, location)) = self.source.next() {
                self.here = location.successor(c);
            }
        };

        match token {
            Ok(token) => Ok(Located::at(token, self.start.clone())),
            Err(error) => Err(Located::at(error, self.start.clone())),
        }
    }
}

impl<S: InputStream> Iterator for Lexer<S> {
    type Item = Result<Located<Token>, Located<LexerError>>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_token() {
            Ok(token) if matches!(token.val(), Token::Eof) => None,
            other => Some(other),
        }
    }
}
