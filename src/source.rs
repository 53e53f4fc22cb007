//! Rastreo de ubicaciones originales en código fuente.
//!
//! Los distintos objetos internos que el compilador construye
//! deben llevar cuenta de posiciones en el código fuente original,
//! lo cual permite determinar un punto exacto en donde ocurre un
//! error de abstracción arbitraria. El cargador de fuentes entrega
//! el texto completo de una unidad de compilación de una sola vez;
//! este módulo lo descompone en un flujo de caracteres ubicados.

use std::{
    fmt::{self, Debug, Display, Formatter},
    rc::Rc,
};

/// Un flujo de entrada, carácter por carácter.
pub trait InputStream: Iterator<Item = (char, Location)> {}

impl<S: Iterator<Item = (char, Location)>> InputStream for S {}

/// Un objeto cualquiera con una posición original asociada.
#[derive(Debug, Clone)]
pub struct Located<T> {
    location: Location,
    value: T,
}

impl<T> Located<T> {
    /// Obtiene el valor.
    pub fn val(&self) -> &T {
        &self.value
    }

    /// Obtiene la ubicación.
    pub fn location(&self) -> &Location {
        &self.location
    }

    /// Descarta la ubicación y toma ownership del valor.
    pub fn into_inner(self) -> T {
        self.value
    }

    /// Descompone y toma ownership de las dos partes.
    pub fn split(self) -> (Location, T) {
        (self.location, self.value)
    }

    /// Construye a partir de un valor y una ubicación.
    pub fn at(value: T, location: Location) -> Self {
        Located { value, location }
    }

    /// Transforma el valor con la misma ubicación.
    pub fn map<U, F>(self, map: F) -> Located<U>
    where
        F: FnOnce(T) -> U,
    {
        Located {
            value: map(self.value),
            location: self.location,
        }
    }
}

impl<T> AsRef<T> for Located<T> {
    fn as_ref(&self) -> &T {
        &self.value
    }
}

/// Una ubicación está conformada por un origen y una posición puntual.
#[derive(Clone)]
pub struct Location {
    from: Rc<Source>,
    position: Position,
}

impl Location {
    /// Obtiene la posición línea-columna.
    pub fn position(&self) -> Position {
        self.position
    }

    /// Nombre de la unidad de compilación de origen.
    pub fn unit(&self) -> &str {
        &self.from.name
    }

    /// Ubicación del carácter que sigue al carácter consumido.
    pub(crate) fn successor(&self, consumed: char) -> Location {
        let position = match consumed {
            '\n' => self.position.newline(),
            _ => self.position.advance(),
        };

        Location {
            from: Rc::clone(&self.from),
            position,
        }
    }

    /// Aplica una operación sobre la línea de texto original, si existe.
    pub(crate) fn with_line<F, R>(&self, with: F) -> Option<R>
    where
        F: FnOnce(&str) -> R,
    {
        let index = self.position.line().checked_sub(1)? as usize;
        self.from.lines.get(index).map(|line| with(line.as_str()))
    }
}

impl Display for Location {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}:{}", self.from.name, self.position)
    }
}

impl Debug for Location {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        <Self as Display>::fmt(self, formatter)
    }
}

/// Una posición línea-columna en un archivo.
///
/// Toda columna avanza de uno en uno, incluyendo tabuladores;
/// solamente `'\n'` incrementa la línea y reinicia la columna.
#[derive(Copy, Clone, Eq, PartialEq)]
pub struct Position {
    line: u32,
    column: u32,
}

impl Position {
    /// Obtiene el número de línea.
    pub fn line(&self) -> u32 {
        self.line
    }

    /// Obtiene el número de columna.
    pub fn column(&self) -> u32 {
        self.column
    }

    /// Incrementa el número de columna.
    pub fn advance(self) -> Position {
        Position {
            line: self.line,
            column: self.column + 1,
        }
    }

    /// Incrementa el número de línea y retorna a la columna 1.
    pub fn newline(self) -> Position {
        Position {
            line: self.line + 1,
            column: 1,
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Position { line: 1, column: 1 }
    }
}

impl Display for Position {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}:{}", self.line, self.column)
    }
}

/// Transforma un buffer de texto en un flujo de caracteres ubicados.
///
/// El primer elemento de la tupla de retorno es la ubicación inicial
/// de la unidad, necesaria incluso cuando el buffer está vacío. El
/// histórico de líneas se conserva para que los diagnósticos puedan
/// citar el texto original.
pub fn consume<S>(text: &str, name: S) -> (Location, impl InputStream)
where
    S: Into<String>,
{
    let source = Rc::new(Source {
        name: name.into(),
        lines: text.lines().map(String::from).collect(),
    });

    let start = Location {
        from: Rc::clone(&source),
        position: Position::default(),
    };

    let mut position = Position::default();
    let chars: Vec<char> = text.chars().collect();
    let stream = chars.into_iter().map(move |c| {
        let here = Location {
            from: Rc::clone(&source),
            position,
        };

        position = match c {
            '\n' => position.newline(),
            _ => position.advance(),
        };

        (c, here)
    });

    (start, stream)
}

/// Nombre de origen e histórico interior de líneas.
struct Source {
    name: String,
    lines: Vec<String>,
}
