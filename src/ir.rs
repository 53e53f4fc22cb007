//! Representación intermedia y su emisión textual.
//!
//! Este módulo expone el conjunto de operaciones que la fase de
//! descenso ([`crate::lowering`]) necesita de un generador de código:
//! crear un módulo, declarar y definir funciones, abrir bloques
//! básicos, construir llamadas y retornos, internar constantes de
//! cadena globales, verificar estructuralmente una función y
//! serializar el módulo como IR textual estilo LLVM (punteros opacos
//! `ptr`, constantes `private unnamed_addr` terminadas en NUL).
//!
//! El IR es un modelo de datos con ownership simple: el [`Module`]
//! es dueño de todas sus funciones, bloques e instrucciones, y todo
//! se libera junto cuando el módulo se descarta.

use std::{
    fmt::{self, Display, Write as _},
    fs::File,
    io::{self, BufWriter, Write},
    path::Path,
};

use thiserror::Error;

/// Tipo de primera clase en el IR.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Type {
    I32,
    Ptr,
    Void,
}

impl Display for Type {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::I32 => fmt.write_str("i32"),
            Type::Ptr => fmt.write_str("ptr"),
            Type::Void => fmt.write_str("void"),
        }
    }
}

/// Handle opaco de una función en su módulo.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FunctionId(usize);

/// Handle opaco de una constante de cadena global.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct StrId(usize);

/// Handle opaco de un bloque básico.
///
/// Las operaciones `build_*` insertan siempre al final del bloque
/// indicado, al estilo de un builder posicionado.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BlockId {
    function: usize,
    block: usize,
}

/// Un operando de instrucción.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    Int(i64),
    Str(StrId),
}

/// Falla de verificación estructural.
///
/// Estas condiciones se reportan y no abortan la compilación de
/// funciones posteriores.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum VerifierError {
    #[error("Function `{0}` has no basic blocks")]
    Empty(String),

    #[error("Basic block {1} of function `{0}` has no terminator")]
    NoTerminator(String, usize),

    #[error("Return value of function `{0}` does not match its return type `{1}`")]
    BadReturn(String, Type),

    #[error("Call to `{0}` has {1} arguments, expected {2}")]
    BadCall(String, usize, usize),

    #[error("Symbol `{0}` is defined more than once in the module")]
    DuplicateSymbol(String),
}

/// Un módulo en construcción incremental.
pub struct Module {
    name: String,
    strings: Vec<String>,
    functions: Vec<Function>,
}

struct Function {
    name: String,
    returns: Type,
    parameters: Vec<Type>,
    body: FunctionBody,
}

enum FunctionBody {
    External,
    Generated(Vec<Block>),
}

#[derive(Default)]
struct Block {
    instructions: Vec<Instruction>,
    terminator: Option<Terminator>,
}

enum Instruction {
    Call {
        callee: FunctionId,
        arguments: Vec<Value>,
    },
}

enum Terminator {
    Ret(Option<Value>),
}

impl Module {
    /// Crea un módulo vacío para una unidad de compilación.
    pub fn new<S: Into<String>>(name: S) -> Self {
        Module {
            name: name.into(),
            strings: Vec::new(),
            functions: Vec::new(),
        }
    }

    /// Nombre de la unidad de compilación.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declara una función externa al módulo.
    pub fn declare_function(
        &mut self,
        name: &str,
        returns: Type,
        parameters: Vec<Type>,
    ) -> FunctionId {
        self.functions.push(Function {
            name: name.to_owned(),
            returns,
            parameters,
            body: FunctionBody::External,
        });

        FunctionId(self.functions.len() - 1)
    }

    /// Define una función sin parámetros con cuerpo inicialmente vacío.
    pub fn define_function(&mut self, name: &str, returns: Type) -> FunctionId {
        self.functions.push(Function {
            name: name.to_owned(),
            returns,
            parameters: Vec::new(),
            body: FunctionBody::Generated(Vec::new()),
        });

        FunctionId(self.functions.len() - 1)
    }

    /// Busca una función por nombre, externa o definida.
    pub fn lookup(&self, name: &str) -> Option<FunctionId> {
        self.functions
            .iter()
            .position(|function| function.name == name)
            .map(FunctionId)
    }

    /// Abre un bloque básico al final de una función definida.
    pub fn add_block(&mut self, function: FunctionId) -> BlockId {
        let blocks = match &mut self.functions[function.0].body {
            FunctionBody::Generated(blocks) => blocks,
            FunctionBody::External => panic!("cannot add a basic block to an external function"),
        };

        blocks.push(Block::default());
        BlockId {
            function: function.0,
            block: blocks.len() - 1,
        }
    }

    /// Interna una constante de cadena global, una vez por contenido.
    pub fn intern_string(&mut self, text: &str) -> StrId {
        match self.strings.iter().position(|interned| interned == text) {
            Some(index) => StrId(index),
            None => {
                self.strings.push(text.to_owned());
                StrId(self.strings.len() - 1)
            }
        }
    }

    /// Inserta una llamada al final del bloque.
    pub fn build_call(&mut self, block: BlockId, callee: FunctionId, arguments: Vec<Value>) {
        self.block_mut(block)
            .instructions
            .push(Instruction::Call { callee, arguments });
    }

    /// Termina el bloque con un retorno, con o sin valor.
    pub fn build_ret(&mut self, block: BlockId, value: Option<Value>) {
        self.block_mut(block).terminator = Some(Terminator::Ret(value));
    }

    fn block_mut(&mut self, at: BlockId) -> &mut Block {
        match &mut self.functions[at.function].body {
            FunctionBody::Generated(blocks) => &mut blocks[at.block],
            FunctionBody::External => panic!("external functions have no basic blocks"),
        }
    }

    /// Verificación estructural de una función.
    ///
    /// Retorna la primera falla encontrada: símbolos duplicados en el
    /// módulo, bloques sin terminador, retornos inconsistentes con el
    /// tipo declarado y llamadas con aridad incorrecta.
    pub fn verify_function(&self, function: FunctionId) -> Result<(), VerifierError> {
        let subject = &self.functions[function.0];

        let duplicate = self
            .functions
            .iter()
            .enumerate()
            .any(|(index, other)| index != function.0 && other.name == subject.name);

        if duplicate {
            return Err(VerifierError::DuplicateSymbol(subject.name.clone()));
        }

        let blocks = match &subject.body {
            FunctionBody::External => return Ok(()),
            FunctionBody::Generated(blocks) => blocks,
        };

        if blocks.is_empty() {
            return Err(VerifierError::Empty(subject.name.clone()));
        }

        for (index, block) in blocks.iter().enumerate() {
            for instruction in &block.instructions {
                match instruction {
                    Instruction::Call { callee, arguments } => {
                        let callee = &self.functions[callee.0];
                        if callee.parameters.len() != arguments.len() {
                            return Err(VerifierError::BadCall(
                                callee.name.clone(),
                                arguments.len(),
                                callee.parameters.len(),
                            ));
                        }
                    }
                }
            }

            match &block.terminator {
                None => {
                    return Err(VerifierError::NoTerminator(subject.name.clone(), index));
                }

                Some(Terminator::Ret(value)) => {
                    let consistent = matches!(
                        (subject.returns, value),
                        (Type::Void, None) | (Type::I32, Some(Value::Int(_)))
                    );

                    if !consistent {
                        return Err(VerifierError::BadReturn(
                            subject.name.clone(),
                            subject.returns,
                        ));
                    }
                }
            }
        }

        Ok(())
    }

    /// Serializa el módulo como IR textual hacia un archivo.
    pub fn write_to_file(&self, path: &Path) -> io::Result<()> {
        let mut output = BufWriter::new(File::create(path)?);
        write!(output, "{}", self)?;
        output.flush()
    }

    fn write_value(&self, fmt: &mut fmt::Formatter<'_>, value: &Value) -> fmt::Result {
        match value {
            Value::Int(integer) => write!(fmt, "i32 {}", integer),
            Value::Str(StrId(index)) => write!(fmt, "ptr @.str.{}", index),
        }
    }
}

impl Display for Module {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(fmt, "; ModuleID = '{}'", self.name)?;
        writeln!(fmt, "source_filename = \"{}\"", self.name)?;

        if !self.strings.is_empty() {
            writeln!(fmt)?;
        }

        for (index, text) in self.strings.iter().enumerate() {
            writeln!(
                fmt,
                "@.str.{} = private unnamed_addr constant [{} x i8] c\"{}\\00\"",
                index,
                text.len() + 1,
                escape(text)
            )?;
        }

        for function in &self.functions {
            writeln!(fmt)?;

            match &function.body {
                FunctionBody::External => {
                    let mut parameters = String::new();
                    for (index, parameter) in function.parameters.iter().enumerate() {
                        if index > 0 {
                            parameters.push_str(", ");
                        }
                        write!(parameters, "{}", parameter)?;
                    }

                    writeln!(
                        fmt,
                        "declare {} @{}({})",
                        function.returns, function.name, parameters
                    )?;
                }

                FunctionBody::Generated(blocks) => {
                    writeln!(fmt, "define {} @{}() {{", function.returns, function.name)?;

                    for (index, block) in blocks.iter().enumerate() {
                        if index == 0 {
                            writeln!(fmt, "entry:")?;
                        } else {
                            writeln!(fmt, "bb{}:", index)?;
                        }

                        for instruction in &block.instructions {
                            match instruction {
                                Instruction::Call { callee, arguments } => {
                                    let callee = &self.functions[callee.0];
                                    write!(fmt, "  call {} @{}(", callee.returns, callee.name)?;

                                    for (index, argument) in arguments.iter().enumerate() {
                                        if index > 0 {
                                            write!(fmt, ", ")?;
                                        }
                                        self.write_value(fmt, argument)?;
                                    }

                                    writeln!(fmt, ")")?;
                                }
                            }
                        }

                        match &block.terminator {
                            Some(Terminator::Ret(None)) => writeln!(fmt, "  ret void")?,
                            Some(Terminator::Ret(Some(value))) => {
                                write!(fmt, "  ret ")?;
                                self.write_value(fmt, value)?;
                                writeln!(fmt)?;
                            }

                            // La verificación reporta esto; el texto lo
                            // deja explícito en vez de inventar un `ret`
                            None => writeln!(fmt, "  ; <<missing terminator>>")?,
                        }
                    }

                    writeln!(fmt, "}}")?;
                }
            }
        }

        Ok(())
    }
}

/// Escapa una constante de cadena al formato `c"..."` de LLVM.
///
/// El contenido llega byte por byte desde el lexer, sin escapes del
/// lenguaje fuente; aquí solamente se protegen los bytes que el
/// formato textual no admite literalmente.
fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for byte in text.bytes() {
        match byte {
            b'"' | b'\\' => escaped.push_str(&format!("\\{:02X}", byte)),
            0x20..=0x7e => escaped.push(byte as char),
            _ => escaped.push_str(&format!("\\{:02X}", byte)),
        }
    }

    escaped
}
