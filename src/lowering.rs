//! Descenso del AST a representación intermedia.
//!
//! Cada función parseada se materializa en el módulo compartido en
//! orden de declaración: una función IR sin parámetros, un bloque de
//! entrada, una llamada por cada sentencia `print`/`println` y el
//! retorno terminal. Las rutinas externas de impresión se declaran
//! de forma perezosa, una sola vez por módulo. Tras cada función se
//! ejecuta la verificación estructural; sus fallas se reportan sin
//! abortar el descenso de las funciones restantes. Al final se exige
//! la presencia de una función llamada `main`.

use thiserror::Error;

use crate::{
    ir::{BlockId, FunctionId, Module, Type, Value, VerifierError},
    parse::{Ast, Function, ReturnSpec, ReturnType, Statement},
};

/// Error de programa completo.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ProgramError {
    /// Se consumió toda la unidad sin encontrar `main`.
    #[error("Program defines no `main` function")]
    MissingMain,
}

/// Desciende un programa completo a un módulo IR.
///
/// Las advertencias de verificación acompañan al módulo; un programa
/// sin `main` es fatal y no produce módulo alguno, aunque todas sus
/// funciones ya hayan descendido con éxito.
pub fn lower(ast: Ast, unit_name: &str) -> Result<(Module, Vec<VerifierError>), ProgramError> {
    let has_main = ast.contains("main");

    let mut lowerer = Lowerer {
        module: Module::new(unit_name),
        print: None,
        println: None,
    };

    let mut warnings = Vec::new();
    for function in ast.into_functions() {
        let id = lowerer.function(function);
        if let Err(failure) = lowerer.module.verify_function(id) {
            warnings.push(failure);
        }
    }

    if !has_main {
        return Err(ProgramError::MissingMain);
    }

    Ok((lowerer.module, warnings))
}

/// Rutina externa de impresión.
#[derive(Copy, Clone)]
enum Printer {
    Print,
    Println,
}

impl Printer {
    fn symbol(self) -> &'static str {
        match self {
            Printer::Print => "print",
            Printer::Println => "println",
        }
    }
}

struct Lowerer {
    module: Module,
    print: Option<FunctionId>,
    println: Option<FunctionId>,
}

impl Lowerer {
    fn function(&mut self, function: Function) -> FunctionId {
        let Function {
            name,
            return_type,
            body,
            ret,
        } = function;

        let returns = match return_type {
            ReturnType::Int => Type::I32,
            ReturnType::Void => Type::Void,
        };

        let id = self.module.define_function(name.val().as_ref(), returns);
        let entry = self.module.add_block(id);

        for statement in body {
            match statement.into_inner() {
                Statement::Print(text) => self.print_call(entry, Printer::Print, &text),
                Statement::Println(text) => self.print_call(entry, Printer::Println, &text),
            }
        }

        match ret.into_inner() {
            ReturnSpec::Int(value) => self.module.build_ret(entry, Some(Value::Int(value))),
            ReturnSpec::Void => self.module.build_ret(entry, None),
        }

        id
    }

    fn print_call(&mut self, block: BlockId, printer: Printer, text: &str) {
        let callee = self.routine(printer);
        let text = self.module.intern_string(text);
        self.module.build_call(block, callee, vec![Value::Str(text)]);
    }

    /// Declara la rutina externa en su primer uso.
    fn routine(&mut self, printer: Printer) -> FunctionId {
        let slot = match printer {
            Printer::Print => &mut self.print,
            Printer::Println => &mut self.println,
        };

        match *slot {
            Some(id) => id,
            None => {
                let id = self
                    .module
                    .declare_function(printer.symbol(), Type::Void, vec![Type::Ptr]);
                *slot = Some(id);
                id
            }
        }
    }
}
