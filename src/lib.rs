//! Compilador AOT para el lenguaje FnLang.
//!
//! # Front end
//! Cada programa deriva de un único archivo de código fuente. Este
//! archivo se somete primero a análisis léxico en [`lex`], de lo cual
//! se obtiene un flujo de tokens ubicados. El flujo de tokens se
//! dispone en un AST por medio de análisis sintáctico de descenso
//! recursivo en [`parse`], un nodo por cada declaración `fn` de nivel
//! superior. El AST desciende en [`lowering`] a la representación
//! intermedia descrita en [`ir`], con lo cual concluye el front end.
//!
//! # Back end
//! La generación de código nativo es un colaborador externo: este
//! crate solamente construye el módulo IR mediante el conjunto de
//! operaciones de [`ir`] y lo serializa como IR textual estilo LLVM.
//! La orquestación de archivos y la CLI viven en el binario.

pub mod error;
pub mod ir;
pub mod lex;
pub mod lowering;
pub mod parse;
pub mod source;
