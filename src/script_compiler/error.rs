// Compiler Error Handling

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum CompilerError {
    // Symbol resolution errors
    VariableNotFound(String),

    // Event lowering errors
    UnknownCommand(String),
    InvalidArgument(String, String), // command, argument

    // Code generation errors
    CodeGenError(String),
    AddressOverflow,

    // IO errors
    IoError(String),
}

impl fmt::Display for CompilerError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CompilerError::VariableNotFound(name) => {
                write!(f, "Variable '{}' was not found in the variable table", name)
            }
            CompilerError::UnknownCommand(command) => {
                write!(f, "Unknown script command '{}'", command)
            }
            CompilerError::InvalidArgument(command, arg) => {
                write!(
                    f,
                    "Command '{}' has a missing or malformed argument '{}'",
                    command, arg
                )
            }
            CompilerError::CodeGenError(msg) => {
                write!(f, "Code generation error: {}", msg)
            }
            CompilerError::AddressOverflow => {
                write!(f, "Address space overflow - compiled script too large")
            }
            CompilerError::IoError(msg) => {
                write!(f, "IO error: {}", msg)
            }
        }
    }
}

impl std::error::Error for CompilerError {}
