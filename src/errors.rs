use std::fmt;
use thiserror::Error;

/// A position in one of the reference source files.
///
/// The tokenizer works on raw byte offsets rather than line/column pairs;
/// offsets are cheap to carry and good enough to locate a construct in the
/// proven upstream files we parse.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceLocation {
    pub offset: usize,
    pub file: Option<String>,
}

impl SourceLocation {
    pub fn new(offset: usize, file: Option<String>) -> Self {
        Self { offset, file }
    }

    pub fn at(offset: usize) -> Self {
        Self { offset, file: None }
    }

    pub fn unknown() -> Self {
        Self {
            offset: 0,
            file: None,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.file {
            Some(file) => write!(f, "{}[{}]", file, self.offset),
            None => write!(f, "[{}]", self.offset),
        }
    }
}

/// Error taxonomy of the generator.
///
/// Lexical and preprocessor errors are fatal: the inputs are assumed to be
/// well-formed, proven files. Parse errors may be recovered at a statement
/// boundary by the parser; if they surface here they are fatal too.
/// Translation errors name the offending construct so the mapping tables can
/// be extended by hand. Cache-load problems are deliberately *not* raised
/// through this type; the translator logs them and falls back to defaults.
#[derive(Error, Debug)]
pub enum GenError {
    #[error("Lexical error at {location}: {message}")]
    LexError {
        message: String,
        location: SourceLocation,
    },

    #[error("Parse error at {location}: {message}")]
    ParseError {
        message: String,
        location: SourceLocation,
    },

    #[error("Translation error: {message}")]
    TranslateError { message: String },

    #[error("Code generation error: {message}")]
    CodeGenError { message: String },

    #[error("IO error: {message}")]
    IoError {
        message: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Internal generator error: {message}")]
    InternalError { message: String },
}

impl GenError {
    pub fn lex(message: impl Into<String>, location: SourceLocation) -> Self {
        Self::LexError {
            message: message.into(),
            location,
        }
    }

    pub fn parse(message: impl Into<String>, location: SourceLocation) -> Self {
        Self::ParseError {
            message: message.into(),
            location,
        }
    }

    pub fn translate(message: impl Into<String>) -> Self {
        Self::TranslateError {
            message: message.into(),
        }
    }

    pub fn code_gen(message: impl Into<String>) -> Self {
        Self::CodeGenError {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::InternalError {
            message: message.into(),
        }
    }

    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::IoError {
            message: message.into(),
            source,
        }
    }
}

impl From<std::io::Error> for GenError {
    fn from(error: std::io::Error) -> Self {
        GenError::IoError {
            message: error.to_string(),
            source: error,
        }
    }
}

pub type Result<T> = std::result::Result<T, GenError>;

// Convenience macros for error creation
#[macro_export]
macro_rules! lex_error {
    ($loc:expr, $msg:expr) => {
        $crate::errors::GenError::lex($msg, $loc)
    };
    ($loc:expr, $fmt:expr, $($arg:tt)*) => {
        $crate::errors::GenError::lex(format!($fmt, $($arg)*), $loc)
    };
}

#[macro_export]
macro_rules! parse_error {
    ($loc:expr, $msg:expr) => {
        $crate::errors::GenError::parse($msg, $loc)
    };
    ($loc:expr, $fmt:expr, $($arg:tt)*) => {
        $crate::errors::GenError::parse(format!($fmt, $($arg)*), $loc)
    };
}

#[macro_export]
macro_rules! translate_error {
    ($msg:expr) => {
        $crate::errors::GenError::translate($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::errors::GenError::translate(format!($fmt, $($arg)*))
    };
}

#[macro_export]
macro_rules! internal_error {
    ($msg:expr) => {
        $crate::errors::GenError::internal($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::errors::GenError::internal(format!($fmt, $($arg)*))
    };
}
