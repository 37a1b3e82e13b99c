use thiserror::Error;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::MalformedGraph {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::MalformedGraph {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// This enum covers all possible error conditions that can occur while constructing a program
/// model, validating method graphs, and running the outlining pass. Each variant provides
/// specific context about the failure mode to enable appropriate error handling.
///
/// Ineligibility of an individual outlining candidate is never an error: candidates that fail
/// a dataflow or placement rule are silently dropped and counted in
/// [`crate::outliner::OutlinerStats`]. Errors are reserved for structural defects of the
/// program model itself.
///
/// # Error Categories
///
/// ## Program Model Errors
/// - [`Error::MalformedGraph`] - A method graph violates a structural invariant
/// - [`Error::DuplicateClass`] - Two classes registered under the same descriptor
/// - [`Error::TypeNotFound`] - Requested type descriptor not interned
/// - [`Error::MethodNotFound`] - Requested method not present in the program
///
/// # Examples
///
/// ```rust
/// use dexoutline::{Error, ir::build::ProgramBuilder};
///
/// let mut builder = ProgramBuilder::new();
/// builder.class("LFoo;").unwrap();
/// match builder.class("LFoo;") {
///     Err(Error::DuplicateClass(name)) => assert_eq!(name, "LFoo;"),
///     _ => panic!("expected duplicate class error"),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// A method graph is damaged and violates a structural invariant.
    ///
    /// This error indicates that a basic-block graph does not conform to the expected
    /// shape: a branch or catch edge targets a block that does not exist, a register
    /// index exceeds the method's register count, or a `move-result` is not immediately
    /// preceded by an invoke. The error includes the source location where the defect
    /// was detected for debugging purposes.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of what was malformed
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Malformed graph - {file}:{line}: {message}")]
    MalformedGraph {
        /// The message to be printed for the malformed graph error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// A class with the same descriptor was already registered.
    ///
    /// Class descriptors identify classes program-wide; registering two classes under
    /// one descriptor would make method references ambiguous.
    #[error("A class with descriptor '{0}' already exists")]
    DuplicateClass(String),

    /// Failed to find a type in the type table.
    ///
    /// This error occurs when looking up a type by descriptor that was never
    /// interned into the program's [`crate::ir::TypeTable`].
    #[error("Failed to find type '{0}' in the type table")]
    TypeNotFound(String),

    /// Failed to find a method in the program.
    ///
    /// This error occurs when resolving a qualified method name that does not
    /// exist in any registered class.
    #[error("Failed to find method '{0}' in the program")]
    MethodNotFound(String),

    /// Generic error for miscellaneous failures.
    ///
    /// Used for errors that don't fit into other categories or for
    /// wrapping external failures with additional context.
    #[error("{0}")]
    Error(String),
}
