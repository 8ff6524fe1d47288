use thiserror::Error;

use crate::ir::TempId;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Reconstruction passes themselves do not use errors for control flow: an idiom that fails to
/// match is the normal outcome and simply leaves the instruction list unchanged. The variants
/// here cover the metadata surface (constant-pool and member lookups performed while confirming
/// a match or synthesizing a replacement node) and defects that indicate an upstream invariant
/// violation.
///
/// # Error Categories
///
/// ## Constant Pool Errors
/// - [`Error::InvalidPoolIndex`] - Index outside the pool, or the reserved index 0
/// - [`Error::UnexpectedPoolEntry`] - Entry at the index has a different kind than required
///
/// ## Model Errors
/// - [`Error::Malformed`] - Malformed descriptor or model structure
/// - [`Error::FieldNotFound`] / [`Error::MethodNotFound`] - Member lookup failures
///
/// ## Defect Signals
/// - [`Error::DanglingTemporary`] - A `DupLoad` references a `DupStore` that was removed
///   without substituting all of its consumers first
#[derive(Error, Debug)]
pub enum Error {
    /// A constant-pool index does not resolve to an entry.
    ///
    /// Index 0 is reserved by the class-file format and never resolves; indices at or past
    /// the end of the pool are equally invalid.
    #[error("Invalid constant pool index #{index}")]
    InvalidPoolIndex {
        /// The offending pool index
        index: u16,
    },

    /// A constant-pool entry has a different kind than the lookup required.
    ///
    /// For example, a `FieldRef` lookup performed on an index that holds a `Utf8` entry.
    #[error("Constant pool entry #{index} is not a {expected}")]
    UnexpectedPoolEntry {
        /// The offending pool index
        index: u16,
        /// The entry kind the lookup required
        expected: &'static str,
    },

    /// The model or a descriptor is damaged and could not be interpreted.
    ///
    /// The error includes the source location where the malformation was detected for
    /// debugging purposes.
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// A field lookup by name did not resolve within the class model.
    #[error("Field '{name}' not found")]
    FieldNotFound {
        /// Name of the field that was looked up
        name: String,
    },

    /// A method lookup by name did not resolve within the class model.
    #[error("Method '{name}' not found")]
    MethodNotFound {
        /// Name of the method that was looked up
        name: String,
    },

    /// A `DupLoad` references a `DupStore` that is no longer present in the list.
    ///
    /// Passes must substitute every consumer before removing a `DupStore`; observing this
    /// error means an upstream pass violated that discipline.
    #[error("Dangling DupLoad for temporary t{temp} at offset {offset}")]
    DanglingTemporary {
        /// Handle of the temporary whose producer went missing
        temp: TempId,
        /// Byte offset of the dangling `DupLoad`
        offset: u32,
    },
}
