///
/// Error taxonomy and result-code translation.
///
/// Every SQLite result code, primary and extended, gets a typed
/// identity in `ErrorCode`. Codes the pinned engine (SQLite 3.46 via
/// libsqlite3-sys 0.30.1) does not define translate to
/// `ErrorCode::Unknown` rather than panicking. Marshalling failures
/// that do not originate in the engine get their own `Error` variants.
///

use std::ffi::c_int;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Generates the result-code enumeration together with its total,
/// lossless translation functions. The integer values are the engine's
/// documented codes; matching on literals keeps the table independent
/// of which constants the ffi crate happens to export.
macro_rules! result_codes {
    ($($name:ident = $code:literal),+ $(,)?) => {
        /// One SQLite result code, primary or extended.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum ErrorCode {
            $($name,)+
            /// A code the pinned engine version does not define.
            Unknown,
        }

        impl ErrorCode {
            /// Translates an engine status code. Total: unrecognized
            /// codes become `Unknown`.
            pub fn from_code(code: c_int) -> ErrorCode {
                match code {
                    $($code => ErrorCode::$name,)+
                    _ => ErrorCode::Unknown,
                }
            }

            /// The engine code for this kind. `Unknown` has no code of
            /// its own and maps to the generic error code.
            pub fn code(self) -> c_int {
                match self {
                    $(ErrorCode::$name => $code,)+
                    ErrorCode::Unknown => 1,
                }
            }
        }
    };
}

result_codes! {
    // Primary codes.
    Ok = 0,
    Error = 1,
    Internal = 2,
    Perm = 3,
    Abort = 4,
    Busy = 5,
    Locked = 6,
    NoMem = 7,
    ReadOnly = 8,
    Interrupt = 9,
    IoErr = 10,
    Corrupt = 11,
    NotFound = 12,
    Full = 13,
    CantOpen = 14,
    Protocol = 15,
    Empty = 16,
    Schema = 17,
    TooBig = 18,
    Constraint = 19,
    Mismatch = 20,
    Misuse = 21,
    NoLfs = 22,
    Auth = 23,
    Format = 24,
    Range = 25,
    NotADb = 26,
    Notice = 27,
    Warning = 28,
    Row = 100,
    Done = 101,

    // Extended codes: primary | (n << 8).
    OkLoadPermanently = 256,
    OkSymlink = 512,
    ErrorMissingCollSeq = 257,
    ErrorRetry = 513,
    ErrorSnapshot = 769,
    AbortRollback = 516,
    BusyRecovery = 261,
    BusySnapshot = 517,
    BusyTimeout = 773,
    LockedSharedCache = 262,
    LockedVtab = 518,
    ReadOnlyRecovery = 264,
    ReadOnlyCantLock = 520,
    ReadOnlyRollback = 776,
    ReadOnlyDbMoved = 1032,
    ReadOnlyCantInit = 1288,
    ReadOnlyDirectory = 1544,
    IoErrRead = 266,
    IoErrShortRead = 522,
    IoErrWrite = 778,
    IoErrFsync = 1034,
    IoErrDirFsync = 1290,
    IoErrTruncate = 1546,
    IoErrFstat = 1802,
    IoErrUnlock = 2058,
    IoErrRdLock = 2314,
    IoErrDelete = 2570,
    IoErrBlocked = 2826,
    IoErrNoMem = 3082,
    IoErrAccess = 3338,
    IoErrCheckReservedLock = 3594,
    IoErrLock = 3850,
    IoErrClose = 4106,
    IoErrDirClose = 4362,
    IoErrShmOpen = 4618,
    IoErrShmSize = 4874,
    IoErrShmLock = 5130,
    IoErrShmMap = 5386,
    IoErrSeek = 5642,
    IoErrDeleteNoEnt = 5898,
    IoErrMmap = 6154,
    IoErrGetTempPath = 6410,
    IoErrConvPath = 6666,
    IoErrVnode = 6922,
    IoErrAuth = 7178,
    IoErrBeginAtomic = 7434,
    IoErrCommitAtomic = 7690,
    IoErrRollbackAtomic = 7946,
    IoErrData = 8202,
    IoErrCorruptFs = 8458,
    IoErrInPage = 8714,
    CorruptVtab = 267,
    CorruptSequence = 523,
    CorruptIndex = 779,
    CantOpenNoTempDir = 270,
    CantOpenIsDir = 526,
    CantOpenFullPath = 782,
    CantOpenConvPath = 1038,
    CantOpenDirtyWal = 1294,
    CantOpenSymlink = 1550,
    ConstraintCheck = 275,
    ConstraintCommitHook = 531,
    ConstraintForeignKey = 787,
    ConstraintFunction = 1043,
    ConstraintNotNull = 1299,
    ConstraintPrimaryKey = 1555,
    ConstraintTrigger = 1811,
    ConstraintUnique = 2067,
    ConstraintVtab = 2323,
    ConstraintRowId = 2579,
    ConstraintPinned = 2835,
    ConstraintDataType = 3091,
    NoticeRecoverWal = 283,
    NoticeRecoverRollback = 539,
    NoticeRbu = 795,
    WarningAutoIndex = 284,
    AuthUser = 279,
}

impl ErrorCode {
    /// The primary family of an extended code (low byte of the code).
    /// Primary codes map to themselves.
    pub fn primary(self) -> ErrorCode {
        ErrorCode::from_code(self.code() & 0xff)
    }
}

#[derive(Debug, Error)]
pub enum Error {
    /// Any engine failure, with the message captured from the
    /// connection at the point of failure.
    #[error("sqlite error {code:?}: {message}")]
    Sqlite { code: ErrorCode, message: String },

    /// A terminal `get` found no row.
    #[error("query returned no rows")]
    NoResult,

    /// A record target field has neither a matching column nor a
    /// declared default.
    #[error("no column matches field '{field}' of {target}")]
    UndefinedField {
        field: &'static str,
        target: &'static str,
    },

    /// A numeric value does not fit the engine's 64-bit width and the
    /// text fallback path was not taken.
    #[error("number does not fit in 64 bits")]
    NumberTooLarge,

    /// A fixed-capacity byte target cannot hold the column's bytes.
    #[error("column holds {len} bytes but the target holds at most {capacity}")]
    ValueTooLarge { capacity: usize, len: usize },

    /// A column integer matches no member of the target enumeration.
    #[error("value {value} matches no member of {target}")]
    InvalidValue {
        value: i64,
        target: &'static str,
    },

    /// The decimal-text fallback parse failed.
    #[error("column text '{text}' is not a number")]
    NotANumber { text: String },

    /// A TEXT column read into a string target was not valid UTF-8.
    #[error("column text is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),
}

impl Error {
    /// The translated engine code, if this error came from the engine.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Error::Sqlite { code, .. } => Some(*code),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_codes_round_trip() {
        for code in (0..=28).chain([100, 101]) {
            let kind = ErrorCode::from_code(code);
            assert_ne!(kind, ErrorCode::Unknown, "code {code} not enumerated");
            assert_eq!(kind.code(), code);
        }
    }

    #[test]
    fn test_extended_codes_round_trip() {
        for code in [
            256, 512, 257, 513, 769, 516, 261, 517, 773, 262, 518, 264, 520, 776, 1032, 1288,
            1544, 266, 522, 778, 1034, 1290, 1546, 1802, 2058, 2314, 2570, 2826, 3082, 3338,
            3594, 3850, 4106, 4362, 4618, 4874, 5130, 5386, 5642, 5898, 6154, 6410, 6666, 6922,
            7178, 7434, 7690, 7946, 8202, 8458, 8714, 267, 523, 779, 270, 526, 782, 1038, 1294,
            1550, 275, 531, 787, 1043, 1299, 1555, 1811, 2067, 2323, 2579, 2835, 3091, 283, 539,
            795, 284, 279,
        ] {
            let kind = ErrorCode::from_code(code);
            assert_ne!(kind, ErrorCode::Unknown, "code {code} not enumerated");
            assert_eq!(kind.code(), code);
        }
    }

    #[test]
    fn test_unknown_code_is_total() {
        assert_eq!(ErrorCode::from_code(9999), ErrorCode::Unknown);
        assert_eq!(ErrorCode::from_code(-1), ErrorCode::Unknown);
        // No code of its own: falls back to the generic error code.
        assert_eq!(ErrorCode::Unknown.code(), 1);
    }

    #[test]
    fn test_extended_primary_family() {
        assert_eq!(ErrorCode::IoErrShortRead.primary(), ErrorCode::IoErr);
        assert_eq!(ErrorCode::ConstraintUnique.primary(), ErrorCode::Constraint);
        assert_eq!(ErrorCode::BusyTimeout.primary(), ErrorCode::Busy);
        assert_eq!(ErrorCode::Busy.primary(), ErrorCode::Busy);
    }

    #[test]
    fn test_error_display() {
        let err = Error::Sqlite {
            code: ErrorCode::ConstraintUnique,
            message: "UNIQUE constraint failed: t.id".to_string(),
        };
        assert!(err.to_string().contains("ConstraintUnique"));
        assert!(err.to_string().contains("UNIQUE constraint failed"));

        let err = Error::UndefinedField {
            field: "name",
            target: "User",
        };
        assert!(err.to_string().contains("'name'"));
        assert!(err.to_string().contains("User"));
    }
}
