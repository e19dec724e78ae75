// We define a separate Error type within the public crate and wrap the
// stringly errors produced by `partred_nostd_internal`. The no_std crate
// can't easily carry rich error types, and this keeps all of the error
// formatting logic in one place.
//
// Reductions themselves never fail for valid inputs. Errors come from
// invalid arguments (e.g. a bad level range) or from invalid configuration.

#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
}

/// The underlying internal error type
#[non_exhaustive]
#[derive(Clone, Debug)]
enum ErrorKind {
    /// An error that occurs when an integer lies outside of the acceptable
    /// range of values
    IntegerRange(IntegerRangeError),
    /// An error that occurs within `partred_nostd_internal`
    ///
    /// The idea is to wrap the stringly errors returned by the no_std crate
    /// (e.g. by an [`Executor`](partred_nostd_internal::Executor))
    InternalLegacyAdHoc(InternalLegacyAdHocError),
    /// An error that occurs when the requested levels aren't a valid
    /// inclusive range of the collection's levels
    LevelRange(LevelRangeError),
    /// An error that occurs when a host thread pool can't be built
    ThreadPool(ThreadPoolError),
}

// define constructor methods for Error
impl Error {
    /// produce an error indicating that an integer lies outside the acceptable
    /// range of values
    pub(crate) fn integer_range(
        description: &'static str,
        actual: i64,
        min_val: i64,
        max_val: i64,
    ) -> Self {
        Error {
            kind: ErrorKind::IntegerRange(IntegerRangeError {
                description,
                actual,
                min_val,
                max_val,
            }),
        }
    }

    /// wraps a legacy internal error string
    pub(crate) fn internal_legacy_adhoc(message: &'static str) -> Self {
        Error {
            kind: ErrorKind::InternalLegacyAdHoc(InternalLegacyAdHocError(message)),
        }
    }

    /// produce an error indicating that a level range is invalid
    pub(crate) fn level_range(level_min: usize, level_max: usize, finest_level: usize) -> Self {
        Error {
            kind: ErrorKind::LevelRange(LevelRangeError {
                level_min,
                level_max,
                finest_level,
            }),
        }
    }

    /// produce an error indicating that a thread pool couldn't be built
    pub(crate) fn thread_pool(err: rayon::ThreadPoolBuildError) -> Self {
        Error {
            kind: ErrorKind::ThreadPool(ThreadPoolError {
                // todo: consider introducing more proper error chaining
                what: err.to_string(),
            }),
        }
    }

    /// `true` when the error was caused by an invalid level range
    pub fn is_level_range(&self) -> bool {
        matches!(self.kind, ErrorKind::LevelRange(_))
    }
}

impl std::error::Error for Error {}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        self.kind.fmt(f)
    }
}

impl std::error::Error for ErrorKind {}

impl core::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match *self {
            ErrorKind::IntegerRange(ref err) => err.fmt(f),
            ErrorKind::InternalLegacyAdHoc(ref msg) => msg.fmt(f),
            ErrorKind::LevelRange(ref err) => err.fmt(f),
            ErrorKind::ThreadPool(ref err) => err.fmt(f),
        }
    }
}

/// An error that occurs when an integer lies outside of the acceptable
/// range of values
#[derive(Clone, Debug)]
struct IntegerRangeError {
    description: &'static str,
    actual: i64,
    min_val: i64,
    max_val: i64,
}

impl std::error::Error for IntegerRangeError {}

impl core::fmt::Display for IntegerRangeError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "{} has a value of {}. The value should be no less than {} and \
             not exceed {}",
            self.description, self.actual, self.min_val, self.max_val
        )
    }
}

/// A temporary type that wraps the string errors from
/// `partred_nostd_internal`.
#[derive(Clone)]
struct InternalLegacyAdHocError(&'static str);

impl std::error::Error for InternalLegacyAdHocError {}

impl core::fmt::Display for InternalLegacyAdHocError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl core::fmt::Debug for InternalLegacyAdHocError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        core::fmt::Debug::fmt(&self.0, f)
    }
}

/// An error that occurs when the requested levels don't form a valid
/// inclusive range
#[derive(Clone, Debug)]
struct LevelRangeError {
    level_min: usize,
    level_max: usize,
    finest_level: usize,
}

impl std::error::Error for LevelRangeError {}

impl core::fmt::Display for LevelRangeError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        let LevelRangeError {
            level_min,
            level_max,
            finest_level,
        } = self;
        if level_min > level_max {
            write!(
                f,
                "the minimum level, {level_min}, exceeds the maximum level, {level_max}"
            )
        } else {
            write!(
                f,
                "the maximum level, {level_max}, exceeds the finest level of \
                 the collection, {finest_level}"
            )
        }
    }
}

/// An error that occurs when a host thread pool can't be built
#[derive(Clone, Debug)]
struct ThreadPoolError {
    what: String,
}

impl std::error::Error for ThreadPoolError {}

impl core::fmt::Display for ThreadPoolError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "failed to build the host thread pool: {}", self.what)
    }
}
