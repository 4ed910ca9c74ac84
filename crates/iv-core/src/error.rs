use std::collections::TryReserveError;

pub type Result<T> = core::result::Result<T, Error>;

/// Failure kinds shared by every crate in the workspace.
///
/// `EndOfObject` is not a failure: scans report it when they run out of
/// intervals and decoders report it for an explicit null tag. Call sites that
/// expect it must intercept it (see [`optional`]).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("required input is absent: {0}")]
    NullInput(&'static str),
    #[error("invalid domain: {0}")]
    InvalidDomain(&'static str),
    #[error("invalid values: {0}")]
    InvalidValues(&'static str),
    #[error("unsupported {what} type {code}")]
    UnsupportedType { what: &'static str, code: i32 },
    #[error("allocation of {requested} elements failed")]
    AllocationFailure { requested: usize },
    #[error("stream ended in the middle of an entity")]
    TruncatedStream,
    #[error("end of stream")]
    EndOfStream,
    #[error("end of object")]
    EndOfObject,
    #[error("invalid parameter: {0}")]
    InvalidParameter(&'static str),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn is_end_of_object(&self) -> bool {
        matches!(self, Self::EndOfObject)
    }

    pub fn unsupported(what: &'static str, code: i32) -> Self {
        Self::UnsupportedType { what, code }
    }

    pub fn allocation(requested: usize) -> impl FnOnce(TryReserveError) -> Self {
        move |_| Self::AllocationFailure { requested }
    }
}

/// Maps the end-of-object sentinel to `None`, keeping every other outcome.
pub fn optional<T>(result: Result<T>) -> Result<Option<T>> {
    match result {
        Ok(v) => Ok(Some(v)),
        Err(Error::EndOfObject) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Allocates a vector with `len` copies of `fill`, reporting failure instead of
/// aborting.
pub fn try_filled_vec<T: Clone>(len: usize, fill: T) -> Result<Vec<T>> {
    let mut v = Vec::new();
    v.try_reserve_exact(len).map_err(Error::allocation(len))?;
    v.resize(len, fill);
    Ok(v)
}
