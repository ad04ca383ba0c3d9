use thiserror::Error;

use crate::coords::PageUnit;

pub type Result<T> = std::result::Result<T, Error>;

/// Broad failure classes, useful when a caller only needs to know whether
/// its own arguments were bad or the surface was in the wrong state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCategory {
    InvalidArgument,
    InvalidOperation,
    UnconfiguredDependency,
    Backend,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid point count: a bezier chain needs 4 + 3n points, got {0}")]
    InvalidPointCount(usize),

    #[error("at least 2 points required, got {0}")]
    TooFewPoints(usize),

    #[error("point range out of bounds: offset {offset} plus {count} points exceeds {len}")]
    PointRangeOutOfBounds {
        offset: usize,
        count: usize,
        len: usize,
    },

    #[error("unimplemented unit: {0:?}")]
    UnsupportedUnit(PageUnit),

    #[error("need pen or brush")]
    NeedPenOrBrush,

    #[error("with baseline alignment the layout rectangle height must be 0")]
    BaselineLayoutHeight,

    #[error("no matching saved state")]
    NoMatchingSavedState,

    #[error("nothing to restore")]
    NothingToRestore,

    #[error("surface closed")]
    SurfaceClosed,

    #[error("image target is already bound to an open surface")]
    FormAlreadyBound,

    #[error("image target has already been finished")]
    FormFinished,

    #[error("cannot draw a form onto the surface it is bound to")]
    FormDrawnOnItself,

    #[error("form belongs to another document")]
    ForeignForm,

    #[error("color converter not configured")]
    ConverterNotConfigured,

    #[error("{0}")]
    Unsupported(&'static str),

    #[error("backend error: {0}")]
    Backend(String),

    #[error("i/o error")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "svg")]
    #[error("png encoding failed")]
    PngEncode(#[from] png::EncodingError),
}

impl Error {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::InvalidPointCount(_)
            | Error::TooFewPoints(_)
            | Error::PointRangeOutOfBounds { .. }
            | Error::UnsupportedUnit(_)
            | Error::NeedPenOrBrush => ErrorCategory::InvalidArgument,
            Error::BaselineLayoutHeight
            | Error::NoMatchingSavedState
            | Error::NothingToRestore
            | Error::SurfaceClosed
            | Error::FormAlreadyBound
            | Error::FormFinished
            | Error::FormDrawnOnItself
            | Error::ForeignForm => ErrorCategory::InvalidOperation,
            Error::ConverterNotConfigured => ErrorCategory::UnconfiguredDependency,
            Error::Unsupported(_) | Error::Backend(_) | Error::Io(_) => ErrorCategory::Backend,
            #[cfg(feature = "svg")]
            Error::PngEncode(_) => ErrorCategory::Backend,
        }
    }
}
