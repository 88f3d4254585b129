//! Errors raised while building or parsing model values.

/// Errors that can occur when constructing model values from external input.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    #[error("Frame has {actual} landmarks, at most {max} are allowed")]
    TooManyLandmarks { actual: usize, max: usize },

    #[error("Flat landmark data has {actual} values (expected {expected})")]
    FlatLength { actual: usize, expected: usize },

    #[error("Landmark index {index} is out of range")]
    IndexOutOfRange { index: usize },

    #[error("Unknown exercise: {name}")]
    UnknownExercise { name: String },
}
