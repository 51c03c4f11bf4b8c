//! Composable transform pipeline
//!
//! The whole-project transformation is a chain of typed stages: parse the
//! classified inputs, assemble the document tree, run the rewrite passes,
//! merge templates. Each stage implements [`Runnable`], and [`Transform`]
//! composes them with compile-time checked input/output types. The prebuilt
//! standard pipeline lives in [`stages`] as a lazy static.

pub mod stages;

use std::fmt;

/// Error produced by a pipeline stage
///
/// Stage errors are whole-pipeline failures (a stage could not produce its
/// output at all); per-document fatal errors travel inside the stage
/// outputs instead, so one broken document never aborts its siblings.
#[derive(Debug, Clone, PartialEq)]
pub enum TransformError {
    Error(String),
    StageFailed { stage: String, message: String },
}

impl fmt::Display for TransformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransformError::Error(msg) => write!(f, "{}", msg),
            TransformError::StageFailed { stage, message } => {
                write!(f, "Stage '{}' failed: {}", stage, message)
            }
        }
    }
}

impl std::error::Error for TransformError {}

impl From<String> for TransformError {
    fn from(msg: String) -> Self {
        TransformError::Error(msg)
    }
}

/// One transformation stage from `I` to `O`
pub trait Runnable<I, O> {
    fn run(&self, input: I) -> Result<O, TransformError>;
}

/// A composed pipeline from `I` to `O`
pub struct Transform<I, O> {
    run_fn: Box<dyn Fn(I) -> Result<O, TransformError> + Send + Sync>,
}

impl<I, O> Transform<I, O> {
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(I) -> Result<O, TransformError> + Send + Sync + 'static,
    {
        Transform {
            run_fn: Box::new(f),
        }
    }

    /// Chain a stage onto this transform; the compiler checks that the
    /// stage consumes this transform's output type
    pub fn then<O2, S>(self, stage: S) -> Transform<I, O2>
    where
        S: Runnable<O, O2> + Send + Sync + 'static,
        I: 'static,
        O: 'static,
        O2: 'static,
    {
        let prev = self.run_fn;
        Transform {
            run_fn: Box::new(move |input| stage.run(prev(input)?)),
        }
    }

    pub fn run(&self, input: I) -> Result<O, TransformError> {
        (self.run_fn)(input)
    }
}

impl<I, O> Runnable<I, O> for Transform<I, O> {
    fn run(&self, input: I) -> Result<O, TransformError> {
        Transform::run(self, input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Double;
    impl Runnable<i32, i32> for Double {
        fn run(&self, input: i32) -> Result<i32, TransformError> {
            Ok(input * 2)
        }
    }

    struct ToText;
    impl Runnable<i32, String> for ToText {
        fn run(&self, input: i32) -> Result<String, TransformError> {
            Ok(input.to_string())
        }
    }

    struct Failing;
    impl Runnable<i32, i32> for Failing {
        fn run(&self, _input: i32) -> Result<i32, TransformError> {
            Err(TransformError::StageFailed {
                stage: "failing".to_string(),
                message: "intentional".to_string(),
            })
        }
    }

    #[test]
    fn test_stage_composition() {
        let pipeline = Transform::from_fn(|x: i32| Ok(x)).then(Double).then(ToText);
        assert_eq!(pipeline.run(21).unwrap(), "42");
    }

    #[test]
    fn test_error_propagation_skips_later_stages() {
        let pipeline = Transform::from_fn(|x: i32| Ok(x))
            .then(Failing)
            .then(Double);
        match pipeline.run(1) {
            Err(TransformError::StageFailed { stage, .. }) => assert_eq!(stage, "failing"),
            other => panic!("Expected stage failure, got {:?}", other),
        }
    }
}
