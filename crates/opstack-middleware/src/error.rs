//! Stack assembly errors.

/// Errors raised while assembling a step.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StackError {
    /// The anchor middleware named in a relative insertion is not in the step.
    #[error("middleware '{id}' not found in step '{step}'")]
    MiddlewareNotFound {
        /// The step searched.
        step: String,
        /// The missing middleware id.
        id: String,
    },
}
