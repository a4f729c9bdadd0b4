/// Convenience result type used across camrig.
pub type CamRigResult<T> = Result<T, CamRigError>;

/// Error taxonomy used by the camera pipeline.
///
/// None of these are fatal to a running system: the frame update logs them and
/// degrades to skipping the offending request or holding the last valid result.
#[derive(thiserror::Error, Debug)]
pub enum CamRigError {
    /// Missing or invalid authored data (director class, asset, pivot, slot).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A lifecycle call made in the wrong state (double initialize, re-parenting, ...).
    #[error("protocol violation: {0}")]
    Protocol(String),

    /// Conflicting attributes among requests collapsed into one combined rig.
    #[error("combination conflict: {0}")]
    Combination(String),

    /// Errors while evaluating a rig or solving.
    #[error("evaluation error: {0}")]
    Evaluation(String),

    /// Errors while writing or reading a state snapshot.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CamRigError {
    /// Build a [`CamRigError::Configuration`] value.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Build a [`CamRigError::Protocol`] value.
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    /// Build a [`CamRigError::Combination`] value.
    pub fn combination(msg: impl Into<String>) -> Self {
        Self::Combination(msg.into())
    }

    /// Build a [`CamRigError::Evaluation`] value.
    pub fn evaluation(msg: impl Into<String>) -> Self {
        Self::Evaluation(msg.into())
    }

    /// Build a [`CamRigError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

impl From<bincode::Error> for CamRigError {
    fn from(err: bincode::Error) -> Self {
        Self::Serde(err.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
