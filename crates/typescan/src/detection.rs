//! Outcome of asking a detector for a value.

/// Either a detected value or the reasons it could not be produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectionResult<T> {
    Success(T),
    Failure(Vec<String>),
}

impl<T> DetectionResult<T> {
    pub fn success(result: T) -> Self {
        DetectionResult::Success(result)
    }

    pub fn failure(reason: impl Into<String>) -> Self {
        DetectionResult::Failure(vec![reason.into()])
    }

    pub fn failures(reasons: Vec<String>) -> Self {
        DetectionResult::Failure(reasons)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, DetectionResult::Success(_))
    }

    pub fn is_failure(&self) -> bool {
        !self.is_success()
    }

    pub fn result(&self) -> Option<&T> {
        match self {
            DetectionResult::Success(result) => Some(result),
            DetectionResult::Failure(_) => None,
        }
    }

    pub fn reasons_for_failure(&self) -> &[String] {
        match self {
            DetectionResult::Success(_) => &[],
            DetectionResult::Failure(reasons) => reasons,
        }
    }

    /// `[first\nsecond]`
    pub fn reason_for_failure(&self) -> String {
        format!("[{}]", self.reasons_for_failure().join("\n"))
    }

    pub fn map<U, F>(self, mapper: F) -> DetectionResult<U>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            DetectionResult::Success(result) => DetectionResult::Success(mapper(result)),
            DetectionResult::Failure(reasons) => DetectionResult::Failure(reasons),
        }
    }

    pub fn flat_map<U, F>(self, mapper: F) -> DetectionResult<U>
    where
        F: FnOnce(T) -> DetectionResult<U>,
    {
        match self {
            DetectionResult::Success(result) => mapper(result),
            DetectionResult::Failure(reasons) => DetectionResult::Failure(reasons),
        }
    }

    /// Succeeds only if both sides do; otherwise carries the failure
    /// reasons of both sides, left first.
    pub fn combine<B, C, F>(a: DetectionResult<T>, b: DetectionResult<B>, combinator: F) -> DetectionResult<C>
    where
        F: FnOnce(T, B) -> C,
    {
        match (a, b) {
            (DetectionResult::Success(a), DetectionResult::Success(b)) => {
                DetectionResult::Success(combinator(a, b))
            }
            (a, b) => {
                let mut reasons = a.reasons_for_failure().to_vec();
                reasons.extend_from_slice(b.reasons_for_failure());
                DetectionResult::Failure(reasons)
            }
        }
    }
}

impl<T> From<Result<T, String>> for DetectionResult<T> {
    fn from(result: Result<T, String>) -> Self {
        match result {
            Ok(value) => DetectionResult::Success(value),
            Err(reason) => DetectionResult::failure(reason),
        }
    }
}
