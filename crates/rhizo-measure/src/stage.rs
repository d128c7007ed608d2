use serde::{Deserialize, Serialize};

use crate::error::MeasureError;

/// An optional pipeline stage: either skipped or applied with parameters.
///
/// In a configuration document a skipped stage is the string `"skip"` and an
/// applied one is `{"apply": {...}}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage<P> {
    /// The stage is bypassed.
    #[default]
    Skip,
    /// The stage runs with the given parameters.
    Apply(P),
}

impl<P> Stage<P> {
    /// The parameters of an applied stage.
    pub fn params(&self) -> Option<&P> {
        match self {
            Stage::Skip => None,
            Stage::Apply(p) => Some(p),
        }
    }

    /// Whether the stage is bypassed.
    pub fn is_skip(&self) -> bool {
        matches!(self, Stage::Skip)
    }
}

impl<P> From<Option<P>> for Stage<P> {
    fn from(params: Option<P>) -> Self {
        params.map_or(Stage::Skip, Stage::Apply)
    }
}

/// A recovered failure of an optional stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageWarning {
    /// Name of the stage that failed.
    pub stage: String,
    /// The error message.
    pub message: String,
}

/// Run an optional stage.
///
/// A skipped stage returns `input` untouched and silently. When the stage
/// fails, the failure is recorded in `warnings`, logged, and `input` is
/// returned unchanged so the pipeline keeps going with the previous state.
///
/// # Example
///
/// ```
/// use rhizo_measure::stage::{run_stage, Stage};
/// use rhizo_measure::MeasureError;
///
/// let mut warnings = Vec::new();
/// let double = |x: &u32, _: &()| -> Result<u32, MeasureError> { Ok(x * 2) };
///
/// assert_eq!(run_stage("double", &Stage::Apply(()), 2, double, &mut warnings), 4);
/// assert_eq!(run_stage("double", &Stage::Skip, 2, double, &mut warnings), 2);
/// assert!(warnings.is_empty());
/// ```
pub fn run_stage<T, P>(
    name: &str,
    stage: &Stage<P>,
    input: T,
    f: impl FnOnce(&T, &P) -> Result<T, MeasureError>,
    warnings: &mut Vec<StageWarning>,
) -> T {
    let Some(params) = stage.params() else {
        return input;
    };

    match f(&input, params) {
        Ok(output) => {
            log::debug!("{name}: done");
            output
        }
        Err(err) => {
            log::warn!("Skipping {name}: {err}");
            warnings.push(StageWarning {
                stage: name.to_string(),
                message: err.to_string(),
            });
            input
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Params {
        radius: f32,
    }

    #[test]
    fn test_stage_serde() -> Result<(), MeasureError> {
        let skip: Stage<Params> = serde_json::from_str("\"skip\"")?;
        assert!(skip.is_skip());

        let apply: Stage<Params> = serde_json::from_str(r#"{"apply": {"radius": 2.0}}"#)?;
        assert_eq!(apply, Stage::Apply(Params { radius: 2.0 }));
        assert_eq!(serde_json::to_string(&apply)?, r#"{"apply":{"radius":2.0}}"#);
        Ok(())
    }

    #[test]
    fn test_run_stage_recovers() {
        let mut warnings = Vec::new();
        let out = run_stage(
            "failing",
            &Stage::Apply(Params { radius: 1.0 }),
            vec![1, 2, 3],
            |_, _| Err(MeasureError::InvalidParameter("radius".into(), "bad".into())),
            &mut warnings,
        );
        assert_eq!(out, vec![1, 2, 3]);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].stage, "failing");
    }
}
