use serde::{Deserialize, Serialize};

use crate::{IngestError, IngestResult};

/// How many nodes of a dataset to keep. Count and ratio are mutually exclusive.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SamplingPolicy {
    #[default]
    None,
    /// keep exactly this many nodes
    Count(usize),
    /// keep `round(ratio * |nodes|)` nodes, with `0 < ratio <= 1`
    Ratio(f64),
}

impl SamplingPolicy {
    pub fn validate(&self) -> IngestResult<()> {
        match *self {
            SamplingPolicy::None => Ok(()),
            SamplingPolicy::Count(0) => Err(IngestError::InvalidSampling(
                "sampling count must be greater than 0".to_string(),
            )),
            SamplingPolicy::Count(_) => Ok(()),
            SamplingPolicy::Ratio(ratio) if ratio > 0.0 && ratio <= 1.0 => Ok(()),
            SamplingPolicy::Ratio(ratio) => Err(IngestError::InvalidSampling(format!(
                "sampling ratio must be in (0, 1], got {ratio}"
            ))),
        }
    }

    /// Number of nodes retained out of `total`.
    pub fn retained_count(&self, total: usize) -> IngestResult<usize> {
        self.validate()?;
        match *self {
            SamplingPolicy::None => Ok(total),
            SamplingPolicy::Count(count) if count > total => {
                Err(IngestError::InvalidSampling(format!(
                    "cannot retain {count} nodes out of {total}"
                )))
            }
            SamplingPolicy::Count(count) => Ok(count),
            SamplingPolicy::Ratio(ratio) => Ok((ratio * total as f64).round() as usize),
        }
    }

    pub fn count(&self) -> Option<usize> {
        match self {
            SamplingPolicy::Count(count) => Some(*count),
            _ => None,
        }
    }

    pub fn ratio(&self) -> Option<f64> {
        match self {
            SamplingPolicy::Ratio(ratio) => Some(*ratio),
            _ => None,
        }
    }

    pub fn from_fields(count: Option<usize>, ratio: Option<f64>) -> IngestResult<Self> {
        let policy = match (count, ratio) {
            (None, None) => SamplingPolicy::None,
            (Some(count), None) => SamplingPolicy::Count(count),
            (None, Some(ratio)) => SamplingPolicy::Ratio(ratio),
            (Some(_), Some(_)) => {
                return Err(IngestError::InvalidSampling(
                    "sampling count and ratio are mutually exclusive".to_string(),
                ))
            }
        };
        policy.validate()?;
        Ok(policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retained_count() {
        assert_eq!(SamplingPolicy::None.retained_count(10).unwrap(), 10);
        assert_eq!(SamplingPolicy::Count(4).retained_count(10).unwrap(), 4);
        assert_eq!(SamplingPolicy::Ratio(0.25).retained_count(10).unwrap(), 3);
        assert_eq!(SamplingPolicy::Ratio(1.0).retained_count(7).unwrap(), 7);
        SamplingPolicy::Count(11).retained_count(10).unwrap_err();
        SamplingPolicy::Count(0).retained_count(10).unwrap_err();
        SamplingPolicy::Ratio(0.0).retained_count(10).unwrap_err();
        SamplingPolicy::Ratio(1.5).retained_count(10).unwrap_err();
        SamplingPolicy::Ratio(f64::NAN).retained_count(10).unwrap_err();
    }

    #[test]
    fn test_from_fields() {
        assert_eq!(
            SamplingPolicy::from_fields(Some(3), None).unwrap(),
            SamplingPolicy::Count(3)
        );
        assert_eq!(
            SamplingPolicy::from_fields(None, None).unwrap(),
            SamplingPolicy::None
        );
        SamplingPolicy::from_fields(Some(3), Some(0.5)).unwrap_err();
    }

    #[test]
    fn test_serde_shape() -> Result<(), Box<dyn std::error::Error>> {
        assert_eq!(
            serde_json::from_str::<SamplingPolicy>(r#"{"ratio": 0.5}"#)?,
            SamplingPolicy::Ratio(0.5)
        );
        assert_eq!(
            serde_json::from_str::<SamplingPolicy>(r#"{"count": 12}"#)?,
            SamplingPolicy::Count(12)
        );
        assert_eq!(
            serde_json::from_str::<SamplingPolicy>(r#""none""#)?,
            SamplingPolicy::None
        );
        Ok(())
    }
}
