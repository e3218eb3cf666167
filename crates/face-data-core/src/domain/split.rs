//! Dataset splits and the index ranges that define them.

use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{DatasetError, Result};

/// A named partition of a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Split {
    /// Training partition.
    Train,
    /// Validation partition.
    Valid,
    /// Test partition.
    Test,
    /// No partitioning, every sample.
    All,
}

impl Split {
    /// Every split, in canonical order.
    pub const VARIANTS: [Self; 4] = [Self::Train, Self::Valid, Self::Test, Self::All];

    /// Name used in configuration and on the command line.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Train => "train",
            Self::Valid => "valid",
            Self::Test => "test",
            Self::All => "all",
        }
    }

    /// Whether random augmentation is enabled by default for this split.
    #[must_use]
    pub const fn is_augmented(self) -> bool {
        matches!(self, Self::Train | Self::All)
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Split {
    type Err = DatasetError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "train" => Ok(Self::Train),
            "valid" => Ok(Self::Valid),
            "test" => Ok(Self::Test),
            "all" => Ok(Self::All),
            other => Err(DatasetError::InvalidSplit(other.to_string())),
        }
    }
}

/// Cut points of the original CelebA partition: train, valid and test are
/// the half-open ranges between consecutive entries.
pub const CELEBA_BOUNDARIES: [u64; 4] = [0, 162_770, 182_637, 202_599];

/// Index ranges assigning samples to splits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitScheme {
    dataset: &'static str,
    train: Range<u64>,
    valid: Option<Range<u64>>,
    test: Range<u64>,
}

impl SplitScheme {
    /// CelebA reference ordering, used by CelebAMask-HQ through its mapping table.
    pub const CELEBA: Self = Self {
        dataset: "CelebAMask-HQ",
        train: CELEBA_BOUNDARIES[0]..CELEBA_BOUNDARIES[1],
        valid: Some(CELEBA_BOUNDARIES[1]..CELEBA_BOUNDARIES[2]),
        test: CELEBA_BOUNDARIES[2]..CELEBA_BOUNDARIES[3],
    };

    /// FFHQ file numbering. There is no validation partition.
    pub const FFHQ: Self = Self {
        dataset: "FFHQ",
        train: 0..60_000,
        valid: None,
        test: 60_000..70_000,
    };

    /// Name of the dataset this scheme belongs to.
    #[must_use]
    pub const fn dataset(&self) -> &'static str {
        self.dataset
    }

    /// Splits offered by this scheme, `All` included.
    #[must_use]
    pub fn splits(&self) -> Vec<Split> {
        Split::VARIANTS
            .into_iter()
            .filter(|s| self.supports(*s))
            .collect()
    }

    /// Whether the split exists in this scheme.
    #[must_use]
    pub const fn supports(&self, split: Split) -> bool {
        !matches!(split, Split::Valid) || self.valid.is_some()
    }

    /// Fails with [`DatasetError::UnsupportedSplit`] if the split is not offered.
    pub fn check(&self, split: Split) -> Result<()> {
        if self.supports(split) {
            Ok(())
        } else {
            Err(DatasetError::UnsupportedSplit {
                dataset: self.dataset,
                split: split.to_string(),
            })
        }
    }

    /// Index range of a split; `None` for `All`, which is unbounded.
    pub fn range(&self, split: Split) -> Result<Option<Range<u64>>> {
        self.check(split)?;
        Ok(match split {
            Split::Train => Some(self.train.clone()),
            Split::Valid => self.valid.clone(),
            Split::Test => Some(self.test.clone()),
            Split::All => None,
        })
    }

    /// Whether a reference index belongs to the split. Unsupported splits contain nothing.
    #[must_use]
    pub fn contains(&self, split: Split, index: u64) -> bool {
        match self.range(split) {
            Ok(Some(range)) => range.contains(&index),
            Ok(None) => true,
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_split_names() {
        assert_eq!("train".parse::<Split>().ok(), Some(Split::Train));
        assert_eq!("valid".parse::<Split>().ok(), Some(Split::Valid));
        assert_eq!("test".parse::<Split>().ok(), Some(Split::Test));
        assert_eq!("all".parse::<Split>().ok(), Some(Split::All));
    }

    #[test]
    fn test_parse_invalid_split() {
        let err = "val".parse::<Split>().err();
        assert!(matches!(err, Some(DatasetError::InvalidSplit(ref s)) if s == "val"));
    }

    #[test]
    fn test_celeba_boundaries_are_half_open() {
        let scheme = SplitScheme::CELEBA;
        assert!(scheme.contains(Split::Train, 0));
        assert!(scheme.contains(Split::Train, 162_769));
        assert!(!scheme.contains(Split::Train, 162_770));
        assert!(scheme.contains(Split::Valid, 162_770));
        assert!(!scheme.contains(Split::Valid, 182_637));
        assert!(scheme.contains(Split::Test, 182_637));
        assert!(scheme.contains(Split::Test, 202_598));
        assert!(!scheme.contains(Split::Test, 202_599));
    }

    #[test]
    fn test_celeba_partition_is_disjoint() {
        let scheme = SplitScheme::CELEBA;
        for idx in [0, 1, 162_769, 162_770, 182_636, 182_637, 202_598] {
            let hits = [Split::Train, Split::Valid, Split::Test]
                .into_iter()
                .filter(|s| scheme.contains(*s, idx))
                .count();
            assert_eq!(hits, 1, "index {idx} should be in exactly one split");
            assert!(scheme.contains(Split::All, idx));
        }
    }

    #[test]
    fn test_ffhq_has_no_valid_split() {
        let scheme = SplitScheme::FFHQ;
        assert!(!scheme.supports(Split::Valid));
        assert!(scheme.check(Split::Valid).is_err());
        assert!(!scheme.contains(Split::Valid, 10));
        assert_eq!(scheme.splits(), vec![Split::Train, Split::Test, Split::All]);
    }

    #[test]
    fn test_ffhq_ranges() {
        let scheme = SplitScheme::FFHQ;
        assert!(scheme.contains(Split::Train, 59_999));
        assert!(!scheme.contains(Split::Train, 60_000));
        assert!(scheme.contains(Split::Test, 60_000));
        assert!(!scheme.contains(Split::Test, 70_000));
        assert!(scheme.contains(Split::All, 70_000));
    }

    #[test]
    fn test_split_serde_names() {
        let json = serde_json::to_string(&Split::Valid).unwrap_or_default();
        assert_eq!(json, "\"valid\"");
    }
}
