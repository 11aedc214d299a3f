use serde::{Deserialize, Serialize};

use crate::Error;

/// Size limits the controller interpolates between.
///
/// A lower limit of `0` means no limit is ever applied for that dimension, so
/// `1` is the smallest effective limit.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ThrottleConfig {
    /// Item size limit at maximum intensity.
    #[serde(default)]
    pub item_size_lower_limit: u64,

    /// Item size limit as intensity approaches 0 from positive values. Not
    /// applied when throttling is inactive.
    #[serde(default)]
    pub item_size_upper_limit: u64,

    /// Batch size limit at maximum intensity.
    #[serde(default)]
    pub batch_size_lower_limit: u64,

    /// Batch size limit applied when throttling is inactive.
    #[serde(default)]
    pub batch_size_upper_limit: u64,
}

impl ThrottleConfig {
    /// Checks the ordering of the limits. Item limits are not checked when
    /// `check_item_limits` is false, the step strategy jumps straight to the
    /// lower limit and never looks at the upper one.
    pub fn validate(&self, check_item_limits: bool) -> Result<(), Error> {
        if self.batch_size_lower_limit > 0
            && self.batch_size_lower_limit >= self.batch_size_upper_limit
        {
            return Err(Error::InvalidBatchSizeLimits {
                lower: self.batch_size_lower_limit,
                upper: self.batch_size_upper_limit,
            });
        }

        if check_item_limits
            && self.item_size_lower_limit > 0
            && self.item_size_lower_limit >= self.item_size_upper_limit
        {
            return Err(Error::InvalidItemSizeLimits {
                lower: self.item_size_lower_limit,
                upper: self.item_size_upper_limit,
            });
        }

        Ok(())
    }

    /// Parameters published while throttling is inactive.
    pub const fn inactive_params(&self) -> ThrottleParams {
        ThrottleParams {
            max_item_size: 0,
            max_batch_size: self.batch_size_upper_limit,
            intensity: 0.0,
        }
    }
}

/// An immutable snapshot of the limits computed by one update.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct ThrottleParams {
    /// `0` means unlimited.
    pub max_item_size: u64,
    /// `0` means unlimited.
    pub max_batch_size: u64,
    pub intensity: f64,
}

impl ThrottleParams {
    #[inline]
    pub fn is_throttling(&self) -> bool {
        self.intensity > 0.0
    }
}
