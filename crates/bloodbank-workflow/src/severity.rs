//! 库存严重程度分级
//!
//! 由单位数即时推导，不做存储，避免与库存数量不一致。

use bloodbank_core::InventoryRecord;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 危急上限（含）
pub const CRITICAL_MAX_UNITS: u32 = 3;
/// 偏低上限（含）
pub const LOW_MAX_UNITS: u32 = 7;

/// 库存严重程度
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StockSeverity {
    Critical,   // 危急
    Low,        // 偏低
    Sufficient, // 充足
}

impl fmt::Display for StockSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StockSeverity::Critical => "Critical",
            StockSeverity::Low => "Low",
            StockSeverity::Sufficient => "Sufficient",
        };
        f.write_str(label)
    }
}

/// 根据可用单位数分级
pub fn classify(units: u32) -> StockSeverity {
    if units <= CRITICAL_MAX_UNITS {
        StockSeverity::Critical
    } else if units <= LOW_MAX_UNITS {
        StockSeverity::Low
    } else {
        StockSeverity::Sufficient
    }
}

/// 库存记录的当前严重程度
pub fn record_severity(record: &InventoryRecord) -> StockSeverity {
    classify(record.units)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_band_boundaries() {
        assert_eq!(classify(0), StockSeverity::Critical);
        assert_eq!(classify(3), StockSeverity::Critical);
        assert_eq!(classify(4), StockSeverity::Low);
        assert_eq!(classify(7), StockSeverity::Low);
        assert_eq!(classify(8), StockSeverity::Sufficient);
        assert_eq!(classify(u32::MAX), StockSeverity::Sufficient);
    }

    #[test]
    fn test_display_labels() {
        assert_eq!(classify(3).to_string(), "Critical");
        assert_eq!(classify(7).to_string(), "Low");
        assert_eq!(classify(8).to_string(), "Sufficient");
    }

    proptest! {
        #[test]
        fn prop_bands_partition_all_counts(units in any::<u32>()) {
            let severity = classify(units);
            prop_assert_eq!(severity == StockSeverity::Critical, units <= 3);
            prop_assert_eq!(severity == StockSeverity::Low, units > 3 && units <= 7);
            prop_assert_eq!(severity == StockSeverity::Sufficient, units > 7);
        }

        #[test]
        fn prop_severity_is_monotone(a in 0u32..1000, b in 0u32..1000) {
            if a <= b {
                prop_assert!(classify(a) <= classify(b));
            }
        }
    }
}
