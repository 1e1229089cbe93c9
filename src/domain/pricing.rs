use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::schedule::TimeSlot;

/// ピークタイム開始時刻（時）のデフォルト
pub const DEFAULT_PEAK_START_HOUR: u8 = 18;
/// ピークタイム終了時刻（時）のデフォルト（この時刻は含まない）
pub const DEFAULT_PEAK_END_HOUR: u8 = 22;

/// ピークタイム `[start_hour, end_hour)`
///
/// 開始時刻の「時」がこの範囲に入る予約はピーク料金で計算される。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeakHours {
    pub start_hour: u8,
    pub end_hour: u8,
}

impl PeakHours {
    pub fn new(start_hour: u8, end_hour: u8) -> Self {
        Self {
            start_hour,
            end_hour,
        }
    }

    /// 開始時刻の「時」がピークタイムに入るか
    pub fn is_peak(&self, slot: &TimeSlot) -> bool {
        let hour = slot.start.hour();
        self.start_hour <= hour && hour < self.end_hour
    }
}

impl Default for PeakHours {
    fn default() -> Self {
        Self::new(DEFAULT_PEAK_START_HOUR, DEFAULT_PEAK_END_HOUR)
    }
}

/// コートの料金表
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourtRates {
    pub hourly_rate: Decimal,
    pub peak_hour_rate: Decimal,
}

/// 純粋関数：予約の合計金額を計算する
///
/// ビジネスルール：
/// - 時間数 = (終了 - 開始) を時間単位の小数で表したもの
/// - ピークタイム開始の予約は peak_hour_rate、それ以外は hourly_rate
/// - 合計 = 時間数 × 単価（予約作成時に一度だけ計算し、以後変更しない）
pub fn total_amount(slot: &TimeSlot, rates: &CourtRates, peak_hours: &PeakHours) -> Decimal {
    let rate = if peak_hours.is_peak(slot) {
        rates.peak_hour_rate
    } else {
        rates.hourly_rate
    };

    // 分 × 単価 / 60
    (Decimal::from(slot.duration_minutes()) * rate) / Decimal::from(60)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(start: &str, end: &str) -> TimeSlot {
        TimeSlot::new(start.parse().unwrap(), end.parse().unwrap()).unwrap()
    }

    fn rates() -> CourtRates {
        CourtRates {
            hourly_rate: Decimal::new(1000, 0),
            peak_hour_rate: Decimal::new(1500, 0),
        }
    }

    #[test]
    fn test_peak_hour_boundaries() {
        let peak = PeakHours::default();
        assert!(!peak.is_peak(&slot("17:59", "18:30")));
        assert!(peak.is_peak(&slot("18:00", "19:00")));
        assert!(peak.is_peak(&slot("21:30", "22:30")));
        assert!(!peak.is_peak(&slot("22:00", "23:00")));
    }

    #[test]
    fn test_total_amount_peak_one_hour() {
        let total = total_amount(&slot("18:00", "19:00"), &rates(), &PeakHours::default());
        assert_eq!(total, Decimal::new(1500, 0));
    }

    #[test]
    fn test_total_amount_off_peak_fractional_hours() {
        // 1.5時間 × 1000
        let total = total_amount(&slot("10:00", "11:30"), &rates(), &PeakHours::default());
        assert_eq!(total, Decimal::new(1500, 0));
    }

    #[test]
    fn test_total_amount_rate_selected_by_start_hour_only() {
        // 17:00開始はピーク外。ピークタイムに跨っても hourly_rate のまま
        let total = total_amount(&slot("17:00", "19:00"), &rates(), &PeakHours::default());
        assert_eq!(total, Decimal::new(2000, 0));
    }

    #[test]
    fn test_total_amount_custom_peak_hours() {
        let peak = PeakHours::new(9, 12);
        let total = total_amount(&slot("09:00", "10:00"), &rates(), &peak);
        assert_eq!(total, Decimal::new(1500, 0));
    }
}
