use serde::{Deserialize, Serialize};

use super::{BookingId, TimeOfDay};

/// 時間枠 `[start, end)`（半開区間）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeSlot {
    pub start: TimeOfDay,
    pub end: TimeOfDay,
}

impl TimeSlot {
    /// 開始 < 終了 の時間枠のみ生成できる
    pub fn new(start: TimeOfDay, end: TimeOfDay) -> Option<Self> {
        (start < end).then_some(Self { start, end })
    }

    /// 時間枠の長さ（分）
    pub fn duration_minutes(&self) -> u16 {
        self.end.minutes_since_midnight() - self.start.minutes_since_midnight()
    }

    /// 半開区間の重なり判定: `s1 < e2 && s2 < e1`
    ///
    /// 終了時刻と開始時刻が一致する連続した枠は重ならない。
    pub fn overlaps(&self, other: &TimeSlot) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// 候補の枠と重なる既存予約を探す純粋関数
///
/// `existing` は同じコート・同じ日の、キャンセルされていない予約の枠。
/// 最初に見つかった衝突相手の予約IDを返す。
pub fn find_conflict<'a, I>(candidate: &TimeSlot, existing: I) -> Option<BookingId>
where
    I: IntoIterator<Item = (BookingId, &'a TimeSlot)>,
{
    existing
        .into_iter()
        .find(|(_, slot)| candidate.overlaps(slot))
        .map(|(id, _)| id)
}

/// 営業時間から予約済みの枠を除いた空き枠を計算する純粋関数
///
/// 予約済みの枠は順不同・重複ありでもよい。営業時間外にはみ出した部分は無視する。
/// 戻り値は開始時刻順で、隣接する空き枠は1つにまとめられている。
pub fn free_slots(opening_hours: &TimeSlot, booked: &[TimeSlot]) -> Vec<TimeSlot> {
    let mut busy: Vec<TimeSlot> = booked
        .iter()
        .filter(|slot| slot.overlaps(opening_hours))
        .copied()
        .collect();
    busy.sort_by_key(|slot| slot.start);

    let mut free = Vec::new();
    let mut cursor = opening_hours.start;

    for slot in busy {
        if slot.start > cursor {
            free.push(TimeSlot {
                start: cursor,
                end: slot.start.min(opening_hours.end),
            });
        }
        cursor = cursor.max(slot.end);
        if cursor >= opening_hours.end {
            break;
        }
    }

    if cursor < opening_hours.end {
        free.push(TimeSlot {
            start: cursor,
            end: opening_hours.end,
        });
    }

    free
}
