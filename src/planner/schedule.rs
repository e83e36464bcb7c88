//! Weekly session scheduler - which weekdays carry a session

use serde::Serialize;

/// Most sessions a single calendar week can hold
const MAX_SESSIONS_PER_WEEK: u32 = 7;

/// Monday-first slots: (label, day number with 0 = Sunday)
pub const WEEK_SLOTS: [(&str, u8); 7] = [
    ("Seg", 1),
    ("Ter", 2),
    ("Qua", 3),
    ("Qui", 4),
    ("Sex", 5),
    ("Sab", 6),
    ("Dom", 0),
];

/// Default day numbers by session count when the class has no weekdays set
fn default_days(sessions: u32) -> &'static [u8] {
    match sessions {
        0 => &[],
        1 => &[1],
        2 => &[1, 3],
        3 => &[1, 3, 5],
        4 => &[1, 2, 4, 6],
        5 => &[1, 2, 3, 5, 6],
        6 => &[1, 2, 3, 4, 5, 6],
        _ => &[1, 2, 3, 4, 5, 6, 0],
    }
}

/// One slot of the rendered week
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleDay {
    pub label: &'static str,
    pub day_number: u8,
    /// Session label, `None` for a rest day
    pub session: Option<String>,
}

impl ScheduleDay {
    pub fn is_rest(&self) -> bool {
        self.session.is_none()
    }

    pub fn display(&self) -> &str {
        self.session.as_deref().unwrap_or("rest")
    }
}

/// Session days: the class's own weekdays in Monday-first order, capped by
/// the session count, else the default table for that count
pub fn resolve_session_days(sessions_per_week: u32, class_weekdays: &[u8]) -> Vec<u8> {
    let sessions = sessions_per_week.min(MAX_SESSIONS_PER_WEEK);
    let configured: Vec<u8> = WEEK_SLOTS
        .iter()
        .map(|(_, day)| *day)
        .filter(|day| class_weekdays.contains(day))
        .collect();

    if configured.is_empty() {
        default_days(sessions).to_vec()
    } else {
        configured.into_iter().take(sessions as usize).collect()
    }
}

/// First comma-separated segment of the focus, or the fallback title
pub fn primary_focus<'a>(week_focus: &'a str, fallback_title: &'a str) -> &'a str {
    let first = week_focus.split(',').next().unwrap_or("").trim();
    if first.is_empty() { fallback_title.trim() } else { first }
}

/// Lay out a week Monday to Sunday
pub fn week_schedule(
    week_focus: &str,
    fallback_title: &str,
    sessions_per_week: u32,
    class_weekdays: &[u8],
) -> [ScheduleDay; 7] {
    let days = resolve_session_days(sessions_per_week, class_weekdays);
    let label = primary_focus(week_focus, fallback_title);

    WEEK_SLOTS.map(|(slot_label, day_number)| ScheduleDay {
        label: slot_label,
        day_number,
        session: days.contains(&day_number).then(|| label.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_days(schedule: &[ScheduleDay; 7]) -> Vec<u8> {
        schedule
            .iter()
            .filter(|d| !d.is_rest())
            .map(|d| d.day_number)
            .collect()
    }

    #[test]
    fn test_explicit_weekdays() {
        let schedule = week_schedule("Manchete, toque", "Fundamentos", 3, &[1, 3, 5]);
        assert_eq!(session_days(&schedule), vec![1, 3, 5]);
        for day in schedule.iter().filter(|d| !d.is_rest()) {
            assert_eq!(day.display(), "Manchete");
        }
        assert_eq!(schedule.iter().filter(|d| d.is_rest()).count(), 4);
        assert_eq!(schedule[1].display(), "rest");
    }

    #[test]
    fn test_explicit_weekdays_capped_in_monday_first_order() {
        // Sunday is last in a Monday-first week
        let schedule = week_schedule("Saque", "", 2, &[0, 6, 2]);
        assert_eq!(session_days(&schedule), vec![2, 6]);
    }

    #[test]
    fn test_fewer_weekdays_than_sessions() {
        let schedule = week_schedule("Saque", "", 5, &[2, 4]);
        assert_eq!(session_days(&schedule), vec![2, 4]);
    }

    #[test]
    fn test_default_tables() {
        let cases: [(u32, &[u8]); 6] = [
            (2, &[1, 3]),
            (3, &[1, 3, 5]),
            (4, &[1, 2, 4, 6]),
            (5, &[1, 2, 3, 5, 6]),
            (6, &[1, 2, 3, 4, 5, 6]),
            (7, &[1, 2, 3, 4, 5, 6, 0]),
        ];
        for (sessions, expected) in cases {
            let schedule = week_schedule("Jogo", "", sessions, &[]);
            assert_eq!(session_days(&schedule), expected.to_vec(), "{} sessions", sessions);
        }
    }

    #[test]
    fn test_sessions_capped_at_seven() {
        let schedule = week_schedule("Jogo", "", 14, &[]);
        assert!(schedule.iter().all(|d| !d.is_rest()));
    }

    #[test]
    fn test_focus_falls_back_to_title() {
        assert_eq!(primary_focus("", "Regenerativa"), "Regenerativa");
        assert_eq!(primary_focus("  , extra", "Regenerativa"), "Regenerativa");
        assert_eq!(primary_focus(" Bloqueio , ataque", "X"), "Bloqueio");
    }

    #[test]
    fn test_slot_order_and_labels() {
        let schedule = week_schedule("Jogo", "", 0, &[]);
        let labels: Vec<_> = schedule.iter().map(|d| d.label).collect();
        assert_eq!(labels, vec!["Seg", "Ter", "Qua", "Qui", "Sex", "Sab", "Dom"]);
        assert_eq!(schedule[6].day_number, 0);
        assert!(schedule.iter().all(|d| d.is_rest()));
    }
}
