//! Membership history reconstruction.

use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;
use cva_core::Table;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::change::{ChangeKind, ConstituentChange};

/// One row of the history: a constituent effective on a date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Effective date
    pub date: NaiveDate,
    /// Constituent instrument code
    pub ric: String,
}

/// Full membership list at the start date and after every change date.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstituentHistory {
    snapshots: Vec<(NaiveDate, Vec<String>)>,
}

impl ConstituentHistory {
    /// All rows in date order.
    pub fn rows(&self) -> Vec<Snapshot> {
        self.snapshots
            .iter()
            .flat_map(|(date, members)| {
                members.iter().map(|ric| Snapshot {
                    date: *date,
                    ric: ric.clone(),
                })
            })
            .collect()
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.snapshots.iter().map(|(_, members)| members.len()).sum()
    }

    /// Returns true if the history has no rows.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot dates in ascending order, including dates that left the
    /// index empty.
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.snapshots.iter().map(|(date, _)| *date).collect()
    }

    /// Membership effective on `date`: the latest snapshot at or before it.
    ///
    /// Returns an empty list for dates before the start.
    pub fn members_on(&self, date: NaiveDate) -> Vec<&str> {
        self.snapshots
            .iter()
            .rev()
            .find(|(d, _)| *d <= date)
            .map(|(_, members)| members.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Renders the history as a `Date`/`RIC` table.
    pub fn to_table(&self) -> Table {
        Table::new(
            vec!["Date".to_string(), "RIC".to_string()],
            self.rows()
                .into_iter()
                .map(|r| {
                    vec![
                        Value::String(r.date.format("%Y-%m-%d").to_string()),
                        Value::String(r.ric),
                    ]
                })
                .collect(),
        )
    }
}

/// Rebuilds index membership from an initial list and change events.
///
/// The initial list is emitted at `start`. For each distinct change date in
/// ascending order, joiners that do not also leave that day are appended,
/// leavers that do not also join that day are removed, and the resulting
/// list is emitted. A joiner already present or a leaver already absent is
/// logged and otherwise ignored. Within one date, events keep their input
/// order.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use index_constituents::{reconstruct, ConstituentChange};
///
/// let start = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
/// let change_date = NaiveDate::from_ymd_opt(2024, 3, 18).unwrap();
/// let history = reconstruct(
///     start,
///     vec!["A.N".to_string(), "B.N".to_string()],
///     &[
///         ConstituentChange::joiner(change_date, "C.N"),
///         ConstituentChange::leaver(change_date, "A.N"),
///     ],
/// );
///
/// assert_eq!(history.members_on(start), vec!["A.N", "B.N"]);
/// assert_eq!(history.members_on(change_date), vec!["B.N", "C.N"]);
/// ```
pub fn reconstruct(
    start: NaiveDate,
    initial: Vec<String>,
    changes: &[ConstituentChange],
) -> ConstituentHistory {
    let mut snapshots = vec![(start, initial.clone())];
    let mut members = initial;

    let mut by_date: BTreeMap<NaiveDate, Vec<&ConstituentChange>> = BTreeMap::new();
    for change in changes {
        by_date.entry(change.date).or_default().push(change);
    }

    for (date, day) in by_date {
        let joiners = rics(&day, ChangeKind::Joiner);
        let leavers = rics(&day, ChangeKind::Leaver);
        let joining: HashSet<&str> = joiners.iter().copied().collect();
        let leaving: HashSet<&str> = leavers.iter().copied().collect();

        for ric in joiners.iter().copied().filter(|r| !leaving.contains(r)) {
            if members.iter().any(|m| m == ric) {
                debug!(%date, ric, "Joiner is already a constituent");
            } else {
                members.push(ric.to_string());
            }
        }

        for ric in leavers.iter().copied().filter(|r| !joining.contains(r)) {
            match members.iter().position(|m| m == ric) {
                Some(idx) => {
                    members.remove(idx);
                }
                None => debug!(%date, ric, "Leaver is not a constituent"),
            }
        }

        snapshots.push((date, members.clone()));
    }

    ConstituentHistory { snapshots }
}

fn rics<'a>(day: &[&'a ConstituentChange], kind: ChangeKind) -> Vec<&'a str> {
    let mut seen = HashSet::new();
    day.iter()
        .filter(|c| c.kind == kind)
        .map(|c| c.ric.as_str())
        .filter(|ric| seen.insert(*ric))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, day).unwrap()
    }

    fn list(rics: &[&str]) -> Vec<String> {
        rics.iter().map(|r| r.to_string()).collect()
    }

    #[test]
    fn test_no_changes_emits_initial_only() {
        let history = reconstruct(d(1, 2), list(&["A", "B"]), &[]);
        assert_eq!(history.len(), 2);
        assert_eq!(history.rows()[1].ric, "B");
        assert_eq!(history.dates(), vec![d(1, 2)]);
    }

    #[test]
    fn test_changes_applied_in_date_order() {
        let changes = vec![
            ConstituentChange::leaver(d(6, 1), "C"),
            ConstituentChange::joiner(d(3, 1), "C"),
        ];
        let history = reconstruct(d(1, 2), list(&["A"]), &changes);

        assert_eq!(history.dates(), vec![d(1, 2), d(3, 1), d(6, 1)]);
        assert_eq!(history.members_on(d(3, 1)), vec!["A", "C"]);
        assert_eq!(history.members_on(d(6, 1)), vec!["A"]);
    }

    #[test]
    fn test_same_day_join_and_leave_cancel() {
        let changes = vec![
            ConstituentChange::joiner(d(3, 1), "X"),
            ConstituentChange::leaver(d(3, 1), "X"),
        ];
        let history = reconstruct(d(1, 2), list(&["A"]), &changes);
        assert_eq!(history.members_on(d(3, 1)), vec!["A"]);

        let history = reconstruct(d(1, 2), list(&["X"]), &changes);
        assert_eq!(history.members_on(d(3, 1)), vec!["X"]);
    }

    #[test]
    fn test_redundant_events_ignored() {
        let changes = vec![
            ConstituentChange::joiner(d(3, 1), "A"),
            ConstituentChange::leaver(d(3, 1), "Z"),
        ];
        let history = reconstruct(d(1, 2), list(&["A", "B"]), &changes);
        assert_eq!(history.members_on(d(3, 1)), vec!["A", "B"]);
    }

    #[test]
    fn test_members_on_between_and_before() {
        let changes = vec![ConstituentChange::joiner(d(3, 1), "C")];
        let history = reconstruct(d(1, 2), list(&["A"]), &changes);

        assert_eq!(history.members_on(d(2, 15)), vec!["A"]);
        assert_eq!(history.members_on(d(12, 31)), vec!["A", "C"]);
        assert!(history.members_on(d(1, 1)).is_empty());
    }

    #[test]
    fn test_to_table() {
        let history = reconstruct(d(1, 2), list(&["A"]), &[]);
        let table = history.to_table();
        assert_eq!(table.headers(), ["Date", "RIC"]);
        assert_eq!(table.rows()[0], vec![Value::from("2024-01-02"), Value::from("A")]);
    }

    #[test]
    fn test_empty_day_after_all_leave() {
        let changes = vec![ConstituentChange::leaver(d(3, 1), "A")];
        let history = reconstruct(d(1, 2), list(&["A"]), &changes);
        assert_eq!(history.dates(), vec![d(1, 2), d(3, 1)]);
        assert_eq!(history.len(), 1);
        assert!(history.members_on(d(3, 1)).is_empty());
    }

    proptest! {
        #[test]
        fn prop_no_duplicates_and_sorted_dates(
            initial in prop::collection::hash_set("[A-E]", 0..5),
            events in prop::collection::vec((1u32..28, "[A-H]", any::<bool>()), 0..20),
        ) {
            let changes: Vec<ConstituentChange> = events
                .into_iter()
                .map(|(day, ric, join)| {
                    let date = d(2, day);
                    if join {
                        ConstituentChange::joiner(date, ric)
                    } else {
                        ConstituentChange::leaver(date, ric)
                    }
                })
                .collect();
            let history = reconstruct(d(1, 2), initial.into_iter().collect(), &changes);

            let dates: Vec<NaiveDate> = history.rows().iter().map(|r| r.date).collect();
            prop_assert!(dates.windows(2).all(|w| w[0] <= w[1]));

            for date in history.dates() {
                let members = history.members_on(date);
                let unique: HashSet<&str> = members.iter().copied().collect();
                prop_assert_eq!(unique.len(), members.len());
            }
        }
    }
}
