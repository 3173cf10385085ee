//! Grouping participations into tours and counting sector participants

use std::collections::{BTreeMap, BTreeSet, HashSet};
use uuid::Uuid;

use super::model::{Participation, ParticipationStatus, SectorSelection, TourKey};

/// Partition non-cancelled participations by (city, raw start date).
///
/// Cancelled participations are dropped even if the caller passed them in.
/// The map is ordered so batch output is stable.
pub fn group_by_tour(participations: &[Participation]) -> BTreeMap<TourKey, Vec<&Participation>> {
    let mut tours: BTreeMap<TourKey, Vec<&Participation>> = BTreeMap::new();

    for participation in participations
        .iter()
        .filter(|p| p.status != ParticipationStatus::Cancelled)
    {
        tours
            .entry(participation.tour_key())
            .or_default()
            .push(participation);
    }

    tours
}

/// Number of distinct participations per sector code.
///
/// Only selections whose participation id is in `members` count; a
/// participation that selected the same code twice counts once.
pub fn sector_counts<'a, I>(members: &HashSet<Uuid>, selections: I) -> BTreeMap<String, usize>
where
    I: IntoIterator<Item = &'a SectorSelection>,
{
    let mut participants: BTreeMap<&str, BTreeSet<Uuid>> = BTreeMap::new();

    for selection in selections {
        if !members.contains(&selection.participation_id) {
            continue;
        }
        participants
            .entry(selection.code.as_str())
            .or_default()
            .insert(selection.participation_id);
    }

    participants
        .into_iter()
        .map(|(code, ids)| (code.to_string(), ids.len()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::test_support::{participation, selection};

    #[test]
    fn test_groups_by_city_and_raw_date() {
        let a = participation("Lyon", "15 janvier 2024");
        let b = participation("Lyon", "15 janvier 2024");
        let c = participation("Lyon", "16 janvier 2024");
        let d = participation("Paris", "15 janvier 2024");
        let all = vec![a, b, c, d];

        let tours = group_by_tour(&all);
        assert_eq!(tours.len(), 3);

        let key = TourKey {
            city: "Lyon".to_string(),
            start_date: "15 janvier 2024".to_string(),
        };
        assert_eq!(tours[&key].len(), 2);
    }

    #[test]
    fn test_same_day_different_spelling_is_different_tour() {
        let a = participation("Lyon", "15 janvier 2024");
        let b = participation("Lyon", "15 Janvier 2024");
        let all = vec![a, b];

        assert_eq!(group_by_tour(&all).len(), 2);
    }

    #[test]
    fn test_cancelled_participations_are_excluded() {
        let a = participation("Lyon", "15 janvier 2024");
        let mut b = participation("Lyon", "15 janvier 2024");
        b.status = ParticipationStatus::Cancelled;
        let mut c = participation("Nice", "1 mai 2024");
        c.status = ParticipationStatus::Cancelled;
        let all = vec![a, b, c];

        let tours = group_by_tour(&all);
        assert_eq!(tours.len(), 1);
        assert_eq!(tours.values().next().unwrap().len(), 1);
    }

    #[test]
    fn test_duplicate_selection_counts_once() {
        let p = participation("Lyon", "15 janvier 2024");
        let members: HashSet<Uuid> = [p.id].into_iter().collect();
        let selections = vec![selection(p.id, "7501"), selection(p.id, "7501")];

        let counts = sector_counts(&members, &selections);
        assert_eq!(counts["7501"], 1);
    }

    #[test]
    fn test_counts_distinct_participations_per_code() {
        let p1 = participation("Lyon", "15 janvier 2024");
        let p2 = participation("Lyon", "15 janvier 2024");
        let members: HashSet<Uuid> = [p1.id, p2.id].into_iter().collect();
        let selections = vec![
            selection(p1.id, "7501"),
            selection(p2.id, "7501"),
            selection(p2.id, "7502"),
        ];

        let counts = sector_counts(&members, &selections);
        assert_eq!(counts.len(), 2);
        assert_eq!(counts["7501"], 2);
        assert_eq!(counts["7502"], 1);
    }

    #[test]
    fn test_orphan_selections_are_ignored() {
        let p = participation("Lyon", "15 janvier 2024");
        let members: HashSet<Uuid> = [p.id].into_iter().collect();
        let selections = vec![selection(p.id, "7501"), selection(Uuid::new_v4(), "7501")];

        let counts = sector_counts(&members, &selections);
        assert_eq!(counts["7501"], 1);
    }
}
