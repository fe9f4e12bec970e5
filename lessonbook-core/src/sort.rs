//! Local ordering of fetched lessons.
//!
//! Sorting is pure: it never fails and never touches the store. An unrecognised
//! `(sort_by, direction)` pair leaves the input order as it is.

use std::{cmp::Ordering, str::FromStr};

use crate::catalog::Lesson;

/// Sortable lesson field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Subject,
    Price,
    Location,
    /// Remaining space.
    Availability,
}

impl FromStr for SortKey {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "subject" => Ok(SortKey::Subject),
            "price" => Ok(SortKey::Price),
            "location" => Ok(SortKey::Location),
            "availability" => Ok(SortKey::Availability),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl FromStr for SortDirection {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ascending" => Ok(SortDirection::Ascending),
            "descending" => Ok(SortDirection::Descending),
            _ => Err(()),
        }
    }
}

fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

impl SortKey {
    fn compare(self, a: &Lesson, b: &Lesson) -> Ordering {
        match self {
            SortKey::Subject => compare_text(&a.subject, &b.subject),
            SortKey::Location => compare_text(&a.location, &b.location),
            SortKey::Price => a.price.partial_cmp(&b.price).unwrap_or(Ordering::Equal),
            SortKey::Availability => a.space.cmp(&b.space),
        }
    }
}

/// Returns `lessons` ordered by `key` in `direction`. The sort is stable.
pub fn sort_by_key(lessons: &[Lesson], key: SortKey, direction: SortDirection) -> Vec<Lesson> {
    let mut sorted = lessons.to_vec();

    sorted.sort_by(|a, b| match direction {
        SortDirection::Ascending => key.compare(a, b),
        SortDirection::Descending => key.compare(b, a),
    });

    sorted
}

/// Sorts by the view-state strings; an unrecognised pair returns the input unchanged.
pub fn sort_lessons(lessons: &[Lesson], sort_by: &str, direction: &str) -> Vec<Lesson> {
    match (sort_by.parse::<SortKey>(), direction.parse::<SortDirection>()) {
        (Ok(key), Ok(direction)) => sort_by_key(lessons, key, direction),
        _ => lessons.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentId;

    fn lesson(subject: &str, location: &str, price: f64, space: i64) -> Lesson {
        Lesson {
            id: DocumentId::new(),
            subject: subject.to_string(),
            location: location.to_string(),
            price,
            space,
        }
    }

    fn subjects(lessons: &[Lesson]) -> Vec<&str> {
        lessons.iter().map(|l| l.subject.as_str()).collect()
    }

    fn fixture() -> Vec<Lesson> {
        vec![
            lesson("music", "Oxford", 30.0, 2),
            lesson("Art", "London", 10.0, 5),
            lesson("Math", "Bristol", 20.0, 0),
        ]
    }

    #[test]
    fn text_fields_ignore_case() {
        let sorted = sort_lessons(&fixture(), "subject", "ascending");
        assert_eq!(subjects(&sorted), vec!["Art", "Math", "music"]);
    }

    #[test]
    fn numeric_fields_descending() {
        let by_price = sort_lessons(&fixture(), "price", "descending");
        assert_eq!(subjects(&by_price), vec!["music", "Math", "Art"]);

        let by_space = sort_lessons(&fixture(), "availability", "ascending");
        assert_eq!(subjects(&by_space), vec!["Math", "music", "Art"]);
    }

    #[test]
    fn location_sorts_lexicographically() {
        let sorted = sort_lessons(&fixture(), "location", "ascending");
        assert_eq!(subjects(&sorted), vec!["Math", "Art", "music"]);
    }

    #[test]
    fn unknown_pairs_keep_input_order() {
        let input = fixture();
        assert_eq!(sort_lessons(&input, "", ""), input);
        assert_eq!(sort_lessons(&input, "topic", "ascending"), input);
        assert_eq!(sort_lessons(&input, "price", "sideways"), input);
    }

    #[test]
    fn sorting_is_deterministic() {
        let mut input = fixture();
        input.push(lesson("Drama", "London", 10.0, 5));

        let first = sort_lessons(&input, "price", "ascending");
        let second = sort_lessons(&input, "price", "ascending");
        assert_eq!(first, second);
        assert_eq!(subjects(&first)[..2], ["Art", "Drama"]);
    }
}
