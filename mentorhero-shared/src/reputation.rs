/// Reputation scoring for tutors
///
/// A tutor's displayed reputation is the arithmetic mean of the stars
/// they have received, rounded to one decimal. A tutor nobody has rated
/// yet has no reputation at all: the average is `null` on the wire, never
/// a fake zero. Badges are derived presentation labels computed from the
/// same two numbers; nothing else in the system depends on them.

use serde::Serialize;

use crate::models::rating::RatingSummary;

/// Rating count needed for the first badge
pub const FIRST_SESSION_THRESHOLD: i64 = 1;

/// Rating count needed for the established badge
pub const ESTABLISHED_THRESHOLD: i64 = 3;

/// Rating count needed for the veteran badge
pub const VETERAN_THRESHOLD: i64 = 10;

/// Minimum rounded average for the top-rated badge
pub const TOP_RATED_AVERAGE: f64 = 4.5;

/// A tutor's reputation as shown to clients
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reputation {
    /// Mean of received stars rounded to one decimal; None until the
    /// first rating exists
    pub average: Option<f64>,

    /// How many ratings the average is over
    pub count: i64,

    /// Earned badge labels, in a fixed order
    pub badges: Vec<&'static str>,
}

/// Rounds to one decimal place, half away from zero
///
/// Ratings are non-negative here, so this matches the usual
/// round-half-up display convention: [5, 4, 3] averages to 4.0 and
/// [5, 4] to 4.5.
pub fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Computes the displayed reputation from aggregated ratings
///
/// `average_stars` comes straight from SQL `AVG(stars)` and is None when
/// no ratings exist; count and average must describe the same set of
/// rows for the badges to be coherent.
pub fn compute(summary: &RatingSummary) -> Reputation {
    let average = summary.average_stars.map(round_to_tenth);

    Reputation {
        average,
        count: summary.rating_count,
        badges: badges_for(summary.rating_count, average),
    }
}

/// Derives badge labels from rating count and rounded average
///
/// Count badges accumulate (a veteran also shows the earlier ones); the
/// top-rated badge requires both a qualifying average and at least the
/// established count, so one lucky five-star review doesn't award it.
pub fn badges_for(count: i64, average: Option<f64>) -> Vec<&'static str> {
    let mut badges = Vec::new();

    if count >= FIRST_SESSION_THRESHOLD {
        badges.push("Primera sesión");
    }
    if count >= ESTABLISHED_THRESHOLD {
        badges.push("Tutor establecido");
    }
    if count >= VETERAN_THRESHOLD {
        badges.push("Tutor veterano");
    }
    if count >= ESTABLISHED_THRESHOLD {
        if let Some(avg) = average {
            if avg >= TOP_RATED_AVERAGE {
                badges.push("Mejor calificado");
            }
        }
    }

    badges
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(average_stars: Option<f64>, rating_count: i64) -> RatingSummary {
        RatingSummary {
            average_stars,
            rating_count,
        }
    }

    #[test]
    fn test_rounds_to_one_decimal() {
        // [5, 4, 3] -> 4.0
        assert_eq!(round_to_tenth(4.0), 4.0);
        // [5, 4] -> 4.5
        assert_eq!(round_to_tenth(4.5), 4.5);
        // [5, 5, 4] -> 4.666... -> 4.7
        assert_eq!(round_to_tenth(14.0 / 3.0), 4.7);
        // [4, 4, 5] as raw thirds -> 4.333... -> 4.3
        assert_eq!(round_to_tenth(13.0 / 3.0), 4.3);
        // Midpoint rounds up
        assert_eq!(round_to_tenth(4.25), 4.3);
    }

    #[test]
    fn test_no_ratings_means_no_average() {
        let reputation = compute(&summary(None, 0));
        assert_eq!(reputation.average, None);
        assert_eq!(reputation.count, 0);
        assert!(reputation.badges.is_empty());
    }

    #[test]
    fn test_average_of_five_four_three_is_four() {
        let reputation = compute(&summary(Some(4.0), 3));
        assert_eq!(reputation.average, Some(4.0));
        assert_eq!(reputation.count, 3);
    }

    #[test]
    fn test_count_badges_accumulate() {
        assert_eq!(badges_for(0, None), Vec::<&str>::new());
        assert_eq!(badges_for(1, Some(3.0)), vec!["Primera sesión"]);
        assert_eq!(
            badges_for(3, Some(4.0)),
            vec!["Primera sesión", "Tutor establecido"]
        );
        assert_eq!(
            badges_for(10, Some(4.0)),
            vec!["Primera sesión", "Tutor establecido", "Tutor veterano"]
        );
    }

    #[test]
    fn test_top_rated_needs_average_and_count() {
        // High average with a single rating: no top-rated badge yet
        assert_eq!(badges_for(1, Some(5.0)), vec!["Primera sesión"]);

        // Enough ratings and a 4.5 average
        assert_eq!(
            badges_for(3, Some(4.5)),
            vec!["Primera sesión", "Tutor establecido", "Mejor calificado"]
        );

        // Enough ratings but below the bar
        assert_eq!(
            badges_for(3, Some(4.4)),
            vec!["Primera sesión", "Tutor establecido"]
        );
    }

    #[test]
    fn test_average_just_under_threshold_after_rounding() {
        // 4.449 rounds to 4.4, which stays under the top-rated bar
        let reputation = compute(&summary(Some(4.449), 5));
        assert_eq!(reputation.average, Some(4.4));
        assert!(!reputation.badges.contains(&"Mejor calificado"));

        // 4.45 rounds to 4.5 and qualifies
        let reputation = compute(&summary(Some(4.45), 5));
        assert_eq!(reputation.average, Some(4.5));
        assert!(reputation.badges.contains(&"Mejor calificado"));
    }
}
