use crate::entities::{Candidate, DriverPresence};

const DISTANCE_WEIGHT: f64 = 0.40;
const RATING_WEIGHT: f64 = 0.30;
const ACCEPTANCE_WEIGHT: f64 = 0.15;
const COMPLETION_WEIGHT: f64 = 0.15;

const DEFAULT_ACCEPTANCE_RATE: f64 = 80.0;
const DEFAULT_COMPLETION_RATE: f64 = 90.0;

/// Composite score in [0, 1]: weighted sum of normalized distance, rating,
/// acceptance rate and completion rate. Distance is normalized against the
/// maximum search radius so it reaches zero exactly at the ceiling.
pub fn score(presence: &DriverPresence, distance_km: f64, max_radius_km: f64) -> f64 {
    let distance_factor = (1.0 - distance_km / max_radius_km).max(0.0);
    let rating_factor = presence.rating / 5.0;
    let acceptance_factor = presence.acceptance_rate.unwrap_or(DEFAULT_ACCEPTANCE_RATE) / 100.0;
    let completion_factor = presence.completion_rate.unwrap_or(DEFAULT_COMPLETION_RATE) / 100.0;

    DISTANCE_WEIGHT * distance_factor
        + RATING_WEIGHT * rating_factor
        + ACCEPTANCE_WEIGHT * acceptance_factor
        + COMPLETION_WEIGHT * completion_factor
}

/// Rank matches by score descending; ties break by distance ascending, then
/// driver id, so the ordering is deterministic.
pub fn rank(matches: Vec<(DriverPresence, f64)>, max_radius_km: f64) -> Vec<Candidate> {
    let mut candidates: Vec<Candidate> = matches
        .into_iter()
        .map(|(presence, distance_km)| Candidate {
            driver_id: presence.id,
            score: score(&presence, distance_km, max_radius_km),
            distance_km,
        })
        .collect();

    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(
                a.distance_km
                    .partial_cmp(&b.distance_km)
                    .unwrap_or(std::cmp::Ordering::Equal),
            )
            .then(a.driver_id.cmp(&b.driver_id))
    });

    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Availability, Coordinates, Vehicle, VehicleClass};
    use uuid::Uuid;

    fn presence(rating: f64, acceptance: Option<f64>, completion: Option<f64>) -> DriverPresence {
        let vehicle = Vehicle {
            id: Uuid::new_v4(),
            class: VehicleClass::Economy,
            active: true,
        };

        let mut p = DriverPresence::new(Uuid::new_v4(), Coordinates::new(0.0, 0.0), Some(vehicle));
        p.availability = Availability::Online;
        p.verified = true;
        p.rating = rating;
        p.acceptance_rate = acceptance;
        p.completion_rate = completion;
        p
    }

    #[test]
    fn perfect_driver_at_pickup_scores_one() {
        let p = presence(5.0, Some(100.0), Some(100.0));

        let s = score(&p, 0.0, 15.0);
        assert!((s - 1.0).abs() < 1e-9, "expected 1.0, got {}", s);
    }

    #[test]
    fn closer_driver_never_scores_lower() {
        let near = presence(4.0, Some(70.0), Some(85.0));
        let far = presence(4.0, Some(70.0), Some(85.0));

        let near_score = score(&near, 2.0, 15.0);
        let far_score = score(&far, 9.0, 15.0);

        assert!(near_score >= far_score);
    }

    #[test]
    fn distance_factor_bottoms_out_at_the_ceiling() {
        let p = presence(5.0, Some(100.0), Some(100.0));

        // at and beyond the max radius the distance factor contributes zero
        let at_ceiling = score(&p, 15.0, 15.0);
        let beyond = score(&p, 40.0, 15.0);

        assert!((at_ceiling - 0.6).abs() < 1e-9);
        assert!((beyond - 0.6).abs() < 1e-9);
    }

    #[test]
    fn unset_reputation_rates_use_defaults() {
        let p = presence(5.0, None, None);

        let s = score(&p, 0.0, 15.0);
        let expected = 0.40 + 0.30 + 0.15 * 0.8 + 0.15 * 0.9;
        assert!((s - expected).abs() < 1e-9);
    }

    #[test]
    fn ranking_sorts_by_score_then_distance() {
        let strong = presence(5.0, Some(100.0), Some(100.0));
        let weak = presence(3.0, Some(50.0), Some(60.0));
        let strong_id = strong.id;

        let tied_a = presence(4.0, Some(80.0), Some(90.0));
        let tied_b = presence(4.0, Some(80.0), Some(90.0));
        let tied_a_id = tied_a.id;
        let tied_b_id = tied_b.id;

        // both tied drivers sit past the ceiling, so their distance factors
        // clamp to zero and their scores come out equal
        let ranked = rank(
            vec![(weak, 1.0), (tied_b, 20.0), (strong, 5.0), (tied_a, 16.0)],
            15.0,
        );

        assert_eq!(ranked[0].driver_id, strong_id);
        // equal scores: closer one first
        let tied_positions: Vec<_> = ranked
            .iter()
            .filter(|c| c.driver_id == tied_a_id || c.driver_id == tied_b_id)
            .map(|c| c.driver_id)
            .collect();
        assert_eq!(tied_positions, vec![tied_a_id, tied_b_id]);
    }
}
