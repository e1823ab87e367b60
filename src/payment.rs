use serde::{Deserialize, Serialize};

use crate::entities::Trip;

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Settlement {
    pub platform_fee: f64,
    pub driver_earnings: f64,
}

/// Seam to the payment collaborator: invoked on completion, result stored on
/// the trip. The settlement math itself lives outside the dispatch engine.
pub trait SettlementCalculator: Send + Sync {
    fn settle(&self, trip: &Trip) -> Settlement;
}

/// Default split: a flat platform share of the stored fare total.
#[derive(Clone, Debug)]
pub struct FlatRateSettlement {
    pub platform_share: f64,
}

impl Default for FlatRateSettlement {
    fn default() -> Self {
        Self {
            platform_share: 0.20,
        }
    }
}

impl SettlementCalculator for FlatRateSettlement {
    fn settle(&self, trip: &Trip) -> Settlement {
        let platform_fee = trip.fare.total * self.platform_share;

        Settlement {
            platform_fee,
            driver_earnings: trip.fare.total - platform_fee,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Coordinates, VehicleClass};
    use uuid::Uuid;

    #[test]
    fn flat_rate_split_adds_up() {
        let mut trip = Trip::new(
            Uuid::new_v4(),
            Coordinates::new(0.0, 0.0),
            "a".into(),
            Coordinates::new(0.0, 0.0),
            "b".into(),
            VehicleClass::Economy,
            "cash".into(),
            None,
        );
        trip.fare.total = 25.0;

        let settlement = FlatRateSettlement::default().settle(&trip);

        assert!((settlement.platform_fee - 5.0).abs() < 1e-9);
        assert!((settlement.driver_earnings - 20.0).abs() < 1e-9);
        assert!(
            (settlement.platform_fee + settlement.driver_earnings - trip.fare.total).abs() < 1e-9
        );
    }
}
