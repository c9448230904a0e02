//! Proportional LPG cost allocation.
//!
//! Splits one refill bill across apartments by metered consumption, with an
//! efficiency surcharge on top of each share. All arithmetic stays in `f64`;
//! rounding happens only at presentation so the conservation invariants hold
//! within floating-point tolerance.

use uuid::Uuid;

use crate::{EngineError, MoneyCents, ResultEngine};

/// One apartment's meter readings for a refill period.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeterReading {
    pub owner_id: Uuid,
    pub previous_reading: f64,
    pub current_reading: f64,
}

/// One apartment's computed share of a refill bill.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Allocation {
    pub owner_id: Uuid,
    pub consumption: f64,
    /// Share of total consumption, 0–100.
    pub percentage: f64,
    /// Proportional share of the bill, before surcharge.
    pub subtotal: f64,
    /// Share including the efficiency surcharge.
    pub total_amount: f64,
}

/// Computes every apartment's share of `bill_amount`.
///
/// Fails loudly instead of dividing by zero: a refill whose net consumption
/// is zero or negative cannot be split proportionally, and an entry whose
/// current reading is below its previous one is invalid input.
pub fn allocate(
    bill_amount: MoneyCents,
    efficiency_percent: f64,
    readings: &[MeterReading],
) -> ResultEngine<Vec<Allocation>> {
    if readings.is_empty() {
        return Err(EngineError::InvalidInput(
            "a refill needs at least one meter reading".to_string(),
        ));
    }
    if bill_amount.is_negative() {
        return Err(EngineError::InvalidInput(
            "bill amount must not be negative".to_string(),
        ));
    }
    if !efficiency_percent.is_finite() || efficiency_percent < 0.0 {
        return Err(EngineError::InvalidInput(
            "efficiency percentage must be a non-negative number".to_string(),
        ));
    }

    for reading in readings {
        if !reading.previous_reading.is_finite() || !reading.current_reading.is_finite() {
            return Err(EngineError::InvalidInput(
                "meter readings must be finite numbers".to_string(),
            ));
        }
        if reading.current_reading < reading.previous_reading {
            return Err(EngineError::InvalidInput(format!(
                "current reading {} is below previous reading {}",
                reading.current_reading, reading.previous_reading
            )));
        }
    }

    let total_consumption: f64 = readings
        .iter()
        .map(|r| r.current_reading - r.previous_reading)
        .sum();
    if total_consumption <= 0.0 {
        return Err(EngineError::InvalidInput(
            "total consumption must be positive to split the bill".to_string(),
        ));
    }

    let bill = bill_amount.as_units();
    let surcharge_factor = 1.0 + efficiency_percent / 100.0;

    Ok(readings
        .iter()
        .map(|reading| {
            let consumption = reading.current_reading - reading.previous_reading;
            let percentage = consumption / total_consumption * 100.0;
            let subtotal = percentage / 100.0 * bill;
            Allocation {
                owner_id: reading.owner_id,
                consumption,
                percentage,
                subtotal,
                total_amount: subtotal * surcharge_factor,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-6;

    fn reading(previous: f64, current: f64) -> MeterReading {
        MeterReading {
            owner_id: Uuid::new_v4(),
            previous_reading: previous,
            current_reading: current,
        }
    }

    #[test]
    fn shares_are_proportional_to_consumption() {
        let allocations = allocate(
            MoneyCents::new(100_000), // 1000.00
            0.0,
            &[reading(100.0, 130.0), reading(200.0, 210.0)],
        )
        .unwrap();

        assert_eq!(allocations.len(), 2);
        assert!((allocations[0].percentage - 75.0).abs() < TOLERANCE);
        assert!((allocations[0].subtotal - 750.0).abs() < TOLERANCE);
        assert!((allocations[1].percentage - 25.0).abs() < TOLERANCE);
        assert!((allocations[1].subtotal - 250.0).abs() < TOLERANCE);
    }

    #[test]
    fn percentages_and_subtotals_conserve() {
        let allocations = allocate(
            MoneyCents::new(123_457), // awkward bill, uneven split
            8.5,
            &[
                reading(0.0, 17.3),
                reading(5.0, 11.1),
                reading(2.2, 31.9),
            ],
        )
        .unwrap();

        let pct_sum: f64 = allocations.iter().map(|a| a.percentage).sum();
        let subtotal_sum: f64 = allocations.iter().map(|a| a.subtotal).sum();
        let total_sum: f64 = allocations.iter().map(|a| a.total_amount).sum();

        assert!((pct_sum - 100.0).abs() < TOLERANCE);
        assert!((subtotal_sum - 1234.57).abs() < TOLERANCE);
        assert!((total_sum - 1234.57 * 1.085).abs() < TOLERANCE);
    }

    #[test]
    fn surcharge_scales_each_share() {
        let allocations =
            allocate(MoneyCents::new(50_000), 10.0, &[reading(0.0, 5.0)]).unwrap();
        assert!((allocations[0].subtotal - 500.0).abs() < TOLERANCE);
        assert!((allocations[0].total_amount - 550.0).abs() < TOLERANCE);
    }

    #[test]
    fn zero_total_consumption_is_rejected() {
        let err = allocate(
            MoneyCents::new(10_000),
            0.0,
            &[reading(100.0, 100.0), reading(50.0, 50.0)],
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(_)));
    }

    #[test]
    fn reading_below_previous_is_rejected() {
        let err = allocate(MoneyCents::new(10_000), 0.0, &[reading(100.0, 90.0)]).unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(_)));
    }

    #[test]
    fn empty_readings_are_rejected() {
        assert!(allocate(MoneyCents::new(10_000), 0.0, &[]).is_err());
    }

    #[test]
    fn negative_efficiency_is_rejected() {
        let err = allocate(MoneyCents::new(10_000), -5.0, &[reading(0.0, 1.0)]).unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(_)));
    }
}
