use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Currency minor-unit tolerance applied to every amount comparison.
pub const TOLERANCE: Decimal = dec!(0.01);

/// Outcome of reconciling the four declared amounts of an expense.
///
/// Recomputed on every edit of the inputs; gates persistence at the final
/// ingestion gate but does not stop the authority check from running.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationResult {
    /// `round2(subtotal + tax + withholdings)`.
    pub computed_total: Decimal,
    /// The total as declared on the document or entered by the user.
    pub declared_total: Decimal,
    /// `computed_total - declared_total` (signed).
    pub difference: Decimal,
    /// Whether `|difference| <= 0.01`.
    pub within_tolerance: bool,
}

/// Check that `total = subtotal + tax + withholdings` within tolerance.
///
/// The computed sum is rounded half-up to 2 decimal places before the
/// comparison, so there is no rounding-mode ambiguity. A difference of
/// exactly `0.01` is within tolerance; `0.011` is not.
pub fn reconcile(
    subtotal: Decimal,
    tax: Decimal,
    withholdings: Decimal,
    total: Decimal,
) -> ReconciliationResult {
    let computed_total = round_half_up(subtotal + tax + withholdings, 2);
    let difference = computed_total - total;

    ReconciliationResult {
        computed_total,
        declared_total: total,
        difference,
        within_tolerance: difference.abs() <= TOLERANCE,
    }
}

/// Round a Decimal to `dp` decimal places using half-up (commercial rounding).
pub(crate) fn round_half_up(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, rust_decimal::RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_sum_reconciles() {
        let r = reconcile(dec!(195.00), dec!(31.20), dec!(0), dec!(226.20));
        assert!(r.within_tolerance);
        assert_eq!(r.difference, dec!(0));
    }

    #[test]
    fn one_cent_difference_is_tolerated() {
        let r = reconcile(dec!(100.00), dec!(16.00), dec!(0), dec!(116.01));
        assert!(r.within_tolerance);
        assert_eq!(r.difference, dec!(-0.01));
    }

    #[test]
    fn eleven_mills_is_not_tolerated() {
        let r = reconcile(dec!(100.00), dec!(16.011), dec!(0), dec!(116.00));
        // 116.011 rounds to 116.01, still one cent off — tolerated.
        assert!(r.within_tolerance);

        let r = reconcile(dec!(100.00), dec!(16.02), dec!(0), dec!(116.00));
        assert!(!r.within_tolerance);
        assert_eq!(r.difference, dec!(0.02));
    }

    #[test]
    fn rounds_half_up_before_comparing() {
        // 0.005 rounds away from zero, not to even
        assert_eq!(round_half_up(dec!(116.005), 2), dec!(116.01));
        assert_eq!(round_half_up(dec!(-116.005), 2), dec!(-116.01));
    }

    #[test]
    fn withholdings_participate_in_the_sum() {
        let r = reconcile(dec!(1000.00), dec!(160.00), dec!(-106.67), dec!(1053.33));
        assert!(r.within_tolerance);
    }
}
