use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use grocer_core::{DomainError, DomainResult, ProductId};

/// Requested demand for one product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationLine {
    pub product_id: ProductId,
    pub quantity: i64,
}

impl ReservationLine {
    pub fn new(product_id: ProductId, quantity: i64) -> Self {
        Self {
            product_id,
            quantity,
        }
    }
}

/// Validate and merge reservation lines into per-product demand.
///
/// Lines naming the same product are summed: they draw on the same stock
/// pool. The map iterates in ascending product id, which is the global lock
/// order every store uses.
pub fn aggregate_demand(lines: &[ReservationLine]) -> DomainResult<BTreeMap<ProductId, i64>> {
    if lines.is_empty() {
        return Err(DomainError::invalid_input("no items requested"));
    }

    for (idx, line) in lines.iter().enumerate() {
        if line.quantity <= 0 {
            return Err(DomainError::invalid_input(format!(
                "line {}: quantity must be positive (product {}, got {})",
                idx + 1,
                line.product_id,
                line.quantity
            )));
        }
    }

    let mut demand: BTreeMap<ProductId, i64> = BTreeMap::new();
    for line in lines {
        let slot = demand.entry(line.product_id).or_insert(0);
        *slot = slot.checked_add(line.quantity).ok_or_else(|| {
            DomainError::invalid_input(format!("quantity overflow for product {}", line.product_id))
        })?;
    }
    Ok(demand)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn line(p: i64, q: i64) -> ReservationLine {
        ReservationLine::new(ProductId::new(p), q)
    }

    #[test]
    fn duplicate_lines_are_summed() {
        let demand = aggregate_demand(&[line(1, 6), line(2, 1), line(1, 6)]).unwrap();
        assert_eq!(demand.get(&ProductId::new(1)), Some(&12));
        assert_eq!(demand.get(&ProductId::new(2)), Some(&1));
    }

    #[test]
    fn iteration_is_ascending_by_product() {
        let demand = aggregate_demand(&[line(9, 1), line(3, 1), line(5, 1)]).unwrap();
        let order: Vec<i64> = demand.keys().map(|p| p.get()).collect();
        assert_eq!(order, vec![3, 5, 9]);
    }

    #[test]
    fn empty_and_non_positive_are_invalid() {
        assert_eq!(
            aggregate_demand(&[]),
            Err(DomainError::invalid_input("no items requested"))
        );
        let err = aggregate_demand(&[line(1, 2), line(4, 0)]).unwrap_err();
        assert_eq!(
            err,
            DomainError::invalid_input("line 2: quantity must be positive (product 4, got 0)")
        );
    }

    proptest! {
        #[test]
        fn aggregation_preserves_total_demand(
            raw in prop::collection::vec((1i64..6, 1i64..1000), 1..40)
        ) {
            let lines: Vec<ReservationLine> = raw.iter().map(|(p, q)| line(*p, *q)).collect();
            let demand = aggregate_demand(&lines).unwrap();

            let requested: i64 = lines.iter().map(|l| l.quantity).sum();
            let aggregated: i64 = demand.values().sum();
            prop_assert_eq!(requested, aggregated);
            prop_assert!(demand.len() <= 5);
        }
    }
}
