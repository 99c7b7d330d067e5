use factoring_core::origination::{
    compute_batch_origination, find_advance_rate, FeeMethod, OriginationItemInput,
    ReverseItemInput,
};
use factoring_core::FactoringError;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ===========================================================================
// Forward origination
// ===========================================================================

fn invoice(net: Decimal, fixed_min: Decimal, pct: Decimal) -> OriginationItemInput {
    OriginationItemInput {
        item_id: None,
        net_amount: Some(net),
        advance_rate: Some(dec!(0.9)),
        monthly_rate: Some(dec!(0.02)),
        term_days: Some(45),
        fixed_min_commission: Some(fixed_min),
        pct_commission: Some(pct),
        tax_rate: dec!(0.18),
        affiliation_fee: None,
        apply_affiliation: false,
    }
}

#[test]
fn test_batch_fee_decision_is_aggregate_not_per_item() {
    // Item 1 alone would prefer percentage (90 > 50), item 2 alone would
    // prefer fixed (350 > 45). The batch decides on totals:
    // pct = 90 + 45 = 135, fixed = 50 + 350 = 400 -> FIXED for everyone.
    let items = vec![
        invoice(dec!(20000), dec!(50), dec!(0.005)),
        invoice(dec!(10000), dec!(350), dec!(0.005)),
    ];
    let out = compute_batch_origination(&items).unwrap();

    assert_eq!(out.result.chosen_fee_method, FeeMethod::Fixed);
    let first = out.result.items[0].result.as_ref().unwrap();
    let second = out.result.items[1].result.as_ref().unwrap();
    assert_eq!(first.commission, dec!(50));
    assert_eq!(second.commission, dec!(350));
    assert_eq!(out.result.total_commission, dec!(400));
}

#[test]
fn test_percentage_wins_when_it_yields_more() {
    let items = vec![
        invoice(dec!(20000), dec!(50), dec!(0.01)),
        invoice(dec!(10000), dec!(40), dec!(0.01)),
    ];
    // pct = 180 + 90 = 270, fixed = 90
    let out = compute_batch_origination(&items).unwrap();
    assert_eq!(out.result.chosen_fee_method, FeeMethod::Percentage);
}

#[test]
fn test_disbursement_components_reconcile() {
    let items = vec![invoice(dec!(10000), dec!(10), dec!(0.005))];
    let out = compute_batch_origination(&items).unwrap();
    let item = out.result.items[0].result.as_ref().unwrap();

    // capital 9000 at 2% for 45 days
    assert_eq!(item.capital, dec!(9000));
    assert!(item.interest > dec!(270) && item.interest < dec!(280));
    assert!((item.igv_interest - item.interest * dec!(0.18)).abs() < dec!(0.01));

    let gross_charges = item.interest
        + item.igv_interest
        + item.commission
        + item.igv_commission
        + item.affiliation
        + item.igv_affiliation;
    // Floored disbursement sits within roughly one unit of capital minus
    // the (individually rounded) charges.
    let reconciled = item.capital - gross_charges;
    assert!((reconciled - item.disbursed_amount).abs() < dec!(1.05));
}

#[test]
fn test_three_item_batch_survives_bad_middle_item() {
    let mut bad = invoice(dec!(5000), dec!(10), dec!(0.005));
    bad.net_amount = None;
    let items = vec![
        invoice(dec!(10000), dec!(10), dec!(0.005)),
        bad,
        invoice(dec!(8000), dec!(10), dec!(0.005)),
    ];

    let out = compute_batch_origination(&items).unwrap();
    assert!(out.result.items[0].is_ok());
    assert!(!out.result.items[1].is_ok());
    assert!(out.result.items[2].is_ok());
    assert_eq!(out.result.items.len(), 3);
}

// ===========================================================================
// Reverse solver round-trip
// ===========================================================================

#[test]
fn test_reverse_reproduces_forward_capital() {
    let forward_items = vec![invoice(dec!(10000), dec!(10), dec!(0.005))];
    let forward = compute_batch_origination(&forward_items).unwrap();
    let forward_item = forward.result.items[0].result.as_ref().unwrap();

    let reverse_items = vec![ReverseItemInput {
        item_id: None,
        net_amount: Some(dec!(10000)),
        target_disbursement: Some(forward_item.disbursed_amount),
        monthly_rate: Some(dec!(0.02)),
        term_days: Some(45),
        fixed_min_commission: Some(dec!(10)),
        pct_commission: Some(dec!(0.005)),
        tax_rate: dec!(0.18),
        affiliation_fee: None,
        apply_affiliation: false,
    }];
    let reverse = find_advance_rate(&reverse_items).unwrap();

    assert_eq!(reverse.result.chosen_fee_method, forward.result.chosen_fee_method);
    let reverse_item = reverse.result.items[0].result.as_ref().unwrap();

    // The forward disbursement was floored, so the solved capital can
    // undershoot the original by up to one unit of disbursement divided by
    // the cost factor, comfortably within 1.2 currency units here.
    assert!((reverse_item.capital - forward_item.capital).abs() < dec!(1.2));
    assert!((reverse_item.advance_rate - dec!(0.9)).abs() < dec!(0.001));
}

#[test]
fn test_reverse_uses_batch_decision_for_final_breakdown() {
    // Large fixed minimums push the whole batch to the FIXED method, so
    // the fixed-method capital must be the one in the breakdown.
    let items = vec![ReverseItemInput {
        item_id: Some("R-1".into()),
        net_amount: Some(dec!(10000)),
        target_disbursement: Some(dec!(8500)),
        monthly_rate: Some(dec!(0.02)),
        term_days: Some(30),
        fixed_min_commission: Some(dec!(300)),
        pct_commission: Some(dec!(0.005)),
        tax_rate: dec!(0.18),
        affiliation_fee: None,
        apply_affiliation: false,
    }];
    let out = find_advance_rate(&items).unwrap();
    assert_eq!(out.result.chosen_fee_method, FeeMethod::Fixed);

    let item = out.result.items[0].result.as_ref().unwrap();
    assert_eq!(item.commission, dec!(300));
    // Fixed commission is grossed into the numerator, so the capital must
    // cover target + commission + IGV + interest.
    assert!(item.capital > dec!(8500) + dec!(300));
}

#[test]
fn test_empty_batches_error_in_both_directions() {
    assert!(matches!(
        compute_batch_origination(&[]),
        Err(FactoringError::EmptyBatch)
    ));
    assert!(matches!(
        find_advance_rate(&[]),
        Err(FactoringError::EmptyBatch)
    ));
}
