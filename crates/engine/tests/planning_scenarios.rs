use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};

use stockpilot_core::{EngineConfig, EngineError, Frequency, GapFillPolicy, ItemId};
use stockpilot_engine::{BatchPlanner, ItemInput, Planner};
use stockpilot_inventory::UsageRecord;
use stockpilot_replenishment::{StockHealth, TriggerReason};

fn monday() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 8, 30, 0).unwrap()
}

fn weekly(id: &str, usage: &[f64], on_hand: f64) -> ItemInput {
    let item: ItemId = id.parse().unwrap();
    let records = usage
        .iter()
        .enumerate()
        .map(|(i, &u)| {
            UsageRecord::new(item.clone(), monday() + ChronoDuration::weeks(i as i64), u, on_hand)
                .unwrap()
        })
        .collect();
    ItemInput::new(item, records)
}

fn weekly_config() -> EngineConfig {
    EngineConfig::default()
        .with_frequency(Frequency::Weekly)
        .with_forecast_horizon(4)
        .with_min_periods(4)
        .with_lead_time(2)
        .with_service_level(0.95)
}

#[test]
fn steady_weekly_demand_below_reorder_point_triggers_an_order() {
    let planner = Planner::new(weekly_config()).unwrap();
    let plan = planner
        .plan_item(&weekly("WIDGET", &[10.0, 12.0, 9.0, 11.0, 10.0, 13.0, 10.0], 15.0))
        .unwrap();

    let rop = plan.state.reorder_point;
    // the SES grid settles on alpha 0.1, putting ROP near 24.4; the band is
    // lead-time demand (~20) up to ~24 plus one unit of slack
    assert!(rop > 20.0 && rop < 25.0, "reorder point {rop}");
    assert!(plan.state.safety_stock > 0.0);
    assert_eq!(plan.state.classification, StockHealth::Understock);
    assert_eq!(plan.recommendation.trigger_reason, TriggerReason::BelowReorderPoint);
    assert!(plan.recommendation.recommended_quantity > 0.0);
    assert!((plan.recommendation.confidence_level - 0.95).abs() < 1e-12);

    for pair in plan.forecast.points.windows(2) {
        assert!(pair[1].width() >= pair[0].width());
    }
}

#[test]
fn single_period_history_is_insufficient() {
    let planner = Planner::new(weekly_config()).unwrap();
    let err = planner.plan_item(&weekly("WIDGET", &[7.0], 3.0)).unwrap_err();
    assert!(matches!(
        err,
        EngineError::InsufficientData { required: 4, actual: 1, .. }
    ));
}

#[test]
fn large_stock_against_small_demand_is_overstock() {
    let planner = Planner::new(weekly_config().with_lead_time(1)).unwrap();
    let plan = planner
        .plan_item(&weekly("BOLT", &[9.0, 11.0, 10.0, 10.0, 9.0, 11.0, 10.0, 10.0], 500.0))
        .unwrap();

    assert_eq!(plan.state.classification, StockHealth::Overstock);
    assert_eq!(plan.recommendation.recommended_quantity, 0.0);
    assert_eq!(plan.recommendation.trigger_reason, TriggerReason::SufficientStock);
    assert!(plan.state.periods_of_cover.is_some_and(|c| c > 40.0));
}

#[test]
fn item_with_no_consumption_needs_nothing() {
    let planner = Planner::new(weekly_config()).unwrap();
    let plan = planner
        .plan_item(&weekly("SPARE", &[0.0; 6], 0.0))
        .unwrap();

    assert!(plan.forecast.is_zero());
    assert_eq!(plan.state.reorder_point, 0.0);
    // on hand 0 sits at the zero reorder point, yet nothing needs ordering
    assert_eq!(plan.state.classification, StockHealth::Understock);
    assert_eq!(plan.recommendation.recommended_quantity, 0.0);
    assert_eq!(plan.recommendation.trigger_reason, TriggerReason::SufficientStock);
    assert_eq!(plan.state.periods_of_cover, None);
}

#[test]
fn daily_gaps_are_filled_before_forecasting() {
    let config = EngineConfig::default()
        .with_frequency(Frequency::Daily)
        .with_gap_fill_policy(GapFillPolicy::ForwardFill)
        .with_forecast_horizon(3)
        .with_min_periods(6)
        .with_lead_time(1);
    let item: ItemId = "GASKET".parse().unwrap();
    let days = [0_i64, 1, 4, 5, 6, 7];
    let records: Vec<_> = days
        .iter()
        .map(|&d| {
            UsageRecord::new(item.clone(), monday() + ChronoDuration::days(d), 4.0, 20.0).unwrap()
        })
        .collect();

    let plan = Planner::new(config)
        .unwrap()
        .plan_item(&ItemInput::new(item, records))
        .unwrap();

    assert_eq!(plan.series_periods, 8);
    assert_eq!(plan.filled_periods, 2);
    assert!((plan.forecast.points[0].point_estimate - 4.0).abs() < 1e-9);
}

#[test]
fn one_bad_item_does_not_sink_the_batch() {
    stockpilot_observability::init();
    let inputs = vec![
        weekly("GOOD-1", &[10.0, 12.0, 9.0, 11.0, 10.0], 5.0),
        weekly("SHORT", &[3.0, 4.0], 1.0),
        weekly("GOOD-2", &[2.0, 2.0, 3.0, 2.0, 2.0], 40.0),
    ];
    let report = BatchPlanner::new(weekly_config().with_max_workers(2))
        .unwrap()
        .plan(&inputs, None);

    assert_eq!(report.success_count(), 2);
    assert_eq!(report.failure_count(), 1);
    let short: ItemId = "SHORT".parse().unwrap();
    assert_eq!(report.failures[&short].kind, "insufficient_data");
    assert!(!report.recommendations.contains_key(&short));

    let orders = report.orders();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].item_id.as_str(), "GOOD-1");
    assert_eq!(report.items_in(StockHealth::Overstock).len(), 1);
}

#[test]
fn repeated_runs_agree() {
    let inputs: Vec<_> = (0..6)
        .map(|i| {
            let usage: Vec<f64> = (0..10).map(|t| (5 + (i * t) % 7) as f64).collect();
            weekly(&format!("ITEM-{i}"), &usage, 12.0)
        })
        .collect();
    let planner = BatchPlanner::new(weekly_config()).unwrap();

    let first = planner.plan(&inputs, None);
    let second = planner.plan(&inputs, None);

    assert_ne!(first.run_id, second.run_id);
    assert_eq!(first.forecasts, second.forecasts);
    assert_eq!(first.states, second.states);
    assert_eq!(first.recommendations, second.recommendations);
}

#[test]
fn report_serializes_to_json() {
    let config = EngineConfig::from_json_str(
        r#"{ "forecast_horizon": 4, "min_periods": 4, "frequency": "weekly", "lead_time": 2 }"#,
    )
    .unwrap();
    let report = BatchPlanner::new(config)
        .unwrap()
        .plan(&[weekly("WIDGET", &[10.0, 12.0, 9.0, 11.0, 10.0], 15.0), weekly("X", &[1.0], 0.0)], None);

    let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
    assert_eq!(json["forecasts"]["WIDGET"]["horizon"], 4);
    assert_eq!(json["failures"]["X"]["kind"], "insufficient_data");
    assert!(json["recommendations"]["WIDGET"]["recommended_quantity"].is_number());
}

#[test]
fn turnover_summary_covers_items_holding_stock() {
    let inputs = vec![
        weekly("A", &[10.0; 6], 100.0),
        weekly("B", &[10.0; 6], 50.0),
        weekly("C", &[10.0; 6], 25.0),
        weekly("EMPTY", &[0.0; 6], 0.0),
    ];
    let report = BatchPlanner::new(weekly_config()).unwrap().plan(&inputs, None);
    assert_eq!(report.success_count(), 4);

    let empty: ItemId = "EMPTY".parse().unwrap();
    assert_eq!(report.states[&empty].turnover, None);

    let summary = report.turnover_summary().unwrap();
    assert_eq!(summary.items, 3);
    assert!((summary.mean - 0.7 / 3.0).abs() < 1e-9, "{summary:?}");
    assert!((summary.median - 0.2).abs() < 1e-9, "{summary:?}");
    assert!((summary.std - 0.152_752_523).abs() < 1e-6, "{summary:?}");
}

#[test]
fn turnover_summary_is_absent_without_stock() {
    let report = BatchPlanner::new(weekly_config())
        .unwrap()
        .plan(&[weekly("EMPTY", &[0.0; 6], 0.0)], None);
    assert_eq!(report.turnover_summary(), None);
}
