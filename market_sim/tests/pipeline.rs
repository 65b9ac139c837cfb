//! End-to-end runs through the public API.

use market_env::{RunId, SystemContext};
use market_sim::{ExecutionStatus, ScenarioId, SimContext, SimulationError, SimulationOrchestrator};
use serde_json::Value;

fn full_market_json(seed: u64) -> String {
    let mut config = ScenarioId::FullMarket.config();
    config.simulation_parameters.seed = Some(seed);
    config.to_json_string().unwrap()
}

#[test]
fn test_json_document_runs_every_model() {
    let orchestrator = SimulationOrchestrator::new(SimContext::shared());
    let result = orchestrator
        .run_json(&full_market_json(31_415), RunId::from_seed(1))
        .unwrap();

    assert_eq!(result.execution_status, ExecutionStatus::Success);
    assert_eq!(result.results.len(), 4);
    assert_eq!(result.seed, 31_415);
}

#[test]
fn test_stable_output_fields() {
    let orchestrator = SimulationOrchestrator::new(SimContext::shared());
    let result = orchestrator
        .run_json(&full_market_json(27_182), RunId::from_seed(2))
        .unwrap();
    let json = serde_json::to_value(&result).unwrap();
    let results = &json["results"];

    let record = &results["consumer_decision"]["output"]["records"][0];
    let action = record["final_decision"]["action"].as_str().unwrap();
    assert!(["purchase", "delay_purchase", "no_purchase", "no_action"].contains(&action));
    let confidence = record["decision_confidence"].as_f64().unwrap();
    assert!((0.0..=1.0).contains(&confidence));

    let overall = &results["channel_dynamics"]["output"]["simulation"]["overall_performance"];
    assert!(overall["total_traffic"].as_f64().unwrap() > 0.0);
    assert!(overall["total_conversions"].is_number());
    assert!(overall["total_cost"].is_number());

    for competitor in results["competitor_reaction"]["output"]["competitors"]
        .as_array()
        .unwrap()
    {
        assert!(competitor["reaction_effectiveness"]["total_reactions"].is_u64());
    }

    let coefficient = results["social_proof"]["output"]["virality_metrics"]["virality_coefficient"]
        .as_f64()
        .unwrap();
    assert!(coefficient >= 0.0);
}

#[test]
fn test_reproducible_across_orchestrators_and_clocks() {
    let json = full_market_json(86_420);

    let simulated = SimulationOrchestrator::new(SimContext::shared())
        .run_json(&json, RunId::from_seed(3))
        .unwrap();
    let wall_clock = SimulationOrchestrator::new(SystemContext::shared())
        .run_json(&json, RunId::new())
        .unwrap();

    assert_eq!(
        serde_json::to_string(&simulated.results).unwrap(),
        serde_json::to_string(&wall_clock.results).unwrap()
    );
}

#[test]
fn test_malformed_json_is_config_error() {
    let orchestrator = SimulationOrchestrator::new(SimContext::shared());
    let err = orchestrator.run_json("{ not json", RunId::from_seed(4)).unwrap_err();
    assert!(matches!(err, SimulationError::Config(_)));
}

#[test]
fn test_unknown_fields_pass_through() {
    let mut value: Value = serde_json::from_str(&full_market_json(52_817)).unwrap();
    value["campaign_owner"] = Value::String("growth-team".to_string());

    let orchestrator = SimulationOrchestrator::new(SimContext::shared());
    let result = orchestrator
        .run_json(&value.to_string(), RunId::from_seed(5))
        .unwrap();

    assert_eq!(
        result.effective_config.extra.get("campaign_owner"),
        Some(&Value::String("growth-team".to_string()))
    );
}

fn social_json(initial_adopters: &str) -> String {
    format!(
        r#"{{
            "simulation_parameters": {{
                "scenario_name": "viral_labels",
                "seed": 42,
                "required_models": ["social_proof"]
            }},
            "time_parameters": {{ "periods": 8 }},
            "social": {{
                "network_type": "small_world",
                "population": 50,
                "initial_adopters": {},
                "product_appeal": 0.7
            }}
        }}"#,
        initial_adopters
    )
}

#[test]
fn test_social_node_labels_in_json() {
    let orchestrator = SimulationOrchestrator::new(SimContext::shared());
    let result = orchestrator
        .run_json(&social_json(r#"["0", "1", "2"]"#), RunId::from_seed(6))
        .unwrap();

    assert_eq!(result.execution_status, ExecutionStatus::Success);
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["results"]["social_proof"]["output"]["adoption_curve"][0], 3);
}

#[test]
fn test_social_label_outside_population_fails_model() {
    let orchestrator = SimulationOrchestrator::new(SimContext::shared());
    let result = orchestrator
        .run_json(&social_json(r#"["0", "50"]"#), RunId::from_seed(7))
        .unwrap();

    assert_eq!(result.execution_status, ExecutionStatus::Failed);
    assert!(result.failures.contains_key(&market_core::ModelKind::SocialProof));
}
