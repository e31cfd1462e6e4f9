use narwhal::geom::{point, size};
use narwhal::{
    Error, Graph, MaxIterationMethod, Node, OverlapRemovalSettings, ProximityOverlapRemoval,
    SolvingMethod, StressMajorizationSettings, UpdateMethod,
};

fn assert_invalid_setting(settings: &OverlapRemovalSettings, expected_name: &str) {
    match settings.validate() {
        Err(Error::InvalidSetting { name, .. }) => assert_eq!(name, expected_name),
        other => panic!("expected an invalid {expected_name}, got {other:?}"),
    }
}

#[test]
fn defaults_match_the_documented_values() {
    let settings = OverlapRemovalSettings::default();
    assert_eq!(settings.epsilon, 0.01);
    assert_eq!(settings.iterations_max, 1000);
    assert!(!settings.stop_on_max_iterations);
    assert_eq!(settings.node_separation, 4.0);
    assert_eq!(settings.randomization_seed, 1);
    assert!(!settings.work_in_inches);

    let stress = settings.stress_settings;
    assert_eq!(stress.solving_method, SolvingMethod::PreconditionedConjugateGradient);
    assert_eq!(stress.update_method, UpdateMethod::Parallel);
    assert_eq!(stress.max_solver_iterations_policy, MaxIterationMethod::SqrtOfProblemSize);
    assert!(stress.cancel_after_first_conjugate);
    assert_eq!(stress.residual_tolerance, 0.1);
    assert!(settings.validate().is_ok());
}

#[test]
fn partial_json_fills_in_defaults() {
    let settings: OverlapRemovalSettings = serde_json::from_str(
        r#"{
            "nodeSeparation": 10,
            "stopOnMaxIterations": true,
            "stressSettings": { "solvingMethod": "Localized", "maxStressIterations": 5 }
        }"#,
    )
    .expect("valid json");

    assert_eq!(settings.node_separation, 10.0);
    assert!(settings.stop_on_max_iterations);
    assert_eq!(settings.epsilon, 0.01);
    assert_eq!(settings.stress_settings.solving_method, SolvingMethod::Localized);
    assert_eq!(settings.stress_settings.max_stress_iterations, 5);
    assert_eq!(settings.stress_settings.stress_change_tolerance, 1e-3);
}

#[test]
fn settings_serialize_with_camel_case_keys() {
    let value = serde_json::to_value(OverlapRemovalSettings::default()).expect("serialize");
    assert_eq!(value["iterationsMax"], 1000);
    assert_eq!(value["stressSettings"]["maxSolverIterationsPolicy"], "SqrtOfProblemSize");
}

#[test]
fn non_positive_epsilon_is_rejected() {
    assert_invalid_setting(
        &OverlapRemovalSettings {
            epsilon: 0.0,
            ..OverlapRemovalSettings::default()
        },
        "epsilon",
    );
}

#[test]
fn negative_node_separation_is_rejected_but_zero_is_fine() {
    assert_invalid_setting(
        &OverlapRemovalSettings {
            node_separation: -1.0,
            ..OverlapRemovalSettings::default()
        },
        "nodeSeparation",
    );
    let zero = OverlapRemovalSettings {
        node_separation: 0.0,
        ..OverlapRemovalSettings::default()
    };
    assert!(zero.validate().is_ok());
}

#[test]
fn a_zero_iteration_cap_is_rejected_only_when_it_is_enforced() {
    let capped = OverlapRemovalSettings {
        iterations_max: 0,
        stop_on_max_iterations: true,
        ..OverlapRemovalSettings::default()
    };
    assert_invalid_setting(&capped, "iterationsMax");
    let uncapped = OverlapRemovalSettings {
        stop_on_max_iterations: false,
        ..capped
    };
    assert!(uncapped.validate().is_ok());
}

#[test]
fn fixed_solver_budget_must_be_positive() {
    assert_invalid_setting(
        &OverlapRemovalSettings {
            stress_settings: StressMajorizationSettings {
                max_solver_iterations: 0,
                max_solver_iterations_policy: MaxIterationMethod::FixedMax,
                ..StressMajorizationSettings::default()
            },
            ..OverlapRemovalSettings::default()
        },
        "maxSolverIterations",
    );
}

#[test]
fn stress_settings_need_a_stopping_rule() {
    assert_invalid_setting(
        &OverlapRemovalSettings {
            stress_settings: StressMajorizationSettings {
                solving_method: SolvingMethod::Localized,
                cancel_on_stress_convergence: false,
                cancel_on_stress_max_iteration: false,
                ..StressMajorizationSettings::default()
            },
            ..OverlapRemovalSettings::default()
        },
        "cancelOnStressConvergence",
    );
}

#[test]
fn invalid_settings_fail_before_the_graph_is_touched() {
    let mut graph = Graph::default();
    graph.nodes.push(Node::new("a", point(0.0, 0.0), size(2.0, 2.0)));
    graph.nodes.push(Node::new("b", point(0.1, 0.0), size(2.0, 2.0)));
    let mut removal = ProximityOverlapRemoval::new(OverlapRemovalSettings {
        epsilon: f64::NAN,
        ..OverlapRemovalSettings::default()
    });
    let err = removal.remove_overlaps(&mut graph).expect_err("invalid epsilon");
    assert!(matches!(err, Error::InvalidSetting { name: "epsilon", .. }), "{err}");
    assert_eq!(graph.nodes[1].center, point(0.1, 0.0));
}
