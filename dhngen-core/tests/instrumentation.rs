//! Instrumentation emitted by the generator phases.

mod common;

use common::{compact_params, rng};
use dhngen_core::{GenerationError, RetryBudget, TopologyAssembler};
use dhngen_test_support::tracing::RecordingLayer;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;

#[test]
fn generation_records_every_phase() {
    let layer = RecordingLayer::default();
    let subscriber = tracing_subscriber::registry().with(layer.clone());
    let assembler = TopologyAssembler::from_builder(compact_params().with_max_diameter(1))
        .expect("valid parameters");

    tracing::subscriber::with_default(subscriber, || assembler.generate(&mut rng(8)))
        .expect("generation succeeds");

    let assemble = layer.span("core.assemble").expect("assemble span");
    assert_eq!(assemble.fields.get("regions"), Some(&"4".to_owned()));
    assert_eq!(assemble.fields.get("nodes_per_region"), Some(&"30".to_owned()));
    assert!(layer.span("core.generate").is_some());
    assert!(layer.spans_named("core.build_region").len() >= 4);
    assert!(layer.span("core.remove_short_cycles").is_some());

    let layout = layer.span("core.layout").expect("layout span");
    assert_eq!(layout.fields.get("provider"), Some(&"force-directed".to_owned()));

    assert!(layer.has_event(Level::INFO, "network assembled"));
    assert!(layer.has_event(Level::INFO, "network generated"));
    assert!(layer.has_event(Level::WARN, "network exceeds the advisory diameter"));

    let assembled = layer
        .events()
        .into_iter()
        .find(|event| event.message() == Some("network assembled"))
        .expect("assembled event");
    assert_eq!(assembled.span.as_deref(), Some("core.assemble"));
    assert_eq!(assembled.fields.get("nodes"), Some(&"120".to_owned()));
}

#[test]
fn retries_are_logged_with_their_error_code() {
    let layer = RecordingLayer::default();
    let subscriber = tracing_subscriber::registry().with(layer.clone());
    let builder = compact_params()
        .with_nodes_per_region(60)
        .with_retry_budget(RetryBudget {
            region_attempts: 1,
            connect_trials: 1,
            assembly_attempts: 3,
            ..RetryBudget::default()
        });
    let assembler = TopologyAssembler::from_builder(builder).expect("valid parameters");

    let err = tracing::subscriber::with_default(subscriber, || assembler.generate(&mut rng(2)))
        .expect_err("regions cannot be connected");
    assert_eq!(err, GenerationError::RetriesExhausted { attempts: 3 });

    let retries: Vec<_> = layer
        .events()
        .into_iter()
        .filter(|event| event.message() == Some("assembly attempt failed, retrying"))
        .collect();
    assert_eq!(retries.len(), 3);
    assert!(retries.iter().all(|event| {
        event.level == Level::WARN
            && event.fields.get("code").map(String::as_str)
                == Some("GENERATION_REGION_UNCONNECTABLE")
    }));
}
