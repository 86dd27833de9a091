//! Test to verify test infrastructure works correctly

mod common;

use common::builders::{CompositeBuilder, SlotBuilder};
use common::mock_helpers::partitions_with;
use serde_json::json;
use serial_test::serial;
use subflow_rs::config::{ContinueOnFailureSettings, PartitionLookup};

#[test]
fn test_infrastructure_setup() {
    // Test that builders work
    let slot = SlotBuilder::new("Image")
        .keyed_rows("#Dataset", &["1", "2"])
        .build();
    assert_eq!(slot.len(), 2);
    assert_eq!(common::annotation_values(&slot, "#Dataset"), vec!["1", "2"]);

    let node = CompositeBuilder::new("c").input("Image").build();
    assert_eq!(node.slots().inputs().len(), 1);
    assert_eq!(node.slots().outputs().len(), 1);
}

#[test]
fn test_row_helper() {
    let row = common::row(json!(3), &[("k", "v")]);
    assert_eq!(row.item.value(), &json!(3));
    assert_eq!(row.annotation("k"), Some("v"));
}

#[test]
fn test_mock_partitions() {
    let partitions = partitions_with(ContinueOnFailureSettings {
        continue_on_failure: true,
        ..Default::default()
    });
    assert_eq!(partitions.partition_name(7), "Mocked");
    assert!(partitions.continue_on_failure_settings(0).continue_on_failure);
}

#[test]
#[serial]
fn test_logging_can_be_installed() {
    // Other test binaries may have installed a subscriber already
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("debug")
        .try_init();
    tracing::debug!("logging ready");
}
