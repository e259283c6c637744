use form_catalog::scheduled_action;
use formflow_rust::{filter, filter_report, Policy, WizardError};
use pretty_assertions::assert_eq;
use serde_json::json;

fn entity() -> serde_json::Value {
    json!({ "ACTION": "resize", "START_AT": "2024-05-01", "REPEAT": "once" })
}

#[test]
fn restricted_field_is_read_only_but_still_submitted() {
    let policy = Policy::new().restrict(["resources.cpu"]);
    let mut w = scheduled_action().policy(policy).build(entity()).unwrap();
    assert!(w.next().unwrap().is_valid());
    let capacity = w.current_resolution().unwrap();
    assert!(capacity.get("resources.cpu").unwrap().read_only);
    assert!(!capacity.get("resources.memory_gb").unwrap().read_only);

    let out = w.submit().unwrap();
    let formflow_rust::SubmitOutcome::Submitted { payload } = out else { panic!("expected submit") };
    assert_eq!(payload["resources"]["cpu"], json!(2));
}

#[test]
fn privileged_user_overrides_restriction() {
    let policy = Policy::new().restrict(["resources.cpu"]).privileged(true);
    let mut w = scheduled_action().policy(policy).build(entity()).unwrap();
    w.next().unwrap();
    assert!(!w.current_resolution().unwrap().get("resources.cpu").unwrap().read_only);
}

#[test]
fn platform_selects_fields() {
    let cloud = scheduled_action().policy(Policy::new().on_platform("cloud")).build(entity()).unwrap();
    let r = cloud.resolution(1).unwrap();
    assert!(r.get("resources.gpu_enabled").is_some());
    assert!(r.get("resources.local_disk_gb").is_none());

    let onprem = scheduled_action().policy(Policy::new().on_platform("onprem")).build(entity()).unwrap();
    let r = onprem.resolution(1).unwrap();
    assert!(r.get("resources.gpu_enabled").is_none());
    assert!(r.get("resources.gpu_count").is_none());
    assert!(r.get("resources.local_disk_gb").is_some());
}

#[test]
fn policy_change_keeps_values() {
    let mut w = scheduled_action().policy(Policy::new().on_platform("cloud")).build(entity()).unwrap();
    w.next().unwrap();
    w.set_value("resources.gpu_enabled", json!(true)).unwrap();
    w.set_value("resources.cpu", json!(8)).unwrap();
    w.set_policy(Policy::new().on_platform("onprem").restrict(["resources.cpu"])).unwrap();
    let r = w.resolution(1).unwrap();
    assert!(r.get("resources.gpu_enabled").is_none());
    assert!(r.get("resources.cpu").unwrap().read_only);
    assert_eq!(w.state(1).unwrap().get("resources.cpu"), Some(&json!(8)));
}

#[test]
fn filter_never_mutates_templates() {
    let templates = form_catalog::capacity::fields(Some("resize"));
    let policy = Policy::new().restrict(["resources.cpu"]).on_platform("cloud");
    let report = filter_report(&templates, &policy);
    assert_eq!(report.restricted, vec!["resources.cpu".to_string()]);
    assert_eq!(report.dropped, vec!["resources.local_disk_gb".to_string()]);
    assert!(templates.iter().all(|f| !f.restricted));
    assert_eq!(filter(&templates, &policy).len(), templates.len() - 1);
}

#[test]
fn policy_change_after_submit_is_rejected() {
    let mut w = scheduled_action().build(entity()).unwrap();
    w.next().unwrap();
    w.submit().unwrap();
    assert!(matches!(w.set_policy(Policy::new()), Err(WizardError::InvalidTransition { .. })));
}
