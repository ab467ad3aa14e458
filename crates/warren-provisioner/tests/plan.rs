mod common;

use common::attrs;
use serde_json::json;
use warren_provisioner::kinds::{KindSpec, Permissions, User};
use warren_provisioner::plan::decide;
use warren_provisioner::{Action, Cause, ResourceAddr, ResourceKind, ResourceState, ResourceStatus};

fn stored_user(declared: serde_json::Value) -> ResourceState {
    ResourceState {
        addr: ResourceAddr::new(ResourceKind::User, "u1"),
        id: "u1".to_string(),
        status: ResourceStatus::Created,
        declared: attrs(declared),
        observed: Default::default(),
    }
}

#[test]
fn nothing_stored_means_create() {
    let (action, cause, drift) = decide(
        &User::schema(),
        &attrs(json!({"name": "u1", "password": "p"})),
        None,
        None,
    );
    assert_eq!(action, Action::Create);
    assert_eq!(cause, Cause::FirstProvision);
    assert!(drift.is_empty());
}

#[test]
fn stored_but_gone_means_create() {
    let declared = json!({"name": "u1", "password": "p"});
    let stored = stored_user(declared.clone());
    let (action, cause, _) = decide(&User::schema(), &attrs(declared), Some(&stored), None);
    assert_eq!(action, Action::Create);
    assert_eq!(cause, Cause::DeletedExternally);
}

#[test]
fn write_only_value_is_compared_against_last_applied() {
    let schema = User::schema();
    let stored = stored_user(json!({"name": "u1", "password": "p"}));
    let observed = attrs(json!({"name": "u1", "tags": []}));

    let (action, ..) = decide(
        &schema,
        &attrs(json!({"name": "u1", "password": "p"})),
        Some(&stored),
        Some(&observed),
    );
    assert_eq!(action, Action::NoOp);

    let (action, cause, drift) = decide(
        &schema,
        &attrs(json!({"name": "u1", "password": "rotated"})),
        Some(&stored),
        Some(&observed),
    );
    assert_eq!(action, Action::Update);
    assert_eq!(cause, Cause::Drift);
    assert_eq!(drift[0].field, "password");
}

#[test]
fn any_force_new_drift_wins_over_update() {
    let schema = Permissions::schema();
    let declared = json!({"user": "app", "vhost": "v2", "configure": "", "write": ".*", "read": ".*"});
    let stored = ResourceState {
        addr: ResourceAddr::new(ResourceKind::Permissions, "app"),
        id: "app@v1".to_string(),
        status: ResourceStatus::Created,
        declared: attrs(json!({"user": "app", "vhost": "v1", "configure": ".*", "write": ".*", "read": ".*"})),
        observed: Default::default(),
    };
    let observed = attrs(json!({"user": "app", "vhost": "v1", "configure": ".*", "write": ".*", "read": ".*"}));

    let (action, cause, drift) = decide(&schema, &attrs(declared), Some(&stored), Some(&observed));
    assert_eq!(action, Action::Replace);
    assert_eq!(cause, Cause::ForceNewChanged);
    assert_eq!(drift.len(), 2);
}

#[test]
fn imported_user_without_password_plans_update() {
    let schema = User::schema();
    let stored = ResourceState {
        status: ResourceStatus::Imported,
        ..stored_user(json!({"name": "mctest", "tags": ["management"]}))
    };
    let observed = attrs(json!({"name": "mctest", "tags": ["management"]}));

    let (action, cause, drift) = decide(
        &schema,
        &attrs(json!({"name": "mctest", "password": "foobar", "tags": ["management"]})),
        Some(&stored),
        Some(&observed),
    );
    assert_eq!(action, Action::Update);
    assert_eq!(cause, Cause::Drift);
    assert_eq!(drift.len(), 1);
    assert_eq!(drift[0].field, "password");
}
