//! Property-based tests for the permission resolver.
//!
//! The resolver is a pure function of (role, operation, scope): the same
//! inputs always give the same decision, and `.own_location` operations are
//! only ever granted on the caller's own location.

use proptest::prelude::*;
use uuid::Uuid;

use salon_booking::{
    models::rbac::{Operation, PermissionReason, Role},
    services::rbac_service::PermissionResolver,
};

// PROPERTY TEST STRATEGIES

fn role_strategy() -> impl Strategy<Value = Role> {
    prop::sample::select(Role::ALL.to_vec())
}

fn operation_strategy() -> impl Strategy<Value = Operation> {
    prop::sample::select(Operation::ALL.to_vec())
}

/// (role, operation) pairs picked from the role table itself
fn pairs_where(keep: impl Fn(&PermissionResolver, Role, Operation) -> bool) -> impl Strategy<Value = (Role, Operation)> {
    let resolver = PermissionResolver::new();
    let pairs: Vec<(Role, Operation)> = Role::ALL
        .iter()
        .flat_map(|role| Operation::ALL.iter().map(move |op| (*role, *op)))
        .filter(|(role, op)| keep(&resolver, *role, *op))
        .collect();
    prop::sample::select(pairs)
}

fn uuid_strategy() -> impl Strategy<Value = Uuid> {
    any::<u128>().prop_map(Uuid::from_u128)
}

proptest! {
    /// Same inputs, same decision
    #[test]
    fn decisions_are_deterministic(
        role in role_strategy(),
        operation in operation_strategy(),
        principal in uuid_strategy(),
        tenant in uuid_strategy(),
        own in proptest::option::of(uuid_strategy()),
        target in proptest::option::of(uuid_strategy()),
    ) {
        let resolver = PermissionResolver::new();
        let first = resolver.check_permission(principal, role, operation, tenant, own, target);
        let second = resolver.check_permission(principal, role, operation, tenant, own, target);

        prop_assert_eq!(first, second);
    }

    /// A role without the operation is always refused, whatever the scope
    #[test]
    fn missing_operation_is_role_not_authorized(
        (role, operation) in pairs_where(|r, role, op| !r.role_has(role, op)),
        own in proptest::option::of(uuid_strategy()),
        target in proptest::option::of(uuid_strategy()),
    ) {
        let resolver = PermissionResolver::new();

        let decision = resolver.check_permission(Uuid::nil(), role, operation, Uuid::nil(), own, target);

        prop_assert!(!decision.permitted);
        prop_assert_eq!(decision.reason, PermissionReason::RoleNotAuthorized);
    }

    /// Scoped operations: own location granted, any other location refused
    #[test]
    fn scoped_operations_follow_the_location(
        (role, operation) in pairs_where(|r, role, op| op.is_scoped() && r.role_has(role, op)),
        own in uuid_strategy(),
        other in uuid_strategy(),
    ) {
        let resolver = PermissionResolver::new();
        prop_assume!(own != other);

        let home = resolver.check_permission(Uuid::nil(), role, operation, Uuid::nil(), Some(own), Some(own));
        let away = resolver.check_permission(Uuid::nil(), role, operation, Uuid::nil(), Some(own), Some(other));

        prop_assert!(home.permitted);
        prop_assert_eq!(away.reason, PermissionReason::ScopeViolation);
        prop_assert!(!away.permitted);
    }

    /// Unscoped operations ignore the resource location
    #[test]
    fn unscoped_operations_ignore_the_location(
        (role, operation) in pairs_where(|r, role, op| !op.is_scoped() && r.role_has(role, op)),
        own in proptest::option::of(uuid_strategy()),
        target in proptest::option::of(uuid_strategy()),
    ) {
        let resolver = PermissionResolver::new();

        let decision = resolver.check_permission(Uuid::nil(), role, operation, Uuid::nil(), own, target);

        prop_assert!(decision.permitted);
        prop_assert_eq!(decision.reason, PermissionReason::Granted);
    }

    /// Escalation never picks an operation the role does not hold
    #[test]
    fn effective_operation_is_held_or_unchanged(role in role_strategy(), operation in operation_strategy()) {
        let resolver = PermissionResolver::new();
        let effective = resolver.effective_operation(role, operation);

        prop_assert!(effective == operation || resolver.role_has(role, effective));
    }
}

#[test]
fn role_table_is_ordered_by_privilege() {
    let resolver = PermissionResolver::new();

    // Cada cargo contém tudo o que o cargo abaixo tem
    for pair in Role::ALL.windows(2) {
        let (higher, lower) = (pair[0], pair[1]);
        for operation in resolver.operations_for(lower) {
            assert!(
                resolver.role_has(higher, *operation),
                "{} devia ter {}",
                higher.as_str(),
                operation
            );
        }
    }

    assert!(!resolver.can_read_all_finances(Role::Staff));
    assert!(resolver.can_cancel_appointments(Role::Staff));
    assert!(!resolver.can_create_appointments(Role::Viewer));
    assert!(resolver.can_manage_staff(Role::Admin));
}
