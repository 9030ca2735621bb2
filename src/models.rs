pub mod catalog;
pub mod rbac;
pub mod scheduling;
pub mod sync;
pub mod tenancy;
pub mod validation;
