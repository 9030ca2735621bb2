pub mod appointments;
pub mod context;
pub mod rbac;
pub mod reference;
