pub mod appointment_validator;
pub mod conflict;
pub mod context_service;
pub mod operation_service;
pub mod rbac_service;
pub mod schedule_store;
pub mod sync_state;
