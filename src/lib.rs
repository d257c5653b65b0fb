// Module layout (Clean Architecture style)
// - bootstrap: configuration and startup wiring
// - infrastructure: Postgres/filesystem/PDF/task queue adapters
// - application: ports, PDF page services and the bulk edit use cases
// - domain: documents, permissions and deferred tasks

pub mod application;
pub mod bootstrap;
pub mod domain;
pub mod infrastructure;
