pub mod analytics;
pub mod fields;
pub mod modules;
pub mod resources;
pub mod scopes;
pub mod semesters;
pub mod submodules;
pub mod whoami;
