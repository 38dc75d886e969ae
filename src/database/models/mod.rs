pub mod admin_scope;
pub mod field;
pub mod module;
pub mod resource;
pub mod semester;
pub mod submodule;
pub mod user;

pub use admin_scope::AdminScope;
pub use field::Field;
pub use module::{Module, ModuleChain};
pub use resource::{Resource, ResourceListing};
pub use semester::Semester;
pub use submodule::Submodule;
pub use user::User;
