pub mod entities;
pub mod ids;
pub mod printer;
pub mod registry;

pub use entities::{Class, Container, Function, FunctionKind, Generic, Object, Parameter, Single, Statement};
pub use ids::{FunctionId, ObjectId};
pub use registry::Registry;
