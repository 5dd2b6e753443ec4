pub mod cmd;
pub mod conditions;
pub mod mutation;
pub mod values;

pub use self::cmd::{Exec, FilterCmd, ScalarSpec, ScalarType};
pub use self::conditions::{Comparer, Condition, DatePart, SearchAnchor};
pub use self::mutation::{Mutation, MutationOp, Payload};
pub use self::values::{LazyValue, Value};
