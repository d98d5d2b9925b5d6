//! Request mutation: the modification model, value encodings, and the
//! mutator that applies them to a captured request.

pub mod encoding;
pub mod mutator;
pub mod spec;

pub use encoding::apply_encoding;
pub use mutator::RequestMutator;
pub use spec::{Encoding, MutationSpec, MutationTarget, AUTO_PAYLOAD};
