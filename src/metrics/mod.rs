//! Answer/knowledge extraction and accuracy aggregation.
//!
//! Model outputs are adversarial by nature, so extraction fails soft: an
//! unrecognizable answer is `None`, an unrecognizable knowledge payload is
//! the empty string. Only aggregation preconditions (mismatched lengths)
//! are hard errors.

mod accuracy;
mod answer;
mod knowledge;

pub use accuracy::*;
pub use answer::*;
pub use knowledge::*;
