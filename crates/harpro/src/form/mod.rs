//! Form record, controlled-field updates, and the location cascade.

mod record;
mod selector;

pub use record::{FieldValue, FormError, FormField, FormState, PropertyFormRecord};
pub use selector::{CascadingSelector, LocationOptions};
