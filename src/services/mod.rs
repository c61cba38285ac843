//! Business rules on top of the store: creation and edit flows, mandatory
//! field validation, comment appending, rollup reads and notifications.
//! The CLI stays a thin shell over these functions.

pub mod companies;
pub mod contacts;
pub mod missions;
