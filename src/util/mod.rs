/*!
Types and routines shared by the compiler and the matching engine.
*/

pub mod captures;
pub mod encoding;
pub mod look;
pub mod search;

pub(crate) mod prefilter;
