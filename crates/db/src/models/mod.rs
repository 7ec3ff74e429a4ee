//! Row structs for the form builder tables and their conversions into the
//! domain records of `hsseq_core`.

pub mod form;
pub mod form_field;
pub mod submission;
