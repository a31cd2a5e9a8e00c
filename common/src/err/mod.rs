use crate::err::replica_error::ReError;

pub mod replica_error;

pub type CResult<T> = Result<T, ReError>;
