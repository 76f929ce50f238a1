//! Shared pieces of the gmix command line tools.

pub mod io;
pub mod shared_args;
