//! Wire format for forwarding operations to remote participants.

pub mod codec;
pub mod protocol;
