//! Response DTOs for the HTTP side-channel.

pub mod response;
