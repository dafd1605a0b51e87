//! Transport adapters over the domain service.

pub mod grpc;
