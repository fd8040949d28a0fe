//! Generated wire types for the `knet` gRPC service.

#![allow(clippy::all)]

tonic::include_proto!("knet");
