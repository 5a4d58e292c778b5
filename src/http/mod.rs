mod client;

pub use client::{GatewayResponse, HttpGateway, RequestGateway};
