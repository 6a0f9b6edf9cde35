//! REST API server: routes, basic-auth guards, DTOs, and OpenAPI documentation.

pub mod auth;
pub mod dto;
pub mod error;
pub mod extract;
pub mod openapi;
pub mod routes;
pub mod state;
