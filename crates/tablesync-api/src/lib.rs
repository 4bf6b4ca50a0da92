// TableSync API Library
//
// This crate provides the REST API layer for TableSync,
// including HTTP handlers, routes, and request/response models.

pub mod handlers;
pub mod identity;
pub mod models;
pub mod routes;
