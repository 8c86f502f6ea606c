#![allow(warnings)]

mod api;
mod handle;
mod properties;

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
