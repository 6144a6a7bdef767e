mod client;

pub use client::{UnderDocClient, API_KEY_HEADER};
