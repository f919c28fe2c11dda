mod client;

pub use client::{FetchedFile, Fetcher, HttpFetcher};
