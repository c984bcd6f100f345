//! This module provides the storage backends, the batch upload aggregator and
//! the marketplace services built on top of the document store

pub mod batch_upload;
pub mod cloudinary;
pub mod document_store;
#[cfg(test)]
mod http_stub;
pub mod identity;
pub mod pet_service;
pub mod profiles;
pub mod s3_uploader;
pub mod session;
pub mod storage;
