//! Boundary to the connection collaborator.
//!
//! The transport layer (sockets, handshake, request correlation) lives
//! outside this crate. The codec only needs two services from it: a cipher
//! for encrypted attributes and a fetcher for server-side large objects.

use crate::error::ConnectionError;

/// Encryption services for attributes whose descriptor is marked encrypted.
pub trait EntityCrypto: Send + Sync {
    /// Encrypts the plain encoding of an attribute value.
    fn encrypt_entity(&self, plain: &[u8]) -> Result<Vec<u8>, ConnectionError>;

    /// Decrypts a buffer previously produced by the server's cipher.
    fn decrypt_buffer(&self, encrypted: &[u8]) -> Result<Vec<u8>, ConnectionError>;

    /// Fetches and decrypts the encrypted large object stored under
    /// `entity_id`.
    fn decrypt_entity(&self, entity_id: i64) -> Result<Vec<u8>, ConnectionError>;
}

/// Lazy hydration of Blob and Clob placeholders.
pub trait LargeObjectSource: Send + Sync {
    /// Returns the bytes of the large object stored under `entity_id`.
    /// `force_refetch` bypasses any cache kept by the transport.
    fn get_large_object_as_bytes(
        &self,
        entity_id: i64,
        force_refetch: bool,
    ) -> Result<Vec<u8>, ConnectionError>;
}

/// Everything the model needs from a live connection.
pub trait Connection: EntityCrypto + LargeObjectSource {}

impl<T: EntityCrypto + LargeObjectSource> Connection for T {}
