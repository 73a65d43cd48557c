pub(crate) mod quotations_buffer;
pub(crate) mod quotations_constants;
pub(crate) mod quotations_errors;
pub(crate) mod quotations_model;
pub(crate) mod quotations_repository;

// Re-export the public interface
pub use quotations_buffer::QuotationWriteBuffer;
pub use quotations_constants::*;
pub use quotations_model::ForeignQuotation;
pub use quotations_repository::QuotationRepository;

// Re-export error types for convenience
pub use quotations_errors::QuotationError;
